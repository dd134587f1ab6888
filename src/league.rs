//! Standings and remaining calendar of a league.
//!
//! A `League` is validated once on construction and then shared read-only by
//! every per-team analysis.

use itertools::*;
use std::collections::{BTreeSet, HashMap, HashSet};
use thiserror::Error;

pub type TeamId = usize;
pub type RoundId = i64;

/// Points for a win. A draw is worth one point and a loss nothing.
pub const WIN_POINTS: i64 = 3;

#[derive(Debug, Error, PartialEq)]
pub enum LeagueError {
    #[error("league has no teams")]
    NoTeams,
    #[error("team {0:?} is listed twice in the standings")]
    DuplicateTeam(String),
    #[error("team {team:?} has negative {field}")]
    Negative { team: String, field: &'static str },
    #[error("fixture in round {round} references unknown team {team:?}")]
    UnknownTeam { team: String, round: RoundId },
    #[error("team {team:?} plays itself in round {round}")]
    SelfMatch { team: String, round: RoundId },
    #[error("team {team:?} plays more than once in round {round}")]
    DoubleBooked { team: String, round: RoundId },
    #[error("team {0:?} has no matches to average over")]
    NoMatches(String),
    #[error("{relegations} relegation slots do not fit in a league of {teams} teams")]
    TooManyRelegations { relegations: usize, teams: usize },
}

/// One row of the standings table as read from the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub name: String,
    /// Points in the current season so far.
    pub points: i64,
    /// Points summed over the seasons that make up the average.
    pub historical_points: i64,
    /// Matches played over the same seasons.
    pub historical_played: i64,
}

/// A remaining match, named by team as in the input files.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureRecord {
    pub home: String,
    pub away: String,
    pub round: RoundId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    pub name: String,
    pub points: i64,
    pub historical_points: i64,
    pub historical_played: i64,
    /// Indices into `League::fixtures` of the matches this team still plays.
    pub fixtures: Vec<usize>,
}

impl Team {
    pub fn remaining_matches(&self) -> i64 {
        self.fixtures.len() as i64
    }

    /// Highest season total reachable by winning every remaining match.
    pub fn max_points(&self) -> i64 {
        self.points + WIN_POINTS * self.remaining_matches()
    }

    /// Denominator of the average once the season is over. Only the team's
    /// own fixtures count, so a bye leaves it one short of the round count.
    pub fn average_matches(&self) -> i64 {
        self.historical_played + self.remaining_matches()
    }

    pub fn min_average(&self) -> f64 {
        self.historical_points as f64 / self.average_matches() as f64
    }

    pub fn max_average(&self) -> f64 {
        (self.historical_points + WIN_POINTS * self.remaining_matches()) as f64
            / self.average_matches() as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fixture {
    pub home: TeamId,
    pub away: TeamId,
    pub round: RoundId,
}

#[derive(Debug, Clone)]
pub struct League {
    teams: Vec<Team>,
    fixtures: Vec<Fixture>,
    rounds: Vec<RoundId>,
    index: HashMap<String, TeamId>,
}

impl League {
    /// Validates the standings and fixtures and builds the league. Nothing is
    /// kept if any record is rejected.
    pub fn new(standings: Vec<Standing>, records: Vec<FixtureRecord>) -> Result<League, LeagueError> {
        if standings.is_empty() {
            return Err(LeagueError::NoTeams);
        }

        let mut index = HashMap::new();
        let mut teams = Vec::with_capacity(standings.len());
        for s in standings {
            for (field, value) in vec![
                ("points", s.points),
                ("historical points", s.historical_points),
                ("historical matches", s.historical_played),
            ] {
                if value < 0 {
                    return Err(LeagueError::Negative { team: s.name, field });
                }
            }
            if index.insert(s.name.clone(), teams.len()).is_some() {
                return Err(LeagueError::DuplicateTeam(s.name));
            }
            teams.push(Team {
                name: s.name,
                points: s.points,
                historical_points: s.historical_points,
                historical_played: s.historical_played,
                fixtures: Vec::new(),
            });
        }

        let lookup = |name: &str, round: RoundId| -> Result<TeamId, LeagueError> {
            index.get(name).copied().ok_or_else(|| LeagueError::UnknownTeam {
                team: name.to_string(),
                round,
            })
        };

        let mut booked: HashSet<(RoundId, TeamId)> = HashSet::new();
        let mut fixtures = Vec::with_capacity(records.len());
        for r in records.iter() {
            let home = lookup(&r.home, r.round)?;
            let away = lookup(&r.away, r.round)?;
            if home == away {
                return Err(LeagueError::SelfMatch { team: r.home.clone(), round: r.round });
            }
            for (team, name) in vec![(home, &r.home), (away, &r.away)] {
                if !booked.insert((r.round, team)) {
                    return Err(LeagueError::DoubleBooked { team: name.clone(), round: r.round });
                }
            }
            fixtures.push(Fixture { home, away, round: r.round });
        }

        for (idx, f) in fixtures.iter().enumerate() {
            teams[f.home].fixtures.push(idx);
            teams[f.away].fixtures.push(idx);
        }

        if let Some(t) = teams.iter().find(|t| t.average_matches() == 0) {
            return Err(LeagueError::NoMatches(t.name.clone()));
        }

        let rounds = fixtures.iter().map(|f| f.round).collect::<BTreeSet<_>>().into_iter().collect();

        Ok(League { teams, fixtures, rounds, index })
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team(&self, id: TeamId) -> &Team {
        &self.teams[id]
    }

    pub fn team_ids(&self) -> impl Iterator<Item = TeamId> {
        0..self.teams.len()
    }

    pub fn find(&self, name: &str) -> Option<TeamId> {
        self.index.get(name).copied()
    }

    pub fn fixtures(&self) -> &[Fixture] {
        &self.fixtures
    }

    /// Remaining rounds, deduplicated and ascending.
    pub fn rounds(&self) -> &[RoundId] {
        &self.rounds
    }

    /// Ordered pairs of distinct teams.
    pub fn ordered_pairs(&self) -> impl Iterator<Item = (TeamId, TeamId)> {
        let n = self.teams.len();
        iproduct!(0..n, 0..n).filter(|(i, j)| i != j)
    }

    /// Largest denominator of any final average.
    pub fn max_average_matches(&self) -> i64 {
        self.teams.iter().map(|t| t.average_matches()).max().unwrap_or(1)
    }

    pub fn fixture_summary(&self) -> String {
        self.rounds
            .iter()
            .map(|r| {
                let games = self
                    .fixtures
                    .iter()
                    .filter(|f| f.round == *r)
                    .map(|f| format!("{}-{}", self.teams[f.home].name, self.teams[f.away].name))
                    .join(" ");
                format!("r{}: {}", r, games)
            })
            .join("\n")
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn standing(name: &str, points: i64, historical_points: i64, historical_played: i64) -> Standing {
        Standing { name: name.to_string(), points, historical_points, historical_played }
    }

    pub fn fixture(home: &str, away: &str, round: RoundId) -> FixtureRecord {
        FixtureRecord { home: home.to_string(), away: away.to_string(), round }
    }

    fn four_teams() -> Vec<Standing> {
        vec![
            standing("A", 10, 40, 20),
            standing("B", 9, 40, 20),
            standing("C", 8, 40, 20),
            standing("D", 7, 40, 20),
        ]
    }

    #[test]
    fn rounds_are_sorted_and_deduplicated() {
        let league = League::new(
            four_teams(),
            vec![fixture("A", "B", 30), fixture("C", "D", 30), fixture("A", "C", 12), fixture("B", "D", 12)],
        )
        .unwrap();
        assert_eq!(league.rounds(), &[12, 30]);
        assert_eq!(league.team(0).remaining_matches(), 2);
        assert_eq!(league.team(0).max_points(), 16);
        assert_eq!(league.team(3).average_matches(), 22);
    }

    #[test]
    fn a_bye_shortens_only_that_teams_average() {
        // Two rounds left, C and D sit out round 12.
        let league = League::new(
            four_teams(),
            vec![fixture("A", "B", 12), fixture("A", "C", 30), fixture("B", "D", 30)],
        )
        .unwrap();
        assert_eq!(league.rounds().len(), 2);
        assert_eq!(league.team(0).average_matches(), 22);
        assert_eq!(league.team(1).average_matches(), 22);
        assert_eq!(league.team(2).average_matches(), 21);
        assert_eq!(league.team(3).average_matches(), 21);
        assert!((league.team(3).max_average() - 43.0 / 21.0).abs() < 1e-12);
        assert_eq!(league.max_average_matches(), 22);
    }

    #[test]
    fn unknown_team_is_rejected() {
        let err = League::new(four_teams(), vec![fixture("A", "Z", 1)]).unwrap_err();
        assert_eq!(err, LeagueError::UnknownTeam { team: "Z".to_string(), round: 1 });
    }

    #[test]
    fn team_twice_in_a_round_is_rejected() {
        let err = League::new(four_teams(), vec![fixture("A", "B", 1), fixture("C", "A", 1)]).unwrap_err();
        assert_eq!(err, LeagueError::DoubleBooked { team: "A".to_string(), round: 1 });
    }

    #[test]
    fn duplicate_and_self_matches_are_rejected() {
        let mut standings = four_teams();
        standings.push(standing("B", 1, 1, 1));
        assert_eq!(League::new(standings, vec![]).unwrap_err(), LeagueError::DuplicateTeam("B".to_string()));

        let err = League::new(four_teams(), vec![fixture("C", "C", 4)]).unwrap_err();
        assert_eq!(err, LeagueError::SelfMatch { team: "C".to_string(), round: 4 });
    }

    #[test]
    fn averages_need_matches() {
        let standings = vec![standing("A", 0, 0, 0), standing("B", 0, 0, 0)];
        assert_eq!(League::new(standings.clone(), vec![]).unwrap_err(), LeagueError::NoMatches("A".to_string()));
        assert!(League::new(standings, vec![fixture("A", "B", 1)]).is_ok());
    }

    #[test]
    fn ordered_pairs_skip_the_diagonal() {
        let league = League::new(four_teams(), vec![]).unwrap();
        let pairs = league.ordered_pairs().collect::<Vec<_>>();
        assert_eq!(pairs.len(), 12);
        assert!(pairs.iter().all(|(i, j)| i != j));
    }
}
