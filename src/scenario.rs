use crate::league::{Fixture, League, TeamId};
use itertools::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult {
    HomeWin,
    Draw,
    AwayWin,
}

/// Solved values of one fixture's outcome variables.
#[derive(Debug, Clone, PartialEq)]
pub struct FixtureOutcome {
    pub fixture: Fixture,
    pub home_win: bool,
    pub home_draw: bool,
    pub away_win: bool,
    pub away_draw: bool,
    pub home_points: i64,
    pub away_points: i64,
}

impl FixtureOutcome {
    /// `None` when the flags do not describe exactly one result.
    pub fn result(&self) -> Option<MatchResult> {
        match (self.home_win, self.home_draw, self.away_win, self.away_draw) {
            (true, false, false, false) => Some(MatchResult::HomeWin),
            (false, true, false, true) => Some(MatchResult::Draw),
            (false, false, true, false) => Some(MatchResult::AwayWin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamOutcome {
    pub team: TeamId,
    pub points_before: i64,
    pub new_points: i64,
    pub total: i64,
    pub average: f64,
    pub by_table: bool,
    pub by_average: bool,
}

/// One complete end of season, as chosen by the solver.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub fixtures: Vec<FixtureOutcome>,
    pub teams: Vec<TeamOutcome>,
}

impl Scenario {
    /// Teams from fewest to most final points; equal totals keep input order.
    pub fn ascending(&self) -> Vec<&TeamOutcome> {
        self.teams.iter().sorted_by_key(|t| t.total).collect()
    }

    pub fn relegated_by_table(&self) -> Vec<TeamId> {
        self.teams.iter().filter(|t| t.by_table).map(|t| t.team).collect()
    }

    pub fn relegated_by_average(&self) -> Vec<TeamId> {
        self.teams.iter().filter(|t| t.by_average).map(|t| t.team).collect()
    }

    /// Final total of the team ranked immediately above `target`. The
    /// target ranks below every team it is level with, so a tie yields the
    /// target's own total.
    pub fn next_above(&self, target: TeamId) -> Option<i64> {
        let own = self.teams.iter().find(|t| t.team == target)?.total;
        self.teams.iter().filter(|t| t.team != target && t.total >= own).map(|t| t.total).min()
    }

    pub fn results_summary(&self, league: &League) -> String {
        self.fixtures
            .iter()
            .map(|f| {
                let (home, away) = (&league.team(f.fixture.home).name, &league.team(f.fixture.away).name);
                match f.result() {
                    Some(MatchResult::HomeWin) => format!("r{} {} beat {}", f.fixture.round, home, away),
                    Some(MatchResult::AwayWin) => format!("r{} {} beat {}", f.fixture.round, away, home),
                    Some(MatchResult::Draw) => format!("r{} {} drew {}", f.fixture.round, home, away),
                    None => format!("r{} {}-{} undecided", f.fixture.round, home, away),
                }
            })
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn team(team: TeamId, total: i64) -> TeamOutcome {
        TeamOutcome {
            team,
            points_before: total,
            new_points: 0,
            total,
            average: 1.0,
            by_table: false,
            by_average: false,
        }
    }

    #[test]
    fn next_above_puts_the_target_below_level_teams() {
        let s = Scenario { fixtures: vec![], teams: vec![team(0, 9), team(1, 8), team(2, 9), team(3, 12)] };
        let order = s.ascending().iter().map(|t| t.team).collect::<Vec<_>>();
        assert_eq!(order, vec![1, 0, 2, 3]);
        assert_eq!(s.next_above(1), Some(9));
        assert_eq!(s.next_above(0), Some(9));
        assert_eq!(s.next_above(2), Some(9));
        assert_eq!(s.next_above(3), None);
    }

    #[test]
    fn next_above_ignores_row_order() {
        let teams = vec![team(0, 9), team(1, 8), team(2, 9), team(3, 12)];
        let s = Scenario { fixtures: vec![], teams: teams.clone() };
        let r = Scenario { fixtures: vec![], teams: teams.into_iter().rev().collect() };
        for t in 0..4 {
            assert_eq!(s.next_above(t), r.next_above(t));
        }
    }

    #[test]
    fn result_needs_exactly_one_outcome() {
        let fixture = Fixture { home: 0, away: 1, round: 1 };
        let mut f = FixtureOutcome {
            fixture,
            home_win: false,
            home_draw: true,
            away_win: false,
            away_draw: true,
            home_points: 1,
            away_points: 1,
        };
        assert_eq!(f.result(), Some(MatchResult::Draw));
        f.away_draw = false;
        assert_eq!(f.result(), None);
    }
}
