use crate::config::Rules;
use crate::league::{League, WIN_POINTS};
use crate::scenario::Scenario;

/// Checks a solved scenario against the structure every end of season must
/// have. Returns a description of the first violation found.
pub fn verify_scenario(league: &League, rules: &Rules, scenario: &Scenario) -> Result<(), String> {
    for f in scenario.fixtures.iter() {
        let round = f.fixture.round;
        let (home, away) = (&league.team(f.fixture.home).name, &league.team(f.fixture.away).name);
        if f.result().is_none() {
            return Err(format!("{}-{} in round {} has no single result", home, away, round));
        }
        if f.home_points != WIN_POINTS * f.home_win as i64 + f.home_draw as i64
            || f.away_points != WIN_POINTS * f.away_win as i64 + f.away_draw as i64
        {
            return Err(format!("{}-{} in round {} awards the wrong points", home, away, round));
        }
    }

    for t in scenario.teams.iter() {
        let team = league.team(t.team);
        let earned: i64 = scenario
            .fixtures
            .iter()
            .map(|f| {
                if f.fixture.home == t.team {
                    f.home_points
                } else if f.fixture.away == t.team {
                    f.away_points
                } else {
                    0
                }
            })
            .sum();
        if earned != t.new_points || t.total != team.points + t.new_points {
            return Err(format!("{} finishes on {} but earned {}", team.name, t.total, earned));
        }
        let expected = (team.historical_points + t.new_points) as f64 / team.average_matches() as f64;
        if (expected - t.average).abs() > 1e-6 {
            return Err(format!("{} has average {} instead of {}", team.name, t.average, expected));
        }
        if t.by_table && t.by_average {
            return Err(format!("{} is relegated twice", team.name));
        }
    }

    let by_table = scenario.relegated_by_table();
    if by_table.len() != rules.table_relegations {
        return Err(format!("{} teams relegated by table", by_table.len()));
    }
    let by_average = scenario.relegated_by_average();
    if by_average.len() != rules.average_relegations {
        return Err(format!("{} teams relegated by average", by_average.len()));
    }

    // Nobody outside the relegation zone may finish strictly below a relegated team.
    for r in by_table.iter() {
        let relegated = &scenario.teams[*r];
        let below = scenario.teams.iter().filter(|t| t.total < relegated.total).count();
        if below >= rules.table_relegations {
            return Err(format!("{} relegated by table with {} teams below", league.team(*r).name, below));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::tests::{fixture, standing};
    use crate::league::Fixture;
    use crate::scenario::{FixtureOutcome, TeamOutcome};

    fn league() -> League {
        League::new(
            vec![standing("A", 10, 20, 9), standing("B", 4, 10, 9), standing("C", 6, 12, 10)],
            vec![fixture("A", "B", 1)],
        )
        .unwrap()
    }

    fn scenario() -> Scenario {
        Scenario {
            fixtures: vec![FixtureOutcome {
                fixture: Fixture { home: 0, away: 1, round: 1 },
                home_win: false,
                home_draw: false,
                away_win: true,
                away_draw: false,
                home_points: 0,
                away_points: 3,
            }],
            teams: vec![
                TeamOutcome { team: 0, points_before: 10, new_points: 0, total: 10, average: 2.0, by_table: false, by_average: false },
                TeamOutcome { team: 1, points_before: 4, new_points: 3, total: 7, average: 1.3, by_table: false, by_average: true },
                TeamOutcome { team: 2, points_before: 6, new_points: 0, total: 6, average: 1.2, by_table: true, by_average: false },
            ],
        }
    }

    #[test]
    fn consistent_scenario_passes() {
        let rules = Rules { table_relegations: 1, average_relegations: 1 };
        assert_eq!(verify_scenario(&league(), &rules, &scenario()), Ok(()));
    }

    #[test]
    fn violations_are_reported() {
        let rules = Rules { table_relegations: 1, average_relegations: 1 };

        let mut s = scenario();
        s.fixtures[0].home_draw = true;
        assert!(verify_scenario(&league(), &rules, &s).unwrap_err().contains("no single result"));

        let mut s = scenario();
        s.teams[2].by_average = true;
        assert!(verify_scenario(&league(), &rules, &s).unwrap_err().contains("relegated twice"));

        let mut s = scenario();
        s.teams[2].by_table = false;
        s.teams[0].by_table = true;
        assert!(verify_scenario(&league(), &rules, &s).unwrap_err().contains("teams below"));

        let s = scenario();
        let rules = Rules { table_relegations: 2, average_relegations: 1 };
        assert!(verify_scenario(&league(), &rules, &s).unwrap_err().contains("relegated by table"));
    }
}
