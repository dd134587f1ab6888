use crate::league::{League, LeagueError, WIN_POINTS};
use log::*;
use std::time::Duration;

/// How many teams go down under each criterion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rules {
    pub table_relegations: usize,
    pub average_relegations: usize,
}

impl Default for Rules {
    fn default() -> Self {
        Rules { table_relegations: 2, average_relegations: 2 }
    }
}

impl Rules {
    pub fn check(&self, league: &League) -> Result<(), LeagueError> {
        let teams = league.teams().len();
        match self.table_relegations.checked_add(self.average_relegations) {
            Some(relegations) if relegations <= teams => Ok(()),
            relegations => Err(LeagueError::TooManyRelegations { relegations: relegations.unwrap_or(usize::MAX), teams }),
        }
    }
}

/// Overrides for the constants of the linear encoding. Anything left unset
/// is derived from the league.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Encoding {
    pub big_m: Option<f64>,
    pub average_epsilon: Option<f64>,
    pub time_limit: Option<Duration>,
}

/// Encoding constants resolved against one league.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Constants {
    pub table_m: f64,
    pub average_m: f64,
    pub count_m: f64,
    pub table_epsilon: f64,
    pub average_epsilon: f64,
}

impl Encoding {
    pub fn resolve(&self, league: &League) -> Constants {
        let derived = Constants::derive(league);
        let mut c = derived;

        if let Some(m) = self.big_m {
            let needed = derived.table_m.max(derived.average_m).max(derived.count_m);
            if m < needed {
                warn!("big-M {} is below the bound {} implied by the league", m, needed);
            }
            c.table_m = m;
            c.average_m = m;
            c.count_m = m;
        }

        if let Some(eps) = self.average_epsilon {
            if eps > derived.average_epsilon {
                warn!(
                    "average epsilon {} exceeds {}, distinct averages may be read as ties",
                    eps, derived.average_epsilon
                );
            }
            c.average_epsilon = eps;
        }

        debug!("encoding constants {:?}", c);
        c
    }
}

impl Constants {
    pub fn derive(league: &League) -> Constants {
        let teams = league.teams();
        let max_total = teams.iter().map(|t| t.max_points()).max().unwrap_or(0);
        let min_total = teams.iter().map(|t| t.points).min().unwrap_or(0);
        let max_average = teams.iter().map(|t| t.max_average()).fold(0.0, f64::max);
        let min_average = teams.iter().map(|t| t.min_average()).fold(WIN_POINTS as f64, f64::min);
        let q = league.max_average_matches() as f64;

        Constants {
            table_m: (max_total - min_total + 1) as f64,
            average_m: max_average - min_average + 1.0,
            count_m: teams.len() as f64,
            table_epsilon: 1.0,
            average_epsilon: 0.5 / (q * q),
        }
    }
}
