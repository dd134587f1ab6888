use crate::league::{League, RoundId, TeamId};
use crate::solver::{linear, Model};
use good_lp::Variable;
use std::collections::HashMap;

/// Season aggregates per team, indexed by `TeamId`.
pub struct TotalVars {
    /// Points earned in the remaining fixtures.
    pub remaining: Vec<Variable>,
    /// Final season total: current points plus `remaining`.
    pub total: Vec<Variable>,
    /// Final multi-season average.
    pub average: Vec<Variable>,
}

pub fn accumulate(model: &mut Model, league: &League, points: &HashMap<(RoundId, TeamId), Variable>) -> TotalVars {
    let mut remaining = Vec::new();
    let mut total = Vec::new();
    let mut average = Vec::new();

    for (id, team) in league.teams().iter().enumerate() {
        let r = model.new_integer(format!("remaining {}", team.name), 0.0, None);
        let rounds = team.fixtures.iter().map(|idx| league.fixtures()[*idx].round);
        let mut sum = linear(rounds.map(|round| (-1.0, points[&(round, id)])));
        sum.add_mul(1.0, r);
        model.add(sum.eq(0.0));

        let t = model.new_integer(format!("total {}", team.name), 0.0, None);
        model.add(linear(vec![(1.0, t), (-1.0, r)]).eq(team.points as f64));

        // average * matches = historical points + remaining
        let avg = model.new_real(format!("average {}", team.name), 0.0, None);
        let matches = team.average_matches() as f64;
        model.add(linear(vec![(matches, avg), (-1.0, r)]).eq(team.historical_points as f64));

        remaining.push(r);
        total.push(t);
        average.push(avg);
    }

    TotalVars { remaining, total, average }
}
