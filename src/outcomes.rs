use crate::league::{League, RoundId, TeamId, WIN_POINTS};
use crate::solver::{linear, Model};
use good_lp::Variable;
use std::collections::HashMap;

/// Result variables of every remaining match, keyed by (round, team).
pub struct OutcomeVars {
    pub win: HashMap<(RoundId, TeamId), Variable>,
    pub draw: HashMap<(RoundId, TeamId), Variable>,
    pub points: HashMap<(RoundId, TeamId), Variable>,
}

pub fn encode_outcomes(model: &mut Model, league: &League) -> OutcomeVars {
    let mut win = HashMap::new();
    let mut draw = HashMap::new();
    let mut points = HashMap::new();

    for f in league.fixtures() {
        for team in vec![f.home, f.away] {
            let name = &league.team(team).name;
            let key = (f.round, team);
            win.insert(key, model.new_bool(format!("win {} r{}", name, f.round)));
            draw.insert(key, model.new_bool(format!("draw {} r{}", name, f.round)));
            let p = model.new_integer(format!("points {} r{}", name, f.round), 0.0, Some(WIN_POINTS as f64));
            points.insert(key, p);

            model.add(linear(vec![(1.0, p), (-(WIN_POINTS as f64), win[&key]), (-1.0, draw[&key])]).eq(0.0));
        }

        let (h, a) = ((f.round, f.home), (f.round, f.away));
        let label = format!("{}-{} r{}", league.team(f.home).name, league.team(f.away).name, f.round);

        model.add_named(format!("one result {}", label), linear(vec![(1.0, win[&h]), (1.0, draw[&h])]).leq(1.0));
        model.add_named(
            format!("result dependency {}", label),
            linear(vec![(1.0, win[&h]), (1.0, win[&a]), (1.0, draw[&h])]).eq(1.0),
        );
        model.add_named(format!("shared draw {}", label), linear(vec![(1.0, draw[&h]), (-1.0, draw[&a])]).eq(0.0));
    }

    OutcomeVars { win, draw, points }
}
