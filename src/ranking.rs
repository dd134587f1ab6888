//! Pairwise "strictly ahead" indicators.
//!
//! For an ordered pair (i, j) the indicator W is tied to the values by
//!
//! ```text
//! v_i - v_j <= M * W
//! v_i - v_j >= eps - M * (1 - W)
//! ```
//!
//! so W = 1 exactly when v_i exceeds v_j by at least `eps`. Equal values force
//! W = 0 in both directions.

use crate::league::{League, TeamId};
use crate::solver::{linear, Model};
use good_lp::Variable;
use std::collections::HashMap;

pub type Dominance = HashMap<(TeamId, TeamId), Variable>;

#[derive(Debug, Clone, Copy)]
pub struct Strictness {
    pub big_m: f64,
    pub epsilon: f64,
}

pub fn dominance(model: &mut Model, league: &League, values: &[Variable], strictness: Strictness, label: &str) -> Dominance {
    let Strictness { big_m, epsilon } = strictness;
    let mut w = HashMap::new();

    for (i, j) in league.ordered_pairs() {
        let v = model.new_bool(format!(
            "{} ahead of {} by {}",
            league.team(i).name,
            league.team(j).name,
            label
        ));
        let diff = vec![(1.0, values[i]), (-1.0, values[j]), (-big_m, v)];
        model.add(linear(diff.clone()).leq(0.0));
        model.add(linear(diff).geq(epsilon - big_m));
        w.insert((i, j), v);
    }

    w
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::league::tests::standing;
    use crate::solver::{Backend, MicroLp, Outcome};

    fn league() -> League {
        League::new(
            vec![standing("A", 0, 10, 10), standing("B", 0, 10, 10), standing("C", 0, 10, 10)],
            vec![],
        )
        .unwrap()
    }

    fn solve_with_values(values: [f64; 3], epsilon: f64) -> Option<HashMap<(TeamId, TeamId), bool>> {
        let league = league();
        let mut model = Model::new();
        let vars = (0..3).map(|i| model.new_real(format!("v{}", i), 0.0, None)).collect::<Vec<_>>();
        for (v, x) in vars.iter().zip(values.iter()) {
            model.add(linear(vec![(1.0, *v)]).eq(*x));
        }
        let w = dominance(&mut model, &league, &vars, Strictness { big_m: 100.0, epsilon }, "test");
        match MicroLp::default().solve(model).unwrap() {
            Outcome::Optimal(a) => Some(w.iter().map(|(k, v)| (*k, a.flag(*v))).collect()),
            Outcome::Infeasible => None,
        }
    }

    #[test]
    fn strict_order_is_captured() {
        let w = solve_with_values([12.0, 9.0, 10.0], 1.0).unwrap();
        assert!(w[&(0, 1)] && w[&(0, 2)] && w[&(2, 1)]);
        assert!(!w[&(1, 0)] && !w[&(2, 0)] && !w[&(1, 2)]);
    }

    #[test]
    fn ties_are_not_dominance_either_way() {
        let w = solve_with_values([7.0, 7.0, 3.0], 1.0).unwrap();
        assert!(!w[&(0, 1)]);
        assert!(!w[&(1, 0)]);
        assert!(w[&(0, 2)] && w[&(1, 2)]);
    }

    #[test]
    fn small_epsilon_separates_close_averages() {
        let w = solve_with_values([1.2, 1.2 + 1.0 / 1600.0, 1.1], 0.5 / 1600.0).unwrap();
        assert!(w[&(1, 0)]);
        assert!(!w[&(0, 1)]);
    }
}
