use crate::config::Rules;
use crate::league::{League, TeamId};
use crate::ranking::Dominance;
use crate::solver::{linear, Model};
use good_lp::Variable;
use std::collections::HashMap;

pub struct RelegationVars {
    pub by_table: Vec<Variable>,
    pub by_average: Vec<Variable>,
    /// Average dominance restricted to opponents not relegated by table.
    pub average_adjusted: HashMap<(TeamId, TeamId), Variable>,
}

/// Links the relegation flags of every team to the dominance indicators and
/// fixes how many teams go down under each criterion.
///
/// A team is in the bottom tier of a criterion with `k` relegations when it
/// is strictly ahead of at most `k - 1` teams. A team strictly ahead of
/// exactly `k - 1` teams may fall on either side; the cardinality constraint
/// decides.
pub fn classify(
    model: &mut Model,
    league: &League,
    rules: &Rules,
    w_table: &Dominance,
    w_average: &Dominance,
    count_m: f64,
) -> RelegationVars {
    let teams = league.teams();

    let by_table = teams
        .iter()
        .map(|t| model.new_bool(format!("{} relegated by table", t.name)))
        .collect::<Vec<_>>();
    let by_average = teams
        .iter()
        .map(|t| model.new_bool(format!("{} relegated by average", t.name)))
        .collect::<Vec<_>>();

    let table_bound = rules.table_relegations as f64 - 1.0;
    for i in league.team_ids() {
        let ahead = league.team_ids().filter(|j| *j != i).map(|j| (1.0, w_table[&(i, j)]));
        bottom_tier(model, ahead.collect(), by_table[i], None, table_bound, count_m);
    }

    let mut average_adjusted = HashMap::new();
    for (i, j) in league.ordered_pairs() {
        let adj = model.new_bool(format!("{} ahead of {} among survivors", teams[i].name, teams[j].name));
        let w = w_average[&(i, j)];
        model.add(linear(vec![(1.0, adj), (-1.0, w)]).leq(0.0));
        model.add(linear(vec![(1.0, adj), (1.0, by_table[j])]).leq(1.0));
        model.add(linear(vec![(1.0, adj), (-1.0, w), (1.0, by_table[j])]).geq(0.0));
        average_adjusted.insert((i, j), adj);
    }

    let average_bound = rules.average_relegations as f64 - 1.0;
    for i in league.team_ids() {
        let ahead = league.team_ids().filter(|j| *j != i).map(|j| (1.0, average_adjusted[&(i, j)]));
        // A team already down by table is not a candidate of the average pool.
        bottom_tier(model, ahead.collect(), by_average[i], Some(by_table[i]), average_bound, count_m);
    }

    for i in league.team_ids() {
        model.add_named(
            format!("{} relegated once", teams[i].name),
            linear(vec![(1.0, by_table[i]), (1.0, by_average[i])]).leq(1.0),
        );
    }

    model.add_named(
        "table relegations",
        linear(by_table.iter().map(|b| (1.0, *b))).eq(rules.table_relegations as f64),
    );
    model.add_named(
        "average relegations",
        linear(by_average.iter().map(|b| (1.0, *b))).eq(rules.average_relegations as f64),
    );

    RelegationVars { by_table, by_average, average_adjusted }
}

/// `flag = 1` forces `sum(ahead) <= bound`; `flag = 0` forces
/// `sum(ahead) >= bound` unless `excused` is set.
fn bottom_tier(
    model: &mut Model,
    ahead: Vec<(f64, Variable)>,
    flag: Variable,
    excused: Option<Variable>,
    bound: f64,
    big_m: f64,
) {
    let mut upper = linear(ahead.clone());
    upper.add_mul(big_m, flag);
    model.add(upper.leq(bound + big_m));

    let mut lower = linear(ahead);
    lower.add_mul(big_m, flag);
    if let Some(e) = excused {
        lower.add_mul(big_m, e);
    }
    model.add(lower.geq(bound));
}
