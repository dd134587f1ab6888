//! Per-team worst case: how many points can a team collect and still go down?
//!
//! Every analysis builds its own model from scratch. The target team is
//! forced into relegation by exactly one criterion and its final total is
//! maximised. An infeasible model means no combination of results relegates
//! the team.
//!
//! The solver may reach the ceiling through many ends of season. A second
//! model holds the team on its ceiling and picks the end of season in which
//! the nearest team level with or above it has the fewest points, so the
//! threshold does not hinge on which optimum the solver happened to return.

use crate::accumulate::{accumulate, TotalVars};
use crate::classify::{classify, RelegationVars};
use crate::config::{Constants, Encoding, Rules};
use crate::league::{League, LeagueError, TeamId};
use crate::outcomes::{encode_outcomes, OutcomeVars};
use crate::ranking::{dominance, Dominance, Strictness};
use crate::scenario::{FixtureOutcome, Scenario, TeamOutcome};
use crate::solver::{linear, Assignment, Backend, Model, Outcome, SolveError};
use crate::verify::verify_scenario;
use log::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// No combination of results relegates the team.
    Safe,
    /// Finishing on `threshold` points guarantees survival; `additional` is
    /// what the team still has to earn.
    NeedsPoints { threshold: i64, additional: i64 },
    /// Even winning every remaining match is not enough.
    CannotSelfSave,
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub team: TeamId,
    pub verdict: Verdict,
    /// Highest final total with which the team can still be relegated.
    pub ceiling: Option<i64>,
    /// The end of season reaching `ceiling`.
    pub scenario: Option<Scenario>,
}

pub struct LeagueVars {
    pub outcomes: OutcomeVars,
    pub totals: TotalVars,
    pub w_table: Dominance,
    pub w_average: Dominance,
    pub relegation: RelegationVars,
}

/// The complete relegation model of one league, before any team is singled out.
pub struct LeagueModel {
    pub model: Model,
    pub vars: LeagueVars,
}

impl LeagueModel {
    pub fn build(league: &League, rules: &Rules, constants: &Constants) -> LeagueModel {
        let mut model = Model::new();
        let outcomes = encode_outcomes(&mut model, league);
        let totals = accumulate(&mut model, league, &outcomes.points);
        let w_table = dominance(
            &mut model,
            league,
            &totals.total,
            Strictness { big_m: constants.table_m, epsilon: constants.table_epsilon },
            "points",
        );
        let w_average = dominance(
            &mut model,
            league,
            &totals.average,
            Strictness { big_m: constants.average_m, epsilon: constants.average_epsilon },
            "average",
        );
        let relegation = classify(&mut model, league, rules, &w_table, &w_average, constants.count_m);

        LeagueModel { model, vars: LeagueVars { outcomes, totals, w_table, w_average, relegation } }
    }

    /// Sends `target` down by exactly one criterion and maximises its total.
    pub fn target(&mut self, league: &League, target: TeamId) {
        let r = &self.vars.relegation;
        self.model.add_named(
            format!("{} relegated", league.team(target).name),
            linear(vec![(1.0, r.by_table[target]), (1.0, r.by_average[target])]).eq(1.0),
        );
        self.model.maximise(self.vars.totals.total[target]);
    }

    /// Holds `target` on `ceiling` points and minimises the total of the
    /// nearest other team finishing on `ceiling` or more.
    pub fn nearest_above(&mut self, league: &League, target: TeamId, ceiling: i64, big_m: f64) {
        let total = &self.vars.totals.total;
        let floor = ceiling as f64;
        self.model.add_named(
            format!("{} on {} points", league.team(target).name, ceiling),
            linear(vec![(1.0, total[target])]).eq(floor),
        );

        let top = league.teams().iter().map(|t| t.max_points()).max().unwrap_or(ceiling) as f64;
        let nearest = self.model.new_real("nearest total above", floor, Some(top.max(floor)));
        let mut picks = Vec::new();
        for j in league.team_ids().filter(|j| *j != target) {
            let pick = self.model.new_bool(format!("{} nearest above", league.team(j).name));
            // pick => total[j] >= ceiling and nearest >= total[j]
            self.model.add(linear(vec![(1.0, total[j]), (-big_m, pick)]).geq(floor - big_m));
            self.model.add(linear(vec![(1.0, nearest), (-1.0, total[j]), (-big_m, pick)]).geq(-big_m));
            picks.push((1.0, pick));
        }
        self.model.add_named("one nearest team", linear(picks).eq(1.0));
        self.model.minimise(nearest);
    }
}

impl LeagueVars {
    pub fn decode(&self, league: &League, a: &Assignment) -> Scenario {
        let o = &self.outcomes;
        let fixtures = league
            .fixtures()
            .iter()
            .map(|f| {
                let (h, w) = ((f.round, f.home), (f.round, f.away));
                FixtureOutcome {
                    fixture: *f,
                    home_win: a.flag(o.win[&h]),
                    home_draw: a.flag(o.draw[&h]),
                    away_win: a.flag(o.win[&w]),
                    away_draw: a.flag(o.draw[&w]),
                    home_points: a.integer(o.points[&h]),
                    away_points: a.integer(o.points[&w]),
                }
            })
            .collect();

        let teams = league
            .teams()
            .iter()
            .enumerate()
            .map(|(id, t)| TeamOutcome {
                team: id,
                points_before: t.points,
                new_points: a.integer(self.totals.remaining[id]),
                total: a.integer(self.totals.total[id]),
                average: a.value(self.totals.average[id]),
                by_table: a.flag(self.relegation.by_table[id]),
                by_average: a.flag(self.relegation.by_average[id]),
            })
            .collect();

        Scenario { fixtures, teams }
    }
}

/// Runs the survival analysis for any team of one league.
pub struct Analyst<'a, B: Backend> {
    league: &'a League,
    rules: Rules,
    constants: Constants,
    backend: B,
}

impl<'a, B: Backend> Analyst<'a, B> {
    pub fn new(league: &'a League, rules: Rules, encoding: &Encoding, backend: B) -> Result<Self, LeagueError> {
        rules.check(league)?;
        let constants = encoding.resolve(league);
        Ok(Analyst { league, rules, constants, backend })
    }

    pub fn league(&self) -> &League {
        self.league
    }

    /// Fails with `SolveError::UnknownTeam` when `target` is not a team of the league.
    pub fn analyse(&self, target: TeamId) -> Result<Analysis, SolveError> {
        let league = self.league;
        if target >= league.teams().len() {
            return Err(SolveError::UnknownTeam(target));
        }
        let team = league.team(target);

        let mut built = LeagueModel::build(league, &self.rules, &self.constants);
        built.target(league, target);
        debug!(
            "Model for {} has vars {} constraints {}",
            team.name,
            built.model.num_variables(),
            built.model.num_constraints()
        );

        let LeagueModel { model, vars } = built;
        let assignment = match self.backend.solve(model)? {
            Outcome::Infeasible => {
                info!("{} cannot be relegated", team.name);
                return Ok(Analysis { team: target, verdict: Verdict::Safe, ceiling: None, scenario: None });
            }
            Outcome::Optimal(a) => a,
        };

        let scenario = vars.decode(league, &assignment);
        verify_scenario(league, &self.rules, &scenario).map_err(SolveError::Inconsistent)?;

        let ceiling = scenario.teams[target].total;
        let scenario = match self.nearest_scenario(target, ceiling)? {
            Some(s) => s,
            None => {
                debug!("no team can finish level with or above {} on {}", team.name, ceiling);
                scenario
            }
        };
        let verdict = verdict(league, &scenario, target, ceiling);
        info!("{} can be relegated with up to {} points: {:?}", team.name, ceiling, verdict);
        debug!("{}", scenario.results_summary(league));

        Ok(Analysis { team: target, verdict, ceiling: Some(ceiling), scenario: Some(scenario) })
    }

    /// The worst case for `target` on `ceiling` points with the closest
    /// possible pursuer, or `None` when every other team finishes below.
    fn nearest_scenario(&self, target: TeamId, ceiling: i64) -> Result<Option<Scenario>, SolveError> {
        let league = self.league;
        let mut built = LeagueModel::build(league, &self.rules, &self.constants);
        built.target(league, target);
        built.nearest_above(league, target, ceiling, self.constants.table_m);

        let LeagueModel { model, vars } = built;
        let assignment = match self.backend.solve(model)? {
            Outcome::Infeasible => return Ok(None),
            Outcome::Optimal(a) => a,
        };
        let scenario = vars.decode(league, &assignment);
        verify_scenario(league, &self.rules, &scenario).map_err(SolveError::Inconsistent)?;
        if scenario.teams[target].total != ceiling {
            return Err(SolveError::Inconsistent(format!(
                "{} moved off its ceiling of {}",
                league.team(target).name,
                ceiling
            )));
        }
        Ok(Some(scenario))
    }

    pub fn analyse_all(&self) -> Vec<Result<Analysis, SolveError>> {
        self.league.team_ids().map(|t| self.analyse(t)).collect()
    }
}

/// The team has to pass whoever finishes immediately above it in the worst
/// case. When nobody does, it has to beat its own ceiling.
pub fn verdict(league: &League, scenario: &Scenario, target: TeamId, ceiling: i64) -> Verdict {
    let team = league.team(target);
    let limit = scenario.next_above(target).unwrap_or(ceiling);
    let threshold = limit + 1;
    if team.max_points() < threshold {
        Verdict::CannotSelfSave
    } else {
        Verdict::NeedsPoints { threshold, additional: (threshold - team.points).max(0) }
    }
}
