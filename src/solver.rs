//! Thin model registry in front of a MILP backend.
//!
//! A `Model` owns every variable and constraint of one optimisation run. It
//! is handed to a `Backend` by value, so nothing of a run survives into the
//! next one.

use good_lp::{variable, Constraint, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable};
use log::*;
use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolveError {
    #[error("solver gave up after {0:?}")]
    Timeout(Duration),
    #[error("objective is unbounded")]
    Unbounded,
    #[error("solver failed: {0}")]
    Backend(String),
    #[error("solution violates the model invariants: {0}")]
    Inconsistent(String),
    #[error("no team with id {0}")]
    UnknownTeam(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sense {
    Maximise,
    Minimise,
}

pub struct Model {
    vars: ProblemVariables,
    declared: Vec<Variable>,
    constraints: Vec<Constraint>,
    constraint_names: Vec<Option<String>>,
    objective: (Sense, Expression),
}

impl Default for Model {
    fn default() -> Self {
        Model::new()
    }
}

impl Model {
    pub fn new() -> Model {
        Model {
            vars: ProblemVariables::new(),
            declared: Vec::new(),
            constraints: Vec::new(),
            constraint_names: Vec::new(),
            objective: (Sense::Maximise, Expression::from(0.0)),
        }
    }

    pub fn new_bool(&mut self, name: impl Into<String>) -> Variable {
        let v = self.vars.add(variable().binary().name(name));
        self.declared.push(v);
        v
    }

    /// Integer variable in `[min, max]`, unbounded above when `max` is `None`.
    pub fn new_integer(&mut self, name: impl Into<String>, min: f64, max: Option<f64>) -> Variable {
        let mut def = variable().integer().min(min).name(name);
        if let Some(max) = max {
            def = def.max(max);
        }
        let v = self.vars.add(def);
        self.declared.push(v);
        v
    }

    pub fn new_real(&mut self, name: impl Into<String>, min: f64, max: Option<f64>) -> Variable {
        let mut def = variable().min(min).name(name);
        if let Some(max) = max {
            def = def.max(max);
        }
        let v = self.vars.add(def);
        self.declared.push(v);
        v
    }

    pub fn add(&mut self, constraint: Constraint) {
        self.constraints.push(constraint);
        self.constraint_names.push(None);
    }

    pub fn add_named(&mut self, name: impl Into<String>, constraint: Constraint) {
        self.constraints.push(constraint);
        self.constraint_names.push(Some(name.into()));
    }

    pub fn maximise(&mut self, objective: impl Into<Expression>) {
        self.objective = (Sense::Maximise, objective.into());
    }

    pub fn minimise(&mut self, objective: impl Into<Expression>) {
        self.objective = (Sense::Minimise, objective.into());
    }

    pub fn num_variables(&self) -> usize {
        self.declared.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraint_names(&self) -> impl Iterator<Item = &str> {
        self.constraint_names.iter().filter_map(|n| n.as_deref())
    }

    fn solve_microlp(self) -> Result<Outcome, SolveError> {
        let Model { vars, declared, constraints, objective, .. } = self;
        let problem = match objective.0 {
            Sense::Maximise => vars.maximise(objective.1),
            Sense::Minimise => vars.minimise(objective.1),
        };
        let mut problem = problem.using(good_lp::microlp);
        for c in constraints {
            problem = problem.with(c);
        }

        match problem.solve() {
            Ok(solution) => {
                let values = declared.iter().map(|v| (*v, solution.value(*v))).collect();
                Ok(Outcome::Optimal(Assignment { values }))
            }
            Err(ResolutionError::Infeasible) => Ok(Outcome::Infeasible),
            Err(ResolutionError::Unbounded) => Err(SolveError::Unbounded),
            Err(e) => Err(SolveError::Backend(e.to_string())),
        }
    }
}

/// Values of every declared variable in an optimal solution.
#[derive(Debug, Clone)]
pub struct Assignment {
    values: HashMap<Variable, f64>,
}

impl Assignment {
    pub fn value(&self, v: Variable) -> f64 {
        debug_assert!(self.values.contains_key(&v), "{:?} is not part of this model", v);
        self.values.get(&v).copied().unwrap_or(0.0)
    }

    pub fn integer(&self, v: Variable) -> i64 {
        self.value(v).round() as i64
    }

    pub fn flag(&self, v: Variable) -> bool {
        self.value(v) > 0.5
    }
}

#[derive(Debug, Clone)]
pub enum Outcome {
    Optimal(Assignment),
    Infeasible,
}

pub trait Backend {
    fn solve(&self, model: Model) -> Result<Outcome, SolveError>;
}

/// `good_lp`'s pure-Rust `microlp` solver, with an optional wall-clock budget.
///
/// `microlp` cannot be interrupted. A solve that runs out of time keeps its
/// worker thread until it finishes, and the next solve waits for it before
/// starting, so at most one solver thread runs at a time.
#[derive(Debug, Default)]
pub struct MicroLp {
    time_limit: Option<Duration>,
    abandoned: Mutex<Option<JoinHandle<()>>>,
}

impl MicroLp {
    pub fn new(time_limit: Option<Duration>) -> MicroLp {
        MicroLp { time_limit, abandoned: Mutex::new(None) }
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    /// Whether a solve that ran out of time is still working.
    pub fn has_abandoned_solve(&self) -> bool {
        self.abandoned().as_ref().map_or(false, |h| !h.is_finished())
    }

    fn abandoned(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.abandoned.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn settle_abandoned(&self) {
        let handle = self.abandoned().take();
        if let Some(handle) = handle {
            if !handle.is_finished() {
                warn!("Waiting for a solve that ran out of time");
            }
            if handle.join().is_err() {
                warn!("A solve that ran out of time panicked");
            }
        }
    }
}

impl Backend for MicroLp {
    fn solve(&self, model: Model) -> Result<Outcome, SolveError> {
        info!("Solving with vars {} constraints {}", model.num_variables(), model.num_constraints());
        let start = Instant::now();

        let result = match self.time_limit {
            None => model.solve_microlp(),
            Some(limit) => {
                self.settle_abandoned();
                let (tx, rx) = mpsc::channel();
                let handle = thread::Builder::new()
                    .name("microlp".to_string())
                    .spawn(move || {
                        // The receiver is gone once the budget has expired.
                        let _ = tx.send(model.solve_microlp());
                    })
                    .map_err(|e| SolveError::Backend(e.to_string()))?;

                match rx.recv_timeout(limit) {
                    Ok(result) => {
                        let _ = handle.join();
                        result
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        *self.abandoned() = Some(handle);
                        Err(SolveError::Timeout(limit))
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        let _ = handle.join();
                        Err(SolveError::Backend("solver thread stopped without a result".to_string()))
                    }
                }
            }
        };

        debug!("Solve finished in {:?}", start.elapsed());
        result
    }
}

/// Sum of `coefficient * variable` terms.
pub fn linear(terms: impl IntoIterator<Item = (f64, Variable)>) -> Expression {
    let mut e = Expression::default();
    for (c, v) in terms {
        e.add_mul(c, v);
    }
    e
}
