//! Points a team needs to be sure of avoiding relegation in a league that
//! sends teams down both by the season table and by a multi-season average.
//!
//! For every team a mixed-integer model of the remaining fixtures is built in
//! which the team is forced down, and its final total is maximised. See
//! [`survival::Analyst`].

pub mod accumulate;
pub mod classify;
pub mod config;
pub mod input;
pub mod league;
pub mod outcomes;
pub mod ranking;
pub mod report;
pub mod scenario;
pub mod solver;
pub mod survival;
pub mod verify;

pub use config::{Encoding, Rules};
pub use league::{FixtureRecord, League, LeagueError, Standing, TeamId};
pub use solver::{Backend, MicroLp, SolveError};
pub use survival::{Analysis, Analyst, Verdict};
