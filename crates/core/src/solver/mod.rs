//! P1 radiation solve
//!
//! Operator assembly from radiation fields and the strategy logic that drives an
//! elliptic engine over the hierarchy.

mod builder;
mod orchestrator;
mod timer;

pub use builder::{DiffusionOperatorBuilder, P1Coefficients};
pub use orchestrator::{
    EllipticSolveOrchestrator, LevelOutcome, SolveError, SolveStrategy, SolveSummary,
};
pub use timer::SolveTimer;
