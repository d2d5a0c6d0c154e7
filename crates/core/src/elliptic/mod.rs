//! Elliptic operator and solver engine seam
//!
//! The orchestrator never solves anything itself. It fills an [`AbecOperator`]
//! and calls an [`EllipticEngine`]; [`GaussSeidelEngine`] is the in-crate
//! reference engine.

mod engine;
mod gauss_seidel;
mod operator;

pub use engine::{BottomSolver, EllipticEngine, EngineError, MlmgControls, SolveReport};
pub use gauss_seidel::GaussSeidelEngine;
pub use operator::{AbecOperator, CoarseFineBc, LinOpBcType, LpInfo};
