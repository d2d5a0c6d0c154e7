//! Elliptic solver engine contract
//!
//! The multigrid engine is an injected dependency: the orchestrator assembles an
//! [`AbecOperator`] and hands it to any [`EllipticEngine`] together with the
//! solution and right-hand-side arrays of the levels the operator spans.

use super::operator::AbecOperator;
use crate::amr::MultiFab;
use crate::config::MlmgParams;
use serde::{Deserialize, Serialize};

/// Bottom (coarsest-level) solver backends an engine may offer
///
/// Reserved: nothing in this crate selects one yet, and engines may ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BottomSolver {
    Smoother,
    BiCgStab,
    Cg,
    Hypre,
    Petsc,
}

/// Iteration and logging controls passed to every engine solve
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MlmgControls {
    pub max_iter: u32,
    pub max_fmg_iter: u32,
    pub verbose: u32,
    pub bottom_verbose: u32,
    pub bottom_solver: Option<BottomSolver>,
}

impl MlmgControls {
    /// Controls taken from the multigrid parameters
    ///
    /// `bottom_solver` is left unset.
    #[must_use]
    pub fn from_params(params: &MlmgParams) -> Self {
        Self {
            max_iter: params.max_iter,
            max_fmg_iter: params.max_fmg_iter,
            verbose: params.verbose,
            bottom_verbose: params.bottom_verbose,
            bottom_solver: None,
        }
    }
}

/// Convergence diagnostics of one engine solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    pub iterations: u32,
    pub initial_residual: f64,
    pub final_residual: f64,
}

/// External multigrid solver contract
pub trait EllipticEngine {
    /// Solve `op · solution = rhs` in place
    ///
    /// # Arguments
    ///
    /// * `op` - Complete operator spanning `solution.len()` levels
    /// * `controls` - Iteration caps and verbosity
    /// * `solution` - Initial guess on entry, solution on success, one per level
    /// * `rhs` - Right-hand side, one per level
    /// * `rel_tol` - Tolerance relative to the initial residual
    /// * `abs_tol` - Absolute residual tolerance
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NotConverged`] when the iteration cap is reached
    /// first, or another [`EngineError`] when the inputs are inconsistent
    fn solve(
        &self,
        op: &AbecOperator<'_>,
        controls: &MlmgControls,
        solution: &mut [&mut MultiFab],
        rhs: &[&MultiFab],
        rel_tol: f64,
        abs_tol: f64,
    ) -> Result<SolveReport, EngineError>;
}

/// Errors raised by an elliptic engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// A level is missing its A or B coefficients
    MissingCoefficients { level: usize },
    /// A level is missing its boundary values
    MissingLevelBc { level: usize },
    /// A level does not cover its domain and no coarser solution was linked
    MissingCoarseData,
    /// A field does not match the layout of its operator level
    LayoutMismatch { what: &'static str, level: usize },
    /// Solution or rhs level counts differ from the operator's
    LevelCountMismatch {
        operator: usize,
        solution: usize,
        rhs: usize,
    },
    /// The iteration cap was reached before the residual target
    NotConverged {
        iterations: u32,
        residual: f64,
        target: f64,
    },
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::MissingCoefficients { level } => {
                write!(f, "Operator level {level} has no A/B coefficients")
            }
            EngineError::MissingLevelBc { level } => {
                write!(f, "Operator level {level} has no boundary values")
            }
            EngineError::MissingCoarseData => write!(
                f,
                "Operator level does not cover its domain and has no coarse-fine boundary"
            ),
            EngineError::LayoutMismatch { what, level } => {
                write!(f, "Operator {what} on level {level} do not match the level layout")
            }
            EngineError::LevelCountMismatch {
                operator,
                solution,
                rhs,
            } => write!(
                f,
                "Operator spans {operator} levels but got {solution} solution and {rhs} rhs fields"
            ),
            EngineError::NotConverged {
                iterations,
                residual,
                target,
            } => write!(
                f,
                "Elliptic solve failed to converge after {iterations} iterations \
                 (residual {residual:e}, target {target:e})"
            ),
        }
    }
}

impl std::error::Error for EngineError {}
