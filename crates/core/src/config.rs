//! Solver configuration
//!
//! Plain parameter structs with defaults. They derive serde so callers can load
//! them from whatever input format their application already uses.

use serde::{Deserialize, Serialize};

/// Mesh-hierarchy parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmrParams {
    /// Refinement ratio between every pair of consecutive levels, on every axis
    pub ref_ratio: i32,
    /// Output path handed to the diagnostic sink
    pub plot_file_name: String,
}

impl Default for AmrParams {
    fn default() -> Self {
        Self {
            ref_ratio: 2,
            plot_file_name: "plt".to_string(),
        }
    }
}

/// Multigrid solve parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MlmgParams {
    /// Solver log level
    pub verbose: u32,
    /// Bottom (coarsest) solver log level
    pub bottom_verbose: u32,
    /// Solve all levels as one composite system instead of level by level
    pub composite_solve: bool,
    /// In level-by-level mode, copy the reference solution into every level but the
    /// finest instead of solving them
    pub fine_level_solve_only: bool,
    /// Maximum solver iterations
    pub max_iter: u32,
    /// Maximum full-multigrid iterations
    pub max_fmg_iter: u32,
    /// Maximum number of coarsening levels below each AMR level
    pub max_coarsening_level: u32,
    /// Merge small grids on coarse multigrid levels
    pub agglomeration: bool,
    /// Gather coarse multigrid levels onto fewer owners
    pub consolidation: bool,
    /// Discretisation order of the boundary stencils
    pub linop_maxorder: u32,
    /// Relative convergence tolerance
    pub reltol: f64,
    /// Absolute convergence tolerance
    pub abstol: f64,
}

impl Default for MlmgParams {
    fn default() -> Self {
        Self {
            verbose: 0,
            bottom_verbose: 0,
            composite_solve: true,
            fine_level_solve_only: false,
            max_iter: 100,
            max_fmg_iter: 0,
            max_coarsening_level: 30,
            agglomeration: true,
            consolidation: true,
            linop_maxorder: 2,
            reltol: 1.0e-11,
            abstol: 0.0,
        }
    }
}

impl MlmgParams {
    /// Check the knobs for values no solve could honour
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] naming the first offending knob
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_iter == 0 {
            return Err(ConfigError::invalid("max_iter", "must be at least 1"));
        }
        if self.linop_maxorder < 2 {
            return Err(ConfigError::invalid("linop_maxorder", "must be at least 2"));
        }
        for (name, tol) in [("reltol", self.reltol), ("abstol", self.abstol)] {
            if !tol.is_finite() || tol < 0.0 {
                return Err(ConfigError::invalid(
                    name,
                    &format!("must be finite and non-negative, got {tol}"),
                ));
            }
        }
        if self.reltol == 0.0 && self.abstol == 0.0 {
            return Err(ConfigError::invalid(
                "reltol",
                "reltol and abstol cannot both be zero",
            ));
        }
        Ok(())
    }
}

/// Complete radiation solver configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RadiationConfig {
    /// Mesh-hierarchy parameters
    pub amr: AmrParams,
    /// Multigrid parameters
    pub mlmg: MlmgParams,
}

impl RadiationConfig {
    /// Validate both parameter groups
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidParameter`] naming the first offending knob
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.amr.ref_ratio < 2 {
            return Err(ConfigError::invalid(
                "ref_ratio",
                &format!("must be at least 2, got {}", self.amr.ref_ratio),
            ));
        }
        self.mlmg.validate()
    }
}

/// Errors raised while validating configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A knob holds a value no solve could honour
    InvalidParameter {
        /// Knob name
        name: String,
        /// What is wrong with it
        reason: String,
    },
}

impl ConfigError {
    fn invalid(name: &str, reason: &str) -> Self {
        Self::InvalidParameter {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidParameter { name, reason } => {
                write!(f, "Invalid parameter '{name}': {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
