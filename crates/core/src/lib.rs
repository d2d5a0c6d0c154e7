//! P1 Radiation Core Library
//!
//! Radiative heat transfer in the P1 approximation on a block-structured adaptive
//! mesh. The radiative intensity moment `phi` satisfies the diffusion equation
//!
//! ```text
//! a * alpha * phi - b * div(beta * grad(phi)) = rhs
//! ```
//!
//! with `a = 1` and `b = 1/3`, where `alpha` is the local absorption coefficient.
//!
//! ## Components
//!
//! - [`spectral`] - Planck-mean absorption of CO2, H2O, CO and soot from 20 K tables
//! - [`hierarchy`] / [`fields`] - validated level hierarchy and per-level field storage
//! - [`solver`] - operator assembly and composite or level-by-level solve strategies
//! - [`elliptic`] - the engine seam, with a Gauss-Seidel reference engine
//! - [`export`] - six-component diagnostic plots through a pluggable sink
//! - `gpu` (feature `gpu`) - absorption kernel on wgpu compute

// Mesh model
pub mod amr;

// Configuration and core types
pub mod config;
pub mod core_types;

// Radiation solve
pub mod elliptic;
pub mod fields;
pub mod hierarchy;
pub mod solver;

// Absorption model
pub mod spectral;

// Diagnostics
pub mod export;

// GPU acceleration (optional)
#[cfg(feature = "gpu")]
pub mod gpu;

// Re-export the main entry points
pub use config::{AmrParams, ConfigError, MlmgParams, RadiationConfig};
pub use core_types::Kelvin;
pub use elliptic::{EllipticEngine, EngineError, GaussSeidelEngine, SolveReport};
pub use export::{ExportError, MemoryPlotSink, PlotSink, ResultExporter};
pub use fields::RadiationFieldSet;
pub use hierarchy::{AmrHierarchy, HierarchyError};
pub use solver::{EllipticSolveOrchestrator, P1Coefficients, SolveError, SolveSummary};
pub use spectral::{AbsorptionTable, GasCellState, Species, SpectralDatabase, SpectralError};
