//! Solve orchestration over the mesh hierarchy
//!
//! Chooses between one composite solve across every level and a sequence of
//! single-level solves, builds the matching operators and drives the injected
//! engine. Engine failures are returned as they are, tagged with the level; there
//! is no retry and no fallback.

use super::builder::{DiffusionOperatorBuilder, P1Coefficients};
use super::timer::SolveTimer;
use crate::amr::{average_cellcenter_to_face, MultiFab, SPACEDIM};
use crate::config::{ConfigError, MlmgParams};
use crate::elliptic::{AbecOperator, EllipticEngine, EngineError, MlmgControls, SolveReport};
use crate::hierarchy::AmrHierarchy;
use tracing::{debug, info};

/// How the levels of the hierarchy are solved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStrategy {
    /// One operator over every level, one engine call
    Composite,
    /// One operator and one engine call per level, coarse to fine
    PerLevel {
        /// Copy the reference solution into every level but the finest instead of
        /// solving them
        fine_level_only: bool,
    },
}

impl SolveStrategy {
    #[must_use]
    pub fn from_params(params: &MlmgParams) -> Self {
        if params.composite_solve {
            SolveStrategy::Composite
        } else {
            SolveStrategy::PerLevel {
                fine_level_only: params.fine_level_solve_only,
            }
        }
    }
}

/// What happened to one level in a per-level solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LevelOutcome {
    Solved(SolveReport),
    CopiedFromReference,
}

/// Result of a successful solve
#[derive(Debug, Clone, PartialEq)]
pub enum SolveSummary {
    Composite(SolveReport),
    PerLevel(Vec<LevelOutcome>),
}

/// Drives an [`EllipticEngine`] over a hierarchy
#[derive(Debug, Clone)]
pub struct EllipticSolveOrchestrator<E> {
    engine: E,
    params: MlmgParams,
    builder: DiffusionOperatorBuilder,
}

impl<E: EllipticEngine> EllipticSolveOrchestrator<E> {
    /// Orchestrator using the P1 coefficients
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `params` fails validation
    pub fn new(engine: E, params: MlmgParams) -> Result<Self, ConfigError> {
        Self::with_coefficients(engine, params, P1Coefficients::P1)
    }

    /// Orchestrator using custom operator weights
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `params` fails validation
    pub fn with_coefficients(
        engine: E,
        params: MlmgParams,
        coefficients: P1Coefficients,
    ) -> Result<Self, ConfigError> {
        params.validate()?;
        let builder = DiffusionOperatorBuilder::new(&params, coefficients);
        Ok(Self {
            engine,
            params,
            builder,
        })
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[must_use]
    pub fn params(&self) -> &MlmgParams {
        &self.params
    }

    #[must_use]
    pub fn strategy(&self) -> SolveStrategy {
        SolveStrategy::from_params(&self.params)
    }

    /// Solve for `solution` on every level
    ///
    /// # Arguments
    ///
    /// * `hierarchy` - Mesh hierarchy the fields live on
    /// * `solution` - Initial guess and boundary values; overwritten with the solution
    /// * `alpha` - Cell-centred A coefficient
    /// * `beta` - Cell-centred B coefficient, averaged onto faces here
    /// * `rhs` - Right-hand side
    /// * `reference` - Reference solution copied into skipped levels
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::FieldCountMismatch`] or
    /// [`SolveError::FieldLayoutMismatch`] before touching any field, or
    /// [`SolveError::Engine`] when the engine fails. Levels solved before an engine
    /// failure keep their new values.
    pub fn solve(
        &self,
        hierarchy: &AmrHierarchy,
        solution: &mut [MultiFab],
        alpha: &[MultiFab],
        beta: &[MultiFab],
        rhs: &[MultiFab],
        reference: &[MultiFab],
    ) -> Result<SolveSummary, SolveError> {
        for (field, levels) in [
            ("solution", &*solution),
            ("alpha", alpha),
            ("beta", beta),
            ("rhs", rhs),
            ("reference", reference),
        ] {
            check_field(hierarchy, field, levels)?;
        }

        let strategy = self.strategy();
        info!(
            "P1 solve: {:?} over {} levels, reltol {:e}, abstol {:e}",
            strategy,
            hierarchy.num_levels(),
            self.params.reltol,
            self.params.abstol
        );

        match strategy {
            SolveStrategy::Composite => self
                .solve_composite(hierarchy, solution, alpha, beta, rhs)
                .map(SolveSummary::Composite),
            SolveStrategy::PerLevel { fine_level_only } => self
                .solve_per_level(
                    hierarchy,
                    solution,
                    alpha,
                    beta,
                    rhs,
                    reference,
                    fine_level_only,
                )
                .map(SolveSummary::PerLevel),
        }
    }

    fn solve_composite(
        &self,
        hierarchy: &AmrHierarchy,
        solution: &mut [MultiFab],
        alpha: &[MultiFab],
        beta: &[MultiFab],
        rhs: &[MultiFab],
    ) -> Result<SolveReport, SolveError> {
        let beta_faces: Vec<[MultiFab; SPACEDIM]> = beta
            .iter()
            .enumerate()
            .map(|(level, b)| average_cellcenter_to_face(b, hierarchy.geometry(level)))
            .collect();
        let op = self
            .builder
            .build_composite(hierarchy, solution, alpha, beta_faces);

        let mut phi: Vec<&mut MultiFab> = solution.iter_mut().collect();
        let rhs: Vec<&MultiFab> = rhs.iter().collect();
        let report = {
            let _timer = SolveTimer::new("Composite solve", None);
            self.run_engine(&op, &mut phi, &rhs)
                .map_err(|source| SolveError::Engine {
                    level: None,
                    source,
                })?
        };
        debug!(
            "Composite solve converged in {} iterations (residual {:e})",
            report.iterations, report.final_residual
        );
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn solve_per_level(
        &self,
        hierarchy: &AmrHierarchy,
        solution: &mut [MultiFab],
        alpha: &[MultiFab],
        beta: &[MultiFab],
        rhs: &[MultiFab],
        reference: &[MultiFab],
        fine_level_only: bool,
    ) -> Result<Vec<LevelOutcome>, SolveError> {
        let nlevels = hierarchy.num_levels();
        let first_solved = if fine_level_only { nlevels - 1 } else { 0 };
        let mut outcomes = Vec::with_capacity(nlevels);

        for level in 0..nlevels {
            if level < first_solved {
                solution[level].copy_from(&reference[level], 0, 0, 1, 0);
                debug!("Level {} copied from reference solution", level);
                outcomes.push(LevelOutcome::CopiedFromReference);
                continue;
            }

            let beta_faces = average_cellcenter_to_face(&beta[level], hierarchy.geometry(level));
            let (coarser, rest) = solution.split_at_mut(level);
            let phi = &mut rest[0];
            let op = self.builder.build_level(
                hierarchy,
                level,
                phi,
                coarser.last(),
                &alpha[level],
                beta_faces,
            );

            let report = {
                let _timer = SolveTimer::new("Level solve", Some(level));
                self.run_engine(&op, &mut [phi], &[&rhs[level]])
                    .map_err(|source| SolveError::Engine {
                        level: Some(level),
                        source,
                    })?
            };
            debug!(
                "Level {} converged in {} iterations (residual {:e})",
                level, report.iterations, report.final_residual
            );
            outcomes.push(LevelOutcome::Solved(report));
        }

        Ok(outcomes)
    }

    fn run_engine(
        &self,
        op: &AbecOperator<'_>,
        phi: &mut [&mut MultiFab],
        rhs: &[&MultiFab],
    ) -> Result<SolveReport, EngineError> {
        let controls = MlmgControls::from_params(&self.params);
        self.engine.solve(
            op,
            &controls,
            phi,
            rhs,
            self.params.reltol,
            self.params.abstol,
        )
    }
}

fn check_field(
    hierarchy: &AmrHierarchy,
    field: &'static str,
    levels: &[MultiFab],
) -> Result<(), SolveError> {
    if levels.len() != hierarchy.num_levels() {
        return Err(SolveError::FieldCountMismatch {
            field,
            expected: hierarchy.num_levels(),
            found: levels.len(),
        });
    }
    for (level, mf) in levels.iter().enumerate() {
        if mf.box_array() != hierarchy.box_array(level)
            || mf.distribution_map() != hierarchy.distribution_map(level)
        {
            return Err(SolveError::FieldLayoutMismatch { field, level });
        }
    }
    Ok(())
}

/// Errors raised by a solve
#[derive(Debug, Clone, PartialEq)]
pub enum SolveError {
    /// A field array does not have one entry per level
    FieldCountMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    /// A field does not use its level's box array and distribution map
    FieldLayoutMismatch { field: &'static str, level: usize },
    /// The engine failed; `level` is `None` for composite solves
    Engine {
        level: Option<usize>,
        source: EngineError,
    },
}

impl std::fmt::Display for SolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolveError::FieldCountMismatch {
                field,
                expected,
                found,
            } => write!(
                f,
                "Field '{field}' has {found} levels, hierarchy has {expected}"
            ),
            SolveError::FieldLayoutMismatch { field, level } => write!(
                f,
                "Field '{field}' on level {level} does not match the level layout"
            ),
            SolveError::Engine {
                level: Some(level),
                source,
            } => write!(f, "Solve failed on level {level}: {source}"),
            SolveError::Engine {
                level: None,
                source,
            } => write!(f, "Composite solve failed: {source}"),
        }
    }
}

impl std::error::Error for SolveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SolveError::Engine { source, .. } => Some(source),
            _ => None,
        }
    }
}
