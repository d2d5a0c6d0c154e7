//! Per-level radiation field storage
//!
//! One [`RadiationFieldSet`] owns every field of every level: the solution, the
//! reference solution used for validation, the right-hand side and the two
//! operator coefficients. All fields of a level share that level's box array and
//! distribution map.

use crate::amr::MultiFab;
use crate::elliptic::EllipticEngine;
use crate::export::{DiagnosticFields, ExportError, PlotSink, ResultExporter};
use crate::hierarchy::AmrHierarchy;
use crate::solver::{EllipticSolveOrchestrator, SolveError, SolveSummary};
use tracing::debug;

/// Ghost layers carried by the solution field
pub const PHI_GHOST_CELLS: usize = 1;

/// Ghost layers carried by every other field
pub const COEF_GHOST_CELLS: usize = 0;

/// Solution, reference, rhs and coefficient fields for every level
#[derive(Debug, Clone, PartialEq)]
pub struct RadiationFieldSet {
    phi: Vec<MultiFab>,
    phi_exact: Vec<MultiFab>,
    rhs: Vec<MultiFab>,
    acoef: Vec<MultiFab>,
    bcoef: Vec<MultiFab>,
}

impl RadiationFieldSet {
    /// Allocate every field on every level of `hierarchy`
    ///
    /// The solution gets [`PHI_GHOST_CELLS`] ghost layers and is zeroed, ghosts
    /// included. The other fields are allocated without ghosts and also start at
    /// zero; the caller fills them before solving. Calling this again with the same
    /// hierarchy reproduces the same allocation.
    ///
    /// # Arguments
    ///
    /// * `hierarchy` - Validated mesh hierarchy
    ///
    /// # Returns
    ///
    /// Field set with one entry per level in each field array
    #[must_use]
    pub fn init_data(hierarchy: &AmrHierarchy) -> Self {
        let alloc = |ngrow: usize| -> Vec<MultiFab> {
            (0..hierarchy.num_levels())
                .map(|lev| {
                    MultiFab::define(
                        hierarchy.box_array(lev),
                        hierarchy.distribution_map(lev),
                        1,
                        ngrow,
                    )
                })
                .collect()
        };

        let mut phi = alloc(PHI_GHOST_CELLS);
        for mf in &mut phi {
            mf.set_val(0.0);
        }

        debug!(
            "Allocated radiation fields on {} levels",
            hierarchy.num_levels()
        );

        Self {
            phi,
            phi_exact: alloc(COEF_GHOST_CELLS),
            rhs: alloc(COEF_GHOST_CELLS),
            acoef: alloc(COEF_GHOST_CELLS),
            bcoef: alloc(COEF_GHOST_CELLS),
        }
    }

    /// Number of levels
    #[must_use]
    pub fn num_levels(&self) -> usize {
        self.phi.len()
    }

    /// Solution on every level
    #[must_use]
    pub fn phi(&self) -> &[MultiFab] {
        &self.phi
    }

    pub fn phi_mut(&mut self) -> &mut [MultiFab] {
        &mut self.phi
    }

    /// Reference solution on every level
    #[must_use]
    pub fn phi_exact(&self) -> &[MultiFab] {
        &self.phi_exact
    }

    pub fn phi_exact_mut(&mut self) -> &mut [MultiFab] {
        &mut self.phi_exact
    }

    /// Right-hand side on every level
    #[must_use]
    pub fn rhs(&self) -> &[MultiFab] {
        &self.rhs
    }

    pub fn rhs_mut(&mut self) -> &mut [MultiFab] {
        &mut self.rhs
    }

    /// Cell-centred A coefficient (absorption) on every level
    #[must_use]
    pub fn acoef(&self) -> &[MultiFab] {
        &self.acoef
    }

    pub fn acoef_mut(&mut self) -> &mut [MultiFab] {
        &mut self.acoef
    }

    /// Cell-centred B coefficient on every level
    #[must_use]
    pub fn bcoef(&self) -> &[MultiFab] {
        &self.bcoef
    }

    pub fn bcoef_mut(&mut self) -> &mut [MultiFab] {
        &mut self.bcoef
    }

    /// Solve for the solution field in place
    ///
    /// # Errors
    ///
    /// Propagates any [`SolveError`] from the orchestrator
    pub fn solve_with<E: EllipticEngine>(
        &mut self,
        orchestrator: &EllipticSolveOrchestrator<E>,
        hierarchy: &AmrHierarchy,
    ) -> Result<SolveSummary, SolveError> {
        orchestrator.solve(
            hierarchy,
            &mut self.phi,
            &self.acoef,
            &self.bcoef,
            &self.rhs,
            &self.phi_exact,
        )
    }

    /// Write the diagnostic fields through `sink`
    ///
    /// # Errors
    ///
    /// Propagates any [`ExportError`] from the exporter
    pub fn export_with(
        &self,
        exporter: &ResultExporter,
        hierarchy: &AmrHierarchy,
        sink: &mut dyn PlotSink,
    ) -> Result<(), ExportError> {
        let fields = DiagnosticFields {
            phi: &self.phi,
            phi_exact: &self.phi_exact,
            acoef: &self.acoef,
            bcoef: &self.bcoef,
            rhs: &self.rhs,
        };
        exporter.write(hierarchy, sink, &fields)
    }
}
