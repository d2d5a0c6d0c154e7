//! Generalized Helmholtz operator description
//!
//! [`AbecOperator`] describes `a·A·φ - b·∇·(B·∇φ)` over one or more levels: the
//! level layouts it spans, domain boundary types, boundary values, scalar weights,
//! coefficient fields and an optional link to a coarser solution. It holds no
//! solver state; engines read it through the accessors below.

use super::engine::EngineError;
use crate::amr::{BoxArray, DistributionMapping, Geometry, MultiFab, SPACEDIM};
use serde::{Deserialize, Serialize};

/// Boundary condition type on one side of one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinOpBcType {
    /// Prescribed value on the domain face
    Dirichlet,
    /// Zero normal gradient
    Neumann,
    /// Wraps to the opposite side
    Periodic,
}

/// Multigrid hierarchy tuning passed at operator construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LpInfo {
    pub agglomeration: bool,
    pub consolidation: bool,
    pub max_coarsening_level: u32,
}

impl Default for LpInfo {
    fn default() -> Self {
        Self {
            agglomeration: true,
            consolidation: true,
            max_coarsening_level: 30,
        }
    }
}

impl LpInfo {
    pub fn set_agglomeration(mut self, on: bool) -> Self {
        self.agglomeration = on;
        self
    }

    pub fn set_consolidation(mut self, on: bool) -> Self {
        self.consolidation = on;
        self
    }

    pub fn set_max_coarsening_level(mut self, level: u32) -> Self {
        self.max_coarsening_level = level;
        self
    }
}

/// Read-only link from a single-level operator to the next coarser solution
#[derive(Debug, Clone, Copy)]
pub struct CoarseFineBc<'a> {
    /// Already solved coarser-level solution
    pub coarse: &'a MultiFab,
    /// Refinement ratio between the coarse level and the operator's level
    pub ref_ratio: i32,
}

/// Assembled description of `a·A·φ - b·∇·(B·∇φ)` over a set of levels
#[derive(Debug, Clone)]
pub struct AbecOperator<'a> {
    geoms: &'a [Geometry],
    grids: &'a [BoxArray],
    dmaps: &'a [DistributionMapping],
    lp_info: LpInfo,
    max_order: u32,
    bc_lo: [LinOpBcType; SPACEDIM],
    bc_hi: [LinOpBcType; SPACEDIM],
    level_bc: Vec<Option<MultiFab>>,
    scalar_a: f64,
    scalar_b: f64,
    a_coeffs: Vec<Option<&'a MultiFab>>,
    b_coeffs: Vec<Option<[MultiFab; SPACEDIM]>>,
    coarse_fine: Option<CoarseFineBc<'a>>,
}

impl<'a> AbecOperator<'a> {
    /// Define an operator spanning the given levels, coarsest first
    ///
    /// Boundary types default to Dirichlet, scalars to `a = 0`, `b = 1` and the
    /// maximum order to 2. Coefficients and boundary values start unset.
    ///
    /// # Panics
    ///
    /// Panics if the three slices differ in length or are empty
    #[must_use]
    pub fn define(
        geoms: &'a [Geometry],
        grids: &'a [BoxArray],
        dmaps: &'a [DistributionMapping],
        lp_info: LpInfo,
    ) -> Self {
        assert!(
            !geoms.is_empty() && geoms.len() == grids.len() && grids.len() == dmaps.len(),
            "Operator levels must have one geometry, box array and distribution map each"
        );
        let nlevels = geoms.len();
        Self {
            geoms,
            grids,
            dmaps,
            lp_info,
            max_order: 2,
            bc_lo: [LinOpBcType::Dirichlet; SPACEDIM],
            bc_hi: [LinOpBcType::Dirichlet; SPACEDIM],
            level_bc: vec![None; nlevels],
            scalar_a: 0.0,
            scalar_b: 1.0,
            a_coeffs: vec![None; nlevels],
            b_coeffs: vec![None; nlevels],
            coarse_fine: None,
        }
    }

    pub fn set_max_order(&mut self, order: u32) {
        self.max_order = order;
    }

    /// Set the boundary type of the low and high side of every axis
    pub fn set_domain_bc(&mut self, lo: [LinOpBcType; SPACEDIM], hi: [LinOpBcType; SPACEDIM]) {
        self.bc_lo = lo;
        self.bc_hi = hi;
    }

    /// Capture the boundary values of `level`
    ///
    /// Dirichlet values are read from the ghost cells of `values` that sit just
    /// outside the domain. The field is copied, so later writes to it do not
    /// change the operator.
    pub fn set_level_bc(&mut self, level: usize, values: &MultiFab) {
        self.level_bc[level] = Some(values.clone());
    }

    /// Link the operator's only level to a coarser solution
    pub fn set_coarse_fine_bc(&mut self, coarse: &'a MultiFab, ref_ratio: i32) {
        self.coarse_fine = Some(CoarseFineBc { coarse, ref_ratio });
    }

    /// Set the scalar weights `a` and `b`
    pub fn set_scalars(&mut self, a: f64, b: f64) {
        self.scalar_a = a;
        self.scalar_b = b;
    }

    /// Set the cell-centred A coefficient of `level`
    pub fn set_a_coeffs(&mut self, level: usize, alpha: &'a MultiFab) {
        self.a_coeffs[level] = Some(alpha);
    }

    /// Set the face-centred B coefficients of `level`, one field per axis
    pub fn set_b_coeffs(&mut self, level: usize, beta: [MultiFab; SPACEDIM]) {
        self.b_coeffs[level] = Some(beta);
    }

    #[must_use]
    pub fn num_levels(&self) -> usize {
        self.geoms.len()
    }

    #[must_use]
    pub fn geometry(&self, level: usize) -> &Geometry {
        &self.geoms[level]
    }

    #[must_use]
    pub fn box_array(&self, level: usize) -> &BoxArray {
        &self.grids[level]
    }

    #[must_use]
    pub fn distribution_map(&self, level: usize) -> &DistributionMapping {
        &self.dmaps[level]
    }

    #[must_use]
    pub fn lp_info(&self) -> LpInfo {
        self.lp_info
    }

    #[must_use]
    pub fn max_order(&self) -> u32 {
        self.max_order
    }

    /// Boundary types of the low and high side of axis `dir`
    #[must_use]
    pub fn domain_bc(&self, dir: usize) -> (LinOpBcType, LinOpBcType) {
        (self.bc_lo[dir], self.bc_hi[dir])
    }

    #[must_use]
    pub fn level_bc(&self, level: usize) -> Option<&MultiFab> {
        self.level_bc[level].as_ref()
    }

    /// Scalar weights `(a, b)`
    #[must_use]
    pub fn scalars(&self) -> (f64, f64) {
        (self.scalar_a, self.scalar_b)
    }

    #[must_use]
    pub fn a_coeffs(&self, level: usize) -> Option<&MultiFab> {
        self.a_coeffs[level]
    }

    #[must_use]
    pub fn b_coeffs(&self, level: usize) -> Option<&[MultiFab; SPACEDIM]> {
        self.b_coeffs[level].as_ref()
    }

    #[must_use]
    pub fn coarse_fine_bc(&self) -> Option<&CoarseFineBc<'a>> {
        self.coarse_fine.as_ref()
    }

    /// Check that every piece an engine needs has been set
    ///
    /// # Errors
    ///
    /// Returns the first missing or mismatched piece as an [`EngineError`]
    pub fn check_complete(&self) -> Result<(), EngineError> {
        for level in 0..self.num_levels() {
            let grid = &self.grids[level];
            let (Some(alpha), Some(beta)) = (self.a_coeffs[level], self.b_coeffs[level].as_ref())
            else {
                return Err(EngineError::MissingCoefficients { level });
            };
            if alpha.box_array() != grid
                || (0..SPACEDIM).any(|d| *beta[d].box_array() != grid.convert_to_faces(d))
            {
                return Err(EngineError::LayoutMismatch {
                    what: "coefficients",
                    level,
                });
            }
            match &self.level_bc[level] {
                None => return Err(EngineError::MissingLevelBc { level }),
                Some(bc) if bc.box_array() != grid => {
                    return Err(EngineError::LayoutMismatch {
                        what: "boundary values",
                        level,
                    })
                }
                Some(_) => {}
            }
        }

        let covers_domain = self.grids[0].num_pts() == self.geoms[0].domain().num_pts();
        if !covers_domain && self.coarse_fine.is_none() {
            return Err(EngineError::MissingCoarseData);
        }
        Ok(())
    }
}
