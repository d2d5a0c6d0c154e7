//! Assembles P1 diffusion operators from radiation fields

use crate::amr::{MultiFab, SPACEDIM};
use crate::config::MlmgParams;
use crate::elliptic::{AbecOperator, LinOpBcType, LpInfo};
use crate::hierarchy::AmrHierarchy;
use serde::{Deserialize, Serialize};

/// Scalar weights of `a·A·φ - b·∇·(B·∇φ)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct P1Coefficients {
    pub a: f64,
    pub b: f64,
}

impl P1Coefficients {
    /// The P1 radiative-diffusion weights: `a = 1`, `b = 1/3`
    pub const P1: P1Coefficients = P1Coefficients {
        a: 1.0,
        b: 1.0 / 3.0,
    };
}

impl Default for P1Coefficients {
    fn default() -> Self {
        Self::P1
    }
}

/// Builds composite and single-level operators with fixed settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiffusionOperatorBuilder {
    coefficients: P1Coefficients,
    lp_info: LpInfo,
    max_order: u32,
}

impl DiffusionOperatorBuilder {
    #[must_use]
    pub fn new(params: &MlmgParams, coefficients: P1Coefficients) -> Self {
        Self {
            coefficients,
            lp_info: LpInfo::default()
                .set_agglomeration(params.agglomeration)
                .set_consolidation(params.consolidation)
                .set_max_coarsening_level(params.max_coarsening_level),
            max_order: params.linop_maxorder,
        }
    }

    #[must_use]
    pub fn coefficients(&self) -> P1Coefficients {
        self.coefficients
    }

    #[must_use]
    pub fn lp_info(&self) -> LpInfo {
        self.lp_info
    }

    /// Domain boundary types for every axis, low and high side
    ///
    /// An axis periodic on level 0 is periodic on both sides; every other axis is
    /// Dirichlet on both sides.
    #[must_use]
    pub fn domain_bc(
        hierarchy: &AmrHierarchy,
    ) -> ([LinOpBcType; SPACEDIM], [LinOpBcType; SPACEDIM]) {
        let bc: [LinOpBcType; SPACEDIM] = std::array::from_fn(|dir| {
            if hierarchy.is_periodic(dir) {
                LinOpBcType::Periodic
            } else {
                LinOpBcType::Dirichlet
            }
        });
        (bc, bc)
    }

    fn configure(&self, op: &mut AbecOperator<'_>, hierarchy: &AmrHierarchy) {
        let (lo, hi) = Self::domain_bc(hierarchy);
        op.set_max_order(self.max_order);
        op.set_domain_bc(lo, hi);
        op.set_scalars(self.coefficients.a, self.coefficients.b);
    }

    /// Operator spanning every level of the hierarchy
    ///
    /// # Arguments
    ///
    /// * `hierarchy` - Mesh hierarchy
    /// * `solution` - Current solution per level; boundary values come from its ghosts
    /// * `alpha` - Cell-centred A coefficient per level
    /// * `beta_faces` - Face-averaged B coefficient per level
    #[must_use]
    pub fn build_composite<'a>(
        &self,
        hierarchy: &'a AmrHierarchy,
        solution: &[MultiFab],
        alpha: &'a [MultiFab],
        beta_faces: Vec<[MultiFab; SPACEDIM]>,
    ) -> AbecOperator<'a> {
        let mut op = AbecOperator::define(
            hierarchy.geometries(),
            hierarchy.box_arrays(),
            hierarchy.distribution_maps(),
            self.lp_info,
        );
        self.configure(&mut op, hierarchy);
        for (level, beta) in beta_faces.into_iter().enumerate() {
            op.set_level_bc(level, &solution[level]);
            op.set_a_coeffs(level, &alpha[level]);
            op.set_b_coeffs(level, beta);
        }
        op
    }

    /// Operator restricted to one level
    ///
    /// Levels above 0 are linked to `coarse`, the already solved solution of the
    /// next coarser level.
    #[must_use]
    pub fn build_level<'a>(
        &self,
        hierarchy: &'a AmrHierarchy,
        level: usize,
        solution: &MultiFab,
        coarse: Option<&'a MultiFab>,
        alpha: &'a MultiFab,
        beta_faces: [MultiFab; SPACEDIM],
    ) -> AbecOperator<'a> {
        let mut op = AbecOperator::define(
            &hierarchy.geometries()[level..=level],
            &hierarchy.box_arrays()[level..=level],
            &hierarchy.distribution_maps()[level..=level],
            self.lp_info,
        );
        self.configure(&mut op, hierarchy);
        op.set_level_bc(0, solution);
        if let Some(coarse) = coarse {
            op.set_coarse_fine_bc(coarse, hierarchy.ref_ratio());
        }
        op.set_a_coeffs(0, alpha);
        op.set_b_coeffs(0, beta_faces);
        op
    }
}
