//! Reference red-black Gauss-Seidel engine
//!
//! A single-process implementation of [`EllipticEngine`] for tests and small
//! problems. It discretises `a·α·φ - b·∇·(β∇φ)` with the cell-centred 7-point
//! finite-volume stencil and relaxes it with red-black Gauss-Seidel until the
//! max-norm residual over uncovered cells meets `max(abs_tol, rel_tol·r0)`.
//!
//! Boundary handling per face:
//! - interior or periodic neighbour: regular two-point flux
//! - Dirichlet: boundary value read from the ghost cell just outside the domain and
//!   placed on the face, linear extrapolation (order 2) or quadratic through the
//!   next interior cell (order 3 and up)
//! - Neumann: no flux
//! - coarse-fine: the coarser solution at the covering coarse cell is injected as
//!   the ghost value
//!
//! In composite solves each iteration relaxes the uncovered cells of every level,
//! coarse to fine, then averages fine solutions down onto the coarse cells they
//! cover. Covered cells are only relaxed while seeding finer levels.

use super::engine::{EllipticEngine, EngineError, MlmgControls, SolveReport};
use super::operator::{AbecOperator, LinOpBcType};
use crate::amr::{
    coarsen_cell, unit_vector, CellLocator, Fab, Geometry, IndexBox, IntVect, MultiFab, SPACEDIM,
};
use rayon::prelude::*;
use tracing::{debug, info, trace};

/// Where a stencil neighbour value is read from
#[derive(Debug, Clone, Copy)]
enum Source {
    /// A valid cell of the same level
    Level { fab: usize, cell: IntVect },
    /// A valid cell of the next coarser level
    Coarse { fab: usize, cell: IntVect },
}

/// One row of the discrete operator, in Gauss-Seidel form
///
/// `diag·φ = fixed + Σ w·φ_nb`
#[derive(Debug, Clone)]
struct CellStencil {
    cell: IntVect,
    diag: f64,
    fixed: f64,
    terms: Vec<(Source, f64)>,
    covered: bool,
}

impl CellStencil {
    #[inline]
    fn neighbour_sum(&self, phi: &MultiFab, coarse: Option<&MultiFab>) -> f64 {
        self.terms
            .iter()
            .map(|&(src, w)| {
                let value = match src {
                    Source::Level { fab, cell } => phi.fabs()[fab].get(&cell, 0),
                    Source::Coarse { fab, cell } => {
                        coarse.map_or(0.0, |c| c.fabs()[fab].get(&cell, 0))
                    }
                };
                w * value
            })
            .sum()
    }

    #[inline]
    fn residual(&self, phi_here: f64, phi: &MultiFab, coarse: Option<&MultiFab>) -> f64 {
        self.fixed + self.neighbour_sum(phi, coarse) - self.diag * phi_here
    }
}

#[inline]
fn colour(iv: &IntVect) -> i32 {
    (iv.x + iv.y + iv.z).rem_euclid(2)
}

/// Stencils of every valid cell of one level, grouped by box
struct LevelStencils {
    fabs: Vec<Vec<CellStencil>>,
}

impl LevelStencils {
    /// One colour of a red-black sweep
    ///
    /// Covered cells hold the average of the finer level during composite
    /// iterations, so they are only relaxed when `include_covered` is set.
    fn relax(
        &self,
        phi: &mut MultiFab,
        coarse: Option<&MultiFab>,
        parity: i32,
        include_covered: bool,
    ) {
        let updates: Vec<Vec<(IntVect, f64)>> = {
            let current: &MultiFab = phi;
            self.fabs
                .par_iter()
                .map(|cells| {
                    cells
                        .iter()
                        .filter(|s| {
                            colour(&s.cell) == parity
                                && s.diag > 0.0
                                && (include_covered || !s.covered)
                        })
                        .map(|s| {
                            let sum = s.neighbour_sum(current, coarse);
                            (s.cell, (s.fixed + sum) / s.diag)
                        })
                        .collect()
                })
                .collect()
        };
        for (fab, cells) in phi.fabs_mut().iter_mut().zip(updates) {
            for (iv, value) in cells {
                fab.set(&iv, 0, value);
            }
        }
    }

    fn residual_norm(&self, phi: &MultiFab, coarse: Option<&MultiFab>) -> f64 {
        self.fabs
            .par_iter()
            .enumerate()
            .map(|(i, cells)| {
                cells
                    .iter()
                    .filter(|s| !s.covered)
                    .map(|s| {
                        let here = phi.fabs()[i].get(&s.cell, 0);
                        s.residual(here, phi, coarse).abs()
                    })
                    .fold(0.0_f64, f64::max)
            })
            .reduce(|| 0.0, f64::max)
    }
}

/// Locators a level's stencils are resolved against
struct Neighbourhood<'l> {
    own: &'l CellLocator,
    coarse: Option<(&'l CellLocator, i32)>,
    finer: Option<(&'l CellLocator, i32)>,
}

fn build_level(
    op: &AbecOperator<'_>,
    level: usize,
    rhs: &MultiFab,
    hood: &Neighbourhood<'_>,
) -> Result<LevelStencils, EngineError> {
    let alpha = op
        .a_coeffs(level)
        .ok_or(EngineError::MissingCoefficients { level })?;
    let beta = op
        .b_coeffs(level)
        .ok_or(EngineError::MissingCoefficients { level })?;
    let bc_values = op
        .level_bc(level)
        .ok_or(EngineError::MissingLevelBc { level })?;

    let geom = op.geometry(level);
    let grid = op.box_array(level);
    let dx = geom.cell_size();
    let (scalar_a, scalar_b) = op.scalars();
    let max_order = op.max_order();

    let fabs = (0..grid.len())
        .into_par_iter()
        .map(|i| {
            let bc_fab = &bc_values.fabs()[i];
            grid[i]
                .cells()
                .map(|iv| {
                    let mut st = CellStencil {
                        cell: iv,
                        diag: scalar_a * alpha.fabs()[i].get(&iv, 0),
                        fixed: rhs.fabs()[i].get(&iv, 0),
                        terms: Vec::with_capacity(2 * SPACEDIM),
                        covered: hood
                            .finer
                            .is_some_and(|(fine, ratio)| fine.find(&(iv * ratio)).is_some()),
                    };

                    for dir in 0..SPACEDIM {
                        let unit = unit_vector(dir);
                        let (bc_lo, bc_hi) = op.domain_bc(dir);
                        for (side, bc) in [(-1, bc_lo), (1, bc_hi)] {
                            let face = if side > 0 { iv + unit } else { iv };
                            let beta_face = beta[dir].fabs()[i].get(&face, 0);
                            let info = FaceInfo {
                                nb: iv + unit * side,
                                opp: iv - unit * side,
                                coef: scalar_b * beta_face / (dx[dir] * dx[dir]),
                                bc,
                            };
                            add_face(&mut st, geom, hood, info, bc_fab, max_order);
                        }
                    }
                    st
                })
                .collect::<Vec<_>>()
        })
        .collect();

    Ok(LevelStencils { fabs })
}

#[derive(Debug, Clone, Copy)]
struct FaceInfo {
    nb: IntVect,
    opp: IntVect,
    coef: f64,
    bc: LinOpBcType,
}

fn add_face(
    st: &mut CellStencil,
    geom: &Geometry,
    hood: &Neighbourhood<'_>,
    face: FaceInfo,
    bc_fab: &Fab,
    max_order: u32,
) {
    let FaceInfo { nb, opp, coef, bc } = face;
    let domain = geom.domain();
    let wrapped = geom.wrap(&nb);

    if domain.contains(&wrapped) {
        if let Some(fab) = hood.own.find(&wrapped) {
            st.diag += coef;
            st.terms.push((Source::Level { fab, cell: wrapped }, coef));
        } else if let Some((coarse, ratio)) = hood.coarse {
            let cell = coarsen_cell(&wrapped, ratio);
            if let Some(fab) = coarse.find(&cell) {
                st.diag += coef;
                st.terms.push((Source::Coarse { fab, cell }, coef));
            }
        }
        return;
    }

    match bc {
        LinOpBcType::Dirichlet => {
            // Boundary value sits in the ghost cell but applies on the face
            let phi_b = if bc_fab.grown_box().contains(&nb) {
                bc_fab.get(&nb, 0)
            } else {
                0.0
            };
            let opp_fab = if max_order >= 3 && domain.contains(&opp) {
                hood.own.find(&opp)
            } else {
                None
            };
            match opp_fab {
                Some(fab) => {
                    st.diag += 3.0 * coef;
                    st.fixed += 8.0 / 3.0 * coef * phi_b;
                    st.terms.push((Source::Level { fab, cell: opp }, coef / 3.0));
                }
                None => {
                    st.diag += 2.0 * coef;
                    st.fixed += 2.0 * coef * phi_b;
                }
            }
        }
        // A periodic side on a non-periodic geometry has no partner cell
        LinOpBcType::Neumann | LinOpBcType::Periodic => {}
    }
}

fn level_ratio(coarse: &Geometry, fine: &Geometry) -> i32 {
    (fine.domain().length().x / coarse.domain().length().x).max(1)
}

fn average_down(
    fine: &MultiFab,
    fine_locator: &CellLocator,
    coarse: &mut MultiFab,
    coarse_stencils: &LevelStencils,
    ratio: i32,
) {
    let block = IndexBox::new(IntVect::zeros(), IntVect::repeat(ratio - 1));
    let inv = 1.0 / block.num_pts() as f64;
    coarse
        .fabs_mut()
        .par_iter_mut()
        .zip(coarse_stencils.fabs.par_iter())
        .for_each(|(fab, cells)| {
            for s in cells.iter().filter(|s| s.covered) {
                let base = s.cell * ratio;
                let sum: f64 = block
                    .cells()
                    .filter_map(|off| {
                        let fiv = base + off;
                        fine_locator
                            .find(&fiv)
                            .map(|f| fine.fabs()[f].get(&fiv, 0))
                    })
                    .sum();
                fab.set(&s.cell, 0, sum * inv);
            }
        });
}

fn inject(coarse: &MultiFab, coarse_locator: &CellLocator, fine: &mut MultiFab, ratio: i32) {
    fine.fabs_mut().par_iter_mut().for_each(|fab| {
        let valid = *fab.valid_box();
        for iv in valid.cells() {
            let civ = coarsen_cell(&iv, ratio);
            if let Some(c) = coarse_locator.find(&civ) {
                fab.set(&iv, 0, coarse.fabs()[c].get(&civ, 0));
            }
        }
    });
}

/// Red-black Gauss-Seidel reference engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GaussSeidelEngine {
    sweeps_per_iteration: u32,
}

impl Default for GaussSeidelEngine {
    fn default() -> Self {
        Self {
            sweeps_per_iteration: 4,
        }
    }
}

impl GaussSeidelEngine {
    /// Engine running `sweeps_per_iteration` red-black sweeps between residual checks
    ///
    /// # Panics
    ///
    /// Panics if `sweeps_per_iteration` is zero
    #[must_use]
    pub fn new(sweeps_per_iteration: u32) -> Self {
        assert!(sweeps_per_iteration > 0, "Need at least one sweep per iteration");
        Self {
            sweeps_per_iteration,
        }
    }

    #[must_use]
    pub fn sweeps_per_iteration(&self) -> u32 {
        self.sweeps_per_iteration
    }

    fn sweep_level(
        stencils: &LevelStencils,
        solution: &mut [&mut MultiFab],
        level: usize,
        external_coarse: Option<&MultiFab>,
        sweeps: u32,
        include_covered: bool,
    ) {
        let (below, rest) = solution.split_at_mut(level);
        let coarse: Option<&MultiFab> = if level == 0 {
            external_coarse
        } else {
            below.last().map(|m| &**m)
        };
        for _ in 0..sweeps {
            stencils.relax(&mut *rest[0], coarse, 0, include_covered);
            stencils.relax(&mut *rest[0], coarse, 1, include_covered);
        }
    }

    fn residual_norm(
        stencils: &[LevelStencils],
        solution: &[&mut MultiFab],
        external_coarse: Option<&MultiFab>,
    ) -> f64 {
        stencils
            .iter()
            .enumerate()
            .map(|(level, st)| {
                let coarse = if level == 0 {
                    external_coarse
                } else {
                    Some(&*solution[level - 1])
                };
                st.residual_norm(&*solution[level], coarse)
            })
            .fold(0.0, f64::max)
    }
}

impl EllipticEngine for GaussSeidelEngine {
    fn solve(
        &self,
        op: &AbecOperator<'_>,
        controls: &MlmgControls,
        solution: &mut [&mut MultiFab],
        rhs: &[&MultiFab],
        rel_tol: f64,
        abs_tol: f64,
    ) -> Result<SolveReport, EngineError> {
        let nlevels = op.num_levels();
        if solution.len() != nlevels || rhs.len() != nlevels {
            return Err(EngineError::LevelCountMismatch {
                operator: nlevels,
                solution: solution.len(),
                rhs: rhs.len(),
            });
        }
        op.check_complete()?;
        for level in 0..nlevels {
            if solution[level].box_array() != op.box_array(level) {
                return Err(EngineError::LayoutMismatch {
                    what: "solution",
                    level,
                });
            }
            if rhs[level].box_array() != op.box_array(level) {
                return Err(EngineError::LayoutMismatch { what: "rhs", level });
            }
        }

        let external_coarse = op.coarse_fine_bc().map(|cf| cf.coarse);
        let external_locator = op
            .coarse_fine_bc()
            .map(|cf| (CellLocator::new(cf.coarse.box_array()), cf.ref_ratio));
        let locators: Vec<CellLocator> = (0..nlevels)
            .map(|l| CellLocator::new(op.box_array(l)))
            .collect();
        let ratios: Vec<i32> = (0..nlevels)
            .map(|l| {
                if l == 0 {
                    external_locator.as_ref().map_or(1, |(_, r)| *r)
                } else {
                    level_ratio(op.geometry(l - 1), op.geometry(l))
                }
            })
            .collect();

        let stencils = (0..nlevels)
            .map(|level| {
                let hood = Neighbourhood {
                    own: &locators[level],
                    coarse: if level == 0 {
                        external_locator.as_ref().map(|(loc, r)| (loc, *r))
                    } else {
                        Some((&locators[level - 1], ratios[level]))
                    },
                    finer: (level + 1 < nlevels)
                        .then(|| (&locators[level + 1], ratios[level + 1])),
                };
                build_level(op, level, rhs[level], &hood)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let sweeps = self.sweeps_per_iteration;

        if controls.max_fmg_iter > 0 {
            for level in 0..nlevels {
                Self::sweep_level(
                    &stencils[level],
                    solution,
                    level,
                    external_coarse,
                    controls.max_fmg_iter * sweeps,
                    true,
                );
                if level + 1 < nlevels {
                    let (below, rest) = solution.split_at_mut(level + 1);
                    let ratio = ratios[level + 1];
                    inject(&*below[level], &locators[level], &mut *rest[0], ratio);
                }
            }
        }

        let initial = Self::residual_norm(&stencils, solution, external_coarse);
        let target = abs_tol.max(rel_tol * initial);
        if controls.verbose >= 1 {
            info!(
                "Gauss-Seidel: {} levels, initial residual {:e}, target {:e}",
                nlevels, initial, target
            );
        }
        if initial <= target {
            return Ok(SolveReport {
                iterations: 0,
                initial_residual: initial,
                final_residual: initial,
            });
        }

        let mut residual = initial;
        for iter in 1..=controls.max_iter {
            for level in 0..nlevels {
                Self::sweep_level(
                    &stencils[level],
                    solution,
                    level,
                    external_coarse,
                    sweeps,
                    false,
                );
                if level == 0 && controls.bottom_verbose >= 1 {
                    trace!(
                        "Gauss-Seidel iteration {}: bottom level residual {:e}",
                        iter,
                        stencils[0].residual_norm(&*solution[0], external_coarse)
                    );
                }
            }
            for level in (1..nlevels).rev() {
                let (below, rest) = solution.split_at_mut(level);
                average_down(
                    &*rest[0],
                    &locators[level],
                    &mut *below[level - 1],
                    &stencils[level - 1],
                    ratios[level],
                );
            }

            residual = Self::residual_norm(&stencils, solution, external_coarse);
            if controls.verbose >= 2 {
                debug!("Gauss-Seidel iteration {}: residual {:e}", iter, residual);
            }
            if residual <= target {
                if controls.verbose >= 1 {
                    info!(
                        "Gauss-Seidel converged in {} iterations, residual {:e}",
                        iter, residual
                    );
                }
                return Ok(SolveReport {
                    iterations: iter,
                    initial_residual: initial,
                    final_residual: residual,
                });
            }
        }

        Err(EngineError::NotConverged {
            iterations: controls.max_iter,
            residual,
            target,
        })
    }
}
