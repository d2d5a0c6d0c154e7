//! Immutable description of the mesh hierarchy a solve runs on
//!
//! Geometries and box arrays come from the external refinement engine. The
//! hierarchy checks they describe a properly nested, uniformly refined stack of
//! levels and derives one distribution map per level.

use crate::amr::{BoxArray, DistributionMapping, Geometry, SPACEDIM};
use crate::config::AmrParams;
use tracing::debug;

/// Validated per-level geometries, box arrays and distribution maps
#[derive(Debug, Clone, PartialEq)]
pub struct AmrHierarchy {
    geoms: Vec<Geometry>,
    grids: Vec<BoxArray>,
    dmaps: Vec<DistributionMapping>,
    ref_ratio: i32,
}

impl AmrHierarchy {
    /// Build a hierarchy from externally supplied levels
    ///
    /// # Arguments
    ///
    /// * `geoms` - One geometry per level, coarsest first
    /// * `grids` - One box array per level, coarsest first
    /// * `params` - Refinement ratio shared by every level pair
    ///
    /// # Errors
    ///
    /// Returns a [`HierarchyError`] describing the first malformed level
    pub fn new(
        geoms: Vec<Geometry>,
        grids: Vec<BoxArray>,
        params: &AmrParams,
    ) -> Result<Self, HierarchyError> {
        let ref_ratio = params.ref_ratio;
        if geoms.is_empty() {
            return Err(HierarchyError::NoLevels);
        }
        if geoms.len() != grids.len() {
            return Err(HierarchyError::LevelCountMismatch {
                geometries: geoms.len(),
                grids: grids.len(),
            });
        }
        if ref_ratio < 2 {
            return Err(HierarchyError::InvalidRefRatio(ref_ratio));
        }

        for (level, (geom, grid)) in geoms.iter().zip(&grids).enumerate() {
            check_level(level, geom, grid)?;
        }

        if grids[0].num_pts() != geoms[0].domain().num_pts() {
            return Err(HierarchyError::IncompleteCoverage { level: 0 });
        }

        for level in 1..geoms.len() {
            check_nesting(
                level,
                (&geoms[level - 1], &grids[level - 1]),
                (&geoms[level], &grids[level]),
                ref_ratio,
            )?;
        }

        let dmaps: Vec<DistributionMapping> =
            grids.iter().map(DistributionMapping::define).collect();

        debug!(
            "Built AMR hierarchy: {} levels, ref_ratio {}, {} cells on finest level",
            geoms.len(),
            ref_ratio,
            grids[grids.len() - 1].num_pts()
        );

        Ok(Self {
            geoms,
            grids,
            dmaps,
            ref_ratio,
        })
    }

    /// Number of levels
    #[must_use]
    pub fn num_levels(&self) -> usize {
        self.geoms.len()
    }

    /// Index of the finest level
    #[must_use]
    pub fn finest_level(&self) -> usize {
        self.geoms.len() - 1
    }

    /// Refinement ratio between consecutive levels
    #[must_use]
    pub fn ref_ratio(&self) -> i32 {
        self.ref_ratio
    }

    #[must_use]
    pub fn geometry(&self, level: usize) -> &Geometry {
        &self.geoms[level]
    }

    #[must_use]
    pub fn geometries(&self) -> &[Geometry] {
        &self.geoms
    }

    #[must_use]
    pub fn box_array(&self, level: usize) -> &BoxArray {
        &self.grids[level]
    }

    #[must_use]
    pub fn box_arrays(&self) -> &[BoxArray] {
        &self.grids
    }

    #[must_use]
    pub fn distribution_map(&self, level: usize) -> &DistributionMapping {
        &self.dmaps[level]
    }

    #[must_use]
    pub fn distribution_maps(&self) -> &[DistributionMapping] {
        &self.dmaps
    }

    /// True if axis `dir` is periodic on level 0
    ///
    /// Periodicity is validated to be identical on every level, so level 0 speaks
    /// for the whole hierarchy.
    #[must_use]
    pub fn is_periodic(&self, dir: usize) -> bool {
        self.geoms[0].is_periodic(dir)
    }
}

fn check_level(level: usize, geom: &Geometry, grid: &BoxArray) -> Result<(), HierarchyError> {
    if grid.is_empty() {
        return Err(HierarchyError::EmptyLevel { level });
    }
    let domain = geom.domain();
    for (index, bx) in grid.iter().enumerate() {
        if !bx.ix_type().is_cell() || bx.is_empty() || !domain.contains_box(bx) {
            return Err(HierarchyError::BoxOutsideDomain { level, index });
        }
    }
    if grid.has_overlap() {
        return Err(HierarchyError::OverlappingBoxes { level });
    }
    Ok(())
}

fn check_nesting(
    level: usize,
    (coarse_geom, coarse_grid): (&Geometry, &BoxArray),
    (fine_geom, fine_grid): (&Geometry, &BoxArray),
    ratio: i32,
) -> Result<(), HierarchyError> {
    if *fine_geom.domain() != coarse_geom.domain().refine(ratio)
        || (0..SPACEDIM).any(|d| fine_geom.is_periodic(d) != coarse_geom.is_periodic(d))
    {
        return Err(HierarchyError::DomainMismatch { level });
    }
    for (index, bx) in fine_grid.iter().enumerate() {
        let nested = bx.is_coarsenable(ratio)
            && bx
                .coarsen(ratio)
                .cells()
                .all(|iv| coarse_grid.find(&iv).is_some());
        if !nested {
            return Err(HierarchyError::NotNested { level, index });
        }
    }
    Ok(())
}

/// Errors raised while validating a mesh hierarchy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HierarchyError {
    /// No levels were supplied
    NoLevels,
    /// Geometry and box-array counts differ
    LevelCountMismatch { geometries: usize, grids: usize },
    /// Refinement ratio below 2
    InvalidRefRatio(i32),
    /// A level has no boxes
    EmptyLevel { level: usize },
    /// A box is empty, not cell-centred, or leaves the level domain
    BoxOutsideDomain { level: usize, index: usize },
    /// Two boxes of a level overlap
    OverlappingBoxes { level: usize },
    /// Level boxes do not cover the whole level domain
    IncompleteCoverage { level: usize },
    /// Level domain or periodicity is not the refinement of the coarser level's
    DomainMismatch { level: usize },
    /// A fine box is not covered by whole cells of the coarser level
    NotNested { level: usize, index: usize },
}

impl std::fmt::Display for HierarchyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HierarchyError::NoLevels => write!(f, "Hierarchy has no levels"),
            HierarchyError::LevelCountMismatch { geometries, grids } => write!(
                f,
                "Level count mismatch: {geometries} geometries but {grids} box arrays"
            ),
            HierarchyError::InvalidRefRatio(r) => {
                write!(f, "Refinement ratio must be at least 2, got {r}")
            }
            HierarchyError::EmptyLevel { level } => write!(f, "Level {level} has no boxes"),
            HierarchyError::BoxOutsideDomain { level, index } => write!(
                f,
                "Box {index} on level {level} is not a cell-centred box inside the domain"
            ),
            HierarchyError::OverlappingBoxes { level } => {
                write!(f, "Boxes on level {level} overlap")
            }
            HierarchyError::IncompleteCoverage { level } => {
                write!(f, "Boxes on level {level} do not cover the domain")
            }
            HierarchyError::DomainMismatch { level } => write!(
                f,
                "Level {level} domain is not the refinement of level {}",
                level - 1
            ),
            HierarchyError::NotNested { level, index } => write!(
                f,
                "Box {index} on level {level} is not nested in level {}",
                level - 1
            ),
        }
    }
}

impl std::error::Error for HierarchyError {}
