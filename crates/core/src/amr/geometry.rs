//! Level geometry: index domain, physical extents and periodicity

use super::index_box::{IndexBox, IntVect, SPACEDIM};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Physical description of one refinement level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    domain: IndexBox,
    prob_lo: Vector3<f64>,
    prob_hi: Vector3<f64>,
    periodic: [bool; SPACEDIM],
}

impl Geometry {
    /// Create a geometry
    ///
    /// # Arguments
    ///
    /// * `domain` - Cell-centred index domain of the level
    /// * `prob_lo` - Physical lower corner (m)
    /// * `prob_hi` - Physical upper corner (m)
    /// * `periodic` - Per-axis periodicity flags
    #[must_use]
    pub fn new(
        domain: IndexBox,
        prob_lo: Vector3<f64>,
        prob_hi: Vector3<f64>,
        periodic: [bool; SPACEDIM],
    ) -> Self {
        assert!(
            domain.ix_type().is_cell() && !domain.is_empty(),
            "Geometry domain must be a non-empty cell-centred box"
        );
        assert!(
            (0..SPACEDIM).all(|d| prob_hi[d] > prob_lo[d]),
            "Geometry extents must satisfy prob_hi > prob_lo"
        );
        Self {
            domain,
            prob_lo,
            prob_hi,
            periodic,
        }
    }

    /// Geometry spanning the unit cube `[0, 1]^3`
    #[must_use]
    pub fn unit_cube(domain: IndexBox, periodic: [bool; SPACEDIM]) -> Self {
        Self::new(domain, Vector3::zeros(), Vector3::repeat(1.0), periodic)
    }

    /// Index domain
    #[must_use]
    pub fn domain(&self) -> &IndexBox {
        &self.domain
    }

    /// Physical lower corner
    #[must_use]
    pub fn prob_lo(&self) -> Vector3<f64> {
        self.prob_lo
    }

    /// Physical upper corner
    #[must_use]
    pub fn prob_hi(&self) -> Vector3<f64> {
        self.prob_hi
    }

    /// True if axis `dir` is periodic
    #[must_use]
    pub fn is_periodic(&self, dir: usize) -> bool {
        self.periodic[dir]
    }

    /// Per-axis periodicity flags
    #[must_use]
    pub fn periodicity(&self) -> [bool; SPACEDIM] {
        self.periodic
    }

    /// Cell size along each axis
    #[must_use]
    pub fn cell_size(&self) -> Vector3<f64> {
        let len = self.domain.length();
        (self.prob_hi - self.prob_lo).component_div(&len.map(f64::from))
    }

    /// Physical position of a cell centre
    #[must_use]
    pub fn cell_center(&self, iv: &IntVect) -> Vector3<f64> {
        let dx = self.cell_size();
        let rel = (iv - self.domain.lo()).map(f64::from);
        self.prob_lo + (rel + Vector3::repeat(0.5)).component_mul(&dx)
    }

    /// Geometry of the next finer level
    #[must_use]
    pub fn refine(&self, ratio: i32) -> Self {
        Self {
            domain: self.domain.refine(ratio),
            ..self.clone()
        }
    }

    /// Map an index into the domain along periodic axes
    ///
    /// Non-periodic axes are left untouched, so the result may still lie outside
    /// the domain.
    #[must_use]
    pub fn wrap(&self, iv: &IntVect) -> IntVect {
        let lo = self.domain.lo();
        let len = self.domain.length();
        let mut out = *iv;
        for d in 0..SPACEDIM {
            if self.periodic[d] {
                out[d] = lo[d] + (iv[d] - lo[d]).rem_euclid(len[d]);
            }
        }
        out
    }
}
