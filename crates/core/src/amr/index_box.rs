//! Integer index boxes
//!
//! An [`IndexBox`] is the rectangular block of integer indices owned by one patch of
//! a refinement level. Boxes are cell-centred by default; converting a box to the
//! faces normal to one axis makes it nodal along that axis.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Number of spatial dimensions
pub const SPACEDIM: usize = 3;

/// Integer index vector `(i, j, k)`
pub type IntVect = Vector3<i32>;

/// Unit index vector along `dir`
#[inline]
#[must_use]
pub fn unit_vector(dir: usize) -> IntVect {
    let mut e = IntVect::zeros();
    e[dir] = 1;
    e
}

/// Coarsen a cell index by an integer refinement ratio (floor division)
#[inline]
#[must_use]
pub fn coarsen_cell(iv: &IntVect, ratio: i32) -> IntVect {
    iv.map(|v| v.div_euclid(ratio))
}

/// Per-axis index centring
///
/// `false` on an axis means cell-centred, `true` means nodal (face-centred).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct IndexType([bool; SPACEDIM]);

impl IndexType {
    /// Cell-centred on every axis
    pub const CELL: IndexType = IndexType([false; SPACEDIM]);

    /// Nodal along `dir`, cell-centred elsewhere (the faces normal to `dir`)
    #[must_use]
    pub fn face(dir: usize) -> Self {
        let mut nodal = [false; SPACEDIM];
        nodal[dir] = true;
        Self(nodal)
    }

    /// True if cell-centred on every axis
    #[must_use]
    pub fn is_cell(&self) -> bool {
        !self.0.iter().any(|&n| n)
    }

    /// True if nodal along `dir`
    #[must_use]
    pub fn is_nodal(&self, dir: usize) -> bool {
        self.0[dir]
    }
}

/// Rectangular region of integer indices, inclusive on both corners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndexBox {
    lo: IntVect,
    hi: IntVect,
    ix_type: IndexType,
}

impl IndexBox {
    /// Create a cell-centred box from its inclusive corners
    #[must_use]
    pub fn new(lo: IntVect, hi: IntVect) -> Self {
        Self {
            lo,
            hi,
            ix_type: IndexType::CELL,
        }
    }

    /// Cell-centred box `[0, n-1]` on every axis
    #[must_use]
    pub fn cube(n: i32) -> Self {
        Self::new(IntVect::zeros(), IntVect::repeat(n - 1))
    }

    /// Lower corner
    #[must_use]
    pub fn lo(&self) -> IntVect {
        self.lo
    }

    /// Upper corner (inclusive)
    #[must_use]
    pub fn hi(&self) -> IntVect {
        self.hi
    }

    /// Index centring of the box
    #[must_use]
    pub fn ix_type(&self) -> IndexType {
        self.ix_type
    }

    /// Number of indices along each axis
    #[must_use]
    pub fn length(&self) -> IntVect {
        self.hi - self.lo + IntVect::repeat(1)
    }

    /// True if the box holds no index
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length().iter().any(|&n| n <= 0)
    }

    /// Number of indices in the box
    #[must_use]
    pub fn num_pts(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        self.length().iter().map(|&n| n as usize).product()
    }

    /// True if `iv` lies inside the box
    #[inline]
    #[must_use]
    pub fn contains(&self, iv: &IntVect) -> bool {
        (0..SPACEDIM).all(|d| iv[d] >= self.lo[d] && iv[d] <= self.hi[d])
    }

    /// True if `other` lies entirely inside the box
    #[must_use]
    pub fn contains_box(&self, other: &IndexBox) -> bool {
        other.is_empty() || (self.contains(&other.lo) && self.contains(&other.hi))
    }

    /// Grow the box by `n` indices on every side (shrink for negative `n`)
    #[must_use]
    pub fn grow(&self, n: i32) -> Self {
        Self {
            lo: self.lo - IntVect::repeat(n),
            hi: self.hi + IntVect::repeat(n),
            ix_type: self.ix_type,
        }
    }

    /// Refine a cell-centred box by an integer ratio
    #[must_use]
    pub fn refine(&self, ratio: i32) -> Self {
        assert!(self.ix_type.is_cell(), "Only cell-centred boxes can be refined");
        Self::new(
            self.lo * ratio,
            (self.hi + IntVect::repeat(1)) * ratio - IntVect::repeat(1),
        )
    }

    /// Coarsen a cell-centred box by an integer ratio
    #[must_use]
    pub fn coarsen(&self, ratio: i32) -> Self {
        assert!(self.ix_type.is_cell(), "Only cell-centred boxes can be coarsened");
        Self::new(coarsen_cell(&self.lo, ratio), coarsen_cell(&self.hi, ratio))
    }

    /// True if the box maps exactly onto whole coarse cells at `ratio`
    #[must_use]
    pub fn is_coarsenable(&self, ratio: i32) -> bool {
        self.coarsen(ratio).refine(ratio) == *self
    }

    /// Convert a cell-centred box into the box of faces normal to `dir`
    #[must_use]
    pub fn surrounding_nodes(&self, dir: usize) -> Self {
        assert!(
            !self.ix_type.is_nodal(dir),
            "Box is already nodal along axis {dir}"
        );
        let mut hi = self.hi;
        hi[dir] += 1;
        Self {
            lo: self.lo,
            hi,
            ix_type: IndexType::face(dir),
        }
    }

    /// Intersection of two boxes with the same centring
    #[must_use]
    pub fn intersection(&self, other: &IndexBox) -> Option<IndexBox> {
        if self.ix_type != other.ix_type {
            return None;
        }
        let bx = Self {
            lo: self.lo.sup(&other.lo),
            hi: self.hi.inf(&other.hi),
            ix_type: self.ix_type,
        };
        (!bx.is_empty()).then_some(bx)
    }

    /// Linear offset of `iv` within the box, x fastest
    #[inline]
    #[must_use]
    pub fn offset(&self, iv: &IntVect) -> usize {
        let len = self.length();
        let rel = iv - self.lo;
        (rel.x + len.x * (rel.y + len.y * rel.z)) as usize
    }

    /// Iterate over every index in the box, x fastest
    pub fn cells(&self) -> impl Iterator<Item = IntVect> {
        let (lo, hi) = (self.lo, self.hi);
        (lo.z..=hi.z).flat_map(move |k| {
            (lo.y..=hi.y).flat_map(move |j| (lo.x..=hi.x).map(move |i| IntVect::new(i, j, k)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_counts() {
        let bx = IndexBox::new(IntVect::new(0, 0, 0), IntVect::new(3, 1, 0));
        assert_eq!(bx.length(), IntVect::new(4, 2, 1));
        assert_eq!(bx.num_pts(), 8);
        assert_eq!(bx.cells().count(), 8);
        assert!(!bx.is_empty());
    }

    #[test]
    fn test_empty_box() {
        let bx = IndexBox::new(IntVect::new(2, 0, 0), IntVect::new(1, 0, 0));
        assert!(bx.is_empty());
        assert_eq!(bx.num_pts(), 0);
        assert_eq!(bx.cells().count(), 0);
    }

    #[test]
    fn test_offsets_follow_iteration_order() {
        let bx = IndexBox::new(IntVect::new(-1, 2, 3), IntVect::new(1, 3, 4));
        for (n, iv) in bx.cells().enumerate() {
            assert_eq!(bx.offset(&iv), n);
        }
    }

    #[test]
    fn test_refine_coarsen() {
        let bx = IndexBox::new(IntVect::new(2, 2, 2), IntVect::new(5, 5, 5));
        let fine = bx.refine(2);
        assert_eq!(fine.lo(), IntVect::new(4, 4, 4));
        assert_eq!(fine.hi(), IntVect::new(11, 11, 11));
        assert_eq!(fine.coarsen(2), bx);
        assert!(fine.is_coarsenable(2));

        let odd = IndexBox::new(IntVect::new(1, 0, 0), IntVect::new(4, 3, 3));
        assert!(!odd.is_coarsenable(2));
    }

    #[test]
    fn test_coarsen_negative_indices() {
        assert_eq!(coarsen_cell(&IntVect::new(-1, -2, 3), 2), IntVect::new(-1, -1, 1));
    }

    #[test]
    fn test_surrounding_nodes() {
        let bx = IndexBox::cube(4);
        let faces = bx.surrounding_nodes(1);
        assert_eq!(faces.hi(), IntVect::new(3, 4, 3));
        assert!(faces.ix_type().is_nodal(1));
        assert!(!faces.ix_type().is_nodal(0));
        assert_eq!(faces.num_pts(), 4 * 5 * 4);
    }

    #[test]
    fn test_intersection() {
        let a = IndexBox::cube(4);
        let b = IndexBox::new(IntVect::new(2, 2, 2), IntVect::new(6, 6, 6));
        let c = a.intersection(&b).unwrap();
        assert_eq!(c, IndexBox::new(IntVect::new(2, 2, 2), IntVect::new(3, 3, 3)));

        let far = IndexBox::new(IntVect::new(10, 10, 10), IntVect::new(12, 12, 12));
        assert!(a.intersection(&far).is_none());
    }

    #[test]
    fn test_grow_contains() {
        let bx = IndexBox::cube(2);
        let grown = bx.grow(1);
        assert!(grown.contains(&IntVect::new(-1, -1, -1)));
        assert!(grown.contains_box(&bx));
        assert!(!bx.contains(&IntVect::new(2, 0, 0)));
    }
}
