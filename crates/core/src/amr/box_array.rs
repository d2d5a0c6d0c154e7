//! Box arrays and distribution maps
//!
//! A [`BoxArray`] is the ordered list of non-overlapping boxes that make up one
//! refinement level. A [`DistributionMapping`] assigns each box an owner.

use super::index_box::{IndexBox, IntVect, SPACEDIM};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Ordered collection of boxes covering one level
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoxArray {
    boxes: Vec<IndexBox>,
}

impl BoxArray {
    /// Create a box array from explicit boxes
    #[must_use]
    pub fn new(boxes: Vec<IndexBox>) -> Self {
        Self { boxes }
    }

    /// Box array holding a single box
    #[must_use]
    pub fn from_box(bx: IndexBox) -> Self {
        Self { boxes: vec![bx] }
    }

    /// Split `domain` into boxes no longer than `max_grid_size` along any axis
    ///
    /// Chunks are laid out x fastest. The last chunk on each axis takes the remainder.
    #[must_use]
    pub fn chop(domain: &IndexBox, max_grid_size: i32) -> Self {
        assert!(max_grid_size > 0, "max_grid_size must be positive");
        let len = domain.length();
        let chunks: Vec<Vec<(i32, i32)>> = (0..SPACEDIM)
            .map(|d| {
                let mut spans = Vec::new();
                let mut start = domain.lo()[d];
                let end = domain.lo()[d] + len[d];
                while start < end {
                    let stop = (start + max_grid_size).min(end);
                    spans.push((start, stop - 1));
                    start = stop;
                }
                spans
            })
            .collect();

        let mut boxes = Vec::new();
        for &(zlo, zhi) in &chunks[2] {
            for &(ylo, yhi) in &chunks[1] {
                for &(xlo, xhi) in &chunks[0] {
                    boxes.push(IndexBox::new(
                        IntVect::new(xlo, ylo, zlo),
                        IntVect::new(xhi, yhi, zhi),
                    ));
                }
            }
        }
        Self { boxes }
    }

    /// Number of boxes
    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    /// True if there are no boxes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Boxes in order
    #[must_use]
    pub fn boxes(&self) -> &[IndexBox] {
        &self.boxes
    }

    /// Iterate over the boxes
    pub fn iter(&self) -> std::slice::Iter<'_, IndexBox> {
        self.boxes.iter()
    }

    /// Total number of indices over all boxes
    #[must_use]
    pub fn num_pts(&self) -> usize {
        self.boxes.iter().map(IndexBox::num_pts).sum()
    }

    /// Index of the first box containing `iv`
    #[must_use]
    pub fn find(&self, iv: &IntVect) -> Option<usize> {
        self.boxes.iter().position(|bx| bx.contains(iv))
    }

    /// Same boxes converted to the faces normal to `dir`
    #[must_use]
    pub fn convert_to_faces(&self, dir: usize) -> Self {
        Self {
            boxes: self
                .boxes
                .iter()
                .map(|bx| bx.surrounding_nodes(dir))
                .collect(),
        }
    }

    /// Refine every box
    #[must_use]
    pub fn refine(&self, ratio: i32) -> Self {
        Self {
            boxes: self.boxes.iter().map(|bx| bx.refine(ratio)).collect(),
        }
    }

    /// Coarsen every box
    #[must_use]
    pub fn coarsen(&self, ratio: i32) -> Self {
        Self {
            boxes: self.boxes.iter().map(|bx| bx.coarsen(ratio)).collect(),
        }
    }

    /// True if any two boxes share an index
    #[must_use]
    pub fn has_overlap(&self) -> bool {
        self.boxes.iter().enumerate().any(|(i, a)| {
            self.boxes[i + 1..]
                .iter()
                .any(|b| a.intersection(b).is_some())
        })
    }
}

impl Index<usize> for BoxArray {
    type Output = IndexBox;

    fn index(&self, i: usize) -> &IndexBox {
        &self.boxes[i]
    }
}

impl<'a> IntoIterator for &'a BoxArray {
    type Item = &'a IndexBox;
    type IntoIter = std::slice::Iter<'a, IndexBox>;

    fn into_iter(self) -> Self::IntoIter {
        self.boxes.iter()
    }
}

/// Owner assignment for the boxes of one level
///
/// Owners are worker slots of the data-parallel pool. The table is derived once per
/// level and shared by every field defined on that level.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DistributionMapping {
    owners: Vec<usize>,
}

impl DistributionMapping {
    /// Round-robin assignment over the current rayon pool
    #[must_use]
    pub fn define(boxes: &BoxArray) -> Self {
        Self::round_robin(boxes, rayon::current_num_threads())
    }

    /// Round-robin assignment over `n_owners` owners
    #[must_use]
    pub fn round_robin(boxes: &BoxArray, n_owners: usize) -> Self {
        let n_owners = n_owners.max(1);
        Self {
            owners: (0..boxes.len()).map(|i| i % n_owners).collect(),
        }
    }

    /// Number of boxes mapped
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// True if no box is mapped
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Owner of box `i`
    #[must_use]
    pub fn owner(&self, i: usize) -> usize {
        self.owners[i]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chop_covers_domain() {
        let domain = IndexBox::new(IntVect::zeros(), IntVect::new(9, 7, 3));
        let ba = BoxArray::chop(&domain, 4);
        // x: 4+4+2, y: 4+4, z: 4
        assert_eq!(ba.len(), 3 * 2);
        assert_eq!(ba.num_pts(), domain.num_pts());
        assert!(!ba.has_overlap());
        assert!(ba.iter().all(|bx| domain.contains_box(bx)));
    }

    #[test]
    fn test_find() {
        let ba = BoxArray::chop(&IndexBox::cube(8), 4);
        let idx = ba.find(&IntVect::new(5, 1, 6)).unwrap();
        assert!(ba[idx].contains(&IntVect::new(5, 1, 6)));
        assert!(ba.find(&IntVect::new(8, 0, 0)).is_none());
    }

    #[test]
    fn test_overlap_detection() {
        let a = IndexBox::cube(4);
        let b = IndexBox::new(IntVect::new(3, 3, 3), IntVect::new(5, 5, 5));
        assert!(BoxArray::new(vec![a, b]).has_overlap());
    }

    #[test]
    fn test_face_conversion_keeps_order() {
        let ba = BoxArray::chop(&IndexBox::cube(4), 2);
        let faces = ba.convert_to_faces(0);
        assert_eq!(faces.len(), ba.len());
        for (cell, face) in ba.iter().zip(faces.iter()) {
            assert_eq!(face.lo(), cell.lo());
            assert_eq!(face.hi().x, cell.hi().x + 1);
        }
    }

    #[test]
    fn test_round_robin() {
        let ba = BoxArray::chop(&IndexBox::cube(8), 2);
        let dm = DistributionMapping::round_robin(&ba, 3);
        assert_eq!(dm.len(), ba.len());
        assert_eq!(dm.owner(0), 0);
        assert_eq!(dm.owner(4), 1);
        assert_eq!(DistributionMapping::define(&ba), DistributionMapping::define(&ba));
    }
}
