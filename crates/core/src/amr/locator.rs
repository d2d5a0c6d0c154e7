//! Cell-to-box lookup for one level

use super::box_array::BoxArray;
use super::index_box::IntVect;
use rustc_hash::FxHashMap;

/// Valid cell to owning box index
///
/// Built once per level so that repeated point queries cost a hash lookup
/// instead of a scan over every box.
#[derive(Debug, Clone, Default)]
pub struct CellLocator {
    owners: FxHashMap<IntVect, usize>,
}

impl CellLocator {
    /// Index every cell of every box in `boxes`
    #[must_use]
    pub fn new(boxes: &BoxArray) -> Self {
        let mut owners = FxHashMap::default();
        owners.reserve(boxes.num_pts());
        for (i, bx) in boxes.iter().enumerate() {
            for iv in bx.cells() {
                owners.insert(iv, i);
            }
        }
        Self { owners }
    }

    /// Box owning `iv`, if any
    #[inline]
    #[must_use]
    pub fn find(&self, iv: &IntVect) -> Option<usize> {
        self.owners.get(iv).copied()
    }

    /// Number of indexed cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}
