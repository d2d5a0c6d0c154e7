//! Multi-box field storage
//!
//! A [`Fab`] holds the data of one box (valid region plus ghost layers) and a
//! [`MultiFab`] holds one `Fab` per box of a level. Data is stored component-major,
//! x fastest within a component, over the ghost-grown box.

use super::box_array::{BoxArray, DistributionMapping};
use super::index_box::{IndexBox, IntVect};
use rayon::prelude::*;

/// Field data on a single box
#[derive(Debug, Clone, PartialEq)]
pub struct Fab {
    valid: IndexBox,
    grown: IndexBox,
    ncomp: usize,
    data: Vec<f64>,
}

impl Fab {
    /// Create a zero-filled fab
    ///
    /// # Arguments
    ///
    /// * `valid` - Box of indices owned by this fab
    /// * `ncomp` - Number of components
    /// * `ngrow` - Ghost layers around the valid box
    #[must_use]
    pub fn new(valid: IndexBox, ncomp: usize, ngrow: usize) -> Self {
        let grown = valid.grow(ngrow as i32);
        Self {
            valid,
            grown,
            ncomp,
            data: vec![0.0; grown.num_pts() * ncomp],
        }
    }

    /// Box of indices owned by this fab
    #[must_use]
    pub fn valid_box(&self) -> &IndexBox {
        &self.valid
    }

    /// Valid box grown by the ghost layers
    #[must_use]
    pub fn grown_box(&self) -> &IndexBox {
        &self.grown
    }

    /// Number of components
    #[must_use]
    pub fn ncomp(&self) -> usize {
        self.ncomp
    }

    /// Position of `(iv, comp)` in the underlying storage
    ///
    /// # Panics
    ///
    /// Panics if `iv` is outside the grown box or `comp` is out of range
    #[inline]
    #[must_use]
    pub fn index(&self, iv: &IntVect, comp: usize) -> usize {
        assert!(
            self.grown.contains(iv) && comp < self.ncomp,
            "Cell index out of bounds"
        );
        comp * self.grown.num_pts() + self.grown.offset(iv)
    }

    /// Value at `(iv, comp)`
    #[inline]
    #[must_use]
    pub fn get(&self, iv: &IntVect, comp: usize) -> f64 {
        self.data[self.index(iv, comp)]
    }

    /// Set the value at `(iv, comp)`
    #[inline]
    pub fn set(&mut self, iv: &IntVect, comp: usize, value: f64) {
        let idx = self.index(iv, comp);
        self.data[idx] = value;
    }

    /// Fill every component, ghosts included
    pub fn fill(&mut self, value: f64) {
        self.data.fill(value);
    }

    /// Raw storage
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Mutable raw storage
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }
}

/// Field data over every box of a level
#[derive(Debug, Clone, PartialEq)]
pub struct MultiFab {
    boxes: BoxArray,
    dmap: DistributionMapping,
    ncomp: usize,
    ngrow: usize,
    fabs: Vec<Fab>,
}

impl MultiFab {
    /// Allocate a zero-filled field
    ///
    /// # Arguments
    ///
    /// * `boxes` - Box layout of the level
    /// * `dmap` - Owner assignment matching `boxes`
    /// * `ncomp` - Number of components
    /// * `ngrow` - Ghost layers per box
    #[must_use]
    pub fn define(
        boxes: &BoxArray,
        dmap: &DistributionMapping,
        ncomp: usize,
        ngrow: usize,
    ) -> Self {
        assert_eq!(
            boxes.len(),
            dmap.len(),
            "Distribution map does not match box array"
        );
        Self {
            boxes: boxes.clone(),
            dmap: dmap.clone(),
            ncomp,
            ngrow,
            fabs: boxes.iter().map(|bx| Fab::new(*bx, ncomp, ngrow)).collect(),
        }
    }

    /// Box layout
    #[must_use]
    pub fn box_array(&self) -> &BoxArray {
        &self.boxes
    }

    /// Owner assignment
    #[must_use]
    pub fn distribution_map(&self) -> &DistributionMapping {
        &self.dmap
    }

    /// Number of components
    #[must_use]
    pub fn ncomp(&self) -> usize {
        self.ncomp
    }

    /// Ghost layers per box
    #[must_use]
    pub fn n_grow(&self) -> usize {
        self.ngrow
    }

    /// Per-box data
    #[must_use]
    pub fn fabs(&self) -> &[Fab] {
        &self.fabs
    }

    /// Mutable per-box data
    pub fn fabs_mut(&mut self) -> &mut [Fab] {
        &mut self.fabs
    }

    /// Set every value, ghosts included
    pub fn set_val(&mut self, value: f64) {
        self.fabs.par_iter_mut().for_each(|fab| fab.fill(value));
    }

    /// Copy `ncomp` components of `src` starting at `src_comp` into this field
    /// starting at `dst_comp`, over the valid region grown by `ngrow`
    pub fn copy_from(
        &mut self,
        src: &MultiFab,
        src_comp: usize,
        dst_comp: usize,
        ncomp: usize,
        ngrow: usize,
    ) {
        self.combine_with(src, src_comp, dst_comp, ncomp, ngrow, |_, s| s);
    }

    /// Subtract `ncomp` components of `src` starting at `src_comp` from this field
    /// starting at `dst_comp`, over the valid region grown by `ngrow`
    pub fn subtract(
        &mut self,
        src: &MultiFab,
        src_comp: usize,
        dst_comp: usize,
        ncomp: usize,
        ngrow: usize,
    ) {
        self.combine_with(src, src_comp, dst_comp, ncomp, ngrow, |d, s| d - s);
    }

    fn combine_with<F>(
        &mut self,
        src: &MultiFab,
        src_comp: usize,
        dst_comp: usize,
        ncomp: usize,
        ngrow: usize,
        op: F,
    ) where
        F: Fn(f64, f64) -> f64 + Sync,
    {
        assert_eq!(self.boxes, src.boxes, "Fields must share a box array");
        assert!(
            ngrow <= self.ngrow && ngrow <= src.ngrow,
            "Requested ghost layers exceed field storage"
        );
        assert!(
            src_comp + ncomp <= src.ncomp && dst_comp + ncomp <= self.ncomp,
            "Component range out of bounds"
        );

        self.fabs
            .par_iter_mut()
            .zip(src.fabs.par_iter())
            .for_each(|(dst, src)| {
                let region = dst.valid.grow(ngrow as i32);
                for n in 0..ncomp {
                    for iv in region.cells() {
                        let value = op(dst.get(&iv, dst_comp + n), src.get(&iv, src_comp + n));
                        dst.set(&iv, dst_comp + n, value);
                    }
                }
            });
    }

    /// Fill component `comp` of every valid cell from a function of the cell index
    pub fn fill_valid<F>(&mut self, comp: usize, f: F)
    where
        F: Fn(&IntVect) -> f64 + Sync,
    {
        self.fabs.par_iter_mut().for_each(|fab| {
            let valid = fab.valid;
            for iv in valid.cells() {
                fab.set(&iv, comp, f(&iv));
            }
        });
    }

    /// Fill component `comp` of every cell, ghosts included, from a function of the
    /// cell index
    pub fn fill_grown<F>(&mut self, comp: usize, f: F)
    where
        F: Fn(&IntVect) -> f64 + Sync,
    {
        self.fabs.par_iter_mut().for_each(|fab| {
            let grown = fab.grown;
            for iv in grown.cells() {
                fab.set(&iv, comp, f(&iv));
            }
        });
    }

    /// Value of component `comp` at `iv` if a box of this level owns the index
    #[must_use]
    pub fn value(&self, iv: &IntVect, comp: usize) -> Option<f64> {
        self.boxes.find(iv).map(|i| self.fabs[i].get(iv, comp))
    }

    /// Maximum absolute value of component `comp` over valid cells
    #[must_use]
    pub fn norm0(&self, comp: usize) -> f64 {
        self.fabs
            .par_iter()
            .map(|fab| {
                fab.valid
                    .cells()
                    .map(|iv| fab.get(&iv, comp).abs())
                    .fold(0.0_f64, f64::max)
            })
            .reduce(|| 0.0, f64::max)
    }

    /// True if every valid value of component `comp` satisfies `pred`
    #[must_use]
    pub fn all_valid<P>(&self, comp: usize, pred: P) -> bool
    where
        P: Fn(&IntVect, f64) -> bool + Sync,
    {
        self.fabs
            .par_iter()
            .all(|fab| fab.valid.cells().all(|iv| pred(&iv, fab.get(&iv, comp))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(n: i32, max_grid: i32) -> (BoxArray, DistributionMapping) {
        let ba = BoxArray::chop(&IndexBox::cube(n), max_grid);
        let dm = DistributionMapping::define(&ba);
        (ba, dm)
    }

    #[test]
    fn test_define_zero_filled() {
        let (ba, dm) = level(4, 2);
        let mf = MultiFab::define(&ba, &dm, 2, 1);
        assert_eq!(mf.fabs().len(), 8);
        assert_eq!(mf.fabs()[0].as_slice().len(), 4 * 4 * 4 * 2);
        assert!(mf.fabs().iter().all(|f| f.as_slice().iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn test_get_set() {
        let mut fab = Fab::new(IndexBox::cube(3), 1, 1);
        let iv = IntVect::new(-1, 2, 3);
        fab.set(&iv, 0, 4.5);
        assert_eq!(fab.get(&iv, 0), 4.5);
        assert_eq!(fab.as_slice()[fab.grown_box().offset(&iv)], 4.5);
    }

    #[test]
    #[should_panic(expected = "Cell index out of bounds")]
    fn test_out_of_bounds() {
        let fab = Fab::new(IndexBox::cube(3), 1, 0);
        let _ = fab.get(&IntVect::new(3, 0, 0), 0);
    }

    #[test]
    fn test_copy_and_subtract_components() {
        let (ba, dm) = level(4, 4);
        let mut a = MultiFab::define(&ba, &dm, 1, 0);
        a.fill_valid(0, |iv| f64::from(iv.x + iv.y + iv.z));
        let mut plot = MultiFab::define(&ba, &dm, 3, 0);
        plot.copy_from(&a, 0, 0, 1, 0);
        plot.copy_from(&a, 0, 2, 1, 0);
        plot.subtract(&a, 0, 2, 1, 0);
        let iv = IntVect::new(1, 2, 3);
        assert_eq!(plot.value(&iv, 0), Some(6.0));
        assert_eq!(plot.value(&iv, 1), Some(0.0));
        assert_eq!(plot.value(&iv, 2), Some(0.0));
    }

    #[test]
    fn test_value_lookup_and_norm() {
        let (ba, dm) = level(4, 2);
        let mut mf = MultiFab::define(&ba, &dm, 1, 1);
        mf.fill_valid(0, |iv| -f64::from(iv.x));
        assert_eq!(mf.value(&IntVect::new(3, 0, 0), 0), Some(-3.0));
        assert_eq!(mf.value(&IntVect::new(4, 0, 0), 0), None);
        assert_eq!(mf.norm0(0), 3.0);
        assert!(mf.all_valid(0, |iv, v| v == -f64::from(iv.x)));
    }

    #[test]
    fn test_fill_grown_sets_ghosts() {
        let (ba, dm) = level(2, 2);
        let mut mf = MultiFab::define(&ba, &dm, 1, 1);
        mf.fill_grown(0, |_| 7.0);
        assert!(mf.fabs()[0].as_slice().iter().all(|&v| v == 7.0));
    }
}
