//! Cell-centre to face averaging
//!
//! Finite-volume flux operators need their diffusion coefficient on cell faces.
//! Each face takes the arithmetic mean of the two cells it separates. A face with
//! only one neighbouring cell on the level (domain or coarse-fine boundary) takes
//! that cell's value. Periodic axes wrap.

use super::geometry::Geometry;
use super::index_box::{unit_vector, IntVect, SPACEDIM};
use super::locator::CellLocator;
use super::multifab::{Fab, MultiFab};
use rayon::prelude::*;

/// Average a cell-centred field onto the faces normal to each axis
///
/// # Arguments
///
/// * `cc` - Cell-centred field (any number of components, ghosts ignored)
/// * `geom` - Geometry of the level, used for periodic wrapping
///
/// # Returns
///
/// One face-centred field per axis, each with the components of `cc` and no ghosts
#[must_use]
pub fn average_cellcenter_to_face(cc: &MultiFab, geom: &Geometry) -> [MultiFab; SPACEDIM] {
    let locator = CellLocator::new(cc.box_array());
    std::array::from_fn(|dir| average_along(cc, geom, &locator, dir))
}

fn average_along(cc: &MultiFab, geom: &Geometry, locator: &CellLocator, dir: usize) -> MultiFab {
    let face_boxes = cc.box_array().convert_to_faces(dir);
    let mut faces = MultiFab::define(&face_boxes, cc.distribution_map(), cc.ncomp(), 0);
    let e = unit_vector(dir);

    faces
        .fabs_mut()
        .par_iter_mut()
        .zip(cc.fabs().par_iter())
        .for_each(|(face_fab, own)| {
            let face_box = *face_fab.valid_box();
            for comp in 0..cc.ncomp() {
                for face in face_box.cells() {
                    let left = cell_value(cc, geom, locator, own, &(face - e), comp);
                    let right = cell_value(cc, geom, locator, own, &face, comp);
                    let value = match (left, right) {
                        (Some(l), Some(r)) => 0.5 * (l + r),
                        (Some(v), None) | (None, Some(v)) => v,
                        (None, None) => 0.0,
                    };
                    face_fab.set(&face, comp, value);
                }
            }
        });

    faces
}

fn cell_value(
    cc: &MultiFab,
    geom: &Geometry,
    locator: &CellLocator,
    own: &Fab,
    iv: &IntVect,
    comp: usize,
) -> Option<f64> {
    if own.valid_box().contains(iv) {
        return Some(own.get(iv, comp));
    }
    let wrapped = geom.wrap(iv);
    if !geom.domain().contains(&wrapped) {
        return None;
    }
    locator
        .find(&wrapped)
        .map(|i| cc.fabs()[i].get(&wrapped, comp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amr::{BoxArray, DistributionMapping, IndexBox};
    use approx::assert_relative_eq;

    fn field(n: i32, max_grid: i32, periodic: [bool; 3]) -> (MultiFab, Geometry) {
        let domain = IndexBox::cube(n);
        let ba = BoxArray::chop(&domain, max_grid);
        let dm = DistributionMapping::define(&ba);
        (
            MultiFab::define(&ba, &dm, 1, 0),
            Geometry::unit_cube(domain, periodic),
        )
    }

    #[test]
    fn test_constant_field_stays_constant() {
        let (mut beta, geom) = field(4, 2, [false; 3]);
        beta.set_val(2.5);
        for faces in &average_cellcenter_to_face(&beta, &geom) {
            assert!(faces.all_valid(0, |_, v| v == 2.5));
        }
    }

    #[test]
    fn test_interior_faces_are_arithmetic_means() {
        let (mut beta, geom) = field(4, 2, [false; 3]);
        beta.fill_valid(0, |iv| f64::from(iv.x));
        let [fx, fy, _] = average_cellcenter_to_face(&beta, &geom);

        // Face between x=1 and x=2 crosses a box boundary
        assert_relative_eq!(fx.value(&IntVect::new(2, 0, 0), 0).unwrap(), 1.5);
        // Domain faces take the single neighbour
        assert_relative_eq!(fx.value(&IntVect::new(0, 1, 1), 0).unwrap(), 0.0);
        assert_relative_eq!(fx.value(&IntVect::new(4, 1, 1), 0).unwrap(), 3.0);
        // Faces normal to y see no x variation
        assert_relative_eq!(fy.value(&IntVect::new(3, 2, 0), 0).unwrap(), 3.0);
    }

    #[test]
    fn test_many_boxes_match_single_box() {
        let (mut chopped, geom) = field(8, 1, [false, true, false]);
        let (mut whole, _) = field(8, 8, [false, true, false]);
        let f = |iv: &IntVect| f64::from(iv.x * iv.x + 3 * iv.y - iv.z);
        chopped.fill_valid(0, f);
        whole.fill_valid(0, f);
        let split = average_cellcenter_to_face(&chopped, &geom);
        let single = average_cellcenter_to_face(&whole, &geom);
        for dir in 0..SPACEDIM {
            assert_eq!(split[dir].box_array().len(), 512);
            assert!(single[dir].all_valid(0, |iv, v| split[dir].value(iv, 0) == Some(v)));
        }
    }

    #[test]
    fn test_periodic_faces_wrap() {
        let (mut beta, geom) = field(4, 4, [true, false, false]);
        beta.fill_valid(0, |iv| f64::from(iv.x));
        let [fx, _, _] = average_cellcenter_to_face(&beta, &geom);
        // Low face of x=0 averages with the periodic image x=3
        assert_relative_eq!(fx.value(&IntVect::new(0, 0, 0), 0).unwrap(), 1.5);
        assert_relative_eq!(fx.value(&IntVect::new(4, 0, 0), 0).unwrap(), 1.5);
    }
}
