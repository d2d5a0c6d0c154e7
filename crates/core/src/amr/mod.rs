//! Block-structured mesh model
//!
//! The adaptive-mesh engine that owns box decomposition, regridding and ghost
//! exchange lives outside this crate. This module is the typed model of what the
//! radiation solver consumes from it: per-level geometry, box layouts, owner maps,
//! multi-box field storage, cell lookup and cell-to-face averaging.

mod box_array;
mod face_average;
mod geometry;
mod index_box;
mod locator;
mod multifab;

pub use box_array::{BoxArray, DistributionMapping};
pub use face_average::average_cellcenter_to_face;
pub use geometry::Geometry;
pub use index_box::{coarsen_cell, unit_vector, IndexBox, IndexType, IntVect, SPACEDIM};
pub use locator::CellLocator;
pub use multifab::{Fab, MultiFab};
