//! Shared fixtures for the integration tests
#![allow(dead_code)]

use p1rad_core::amr::{BoxArray, Geometry, IndexBox, IntVect, SPACEDIM};
use p1rad_core::config::AmrParams;
use p1rad_core::spectral::{AbsorptionTable, SpectralDatabase, NUM_SAMPLES};
use p1rad_core::AmrHierarchy;

#[ctor::ctor]
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// One level over an `n`^3 unit cube, chopped into `max_grid`-sized boxes
pub fn single_level(n: i32, max_grid: i32, periodic: [bool; SPACEDIM]) -> AmrHierarchy {
    let domain = IndexBox::cube(n);
    AmrHierarchy::new(
        vec![Geometry::unit_cube(domain, periodic)],
        vec![BoxArray::chop(&domain, max_grid)],
        &AmrParams::default(),
    )
    .unwrap()
}

/// 8^3 coarse level with a refined patch over coarse cells 2..=5 on every axis
pub fn two_level() -> AmrHierarchy {
    let domain = IndexBox::cube(8);
    let coarse = Geometry::unit_cube(domain, [false; SPACEDIM]);
    let fine = coarse.refine(2);
    AmrHierarchy::new(
        vec![coarse, fine],
        vec![
            BoxArray::chop(&domain, 4),
            BoxArray::from_box(IndexBox::new(IntVect::repeat(4), IntVect::repeat(11))),
        ],
        &AmrParams::default(),
    )
    .unwrap()
}

/// Table whose sample `i` is `f(i)`
pub fn table_from(f: impl Fn(usize) -> f64) -> AbsorptionTable {
    let samples: Vec<f64> = (0..NUM_SAMPLES).map(f).collect();
    AbsorptionTable::new(&samples).unwrap()
}

/// Database with a distinct linear ramp per species
pub fn ramp_database() -> SpectralDatabase {
    SpectralDatabase {
        co2: table_from(|i| 0.1 * (i + 1) as f64),
        h2o: table_from(|i| 2.0 - 0.01 * i as f64),
        co: table_from(|i| 0.05 + 0.002 * i as f64),
        soot: table_from(|i| 1500.0 + 10.0 * i as f64),
    }
}
