//! Absorption kernels over whole fields
//!
//! Each cell is independent: the kernels read only that cell's inputs and write
//! only that cell's absorption slot, so boxes and cells run in parallel on rayon.
//! The gas kernel overwrites the absorption field; the soot kernel accumulates
//! onto it and must run after the gas kernel or after zeroing.

use super::model::SpectralDatabase;
use super::table::interp_t;
use crate::amr::MultiFab;
use crate::core_types::units::Kelvin;
use rayon::prelude::*;

/// Gas-phase inputs of the absorption model, one field per quantity
#[derive(Debug, Clone, Copy)]
pub struct GasFields<'a> {
    pub temperature: &'a MultiFab,
    pub y_co2: &'a MultiFab,
    pub y_h2o: &'a MultiFab,
    pub y_co: &'a MultiFab,
    pub pressure: &'a MultiFab,
}

/// Gas-phase inputs over flat per-cell arrays
#[derive(Debug, Clone, Copy)]
pub struct GasSlices<'a> {
    pub temperature: &'a [f64],
    pub y_co2: &'a [f64],
    pub y_h2o: &'a [f64],
    pub y_co: &'a [f64],
    pub pressure: &'a [f64],
}

fn assert_same_layout(inputs: &[&MultiFab], out: &MultiFab) {
    assert!(
        inputs.iter().all(|mf| mf.box_array() == out.box_array()),
        "Fields must share a box array"
    );
}

/// Overwrite `absorption` with the gas absorption coefficient of every valid cell
///
/// # Arguments
///
/// * `db` - Species tables
/// * `gas` - Temperature, mass fractions and pressure (component 0 of each)
/// * `absorption` - Output field (component 0)
///
/// # Panics
///
/// Panics if the fields do not share a box array
pub fn fill_gas_absorption(db: &SpectralDatabase, gas: &GasFields<'_>, absorption: &mut MultiFab) {
    assert_same_layout(
        &[gas.temperature, gas.y_co2, gas.y_h2o, gas.y_co, gas.pressure],
        absorption,
    );

    absorption
        .fabs_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, out)| {
            let (t, co2, h2o, co, p) = (
                &gas.temperature.fabs()[i],
                &gas.y_co2.fabs()[i],
                &gas.y_h2o.fabs()[i],
                &gas.y_co.fabs()[i],
                &gas.pressure.fabs()[i],
            );
            let valid = *out.valid_box();
            for iv in valid.cells() {
                let bin = interp_t(Kelvin::from_field(t.get(&iv, 0)));
                let k = db.gas_absorption_at(
                    bin,
                    co2.get(&iv, 0),
                    h2o.get(&iv, 0),
                    co.get(&iv, 0),
                    p.get(&iv, 0),
                );
                out.set(&iv, 0, k);
            }
        });
}

/// Add the soot contribution to `absorption` on every valid cell
///
/// # Panics
///
/// Panics if the fields do not share a box array
pub fn add_soot_absorption(
    db: &SpectralDatabase,
    temperature: &MultiFab,
    soot_volume_fraction: &MultiFab,
    absorption: &mut MultiFab,
) {
    assert_same_layout(&[temperature, soot_volume_fraction], absorption);

    absorption
        .fabs_mut()
        .par_iter_mut()
        .enumerate()
        .for_each(|(i, out)| {
            let t = &temperature.fabs()[i];
            let fv = &soot_volume_fraction.fabs()[i];
            let valid = *out.valid_box();
            for iv in valid.cells() {
                let bin = interp_t(Kelvin::from_field(t.get(&iv, 0)));
                let k = out.get(&iv, 0) + db.soot_absorption_at(bin, fv.get(&iv, 0));
                out.set(&iv, 0, k);
            }
        });
}

/// Flat-array variant of [`fill_gas_absorption`]
///
/// # Panics
///
/// Panics if the slices differ in length
pub fn fill_gas_absorption_slice(
    db: &SpectralDatabase,
    gas: &GasSlices<'_>,
    absorption: &mut [f64],
) {
    let n = absorption.len();
    assert!(
        [gas.temperature, gas.y_co2, gas.y_h2o, gas.y_co, gas.pressure]
            .iter()
            .all(|s| s.len() == n),
        "Input arrays must match the output length"
    );

    absorption.par_iter_mut().enumerate().for_each(|(i, out)| {
        let bin = interp_t(Kelvin::from_field(gas.temperature[i]));
        *out = db.gas_absorption_at(bin, gas.y_co2[i], gas.y_h2o[i], gas.y_co[i], gas.pressure[i]);
    });
}

/// Flat-array variant of [`add_soot_absorption`]
///
/// # Panics
///
/// Panics if the slices differ in length
pub fn add_soot_absorption_slice(
    db: &SpectralDatabase,
    temperature: &[f64],
    soot_volume_fraction: &[f64],
    absorption: &mut [f64],
) {
    assert!(
        temperature.len() == absorption.len() && soot_volume_fraction.len() == absorption.len(),
        "Input arrays must match the output length"
    );

    absorption.par_iter_mut().enumerate().for_each(|(i, out)| {
        let bin = interp_t(Kelvin::from_field(temperature[i]));
        *out += db.soot_absorption_at(bin, soot_volume_fraction[i]);
    });
}
