//! Spectral absorption model
//!
//! Planck-mean absorption coefficients of CO2, H2O, CO and soot, tabulated on a
//! 20 K temperature grid and combined per cell by mass fraction, pressure and soot
//! volume fraction.

mod kernels;
mod model;
mod table;

pub use kernels::{
    add_soot_absorption, add_soot_absorption_slice, fill_gas_absorption,
    fill_gas_absorption_slice, GasFields, GasSlices,
};
pub use model::{GasCellState, Species, SpectralDatabase, PRESSURE_SCALE, SOOT_SCALE};
pub use table::{
    interp_k, interp_t, AbsorptionTable, SpectralError, TemperatureBin, LAST_BIN, NUM_SAMPLES,
    T_MAX, T_MIN, T_STEP,
};
