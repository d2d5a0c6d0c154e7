//! C ABI for the P1 radiation core
//!
//! Exposes the spectral absorption model to host codes that own their own mesh
//! and field storage. Every fallible call returns a [`P1RadErrorCode`]; the
//! message of the last failure on the calling thread is available through
//! [`p1rad_get_last_error`].

mod error;
mod helpers;
mod spectral;

pub use error::{p1rad_get_last_error, p1rad_get_last_error_code, P1RadErrorCode};
pub use spectral::{
    p1rad_add_soot_absorption, p1rad_gas_absorption, p1rad_interp_t, p1rad_spectral_db_destroy,
    p1rad_spectral_db_new, P1RadSpectralDb, P1RAD_TABLE_SAMPLES,
};
