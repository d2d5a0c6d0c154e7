//! Absorption model entry points

use p1rad_core::spectral::{
    add_soot_absorption_slice, fill_gas_absorption_slice, interp_t, AbsorptionTable, GasSlices,
    SpectralDatabase, NUM_SAMPLES,
};
use p1rad_core::Kelvin;
use std::ptr;

use crate::error::{DefaultP1RadError, P1RadErrorCode};
use crate::helpers::{clear_last_error, track_error, track_result};

/// Number of samples every species table must provide.
pub const P1RAD_TABLE_SAMPLES: usize = NUM_SAMPLES;

/// Loaded absorption tables of CO2, H2O, CO and soot.
///
/// Immutable once created, so one instance may be shared by any number of threads.
pub struct P1RadSpectralDb {
    pub(crate) db: SpectralDatabase,
}

/// Borrow `n` doubles from a caller pointer.
///
/// # Safety
/// `ptr` must be null or point to `n` readable doubles that outlive `'a`.
unsafe fn input_slice<'a>(
    ptr: *const f64,
    n: usize,
    name: &str,
) -> Result<&'a [f64], DefaultP1RadError> {
    if n == 0 {
        return Ok(&[]);
    }
    if ptr.is_null() {
        return Err(DefaultP1RadError::null_pointer(name));
    }
    Ok(unsafe { std::slice::from_raw_parts(ptr, n) })
}

/// Mutably borrow `n` doubles from a caller pointer.
///
/// # Safety
/// `ptr` must be null or point to `n` writable doubles, not aliased by any input.
unsafe fn output_slice<'a>(
    ptr: *mut f64,
    n: usize,
    name: &str,
) -> Result<&'a mut [f64], DefaultP1RadError> {
    if n == 0 {
        return Ok(&mut []);
    }
    if ptr.is_null() {
        return Err(DefaultP1RadError::null_pointer(name));
    }
    Ok(unsafe { std::slice::from_raw_parts_mut(ptr, n) })
}

/// Build one species table from [`P1RAD_TABLE_SAMPLES`] caller doubles.
unsafe fn load_table(ptr: *const f64, species: &str) -> Result<AbsorptionTable, DefaultP1RadError> {
    let samples = unsafe { input_slice(ptr, NUM_SAMPLES, species)? };
    AbsorptionTable::new(samples)
        .map_err(|e| DefaultP1RadError::invalid_table(species, &e.to_string()))
}

/// Borrow the database behind a handle.
///
/// # Safety
/// `db` must be null or a live handle from `p1rad_spectral_db_new`.
unsafe fn database_ref<'a>(
    db: *const P1RadSpectralDb,
) -> Result<&'a SpectralDatabase, DefaultP1RadError> {
    if db.is_null() {
        return Err(DefaultP1RadError::null_pointer("db"));
    }
    Ok(unsafe { &(*db).db })
}

/// Copy all four species tables.
///
/// # Safety
/// Every pointer must be null or valid for [`P1RAD_TABLE_SAMPLES`] reads.
unsafe fn load_database(
    co2: *const f64,
    h2o: *const f64,
    co: *const f64,
    soot: *const f64,
) -> Result<SpectralDatabase, DefaultP1RadError> {
    unsafe {
        Ok(SpectralDatabase {
            co2: load_table(co2, "co2")?,
            h2o: load_table(h2o, "h2o")?,
            co: load_table(co, "co")?,
            soot: load_table(soot, "soot")?,
        })
    }
}

/// Gas absorption over caller arrays.
///
/// # Safety
/// Same contract as [`p1rad_gas_absorption`].
#[allow(clippy::too_many_arguments)]
unsafe fn gas_absorption(
    db: *const P1RadSpectralDb,
    n: usize,
    temperature: *const f64,
    y_co2: *const f64,
    y_h2o: *const f64,
    y_co: *const f64,
    pressure: *const f64,
    out: *mut f64,
) -> Result<(), DefaultP1RadError> {
    unsafe {
        let db = database_ref(db)?;
        let gas = GasSlices {
            temperature: input_slice(temperature, n, "temperature")?,
            y_co2: input_slice(y_co2, n, "y_co2")?,
            y_h2o: input_slice(y_h2o, n, "y_h2o")?,
            y_co: input_slice(y_co, n, "y_co")?,
            pressure: input_slice(pressure, n, "pressure")?,
        };
        fill_gas_absorption_slice(db, &gas, output_slice(out, n, "out")?);
    }
    Ok(())
}

/// Soot absorption over caller arrays.
///
/// # Safety
/// Same contract as [`p1rad_add_soot_absorption`].
unsafe fn soot_absorption(
    db: *const P1RadSpectralDb,
    n: usize,
    temperature: *const f64,
    soot_fv: *const f64,
    inout: *mut f64,
) -> Result<(), DefaultP1RadError> {
    unsafe {
        let db = database_ref(db)?;
        let temperature = input_slice(temperature, n, "temperature")?;
        let soot_fv = input_slice(soot_fv, n, "soot_fv")?;
        add_soot_absorption_slice(db, temperature, soot_fv, output_slice(inout, n, "inout")?);
    }
    Ok(())
}

/// Create a spectral database from four species tables.
///
/// Each table pointer must reference [`P1RAD_TABLE_SAMPLES`] doubles: the
/// Planck-mean absorption coefficient at 300 K, 320 K, ... 2800 K. The samples are
/// copied, so the caller may free its arrays afterwards.
///
/// Returns
/// - `P1RadErrorCode::Ok` (0) with a valid handle in `out_db`
/// - `P1RadErrorCode::NullPointer` if any pointer is null
/// - `P1RadErrorCode::InvalidTable` if a table holds a non-finite sample
///
/// On failure `out_db` is set to null.
///
/// # Safety
///
/// - Every table pointer must be valid for [`P1RAD_TABLE_SAMPLES`] reads.
/// - `out_db` must be a valid, non-null pointer to writable memory.
/// - The caller owns the returned handle and MUST release it with
///   `p1rad_spectral_db_destroy` exactly once.
#[no_mangle]
pub unsafe extern "C" fn p1rad_spectral_db_new(
    co2: *const f64,
    h2o: *const f64,
    co: *const f64,
    soot: *const f64,
    out_db: *mut *mut P1RadSpectralDb,
) -> P1RadErrorCode {
    if out_db.is_null() {
        return track_error(&DefaultP1RadError::null_pointer("out_db"));
    }

    match track_result(unsafe { load_database(co2, h2o, co, soot) }) {
        Ok(db) => {
            unsafe {
                *out_db = Box::into_raw(Box::new(P1RadSpectralDb { db }));
            }
            P1RadErrorCode::Ok
        }
        Err(code) => {
            unsafe {
                *out_db = ptr::null_mut();
            }
            code
        }
    }
}

/// Destroy a database created by `p1rad_spectral_db_new`.
///
/// Null is a no-op.
///
/// # Safety
/// - The pointer MUST have been created by `p1rad_spectral_db_new` and not yet destroyed.
/// - The caller must not use the pointer afterwards.
#[no_mangle]
pub unsafe extern "C" fn p1rad_spectral_db_destroy(db: *mut P1RadSpectralDb) {
    if db.is_null() {
        return;
    }

    // SAFETY: created by `Box::into_raw` in `p1rad_spectral_db_new`.
    unsafe {
        drop(Box::from_raw(db));
    }
}

/// Map a temperature to its table bin and interpolation weight.
///
/// Temperatures below 300 K give bin 0 with weight 0, temperatures above 2800 K
/// give bin 125 with weight 1. Out-of-range input is clamped, never reported.
///
/// # Safety
/// `out_index` and `out_weight` must be valid, non-null pointers.
#[no_mangle]
pub unsafe extern "C" fn p1rad_interp_t(
    temperature: f64,
    out_index: *mut u32,
    out_weight: *mut f64,
) -> P1RadErrorCode {
    if out_index.is_null() {
        return track_error(&DefaultP1RadError::null_pointer("out_index"));
    }
    if out_weight.is_null() {
        return track_error(&DefaultP1RadError::null_pointer("out_weight"));
    }

    let bin = interp_t(Kelvin::from_field(temperature));
    unsafe {
        *out_index = bin.index as u32;
        *out_weight = bin.weight;
    }
    clear_last_error();
    P1RadErrorCode::Ok
}

/// Overwrite `out` with the gas absorption coefficient of `n` cells.
///
/// Per cell: `(y_co2 k_co2(T) + y_h2o k_h2o(T) + y_co k_co(T)) * pressure * 100`.
///
/// # Safety
/// - `db` must be a live handle from `p1rad_spectral_db_new`.
/// - Every array must hold `n` doubles; `out` must be writable and must not
///   overlap any input.
#[no_mangle]
#[allow(clippy::too_many_arguments)]
pub unsafe extern "C" fn p1rad_gas_absorption(
    db: *const P1RadSpectralDb,
    n: usize,
    temperature: *const f64,
    y_co2: *const f64,
    y_h2o: *const f64,
    y_co: *const f64,
    pressure: *const f64,
    out: *mut f64,
) -> P1RadErrorCode {
    let result = unsafe {
        gas_absorption(db, n, temperature, y_co2, y_h2o, y_co, pressure, out)
    };

    match track_result(result) {
        Ok(()) => P1RadErrorCode::Ok,
        Err(code) => code,
    }
}

/// Add the soot absorption coefficient of `n` cells onto `inout`.
///
/// Per cell: `fv k_soot(T) * 100`. Call after `p1rad_gas_absorption` or on a
/// zeroed array.
///
/// # Safety
/// - `db` must be a live handle from `p1rad_spectral_db_new`.
/// - Every array must hold `n` doubles; `inout` must be writable and must not
///   overlap any input.
#[no_mangle]
pub unsafe extern "C" fn p1rad_add_soot_absorption(
    db: *const P1RadSpectralDb,
    n: usize,
    temperature: *const f64,
    soot_fv: *const f64,
    inout: *mut f64,
) -> P1RadErrorCode {
    let result = unsafe { soot_absorption(db, n, temperature, soot_fv, inout) };

    match track_result(result) {
        Ok(()) => P1RadErrorCode::Ok,
        Err(code) => code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{p1rad_get_last_error, p1rad_get_last_error_code};
    use std::ffi::CStr;

    fn constant(value: f64) -> Vec<f64> {
        vec![value; NUM_SAMPLES]
    }

    fn new_db(co2: &[f64], h2o: &[f64], co: &[f64], soot: &[f64]) -> *mut P1RadSpectralDb {
        let mut db = ptr::null_mut();
        let code = unsafe {
            p1rad_spectral_db_new(co2.as_ptr(), h2o.as_ptr(), co.as_ptr(), soot.as_ptr(), &mut db)
        };
        assert_eq!(code, P1RadErrorCode::Ok);
        assert!(!db.is_null());
        db
    }

    #[test]
    fn test_interp_t_clamps() {
        let mut index = 7;
        let mut weight = 0.5;
        unsafe {
            assert_eq!(p1rad_interp_t(299.0, &mut index, &mut weight), P1RadErrorCode::Ok);
        }
        assert_eq!((index, weight), (0, 0.0));
        unsafe {
            assert_eq!(p1rad_interp_t(2801.0, &mut index, &mut weight), P1RadErrorCode::Ok);
        }
        assert_eq!((index, weight), (125, 1.0));
        unsafe {
            assert_eq!(p1rad_interp_t(610.0, &mut index, &mut weight), P1RadErrorCode::Ok);
        }
        assert_eq!(index, 15);
        assert!((weight - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_gas_then_soot() {
        let db = new_db(&constant(2.0), &constant(3.0), &constant(5.0), &constant(7.0));
        let temperature = [600.0, 1500.0];
        let y_co2 = [0.1, 0.2];
        let y_h2o = [0.2, 0.1];
        let y_co = [0.0, 0.05];
        let pressure = [1.0, 0.5];
        let fv = [1.0e-6, 0.0];
        let mut out = [-1.0; 2];

        let code = unsafe {
            p1rad_gas_absorption(
                db,
                2,
                temperature.as_ptr(),
                y_co2.as_ptr(),
                y_h2o.as_ptr(),
                y_co.as_ptr(),
                pressure.as_ptr(),
                out.as_mut_ptr(),
            )
        };
        assert_eq!(code, P1RadErrorCode::Ok);
        let code = unsafe {
            p1rad_add_soot_absorption(db, 2, temperature.as_ptr(), fv.as_ptr(), out.as_mut_ptr())
        };
        assert_eq!(code, P1RadErrorCode::Ok);

        let first = (0.1 * 2.0 + 0.2 * 3.0) * 100.0 + 1.0e-6 * 7.0 * 100.0;
        let second = (0.2 * 2.0 + 0.1 * 3.0 + 0.05 * 5.0) * 50.0;
        assert!((out[0] - first).abs() < 1e-12);
        assert!((out[1] - second).abs() < 1e-12);

        unsafe { p1rad_spectral_db_destroy(db) };
    }

    #[test]
    fn test_null_pointer_sets_last_error() {
        let table = constant(1.0);
        let mut db = ptr::null_mut();
        let code = unsafe {
            p1rad_spectral_db_new(
                table.as_ptr(),
                ptr::null(),
                table.as_ptr(),
                table.as_ptr(),
                &mut db,
            )
        };
        assert_eq!(code, P1RadErrorCode::NullPointer);
        assert!(db.is_null());
        assert_eq!(p1rad_get_last_error_code(), P1RadErrorCode::NullPointer);
        let msg = unsafe { CStr::from_ptr(p1rad_get_last_error()) };
        assert_eq!(msg.to_str().unwrap(), "Parameter 'h2o' cannot be null");
    }

    #[test]
    fn test_non_finite_table_rejected() {
        let good = constant(1.0);
        let mut bad = constant(1.0);
        bad[40] = f64::NAN;
        let mut db = ptr::null_mut();
        let code = unsafe {
            p1rad_spectral_db_new(
                good.as_ptr(),
                good.as_ptr(),
                good.as_ptr(),
                bad.as_ptr(),
                &mut db,
            )
        };
        assert_eq!(code, P1RadErrorCode::InvalidTable);
        assert!(db.is_null());
        let msg = unsafe { CStr::from_ptr(p1rad_get_last_error()) };
        assert!(msg.to_str().unwrap().starts_with("Absorption table soot"));
    }

    #[test]
    fn test_success_clears_last_error() {
        let mut index = 0;
        unsafe {
            assert_eq!(
                p1rad_interp_t(500.0, &mut index, ptr::null_mut()),
                P1RadErrorCode::NullPointer
            );
        }
        assert_eq!(p1rad_get_last_error_code(), P1RadErrorCode::NullPointer);

        let db = new_db(&constant(1.0), &constant(1.0), &constant(1.0), &constant(1.0));
        assert_eq!(p1rad_get_last_error_code(), P1RadErrorCode::Ok);
        assert!(p1rad_get_last_error().is_null());
        unsafe { p1rad_spectral_db_destroy(db) };
    }

    #[test]
    fn test_empty_arrays_accept_null() {
        let db = new_db(&constant(1.0), &constant(1.0), &constant(1.0), &constant(1.0));
        let code = unsafe {
            p1rad_gas_absorption(
                db,
                0,
                ptr::null(),
                ptr::null(),
                ptr::null(),
                ptr::null(),
                ptr::null(),
                ptr::null_mut(),
            )
        };
        assert_eq!(code, P1RadErrorCode::Ok);
        unsafe { p1rad_spectral_db_destroy(db) };
    }
}
