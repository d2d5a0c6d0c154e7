use std::cell::RefCell;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;

/// Common interface for FFI error types.
///
/// `code()` is what crosses the FFI boundary, `msg()` is kept for
/// `p1rad_get_last_error`.
pub(crate) trait P1RadError {
    /// Returns the error code to be returned across the FFI boundary.
    fn code(&self) -> P1RadErrorCode;

    /// Returns the human-readable error message.
    fn msg(&self) -> &str;
}

/// Default implementation of `P1RadError` for the FFI failure cases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DefaultP1RadError {
    code: P1RadErrorCode,
    msg: String,
}

impl DefaultP1RadError {
    /// Create error for null pointer passed where non-null required.
    ///
    /// # Arguments
    /// * `param_name` - The name of the parameter that was null (e.g., `"out_db"`, `"temperature"`)
    pub fn null_pointer(param_name: &str) -> Self {
        Self {
            code: P1RadErrorCode::NullPointer,
            msg: format!("Parameter '{param_name}' cannot be null"),
        }
    }

    /// Create error for a species table that failed validation.
    ///
    /// # Arguments
    /// * `species` - Species whose table was rejected (e.g., `"co2"`, `"soot"`)
    /// * `reason` - Validation failure
    pub fn invalid_table(species: &str, reason: &str) -> Self {
        Self {
            code: P1RadErrorCode::InvalidTable,
            msg: format!("Absorption table {species}: {reason}"),
        }
    }
}

impl P1RadError for DefaultP1RadError {
    fn code(&self) -> P1RadErrorCode {
        self.code
    }

    fn msg(&self) -> &str {
        &self.msg
    }
}

/// FFI error codes returned by radiation functions.
/// Follows standard C convention: 0 = success, non-zero = error.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum P1RadErrorCode {
    /// Operation completed successfully.
    Ok = 0,

    /// Invalid pointer: null pointer passed where non-null required.
    NullPointer = 1,

    /// Absorption table rejected: wrong sample count or non-finite sample.
    InvalidTable = 2,
}

impl From<DefaultP1RadError> for P1RadErrorCode {
    fn from(error: DefaultP1RadError) -> Self {
        error.code
    }
}

thread_local! {
    /// Most recent FFI error on this thread (C string, error code).
    /// The CString is owned here so the pointer handed out stays valid.
    static LAST_ERROR: RefCell<(Option<CString>, P1RadErrorCode)> = const { RefCell::new((None, P1RadErrorCode::Ok)) };
}

/// Internal helper to read `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error<F, R>(f: F) -> R
where
    F: FnOnce(&(Option<CString>, P1RadErrorCode)) -> R,
{
    LAST_ERROR.with_borrow(f)
}

/// Internal helper to mutate `LAST_ERROR` thread-local storage (cstring, code).
pub(crate) fn with_last_error_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut (Option<CString>, P1RadErrorCode)) -> R,
{
    LAST_ERROR.with_borrow_mut(f)
}

/// Retrieve the most recent FFI error message as a null-terminated C string.
///
/// Returns:
/// - A borrowed pointer to the error message if an error occurred.
/// - `null` if the last call succeeded or no call has failed yet.
///
/// # Thread Safety
/// Error messages are stored per-thread, so each thread sees only its own failures.
///
/// # Lifetime
/// The returned pointer is valid until the next FFI call on this thread.
///
/// **DO NOT FREE THIS POINTER** - it is managed internally.
///
/// Example:
/// ```cpp
/// P1RadSpectralDb* db = nullptr;
/// P1RadErrorCode err = p1rad_spectral_db_new(co2, h2o, co, soot, &db);
/// if (err != P1RadErrorCode::Ok) {
///     const char* error = p1rad_get_last_error();
///     if (error) {
///         printf("Table load failed: %s\n", error);
///     }
/// }
/// ```
#[no_mangle]
pub extern "C" fn p1rad_get_last_error() -> *const c_char {
    with_last_error(|(cstring, _code)| cstring.as_ref().map_or(ptr::null(), |cs| cs.as_ptr()))
}

/// Retrieve the most recent FFI error code.
///
/// Returns `P1RadErrorCode::Ok` (0) if the last call on this thread succeeded.
#[no_mangle]
pub extern "C" fn p1rad_get_last_error_code() -> P1RadErrorCode {
    with_last_error(|(_cstring, code)| *code)
}
