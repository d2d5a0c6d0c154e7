//! Last-error bookkeeping shared by the exported functions
//!
//! Every `p1rad_*` entry point that can fail reports through the thread-local
//! slot in [`crate::error`]: a failure stores its message and code, a success
//! clears both, so `p1rad_get_last_error` always describes the latest call on the
//! calling thread.

use crate::error::{with_last_error_mut, P1RadError, P1RadErrorCode};
use std::ffi::CString;

/// Store `error` as the calling thread's last error and return its code
#[inline]
pub(crate) fn track_error(error: &impl P1RadError) -> P1RadErrorCode {
    let code = error.code();
    with_last_error_mut(|(cstring, last_code)| {
        *cstring = CString::new(error.msg()).ok();
        *last_code = code;
    });
    code
}

/// Convert a table-loading or kernel result into the code handed back over the
/// C boundary, updating the last-error slot either way
pub(crate) fn track_result<T, E: P1RadError>(result: Result<T, E>) -> Result<T, P1RadErrorCode> {
    match result {
        Ok(value) => {
            clear_last_error();
            Ok(value)
        }
        Err(error) => Err(track_error(&error)),
    }
}

/// Reset the last-error slot to `Ok` with no message
pub(crate) fn clear_last_error() {
    with_last_error_mut(|(cstring, code)| {
        *cstring = None;
        *code = P1RadErrorCode::Ok;
    });
}
