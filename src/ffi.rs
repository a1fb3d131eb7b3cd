//! FFI bindings for campus insights
//!
//! This module provides C-compatible functions for calling the engine from the
//! mobile host. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `insights_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::InsightsConfig;
use crate::engine::InsightsEngine;
use crate::pipeline::compute_json_with;
use crate::types::ParticipantPair;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

fn compute_with_engine(engine: &InsightsEngine, snapshot: &str) -> *mut c_char {
    match compute_json_with(engine, snapshot) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Computation
// ============================================================================

/// Compute insights for a conversation snapshot JSON.
///
/// # Safety
/// - `snapshot_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `insights_free_string`.
/// - Returns NULL on error; call `insights_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn insights_compute(snapshot_json: *const c_char) -> *mut c_char {
    clear_last_error();

    let snapshot = match cstr_to_string(snapshot_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid snapshot string pointer");
            return ptr::null_mut();
        }
    };

    compute_with_engine(&InsightsEngine::default(), &snapshot)
}

/// Compute insights with a JSON engine configuration.
///
/// # Safety
/// - `snapshot_json` and `config_json` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `insights_free_string`.
/// - Returns NULL on error (including an invalid config); call
///   `insights_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn insights_compute_with_config(
    snapshot_json: *const c_char,
    config_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let snapshot = match cstr_to_string(snapshot_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid snapshot string pointer");
            return ptr::null_mut();
        }
    };

    let config = match cstr_to_string(config_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid config string pointer");
            return ptr::null_mut();
        }
    };

    let engine = match InsightsConfig::from_json(&config).and_then(InsightsEngine::with_config) {
        Ok(engine) => engine,
        Err(e) => {
            set_last_error(&e.to_string());
            return ptr::null_mut();
        }
    };

    compute_with_engine(&engine, &snapshot)
}

/// Order two participant ids canonically.
///
/// Returns a JSON object `{"user_a": ..., "user_b": ...}`.
///
/// # Safety
/// - `first` and `second` must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `insights_free_string`.
/// - Returns NULL on error; call `insights_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn insights_canonical_pair(
    first: *const c_char,
    second: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let (first, second) = match (cstr_to_string(first), cstr_to_string(second)) {
        (Some(a), Some(b)) => (a, b),
        _ => {
            set_last_error("Invalid participant id pointer");
            return ptr::null_mut();
        }
    };

    match serde_json::to_string(&ParticipantPair::canonical(first, second)) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by insights functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an insights function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn insights_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next insights call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn insights_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn insights_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> CString {
        CString::new(
            r#"{
            "conversation_id": "conv-ffi",
            "user_a": "A",
            "user_b": "B",
            "messages": [
                { "sender_id": "A", "timestamp": 0 },
                { "sender_id": "B", "timestamp": 60000 },
                { "sender_id": "A", "timestamp": 125000 }
            ]
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn test_ffi_compute() {
        let snapshot = sample_snapshot();

        unsafe {
            let result = insights_compute(snapshot.as_ptr());
            assert!(!result.is_null());

            let result_str = CStr::from_ptr(result).to_str().unwrap();
            let payload: serde_json::Value = serde_json::from_str(result_str).unwrap();
            assert_eq!(payload["conversation_id"], "conv-ffi");
            assert_eq!(payload["median_reply_time_ms"], 62500);

            insights_free_string(result);
        }
    }

    #[test]
    fn test_ffi_compute_with_config() {
        let snapshot = sample_snapshot();
        let config = CString::new(r#"{ "burst_gap_ms": 30000 }"#).unwrap();

        unsafe {
            let result = insights_compute_with_config(snapshot.as_ptr(), config.as_ptr());
            assert!(!result.is_null());

            let payload: serde_json::Value =
                serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
            assert_eq!(payload["bursts_total"], 3);

            insights_free_string(result);
        }
    }

    #[test]
    fn test_ffi_rejects_invalid_config() {
        let snapshot = sample_snapshot();
        let config = CString::new(r#"{ "volume_weight": 2.0 }"#).unwrap();

        unsafe {
            let result = insights_compute_with_config(snapshot.as_ptr(), config.as_ptr());
            assert!(result.is_null());

            let error = CStr::from_ptr(insights_last_error()).to_str().unwrap();
            assert!(error.contains("Invalid configuration"));
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid = CString::new("not json").unwrap();
            let result = insights_compute(invalid.as_ptr());
            assert!(result.is_null());

            let error = insights_last_error();
            assert!(!error.is_null());
            assert!(!CStr::from_ptr(error).to_str().unwrap().is_empty());

            assert!(insights_compute(ptr::null()).is_null());

            // A successful call clears the error
            let snapshot = sample_snapshot();
            let result = insights_compute(snapshot.as_ptr());
            assert!(insights_last_error().is_null());
            insights_free_string(result);
        }
    }

    #[test]
    fn test_ffi_canonical_pair() {
        let first = CString::new("zed").unwrap();
        let second = CString::new("amy").unwrap();

        unsafe {
            let result = insights_canonical_pair(first.as_ptr(), second.as_ptr());
            assert!(!result.is_null());

            let pair: ParticipantPair =
                serde_json::from_str(CStr::from_ptr(result).to_str().unwrap()).unwrap();
            assert_eq!(pair.user_a, "amy");
            assert_eq!(pair.user_b, "zed");

            insights_free_string(result);
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = insights_version();
            assert!(!version.is_null());
            assert!(!CStr::from_ptr(version).to_str().unwrap().is_empty());
        }
    }
}
