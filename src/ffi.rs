//! FFI bindings for BioEngine Analytics
//!
//! This module provides C-compatible functions for calling the engine from the
//! mobile shells. All functions use C strings (null-terminated) and return
//! allocated memory that must be freed by the caller using
//! `bioengine_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::config::EngineConfig;
use crate::encoder::{AcwrPayload, SnapshotEncoder};
use crate::error::EngineError;
use crate::features::FeatureDeriver;
use crate::normalizer::ActivityNormalizer;
use crate::pipeline::{compute_dashboard, AnalyticsEngine, DashboardQuery};
use crate::schema::{de::parse_timestamp, RecordAdapter};
use crate::types::ActivityKind;
use crate::weight::WeightTimeline;
use crate::workload::compute_acwr;

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

/// Read a required string argument, recording an error when it is unusable
unsafe fn required_arg(ptr: *const c_char, name: &str) -> Option<String> {
    let value = cstr_to_string(ptr);
    if value.is_none() {
        set_last_error(&format!("Invalid {name} string pointer"));
    }
    value
}

/// Hand a result to C: the string on success, NULL plus last error on failure
fn into_c_result(result: Result<String, EngineError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Compute a dashboard payload from raw API JSON.
///
/// `query_json` is a JSON object: `{"date": "30d", "type": "all",
/// "metric": "none", "page": 1, "reference": "2025-06-01T00:00:00Z"}`.
///
/// # Safety
/// - All arguments must be valid null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `bioengine_free_string`.
/// - Returns NULL on error; call `bioengine_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn bioengine_compute_dashboard(
    activities_json: *const c_char,
    biometrics_json: *const c_char,
    query_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(activities) = required_arg(activities_json, "activities JSON") else {
        return ptr::null_mut();
    };
    let Some(biometrics) = required_arg(biometrics_json, "biometrics JSON") else {
        return ptr::null_mut();
    };
    let Some(query) = required_arg(query_json, "query JSON") else {
        return ptr::null_mut();
    };

    into_c_result((|| {
        let query: DashboardQuery = serde_json::from_str(&query)?;
        let snapshot = compute_dashboard(&activities, &biometrics, &query)?;
        SnapshotEncoder::new().encode_to_json(&snapshot)
    })())
}

/// Normalize a raw activity type string to its dashboard label.
///
/// # Safety
/// - `raw_type` must be a valid null-terminated C string, or NULL (label "Otros").
/// - Returns a newly allocated string that must be freed with `bioengine_free_string`.
#[no_mangle]
pub unsafe extern "C" fn bioengine_normalize_type(raw_type: *const c_char) -> *mut c_char {
    clear_last_error();

    let label = match cstr_to_string(raw_type) {
        Some(raw) => ActivityNormalizer::normalize_type(&raw).to_string(),
        None => ActivityKind::Unspecified.to_string(),
    };
    string_to_cstr(&label)
}

/// Compute workload ratios for an activity array as of `reference`.
///
/// # Safety
/// - `activities_json` and `reference` (RFC 3339 or `YYYY-MM-DD`) must be valid
///   null-terminated C strings.
/// - Returns a newly allocated string that must be freed with `bioengine_free_string`.
/// - Returns NULL on error; call `bioengine_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn bioengine_compute_acwr(
    activities_json: *const c_char,
    reference: *const c_char,
) -> *mut c_char {
    clear_last_error();

    let Some(activities) = required_arg(activities_json, "activities JSON") else {
        return ptr::null_mut();
    };
    let Some(reference) = required_arg(reference, "reference date") else {
        return ptr::null_mut();
    };

    into_c_result((|| {
        let reference = parse_timestamp(&reference)?;
        let records = RecordAdapter::parse_activities(&activities)?;
        let enriched = FeatureDeriver::derive_all(&records, &WeightTimeline::default());
        let payload = AcwrPayload::from(&compute_acwr(&enriched, reference));
        serde_json::to_string(&payload).map_err(|e| EngineError::EncodingError(e.to_string()))
    })())
}

// ============================================================================
// Stateful Engine API
// ============================================================================

/// Opaque handle to an AnalyticsEngine
pub struct EngineHandle {
    engine: AnalyticsEngine,
    encoder: SnapshotEncoder,
}

/// Create a new engine.
///
/// # Safety
/// - `config_json` must be a valid null-terminated C string, or NULL for defaults.
/// - Returns a pointer that must be freed with `bioengine_engine_free`.
/// - Returns NULL when the configuration is invalid.
#[no_mangle]
pub unsafe extern "C" fn bioengine_engine_new(config_json: *const c_char) -> *mut EngineHandle {
    clear_last_error();

    let config = match cstr_to_string(config_json) {
        None => EngineConfig::default(),
        Some(json) => match EngineConfig::from_json(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        },
    };

    let handle = Box::new(EngineHandle {
        engine: AnalyticsEngine::with_config(config),
        encoder: SnapshotEncoder::new(),
    });
    Box::into_raw(handle)
}

/// Free an engine.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `bioengine_engine_new`, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn bioengine_engine_free(engine: *mut EngineHandle) {
    if !engine.is_null() {
        drop(Box::from_raw(engine));
    }
}

/// Replace the engine's dataset.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `bioengine_engine_new`.
/// - `activities_json` and `biometrics_json` must be valid null-terminated C strings.
/// - Returns 0 on success, -1 on error (the previous dataset is kept).
/// - On error, call `bioengine_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn bioengine_engine_load(
    engine: *mut EngineHandle,
    activities_json: *const c_char,
    biometrics_json: *const c_char,
) -> i32 {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return -1;
    }
    let handle = &mut *engine;

    let Some(activities) = required_arg(activities_json, "activities JSON") else {
        return -1;
    };
    let Some(biometrics) = required_arg(biometrics_json, "biometrics JSON") else {
        return -1;
    };

    match handle.engine.load_json(&activities, &biometrics) {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Compute a dashboard payload from the loaded dataset.
///
/// # Safety
/// - `engine` must be a valid pointer returned by `bioengine_engine_new`.
/// - `query_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `bioengine_free_string`.
/// - Returns NULL on error; call `bioengine_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn bioengine_engine_dashboard(
    engine: *const EngineHandle,
    query_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if engine.is_null() {
        set_last_error("Null engine pointer");
        return ptr::null_mut();
    }
    let handle = &*engine;

    let Some(query) = required_arg(query_json, "query JSON") else {
        return ptr::null_mut();
    };

    into_c_result((|| {
        let query: DashboardQuery = serde_json::from_str(&query)?;
        let snapshot = handle.engine.dashboard(&query);
        handle.encoder.encode_to_json(&snapshot)
    })())
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by BioEngine functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a BioEngine function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn bioengine_free_string(ptr: *mut c_char) {
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
/// - The returned pointer is valid until the next BioEngine call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn bioengine_last_error() -> *const c_char {
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
pub unsafe extern "C" fn bioengine_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activities() -> CString {
        CString::new(
            r#"[
                {"id": 1, "fecha": "2025-06-13T07:00:00Z", "tipo": "running", "distancia_km": 12, "duracion_min": 60},
                {"id": 2, "fecha": "2025-06-03T07:00:00Z", "tipo": "running", "distancia_km": 12, "duracion_min": 62}
            ]"#,
        )
        .unwrap()
    }

    fn biometrics() -> CString {
        CString::new(r#"[{"fecha": "2025-06-01", "peso": 71.0}]"#).unwrap()
    }

    fn query() -> CString {
        CString::new(r#"{"date": "30d", "type": "all", "metric": "none", "reference": "2025-06-15T12:00:00Z"}"#)
            .unwrap()
    }

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let value = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        bioengine_free_string(ptr);
        value
    }

    #[test]
    fn test_ffi_compute_dashboard() {
        unsafe {
            let (activities, biometrics, query) = (activities(), biometrics(), query());
            let result =
                bioengine_compute_dashboard(activities.as_ptr(), biometrics.as_ptr(), query.as_ptr());
            let json: serde_json::Value = serde_json::from_str(&take_string(result)).unwrap();

            assert_eq!(json["kpis"]["count"], 2);
            assert_eq!(json["rows"][0]["weight_kg"], "71.0");
            assert_eq!(json["producer"]["name"], crate::PRODUCER_NAME);
        }
    }

    #[test]
    fn test_ffi_normalize_type() {
        unsafe {
            let raw = CString::new("ciclismo").unwrap();
            assert_eq!(take_string(bioengine_normalize_type(raw.as_ptr())), "Ciclismo");
            assert_eq!(take_string(bioengine_normalize_type(ptr::null())), "Otros");
        }
    }

    #[test]
    fn test_ffi_compute_acwr() {
        unsafe {
            let activities = activities();
            let reference = CString::new("2025-06-15").unwrap();
            let result = bioengine_compute_acwr(activities.as_ptr(), reference.as_ptr());
            let json: serde_json::Value = serde_json::from_str(&take_string(result)).unwrap();

            // 12/7 acute vs 24/28 chronic
            assert_eq!(json["acwr"]["ratio"], "2.00");
            assert_eq!(json["status"], "ZONA ROJA (PELIGRO)");
        }
    }

    #[test]
    fn test_ffi_engine_lifecycle() {
        unsafe {
            let config = CString::new(r#"{"page_size": 1}"#).unwrap();
            let engine = bioengine_engine_new(config.as_ptr());
            assert!(!engine.is_null());

            let (activities, biometrics, query) = (activities(), biometrics(), query());
            let loaded = bioengine_engine_load(engine, activities.as_ptr(), biometrics.as_ptr());
            assert_eq!(loaded, 0);

            let result = bioengine_engine_dashboard(engine, query.as_ptr());
            let json: serde_json::Value = serde_json::from_str(&take_string(result)).unwrap();
            assert_eq!(json["page"]["total_pages"], 2);
            assert_eq!(json["rows"].as_array().map(Vec::len), Some(1));

            bioengine_engine_free(engine);
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let (activities, biometrics, query) = (activities(), biometrics(), query());
            let bad = CString::new("not json").unwrap();
            let result = bioengine_compute_dashboard(bad.as_ptr(), biometrics.as_ptr(), query.as_ptr());
            assert!(result.is_null());

            let error = bioengine_last_error();
            assert!(!error.is_null());
            assert!(!CStr::from_ptr(error).to_str().unwrap().is_empty());

            let bad_config = CString::new(r#"{"page_size": 0}"#).unwrap();
            assert!(bioengine_engine_new(bad_config.as_ptr()).is_null());

            assert_eq!(
                bioengine_engine_load(ptr::null_mut(), activities.as_ptr(), biometrics.as_ptr()),
                -1
            );
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = bioengine_version();
            assert!(!version.is_null());
            assert!(!CStr::from_ptr(version).to_str().unwrap().is_empty());
        }
    }
}
