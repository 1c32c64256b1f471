//! FFI bindings for Stress Gauge
//!
//! This module provides C-compatible functions for calling the scoring engine
//! from other languages. All functions use C strings (null-terminated) and
//! return allocated memory that must be freed by the caller using
//! `gauge_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::error::AssessmentError;
use crate::health::HealthForm;
use crate::pipeline::{
    assess_bundle_json, fuse_json, health_score_json, record_emotion_response, CognitiveMetrics,
};
use crate::report::ReportEncoder;
use crate::session::AssessmentSession;
use crate::types::PersonalDetails;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
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

/// Return the JSON result as a C string, or record the error and return NULL
fn json_result(result: Result<String, AssessmentError>) -> *mut c_char {
    match result {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Map a unit result to a status code (0 ok, -1 error)
fn status(result: Result<(), AssessmentError>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

// ============================================================================
// Stateless API
// ============================================================================

/// Assess a session bundle JSON and return the report envelope JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `gauge_free_string`.
/// - Returns NULL on error; call `gauge_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gauge_assess_bundle(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    json_result(assess_bundle_json(&json_str))
}

/// Validate and score a health form JSON, returning the health result JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `gauge_free_string`.
/// - Returns NULL on error; call `gauge_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gauge_health_score(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    json_result(health_score_json(&json_str))
}

/// Fuse three domain scores, returning `{"final_score", "stress_level"}` JSON.
///
/// # Safety
/// - Returns a newly allocated string that must be freed with `gauge_free_string`.
#[no_mangle]
pub unsafe extern "C" fn gauge_fuse(
    emotion_score: f64,
    cognitive_score: f64,
    health_score: f64,
) -> *mut c_char {
    clear_last_error();
    json_result(fuse_json(emotion_score, cognitive_score, health_score))
}

// ============================================================================
// Stateful Session API
// ============================================================================

/// Opaque handle to an AssessmentSession
pub struct GaugeSessionHandle {
    session: AssessmentSession,
}

/// Start a new session.
///
/// # Safety
/// - `personal_json` may be NULL (anonymous session) or a valid null-terminated
///   C string holding personal details JSON.
/// - Returns a pointer that must be freed with `gauge_session_free`.
/// - Returns NULL on error; call `gauge_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn gauge_session_new(
    personal_json: *const c_char,
) -> *mut GaugeSessionHandle {
    clear_last_error();

    let session = if personal_json.is_null() {
        AssessmentSession::new()
    } else {
        let created = cstr_to_string(personal_json)
            .ok_or_else(|| {
                AssessmentError::EncodingError("Invalid personal details pointer".into())
            })
            .and_then(|json| Ok(serde_json::from_str::<PersonalDetails>(&json)?))
            .and_then(|details| Ok(AssessmentSession::with_personal(details)?));
        match created {
            Ok(session) => session,
            Err(e) => {
                set_last_error(&e.to_string());
                return ptr::null_mut();
            }
        }
    };

    Box::into_raw(Box::new(GaugeSessionHandle { session }))
}

/// Free a session.
///
/// # Safety
/// - `session` must be a valid pointer returned by `gauge_session_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn gauge_session_free(session: *mut GaugeSessionHandle) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Current phase name (`emotion`, `cognitive`, `health`, `complete`).
///
/// # Safety
/// - `session` must be a valid pointer returned by `gauge_session_new`.
/// - Returns a newly allocated string that must be freed with `gauge_free_string`.
#[no_mangle]
pub unsafe extern "C" fn gauge_session_phase(session: *const GaugeSessionHandle) -> *mut c_char {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return ptr::null_mut();
    }

    string_to_cstr((*session).session.phase().as_str())
}

/// Complete the emotion phase with a classifier response body.
///
/// # Safety
/// - `session` must be a valid pointer returned by `gauge_session_new`.
/// - `response_json` may be NULL (no classification; fallback score) or a
///   valid null-terminated C string.
/// - Returns 0 on success, -1 on error. An `{"error": ...}` body is an error
///   and the phase stays retriable.
#[no_mangle]
pub unsafe extern "C" fn gauge_session_emotion(
    session: *mut GaugeSessionHandle,
    response_json: *const c_char,
) -> i32 {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }
    let handle = &mut *session;

    let response = if response_json.is_null() {
        None
    } else {
        match cstr_to_string(response_json).map(|s| serde_json::from_str::<serde_json::Value>(&s)) {
            Some(Ok(value)) => Some(value),
            Some(Err(e)) => {
                set_last_error(&AssessmentError::JsonError(e).to_string());
                return -1;
            }
            None => {
                set_last_error("Invalid JSON string pointer");
                return -1;
            }
        }
    };

    status(record_emotion_response(&mut handle.session, response.as_ref()).map(|_| ()))
}

/// Complete the cognitive phase with raw metrics of the four sub-tests.
///
/// # Safety
/// - `session` must be a valid pointer returned by `gauge_session_new`.
/// - `metrics_json` must be a valid null-terminated C string.
/// - Returns 0 on success, -1 on error.
#[no_mangle]
pub unsafe extern "C" fn gauge_session_cognitive(
    session: *mut GaugeSessionHandle,
    metrics_json: *const c_char,
) -> i32 {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return -1;
    }
    let handle = &mut *session;

    let json_str = match cstr_to_string(metrics_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return -1;
        }
    };

    status(complete_cognitive(&mut handle.session, &json_str))
}

/// Submit the health form, completing the session. Returns the report envelope JSON.
///
/// # Safety
/// - `session` must be a valid pointer returned by `gauge_session_new`.
/// - `form_json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `gauge_free_string`.
/// - Returns NULL on error; the session stays in the health phase.
#[no_mangle]
pub unsafe extern "C" fn gauge_session_health(
    session: *mut GaugeSessionHandle,
    form_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if session.is_null() {
        set_last_error("Null session pointer");
        return ptr::null_mut();
    }
    let handle = &mut *session;

    let json_str = match cstr_to_string(form_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    json_result(submit_health(&mut handle.session, &json_str))
}

fn complete_cognitive(session: &mut AssessmentSession, json: &str) -> Result<(), AssessmentError> {
    let metrics: CognitiveMetrics = serde_json::from_str(json)?;
    session.complete_cognitive(metrics.into_trials()?)?;
    Ok(())
}

fn submit_health(session: &mut AssessmentSession, json: &str) -> Result<String, AssessmentError> {
    let form: HealthForm = serde_json::from_str(json)?;
    session.submit_health(&form)?;
    let report = session.report().ok_or_else(|| {
        AssessmentError::EncodingError("session completed without a report".to_string())
    })?;
    ReportEncoder::new().encode_to_json(report)
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Gauge functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Gauge function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn gauge_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Gauge function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn gauge_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

// ============================================================================
// Version Information
// ============================================================================

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn gauge_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    const COGNITIVE: &str = r#"{
        "reaction_ms": [150, 180, 210, 190, 170],
        "memory": {"moves": 14, "elapsed_seconds": 50},
        "one_back": {"correct": 15},
        "attention": {"correct": 13, "latencies_ms": [900, 900, 900, 900, 900, 900, 900, 900, 900, 900, 900, 900, 900, 900, 900]}
    }"#;

    const HEALTH: &str =
        r#"{"systolic":150,"diastolic":95,"heart_rate":72,"blood_sugar":110,"age":45,"sex":"female"}"#;

    unsafe fn take_string(ptr: *mut c_char) -> String {
        assert!(!ptr.is_null());
        let s = CStr::from_ptr(ptr).to_str().unwrap().to_string();
        gauge_free_string(ptr);
        s
    }

    unsafe fn last_error() -> String {
        let error = gauge_last_error();
        assert!(!error.is_null());
        CStr::from_ptr(error).to_str().unwrap().to_string()
    }

    #[test]
    fn test_ffi_assess_bundle() {
        let bundle = format!(
            r#"{{"emotion_response": {{"dominant_emotion": "angry", "confidence": 80.0}},
                "cognitive": {COGNITIVE}, "health": {HEALTH}}}"#
        );
        let json = CString::new(bundle).unwrap();

        unsafe {
            let result = take_string(gauge_assess_bundle(json.as_ptr()));
            let parsed: serde_json::Value = serde_json::from_str(&result).unwrap();
            assert_eq!(parsed["report"]["emotion_score"], 3.0);
            assert_eq!(parsed["report"]["cognitive_score"], 1.0);
        }
    }

    #[test]
    fn test_ffi_health_score() {
        let json = CString::new(HEALTH).unwrap();
        unsafe {
            let result = take_string(gauge_health_score(json.as_ptr()));
            assert!(result.contains("\"health_score\":1.0"));
        }
    }

    #[test]
    fn test_ffi_fuse() {
        unsafe {
            let result = take_string(gauge_fuse(2.0, 1.5, 1.0));
            assert_eq!(result, r#"{"final_score":1.58,"stress_level":"Mild"}"#);
        }
    }

    #[test]
    fn test_ffi_session_lifecycle() {
        unsafe {
            let session = gauge_session_new(ptr::null());
            assert!(!session.is_null());
            assert_eq!(take_string(gauge_session_phase(session)), "emotion");

            // Classifier failure keeps the phase retriable
            let failure = CString::new(r#"{"error": "No face detected"}"#).unwrap();
            assert_eq!(gauge_session_emotion(session, failure.as_ptr()), -1);
            assert!(last_error().contains("No face detected"));
            assert_eq!(take_string(gauge_session_phase(session)), "emotion");

            let response =
                CString::new(r#"{"dominant_emotion": "happy", "confidence": 97.1}"#).unwrap();
            assert_eq!(gauge_session_emotion(session, response.as_ptr()), 0);

            let cognitive = CString::new(COGNITIVE).unwrap();
            assert_eq!(gauge_session_cognitive(session, cognitive.as_ptr()), 0);

            // Invalid form leaves the session in the health phase
            let bad = CString::new(r#"{"systolic":150}"#).unwrap();
            assert!(gauge_session_health(session, bad.as_ptr()).is_null());
            assert_eq!(take_string(gauge_session_phase(session)), "health");

            let health = CString::new(HEALTH).unwrap();
            let report = take_string(gauge_session_health(session, health.as_ptr()));
            let parsed: serde_json::Value = serde_json::from_str(&report).unwrap();
            // 0 + 0.35 + 0.25 = 0.6
            assert_eq!(parsed["report"]["final_score"], 0.6);
            assert_eq!(parsed["report"]["stress_level"], "Normal");
            assert_eq!(take_string(gauge_session_phase(session)), "complete");

            gauge_session_free(session);
        }
    }

    #[test]
    fn test_ffi_rejects_incomplete_personal_details() {
        let details = CString::new(
            r#"{"first_name":"A","last_name":"","email":"a@b.c","date_of_birth":"2000-01-01","gender":"f"}"#,
        )
        .unwrap();
        unsafe {
            assert!(gauge_session_new(details.as_ptr()).is_null());
            assert!(last_error().contains("last_name"));
        }
    }

    #[test]
    fn test_ffi_error_handling() {
        unsafe {
            let invalid_json = CString::new("not json").unwrap();
            assert!(gauge_assess_bundle(invalid_json.as_ptr()).is_null());
            assert!(!last_error().is_empty());

            assert!(gauge_assess_bundle(ptr::null()).is_null());
            assert_eq!(gauge_session_cognitive(ptr::null_mut(), invalid_json.as_ptr()), -1);
        }
    }

    #[test]
    fn test_ffi_version() {
        unsafe {
            let version = gauge_version();
            assert!(!version.is_null());

            let version_str = CStr::from_ptr(version).to_str().unwrap();
            assert_eq!(version_str, crate::GAUGE_VERSION);
        }
    }
}
