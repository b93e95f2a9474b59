// File: src/c_api.rs
// C ABI for the app host. Backed by the process-wide runtime store, so no
// engine pointer crosses the boundary.
use crate::fuzzy::{suggest, BigramDice};
use crate::runtime;
use serde_json::Value;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Null or non-UTF-8 input reads as the empty string.
unsafe fn read_str<'a>(ptr: *const c_char) -> &'a str {
    if ptr.is_null() {
        return "";
    }
    CStr::from_ptr(ptr).to_str().unwrap_or("")
}

fn into_c_string(s: String) -> *mut c_char {
    CString::new(s).unwrap_or_default().into_raw()
}

/// Builds the store from a JSON object of `description -> legacy label`.
/// Returns true once the store is built.
#[no_mangle]
pub extern "C" fn cesta_initialize(raw_dictionary_json: *const c_char) -> bool {
    let json = unsafe { read_str(raw_dictionary_json) };
    let result = catch_unwind(AssertUnwindSafe(|| {
        match serde_json::from_str::<Value>(json) {
            Ok(raw) => runtime::initialize(&raw),
            Err(e) => {
                tracing::warn!("Raw dictionary is not valid JSON: {}", e);
                runtime::is_initialized()
            }
        }
    }));
    result.unwrap_or_else(|_| {
        tracing::error!("Panic in cesta_initialize");
        false
    })
}

/// Returns the category id for `description`. Free with `cesta_free_string`.
#[no_mangle]
pub extern "C" fn cesta_classify(description: *const c_char) -> *mut c_char {
    let description = unsafe { read_str(description) };
    let result = catch_unwind(AssertUnwindSafe(|| runtime::classify(description).to_string()));
    let category = result.unwrap_or_else(|_| {
        tracing::error!("Panic in cesta_classify");
        crate::core::vocabulary::Vocabulary::builtin().fallback().to_string()
    });
    into_c_string(category)
}

/// Returns a JSON array of `{description, category, score}` objects.
/// Free with `cesta_free_string`.
#[no_mangle]
pub extern "C" fn cesta_suggest(query: *const c_char, limit: u32) -> *mut c_char {
    let query = unsafe { read_str(query) };
    let result = catch_unwind(AssertUnwindSafe(|| {
        let Some(engine) = runtime::engine() else {
            return "[]".to_string();
        };
        let suggestions: Vec<Value> = suggest(engine, query, limit as usize, &BigramDice)
            .into_iter()
            .map(|s| {
                serde_json::json!({
                    "description": s.description,
                    "category": s.category,
                    "score": s.score,
                })
            })
            .collect();
        serde_json::to_string(&suggestions).unwrap_or_else(|_| "[]".to_string())
    }));
    let json = result.unwrap_or_else(|_| {
        tracing::error!("Panic in cesta_suggest");
        "[]".to_string()
    });
    into_c_string(json)
}

#[no_mangle]
pub extern "C" fn cesta_free_string(s: *mut c_char) {
    if !s.is_null() {
        unsafe {
            drop(CString::from_raw(s));
        }
    }
}
