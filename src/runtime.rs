// File: src/runtime.rs
//! Process-wide category store for callers that cannot thread a
//! `CategoryEngine` through (the C ABI, the batch importer).
//!
//! The store is set at most once. Until then `classify` answers the
//! fallback category of the bundled vocabulary.

use crate::core::engine::CategoryEngine;
use crate::core::types::{Category, Classification};
use crate::core::vocabulary::Vocabulary;
use serde_json::Value;
use std::sync::OnceLock;
use tracing::{debug, warn};

static STORE: OnceLock<CategoryEngine> = OnceLock::new();

/// Builds the store from a raw dictionary with the bundled vocabulary.
///
/// Returns whether the store is built afterwards. Calls after a successful
/// build are no-ops; a malformed asset leaves the store unbuilt.
pub fn initialize(raw: &Value) -> bool {
    if STORE.get().is_some() {
        debug!("Category store already built, ignoring initialize");
        return true;
    }
    match CategoryEngine::build(Vocabulary::builtin().clone(), raw) {
        Ok(engine) => initialize_with(engine),
        Err(e) => {
            warn!("Category store left unbuilt: {}", e);
            false
        }
    }
}

/// Publishes an already built engine. Unbuilt engines are not published.
pub fn initialize_with(engine: CategoryEngine) -> bool {
    if !engine.is_built() {
        warn!("Refusing to publish an unbuilt category engine");
        return is_initialized();
    }
    if STORE.set(engine).is_err() {
        debug!("Category store already built, keeping the first engine");
    }
    true
}

pub fn is_initialized() -> bool {
    STORE.get().is_some()
}

/// The published engine, if any.
pub fn engine() -> Option<&'static CategoryEngine> {
    STORE.get()
}

pub fn classify(raw_description: &str) -> Category {
    match STORE.get() {
        Some(engine) => engine.classify(raw_description).clone(),
        None => Vocabulary::builtin().fallback().clone(),
    }
}

pub fn explain(raw_description: &str) -> Classification<'static> {
    match STORE.get() {
        Some(engine) => engine.explain(raw_description),
        None => crate::core::classifier::fallback(
            Vocabulary::builtin(),
            crate::core::normalizer::normalize(raw_description),
        ),
    }
}
