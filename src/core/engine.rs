use crate::core::builder::DictionaryBuilder;
use crate::core::classifier::{classify_with, fallback};
use crate::core::normalizer::normalize;
use crate::core::types::{Category, Classification, CompiledIndex};
use crate::core::vocabulary::Vocabulary;
use crate::error::{BuildError, PersistenceError};
use crate::persistence::{load_matching, save_to_disk, source_fingerprint};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

// The engine is a vocabulary plus the index built from it. Once constructed
// it is never mutated, so `&CategoryEngine` can be shared across threads.
#[derive(Debug, Clone)]
pub struct CategoryEngine {
    pub(crate) vocabulary: Vocabulary,
    pub(crate) index: Option<CompiledIndex>,
    pub(crate) fingerprint: Option<u64>,
}

impl CategoryEngine {
    /// An engine with no index. Every query answers the fallback category.
    pub fn unbuilt(vocabulary: Vocabulary) -> Self {
        Self { vocabulary, index: None, fingerprint: None }
    }

    pub fn build(vocabulary: Vocabulary, raw: &Value) -> Result<Self, BuildError> {
        let index = DictionaryBuilder::new(&vocabulary).build(raw)?;
        let fingerprint = Some(source_fingerprint(&vocabulary, raw));
        Ok(Self { vocabulary, index: Some(index), fingerprint })
    }

    /// Like `build`, but a malformed asset degrades to an unbuilt engine.
    pub fn build_or_unbuilt(vocabulary: Vocabulary, raw: &Value) -> Self {
        match DictionaryBuilder::new(&vocabulary).build(raw) {
            Ok(index) => {
                let fingerprint = Some(source_fingerprint(&vocabulary, raw));
                Self { vocabulary, index: Some(index), fingerprint }
            }
            Err(e) => {
                warn!("Category dictionary not built, classifying everything as fallback: {}", e);
                Self::unbuilt(vocabulary)
            }
        }
    }

    /// Reads and parses a raw dictionary JSON file.
    pub fn read_raw_dictionary(path: &Path) -> Result<Value, BuildError> {
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Reuses the snapshot at `snapshot` when it was built from this exact
    /// `vocabulary` and `raw`, otherwise builds and tries to persist the
    /// result for the next start.
    pub fn from_snapshot_or_build(snapshot: &Path, vocabulary: Vocabulary, raw: &Value) -> Self {
        match load_matching(snapshot, source_fingerprint(&vocabulary, raw)) {
            Ok(engine) => {
                info!("Loaded category snapshot from {}", snapshot.display());
                return engine;
            }
            Err(e) => info!("No usable snapshot at {} ({}), building", snapshot.display(), e),
        }

        let engine = Self::build_or_unbuilt(vocabulary, raw);
        if engine.is_built() {
            if let Err(e) = engine.save_snapshot(snapshot) {
                warn!("Failed to save category snapshot: {}", e);
            }
        }
        engine
    }

    pub fn save_snapshot(&self, path: &Path) -> Result<(), PersistenceError> {
        save_to_disk(self, path)
    }

    /// Fingerprint of the inputs this engine was built from, if known.
    pub fn fingerprint(&self) -> Option<u64> {
        self.fingerprint
    }

    pub fn is_built(&self) -> bool {
        self.index.is_some()
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn index(&self) -> Option<&CompiledIndex> {
        self.index.as_ref()
    }

    /// Always a member of the vocabulary's category set.
    pub fn classify(&self, raw_description: &str) -> &Category {
        self.explain(raw_description).category
    }

    /// Classifies and reports which cascade stage decided.
    pub fn explain(&self, raw_description: &str) -> Classification<'_> {
        match &self.index {
            Some(index) => classify_with(&self.vocabulary, index, raw_description),
            None => fallback(&self.vocabulary, normalize(raw_description)),
        }
    }
}
