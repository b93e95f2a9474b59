// src/core/builder.rs
use crate::core::normalizer::{first_token, normalize};
use crate::core::types::{CompiledIndex, KeywordRule, TokenMap};
use crate::core::vocabulary::Vocabulary;
use crate::error::BuildError;
use serde_json::Value;
use tracing::{debug, info};

/// Derives the dictionary, first-token index and keyword rules from a raw
/// `description -> legacy label` table.
pub struct DictionaryBuilder<'a> {
    vocabulary: &'a Vocabulary,
}

impl<'a> DictionaryBuilder<'a> {
    pub fn new(vocabulary: &'a Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Builds from a parsed JSON asset. Anything other than an object is
    /// rejected; entries whose value is not a string are skipped.
    pub fn build(&self, raw: &Value) -> Result<CompiledIndex, BuildError> {
        let table = match raw {
            Value::Object(map) => map,
            other => return Err(BuildError::NotAMapping(json_kind(other))),
        };

        let mut skipped = 0usize;
        let pairs = table.iter().filter_map(|(key, value)| match value.as_str() {
            Some(label) => Some((key.as_str(), label)),
            None => {
                debug!("Skipping raw entry '{}' with non-string label", key);
                skipped += 1;
                None
            }
        });
        let index = self.build_pairs(pairs);

        if skipped > 0 {
            info!("Skipped {} raw dictionary entries with non-string labels", skipped);
        }
        Ok(index)
    }

    /// Builds from raw pairs in iteration order. Later pairs overwrite
    /// earlier ones that normalize to the same key.
    pub fn build_pairs<'r>(&self, raw: impl IntoIterator<Item = (&'r str, &'r str)>) -> CompiledIndex {
        let vocab = self.vocabulary;

        let mut dictionary = TokenMap::new();
        for (raw_key, raw_label) in raw {
            let key = normalize(raw_key);
            if key.is_empty() {
                continue;
            }
            let mut category = match vocab.exact_override(&key) {
                Some(pinned) => pinned.clone(),
                None => vocab.canon_category(raw_label),
            };
            // Family overrides beat the legacy label, which is noisy.
            if let Some(family) = first_token(&key).and_then(|t| vocab.first_token_override(t)) {
                category = family.clone();
            }
            dictionary.insert(key, category);
        }

        let mut first_tokens = TokenMap::new();
        for (key, category) in dictionary.iter() {
            if let Some(token) = first_token(key) {
                if !vocab.is_stopword(token) {
                    first_tokens.insert(token.to_string(), category.clone());
                }
            }
        }
        // Overrides apply even to families never seen in the raw table.
        for (token, category) in vocab.first_token_overrides() {
            first_tokens.insert(token.clone(), category.clone());
        }

        let keyword_rules: Vec<KeywordRule> = first_tokens
            .iter()
            .chain(vocab.extra_keywords().iter().map(|(k, c)| (k.as_str(), c)))
            .map(|(keyword, category)| KeywordRule {
                keyword: keyword.to_string(),
                category: category.clone(),
            })
            .collect();

        info!(
            "Built category index: {} descriptions, {} first tokens, {} keyword rules",
            dictionary.len(),
            first_tokens.len(),
            keyword_rules.len()
        );

        CompiledIndex {
            dictionary,
            first_tokens,
            keyword_rules,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
