// src/core/vocabulary.rs
use crate::core::normalizer::normalize;
use crate::core::types::Category;
use crate::error::VocabularyError;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::Path;
use std::sync::LazyLock;

static BUILTIN: LazyLock<Vocabulary> = LazyLock::new(|| {
    let json = include_str!("../../config/vocabulary.json");
    Vocabulary::from_json_str(json).expect("Failed to load bundled vocabulary.json")
});

/// The on-disk shape of a vocabulary file. Pair lists keep their order.
#[derive(Debug, Clone, Deserialize)]
struct VocabularyFile {
    categories: Vec<String>,
    fallback: String,
    #[serde(default)]
    stopwords: Vec<String>,
    #[serde(default)]
    legacy_remap: HashMap<String, String>,
    #[serde(default)]
    first_token_overrides: Vec<(String, String)>,
    #[serde(default)]
    extra_keywords: Vec<(String, String)>,
    #[serde(default)]
    exact_overrides: HashMap<String, String>,
}

/// Build-time configuration of the categorization engine.
///
/// Every key is stored normalized and every value is a member of
/// `categories`; a `Vocabulary` that exists has passed validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vocabulary {
    categories: Vec<Category>,
    fallback: Category,
    stopwords: HashSet<String>,
    legacy_remap: HashMap<String, Category>,
    first_token_overrides: Vec<(String, Category)>,
    first_token_lookup: HashMap<String, Category>,
    extra_keywords: Vec<(String, Category)>,
    exact_overrides: HashMap<String, Category>,
}

impl Vocabulary {
    /// The vocabulary bundled with the crate.
    pub fn builtin() -> &'static Vocabulary {
        &BUILTIN
    }

    pub fn from_path(path: &Path) -> Result<Self, VocabularyError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self, VocabularyError> {
        let file: VocabularyFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    fn from_file(file: VocabularyFile) -> Result<Self, VocabularyError> {
        // Raw keys that normalize alike must be caught before the map
        // tables collapse them.
        let legacy_remap = file
            .legacy_remap
            .into_iter()
            .map(|(raw, cat)| {
                let key = normalized_key("legacy_remap", &raw, clean_legacy_label)?;
                Ok((key, Category::new(cat)))
            })
            .collect::<Result<Vec<_>, VocabularyError>>()?;
        reject_duplicates("legacy_remap", legacy_remap.iter().map(|(k, _)| k.as_str()))?;

        let exact_overrides = normalized_pairs("exact_overrides", file.exact_overrides)?;
        reject_duplicates("exact_overrides", exact_overrides.iter().map(|(k, _)| k.as_str()))?;

        let first_token_overrides =
            normalized_pairs("first_token_overrides", file.first_token_overrides)?;
        let first_token_lookup: HashMap<String, Category> =
            first_token_overrides.iter().cloned().collect();

        let vocabulary = Self {
            categories: file.categories.into_iter().map(Category::new).collect(),
            fallback: Category::new(file.fallback),
            stopwords: file
                .stopwords
                .iter()
                .map(|s| normalize(s))
                .filter(|s| !s.is_empty())
                .collect(),
            legacy_remap: legacy_remap.into_iter().collect(),
            first_token_overrides,
            first_token_lookup,
            extra_keywords: normalized_pairs("extra_keywords", file.extra_keywords)?,
            exact_overrides: exact_overrides.into_iter().collect(),
        };
        vocabulary.validate()?;
        Ok(vocabulary)
    }

    /// Rejects configuration that would let the classifier hand out a
    /// category outside the closed set or index a stopword.
    pub fn validate(&self) -> Result<(), VocabularyError> {
        if self.categories.is_empty() {
            return Err(VocabularyError::NoCategories);
        }
        if !self.is_member(self.fallback.as_str()) {
            return Err(VocabularyError::UnknownFallback(self.fallback.to_string()));
        }

        let tables: [(&'static str, Vec<(&str, &Category)>); 4] = [
            ("legacy_remap", self.legacy_remap.iter().map(|(k, c)| (k.as_str(), c)).collect()),
            ("first_token_overrides", self.first_token_overrides.iter().map(|(k, c)| (k.as_str(), c)).collect()),
            ("extra_keywords", self.extra_keywords.iter().map(|(k, c)| (k.as_str(), c)).collect()),
            ("exact_overrides", self.exact_overrides.iter().map(|(k, c)| (k.as_str(), c)).collect()),
        ];
        for (table, entries) in tables {
            for (key, category) in entries {
                if !self.is_member(category.as_str()) {
                    return Err(VocabularyError::UnknownCategory {
                        table,
                        key: key.to_string(),
                        category: category.to_string(),
                    });
                }
            }
        }

        reject_duplicates(
            "first_token_overrides",
            self.first_token_overrides.iter().map(|(k, _)| k.as_str()),
        )?;
        reject_duplicates("extra_keywords", self.extra_keywords.iter().map(|(k, _)| k.as_str()))?;
        let lookup_matches = self.first_token_lookup.len() == self.first_token_overrides.len()
            && self
                .first_token_overrides
                .iter()
                .all(|(t, c)| self.first_token_lookup.get(t) == Some(c));
        if !lookup_matches {
            return Err(VocabularyError::InconsistentOverrides);
        }

        for (token, _) in &self.first_token_overrides {
            if token.contains(' ') {
                return Err(VocabularyError::MultiTokenOverride(token.clone()));
            }
            if self.is_stopword(token) {
                return Err(VocabularyError::StopwordOverride(token.clone()));
            }
        }
        Ok(())
    }

    /// Maps a noisy legacy label onto the closed category set.
    ///
    /// Unknown or placeholder labels resolve to the fallback category.
    pub fn canon_category(&self, raw_legacy: &str) -> Category {
        let cleaned = clean_legacy_label(raw_legacy);
        let candidate = self
            .legacy_remap
            .get(&cleaned)
            .map(Category::as_str)
            .unwrap_or(&cleaned);
        self.member(candidate)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }

    pub fn is_member(&self, name: &str) -> bool {
        self.member(name).is_some()
    }

    /// The vocabulary's own `Category` value for `name`, if it is in the set.
    pub fn member(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.as_str() == name)
    }

    pub fn is_stopword(&self, token: &str) -> bool {
        self.stopwords.contains(token)
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn fallback(&self) -> &Category {
        &self.fallback
    }

    pub fn exact_override(&self, normalized: &str) -> Option<&Category> {
        self.exact_overrides.get(normalized)
    }

    pub fn first_token_override(&self, token: &str) -> Option<&Category> {
        self.first_token_lookup.get(token)
    }

    pub fn first_token_overrides(&self) -> &[(String, Category)] {
        &self.first_token_overrides
    }

    pub fn extra_keywords(&self) -> &[(String, Category)] {
        &self.extra_keywords
    }
}

// Map and set tables hash in sorted order so equal vocabularies hash equally
// in every process.
impl Hash for Vocabulary {
    fn hash<H: Hasher>(&self, state: &mut H) {
        fn sorted<T: Ord>(items: impl Iterator<Item = T>) -> Vec<T> {
            let mut items: Vec<T> = items.collect();
            items.sort();
            items
        }

        self.categories.hash(state);
        self.fallback.hash(state);
        sorted(self.stopwords.iter()).hash(state);
        sorted(self.legacy_remap.iter()).hash(state);
        self.first_token_overrides.hash(state);
        self.extra_keywords.hash(state);
        sorted(self.exact_overrides.iter()).hash(state);
    }
}

/// Lower-cases, strips accents, drops standalone digit groups and the
/// legacy "mat " prefix.
fn clean_legacy_label(raw: &str) -> String {
    let normalized = normalize(raw);
    let kept: Vec<&str> = normalized
        .split(' ')
        .filter(|token| !token.chars().all(|c| c.is_ascii_digit()))
        .collect();
    let joined = kept.join(" ");
    match joined.strip_prefix("mat ") {
        Some(rest) => rest.to_string(),
        None => joined,
    }
}

fn normalized_key(
    table: &'static str,
    raw: &str,
    clean: fn(&str) -> String,
) -> Result<String, VocabularyError> {
    let key = clean(raw);
    if key.is_empty() {
        return Err(VocabularyError::EmptyKey {
            table,
            raw: raw.to_string(),
        });
    }
    Ok(key)
}

fn reject_duplicates<'k>(
    table: &'static str,
    keys: impl IntoIterator<Item = &'k str>,
) -> Result<(), VocabularyError> {
    let mut seen = HashSet::new();
    for key in keys {
        if !seen.insert(key) {
            return Err(VocabularyError::DuplicateKey {
                table,
                key: key.to_string(),
            });
        }
    }
    Ok(())
}

fn normalized_pairs(
    table: &'static str,
    pairs: impl IntoIterator<Item = (String, String)>,
) -> Result<Vec<(String, Category)>, VocabularyError> {
    pairs
        .into_iter()
        .map(|(raw, cat)| Ok((normalized_key(table, &raw, normalize)?, Category::new(cat))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vocab() -> &'static Vocabulary {
        Vocabulary::builtin()
    }

    #[test]
    fn builtin_vocabulary_is_valid() {
        let v = vocab();
        assert!(v.validate().is_ok());
        assert_eq!(v.fallback(), "outros");
        assert!(v.is_member("carnes"));
        assert!(v.is_stopword("kg"));
    }

    #[test]
    fn canon_remaps_legacy_labels() {
        let v = vocab();
        assert_eq!(v.canon_category("acougue"), Category::new("carnes"));
        assert_eq!(v.canon_category("ACOUGUE 1"), Category::new("carnes"));
        assert_eq!(v.canon_category("Açougue  2"), Category::new("carnes"));
        assert_eq!(v.canon_category(" Hortifruti "), Category::new("feira"));
    }

    #[test]
    fn canon_strips_mat_prefix() {
        assert_eq!(vocab().canon_category("MAT LIMPEZA"), Category::new("limpeza"));
        assert_eq!(
            vocab().canon_category("mat higiene pessoal"),
            Category::new("higiene")
        );
    }

    #[test]
    fn canon_keeps_canonical_names() {
        assert_eq!(vocab().canon_category("bebidas"), Category::new("bebidas"));
        assert_eq!(vocab().canon_category("Padaria"), Category::new("padaria"));
    }

    #[test]
    fn canon_sends_placeholders_and_unknowns_to_fallback() {
        let v = vocab();
        for raw in ["x", "A", "em cadastro", "123", "", "categoria inventada"] {
            assert_eq!(v.canon_category(raw), Category::new("outros"), "{raw:?}");
        }
    }

    #[test]
    fn rejects_override_outside_category_set() {
        let json = r#"{
            "categories": ["carnes", "outros"],
            "fallback": "outros",
            "first_token_overrides": [["frango", "aves"]]
        }"#;
        match Vocabulary::from_json_str(json) {
            Err(VocabularyError::UnknownCategory { table, key, category }) => {
                assert_eq!(table, "first_token_overrides");
                assert_eq!(key, "frango");
                assert_eq!(category, "aves");
            }
            other => panic!("expected UnknownCategory, got {other:?}"),
        }
    }

    #[test]
    fn rejects_fallback_outside_category_set() {
        let json = r#"{ "categories": ["carnes"], "fallback": "other" }"#;
        assert!(matches!(
            Vocabulary::from_json_str(json),
            Err(VocabularyError::UnknownFallback(_))
        ));
    }

    #[test]
    fn rejects_stopword_and_multi_token_overrides() {
        let stopword = r#"{
            "categories": ["carnes", "outros"],
            "fallback": "outros",
            "stopwords": ["kg"],
            "first_token_overrides": [["KG", "carnes"]]
        }"#;
        assert!(matches!(
            Vocabulary::from_json_str(stopword),
            Err(VocabularyError::StopwordOverride(t)) if t == "kg"
        ));

        let phrase = r#"{
            "categories": ["carnes", "outros"],
            "fallback": "outros",
            "first_token_overrides": [["carne moida", "carnes"]]
        }"#;
        assert!(matches!(
            Vocabulary::from_json_str(phrase),
            Err(VocabularyError::MultiTokenOverride(_))
        ));
    }

    #[test]
    fn rejects_empty_keys() {
        let json = r#"{
            "categories": ["outros"],
            "fallback": "outros",
            "extra_keywords": [["   ", "outros"]]
        }"#;
        assert!(matches!(
            Vocabulary::from_json_str(json),
            Err(VocabularyError::EmptyKey { table: "extra_keywords", .. })
        ));
    }

    #[test]
    fn keys_are_normalized_on_load() {
        let json = r#"{
            "categories": ["limpeza", "outros"],
            "fallback": "outros",
            "exact_overrides": { "SABÃO  Ypê": "limpeza" }
        }"#;
        let v = Vocabulary::from_json_str(json).unwrap();
        assert_eq!(v.exact_override("sabao ype").unwrap(), "limpeza");
    }

    #[test]
    fn rejects_exact_overrides_that_collide_after_normalization() {
        let json = r#"{
            "categories": ["limpeza", "higiene", "outros"],
            "fallback": "outros",
            "exact_overrides": { "SABÃO YPÊ": "limpeza", "sabao ype": "higiene" }
        }"#;
        match Vocabulary::from_json_str(json) {
            Err(VocabularyError::DuplicateKey { table, key }) => {
                assert_eq!(table, "exact_overrides");
                assert_eq!(key, "sabao ype");
            }
            other => panic!("expected DuplicateKey, got {other:?}"),
        }
    }

    #[test]
    fn rejects_legacy_labels_that_collide_after_cleaning() {
        let json = r#"{
            "categories": ["carnes", "feira", "outros"],
            "fallback": "outros",
            "legacy_remap": { "Açougue 1": "carnes", "mat acougue": "feira" }
        }"#;
        assert!(matches!(
            Vocabulary::from_json_str(json),
            Err(VocabularyError::DuplicateKey { table: "legacy_remap", key }) if key == "acougue"
        ));
    }

    #[test]
    fn rejects_repeated_first_token_overrides() {
        let json = r#"{
            "categories": ["carnes", "frios", "outros"],
            "fallback": "outros",
            "first_token_overrides": [["frango", "carnes"], ["Frango", "frios"]]
        }"#;
        assert!(matches!(
            Vocabulary::from_json_str(json),
            Err(VocabularyError::DuplicateKey { table: "first_token_overrides", key }) if key == "frango"
        ));
    }

    #[test]
    fn rejects_repeated_extra_keywords() {
        let json = r#"{
            "categories": ["bebidas", "outros"],
            "fallback": "outros",
            "extra_keywords": [["refri", "bebidas"], ["REFRI", "outros"]]
        }"#;
        assert!(matches!(
            Vocabulary::from_json_str(json),
            Err(VocabularyError::DuplicateKey { table: "extra_keywords", .. })
        ));
    }

    #[test]
    fn first_token_override_lookup_matches_the_list() {
        let v = vocab();
        for (token, category) in v.first_token_overrides() {
            assert_eq!(v.first_token_override(token), Some(category), "{token}");
        }
        assert_eq!(v.first_token_override("xyz"), None);
    }
}
