// src/core/types.rs
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One canonical bucket from the closed category set of a vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Category {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Category {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// An insertion-ordered map from normalized text to a category.
///
/// Re-inserting a key replaces its value but keeps its original position,
/// so iteration always follows the order in which keys were first seen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenMap {
    entries: Vec<(String, Category)>,
    positions: HashMap<String, usize>,
}

impl TokenMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites. Returns the previous category, if any.
    pub fn insert(&mut self, key: String, category: Category) -> Option<Category> {
        if let Some(&pos) = self.positions.get(&key) {
            Some(std::mem::replace(&mut self.entries[pos].1, category))
        } else {
            self.positions.insert(key.clone(), self.entries.len());
            self.entries.push((key, category));
            None
        }
    }

    pub fn get(&self, key: &str) -> Option<&Category> {
        self.positions.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Category)> {
        self.entries.iter().map(|(k, c)| (k.as_str(), c))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A substring rule: if `keyword` occurs in the normalized query, the query
/// belongs to `category`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRule {
    pub keyword: String,
    pub category: Category,
}

/// The three indexes derived from a raw dictionary. Never mutated after build.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompiledIndex {
    /// Full normalized description -> category.
    pub dictionary: TokenMap,
    /// First non-stopword token -> category.
    pub first_tokens: TokenMap,
    /// First-token rules followed by the hand-maintained extras.
    pub keyword_rules: Vec<KeywordRule>,
}

impl CompiledIndex {
    /// Every category the index can hand out, repeats included.
    pub fn categories(&self) -> impl Iterator<Item = &Category> {
        self.dictionary
            .iter()
            .chain(self.first_tokens.iter())
            .map(|(_, c)| c)
            .chain(self.keyword_rules.iter().map(|r| &r.category))
    }
}

/// Which stage of the lookup cascade produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStage {
    ExactOverride,
    Dictionary,
    FirstToken,
    Keyword,
    Default,
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchStage::ExactOverride => "exact-override",
            MatchStage::Dictionary => "dictionary",
            MatchStage::FirstToken => "first-token",
            MatchStage::Keyword => "keyword",
            MatchStage::Default => "default",
        };
        f.write_str(name)
    }
}

/// The outcome of a classification, with the evidence behind it.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification<'a> {
    pub category: &'a Category,
    pub stage: MatchStage,
    pub normalized: String,
    /// The dictionary key, token or keyword that matched, if any.
    pub matched: Option<String>,
}
