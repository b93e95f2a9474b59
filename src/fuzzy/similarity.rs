// File: src/fuzzy/similarity.rs
use crate::core::engine::CategoryEngine;
use crate::core::normalizer::normalize;
use crate::core::types::Category;
use std::cmp::Ordering;
use std::collections::HashMap;

/// A string similarity score in `[0, 1]`, higher is closer.
///
/// Catalog suggestions only need this seam; any scorer can be plugged in.
pub trait Similarity {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

impl<F> Similarity for F
where
    F: Fn(&str, &str) -> f64,
{
    fn similarity(&self, a: &str, b: &str) -> f64 {
        self(a, b)
    }
}

/// Sørensen–Dice coefficient over character bigrams of normalized text.
#[derive(Debug, Clone, Copy, Default)]
pub struct BigramDice;

impl Similarity for BigramDice {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let a = normalize(a);
        let b = normalize(b);
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        if a == b {
            return 1.0;
        }

        let left = bigrams(&a);
        let right = bigrams(&b);
        let total: usize = left.values().sum::<usize>() + right.values().sum::<usize>();
        if total == 0 {
            return 0.0;
        }
        let shared: usize = left
            .iter()
            .map(|(pair, &n)| n.min(right.get(pair).copied().unwrap_or(0)))
            .sum();
        (2 * shared) as f64 / total as f64
    }
}

fn bigrams(s: &str) -> HashMap<(char, char), usize> {
    let chars: Vec<char> = s.chars().collect();
    let mut counts = HashMap::new();
    for pair in chars.windows(2) {
        *counts.entry((pair[0], pair[1])).or_insert(0) += 1;
    }
    counts
}

/// A known catalog description close to what the user typed.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    pub description: String,
    pub category: Category,
    pub score: f64,
}

/// Ranks the engine's known descriptions against `query`.
///
/// Highest score first, ties broken by description. Zero scores are dropped.
pub fn suggest(
    engine: &CategoryEngine,
    query: &str,
    limit: usize,
    scorer: &dyn Similarity,
) -> Vec<Suggestion> {
    let Some(index) = engine.index() else {
        return vec![];
    };
    if limit == 0 || normalize(query).is_empty() {
        return vec![];
    }

    let mut scored: Vec<Suggestion> = index
        .dictionary
        .iter()
        .filter_map(|(description, category)| {
            let score = scorer.similarity(query, description);
            (score > 0.0).then(|| Suggestion {
                description: description.to_string(),
                category: category.clone(),
                score,
            })
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.description.cmp(&b.description))
    });
    scored.truncate(limit);
    scored
}
