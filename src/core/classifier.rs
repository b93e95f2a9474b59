// src/core/classifier.rs
use crate::core::normalizer::{first_token, normalize};
use crate::core::types::{Category, Classification, CompiledIndex, MatchStage};
use crate::core::vocabulary::Vocabulary;

/// Runs the lookup cascade over a built index. First match wins:
/// exact override, dictionary, first token, keyword scan, fallback.
pub fn classify_with<'a>(
    vocabulary: &'a Vocabulary,
    index: &'a CompiledIndex,
    raw_description: &str,
) -> Classification<'a> {
    let normalized = normalize(raw_description);
    if normalized.is_empty() {
        return fallback(vocabulary, normalized);
    }

    if let Some(category) = vocabulary.exact_override(&normalized) {
        return matched(category, MatchStage::ExactOverride, normalized.clone(), normalized);
    }

    if let Some(category) = index.dictionary.get(&normalized) {
        return matched(category, MatchStage::Dictionary, normalized.clone(), normalized);
    }

    if let Some((token, category)) = first_token(&normalized)
        .and_then(|token| index.first_tokens.get(token).map(|c| (token.to_string(), c)))
    {
        return matched(category, MatchStage::FirstToken, token, normalized);
    }

    // Rule order is the tie-break; never reorder keyword_rules.
    if let Some(rule) = index
        .keyword_rules
        .iter()
        .find(|rule| normalized.contains(rule.keyword.as_str()))
    {
        return matched(&rule.category, MatchStage::Keyword, rule.keyword.clone(), normalized);
    }

    fallback(vocabulary, normalized)
}

/// What an engine without an index answers: always the fallback.
pub fn fallback(vocabulary: &Vocabulary, normalized: String) -> Classification<'_> {
    Classification {
        category: vocabulary.fallback(),
        stage: MatchStage::Default,
        normalized,
        matched: None,
    }
}

fn matched(
    category: &Category,
    stage: MatchStage,
    evidence: String,
    normalized: String,
) -> Classification<'_> {
    Classification {
        category,
        stage,
        normalized,
        matched: Some(evidence),
    }
}
