// Candidate scoring engine.
// Implements: TF-IDF vectorization, synthetic training, MLP regression, lazy
// per-instance fitting, local surrogate explanations and verdict synthesis.
// Nothing in here touches HTTP; handlers hold the scorer behind a mutex.

pub mod batch;
pub mod explainer;
pub mod handlers;
pub mod regressor;
pub mod scorer;
pub mod stop_words;
pub mod surrogate;
pub mod synthetic;
pub mod vectorizer;
pub mod verdict;

use thiserror::Error;

/// Errors raised by the scoring pipeline.
#[derive(Debug, Error, PartialEq)]
pub enum ScoringError {
    /// A transform or predict was attempted before `fit`.
    #[error("pipeline component used before it was fitted")]
    NotFitted,

    /// The fit corpus produced no usable terms (empty or all stop words).
    #[error("job description yields an empty vocabulary")]
    EmptyVocabulary,

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("numeric failure: {0}")]
    Numeric(String),
}

pub type ScoringResult<T> = Result<T, ScoringError>;

/// Splits text into maximal runs of word characters (alphanumeric or `_`).
///
/// Shared by the vectorizer (which lowercases and filters the result) and the
/// explainer (which keeps case so perturbations map back onto the résumé).
pub(crate) fn word_runs(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_runs_splits_on_punctuation() {
        let words: Vec<&str> = word_runs("Rust, C++ & node.js_dev!").collect();
        assert_eq!(words, vec!["Rust", "C", "node", "js_dev"]);
    }

    #[test]
    fn test_word_runs_empty_text() {
        assert_eq!(word_runs("  -- ").count(), 0);
    }
}
