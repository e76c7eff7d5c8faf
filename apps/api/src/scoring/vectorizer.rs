//! TF-IDF vectorizer — learns a vocabulary once and projects any text onto it.
//!
//! Tokens are lowercased runs of word characters, at least two characters long,
//! with English stop words removed. IDF is smoothed (`ln((1+n)/(1+df)) + 1`)
//! and every row is L2-normalised. Terms outside the vocabulary are dropped.

use std::collections::{BTreeMap, HashMap, HashSet};

use ndarray::Array2;

use crate::scoring::stop_words::is_stop_word;
use crate::scoring::{word_runs, ScoringError, ScoringResult};

/// Sparse document vector: `(feature index, weight)` pairs sorted by index.
pub type SparseVector = Vec<(usize, f64)>;

/// Term → feature index mapping plus the IDF weight of each feature.
/// Immutable once built.
#[derive(Debug, Clone)]
pub struct Vocabulary {
    index: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl Vocabulary {
    pub fn len(&self) -> usize {
        self.idf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.idf.is_empty()
    }

    pub fn get(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    pub fn idf(&self, idx: usize) -> f64 {
        self.idf[idx]
    }
}

#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    sublinear_tf: bool,
    vocabulary: Option<Vocabulary>,
}

impl Default for TfidfVectorizer {
    fn default() -> Self {
        Self::new(false)
    }
}

impl TfidfVectorizer {
    pub fn new(sublinear_tf: bool) -> Self {
        Self {
            sublinear_tf,
            vocabulary: None,
        }
    }

    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.vocabulary.as_ref()
    }

    /// Builds the vocabulary and IDF table from `corpus`.
    /// Fails with `EmptyVocabulary` when no document contributes a usable term.
    pub fn fit<S: AsRef<str>>(&mut self, corpus: &[S]) -> ScoringResult<&Vocabulary> {
        let mut doc_freq: BTreeMap<String, usize> = BTreeMap::new();
        for doc in corpus {
            let unique: HashSet<String> = analyze(doc.as_ref()).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        // BTreeMap iteration gives sorted term order for index assignment.
        let n = corpus.len() as f64;
        let mut index = HashMap::with_capacity(doc_freq.len());
        let mut idf = Vec::with_capacity(doc_freq.len());
        for (i, (term, df)) in doc_freq.into_iter().enumerate() {
            idf.push(((1.0 + n) / (1.0 + df as f64)).ln() + 1.0);
            index.insert(term, i);
        }

        let vocab = Vocabulary { index, idf };
        if vocab.is_empty() {
            return Err(ScoringError::EmptyVocabulary);
        }
        Ok(self.vocabulary.insert(vocab))
    }

    pub fn transform<S: AsRef<str>>(&self, texts: &[S]) -> ScoringResult<Vec<SparseVector>> {
        let vocab = self.vocabulary.as_ref().ok_or(ScoringError::NotFitted)?;
        Ok(texts
            .iter()
            .map(|t| self.transform_one(vocab, t.as_ref()))
            .collect())
    }

    /// Dense `texts × vocabulary` matrix of the same rows as `transform`.
    pub fn transform_matrix<S: AsRef<str>>(&self, texts: &[S]) -> ScoringResult<Array2<f64>> {
        let dims = self.vocabulary().map_or(0, Vocabulary::len);
        Ok(to_matrix(&self.transform(texts)?, dims))
    }

    fn transform_one(&self, vocab: &Vocabulary, text: &str) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for term in analyze(text) {
            if let Some(idx) = vocab.get(&term) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let mut row: SparseVector = counts
            .into_iter()
            .map(|(idx, tf)| {
                let tf = if self.sublinear_tf { 1.0 + tf.ln() } else { tf };
                (idx, tf * vocab.idf(idx))
            })
            .collect();

        let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut row {
                *w /= norm;
            }
        }
        row
    }
}

/// Lowercased, length ≥ 2, stop-word-free terms of `text`.
fn analyze(text: &str) -> impl Iterator<Item = String> + '_ {
    word_runs(text)
        .map(str::to_lowercase)
        .filter(|t| t.chars().count() >= 2 && !is_stop_word(t))
}

/// Stacks sparse rows into a dense matrix with `dims` columns.
pub fn to_matrix(rows: &[SparseVector], dims: usize) -> Array2<f64> {
    let mut dense = Array2::zeros((rows.len(), dims));
    for (r, row) in rows.iter().enumerate() {
        for &(idx, w) in row {
            dense[[r, idx]] = w;
        }
    }
    dense
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitted(corpus: &[&str]) -> TfidfVectorizer {
        let mut v = TfidfVectorizer::default();
        v.fit(corpus).unwrap();
        v
    }

    #[test]
    fn test_transform_before_fit_is_not_fitted() {
        let v = TfidfVectorizer::default();
        assert_eq!(v.transform(&["rust"]).unwrap_err(), ScoringError::NotFitted);
    }

    #[test]
    fn test_stop_words_and_single_chars_excluded() {
        let v = fitted(&["The engineer and a C developer"]);
        let vocab = v.vocabulary().unwrap();
        assert_eq!(vocab.len(), 2);
        assert!(vocab.get("engineer").is_some());
        assert!(vocab.get("developer").is_some());
        assert!(vocab.get("the").is_none());
        assert!(vocab.get("c").is_none());
    }

    #[test]
    fn test_indices_follow_sorted_terms() {
        let v = fitted(&["zeta alpha mid"]);
        let vocab = v.vocabulary().unwrap();
        assert_eq!(vocab.get("alpha"), Some(0));
        assert_eq!(vocab.get("mid"), Some(1));
        assert_eq!(vocab.get("zeta"), Some(2));
    }

    #[test]
    fn test_empty_corpus_is_empty_vocabulary() {
        let mut v = TfidfVectorizer::default();
        assert_eq!(
            v.fit(&["", "the and of"]).unwrap_err(),
            ScoringError::EmptyVocabulary
        );
        assert!(v.vocabulary().is_none());
    }

    #[test]
    fn test_unknown_terms_contribute_nothing() {
        let v = fitted(&["python react", "cooking chef"]);
        let rows = v.transform(&["golang haskell", "Python golang"]).unwrap();
        assert!(rows[0].is_empty());
        assert_eq!(rows[1].len(), 1);
        assert!((rows[1][0].1 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rows_are_unit_norm() {
        let v = fitted(&["python react python", "react java"]);
        let rows = v.transform(&["python python react java"]).unwrap();
        let norm: f64 = rows[0].iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9, "norm was {norm}");
    }

    #[test]
    fn test_rarer_terms_weigh_more() {
        // "react" appears in both docs, "python" in one → python has higher idf.
        let v = fitted(&["python react", "react java"]);
        let vocab = v.vocabulary().unwrap();
        let python = vocab.idf(vocab.get("python").unwrap());
        let react = vocab.idf(vocab.get("react").unwrap());
        assert!(python > react);
        // smoothed idf of a term present in every document is exactly 1
        assert!((react - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_sublinear_tf_dampens_repeats() {
        let mut plain = TfidfVectorizer::new(false);
        let mut sub = TfidfVectorizer::new(true);
        plain.fit(&["python react"]).unwrap();
        sub.fit(&["python react"]).unwrap();
        let text = ["python python python python react"];
        let p = plain.transform(&text).unwrap();
        let s = sub.transform(&text).unwrap();
        // python is index 0 in both; sublinear weight is smaller
        assert!(s[0][0].1 < p[0][0].1);
    }

    #[test]
    fn test_to_matrix_places_weights() {
        let dense = to_matrix(&[vec![(1, 0.5), (3, 0.25)], vec![]], 4);
        assert_eq!(
            dense,
            ndarray::array![[0.0, 0.5, 0.0, 0.25], [0.0, 0.0, 0.0, 0.0]]
        );
    }

    #[test]
    fn test_transform_matrix_matches_vocabulary_width() {
        let v = fitted(&["python react", "cooking chef"]);
        let x = v.transform_matrix(&["react react", "golang"]).unwrap();
        assert_eq!(x.dim(), (2, 4));
        assert_eq!(x[[0, v.vocabulary().unwrap().get("react").unwrap()]], 1.0);
        assert_eq!(x.row(1).sum(), 0.0);
        assert_eq!(
            TfidfVectorizer::default().transform_matrix(&["x"]).unwrap_err(),
            ScoringError::NotFitted
        );
    }
}
