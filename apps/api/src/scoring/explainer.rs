//! Local explainer — attributes a score to individual résumé words by
//! perturbing the text and fitting a proximity-weighted linear surrogate.
//!
//! The fitted pipeline is treated as a black box through `TextPredictor`;
//! nothing here looks at regressor internals.

use std::collections::HashMap;

use ndarray::{Array1, Array2};
use rand::seq::index;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::scoring::scorer::TextPredictor;
use crate::scoring::surrogate::{fit_weighted_ridge, weighted_r2};
use crate::scoring::{word_runs, ScoringResult};

const KERNEL_WIDTH: f64 = 25.0;
const SELECTION_ALPHA: f64 = 0.01;
const SURROGATE_ALPHA: f64 = 1.0;
/// Feature counts at or below this use forward selection.
const FORWARD_SELECTION_MAX: usize = 6;

/// One word and its signed contribution to the score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub term: String,
    pub weight: f64,
}

impl FeatureWeight {
    pub fn new(term: impl Into<String>, weight: f64) -> Self {
        Self {
            term: term.into(),
            weight,
        }
    }
}

/// Surrogate attributions ordered by the surrogate's ranking, plus fit
/// diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub features: Vec<FeatureWeight>,
    pub intercept: f64,
    /// Surrogate prediction for the unperturbed text.
    pub local_prediction: f64,
    /// Weighted R² of the surrogate on the perturbation sample.
    pub fit_score: f64,
}

impl Explanation {
    pub fn from_features(features: Vec<FeatureWeight>) -> Self {
        Self {
            features,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct LocalExplainer {
    pub num_samples: usize,
    pub num_features: usize,
}

impl Default for LocalExplainer {
    fn default() -> Self {
        Self::new(100, 10)
    }
}

impl LocalExplainer {
    pub fn new(num_samples: usize, num_features: usize) -> Self {
        Self {
            num_samples: num_samples.max(1),
            num_features,
        }
    }

    pub fn explain<P, R>(&self, text: &str, predictor: &P, mut rng: R) -> ScoringResult<Explanation>
    where
        P: TextPredictor + ?Sized,
        R: Rng,
    {
        let (words, positions) = distinct_words(text);
        if words.is_empty() || self.num_features == 0 {
            return Ok(Explanation::default());
        }
        let d = words.len();

        let mut masks = vec![vec![true; d]];
        for _ in 1..self.num_samples {
            let inactive_count = rng.gen_range(1..=d);
            let mut mask = vec![true; d];
            for i in index::sample(&mut rng, d, inactive_count).iter() {
                mask[i] = false;
            }
            masks.push(mask);
        }

        let texts: Vec<String> = masks
            .iter()
            .map(|mask| rebuild(text, &positions, mask))
            .collect();
        let labels = Array1::from_vec(predictor.predict_texts(&texts)?);

        let weights: Array1<f64> = masks.iter().map(|m| kernel(m)).collect();
        let data = Array2::from_shape_fn((masks.len(), d), |(row, col)| {
            if masks[row][col] {
                1.0
            } else {
                0.0
            }
        });

        let wanted = self.num_features.min(d);
        let selected = if self.num_features <= FORWARD_SELECTION_MAX {
            forward_selection(&data, &labels, &weights, wanted)?
        } else {
            highest_weights(&data, &labels, &weights, wanted)?
        };

        let fit = fit_weighted_ridge(&data, &labels, &weights, &selected, SURROGATE_ALPHA)?;
        let fit_score = weighted_r2(&fit, &data, &labels, &weights, &selected);
        let local_prediction = fit.intercept + fit.coefficients.sum();

        let mut features: Vec<FeatureWeight> = selected
            .iter()
            .zip(&fit.coefficients)
            .map(|(&col, &coef)| FeatureWeight::new(words[col], coef))
            .collect();
        features.sort_by(|a, b| b.weight.abs().total_cmp(&a.weight.abs()));

        debug!(
            "Explained {d} words with {} samples (R² {fit_score:.4}, local prediction {local_prediction:.4})",
            self.num_samples
        );

        Ok(Explanation {
            features,
            intercept: fit.intercept,
            local_prediction,
            fit_score,
        })
    }
}

/// Distinct words in first-appearance order, and for every word occurrence
/// its index into that list.
fn distinct_words(text: &str) -> (Vec<&str>, Vec<(&str, usize)>) {
    let mut words = Vec::new();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut positions = Vec::new();
    for w in word_runs(text) {
        let idx = *seen.entry(w).or_insert_with(|| {
            words.push(w);
            words.len() - 1
        });
        positions.push((w, idx));
    }
    (words, positions)
}

/// Text with every occurrence of inactive words removed.
fn rebuild(text: &str, positions: &[(&str, usize)], mask: &[bool]) -> String {
    if mask.iter().all(|&on| on) {
        return text.to_string();
    }
    positions
        .iter()
        .filter(|(_, idx)| mask[*idx])
        .map(|(w, _)| *w)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Exponential kernel over the cosine distance (×100) to the all-ones mask.
fn kernel(mask: &[bool]) -> f64 {
    let active = mask.iter().filter(|&&on| on).count() as f64;
    let similarity = if active > 0.0 {
        (active / mask.len() as f64).sqrt()
    } else {
        0.0
    };
    let distance = (1.0 - similarity) * 100.0;
    (-(distance * distance) / (KERNEL_WIDTH * KERNEL_WIDTH)).exp().sqrt()
}

/// Greedily adds the column that most improves weighted R².
fn forward_selection(
    data: &Array2<f64>,
    labels: &Array1<f64>,
    weights: &Array1<f64>,
    wanted: usize,
) -> ScoringResult<Vec<usize>> {
    let d = data.ncols();
    let mut used: Vec<usize> = Vec::with_capacity(wanted);
    for _ in 0..wanted {
        let mut best: Option<(usize, f64)> = None;
        for feature in (0..d).filter(|f| !used.contains(f)) {
            let mut columns = used.clone();
            columns.push(feature);
            let fit = fit_weighted_ridge(data, labels, weights, &columns, SELECTION_ALPHA)?;
            let score = weighted_r2(&fit, data, labels, weights, &columns);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((feature, score));
            }
        }
        match best {
            Some((feature, _)) => used.push(feature),
            None => break,
        }
    }
    Ok(used)
}

/// Columns with the largest |coefficient| in a ridge over all columns.
fn highest_weights(
    data: &Array2<f64>,
    labels: &Array1<f64>,
    weights: &Array1<f64>,
    wanted: usize,
) -> ScoringResult<Vec<usize>> {
    let all: Vec<usize> = (0..data.ncols()).collect();
    let fit = fit_weighted_ridge(data, labels, weights, &all, SELECTION_ALPHA)?;
    let mut ranked: Vec<(usize, f64)> = fit.coefficients.iter().copied().enumerate().collect();
    ranked.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
    Ok(ranked.into_iter().take(wanted).map(|(i, _)| i).collect())
}
