//! Scorer — lazily fits the vectorizer + regressor pipeline and scores résumés.
//!
//! A `Scorer` is `Unfitted` until its first `score`/`explain`/`ensure_fitted`
//! call, then `Fitted` for the rest of its life. The job description passed
//! on later calls is ignored: every score is computed against the vocabulary
//! and network fit from the FIRST job description. Use a fresh `Scorer` to
//! score against a different job description.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use crate::scoring::explainer::{Explanation, LocalExplainer};
use crate::scoring::regressor::{RegressorConfig, RelevanceRegressor};
use crate::scoring::synthetic::SyntheticTrainer;
use crate::scoring::vectorizer::{TfidfVectorizer, Vocabulary};
use crate::scoring::{ScoringError, ScoringResult};

/// Black-box capability shared by the fitted pipeline and anything the
/// explainer should query: "given texts, return one score per text".
pub trait TextPredictor {
    fn predict_texts(&self, texts: &[String]) -> ScoringResult<Vec<f64>>;
}

#[derive(Debug, Clone)]
pub struct ScorerConfig {
    /// Seeds synthetic-data and perturbation sampling. `None` draws from entropy.
    pub seed: Option<u64>,
    pub noisy_samples: usize,
    pub sublinear_tf: bool,
    pub regressor: RegressorConfig,
    pub explain_num_samples: usize,
    pub explain_num_features: usize,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            seed: None,
            noisy_samples: 10,
            sublinear_tf: false,
            regressor: RegressorConfig::default(),
            explain_num_samples: 100,
            explain_num_features: 10,
        }
    }
}

/// Counts pipeline fits. Clones share the same count.
#[derive(Debug, Clone, Default)]
pub struct FitCounter(Arc<AtomicUsize>);

impl FitCounter {
    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fitted vocabulary + regressor. Its input dimensionality never changes.
#[derive(Debug, Clone)]
pub struct PipelineState {
    vectorizer: TfidfVectorizer,
    regressor: RelevanceRegressor,
}

impl PipelineState {
    /// Generates synthetic training data from `jd_text` and fits both stages.
    pub fn fit(jd_text: &str, config: &ScorerConfig) -> ScoringResult<Self> {
        // The JD itself must contribute terms; the fixed irrelevant documents
        // would otherwise mask an empty or all-stop-word JD.
        TfidfVectorizer::default().fit(&[jd_text])?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let training = SyntheticTrainer::new(config.noisy_samples).generate(jd_text, &mut rng);
        let texts = training.texts();

        let mut vectorizer = TfidfVectorizer::new(config.sublinear_tf);
        let dims = vectorizer.fit(&texts)?.len();
        let x = vectorizer.transform_matrix(&texts)?;

        let mut regressor = RelevanceRegressor::new(config.regressor.clone());
        regressor.fit(&x, &training.targets())?;

        info!(
            "Fitted relevance pipeline: vocabulary={dims}, examples={}, epochs={}, loss={:.6}",
            training.examples.len(),
            regressor.epochs_run(),
            regressor.final_loss()
        );

        Ok(Self {
            vectorizer,
            regressor,
        })
    }

    pub fn vocabulary(&self) -> Option<&Vocabulary> {
        self.vectorizer.vocabulary()
    }

    /// Raw regressor output for each text, unclipped.
    pub fn predict(&self, texts: &[String]) -> ScoringResult<Vec<f64>> {
        let x = self.vectorizer.transform_matrix(texts)?;
        let preds = self.regressor.predict(&x)?;
        if let Some(bad) = preds.iter().find(|p| !p.is_finite()) {
            return Err(ScoringError::Numeric(format!("non-finite prediction {bad}")));
        }
        Ok(preds.to_vec())
    }

    /// Clips to [0, 1], scales to 0–100 and rounds to two decimals.
    pub fn score(&self, resume_text: &str) -> ScoringResult<f64> {
        let raw = self.predict(&[resume_text.to_string()])?[0];
        Ok(to_percent(raw))
    }
}

impl TextPredictor for PipelineState {
    fn predict_texts(&self, texts: &[String]) -> ScoringResult<Vec<f64>> {
        self.predict(texts)
    }
}

pub fn to_percent(raw: f64) -> f64 {
    (raw.clamp(0.0, 1.0) * 100.0 * 100.0).round() / 100.0
}

#[derive(Debug)]
pub struct Scorer {
    config: ScorerConfig,
    state: Option<PipelineState>,
    fits: FitCounter,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(ScorerConfig::default())
    }
}

impl Scorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self::with_fit_counter(config, FitCounter::default())
    }

    pub fn with_fit_counter(config: ScorerConfig, fits: FitCounter) -> Self {
        Self {
            config,
            state: None,
            fits,
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.state.is_some()
    }

    pub fn fit_count(&self) -> usize {
        self.fits.get()
    }

    pub fn vocabulary_size(&self) -> Option<usize> {
        self.state
            .as_ref()
            .and_then(PipelineState::vocabulary)
            .map(Vocabulary::len)
    }

    /// Returns the fitted pipeline, fitting it on `jd_text` if this is the
    /// first call. A failed fit leaves the scorer unfitted.
    pub fn ensure_fitted(&mut self, jd_text: &str) -> ScoringResult<&PipelineState> {
        if self.state.is_none() {
            info!("Scorer unfitted; fitting pipeline on job description");
            let state = PipelineState::fit(jd_text, &self.config)?;
            self.fits.increment();
            self.state = Some(state);
        }
        self.state.as_ref().ok_or(ScoringError::NotFitted)
    }

    pub fn score(&mut self, resume_text: &str, jd_text: &str) -> ScoringResult<f64> {
        self.ensure_fitted(jd_text)?.score(resume_text)
    }

    pub fn explain(&mut self, resume_text: &str, jd_text: &str) -> ScoringResult<Explanation> {
        let explainer = LocalExplainer::new(
            self.config.explain_num_samples,
            self.config.explain_num_features,
        );
        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(1)),
            None => StdRng::from_entropy(),
        };
        let state = self.ensure_fitted(jd_text)?;
        explainer.explain(resume_text, state, rng)
    }
}
