//! Batch analysis of several candidates against one job description.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::scoring::explainer::Explanation;
use crate::scoring::scorer::Scorer;
use crate::scoring::verdict::{synthesize, Verdict};
use crate::scoring::ScoringResult;

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub resume_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CandidateAnalysis {
    pub name: String,
    pub score: f64,
    pub explanation: Explanation,
    pub verdict: Verdict,
}

/// Scores, explains and summarises each candidate in input order.
/// The first candidate triggers the fit; the rest reuse it.
pub fn analyze_batch(
    scorer: &mut Scorer,
    candidates: &[Candidate],
    jd_text: &str,
) -> ScoringResult<Vec<CandidateAnalysis>> {
    info!("Analyzing batch of {} candidates", candidates.len());
    candidates
        .iter()
        .map(|candidate| {
            let score = scorer.score(&candidate.resume_text, jd_text)?;
            let explanation = scorer.explain(&candidate.resume_text, jd_text)?;
            let verdict = synthesize(score, &explanation);
            Ok(CandidateAnalysis {
                name: candidate.name.clone(),
                score,
                explanation,
                verdict,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::scorer::tests::{seeded_config, JD};
    use crate::scoring::scorer::FitCounter;
    use crate::scoring::verdict::Sentiment;

    fn candidates() -> Vec<Candidate> {
        [
            ("Ada", "Python and machine learning engineer using FastAPI"),
            ("Grace", "React and JavaScript frontend developer"),
            ("Chef", "cooking chef food kitchen restaurant"),
        ]
        .into_iter()
        .map(|(name, resume)| Candidate {
            name: name.to_string(),
            resume_text: resume.to_string(),
        })
        .collect()
    }

    #[test]
    fn test_batch_fits_once() {
        let counter = FitCounter::default();
        let mut scorer = Scorer::with_fit_counter(seeded_config(), counter.clone());
        let results = analyze_batch(&mut scorer, &candidates(), JD).unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(counter.get(), 1);
    }

    #[test]
    fn test_batch_preserves_order_and_consistency() {
        let mut scorer = Scorer::new(seeded_config());
        let results = analyze_batch(&mut scorer, &candidates(), JD).unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Ada", "Grace", "Chef"]);
        for r in &results {
            assert!((0.0..=100.0).contains(&r.score));
            assert_eq!(r.verdict.title, Sentiment::from_score(r.score));
            assert!(r.explanation.features.len() <= 10);
        }
    }

    #[test]
    fn test_empty_batch_does_not_fit() {
        let mut scorer = Scorer::new(seeded_config());
        let results = analyze_batch(&mut scorer, &[], JD).unwrap();
        assert!(results.is_empty());
        assert!(!scorer.is_fitted());
    }

    #[test]
    fn test_batch_surfaces_fit_failure() {
        let mut scorer = Scorer::new(seeded_config());
        assert!(analyze_batch(&mut scorer, &candidates(), "").is_err());
    }
}
