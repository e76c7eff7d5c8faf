//! Synthetic trainer — manufactures a weakly-labelled training set from a
//! single job description.
//!
//! - the job description itself, labelled U[0.8, 1.0]
//! - `noisy_samples` bags of JD tokens sampled with replacement (80% of the
//!   token count), each labelled U[0.8, 1.0]
//! - a fixed set of off-domain documents, each labelled U[0.0, 0.2]

use ndarray::Array1;
use rand::Rng;
use serde::Serialize;

/// Hand-authored documents from unrelated occupations.
pub const IRRELEVANT_DOCUMENTS: &[&str] = &[
    "cooking chef food kitchen restaurant",
    "driver truck logistics transport",
    "medical nurse hospital doctor patient",
    "sales marketing business money profit",
    "sports football cricket player athlete",
];

const RELEVANT_LABELS: (f64, f64) = (0.8, 1.0);
const IRRELEVANT_LABELS: (f64, f64) = (0.0, 0.2);

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainingExample {
    pub text: String,
    pub target: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TrainingSet {
    pub examples: Vec<TrainingExample>,
}

impl TrainingSet {
    pub fn texts(&self) -> Vec<&str> {
        self.examples.iter().map(|e| e.text.as_str()).collect()
    }

    pub fn targets(&self) -> Array1<f64> {
        self.examples.iter().map(|e| e.target).collect()
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticTrainer {
    pub noisy_samples: usize,
    pub keep_ratio: f64,
}

impl Default for SyntheticTrainer {
    fn default() -> Self {
        Self {
            noisy_samples: 10,
            keep_ratio: 0.8,
        }
    }
}

impl SyntheticTrainer {
    pub fn new(noisy_samples: usize) -> Self {
        Self {
            noisy_samples,
            ..Self::default()
        }
    }

    pub fn generate<R: Rng + ?Sized>(&self, job_description: &str, rng: &mut R) -> TrainingSet {
        let tokens: Vec<&str> = job_description.split_whitespace().collect();
        let sample_size = (tokens.len() as f64 * self.keep_ratio) as usize;

        let mut relevant = Vec::with_capacity(self.noisy_samples + 1);
        relevant.push(job_description.to_string());
        for _ in 0..self.noisy_samples {
            let doc: Vec<&str> = (0..sample_size)
                .map(|_| tokens[rng.gen_range(0..tokens.len())])
                .collect();
            relevant.push(doc.join(" "));
        }

        // Labels for the relevant block are drawn before the irrelevant block.
        let mut examples: Vec<TrainingExample> = relevant
            .into_iter()
            .map(|text| TrainingExample {
                text,
                target: rng.gen_range(RELEVANT_LABELS.0..=RELEVANT_LABELS.1),
            })
            .collect();
        examples.extend(IRRELEVANT_DOCUMENTS.iter().map(|doc| TrainingExample {
            text: doc.to_string(),
            target: rng.gen_range(IRRELEVANT_LABELS.0..=IRRELEVANT_LABELS.1),
        }));

        TrainingSet { examples }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const JD: &str = "Looking for a Software Engineer with Python React and Machine Learning";

    #[test]
    fn test_training_set_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let set = SyntheticTrainer::default().generate(JD, &mut rng);
        assert_eq!(set.examples.len(), 1 + 10 + IRRELEVANT_DOCUMENTS.len());
        assert_eq!(set.targets().len(), set.examples.len());
        assert_eq!(set.examples[0].text, JD);
    }

    #[test]
    fn test_noisy_examples_sample_jd_tokens() {
        let mut rng = StdRng::seed_from_u64(7);
        let set = SyntheticTrainer::default().generate(JD, &mut rng);
        let jd_tokens: Vec<&str> = JD.split_whitespace().collect();
        let expected_len = (jd_tokens.len() as f64 * 0.8) as usize;
        for example in &set.examples[1..11] {
            let tokens: Vec<&str> = example.text.split_whitespace().collect();
            assert_eq!(tokens.len(), expected_len);
            assert!(tokens.iter().all(|t| jd_tokens.contains(t)));
        }
    }

    #[test]
    fn test_labels_within_bands() {
        let mut rng = StdRng::seed_from_u64(11);
        let set = SyntheticTrainer::new(25).generate(JD, &mut rng);
        let (relevant, irrelevant) = set.examples.split_at(26);
        assert!(relevant.iter().all(|e| (0.8..=1.0).contains(&e.target)));
        assert!(irrelevant.iter().all(|e| (0.0..=0.2).contains(&e.target)));
        assert_eq!(irrelevant.len(), IRRELEVANT_DOCUMENTS.len());
    }

    #[test]
    fn test_same_seed_same_set() {
        let a = SyntheticTrainer::default().generate(JD, &mut StdRng::seed_from_u64(3));
        let b = SyntheticTrainer::default().generate(JD, &mut StdRng::seed_from_u64(3));
        assert_eq!(a.examples, b.examples);
    }

    #[test]
    fn test_empty_jd_yields_empty_noisy_docs() {
        let mut rng = StdRng::seed_from_u64(1);
        let set = SyntheticTrainer::default().generate("", &mut rng);
        assert!(set.examples[..11].iter().all(|e| e.text.is_empty()));
    }
}
