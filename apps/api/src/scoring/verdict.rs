//! Verdict synthesis — deterministic narrative from a score and its explanation.
//!
//! Pure and total: no I/O, no randomness, never fails.

use serde::{Deserialize, Serialize};

use crate::scoring::explainer::{Explanation, FeatureWeight};

const TOP_DRIVERS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sentiment {
    #[serde(rename = "Highly Recommended")]
    HighlyRecommended,
    #[serde(rename = "Potential Fit")]
    PotentialFit,
    #[serde(rename = "Not Suitable")]
    NotSuitable,
}

impl Sentiment {
    /// `≥ 80` highly recommended, `≥ 60` potential fit, otherwise not suitable.
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Sentiment::HighlyRecommended
        } else if score >= 60.0 {
            Sentiment::PotentialFit
        } else {
            Sentiment::NotSuitable
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Sentiment::HighlyRecommended => "Highly Recommended",
            Sentiment::PotentialFit => "Potential Fit",
            Sentiment::NotSuitable => "Not Suitable",
        }
    }

    fn intro(&self) -> &'static str {
        match self {
            Sentiment::HighlyRecommended => "This candidate is an exceptional match for the role.",
            Sentiment::PotentialFit => "This candidate shows promise but has some alignment gaps.",
            Sentiment::NotSuitable => {
                "This candidate does not appear to be a strong match for the current requirements."
            }
        }
    }

    fn gap_connective(&self) -> Option<&'static str> {
        match self {
            Sentiment::HighlyRecommended => Some("However,"),
            Sentiment::PotentialFit => Some("Specifically,"),
            Sentiment::NotSuitable => None,
        }
    }

    fn closing(&self) -> Option<&'static str> {
        match self {
            Sentiment::HighlyRecommended => {
                Some("They are likely a worthy candidate for an interview.")
            }
            Sentiment::PotentialFit => None,
            Sentiment::NotSuitable => {
                Some("They may not have the specific technical depth required.")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub title: Sentiment,
    pub text: String,
}

pub fn synthesize(score: f64, explanation: &Explanation) -> Verdict {
    let sentiment = Sentiment::from_score(score);

    let mut drivers: Vec<&FeatureWeight> = explanation.features.iter().collect();
    drivers.sort_by(|a, b| b.weight.abs().total_cmp(&a.weight.abs()));
    drivers.truncate(TOP_DRIVERS);

    let positives: Vec<&str> = drivers
        .iter()
        .filter(|f| f.weight > 0.0)
        .map(|f| f.term.as_str())
        .collect();
    let negatives: Vec<&str> = drivers
        .iter()
        .filter(|f| f.weight < 0.0)
        .map(|f| f.term.as_str())
        .collect();

    let mut parts: Vec<String> = vec![sentiment.intro().to_string()];

    match positives.as_slice() {
        [] => {}
        [only] => parts.push(format!(
            "Their suitability is primarily driven by their experience with **{only}**."
        )),
        many => parts.push(format!(
            "Key strengths include strong alignment with {}.",
            emphasised_list(many)
        )),
    }

    if !negatives.is_empty() {
        if let Some(connective) = sentiment.gap_connective() {
            parts.push(connective.to_string());
        }
        match negatives.as_slice() {
            [only] => parts.push(format!(
                "the model successfully identified a gap or lower relevance regarding **{only}**."
            )),
            many => parts.push(format!(
                "Missing or less relevant terms include {}, which negatively impacted the score.",
                emphasised_list(many)
            )),
        }
    }

    if let Some(closing) = sentiment.closing() {
        parts.push(closing.to_string());
    }

    Verdict {
        title: sentiment,
        text: parts.join(" "),
    }
}

/// `**a**, **b**, and **c**` — the final item always follows ", and".
fn emphasised_list(terms: &[&str]) -> String {
    let (last, head) = match terms.split_last() {
        Some(split) => split,
        None => return String::new(),
    };
    let head: Vec<String> = head.iter().map(|t| format!("**{t}**")).collect();
    format!("{}, and **{last}**", head.join(", "))
}
