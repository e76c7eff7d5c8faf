use std::str::FromStr;

use anyhow::{Context, Result};

use crate::scoring::regressor::RegressorConfig;
use crate::scoring::scorer::ScorerConfig;

/// Application configuration loaded from environment variables.
/// Every variable has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub scorer: ScorerConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = ScorerConfig::default();
        let regressor_defaults = RegressorConfig::default();

        let seed = match lookup("SCORER_SEED") {
            Some(raw) => Some(parse("SCORER_SEED", &raw)?),
            None => None,
        };

        Ok(Config {
            port: parse_or(&lookup, "PORT", 8000)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            scorer: ScorerConfig {
                seed,
                noisy_samples: parse_or(&lookup, "SYNTHETIC_NOISY_SAMPLES", defaults.noisy_samples)?,
                regressor: RegressorConfig {
                    seed: parse_or(&lookup, "REGRESSOR_SEED", regressor_defaults.seed)?,
                    max_iter: parse_or(&lookup, "REGRESSOR_MAX_ITER", regressor_defaults.max_iter)?,
                    ..regressor_defaults
                },
                explain_num_samples: parse_or(
                    &lookup,
                    "EXPLAIN_NUM_SAMPLES",
                    defaults.explain_num_samples,
                )?,
                explain_num_features: parse_or(
                    &lookup,
                    "EXPLAIN_NUM_FEATURES",
                    defaults.explain_num_features,
                )?,
                ..defaults
            },
        })
    }
}

fn parse<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("{key} must be a valid number, got '{raw}'"))
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => parse(key, &raw),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8000);
        assert_eq!(config.rust_log, "info");
        assert_eq!(config.scorer.seed, None);
        assert_eq!(config.scorer.noisy_samples, 10);
        assert_eq!(config.scorer.explain_num_samples, 100);
        assert_eq!(config.scorer.explain_num_features, 10);
        assert_eq!(config.scorer.regressor.seed, 42);
        assert_eq!(config.scorer.regressor.max_iter, 500);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("PORT", "9001"),
            ("SCORER_SEED", "7"),
            ("EXPLAIN_NUM_FEATURES", "5"),
            ("REGRESSOR_MAX_ITER", "50"),
        ])
        .unwrap();
        assert_eq!(config.port, 9001);
        assert_eq!(config.scorer.seed, Some(7));
        assert_eq!(config.scorer.explain_num_features, 5);
        assert_eq!(config.scorer.regressor.max_iter, 50);
        assert_eq!(config.scorer.regressor.hidden_layers, vec![50, 25]);
    }

    #[test]
    fn test_invalid_number_fails() {
        let err = config_from(&[("EXPLAIN_NUM_SAMPLES", "lots")]).unwrap_err();
        assert!(err.to_string().contains("EXPLAIN_NUM_SAMPLES"));
    }
}
