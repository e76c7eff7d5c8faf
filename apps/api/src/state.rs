use std::sync::{Arc, Mutex};

use crate::config::Config;
use crate::scoring::scorer::Scorer;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// One scorer per process. The lock spans each fit-then-predict sequence.
    pub scorer: Arc<Mutex<Scorer>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let scorer = Scorer::new(config.scorer.clone());
        Self {
            config,
            scorer: Arc::new(Mutex::new(scorer)),
        }
    }
}
