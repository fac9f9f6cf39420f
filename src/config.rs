//! Scoring configuration.
//!
//! Stored as a JSON object on disk; every field is optional:
//! ```json
//! {
//!   "top_n": 10,
//!   "model_version": "1.0",
//!   "weights": {
//!     "historical_performance": 0.4,
//!     "reliability": 0.3,
//!     "cost_competitiveness": 0.2,
//!     "experience": 0.1
//!   }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RaterError, Result};
use crate::scoring::{Scorer, ScoringWeights};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RaterConfig {
    pub weights: ScoringWeights,
    /// Carriers kept per lane
    pub top_n: usize,
    pub model_version: String,
}

impl Default for RaterConfig {
    fn default() -> Self {
        Self {
            weights: ScoringWeights::default(),
            top_n: 10,
            model_version: "1.0".to_string(),
        }
    }
}

impl RaterConfig {
    /// Loads and validates the config from a JSON file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| RaterError::io(path, e))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.weights.validate() {
            return Err(RaterError::Config(format!(
                "scoring weights must be non-negative and sum to 1.0 (got {:.4})",
                self.weights.sum()
            )));
        }
        if self.top_n == 0 {
            return Err(RaterError::Config("top_n must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn scorer(&self) -> Scorer {
        Scorer::new(self.weights, self.top_n)
    }
}
