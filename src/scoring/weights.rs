use serde::{Deserialize, Serialize};

/// Weights of the four match-score factors. They must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// The carrier's own record on the lane being scored
    pub historical_performance: f64,
    /// On-time share and rating across all lanes
    pub reliability: f64,
    /// Closeness of the carrier's rate to the lane's mean rate
    pub cost_competitiveness: f64,
    /// Shipment volume, saturating at 100
    pub experience: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            historical_performance: 0.4,
            reliability: 0.3,
            cost_competitiveness: 0.2,
            experience: 0.1,
        }
    }
}

impl ScoringWeights {
    pub fn as_array(&self) -> [f64; 4] {
        [
            self.historical_performance,
            self.reliability,
            self.cost_competitiveness,
            self.experience,
        ]
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    /// True when every weight is non-negative and they sum to ~1.0.
    pub fn validate(&self) -> bool {
        self.as_array().iter().all(|w| *w >= 0.0) && (self.sum() - 1.0).abs() < 1e-6
    }
}
