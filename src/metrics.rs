//! Summary statistics over a recommendation run.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::profiles::types::{CarrierLaneHistory, LaneKey};
use crate::profiles::utility::round_to;
use crate::scoring::types::Recommendation;
use crate::scoring::weights::ScoringWeights;

/// Written as `model_metrics.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetrics {
    pub model_version: String,
    pub training_date: DateTime<Utc>,
    pub total_recommendations: usize,
    pub unique_lanes: usize,
    pub unique_carriers: usize,
    /// `None` when there are no recommendations.
    pub avg_match_score: Option<f64>,
    pub recommendations_with_history: usize,
    /// `None` when there are no recommendations.
    pub history_coverage_percentage: Option<f64>,
    pub scoring_weights: ScoringWeights,
}

/// Summarizes `recommendations`. A recommendation counts as having history
/// when its exact (carrier, lane) pair is present in `history`.
#[tracing::instrument(skip_all, fields(recommendations = recommendations.len()))]
pub fn model_metrics(
    recommendations: &[Recommendation],
    history: &[CarrierLaneHistory],
    weights: &ScoringWeights,
    model_version: &str,
) -> ModelMetrics {
    let known: HashSet<(&str, LaneKey)> = history
        .iter()
        .map(|h| (h.carrier_id.as_str(), h.lane_key()))
        .collect();

    let total = recommendations.len();
    let unique_lanes = recommendations
        .iter()
        .map(Recommendation::lane_key)
        .collect::<HashSet<_>>()
        .len();
    let unique_carriers = recommendations
        .iter()
        .map(|r| r.carrier_id.as_str())
        .collect::<HashSet<_>>()
        .len();
    let with_history = recommendations
        .iter()
        .filter(|r| known.contains(&(r.carrier_id.as_str(), r.lane_key())))
        .count();

    let (avg_match_score, history_coverage_percentage) = if total == 0 {
        (None, None)
    } else {
        let sum: f64 = recommendations.iter().map(|r| r.match_score).sum();
        (
            Some(round_to(sum / total as f64, 2)),
            Some(round_to(with_history as f64 / total as f64 * 100.0, 2)),
        )
    };

    let metrics = ModelMetrics {
        model_version: model_version.to_string(),
        training_date: Utc::now(),
        total_recommendations: total,
        unique_lanes,
        unique_carriers,
        avg_match_score,
        recommendations_with_history: with_history,
        history_coverage_percentage,
        scoring_weights: *weights,
    };

    info!(
        avg_match_score = ?metrics.avg_match_score,
        history_coverage = ?metrics.history_coverage_percentage,
        "Model metrics computed"
    );

    metrics
}
