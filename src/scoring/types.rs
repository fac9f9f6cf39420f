//! Data types produced by the scoring stage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::profiles::LaneKey;
use crate::profiles::utility::round_to;

/// Factor sub-scores for one (lane, carrier) pairing.
///
/// Raw values are fractions of 1; recommendations carry them as
/// percentages rounded to two decimals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreFactors {
    pub historical_performance: f64,
    pub reliability: f64,
    pub cost_competitiveness: f64,
    pub experience: f64,
}

impl ScoreFactors {
    pub fn as_percentages(&self) -> Self {
        Self {
            historical_performance: round_to(self.historical_performance * 100.0, 2),
            reliability: round_to(self.reliability * 100.0, 2),
            cost_competitiveness: round_to(self.cost_competitiveness * 100.0, 2),
            experience: round_to(self.experience * 100.0, 2),
        }
    }
}

/// One scored carrier for one lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub lane_id: String,
    pub origin_city: String,
    pub destination_city: String,
    pub carrier_id: String,
    pub carrier_name: Option<String>,
    pub match_score: f64,
    pub estimated_rate: f64,
    /// Carrier rate times the lane's mean distance
    pub estimated_cost: Option<f64>,
    pub estimated_delivery_hours: Option<f64>,
    pub carrier_rating: f64,
    pub on_time_percentage: f64,
    pub has_lane_history: bool,
    pub score_factors: ScoreFactors,
}

impl Recommendation {
    pub fn lane_key(&self) -> LaneKey {
        LaneKey::new(&self.origin_city, &self.destination_city)
    }
}

/// Flat form of [`Recommendation`] for CSV export.
#[derive(Debug, Serialize)]
pub struct RecommendationRow<'a> {
    pub lane_id: &'a str,
    pub origin_city: &'a str,
    pub destination_city: &'a str,
    pub carrier_id: &'a str,
    pub carrier_name: Option<&'a str>,
    pub match_score: f64,
    pub estimated_rate: f64,
    pub estimated_cost: Option<f64>,
    pub estimated_delivery_hours: Option<f64>,
    pub carrier_rating: f64,
    pub on_time_percentage: f64,
    pub has_lane_history: bool,
    pub historical_performance: f64,
    pub reliability: f64,
    pub cost_competitiveness: f64,
    pub experience: f64,
}

impl<'a> From<&'a Recommendation> for RecommendationRow<'a> {
    fn from(rec: &'a Recommendation) -> Self {
        Self {
            lane_id: &rec.lane_id,
            origin_city: &rec.origin_city,
            destination_city: &rec.destination_city,
            carrier_id: &rec.carrier_id,
            carrier_name: rec.carrier_name.as_deref(),
            match_score: rec.match_score,
            estimated_rate: rec.estimated_rate,
            estimated_cost: rec.estimated_cost,
            estimated_delivery_hours: rec.estimated_delivery_hours,
            carrier_rating: rec.carrier_rating,
            on_time_percentage: rec.on_time_percentage,
            has_lane_history: rec.has_lane_history,
            historical_performance: rec.score_factors.historical_performance,
            reliability: rec.score_factors.reliability,
            cost_competitiveness: rec.score_factors.cost_competitiveness,
            experience: rec.score_factors.experience,
        }
    }
}

/// Why a lane or a single pairing could not be scored.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreFault {
    /// The cost and history ratios divide by the lane's mean rate.
    #[error("lane {lane} has non-positive mean rate per mile ({rate})")]
    InvalidLaneRate { lane: String, rate: f64 },

    #[error("missing value: {field}")]
    MissingValue { field: &'static str },
}

/// Counts for one scoring run.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub lanes_scored: usize,
    pub lanes_skipped: usize,
    pub pairings_scored: usize,
    pub pairings_excluded: usize,
    pub recommendations: usize,
}
