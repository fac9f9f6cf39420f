//! Data types produced by the aggregation stage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directed origin/destination city pair identifying a lane.
///
/// Compared field by field, so city names containing `_` never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LaneKey {
    pub origin_city: String,
    pub destination_city: String,
}

impl LaneKey {
    pub fn new(origin_city: &str, destination_city: &str) -> Self {
        Self {
            origin_city: origin_city.to_string(),
            destination_city: destination_city.to_string(),
        }
    }

    /// Flat identifier written to output tables, `origin_destination`.
    ///
    /// `_` and `\` inside a city name are escaped with `\`, so distinct
    /// keys always produce distinct ids.
    pub fn lane_id(&self) -> String {
        format!(
            "{}_{}",
            escape_city(&self.origin_city),
            escape_city(&self.destination_city)
        )
    }
}

fn escape_city(city: &str) -> String {
    let mut out = String::with_capacity(city.len());
    for c in city.chars() {
        if c == '_' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

impl fmt::Display for LaneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.origin_city, self.destination_city)
    }
}

/// Aggregate statistics for one lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneProfile {
    pub lane_id: String,
    pub origin_city: String,
    pub destination_city: String,
    pub origin_state: Option<String>,
    pub destination_state: Option<String>,
    pub distance_miles: Option<f64>,
    pub weight_lbs: Option<f64>,
    pub rate_per_mile: Option<f64>,
    pub total_cost: Option<f64>,
    pub delivery_time_hours: Option<f64>,
    pub shipment_count: usize,
    /// Most frequent freight type; ties go to the first one seen.
    pub freight_type: Option<String>,
}

impl LaneProfile {
    pub fn key(&self) -> LaneKey {
        LaneKey::new(&self.origin_city, &self.destination_city)
    }
}

/// Aggregate statistics for one carrier across all lanes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierProfile {
    pub carrier_id: String,
    pub carrier_name: Option<String>,
    pub rate_per_mile: Option<f64>,
    pub total_cost: Option<f64>,
    pub delivery_time_hours: Option<f64>,
    pub on_time_percentage: f64,
    pub carrier_rating: Option<f64>,
    pub total_shipments: usize,
    pub distance_miles: Option<f64>,
    pub weight_lbs: Option<f64>,
}

/// A carrier's record on one specific lane.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CarrierLaneHistory {
    pub carrier_id: String,
    pub lane_id: String,
    pub carrier_name: Option<String>,
    pub origin_city: String,
    pub destination_city: String,
    pub rate_per_mile: Option<f64>,
    pub total_cost: Option<f64>,
    pub delivery_time_hours: Option<f64>,
    pub lane_on_time_percentage: f64,
    pub carrier_rating: Option<f64>,
    pub lane_shipment_count: usize,
    pub distance_miles: Option<f64>,
}

impl CarrierLaneHistory {
    pub fn lane_key(&self) -> LaneKey {
        LaneKey::new(&self.origin_city, &self.destination_city)
    }
}
