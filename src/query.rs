//! Read-side lookups over the persisted tables.

use serde::Serialize;

use crate::profiles::types::{CarrierLaneHistory, CarrierProfile, LaneProfile};
use crate::scoring::types::Recommendation;

/// A lane together with its ranked recommendations.
#[derive(Debug, Clone, Serialize)]
pub struct LaneDetail<'a> {
    pub lane: &'a LaneProfile,
    pub recommendations: Vec<&'a Recommendation>,
}

/// A carrier together with its per-lane history.
#[derive(Debug, Clone, Serialize)]
pub struct CarrierDetail<'a> {
    pub carrier: &'a CarrierProfile,
    pub lane_history: Vec<&'a CarrierLaneHistory>,
}

/// Recommendations for `lane_id`, best first.
pub fn recommendations_for_lane<'a>(
    recommendations: &'a [Recommendation],
    lane_id: &str,
) -> Vec<&'a Recommendation> {
    let mut recs: Vec<_> = recommendations
        .iter()
        .filter(|r| r.lane_id == lane_id)
        .collect();
    sort_by_score(&mut recs);
    recs
}

/// The `limit` best recommendations across all lanes.
pub fn top_recommendations(recommendations: &[Recommendation], limit: usize) -> Vec<&Recommendation> {
    let mut recs: Vec<_> = recommendations.iter().collect();
    sort_by_score(&mut recs);
    recs.truncate(limit);
    recs
}

pub fn filter_by_match_score(
    recommendations: &[Recommendation],
    min_score: f64,
) -> Vec<&Recommendation> {
    recommendations
        .iter()
        .filter(|r| r.match_score >= min_score)
        .collect()
}

/// Case-insensitive substring search over origin and destination city and
/// state.
pub fn search_lanes<'a>(lanes: &'a [LaneProfile], query: &str) -> Vec<&'a LaneProfile> {
    let needle = query.to_lowercase();
    let matches = |field: Option<&str>| field.is_some_and(|f| f.to_lowercase().contains(&needle));

    lanes
        .iter()
        .filter(|lane| {
            matches(Some(lane.origin_city.as_str()))
                || matches(Some(lane.destination_city.as_str()))
                || matches(lane.origin_state.as_deref())
                || matches(lane.destination_state.as_deref())
        })
        .collect()
}

/// Carriers meeting the optional thresholds, highest rated first. Carriers
/// without a rating fail any rating threshold and sort last.
pub fn filter_carriers(
    carriers: &[CarrierProfile],
    min_rating: Option<f64>,
    min_on_time: Option<f64>,
) -> Vec<&CarrierProfile> {
    let mut found: Vec<_> = carriers
        .iter()
        .filter(|c| min_rating.is_none_or(|min| c.carrier_rating.is_some_and(|r| r >= min)))
        .filter(|c| min_on_time.is_none_or(|min| c.on_time_percentage >= min))
        .collect();

    found.sort_by(|a, b| {
        let a = a.carrier_rating.unwrap_or(f64::NEG_INFINITY);
        let b = b.carrier_rating.unwrap_or(f64::NEG_INFINITY);
        b.total_cmp(&a)
    });
    found
}

pub fn lane_detail<'a>(
    lanes: &'a [LaneProfile],
    recommendations: &'a [Recommendation],
    lane_id: &str,
) -> Option<LaneDetail<'a>> {
    let lane = lanes.iter().find(|l| l.lane_id == lane_id)?;
    Some(LaneDetail {
        lane,
        recommendations: recommendations_for_lane(recommendations, lane_id),
    })
}

pub fn carrier_detail<'a>(
    carriers: &'a [CarrierProfile],
    history: &'a [CarrierLaneHistory],
    carrier_id: &str,
) -> Option<CarrierDetail<'a>> {
    let carrier = carriers.iter().find(|c| c.carrier_id == carrier_id)?;
    Some(CarrierDetail {
        carrier,
        lane_history: history
            .iter()
            .filter(|h| h.carrier_id == carrier_id)
            .collect(),
    })
}

fn sort_by_score(recs: &mut [&Recommendation]) {
    recs.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
}
