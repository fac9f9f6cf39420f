use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::clean::ShipmentRecord;
use crate::profiles::types::{CarrierLaneHistory, CarrierProfile, LaneKey, LaneProfile};
use crate::profiles::utility::{first, mean, mode, percent_true};

/// The three aggregate tables derived from one set of cleaned shipments.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Profiles {
    pub lanes: Vec<LaneProfile>,
    pub carriers: Vec<CarrierProfile>,
    pub history: Vec<CarrierLaneHistory>,
}

/// Builds lane, carrier and carrier-lane tables from cleaned shipments.
///
/// Each table has exactly one row per distinct key, ordered by key. Rows
/// inside a group keep input order, which fixes first-seen tie-breaks.
#[tracing::instrument(skip_all, fields(records = records.len()))]
pub fn aggregate_profiles(records: &[ShipmentRecord]) -> Profiles {
    let lanes = lane_profiles(records);
    info!(lanes = lanes.len(), "Created lane profiles");

    let carriers = carrier_profiles(records);
    info!(carriers = carriers.len(), "Created carrier profiles");

    let history = carrier_lane_history(records);
    info!(
        combinations = history.len(),
        "Created carrier-lane history"
    );

    Profiles {
        lanes,
        carriers,
        history,
    }
}

pub fn lane_profiles(records: &[ShipmentRecord]) -> Vec<LaneProfile> {
    group_by(records, ShipmentRecord::lane)
        .into_iter()
        .map(|(key, rows)| LaneProfile {
            lane_id: key.lane_id(),
            origin_state: first(rows.iter().map(|r| r.origin_state.as_deref())),
            destination_state: first(rows.iter().map(|r| r.destination_state.as_deref())),
            distance_miles: mean(rows.iter().map(|r| r.distance_miles)),
            weight_lbs: mean(rows.iter().map(|r| r.weight_lbs)),
            rate_per_mile: mean(rows.iter().map(|r| r.rate_per_mile)),
            total_cost: mean(rows.iter().map(|r| r.total_cost)),
            delivery_time_hours: mean(rows.iter().map(|r| r.delivery_time_hours)),
            shipment_count: rows.len(),
            freight_type: mode(rows.iter().map(|r| r.freight_type.as_deref())),
            origin_city: key.origin_city,
            destination_city: key.destination_city,
        })
        .collect()
}

pub fn carrier_profiles(records: &[ShipmentRecord]) -> Vec<CarrierProfile> {
    group_by(records, |r| r.carrier_id.clone())
        .into_iter()
        .map(|(carrier_id, rows)| CarrierProfile {
            carrier_id,
            carrier_name: first(rows.iter().map(|r| r.carrier_name.as_deref())),
            rate_per_mile: mean(rows.iter().map(|r| r.rate_per_mile)),
            total_cost: mean(rows.iter().map(|r| r.total_cost)),
            delivery_time_hours: mean(rows.iter().map(|r| r.delivery_time_hours)),
            on_time_percentage: percent_true(rows.iter().map(|r| r.on_time())),
            carrier_rating: mean(rows.iter().map(|r| r.carrier_rating)),
            total_shipments: rows.len(),
            distance_miles: mean(rows.iter().map(|r| r.distance_miles)),
            weight_lbs: mean(rows.iter().map(|r| r.weight_lbs)),
        })
        .collect()
}

pub fn carrier_lane_history(records: &[ShipmentRecord]) -> Vec<CarrierLaneHistory> {
    group_by(records, |r| (r.carrier_id.clone(), r.lane()))
        .into_iter()
        .map(|((carrier_id, lane), rows)| CarrierLaneHistory {
            carrier_id,
            lane_id: lane.lane_id(),
            carrier_name: first(rows.iter().map(|r| r.carrier_name.as_deref())),
            rate_per_mile: mean(rows.iter().map(|r| r.rate_per_mile)),
            total_cost: mean(rows.iter().map(|r| r.total_cost)),
            delivery_time_hours: mean(rows.iter().map(|r| r.delivery_time_hours)),
            lane_on_time_percentage: percent_true(rows.iter().map(|r| r.on_time())),
            carrier_rating: mean(rows.iter().map(|r| r.carrier_rating)),
            lane_shipment_count: rows.len(),
            distance_miles: mean(rows.iter().map(|r| r.distance_miles)),
            origin_city: lane.origin_city,
            destination_city: lane.destination_city,
        })
        .collect()
}

fn group_by<K, F>(records: &[ShipmentRecord], key: F) -> BTreeMap<K, Vec<&ShipmentRecord>>
where
    K: Ord,
    F: Fn(&ShipmentRecord) -> K,
{
    let mut groups: BTreeMap<K, Vec<&ShipmentRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(key(record)).or_default().push(record);
    }
    groups
}

/// Lookup helper used by the scorer: carrier-lane rows keyed by
/// `(carrier_id, lane)`.
pub fn index_history(
    history: &[CarrierLaneHistory],
) -> BTreeMap<(&str, LaneKey), &CarrierLaneHistory> {
    history
        .iter()
        .map(|h| ((h.carrier_id.as_str(), h.lane_key()), h))
        .collect()
}
