//! Validation and deduplication of raw shipment rows.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::parser::RawShipment;
use crate::profiles::types::LaneKey;

/// A validated shipment. The three join keys are guaranteed present;
/// every other field may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipmentRecord {
    pub shipment_id: Option<String>,
    pub origin_city: String,
    pub origin_state: Option<String>,
    pub destination_city: String,
    pub destination_state: Option<String>,
    pub distance_miles: Option<f64>,
    pub weight_lbs: Option<f64>,
    pub freight_type: Option<String>,
    pub carrier_id: String,
    pub carrier_name: Option<String>,
    pub rate_per_mile: Option<f64>,
    pub total_cost: Option<f64>,
    pub delivery_time_hours: Option<f64>,
    pub on_time_delivery: Option<bool>,
    pub carrier_rating: Option<f64>,
}

impl ShipmentRecord {
    pub fn lane(&self) -> LaneKey {
        LaneKey::new(&self.origin_city, &self.destination_city)
    }

    /// Unknown delivery status counts as late.
    pub fn on_time(&self) -> bool {
        self.on_time_delivery.unwrap_or(false)
    }
}

/// Per-step counts for one cleaning run.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct CleanReport {
    pub input_records: usize,
    pub duplicates_removed: usize,
    pub missing_keys_removed: usize,
    /// Numeric cells that were present but could not be read as a number.
    pub values_coerced_to_missing: usize,
    pub output_records: usize,
}

impl CleanReport {
    pub fn pct(part: usize, total: usize) -> f64 {
        if total == 0 {
            0.0
        } else {
            (part as f64 / total as f64) * 100.0
        }
    }

    pub fn retained_pct(&self) -> f64 {
        Self::pct(self.output_records, self.input_records)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Cleaned {
    pub records: Vec<ShipmentRecord>,
    pub report: CleanReport,
}

/// Deduplicates on shipment id (first occurrence wins), drops rows missing
/// origin, destination or carrier, and coerces numeric fields.
///
/// Ids compare by their JSON value, so `7` and `"7"` are different
/// shipments. Rows without an id count as one shared id.
///
/// Never fails: malformed values become missing and are counted.
#[tracing::instrument(skip_all, fields(input = raw.len()))]
pub fn clean_shipments(raw: &[RawShipment]) -> Cleaned {
    let mut report = CleanReport {
        input_records: raw.len(),
        ..Default::default()
    };

    let mut seen: HashSet<Option<String>> = HashSet::new();
    let mut unique = Vec::with_capacity(raw.len());
    for row in raw {
        if seen.insert(row.shipment_id.as_ref().map(Value::to_string)) {
            unique.push(row);
        } else {
            report.duplicates_removed += 1;
        }
    }
    info!(
        removed = report.duplicates_removed,
        "Removed duplicate shipment records"
    );

    let mut records = Vec::with_capacity(unique.len());
    for row in unique {
        let (Some(origin_city), Some(destination_city), Some(carrier_id)) = (
            text(&row.origin_city),
            text(&row.destination_city),
            text(&row.carrier_id),
        ) else {
            report.missing_keys_removed += 1;
            continue;
        };

        let mut number = |value: &Option<Value>| {
            let parsed = numeric(value);
            if value.is_some() && parsed.is_none() {
                report.values_coerced_to_missing += 1;
            }
            parsed
        };

        records.push(ShipmentRecord {
            shipment_id: text(&row.shipment_id),
            origin_city,
            origin_state: text(&row.origin_state),
            destination_city,
            destination_state: text(&row.destination_state),
            distance_miles: number(&row.distance_miles),
            weight_lbs: number(&row.weight_lbs),
            freight_type: text(&row.freight_type),
            carrier_id,
            carrier_name: text(&row.carrier_name),
            rate_per_mile: number(&row.rate_per_mile),
            total_cost: number(&row.total_cost),
            delivery_time_hours: number(&row.delivery_time_hours),
            on_time_delivery: flag(&row.on_time_delivery),
            carrier_rating: number(&row.carrier_rating),
        });
    }

    if report.missing_keys_removed > 0 {
        warn!(
            removed = report.missing_keys_removed,
            "Dropped records missing origin, destination or carrier"
        );
    }
    if report.values_coerced_to_missing > 0 {
        warn!(
            count = report.values_coerced_to_missing,
            "Non-numeric values treated as missing"
        );
    }

    report.output_records = records.len();
    info!(
        records = report.output_records,
        retained_pct = report.retained_pct(),
        "Data cleaned"
    );

    Cleaned { records, report }
}

fn text(value: &Option<Value>) -> Option<String> {
    match value.as_ref()? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        other => {
            debug!(value = %other, "Ignoring non-scalar text value");
            None
        }
    }
}

fn numeric(value: &Option<Value>) -> Option<f64> {
    let parsed = match value.as_ref()? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

fn flag(value: &Option<Value>) -> Option<bool> {
    match value.as_ref()? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "y" => Some(true),
            "false" | "0" | "no" | "n" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
