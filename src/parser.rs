//! Decoder for raw shipment tables.
//!
//! Upstream collaborators hand over shipments either as a JSON array of flat
//! objects or as a CSV file with a header row, optionally gzip-compressed.
//! Values are kept loosely typed here; coercion happens in [`crate::clean`].

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{RaterError, Result};

/// One shipment row exactly as supplied, before validation.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct RawShipment {
    pub shipment_id: Option<Value>,
    pub origin_city: Option<Value>,
    pub origin_state: Option<Value>,
    pub destination_city: Option<Value>,
    pub destination_state: Option<Value>,
    pub distance_miles: Option<Value>,
    pub weight_lbs: Option<Value>,
    pub freight_type: Option<Value>,
    pub carrier_id: Option<Value>,
    pub carrier_name: Option<Value>,
    pub rate_per_mile: Option<Value>,
    pub total_cost: Option<Value>,
    pub delivery_time_hours: Option<Value>,
    pub on_time_delivery: Option<Value>,
    pub carrier_rating: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Json,
    Csv,
}

/// Format of an input file plus whether it is gzip-wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputKind {
    pub format: InputFormat,
    pub gzip: bool,
}

impl InputKind {
    /// Detects the input kind from the file name: `.json`, `.csv`, with an
    /// optional trailing `.gz`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let (stem, gzip) = match name.strip_suffix(".gz") {
            Some(stem) => (stem, true),
            None => (name.as_str(), false),
        };

        let format = if stem.ends_with(".json") {
            InputFormat::Json
        } else if stem.ends_with(".csv") {
            InputFormat::Csv
        } else {
            return Err(RaterError::UnsupportedFormat(path.to_path_buf()));
        };

        Ok(Self { format, gzip })
    }
}

/// Decodes raw shipment rows from `bytes`.
///
/// # Errors
///
/// Returns an error if the payload is not valid gzip (when `kind.gzip` is
/// set), not a JSON array of objects, or not well-formed CSV.
pub fn parse_shipments(bytes: &[u8], kind: InputKind) -> Result<Vec<RawShipment>> {
    if kind.gzip {
        let mut inflated = Vec::new();
        GzDecoder::new(bytes)
            .read_to_end(&mut inflated)
            .map_err(RaterError::Gzip)?;
        return decode(&inflated, kind.format);
    }

    decode(bytes, kind.format)
}

fn decode(bytes: &[u8], format: InputFormat) -> Result<Vec<RawShipment>> {
    match format {
        InputFormat::Json => Ok(serde_json::from_slice(bytes)?),
        InputFormat::Csv => decode_csv(bytes),
    }
}

/// CSV cells arrive as text; empty cells are treated as absent so they read
/// the same as a JSON `null`.
fn decode_csv(bytes: &[u8]) -> Result<Vec<RawShipment>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut rows = Vec::new();

    for result in rdr.deserialize() {
        let record: HashMap<String, String> = result?;
        let object: Map<String, Value> = record
            .into_iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .map(|(k, v)| (k.trim().to_string(), Value::String(v)))
            .collect();
        rows.push(serde_json::from_value(Value::Object(object))?);
    }

    Ok(rows)
}
