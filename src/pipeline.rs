//! Stage orchestration over a data directory.
//!
//! `process` turns raw shipments into the lane, carrier and carrier-lane
//! tables; `train` scores those tables and writes recommendations and
//! metrics. Each stage reads only complete files written by the previous
//! one and replaces all of its own outputs together, or none of them.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use crate::clean::{CleanReport, clean_shipments};
use crate::config::RaterConfig;
use crate::error::{RaterError, Result};
use crate::metrics::{ModelMetrics, model_metrics};
use crate::output::{StagedWrites, read_json, write_csv};
use crate::parser::{InputKind, RawShipment, parse_shipments};
use crate::profiles::{Profiles, aggregate_profiles};
use crate::scoring::{Recommendation, RecommendationRow, ScoreReport};

pub const RAW_SHIPMENTS: &str = "raw_shipments";
pub const LANES: &str = "lanes";
pub const CARRIERS: &str = "carriers";
pub const CARRIER_LANE_HISTORY: &str = "carrier_lane_history";
pub const RECOMMENDATIONS: &str = "recommendations";
pub const MODEL_METRICS: &str = "model_metrics";

/// File locations inside the data directory.
#[derive(Debug, Clone)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table(&self, name: &str) -> PathBuf {
        self.root.join(format!("{name}.json"))
    }

    pub fn raw_shipments(&self) -> PathBuf {
        self.table(RAW_SHIPMENTS)
    }

    pub fn recommendations_csv(&self) -> PathBuf {
        self.root.join(format!("{RECOMMENDATIONS}.csv"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessSummary {
    pub clean: CleanReport,
    pub lanes: usize,
    pub carriers: usize,
    pub carrier_lanes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrainSummary {
    pub scoring: ScoreReport,
    pub metrics: ModelMetrics,
}

/// Reads raw shipments from `path`, choosing the decoder by file name.
pub fn load_raw_shipments(path: &Path) -> Result<Vec<RawShipment>> {
    if !path.exists() {
        return Err(RaterError::MissingInput {
            table: RAW_SHIPMENTS,
            path: path.to_path_buf(),
        });
    }

    let kind = InputKind::from_path(path)?;
    let bytes = std::fs::read(path).map_err(|e| RaterError::io(path, e))?;
    let rows = parse_shipments(&bytes, kind)?;
    info!(path = %path.display(), records = rows.len(), "Loaded raw records");
    Ok(rows)
}

/// Loads the three aggregate tables. Any missing table fails the load.
pub fn load_profiles(dir: &DataDir) -> Result<Profiles> {
    let profiles = Profiles {
        lanes: read_json(&dir.table(LANES), LANES)?,
        carriers: read_json(&dir.table(CARRIERS), CARRIERS)?,
        history: read_json(&dir.table(CARRIER_LANE_HISTORY), CARRIER_LANE_HISTORY)?,
    };
    info!(
        lanes = profiles.lanes.len(),
        carriers = profiles.carriers.len(),
        history = profiles.history.len(),
        "Loaded profile tables"
    );
    Ok(profiles)
}

pub fn load_recommendations(dir: &DataDir) -> Result<Vec<Recommendation>> {
    read_json(&dir.table(RECOMMENDATIONS), RECOMMENDATIONS)
}

/// Clean and aggregate. `input` overrides the default raw shipments file.
#[tracing::instrument(skip_all, fields(data_dir = %dir.root().display()))]
pub fn process(dir: &DataDir, input: Option<&Path>) -> Result<ProcessSummary> {
    let input = input.map_or_else(|| dir.raw_shipments(), Path::to_path_buf);
    let raw = load_raw_shipments(&input)?;

    let cleaned = clean_shipments(&raw);
    let profiles = aggregate_profiles(&cleaned.records);

    let mut outputs = StagedWrites::new();
    outputs.json(&dir.table(LANES), &profiles.lanes)?;
    outputs.json(&dir.table(CARRIERS), &profiles.carriers)?;
    outputs.json(&dir.table(CARRIER_LANE_HISTORY), &profiles.history)?;
    outputs.commit()?;

    info!("Processing complete: data cleaned and profiles created");
    Ok(ProcessSummary {
        clean: cleaned.report,
        lanes: profiles.lanes.len(),
        carriers: profiles.carriers.len(),
        carrier_lanes: profiles.history.len(),
    })
}

/// Score the aggregate tables and write recommendations and metrics.
#[tracing::instrument(skip_all, fields(data_dir = %dir.root().display()))]
pub fn train(dir: &DataDir, config: &RaterConfig) -> Result<TrainSummary> {
    let profiles = load_profiles(dir)?;

    let scored = config
        .scorer()
        .recommend(&profiles.lanes, &profiles.carriers, &profiles.history);
    let metrics = model_metrics(
        &scored.recommendations,
        &profiles.history,
        &config.weights,
        &config.model_version,
    );

    let mut outputs = StagedWrites::new();
    outputs.json(&dir.table(RECOMMENDATIONS), &scored.recommendations)?;
    outputs.json(&dir.table(MODEL_METRICS), &metrics)?;
    outputs.commit()?;

    info!("Training complete");
    Ok(TrainSummary {
        scoring: scored.report,
        metrics,
    })
}

pub fn run(
    dir: &DataDir,
    input: Option<&Path>,
    config: &RaterConfig,
) -> Result<(ProcessSummary, TrainSummary)> {
    let processed = process(dir, input)?;
    let trained = train(dir, config)?;
    Ok((processed, trained))
}

/// Writes the recommendations table as CSV with flattened score factors.
pub fn export_csv(dir: &DataDir, path: Option<&Path>) -> Result<PathBuf> {
    let recommendations = load_recommendations(dir)?;
    let path = path.map_or_else(|| dir.recommendations_csv(), Path::to_path_buf);
    write_csv(&path, recommendations.iter().map(RecommendationRow::from))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_dir_paths() {
        let dir = DataDir::new("public/data");
        assert_eq!(dir.table(LANES), PathBuf::from("public/data/lanes.json"));
        assert_eq!(
            dir.raw_shipments(),
            PathBuf::from("public/data/raw_shipments.json")
        );
        assert_eq!(
            dir.recommendations_csv(),
            PathBuf::from("public/data/recommendations.csv")
        );
    }

    #[test]
    fn test_missing_raw_file() {
        let dir = DataDir::new(std::env::temp_dir().join("lane_rater_no_such_dir"));
        match process(&dir, None) {
            Err(RaterError::MissingInput { table, .. }) => assert_eq!(table, RAW_SHIPMENTS),
            other => panic!("expected MissingInput, got {other:?}"),
        }
    }

    fn seeded(name: &str) -> DataDir {
        let root = std::env::temp_dir().join(name);
        let _ = std::fs::remove_dir_all(&root);
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(
            root.join("raw_shipments.json"),
            r#"[
                {"shipment_id": "SH1", "origin_city": "NY", "destination_city": "LA", "carrier_id": "C1",
                 "rate_per_mile": 2.5, "on_time_delivery": true, "carrier_rating": 4.5},
                {"shipment_id": "SH2", "origin_city": "NY", "destination_city": "LA", "carrier_id": "C2",
                 "rate_per_mile": 3.0, "on_time_delivery": false, "carrier_rating": 4.0}
            ]"#,
        )
        .unwrap();
        DataDir::new(root)
    }

    #[test]
    fn test_failed_train_leaves_no_recommendations() {
        let dir = seeded("lane_rater_failed_train");
        process(&dir, None).unwrap();
        std::fs::create_dir_all(dir.table(MODEL_METRICS)).unwrap();

        assert!(train(&dir, &RaterConfig::default()).is_err());
        assert!(!dir.table(RECOMMENDATIONS).exists());
        assert!(!dir.root().join("recommendations.json.tmp").exists());

        std::fs::remove_dir_all(dir.root()).unwrap();
    }

    #[test]
    fn test_failed_process_keeps_previous_tables() {
        let dir = seeded("lane_rater_failed_process");
        process(&dir, None).unwrap();
        let lanes_before = std::fs::read(dir.table(LANES)).unwrap();

        std::fs::write(
            dir.raw_shipments(),
            r#"[{"shipment_id": "SH9", "origin_city": "SF", "destination_city": "LA", "carrier_id": "C9",
                 "rate_per_mile": 2.0, "on_time_delivery": true, "carrier_rating": 3.0}]"#,
        )
        .unwrap();
        std::fs::remove_file(dir.table(CARRIERS)).unwrap();
        std::fs::create_dir_all(dir.table(CARRIERS)).unwrap();

        assert!(process(&dir, None).is_err());
        assert_eq!(std::fs::read(dir.table(LANES)).unwrap(), lanes_before);

        std::fs::remove_dir_all(dir.root()).unwrap();
    }

    #[test]
    fn test_train_without_tables() {
        let dir = DataDir::new(std::env::temp_dir().join("lane_rater_no_tables_dir"));
        match train(&dir, &RaterConfig::default()) {
            Err(RaterError::MissingInput { table, .. }) => assert_eq!(table, LANES),
            other => panic!("expected MissingInput, got {other:?}"),
        }
    }
}
