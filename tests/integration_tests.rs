use lane_rater::RaterError;
use lane_rater::config::RaterConfig;
use lane_rater::metrics::ModelMetrics;
use lane_rater::pipeline::{self, CARRIER_LANE_HISTORY, CARRIERS, DataDir, LANES, MODEL_METRICS};
use lane_rater::profiles::{CarrierLaneHistory, LaneProfile};
use lane_rater::scoring::Recommendation;
use lane_rater::{output, query};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::PathBuf;

const SAMPLE: &[u8] = include_bytes!("fixtures/sample_shipments.json");

fn fresh_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("lane_rater_it_{name}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn seeded_dir(name: &str) -> DataDir {
    let root = fresh_dir(name);
    fs::write(root.join("raw_shipments.json"), SAMPLE).unwrap();
    DataDir::new(root)
}

#[test]
fn test_full_pipeline() {
    let dir = seeded_dir("full");

    let (processed, trained) = pipeline::run(&dir, None, &RaterConfig::default()).unwrap();

    assert_eq!(processed.clean.input_records, 104);
    assert_eq!(processed.clean.duplicates_removed, 2);
    assert_eq!(processed.clean.missing_keys_removed, 1);
    assert_eq!(processed.clean.values_coerced_to_missing, 1);
    assert_eq!(processed.clean.output_records, 101);
    assert_eq!(processed.lanes, 5);
    assert_eq!(processed.carriers, 20);
    assert_eq!(processed.carrier_lanes, 20);

    assert_eq!(trained.scoring.lanes_scored, 5);
    assert_eq!(trained.scoring.lanes_skipped, 0);
    assert_eq!(trained.metrics.total_recommendations, 50);
    assert_eq!(trained.metrics.unique_lanes, 5);

    let recommendations = pipeline::load_recommendations(&dir).unwrap();
    assert_eq!(recommendations.len(), 50);

    let metrics: ModelMetrics =
        output::read_json(&dir.table(MODEL_METRICS), MODEL_METRICS).unwrap();
    assert_eq!(metrics.total_recommendations, 50);
    assert_eq!(metrics.model_version, "1.0");

    fs::remove_dir_all(dir.root()).unwrap();
}

#[test]
fn test_recommendation_invariants() {
    let dir = seeded_dir("invariants");
    pipeline::run(&dir, None, &RaterConfig::default()).unwrap();

    let lanes: Vec<LaneProfile> = output::read_json(&dir.table(LANES), LANES).unwrap();
    let history: Vec<CarrierLaneHistory> =
        output::read_json(&dir.table(CARRIER_LANE_HISTORY), CARRIER_LANE_HISTORY).unwrap();
    let recommendations = pipeline::load_recommendations(&dir).unwrap();

    let mut per_lane: HashMap<&str, Vec<&Recommendation>> = HashMap::new();
    for rec in &recommendations {
        per_lane.entry(rec.lane_id.as_str()).or_default().push(rec);
    }

    for lane in &lanes {
        let recs = &per_lane[lane.lane_id.as_str()];
        assert_eq!(recs.len(), 10, "lane {}", lane.lane_id);
        assert!(
            recs.windows(2).all(|w| w[0].match_score >= w[1].match_score),
            "lane {} not sorted",
            lane.lane_id
        );
        let carriers: HashSet<_> = recs.iter().map(|r| r.carrier_id.as_str()).collect();
        assert_eq!(carriers.len(), 10);
    }

    let known: HashSet<(&str, &str)> = history
        .iter()
        .map(|h| (h.carrier_id.as_str(), h.lane_id.as_str()))
        .collect();
    for rec in &recommendations {
        let expected = known.contains(&(rec.carrier_id.as_str(), rec.lane_id.as_str()));
        assert_eq!(rec.has_lane_history, expected);

        let f = rec.score_factors;
        assert!((0.0..=100.0).contains(&f.reliability));
        assert!((0.0..=100.0).contains(&f.cost_competitiveness));
        assert!((0.0..=100.0).contains(&f.experience));
        if !rec.has_lane_history {
            assert_eq!(f.historical_performance, 0.0);
        }
    }

    let metrics: ModelMetrics =
        output::read_json(&dir.table(MODEL_METRICS), MODEL_METRICS).unwrap();
    let flagged = recommendations.iter().filter(|r| r.has_lane_history).count();
    assert_eq!(metrics.recommendations_with_history, flagged);

    fs::remove_dir_all(dir.root()).unwrap();
}

#[test]
fn test_process_is_idempotent() {
    let dir = seeded_dir("idempotent");

    let tables = [LANES, CARRIERS, CARRIER_LANE_HISTORY];

    pipeline::process(&dir, None).unwrap();
    let first: Vec<Vec<u8>> = tables
        .iter()
        .map(|t| fs::read(dir.table(t)).unwrap())
        .collect();

    pipeline::process(&dir, None).unwrap();
    for (table, before) in tables.iter().zip(&first) {
        assert_eq!(before, &fs::read(dir.table(table)).unwrap(), "{table} changed");
    }

    fs::remove_dir_all(dir.root()).unwrap();
}

#[test]
fn test_example_scenario() {
    let root = fresh_dir("example");
    let raw = r#"[
        {"shipment_id": "SH1", "origin_city": "NY", "destination_city": "LA", "carrier_id": "C1",
         "rate_per_mile": 2.5, "on_time_delivery": true, "carrier_rating": 4.5, "distance_miles": 100},
        {"shipment_id": "SH2", "origin_city": "NY", "destination_city": "LA", "carrier_id": "C1",
         "rate_per_mile": 2.5, "on_time_delivery": true, "carrier_rating": 4.5, "distance_miles": 100}
    ]"#;
    fs::write(root.join("raw_shipments.json"), raw).unwrap();
    let dir = DataDir::new(&root);

    pipeline::run(&dir, None, &RaterConfig::default()).unwrap();

    let lanes: Vec<LaneProfile> = output::read_json(&dir.table(LANES), LANES).unwrap();
    assert_eq!(lanes.len(), 1);
    assert_eq!(lanes[0].lane_id, "NY_LA");
    assert_eq!(lanes[0].shipment_count, 2);
    assert_eq!(lanes[0].rate_per_mile, Some(2.5));

    let recommendations = pipeline::load_recommendations(&dir).unwrap();
    assert_eq!(recommendations.len(), 1);
    assert!(recommendations[0].has_lane_history);
    assert_eq!(recommendations[0].on_time_percentage, 100.0);
    assert_eq!(recommendations[0].score_factors.cost_competitiveness, 100.0);

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_csv_input_and_export() {
    let root = fresh_dir("csv");
    let input = root.join("shipments.csv");
    fs::write(
        &input,
        "shipment_id,origin_city,destination_city,carrier_id,carrier_name,rate_per_mile,on_time_delivery,carrier_rating,distance_miles\n\
         SH1,Chicago,Boston,C1,Swift,2.8,True,4.2,900\n\
         SH2,Chicago,Boston,C2,Prime,3.1,False,4.6,900\n\
         SH3,Chicago,Boston,,Nobody,3.0,True,4.0,900\n",
    )
    .unwrap();
    let dir = DataDir::new(&root);

    let (processed, trained) =
        pipeline::run(&dir, Some(&input), &RaterConfig::default()).unwrap();
    assert_eq!(processed.clean.missing_keys_removed, 1);
    assert_eq!(processed.carriers, 2);
    assert_eq!(trained.metrics.total_recommendations, 2);

    let csv_path = pipeline::export_csv(&dir, None).unwrap();
    let content = fs::read_to_string(&csv_path).unwrap();
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("cost_competitiveness"));

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_zero_rate_lane_is_excluded() {
    let root = fresh_dir("zero_rate");
    let raw = r#"[
        {"shipment_id": "SH1", "origin_city": "A", "destination_city": "B", "carrier_id": "C1",
         "rate_per_mile": 0, "on_time_delivery": true, "carrier_rating": 4.0, "distance_miles": 10},
        {"shipment_id": "SH2", "origin_city": "B", "destination_city": "A", "carrier_id": "C1",
         "rate_per_mile": 2.0, "on_time_delivery": true, "carrier_rating": 4.0, "distance_miles": 10}
    ]"#;
    fs::write(root.join("raw_shipments.json"), raw).unwrap();
    let dir = DataDir::new(&root);

    let (_, trained) = pipeline::run(&dir, None, &RaterConfig::default()).unwrap();
    assert_eq!(trained.scoring.lanes_skipped, 1);

    let recommendations = pipeline::load_recommendations(&dir).unwrap();
    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0].lane_id, "B_A");

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_empty_input_produces_empty_outputs() {
    let root = fresh_dir("empty");
    fs::write(root.join("raw_shipments.json"), "[]").unwrap();
    let dir = DataDir::new(&root);

    let (processed, trained) = pipeline::run(&dir, None, &RaterConfig::default()).unwrap();
    assert_eq!(processed.lanes, 0);
    assert_eq!(trained.metrics.total_recommendations, 0);
    assert_eq!(trained.metrics.avg_match_score, None);

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_train_requires_processed_tables() {
    let root = fresh_dir("train_missing");
    let dir = DataDir::new(&root);

    match pipeline::train(&dir, &RaterConfig::default()) {
        Err(RaterError::MissingInput { table, .. }) => assert_eq!(table, LANES),
        other => panic!("expected MissingInput, got {other:?}"),
    }
    assert!(!dir.table("recommendations").exists());

    fs::remove_dir_all(&root).unwrap();
}

#[test]
fn test_lane_query_after_training() {
    let dir = seeded_dir("query");
    pipeline::run(&dir, None, &RaterConfig::default()).unwrap();

    let lanes: Vec<LaneProfile> = output::read_json(&dir.table(LANES), LANES).unwrap();
    let recommendations = pipeline::load_recommendations(&dir).unwrap();

    let detail = query::lane_detail(&lanes, &recommendations, "New York_Miami").unwrap();
    assert_eq!(detail.lane.origin_state.as_deref(), Some("NY"));
    assert_eq!(detail.lane.freight_type.as_deref(), Some("Dry Van"));
    assert_eq!(detail.recommendations.len(), 10);

    assert_eq!(query::search_lanes(&lanes, "tx").len(), 1);

    fs::remove_dir_all(dir.root()).unwrap();
}

#[test]
fn test_underscore_cities_keep_lanes_apart() {
    let root = fresh_dir("underscore_lanes");
    let raw = r#"[
        {"shipment_id": "SH1", "origin_city": "A_B", "destination_city": "C", "carrier_id": "C1",
         "rate_per_mile": 2.0, "on_time_delivery": true, "carrier_rating": 4.0},
        {"shipment_id": "SH2", "origin_city": "A_B", "destination_city": "C", "carrier_id": "C2",
         "rate_per_mile": 2.5, "on_time_delivery": true, "carrier_rating": 4.5},
        {"shipment_id": "SH3", "origin_city": "A", "destination_city": "B_C", "carrier_id": "C1",
         "rate_per_mile": 3.0, "on_time_delivery": false, "carrier_rating": 4.0},
        {"shipment_id": "SH4", "origin_city": "A", "destination_city": "B_C", "carrier_id": "C2",
         "rate_per_mile": 3.5, "on_time_delivery": true, "carrier_rating": 4.5}
    ]"#;
    fs::write(root.join("raw_shipments.json"), raw).unwrap();
    let dir = DataDir::new(&root);

    pipeline::run(&dir, None, &RaterConfig::default()).unwrap();

    let lanes: Vec<LaneProfile> = output::read_json(&dir.table(LANES), LANES).unwrap();
    let recommendations = pipeline::load_recommendations(&dir).unwrap();
    let ids: HashSet<&str> = lanes.iter().map(|l| l.lane_id.as_str()).collect();
    assert_eq!(ids.len(), 2);

    for lane in &lanes {
        let detail = query::lane_detail(&lanes, &recommendations, &lane.lane_id).unwrap();
        assert_eq!(detail.lane.origin_city, lane.origin_city);
        assert_eq!(detail.recommendations.len(), 2);
    }

    fs::remove_dir_all(&root).unwrap();
}
