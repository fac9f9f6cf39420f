//! CLI entry point for the carrier-lane rater.
//!
//! Provides subcommands for the processing and scoring stages, CSV export,
//! and read-side queries over the generated tables.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use lane_rater::config::RaterConfig;
use lane_rater::output::print_json;
use lane_rater::pipeline::{self, CARRIER_LANE_HISTORY, CARRIERS, DataDir, LANES};
use lane_rater::profiles::{CarrierLaneHistory, CarrierProfile, LaneProfile};
use lane_rater::scoring::Recommendation;
use lane_rater::{output, query};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "lane_rater")]
#[command(about = "Aggregate shipment history and rank carriers per lane", long_about = None)]
struct Cli {
    /// Directory holding the input and output tables
    #[arg(short, long, global = true, env = "LANE_RATER_DATA_DIR", default_value = "public/data")]
    data_dir: PathBuf,

    /// Optional JSON file with scoring weights, top-N and model version
    #[arg(short, long, global = true, env = "LANE_RATER_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clean raw shipments and build lane, carrier and carrier-lane tables
    Process {
        /// Raw shipments file (.json, .csv, optionally .gz); defaults to raw_shipments.json
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Score lanes against carriers and write recommendations and metrics
    Train,
    /// Run `process` then `train`
    Run {
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Export recommendations as CSV
    Export {
        /// Output path; defaults to recommendations.csv in the data directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show a lane and its ranked carriers
    Lane {
        #[arg(value_name = "LANE_ID")]
        lane_id: String,
    },
    /// Show a carrier and its lane history
    Carrier {
        #[arg(value_name = "CARRIER_ID")]
        carrier_id: String,
    },
    /// List carriers, best rated first
    Carriers {
        #[arg(long)]
        min_rating: Option<f64>,
        #[arg(long)]
        min_on_time: Option<f64>,
    },
    /// Best recommendations across all lanes
    Top {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        min_score: Option<f64>,
    },
    /// Search lanes by origin or destination city or state
    Search {
        #[arg(value_name = "QUERY")]
        query: String,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/lane_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("lane_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let dir = DataDir::new(&cli.data_dir);

    match cli.command {
        Commands::Process { input } => {
            let summary = pipeline::process(&dir, input.as_deref())?;
            info!(
                records = summary.clean.output_records,
                duplicates = summary.clean.duplicates_removed,
                lanes = summary.lanes,
                carriers = summary.carriers,
                carrier_lanes = summary.carrier_lanes,
                "Processing summary"
            );
            output::print_pretty(&summary);
        }
        Commands::Train => {
            let config = RaterConfig::load_or_default(cli.config.as_deref())?;
            let summary = pipeline::train(&dir, &config)?;
            info!(
                avg_match_score = ?summary.metrics.avg_match_score,
                history_coverage = ?summary.metrics.history_coverage_percentage,
                "Model summary"
            );
        }
        Commands::Run { input } => {
            let config = RaterConfig::load_or_default(cli.config.as_deref())?;
            let (processed, trained) = pipeline::run(&dir, input.as_deref(), &config)?;
            info!(
                records = processed.clean.output_records,
                lanes = processed.lanes,
                carriers = processed.carriers,
                recommendations = trained.metrics.total_recommendations,
                "Pipeline complete"
            );
        }
        Commands::Export { output } => {
            let path = pipeline::export_csv(&dir, output.as_deref())?;
            info!(path = %path.display(), "Recommendations exported");
        }
        Commands::Lane { lane_id } => {
            let lanes: Vec<LaneProfile> = output::read_json(&dir.table(LANES), LANES)?;
            let recommendations = pipeline::load_recommendations(&dir)?;
            match query::lane_detail(&lanes, &recommendations, &lane_id) {
                Some(detail) => print_json(&detail)?,
                None => bail!("Lane not found: {lane_id}"),
            }
        }
        Commands::Carrier { carrier_id } => {
            let carriers: Vec<CarrierProfile> = output::read_json(&dir.table(CARRIERS), CARRIERS)?;
            let history: Vec<CarrierLaneHistory> =
                output::read_json(&dir.table(CARRIER_LANE_HISTORY), CARRIER_LANE_HISTORY)?;
            match query::carrier_detail(&carriers, &history, &carrier_id) {
                Some(detail) => print_json(&detail)?,
                None => bail!("Carrier not found: {carrier_id}"),
            }
        }
        Commands::Carriers {
            min_rating,
            min_on_time,
        } => {
            let carriers: Vec<CarrierProfile> = output::read_json(&dir.table(CARRIERS), CARRIERS)?;
            let found = query::filter_carriers(&carriers, min_rating, min_on_time);
            info!(count = found.len(), "Carriers matched");
            print_json(&found)?;
        }
        Commands::Top { limit, min_score } => {
            let recommendations = pipeline::load_recommendations(&dir)?;
            let pool: Vec<Recommendation> = match min_score {
                Some(min) => query::filter_by_match_score(&recommendations, min)
                    .into_iter()
                    .cloned()
                    .collect(),
                None => recommendations,
            };
            print_json(&query::top_recommendations(&pool, limit))?;
        }
        Commands::Search { query: text } => {
            let lanes: Vec<LaneProfile> = output::read_json(&dir.table(LANES), LANES)?;
            print_json(&query::search_lanes(&lanes, &text))?;
        }
    }

    Ok(())
}
