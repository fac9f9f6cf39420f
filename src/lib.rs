pub mod clean;
pub mod config;
pub mod error;
pub mod metrics;
pub mod output;
pub mod parser;
pub mod pipeline;
pub mod profiles;
pub mod query;
pub mod scoring;

pub use error::{RaterError, Result};
