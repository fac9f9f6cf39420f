//! Carrier-to-lane match scoring.
//!
//! Every lane is scored against every known carrier with a fixed,
//! hand-weighted blend of four factors, and the best carriers per lane are
//! kept as recommendations.

pub mod scorer;
pub mod types;
pub mod weights;

pub use scorer::{Scored, Scorer};
pub use types::{Recommendation, RecommendationRow, ScoreFactors, ScoreFault, ScoreReport};
pub use weights::ScoringWeights;
