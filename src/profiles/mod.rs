//! Lane, carrier and carrier-lane aggregation.
//!
//! This module groups cleaned shipments by lane, by carrier and by
//! (carrier, lane), and reduces each group to a profile row of means and
//! counts. Tables are rebuilt from scratch on every run.

pub mod aggregate;
pub mod types;
pub mod utility;

pub use aggregate::{Profiles, aggregate_profiles};
pub use types::{CarrierLaneHistory, CarrierProfile, LaneKey, LaneProfile};
