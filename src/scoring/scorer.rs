use tracing::{debug, info, warn};

use crate::profiles::aggregate::index_history;
use crate::profiles::types::{CarrierLaneHistory, CarrierProfile, LaneProfile};
use crate::profiles::utility::round_to;
use crate::scoring::types::{Recommendation, ScoreFactors, ScoreFault, ScoreReport};
use crate::scoring::weights::ScoringWeights;

/// Ranked recommendations plus counts for the run.
#[derive(Debug, Clone, Default)]
pub struct Scored {
    pub recommendations: Vec<Recommendation>,
    pub report: ScoreReport,
}

/// Scores lanes against carriers and keeps the best `top_n` per lane.
#[derive(Debug, Clone)]
pub struct Scorer {
    weights: ScoringWeights,
    top_n: usize,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(ScoringWeights::default(), 10)
    }
}

impl Scorer {
    pub fn new(weights: ScoringWeights, top_n: usize) -> Self {
        Self { weights, top_n }
    }

    /// Scores the full lanes x carriers cross product.
    ///
    /// Lanes whose mean rate is zero or missing are skipped entirely;
    /// pairings missing a value the formula needs are left out. Within a
    /// lane, carriers are ordered by descending match score and ties keep
    /// carrier-table order.
    #[tracing::instrument(
        skip_all,
        fields(lanes = lanes.len(), carriers = carriers.len(), history = history.len())
    )]
    pub fn recommend(
        &self,
        lanes: &[LaneProfile],
        carriers: &[CarrierProfile],
        history: &[CarrierLaneHistory],
    ) -> Scored {
        let history_index = index_history(history);
        let mut report = ScoreReport::default();
        let mut recommendations = Vec::new();

        for lane in lanes {
            let key = lane.key();
            if let Err(fault) = lane_rate(lane) {
                warn!(lane = %key, %fault, "Skipping lane");
                report.lanes_skipped += 1;
                continue;
            }

            let mut scored = Vec::with_capacity(carriers.len());
            for carrier in carriers {
                let record = history_index
                    .get(&(carrier.carrier_id.as_str(), key.clone()))
                    .copied();

                match self.score_pair(lane, carrier, record) {
                    Ok(rec) => scored.push(rec),
                    Err(fault) => {
                        debug!(
                            lane_id = %lane.lane_id,
                            carrier_id = %carrier.carrier_id,
                            %fault,
                            "Excluding pairing"
                        );
                        report.pairings_excluded += 1;
                    }
                }
            }
            report.pairings_scored += scored.len();

            // stable: equal scores keep carrier order
            scored.sort_by(|a, b| b.match_score.total_cmp(&a.match_score));
            scored.truncate(self.top_n);

            report.lanes_scored += 1;
            recommendations.extend(scored);
        }

        if report.pairings_excluded > 0 {
            warn!(
                excluded = report.pairings_excluded,
                "Pairings excluded for missing values"
            );
        }

        report.recommendations = recommendations.len();
        info!(
            recommendations = report.recommendations,
            lanes_scored = report.lanes_scored,
            lanes_skipped = report.lanes_skipped,
            "Generated recommendations"
        );

        Scored {
            recommendations,
            report,
        }
    }

    /// Scores a single carrier on a single lane. `history` is the carrier's
    /// record on this lane, if it has one.
    pub fn score_pair(
        &self,
        lane: &LaneProfile,
        carrier: &CarrierProfile,
        history: Option<&CarrierLaneHistory>,
    ) -> Result<Recommendation, ScoreFault> {
        let lane_rate = lane_rate(lane)?;
        let carrier_rate = carrier
            .rate_per_mile
            .ok_or(ScoreFault::MissingValue {
                field: "carrier.rate_per_mile",
            })?;
        let carrier_rating = carrier
            .carrier_rating
            .ok_or(ScoreFault::MissingValue {
                field: "carrier.carrier_rating",
            })?;

        let historical_performance = match history {
            Some(h) => historical_factor(h, lane_rate)?,
            None => 0.0,
        };
        let factors = ScoreFactors {
            historical_performance,
            reliability: 0.6 * (carrier.on_time_percentage / 100.0) + 0.4 * (carrier_rating / 5.0),
            cost_competitiveness: (1.0 - (carrier_rate - lane_rate).abs() / lane_rate).max(0.0),
            experience: (carrier.total_shipments as f64 / 100.0).min(1.0),
        };

        let composite: f64 = factors_array(&factors)
            .iter()
            .zip(self.weights.as_array().iter())
            .map(|(f, w)| f * w)
            .sum();

        Ok(Recommendation {
            lane_id: lane.lane_id.clone(),
            origin_city: lane.origin_city.clone(),
            destination_city: lane.destination_city.clone(),
            carrier_id: carrier.carrier_id.clone(),
            carrier_name: carrier.carrier_name.clone(),
            match_score: round_to(composite * 100.0, 2),
            estimated_rate: round_to(carrier_rate, 2),
            estimated_cost: lane
                .distance_miles
                .map(|miles| round_to(carrier_rate * miles, 2)),
            estimated_delivery_hours: carrier.delivery_time_hours.map(|h| round_to(h, 1)),
            carrier_rating: round_to(carrier_rating, 2),
            on_time_percentage: round_to(carrier.on_time_percentage, 1),
            has_lane_history: history.is_some(),
            score_factors: factors.as_percentages(),
        })
    }
}

fn lane_rate(lane: &LaneProfile) -> Result<f64, ScoreFault> {
    let rate = lane.rate_per_mile.ok_or(ScoreFault::MissingValue {
        field: "lane.rate_per_mile",
    })?;
    if rate <= 0.0 {
        return Err(ScoreFault::InvalidLaneRate {
            lane: lane.lane_id.clone(),
            rate,
        });
    }
    Ok(rate)
}

/// Unfloored: goes negative when the carrier's lane rate is far above the
/// lane mean.
fn historical_factor(history: &CarrierLaneHistory, lane_rate: f64) -> Result<f64, ScoreFault> {
    let rate = history.rate_per_mile.ok_or(ScoreFault::MissingValue {
        field: "history.rate_per_mile",
    })?;
    let rating = history.carrier_rating.ok_or(ScoreFault::MissingValue {
        field: "history.carrier_rating",
    })?;

    Ok(0.5 * (history.lane_on_time_percentage / 100.0)
        + 0.3 * (rating / 5.0)
        + 0.2 * (1.0 - rate / lane_rate))
}

fn factors_array(factors: &ScoreFactors) -> [f64; 4] {
    [
        factors.historical_performance,
        factors.reliability,
        factors.cost_competitiveness,
        factors.experience,
    ]
}
