//! Persisted simulation outputs.
//!
//! Both row types are keyed by (route, departure) and replaced
//! wholesale — delete-by-key then bulk append — whenever a departure
//! time is re-simulated. Fits are never incrementally updated.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::fit::FittedDistribution;

use super::{LocationId, Measure, RouteId};

/// The winning distribution for one (departure, location, hour, measure).
///
/// Stored as a family name plus parameter vector — the persisted form —
/// and decoded back into a [`FittedDistribution`] before sampling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionFit {
    /// Route the fit belongs to.
    pub route_id: RouteId,
    /// Candidate departure time.
    pub departure: NaiveDateTime,
    /// City bucket key.
    pub location_id: LocationId,
    /// Hour-of-day bucket key, 0–23.
    pub hour: u32,
    /// Which climate variable this fit models.
    pub measure: Measure,
    /// Family name (e.g. "norm", "gamma", "triang").
    pub distribution_name: String,
    /// Family parameters, in the family's declared order.
    pub parameters: Vec<f64>,
}

impl DistributionFit {
    /// Builds a persisted row from a fitted distribution.
    pub fn from_distribution(
        route_id: RouteId,
        departure: NaiveDateTime,
        location_id: LocationId,
        hour: u32,
        measure: Measure,
        distribution: &FittedDistribution,
    ) -> Self {
        Self {
            route_id,
            departure,
            location_id,
            hour,
            measure,
            distribution_name: distribution.name().to_string(),
            parameters: distribution.params(),
        }
    }

    /// Decodes the stored name/parameters back into a sampleable
    /// distribution.
    ///
    /// Fails with `UnsupportedDistribution` when the name is outside
    /// the sampler's known set.
    pub fn decode(&self) -> Result<FittedDistribution> {
        FittedDistribution::from_parts(&self.distribution_name, &self.parameters)
    }
}

/// One synthetic draw of paired temperature and humidity, scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Route the scenario belongs to.
    pub route_id: RouteId,
    /// Candidate departure time.
    pub departure: NaiveDateTime,
    /// City bucket key.
    pub location_id: LocationId,
    /// Hour-of-day bucket key, 0–23.
    pub hour: u32,
    /// Draw index, 1-based up to the sample size.
    pub scenario_index: u32,
    /// Sampled temperature, clamped to its admissible range (°C).
    pub temperature: f64,
    /// Sampled humidity, clamped to its admissible range (%).
    pub humidity: f64,
    /// Fuzzy desirability score (higher = better).
    pub score: f64,
}

/// Per-departure summary of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepartureSummary {
    /// Candidate departure time.
    pub departure: NaiveDateTime,
    /// Number of scenario rows emitted for this departure.
    pub scenario_count: usize,
    /// Mean fuzzy score across all scenarios.
    pub mean_score: f64,
    /// Worst fuzzy score across all scenarios.
    pub min_score: f64,
}
