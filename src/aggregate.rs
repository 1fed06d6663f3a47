//! Scenario assembly and scoring.
//!
//! Joins sampled temperature and humidity series into scenario rows by
//! position, clamps each value into its measure's admissible range,
//! and hands the clamped batch to the scoring collaborator. Pure
//! computation over already-validated data: a failure here is a logic
//! defect, not a transient condition, so there is no retry logic.

use chrono::NaiveDateTime;

use crate::fuzzy::ClimateScorer;
use crate::models::{LocationId, Measure, RouteId, Scenario};

/// Assembles scored scenario rows for one (location, hour) bucket.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScenarioAggregator;

impl ScenarioAggregator {
    /// Creates an aggregator.
    pub fn new() -> Self {
        Self
    }

    /// Zips temperature and humidity samples positionally, clamps each
    /// value to the nearest admissible bound, scores the batch, and
    /// emits one row per scenario index (1-based).
    ///
    /// Both sample vectors come from the same fixed sample size, so
    /// `temperature[i]` and `humidity[i]` pair up by construction; the
    /// zip simply enforces that contract.
    pub fn aggregate(
        &self,
        route_id: RouteId,
        departure: NaiveDateTime,
        location_id: LocationId,
        hour: u32,
        temperatures: &[f64],
        humidities: &[f64],
        scorer: &dyn ClimateScorer,
    ) -> Vec<Scenario> {
        debug_assert_eq!(temperatures.len(), humidities.len());

        let clamped_t: Vec<f64> = temperatures
            .iter()
            .map(|&v| Measure::Temperature.clamp(v))
            .collect();
        let clamped_h: Vec<f64> = humidities
            .iter()
            .map(|&v| Measure::Humidity.clamp(v))
            .collect();

        let scores = scorer.score(&clamped_t, &clamped_h);

        clamped_t
            .iter()
            .zip(&clamped_h)
            .zip(&scores)
            .enumerate()
            .map(|(i, ((&temperature, &humidity), &score))| Scenario {
                route_id,
                departure,
                location_id,
                hour,
                scenario_index: i as u32 + 1,
                temperature,
                humidity,
                score,
            })
            .collect()
    }
}
