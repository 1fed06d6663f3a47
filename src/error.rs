//! Error taxonomy for the simulation engine.
//!
//! Per-unit errors (`RouteIncomplete`, `NoFitAvailable`,
//! `MissingHistoricalData`, `UnsupportedDistribution`) are caught by the
//! engine, logged with identifying keys, and excluded from output — they
//! never abort the batch. Structural errors (`RouteNotFound`,
//! `EmptyRoute`, `MalformedRoute`, `Store`) propagate to the caller.

use thiserror::Error;

use crate::models::{LocationId, RouteId};

/// Result alias for simulation operations.
pub type Result<T> = std::result::Result<T, SimulationError>;

/// Errors produced by the simulation engine.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SimulationError {
    /// The leg walk stopped before reaching the route destination.
    ///
    /// An unterminated path signals a data error, not a retryable
    /// condition. Fatal for the affected departure time only.
    #[error(
        "route {route_id}: no leg departs from {location} and destination {destination} was not reached"
    )]
    RouteIncomplete {
        /// Route being walked.
        route_id: RouteId,
        /// Location with no outgoing leg.
        location: LocationId,
        /// Destination that was never reached.
        destination: LocationId,
    },

    /// The leg graph is structurally broken (cycle or unreachable
    /// destination); detected by the iteration circuit breaker.
    #[error("route {route_id}: malformed leg graph: {detail}")]
    MalformedRoute {
        /// Route being walked.
        route_id: RouteId,
        /// What the circuit breaker observed.
        detail: String,
    },

    /// No candidate distribution family fits the pooled data.
    #[error("no candidate distribution fits the pooled data ({samples} samples)")]
    NoFitAvailable {
        /// Size of the pool that failed to fit.
        samples: usize,
    },

    /// A location/hour window has zero pooled observations.
    ///
    /// Treated identically to [`SimulationError::NoFitAvailable`]: the
    /// bucket is skipped and logged, the run continues.
    #[error("no historical observations for location {location} at hour {hour}")]
    MissingHistoricalData {
        /// Location whose pool is empty.
        location: LocationId,
        /// Hour-of-day bucket.
        hour: u32,
    },

    /// A persisted fit names a distribution outside the sampler's set.
    #[error("unsupported distribution '{0}'")]
    UnsupportedDistribution(String),

    /// The route store has no route under this id.
    #[error("route {0} not found")]
    RouteNotFound(RouteId),

    /// The route has no legs to walk.
    #[error("route {0} has no legs")]
    EmptyRoute(RouteId),

    /// A store read or write failed.
    #[error("store error: {0}")]
    Store(String),
}

impl SimulationError {
    /// Whether this error is confined to one (route, departure) unit.
    ///
    /// Per-unit errors are logged and skipped; everything else aborts
    /// the batch.
    pub fn is_per_unit(&self) -> bool {
        matches!(
            self,
            Self::RouteIncomplete { .. }
                | Self::NoFitAvailable { .. }
                | Self::MissingHistoricalData { .. }
                | Self::UnsupportedDistribution(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_unit_classification() {
        assert!(SimulationError::NoFitAvailable { samples: 3 }.is_per_unit());
        assert!(SimulationError::MissingHistoricalData {
            location: 1,
            hour: 9
        }
        .is_per_unit());
        assert!(SimulationError::UnsupportedDistribution("cauchy".into()).is_per_unit());
        assert!(!SimulationError::RouteNotFound(7).is_per_unit());
        assert!(!SimulationError::Store("disk gone".into()).is_per_unit());
    }

    #[test]
    fn test_display_carries_keys() {
        let err = SimulationError::RouteIncomplete {
            route_id: 1,
            location: 42,
            destination: 99,
        };
        let msg = err.to_string();
        assert!(msg.contains("42"));
        assert!(msg.contains("99"));
    }
}
