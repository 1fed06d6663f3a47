//! Route-weather Monte Carlo simulation engine.
//!
//! Estimates, for a cargo route crossing multiple cities, which departure
//! time minimizes exposure of temperature/humidity-sensitive cargo to
//! adverse climate during transit. Historical weather records are pooled
//! per (city, hour-of-day) bucket, a best-fit parametric distribution is
//! selected per bucket, and synthetic temperature/humidity scenarios are
//! regenerated by Monte Carlo sampling and scored by a fuzzy desirability
//! metric.
//!
//! # Modules
//!
//! - **`models`**: Domain types — `Route`, `Leg`, `Itinerary`,
//!   `HistoricalObservation`, `DistributionFit`, `Scenario`
//! - **`scheduler`**: Itinerary state machine with driver rest rules and
//!   working-hours snapping
//! - **`climate`**: Year-agnostic historical-window extraction
//! - **`fit`**: Best-fit distribution selection by histogram SSE
//! - **`montecarlo`**: Per-family sampling transformations
//! - **`fuzzy`**: Climate desirability scoring (boundary + reference impl)
//! - **`aggregate`**: Scenario assembly, clamping, and scoring
//! - **`store`**: Weather/route/output store contracts
//! - **`engine`**: `simulate()` orchestration across departure times
//!
//! # Pipeline
//!
//! For each candidate departure time: schedule the itinerary, pull
//! historical pools per visited city and hour, fit distributions, draw
//! 1000 synthetic values per measure, score the paired scenarios, and
//! replace the persisted rows for that (route, departure) key.
//!
//! # References
//!
//! - Banks et al. (2010), "Discrete-Event System Simulation"
//! - Law (2015), "Simulation Modeling and Analysis"

pub mod aggregate;
pub mod climate;
pub mod engine;
pub mod error;
pub mod fit;
pub mod fuzzy;
pub mod models;
pub mod montecarlo;
pub mod scheduler;
pub mod store;

pub use engine::{simulate, CancellationToken, SimulationReport, SimulationRequest};
pub use error::{Result, SimulationError};
