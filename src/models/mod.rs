//! Simulation domain models.
//!
//! Core data types for route-weather simulation: reference data
//! (`Route`, `Leg`), the itinerary produced per candidate departure,
//! historical climate facts, and the persisted outputs of one Monte
//! Carlo run.
//!
//! # Lifecycle
//!
//! | Type | Mutability |
//! |------|------------|
//! | `Route`, `Leg` | Immutable reference data, loaded once per run |
//! | `Itinerary` | One per candidate departure, discarded after extraction |
//! | `HistoricalObservation` | Append-only facts, never mutated here |
//! | `DistributionFit`, `Scenario` | Replaced wholesale per (route, departure) |

mod itinerary;
mod observation;
mod outputs;
mod route;

pub use itinerary::{Itinerary, ItineraryEntry};
pub use observation::{CalendarPosition, HistoricalObservation, Measure};
pub use outputs::{DepartureSummary, DistributionFit, Scenario};
pub use route::{Leg, Route};

/// Identifier of a route.
pub type RouteId = u32;

/// Identifier of a city / weather-station location.
pub type LocationId = u32;
