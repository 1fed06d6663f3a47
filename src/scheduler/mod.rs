//! Itinerary scheduling.
//!
//! Converts a route's ordered legs plus one candidate departure
//! instant into concrete (origin, window) pairs, inserting legally
//! mandated driver rest breaks and optionally snapping window
//! endpoints into business hours.
//!
//! # Rest rules (defaults)
//!
//! 1. 330 driving minutes (5h30) → 30-minute break, drive accumulator
//!    resets, break counts toward duty time.
//! 2. 1440 duty minutes (24h) → 8-hour break, both accumulators reset.
//!
//! Rules are checked in that order on every leg; both can fire on the
//! same leg.

mod itinerary;

pub use itinerary::{ItineraryScheduler, RestRules, WorkingHours};
