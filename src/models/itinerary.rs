//! Itinerary models.
//!
//! One itinerary exists per candidate departure time. Each entry
//! records the window during which the vehicle departs a leg's origin
//! and arrives at its destination, rest breaks included.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::LocationId;

/// One leg of a concrete itinerary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItineraryEntry {
    /// Leg origin city.
    pub origin: LocationId,
    /// Leg destination city.
    pub destination: LocationId,
    /// Instant the vehicle leaves the origin (window start).
    pub departure: NaiveDateTime,
    /// Instant the vehicle arrives, travel plus inserted breaks
    /// (window end).
    pub arrival: NaiveDateTime,
    /// Driving minutes accumulated since the last rest break, after
    /// this leg's rest rules were applied.
    pub drive_minutes: i64,
    /// Total minutes elapsed since the itinerary's departure instant.
    pub elapsed_minutes: i64,
}

/// A fully scheduled walk of a route for one candidate departure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    /// Per-leg windows, in travel order.
    pub entries: Vec<ItineraryEntry>,
    /// Total rest-break minutes inserted across the walk.
    pub break_minutes: i64,
}

impl Itinerary {
    /// Number of legs walked.
    pub fn leg_count(&self) -> usize {
        self.entries.len()
    }

    /// Cumulative elapsed minutes at the destination.
    ///
    /// Equals the sum of leg transit times plus all inserted break
    /// minutes — no leg skipped or duplicated.
    pub fn total_elapsed_minutes(&self) -> i64 {
        self.entries.last().map_or(0, |e| e.elapsed_minutes)
    }

    /// Arrival instant at the route destination, if any leg was walked.
    pub fn final_arrival(&self) -> Option<NaiveDateTime> {
        self.entries.last().map(|e| e.arrival)
    }
}
