//! Route and leg models.
//!
//! A route is a fixed sequence of cities a shipment travels; a leg is a
//! single origin→destination hop with a fixed transit time. The leg
//! graph is always a simple path: at most one outgoing leg per origin
//! under a given route, so the scheduler's origin→leg lookup is a
//! linear search.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{LocationId, RouteId};

/// A fixed cargo route from origin to destination.
///
/// Immutable reference data, loaded once per simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Unique route identifier.
    pub id: RouteId,
    /// First city of the route.
    pub origin: LocationId,
    /// Last city of the route.
    pub destination: LocationId,
    /// Ordered cities from origin to destination.
    pub cities: Vec<LocationId>,
    /// Whether the route is currently evaluated.
    pub active: bool,
    /// Fixed departure day; candidate departure times fall on this date.
    pub start_date: NaiveDate,
}

impl Route {
    /// Creates a route over an ordered city list.
    ///
    /// Origin and destination are taken from the list endpoints.
    /// Panics if `cities` has fewer than two entries — a route with no
    /// travel is meaningless.
    pub fn new(id: RouteId, cities: Vec<LocationId>, start_date: NaiveDate) -> Self {
        assert!(cities.len() >= 2, "a route needs at least two cities");
        Self {
            id,
            origin: cities[0],
            destination: cities[cities.len() - 1],
            cities,
            active: true,
            start_date,
        }
    }

    /// Marks the route inactive.
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// A directed origin→destination hop with a fixed transit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    /// Departure city.
    pub origin: LocationId,
    /// Arrival city.
    pub destination: LocationId,
    /// Travel duration in minutes.
    pub transit_time_minutes: i64,
}

impl Leg {
    /// Creates a leg.
    pub fn new(origin: LocationId, destination: LocationId, transit_time_minutes: i64) -> Self {
        Self {
            origin,
            destination,
            transit_time_minutes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 15).unwrap()
    }

    #[test]
    fn test_route_endpoints() {
        let route = Route::new(1, vec![10, 20, 30], date());
        assert_eq!(route.origin, 10);
        assert_eq!(route.destination, 30);
        assert!(route.active);
    }

    #[test]
    #[should_panic]
    fn test_route_rejects_single_city() {
        Route::new(1, vec![10], date());
    }
}
