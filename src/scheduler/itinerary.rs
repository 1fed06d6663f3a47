//! Itinerary state machine.
//!
//! The walk threads an explicit state (current location, clock, drive
//! and duty accumulators) through the leg list. For a fixed (route,
//! departure) the result is deterministic: identical inputs reproduce
//! identical window boundaries.

use chrono::{Duration, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimulationError};
use crate::models::{Itinerary, ItineraryEntry, Leg, Route};

/// Driver rest-break thresholds and break lengths (minutes).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestRules {
    /// Continuous driving allowed before a short break (default 330).
    pub drive_limit_minutes: i64,
    /// Short break length (default 30).
    pub short_break_minutes: i64,
    /// Duty time allowed before a long rest (default 1440).
    pub duty_limit_minutes: i64,
    /// Long rest length (default 480).
    pub long_break_minutes: i64,
}

impl Default for RestRules {
    fn default() -> Self {
        Self {
            drive_limit_minutes: 330,
            short_break_minutes: 30,
            duty_limit_minutes: 1440,
            long_break_minutes: 480,
        }
    }
}

/// Business-hours window with a fixed lunch gap.
///
/// Hours are inclusive on both ends: with the defaults, 08:00 through
/// 18:59 is working time except the 12:00 hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    /// First working hour of the day (default 8).
    pub open: u32,
    /// Last working hour of the day (default 18).
    pub close: u32,
    /// Lunch hour, skipped entirely (default 12).
    pub lunch: u32,
}

impl Default for WorkingHours {
    fn default() -> Self {
        Self {
            open: 8,
            close: 18,
            lunch: 12,
        }
    }
}

impl WorkingHours {
    /// Whether an hour-of-day falls inside working time.
    pub fn contains_hour(&self, hour: u32) -> bool {
        hour >= self.open && hour <= self.close && hour != self.lunch
    }

    /// Working hours of one day, lunch excluded, in order.
    pub fn departure_hours(&self) -> Vec<u32> {
        (self.open..=self.close)
            .filter(|&h| h != self.lunch)
            .collect()
    }

    /// Snaps an instant forward to the next valid working time.
    ///
    /// Priority rules: past close → next day's open (minutes zeroed);
    /// before open → that day's open (minutes zeroed); in the lunch
    /// hour → start of the hour after lunch. Instants already inside
    /// working time are returned unchanged.
    pub fn snap_forward(&self, t: NaiveDateTime) -> NaiveDateTime {
        let hour = t.hour();
        if self.contains_hour(hour) {
            return t;
        }
        let day_open = |date: chrono::NaiveDate| {
            date.and_hms_opt(self.open, 0, 0)
                .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN))
        };
        if hour > self.close {
            day_open(t.date() + Duration::days(1))
        } else if hour < self.open {
            day_open(t.date())
        } else {
            // Lunch hour: push to the start of the next hour.
            t + Duration::minutes(60 - t.minute() as i64)
        }
    }
}

/// Walks a route's legs for one candidate departure, applying rest
/// rules and optional working-hours snapping.
#[derive(Debug, Clone, Default)]
pub struct ItineraryScheduler {
    rest_rules: RestRules,
    working_hours: Option<WorkingHours>,
}

impl ItineraryScheduler {
    /// Creates a scheduler with default rest rules and no
    /// working-hours restriction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rest-rule thresholds.
    pub fn with_rest_rules(mut self, rules: RestRules) -> Self {
        self.rest_rules = rules;
        self
    }

    /// Enables working-hours mode: window endpoints outside working
    /// time are snapped forward to the next valid hour.
    pub fn with_working_hours(mut self, hours: WorkingHours) -> Self {
        self.working_hours = Some(hours);
        self
    }

    /// Schedules the route for one candidate departure instant.
    ///
    /// Fails with `RouteIncomplete` when no leg departs the current
    /// location before the destination is reached, and with
    /// `MalformedRoute` when the walk exceeds `legs.len() * 2`
    /// iterations (cycle or unreachable destination) — the circuit
    /// breaker that keeps a broken graph from looping forever.
    pub fn schedule(
        &self,
        route: &Route,
        legs: &[Leg],
        departure: NaiveDateTime,
    ) -> Result<Itinerary> {
        let rules = &self.rest_rules;
        let mut entries = Vec::with_capacity(legs.len());

        let mut current = route.origin;
        let mut clock = departure;
        let mut drive_accum: i64 = 0;
        let mut duty_accum: i64 = 0;
        let mut elapsed: i64 = 0;
        let mut break_minutes: i64 = 0;

        let cap = legs.len() * 2;
        let mut steps = 0usize;

        while current != route.destination {
            steps += 1;
            if steps > cap {
                return Err(SimulationError::MalformedRoute {
                    route_id: route.id,
                    detail: format!("leg walk exceeded {cap} iterations without reaching {}",
                        route.destination),
                });
            }

            let leg = legs
                .iter()
                .find(|l| l.origin == current)
                .ok_or(SimulationError::RouteIncomplete {
                    route_id: route.id,
                    location: current,
                    destination: route.destination,
                })?;

            let window_start = clock;
            let transit = leg.transit_time_minutes;
            clock += Duration::minutes(transit);
            drive_accum += transit;
            duty_accum += transit;
            elapsed += transit;

            // Rest rules in priority order; both can fire on one leg.
            if drive_accum >= rules.drive_limit_minutes {
                clock += Duration::minutes(rules.short_break_minutes);
                duty_accum += rules.short_break_minutes;
                elapsed += rules.short_break_minutes;
                break_minutes += rules.short_break_minutes;
                drive_accum = 0;
            }
            if duty_accum >= rules.duty_limit_minutes {
                clock += Duration::minutes(rules.long_break_minutes);
                elapsed += rules.long_break_minutes;
                break_minutes += rules.long_break_minutes;
                drive_accum = 0;
                duty_accum = 0;
            }

            if let Some(hours) = &self.working_hours {
                let snapped = hours.snap_forward(clock);
                elapsed += (snapped - clock).num_minutes();
                clock = snapped;
            }

            entries.push(ItineraryEntry {
                origin: leg.origin,
                destination: leg.destination,
                departure: window_start,
                arrival: clock,
                drive_minutes: drive_accum,
                elapsed_minutes: elapsed,
            });
            current = leg.destination;
        }

        Ok(Itinerary {
            entries,
            break_minutes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn route(cities: &[u32]) -> Route {
        Route::new(
            1,
            cities.to_vec(),
            NaiveDate::from_ymd_opt(2020, 1, 15).unwrap(),
        )
    }

    fn at(hour: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, 15)
            .unwrap()
            .and_hms_opt(hour, min, 0)
            .unwrap()
    }

    #[test]
    fn test_short_break_after_long_leg() {
        // Two legs 400 and 200 minutes, threshold 330: a 30-minute
        // break lands after the first leg, so the first destination is
        // reached at 06:00 + 400 + 30 = 13:10.
        let route = route(&[1, 2, 3]);
        let legs = [Leg::new(1, 2, 400), Leg::new(2, 3, 200)];
        let scheduler = ItineraryScheduler::new();

        let itinerary = scheduler.schedule(&route, &legs, at(6, 0)).unwrap();
        assert_eq!(itinerary.leg_count(), 2);
        assert_eq!(itinerary.entries[0].departure, at(6, 0));
        assert_eq!(itinerary.entries[0].arrival, at(13, 10));
        assert_eq!(itinerary.break_minutes, 30);
        // Second leg stays under the threshold: no further break.
        assert_eq!(itinerary.entries[1].arrival, at(16, 30));
    }

    #[test]
    fn test_elapsed_equals_transit_plus_breaks() {
        let route = route(&[1, 2, 3, 4]);
        let legs = [Leg::new(1, 2, 400), Leg::new(2, 3, 350), Leg::new(3, 4, 90)];
        let scheduler = ItineraryScheduler::new();

        let itinerary = scheduler.schedule(&route, &legs, at(6, 0)).unwrap();
        let transit_total: i64 = legs.iter().map(|l| l.transit_time_minutes).sum();
        assert_eq!(
            itinerary.total_elapsed_minutes(),
            transit_total + itinerary.break_minutes
        );
    }

    #[test]
    fn test_both_rules_fire_on_one_leg() {
        // One 1500-minute leg exceeds both thresholds: a 30-minute
        // break then an 8-hour rest, on the same leg.
        let route = route(&[1, 2]);
        let legs = [Leg::new(1, 2, 1500)];
        let scheduler = ItineraryScheduler::new();

        let itinerary = scheduler.schedule(&route, &legs, at(0, 0)).unwrap();
        assert_eq!(itinerary.break_minutes, 30 + 480);
        assert_eq!(itinerary.total_elapsed_minutes(), 1500 + 510);
        // Both accumulators reset by the long rest.
        assert_eq!(itinerary.entries[0].drive_minutes, 0);
    }

    #[test]
    fn test_duty_rule_accumulates_across_legs() {
        // Five 300-minute legs. Short breaks fire on legs 2 and 4
        // (drive hits 600); duty reaches 1560 >= 1440 on leg 5 and the
        // 8-hour rest fires: 30 + 30 + 480 break minutes in total.
        let route = route(&[1, 2, 3, 4, 5, 6]);
        let legs = [
            Leg::new(1, 2, 300),
            Leg::new(2, 3, 300),
            Leg::new(3, 4, 300),
            Leg::new(4, 5, 300),
            Leg::new(5, 6, 300),
        ];
        let scheduler = ItineraryScheduler::new();

        let itinerary = scheduler.schedule(&route, &legs, at(0, 0)).unwrap();
        assert_eq!(itinerary.break_minutes, 540);
        // Long rest reset both accumulators on the final leg.
        let last = itinerary.entries.last().unwrap();
        assert_eq!(last.drive_minutes, 0);
    }

    #[test]
    fn test_route_incomplete() {
        let route = route(&[1, 2, 3]);
        // No leg departs city 2.
        let legs = [Leg::new(1, 2, 100)];
        let scheduler = ItineraryScheduler::new();

        let err = scheduler.schedule(&route, &legs, at(8, 0)).unwrap_err();
        assert_eq!(
            err,
            SimulationError::RouteIncomplete {
                route_id: 1,
                location: 2,
                destination: 3,
            }
        );
    }

    #[test]
    fn test_cycle_trips_circuit_breaker() {
        let route = route(&[1, 2, 3]);
        // 1 → 2 → 1 never reaches 3.
        let legs = [Leg::new(1, 2, 60), Leg::new(2, 1, 60)];
        let scheduler = ItineraryScheduler::new();

        let err = scheduler.schedule(&route, &legs, at(8, 0)).unwrap_err();
        assert!(matches!(err, SimulationError::MalformedRoute { .. }));
    }

    #[test]
    fn test_deterministic_windows() {
        let route = route(&[1, 2, 3]);
        let legs = [Leg::new(1, 2, 400), Leg::new(2, 3, 200)];
        let scheduler = ItineraryScheduler::new();

        let first = scheduler.schedule(&route, &legs, at(6, 0)).unwrap();
        let second = scheduler.schedule(&route, &legs, at(6, 0)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_snap_past_close_to_next_day_open() {
        let hours = WorkingHours::default();
        // 19:45 → next day 08:00, minutes zeroed.
        assert_eq!(hours.snap_forward(at(19, 45)), {
            NaiveDate::from_ymd_opt(2020, 1, 16)
                .unwrap()
                .and_hms_opt(8, 0, 0)
                .unwrap()
        });
    }

    #[test]
    fn test_snap_before_open_to_same_day_open() {
        let hours = WorkingHours::default();
        assert_eq!(hours.snap_forward(at(6, 30)), at(8, 0));
    }

    #[test]
    fn test_snap_lunch_to_next_hour() {
        let hours = WorkingHours::default();
        assert_eq!(hours.snap_forward(at(12, 20)), at(13, 0));
        assert_eq!(hours.snap_forward(at(12, 0)), at(13, 0));
    }

    #[test]
    fn test_working_time_unchanged() {
        let hours = WorkingHours::default();
        assert_eq!(hours.snap_forward(at(10, 17)), at(10, 17));
        assert_eq!(hours.snap_forward(at(18, 59)), at(18, 59));
    }

    #[test]
    fn test_departure_hours_skip_lunch() {
        let hours = WorkingHours::default();
        let candidates = hours.departure_hours();
        assert_eq!(candidates.first(), Some(&8));
        assert_eq!(candidates.last(), Some(&18));
        assert!(!candidates.contains(&12));
        assert_eq!(candidates.len(), 10);
    }

    #[test]
    fn test_working_hours_snapping_in_schedule() {
        // 08:00 + 200 minutes = 11:20 (working time, kept);
        // 11:20 + 70 minutes = 12:30 (lunch) → snapped to 13:00.
        let route = route(&[1, 2, 3]);
        let legs = [Leg::new(1, 2, 200), Leg::new(2, 3, 70)];
        let scheduler = ItineraryScheduler::new().with_working_hours(WorkingHours::default());

        let itinerary = scheduler.schedule(&route, &legs, at(8, 0)).unwrap();
        assert_eq!(itinerary.entries[0].arrival, at(11, 20));
        assert_eq!(itinerary.entries[1].arrival, at(13, 0));
        // Snap waiting counts toward elapsed time.
        assert_eq!(itinerary.total_elapsed_minutes(), 200 + 70 + 30);
    }
}
