//! Historical-window extraction.
//!
//! Maps an itinerary window back onto multi-year climate records. The
//! match ignores year entirely: an observation belongs to a window if
//! its month, day, and hour-of-day each fall independently inside the
//! corresponding field range of the window endpoints.
//!
//! # Known limitation
//!
//! Field-by-field range composition is only correct for windows that
//! do not wrap a day, month, or hour-of-day boundary (e.g. 23:00 to
//! 01:00, or late December into January). Such windows produce empty
//! or truncated pools. Preserved deliberately from the source system
//! rather than silently replaced with true calendar-interval math.

use chrono::NaiveDateTime;
use tracing::debug;

use crate::error::Result;
use crate::models::{CalendarPosition, LocationId, Measure};
use crate::store::WeatherStore;

/// Pooled historical values for one (location, hour-of-day) bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyPool {
    /// City the pool belongs to.
    pub location_id: LocationId,
    /// Hour-of-day bucket, 0–23.
    pub hour: u32,
    /// Pooled temperature samples (current + extrema).
    pub temperature: Vec<f64>,
    /// Pooled humidity samples (current + extrema).
    pub humidity: Vec<f64>,
}

impl HourlyPool {
    /// Pooled values for one measure.
    pub fn values(&self, measure: Measure) -> &[f64] {
        match measure {
            Measure::Temperature => &self.temperature,
            Measure::Humidity => &self.humidity,
        }
    }

    /// Whether the bucket has no observations at all.
    pub fn is_empty(&self) -> bool {
        self.temperature.is_empty() && self.humidity.is_empty()
    }
}

/// Pools historical observations per hour bucket for one window.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClimateWindowExtractor;

impl ClimateWindowExtractor {
    /// Creates an extractor.
    pub fn new() -> Self {
        Self
    }

    /// Pools every observation whose calendar position falls inside
    /// the window, grouped by hour-of-day.
    ///
    /// Returns one pool per hour in `[start.hour, end.hour]`, in hour
    /// order; pools may be empty when the store has gaps. Current,
    /// max, and min readings of the same measure are pooled as
    /// independent samples to enlarge the fitted dataset.
    pub fn extract(
        &self,
        location: LocationId,
        window_start: NaiveDateTime,
        window_end: NaiveDateTime,
        store: &dyn WeatherStore,
    ) -> Result<Vec<HourlyPool>> {
        let start = CalendarPosition::from(window_start);
        let end = CalendarPosition::from(window_end);

        if end.hour < start.hour || end.month < start.month
            || (end.month == start.month && end.day < start.day)
        {
            debug!(
                location,
                start = %window_start,
                end = %window_end,
                "window wraps a calendar boundary; field-range matching yields no pools"
            );
            return Ok(Vec::new());
        }

        let observations =
            store.by_calendar_range(location, start.month..=end.month, start.day..=end.day)?;

        let pools = (start.hour..=end.hour)
            .map(|hour| {
                let mut pool = HourlyPool {
                    location_id: location,
                    hour,
                    temperature: Vec::new(),
                    humidity: Vec::new(),
                };
                for obs in observations.iter().filter(|o| o.hour == hour) {
                    pool.temperature.extend(obs.readings(Measure::Temperature));
                    pool.humidity.extend(obs.readings(Measure::Humidity));
                }
                pool
            })
            .collect();

        Ok(pools)
    }
}
