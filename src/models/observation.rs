//! Historical climate observations and calendar positions.
//!
//! Observations are keyed by calendar position (month/day/hour), never
//! by year: the simulation reasons only about where in the calendar a
//! transit window falls, pooling every recorded year of data for that
//! position.

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use super::LocationId;

/// A measured climate variable.
///
/// Carries the admissible range used to clamp Monte Carlo output
/// before scoring (values outside range are clipped, not rejected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure {
    /// Air temperature, admissible range 0–40 °C.
    Temperature,
    /// Relative humidity, admissible range 0–100 %.
    Humidity,
}

impl Measure {
    /// Admissible (lower, upper) bounds for this measure.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            Measure::Temperature => (0.0, 40.0),
            Measure::Humidity => (0.0, 100.0),
        }
    }

    /// Clips a value into the admissible range.
    pub fn clamp(&self, value: f64) -> f64 {
        let (lo, hi) = self.bounds();
        value.clamp(lo, hi)
    }

    /// Stable label used in persisted rows and logs.
    pub fn label(&self) -> &'static str {
        match self {
            Measure::Temperature => "temperature",
            Measure::Humidity => "humidity",
        }
    }
}

/// A year-agnostic calendar coordinate: (month, day, hour-of-day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarPosition {
    /// Month, 1–12.
    pub month: u32,
    /// Day of month, 1–31.
    pub day: u32,
    /// Hour of day, 0–23.
    pub hour: u32,
}

impl CalendarPosition {
    /// Creates a calendar position.
    pub fn new(month: u32, day: u32, hour: u32) -> Self {
        Self { month, day, hour }
    }
}

impl From<NaiveDateTime> for CalendarPosition {
    fn from(t: NaiveDateTime) -> Self {
        Self {
            month: t.month(),
            day: t.day(),
            hour: t.hour(),
        }
    }
}

/// One hourly reading from a weather station near a route city.
///
/// Append-only fact: the engine only reads these. Each field may be
/// missing — raw station archives have gaps — and missing readings are
/// skipped during pooling, never zero-filled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalObservation {
    /// City the station is mapped to.
    pub location_id: LocationId,
    /// Month of the reading, 1–12.
    pub month: u32,
    /// Day of month, 1–31.
    pub day: u32,
    /// Hour of day, 0–23.
    pub hour: u32,
    /// Instantaneous temperature (°C).
    pub temperature: Option<f64>,
    /// Maximum temperature over the hour (°C).
    pub t_max: Option<f64>,
    /// Minimum temperature over the hour (°C).
    pub t_min: Option<f64>,
    /// Instantaneous relative humidity (%).
    pub humidity: Option<f64>,
    /// Maximum humidity over the hour (%).
    pub u_max: Option<f64>,
    /// Minimum humidity over the hour (%).
    pub u_min: Option<f64>,
}

impl HistoricalObservation {
    /// Calendar position of this reading.
    pub fn position(&self) -> CalendarPosition {
        CalendarPosition::new(self.month, self.day, self.hour)
    }

    /// Present readings for one measure, extrema included.
    ///
    /// Current, max, and min values are pooled as independent samples:
    /// the daily extrema count as additional, weaker evidence of the
    /// variable's distribution at that hour. Documented statistical
    /// choice carried over from the source system.
    pub fn readings(&self, measure: Measure) -> impl Iterator<Item = f64> + '_ {
        let triple = match measure {
            Measure::Temperature => [self.temperature, self.t_max, self.t_min],
            Measure::Humidity => [self.humidity, self.u_max, self.u_min],
        };
        triple.into_iter().flatten()
    }
}
