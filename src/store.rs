//! Store contracts and in-memory reference implementations.
//!
//! The engine consumes historical weather and route reference data
//! through read-only traits and writes its outputs through a store
//! whose only update pattern is **replace scope by key**: delete every
//! row under a (route, departure) key, then bulk-append the new rows.
//! Never an in-place row update — the overwrite pattern is what makes
//! re-running a departure time idempotent and retry-safe, and the
//! (route, departure) key is the natural concurrency boundary.
//!
//! Persistence technology behind these traits is out of scope; the
//! in-memory implementations serve tests and embedding.

use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::sync::Mutex;

use chrono::NaiveDateTime;

use crate::error::{Result, SimulationError};
use crate::models::{
    DistributionFit, HistoricalObservation, Leg, LocationId, Route, RouteId, Scenario,
};

/// Read-only access to historical hourly climate observations.
pub trait WeatherStore: Send + Sync {
    /// Observations for a location whose month and day fall inside the
    /// given inclusive ranges, any year, any hour.
    fn by_calendar_range(
        &self,
        location: LocationId,
        months: RangeInclusive<u32>,
        days: RangeInclusive<u32>,
    ) -> Result<Vec<HistoricalObservation>>;

    /// Observations for a location whose hour-of-day falls inside the
    /// given inclusive range, any date.
    fn by_hour_range(
        &self,
        location: LocationId,
        hours: RangeInclusive<u32>,
    ) -> Result<Vec<HistoricalObservation>>;
}

/// Read-only access to route reference data.
pub trait RouteStore: Send + Sync {
    /// The route under this id.
    fn route(&self, route_id: RouteId) -> Result<Route>;

    /// The route's legs, ordered origin to destination.
    fn legs(&self, route_id: RouteId) -> Result<Vec<Leg>>;
}

/// Write access for simulation outputs.
///
/// Both operations replace the full scope under (route, departure):
/// two workers must never hold the same key, but distinct keys are
/// fully independent.
pub trait SimulationStore: Send + Sync {
    /// Replaces every distribution row under (route, departure).
    fn replace_distributions(
        &self,
        route_id: RouteId,
        departure: NaiveDateTime,
        rows: Vec<DistributionFit>,
    ) -> Result<()>;

    /// Replaces every scenario row under (route, departure).
    fn replace_scenarios(
        &self,
        route_id: RouteId,
        departure: NaiveDateTime,
        rows: Vec<Scenario>,
    ) -> Result<()>;
}

/// In-memory weather store backed by per-location vectors.
#[derive(Debug, Default)]
pub struct MemoryWeatherStore {
    by_location: HashMap<LocationId, Vec<HistoricalObservation>>,
}

impl MemoryWeatherStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one observation.
    pub fn insert(&mut self, observation: HistoricalObservation) {
        self.by_location
            .entry(observation.location_id)
            .or_default()
            .push(observation);
    }

    /// Appends many observations.
    pub fn extend(&mut self, observations: impl IntoIterator<Item = HistoricalObservation>) {
        for obs in observations {
            self.insert(obs);
        }
    }

    fn filtered(
        &self,
        location: LocationId,
        keep: impl Fn(&HistoricalObservation) -> bool,
    ) -> Vec<HistoricalObservation> {
        self.by_location
            .get(&location)
            .map(|rows| rows.iter().filter(|o| keep(o)).cloned().collect())
            .unwrap_or_default()
    }
}

impl WeatherStore for MemoryWeatherStore {
    fn by_calendar_range(
        &self,
        location: LocationId,
        months: RangeInclusive<u32>,
        days: RangeInclusive<u32>,
    ) -> Result<Vec<HistoricalObservation>> {
        Ok(self.filtered(location, |o| {
            months.contains(&o.month) && days.contains(&o.day)
        }))
    }

    fn by_hour_range(
        &self,
        location: LocationId,
        hours: RangeInclusive<u32>,
    ) -> Result<Vec<HistoricalObservation>> {
        Ok(self.filtered(location, |o| hours.contains(&o.hour)))
    }
}

/// In-memory route store.
#[derive(Debug, Default)]
pub struct MemoryRouteStore {
    routes: HashMap<RouteId, Route>,
    legs: HashMap<RouteId, Vec<Leg>>,
}

impl MemoryRouteStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a route and its legs.
    pub fn insert(&mut self, route: Route, legs: Vec<Leg>) {
        self.legs.insert(route.id, legs);
        self.routes.insert(route.id, route);
    }
}

impl RouteStore for MemoryRouteStore {
    fn route(&self, route_id: RouteId) -> Result<Route> {
        self.routes
            .get(&route_id)
            .cloned()
            .ok_or(SimulationError::RouteNotFound(route_id))
    }

    fn legs(&self, route_id: RouteId) -> Result<Vec<Leg>> {
        Ok(self.legs.get(&route_id).cloned().unwrap_or_default())
    }
}

type UnitKey = (RouteId, NaiveDateTime);

/// In-memory simulation output store.
///
/// Interior mutability lets parallel workers write distinct
/// (route, departure) scopes through a shared reference.
#[derive(Debug, Default)]
pub struct MemorySimulationStore {
    distributions: Mutex<HashMap<UnitKey, Vec<DistributionFit>>>,
    scenarios: Mutex<HashMap<UnitKey, Vec<Scenario>>>,
}

impl MemorySimulationStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Distribution rows stored under (route, departure).
    pub fn distributions_for(
        &self,
        route_id: RouteId,
        departure: NaiveDateTime,
    ) -> Vec<DistributionFit> {
        self.distributions
            .lock()
            .map(|m| m.get(&(route_id, departure)).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Scenario rows stored under (route, departure).
    pub fn scenarios_for(&self, route_id: RouteId, departure: NaiveDateTime) -> Vec<Scenario> {
        self.scenarios
            .lock()
            .map(|m| m.get(&(route_id, departure)).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Total scenario rows across every stored key.
    pub fn scenario_count(&self) -> usize {
        self.scenarios
            .lock()
            .map(|m| m.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

impl SimulationStore for MemorySimulationStore {
    fn replace_distributions(
        &self,
        route_id: RouteId,
        departure: NaiveDateTime,
        rows: Vec<DistributionFit>,
    ) -> Result<()> {
        let mut map = self
            .distributions
            .lock()
            .map_err(|e| SimulationError::Store(e.to_string()))?;
        map.insert((route_id, departure), rows);
        Ok(())
    }

    fn replace_scenarios(
        &self,
        route_id: RouteId,
        departure: NaiveDateTime,
        rows: Vec<Scenario>,
    ) -> Result<()> {
        let mut map = self
            .scenarios
            .lock()
            .map_err(|e| SimulationError::Store(e.to_string()))?;
        map.insert((route_id, departure), rows);
        Ok(())
    }
}
