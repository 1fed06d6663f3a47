//! Simulation orchestration.
//!
//! `simulate()` evaluates every candidate departure time for one
//! route: schedule the itinerary, pool historical climate per visited
//! city and hour, fit distributions, draw synthetic scenarios, score
//! them, and replace the persisted rows for that (route, departure)
//! key.
//!
//! # Concurrency
//!
//! Departure times are independent units sharing no mutable state
//! except the output store, which is written with replace-by-key
//! semantics — so units run in parallel via rayon. Parallelism is an
//! optimization, not a correctness requirement. Cancellation is
//! per-unit: a cancelled token stops new units from starting but never
//! tears a unit mid-write.
//!
//! # Failure policy
//!
//! Per-unit errors (incomplete route, unfittable bucket, missing data,
//! unsupported persisted distribution) are logged with identifying
//! keys and excluded from output. Structural errors (unknown route,
//! empty leg list, cyclic leg graph, store failures) propagate.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{NaiveDateTime, Timelike};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::aggregate::ScenarioAggregator;
use crate::climate::ClimateWindowExtractor;
use crate::error::{Result, SimulationError};
use crate::fit::{BinningMode, DistributionFitter};
use crate::fuzzy::ClimateScorer;
use crate::models::{
    DepartureSummary, DistributionFit, Leg, Measure, Route, RouteId, Scenario,
};
use crate::montecarlo::{MonteCarloSampler, SIZE};
use crate::scheduler::{ItineraryScheduler, RestRules, WorkingHours};
use crate::store::{RouteStore, SimulationStore, WeatherStore};

/// Cooperative cancellation flag, checked at per-unit granularity.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a live token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation; units not yet started are skipped.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Configuration for one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationRequest {
    /// Restrict departures and snap windows to business hours.
    pub respect_working_hours: bool,
    /// Business-hours definition used when the restriction is on.
    pub working_hours: WorkingHours,
    /// Driver rest-rule thresholds.
    pub rest_rules: RestRules,
    /// Histogram policy for distribution fitting.
    pub binning: BinningMode,
    /// Synthetic draws per (location, hour, measure); the same size is
    /// used for every measure so scenario rows pair up positionally.
    pub sample_size: usize,
    /// Seed for reproducible runs. `None` = entropy-seeded.
    pub seed: Option<u64>,
    /// Cooperative cancellation flag.
    pub cancellation: CancellationToken,
}

impl Default for SimulationRequest {
    fn default() -> Self {
        Self {
            respect_working_hours: true,
            working_hours: WorkingHours::default(),
            rest_rules: RestRules::default(),
            binning: BinningMode::default(),
            sample_size: SIZE,
            seed: None,
            cancellation: CancellationToken::new(),
        }
    }
}

impl SimulationRequest {
    /// Creates a request with defaults: working hours respected,
    /// standard rest rules, 200-bin histograms, 1000 draws.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables the business-hours restriction.
    pub fn with_working_hours_mode(mut self, respect: bool) -> Self {
        self.respect_working_hours = respect;
        self
    }

    /// Sets the business-hours definition.
    pub fn with_working_hours(mut self, hours: WorkingHours) -> Self {
        self.working_hours = hours;
        self
    }

    /// Sets the rest-rule thresholds.
    pub fn with_rest_rules(mut self, rules: RestRules) -> Self {
        self.rest_rules = rules;
        self
    }

    /// Sets the histogram binning policy.
    pub fn with_binning(mut self, binning: BinningMode) -> Self {
        self.binning = binning;
        self
    }

    /// Sets the per-bucket sample count.
    pub fn with_sample_size(mut self, size: usize) -> Self {
        self.sample_size = size;
        self
    }

    /// Seeds the run for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Attaches an external cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}

/// Outcome of one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Route that was simulated.
    pub route_id: RouteId,
    /// Per-departure summaries, in departure order (completed units
    /// only).
    pub summaries: Vec<DepartureSummary>,
    /// Units skipped by per-unit errors.
    pub skipped: usize,
    /// Units skipped by cancellation.
    pub cancelled: usize,
}

impl SimulationReport {
    /// The departure with the best mean score, if any unit completed
    /// with scenarios.
    pub fn best_departure(&self) -> Option<&DepartureSummary> {
        self.summaries
            .iter()
            .filter(|s| s.scenario_count > 0)
            .max_by(|a, b| a.mean_score.total_cmp(&b.mean_score))
    }
}

enum UnitOutcome {
    Completed(DepartureSummary),
    Skipped,
    Cancelled,
}

/// Simulates every candidate departure time for one route.
///
/// Candidate departures are each hour of the route's start date,
/// restricted to working hours (lunch excluded) when the request says
/// so. Returns a per-departure summary report; full fit and scenario
/// rows land in `outputs` under their (route, departure) keys.
pub fn simulate(
    route_id: RouteId,
    request: &SimulationRequest,
    routes: &dyn RouteStore,
    weather: &dyn WeatherStore,
    outputs: &dyn SimulationStore,
    scorer: &dyn ClimateScorer,
) -> Result<SimulationReport> {
    let route = routes.route(route_id)?;
    let legs = routes.legs(route_id)?;
    if legs.is_empty() {
        return Err(SimulationError::EmptyRoute(route_id));
    }

    let mut scheduler = ItineraryScheduler::new().with_rest_rules(request.rest_rules);
    if request.respect_working_hours {
        scheduler = scheduler.with_working_hours(request.working_hours);
    }

    let hours: Vec<u32> = if request.respect_working_hours {
        request.working_hours.departure_hours()
    } else {
        (0..24).collect()
    };
    let departures: Vec<NaiveDateTime> = hours
        .into_iter()
        .filter_map(|h| route.start_date.and_hms_opt(h, 0, 0))
        .collect();

    info!(
        route_id,
        start_date = %route.start_date,
        candidates = departures.len(),
        "simulating candidate departure times"
    );

    let unit = Unit {
        route: &route,
        legs: &legs,
        request,
        scheduler: &scheduler,
        weather,
        outputs,
        scorer,
    };

    let results: Vec<Result<UnitOutcome>> = departures
        .par_iter()
        .map(|&departure| unit.run(departure))
        .collect();

    let mut report = SimulationReport {
        route_id,
        summaries: Vec::new(),
        skipped: 0,
        cancelled: 0,
    };
    for result in results {
        match result? {
            UnitOutcome::Completed(summary) => report.summaries.push(summary),
            UnitOutcome::Skipped => report.skipped += 1,
            UnitOutcome::Cancelled => report.cancelled += 1,
        }
    }
    Ok(report)
}

/// Shared context for one (route, departure) unit of work.
struct Unit<'a> {
    route: &'a Route,
    legs: &'a [Leg],
    request: &'a SimulationRequest,
    scheduler: &'a ItineraryScheduler,
    weather: &'a dyn WeatherStore,
    outputs: &'a dyn SimulationStore,
    scorer: &'a dyn ClimateScorer,
}

impl Unit<'_> {
    fn run(&self, departure: NaiveDateTime) -> Result<UnitOutcome> {
        let route_id = self.route.id;
        if self.request.cancellation.is_cancelled() {
            info!(route_id, departure = %departure, "unit cancelled before start");
            return Ok(UnitOutcome::Cancelled);
        }
        info!(route_id, departure = %departure, "simulating departure");

        let itinerary = match self.scheduler.schedule(self.route, self.legs, departure) {
            Ok(itinerary) => itinerary,
            Err(err @ SimulationError::RouteIncomplete { .. }) => {
                warn!(route_id, departure = %departure, %err, "itinerary failed, unit skipped");
                return Ok(UnitOutcome::Skipped);
            }
            Err(err) => return Err(err),
        };

        let extractor = ClimateWindowExtractor::new();
        let fitter = DistributionFitter::new().with_binning(self.request.binning);
        let sampler = MonteCarloSampler::new();
        let aggregator = ScenarioAggregator::new();
        let mut rng = self.unit_rng(departure);

        let mut fits: Vec<DistributionFit> = Vec::new();
        let mut scenarios: Vec<Scenario> = Vec::new();

        for entry in &itinerary.entries {
            let pools = extractor.extract(entry.origin, entry.departure, entry.arrival, self.weather)?;
            for pool in pools {
                let location = pool.location_id;
                let hour = pool.hour;
                if pool.is_empty() {
                    let err = SimulationError::MissingHistoricalData { location, hour };
                    warn!(route_id, departure = %departure, location, hour, %err, "bucket skipped");
                    continue;
                }

                let mut bucket_fits = Vec::with_capacity(2);
                let mut fit_failed = false;
                for measure in [Measure::Temperature, Measure::Humidity] {
                    match fitter.fit(pool.values(measure)) {
                        Ok(selected) => {
                            bucket_fits.push(DistributionFit::from_distribution(
                                route_id,
                                departure,
                                location,
                                hour,
                                measure,
                                &selected.distribution,
                            ));
                        }
                        Err(err) if err.is_per_unit() => {
                            warn!(
                                route_id,
                                departure = %departure,
                                location,
                                hour,
                                measure = measure.label(),
                                %err,
                                "no distribution fitted, bucket measure skipped"
                            );
                            fit_failed = true;
                        }
                        Err(err) => return Err(err),
                    }
                }
                // Fitted measures are persisted even when the sibling
                // measure failed; scenarios need both columns.
                let both_fitted = !fit_failed && bucket_fits.len() == 2;
                let mut columns = Vec::with_capacity(2);
                for fit in &bucket_fits {
                    if both_fitted {
                        match fit.decode() {
                            Ok(distribution) => columns.push(sampler.sample(
                                &distribution,
                                &mut rng,
                                self.request.sample_size,
                            )),
                            Err(err) => {
                                warn!(
                                    route_id,
                                    departure = %departure,
                                    location,
                                    hour,
                                    measure = fit.measure.label(),
                                    %err,
                                    "sampling skipped"
                                );
                            }
                        }
                    }
                }
                if let [temperatures, humidities] = columns.as_slice() {
                    scenarios.extend(aggregator.aggregate(
                        route_id,
                        departure,
                        location,
                        hour,
                        temperatures,
                        humidities,
                        self.scorer,
                    ));
                }
                fits.extend(bucket_fits);
            }
        }

        // Replace the whole (route, departure) scope in one pass:
        // the idempotent overwrite that makes re-runs safe.
        self.outputs.replace_distributions(route_id, departure, fits)?;
        let summary = summarize(departure, &scenarios);
        self.outputs.replace_scenarios(route_id, departure, scenarios)?;

        Ok(UnitOutcome::Completed(summary))
    }

    /// Per-unit RNG: seeded runs derive a distinct stream per
    /// departure so units stay reproducible under parallel execution.
    fn unit_rng(&self, departure: NaiveDateTime) -> SmallRng {
        match self.request.seed {
            Some(seed) => {
                let salt = departure.and_utc().timestamp() as u64 ^ (departure.hour() as u64) << 32;
                SmallRng::seed_from_u64(seed ^ salt)
            }
            None => SmallRng::from_os_rng(),
        }
    }
}

fn summarize(departure: NaiveDateTime, scenarios: &[Scenario]) -> DepartureSummary {
    if scenarios.is_empty() {
        return DepartureSummary {
            departure,
            scenario_count: 0,
            mean_score: 0.0,
            min_score: 0.0,
        };
    }
    let sum: f64 = scenarios.iter().map(|s| s.score).sum();
    let min = scenarios
        .iter()
        .map(|s| s.score)
        .fold(f64::INFINITY, f64::min);
    DepartureSummary {
        departure,
        scenario_count: scenarios.len(),
        mean_score: sum / scenarios.len() as f64,
        min_score: min,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::FuzzyScorer;
    use crate::models::HistoricalObservation;
    use crate::store::{MemoryRouteStore, MemorySimulationStore, MemoryWeatherStore};
    use chrono::NaiveDate;

    const MONTH: u32 = 6;
    const DAY: u32 = 10;

    fn start_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, MONTH, DAY).unwrap()
    }

    fn obs(location: u32, day: u32, hour: u32, jitter: f64) -> HistoricalObservation {
        let temp = 15.0 + hour as f64 * 0.4 + jitter;
        let humid = 55.0 + jitter * 3.0;
        HistoricalObservation {
            location_id: location,
            month: MONTH,
            day,
            hour,
            temperature: Some(temp),
            t_max: Some(temp + 2.0),
            t_min: Some(temp - 2.0),
            humidity: Some(humid),
            u_max: Some(humid + 5.0),
            u_min: Some(humid - 5.0),
        }
    }

    /// Three synthetic years of hourly data for the given locations,
    /// covering the start day and the next.
    fn weather(locations: &[u32]) -> MemoryWeatherStore {
        let mut store = MemoryWeatherStore::new();
        for &location in locations {
            for day in [DAY, DAY + 1] {
                for hour in 0..24 {
                    for jitter in [-1.5, 0.0, 1.5] {
                        store.insert(obs(location, day, hour, jitter));
                    }
                }
            }
        }
        store
    }

    fn routes() -> MemoryRouteStore {
        let mut store = MemoryRouteStore::new();
        store.insert(
            Route::new(1, vec![1, 2, 3], start_date()),
            vec![Leg::new(1, 2, 120), Leg::new(2, 3, 90)],
        );
        store
    }

    fn request() -> SimulationRequest {
        SimulationRequest::new()
            .with_seed(42)
            .with_sample_size(100)
            .with_binning(BinningMode::Sparse)
    }

    #[test]
    fn test_end_to_end_working_hours() {
        let routes = routes();
        let weather = weather(&[1, 2]);
        let outputs = MemorySimulationStore::new();

        let report =
            simulate(1, &request(), &routes, &weather, &outputs, &FuzzyScorer).unwrap();

        // 10 working-hour departures (8..=18 minus lunch), none skipped.
        assert_eq!(report.summaries.len(), 10);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.cancelled, 0);

        // Departure 08:00: leg 1 window [08:00, 10:00] → hours 8..=10
        // at city 1; leg 2 window [10:00, 11:30] → hours 10..=11 at
        // city 2. Five buckets, each with both measures fitted.
        let dep = start_date().and_hms_opt(8, 0, 0).unwrap();
        assert_eq!(outputs.distributions_for(1, dep).len(), 10);
        assert_eq!(outputs.scenarios_for(1, dep).len(), 5 * 100);

        let summary = report
            .summaries
            .iter()
            .find(|s| s.departure == dep)
            .unwrap();
        assert_eq!(summary.scenario_count, 500);
        assert!(summary.mean_score > 0.0 && summary.mean_score <= 10.0);
        assert!(report.best_departure().is_some());
    }

    #[test]
    fn test_scenario_values_are_clamped() {
        let routes = routes();
        let weather = weather(&[1, 2]);
        let outputs = MemorySimulationStore::new();

        simulate(1, &request(), &routes, &weather, &outputs, &FuzzyScorer).unwrap();

        let dep = start_date().and_hms_opt(8, 0, 0).unwrap();
        for row in outputs.scenarios_for(1, dep) {
            assert!((0.0..=40.0).contains(&row.temperature));
            assert!((0.0..=100.0).contains(&row.humidity));
        }
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let routes = routes();
        let weather = weather(&[1, 2]);
        let outputs = MemorySimulationStore::new();
        let dep = start_date().and_hms_opt(9, 0, 0).unwrap();

        simulate(1, &request(), &routes, &weather, &outputs, &FuzzyScorer).unwrap();
        let first: Vec<(u32, u32, u32)> = outputs
            .scenarios_for(1, dep)
            .iter()
            .map(|s| (s.location_id, s.hour, s.scenario_index))
            .collect();

        simulate(1, &request(), &routes, &weather, &outputs, &FuzzyScorer).unwrap();
        let second: Vec<(u32, u32, u32)> = outputs
            .scenarios_for(1, dep)
            .iter()
            .map(|s| (s.location_id, s.hour, s.scenario_index))
            .collect();

        // Same row count and keys; values may differ only by sampling.
        assert_eq!(first, second);
    }

    #[test]
    fn test_seeded_runs_reproduce_values() {
        let routes = routes();
        let weather = weather(&[1, 2]);
        let dep = start_date().and_hms_opt(10, 0, 0).unwrap();

        let outputs_a = MemorySimulationStore::new();
        let outputs_b = MemorySimulationStore::new();
        simulate(1, &request(), &routes, &weather, &outputs_a, &FuzzyScorer).unwrap();
        simulate(1, &request(), &routes, &weather, &outputs_b, &FuzzyScorer).unwrap();

        assert_eq!(outputs_a.scenarios_for(1, dep), outputs_b.scenarios_for(1, dep));
    }

    #[test]
    fn test_zero_variance_buckets_are_excluded_not_fatal() {
        let mut weather = MemoryWeatherStore::new();
        // Constant readings: every family rejects the pool.
        for hour in 0..24 {
            let obs = HistoricalObservation {
                location_id: 1,
                month: MONTH,
                day: DAY,
                hour,
                temperature: Some(10.0),
                t_max: Some(10.0),
                t_min: Some(10.0),
                humidity: Some(50.0),
                u_max: Some(50.0),
                u_min: Some(50.0),
            };
            weather.insert(obs);
        }
        let mut routes = MemoryRouteStore::new();
        routes.insert(
            Route::new(1, vec![1, 2], start_date()),
            vec![Leg::new(1, 2, 60)],
        );
        let outputs = MemorySimulationStore::new();

        let report =
            simulate(1, &request(), &routes, &weather, &outputs, &FuzzyScorer).unwrap();
        // Units complete; buckets are simply absent from the outputs.
        assert_eq!(report.summaries.len(), 10);
        assert_eq!(outputs.scenario_count(), 0);
        let dep = start_date().and_hms_opt(8, 0, 0).unwrap();
        assert!(outputs.distributions_for(1, dep).is_empty());
    }

    #[test]
    fn test_missing_location_data_skips_its_buckets() {
        let routes = routes();
        // Only city 1 has climate data; city 2's buckets are skipped.
        let weather = weather(&[1]);
        let outputs = MemorySimulationStore::new();

        let report =
            simulate(1, &request(), &routes, &weather, &outputs, &FuzzyScorer).unwrap();
        assert_eq!(report.summaries.len(), 10);

        let dep = start_date().and_hms_opt(8, 0, 0).unwrap();
        let rows = outputs.scenarios_for(1, dep);
        assert!(!rows.is_empty());
        assert!(rows.iter().all(|s| s.location_id == 1));
    }

    #[test]
    fn test_incomplete_route_skips_units() {
        let mut routes = MemoryRouteStore::new();
        // City 2 has no outgoing leg, destination 3 unreachable.
        routes.insert(
            Route::new(1, vec![1, 2, 3], start_date()),
            vec![Leg::new(1, 2, 120)],
        );
        let weather = weather(&[1, 2]);
        let outputs = MemorySimulationStore::new();

        let report =
            simulate(1, &request(), &routes, &weather, &outputs, &FuzzyScorer).unwrap();
        assert_eq!(report.summaries.len(), 0);
        assert_eq!(report.skipped, 10);
    }

    #[test]
    fn test_cyclic_route_is_fatal() {
        let mut routes = MemoryRouteStore::new();
        routes.insert(
            Route::new(1, vec![1, 2, 3], start_date()),
            vec![Leg::new(1, 2, 60), Leg::new(2, 1, 60)],
        );
        let weather = weather(&[1, 2]);
        let outputs = MemorySimulationStore::new();

        let err =
            simulate(1, &request(), &routes, &weather, &outputs, &FuzzyScorer).unwrap_err();
        assert!(matches!(err, SimulationError::MalformedRoute { .. }));
    }

    #[test]
    fn test_unknown_route_is_fatal() {
        let routes = MemoryRouteStore::new();
        let weather = MemoryWeatherStore::new();
        let outputs = MemorySimulationStore::new();

        let err =
            simulate(9, &request(), &routes, &weather, &outputs, &FuzzyScorer).unwrap_err();
        assert_eq!(err, SimulationError::RouteNotFound(9));
    }

    #[test]
    fn test_cancellation_skips_all_units() {
        let routes = routes();
        let weather = weather(&[1, 2]);
        let outputs = MemorySimulationStore::new();

        let token = CancellationToken::new();
        token.cancel();
        let request = request().with_cancellation(token);

        let report = simulate(1, &request, &routes, &weather, &outputs, &FuzzyScorer).unwrap();
        assert_eq!(report.summaries.len(), 0);
        assert_eq!(report.cancelled, 10);
        assert_eq!(outputs.scenario_count(), 0);
    }

    #[test]
    fn test_free_running_mode_uses_all_hours() {
        let routes = routes();
        let weather = weather(&[1, 2]);
        let outputs = MemorySimulationStore::new();
        let request = request().with_working_hours_mode(false);

        let report = simulate(1, &request, &routes, &weather, &outputs, &FuzzyScorer).unwrap();
        // 24 candidate departures; late ones may produce empty buckets
        // (midnight wrap) but every unit completes.
        assert_eq!(report.summaries.len() + report.skipped, 24);
    }
}
