//! Histogram-based model selection.
//!
//! The empirical density is a normalized histogram of the pooled
//! values; each candidate family is scored by the sum of squared
//! errors between its fitted pdf and the empirical density at bin
//! midpoints. Minimum SSE wins; strict comparison keeps the earliest
//! declared family on ties, so selection is deterministic for a fixed
//! input and candidate set.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, SimulationError};

use super::families::{DataStats, Family, FittedDistribution};

/// Histogram bin count policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinningMode {
    /// Fixed number of bins.
    Fixed(usize),
    /// `floor(sqrt(n))` bins, for sparse pools.
    Sparse,
}

impl Default for BinningMode {
    fn default() -> Self {
        BinningMode::Fixed(200)
    }
}

impl BinningMode {
    fn bins(&self, n: usize) -> usize {
        match self {
            BinningMode::Fixed(bins) => (*bins).max(1),
            BinningMode::Sparse => ((n as f64).sqrt().floor() as usize).max(1),
        }
    }
}

/// Result of one selection pass.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedFit {
    /// Winning distribution.
    pub distribution: FittedDistribution,
    /// Its sum-of-squared-error score against the empirical density.
    pub sse: f64,
}

/// Selects the best-fitting parametric family for a pooled dataset.
#[derive(Debug, Clone, Default)]
pub struct DistributionFitter {
    binning: BinningMode,
}

impl DistributionFitter {
    /// Creates a fitter with the default 200-bin histogram.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the histogram binning policy.
    pub fn with_binning(mut self, binning: BinningMode) -> Self {
        self.binning = binning;
        self
    }

    /// Fits every candidate family and returns the minimum-SSE winner.
    ///
    /// Families that fail to fit are skipped and excluded from
    /// comparison. Fails with `NoFitAvailable` only when every family
    /// fails (e.g. zero or one distinct value in the pool).
    pub fn fit(&self, values: &[f64]) -> Result<SelectedFit> {
        let no_fit = SimulationError::NoFitAvailable {
            samples: values.len(),
        };

        let stats = DataStats::from_values(values).ok_or_else(|| no_fit.clone())?;
        let Some(histogram) = Histogram::build(values, &stats, self.binning.bins(stats.n)) else {
            return Err(no_fit);
        };

        let mut best: Option<SelectedFit> = None;
        for family in Family::ALL {
            let Some(distribution) = family.estimate(values, &stats) else {
                debug!(family = family.name(), "family failed to fit, skipping");
                continue;
            };
            let sse = histogram.sse(&distribution);
            if !sse.is_finite() {
                debug!(family = family.name(), sse, "non-finite score, skipping");
                continue;
            }
            // Strict '<' keeps the earliest declared family on ties.
            if best.as_ref().map_or(true, |b| sse < b.sse) {
                best = Some(SelectedFit { distribution, sse });
            }
        }

        best.ok_or(no_fit)
    }
}

/// Normalized histogram: empirical density at bin midpoints.
struct Histogram {
    midpoints: Vec<f64>,
    density: Vec<f64>,
}

impl Histogram {
    fn build(values: &[f64], stats: &DataStats, bins: usize) -> Option<Self> {
        let width = (stats.max - stats.min) / bins as f64;
        if !(width > 0.0) {
            return None;
        }

        let mut counts = vec![0usize; bins];
        for &v in values {
            let idx = (((v - stats.min) / width) as usize).min(bins - 1);
            counts[idx] += 1;
        }

        let norm = stats.n as f64 * width;
        let midpoints = (0..bins)
            .map(|i| stats.min + (i as f64 + 0.5) * width)
            .collect();
        let density = counts.iter().map(|&c| c as f64 / norm).collect();
        Some(Self { midpoints, density })
    }

    fn sse(&self, distribution: &FittedDistribution) -> f64 {
        self.midpoints
            .iter()
            .zip(&self.density)
            .map(|(&mid, &dens)| {
                let diff = distribution.pdf(mid) - dens;
                diff * diff
            })
            .sum()
    }
}
