//! Candidate distribution families.
//!
//! Each family knows how to estimate its parameters from pooled data
//! (method of moments or closed-form MLE) and how to evaluate its pdf,
//! which the selector compares against the empirical histogram.
//!
//! A family that cannot fit the data — zero variance, nonpositive
//! support for a log family, degenerate parameters — returns `None`
//! and is excluded from comparison; it never aborts the fitting pass.

use serde::{Deserialize, Serialize};
use statrs::function::gamma::ln_gamma;

use crate::error::{Result, SimulationError};

/// Summary statistics shared by the per-family estimators.
#[derive(Debug, Clone, Copy)]
pub(crate) struct DataStats {
    pub n: usize,
    pub mean: f64,
    pub var: f64,
    pub min: f64,
    pub max: f64,
}

impl DataStats {
    pub(crate) fn from_values(values: &[f64]) -> Option<Self> {
        if values.len() < 2 {
            return None;
        }
        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if !(mean.is_finite() && var.is_finite()) {
            return None;
        }
        Some(Self {
            n,
            mean,
            var,
            min,
            max,
        })
    }
}

/// A parametric distribution family in the candidate set.
///
/// Declaration order is the tie-break order during selection: the
/// first family declared wins on equal SSE.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    /// Normal (mean, std).
    Normal,
    /// Shifted exponential (loc, scale).
    Exponential,
    /// Shifted gamma (shape, loc, scale).
    Gamma,
    /// Triangular (lower, upper, mode).
    Triangular,
    /// Uniform (loc, scale) over [loc, loc + scale].
    Uniform,
    /// Log-normal (mu, sigma) of the underlying normal.
    LogNormal,
}

impl Family {
    /// Candidate families in declaration (tie-break) order.
    pub const ALL: [Family; 6] = [
        Family::Normal,
        Family::Exponential,
        Family::Gamma,
        Family::Triangular,
        Family::Uniform,
        Family::LogNormal,
    ];

    /// Stable family name used in persisted rows.
    pub fn name(&self) -> &'static str {
        match self {
            Family::Normal => "norm",
            Family::Exponential => "expon",
            Family::Gamma => "gamma",
            Family::Triangular => "triang",
            Family::Uniform => "uniform",
            Family::LogNormal => "lognorm",
        }
    }

    /// Estimates this family's parameters from the pooled values.
    ///
    /// Returns `None` when the data is degenerate for this family.
    pub fn estimate(&self, values: &[f64], stats: &DataStats) -> Option<FittedDistribution> {
        match self {
            Family::Normal => {
                let std = stats.var.sqrt();
                (std > 0.0).then_some(FittedDistribution::Normal {
                    mean: stats.mean,
                    std,
                })
            }
            Family::Exponential => {
                let loc = stats.min;
                let scale = stats.mean - loc;
                (scale > 0.0).then_some(FittedDistribution::Exponential { loc, scale })
            }
            Family::Gamma => {
                // Moments on data shifted to the sample minimum.
                let loc = stats.min;
                let m = stats.mean - loc;
                let v = stats.var;
                if m <= 0.0 || v <= 0.0 {
                    return None;
                }
                let shape = m * m / v;
                let scale = v / m;
                (shape.is_finite() && scale.is_finite() && shape > 0.0 && scale > 0.0).then_some(
                    FittedDistribution::Gamma { shape, loc, scale },
                )
            }
            Family::Triangular => {
                if stats.max <= stats.min {
                    return None;
                }
                // mode from the moment identity mean = (a + b + c) / 3,
                // clipped into the support
                let mode =
                    (3.0 * stats.mean - stats.min - stats.max).clamp(stats.min, stats.max);
                Some(FittedDistribution::Triangular {
                    lower: stats.min,
                    upper: stats.max,
                    mode,
                })
            }
            Family::Uniform => {
                let scale = stats.max - stats.min;
                (scale > 0.0).then_some(FittedDistribution::Uniform {
                    loc: stats.min,
                    scale,
                })
            }
            Family::LogNormal => {
                if stats.min <= 0.0 {
                    return None;
                }
                let logs: Vec<f64> = values.iter().map(|v| v.ln()).collect();
                let log_stats = DataStats::from_values(&logs)?;
                let sigma = log_stats.var.sqrt();
                (sigma > 0.0).then_some(FittedDistribution::LogNormal {
                    mu: log_stats.mean,
                    sigma,
                })
            }
        }
    }
}

/// A fitted parametric distribution, ready for sampling.
///
/// Closed set: the sampler matches exhaustively, so an unsupported
/// family can only enter through [`FittedDistribution::from_parts`]
/// when decoding persisted rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FittedDistribution {
    /// Normal with mean and standard deviation.
    Normal { mean: f64, std: f64 },
    /// Exponential shifted by `loc`, mean inter-arrival `scale`.
    Exponential { loc: f64, scale: f64 },
    /// Gamma with `shape`/`scale`, shifted by `loc` after sampling.
    Gamma { shape: f64, loc: f64, scale: f64 },
    /// Triangular over [lower, upper] peaking at `mode`.
    Triangular { lower: f64, upper: f64, mode: f64 },
    /// Uniform over [loc, loc + scale].
    Uniform { loc: f64, scale: f64 },
    /// Log-normal: `exp` of Normal(mu, sigma).
    LogNormal { mu: f64, sigma: f64 },
}

impl FittedDistribution {
    /// Family name for persistence and logs.
    pub fn name(&self) -> &'static str {
        self.family().name()
    }

    /// Family this distribution belongs to.
    pub fn family(&self) -> Family {
        match self {
            FittedDistribution::Normal { .. } => Family::Normal,
            FittedDistribution::Exponential { .. } => Family::Exponential,
            FittedDistribution::Gamma { .. } => Family::Gamma,
            FittedDistribution::Triangular { .. } => Family::Triangular,
            FittedDistribution::Uniform { .. } => Family::Uniform,
            FittedDistribution::LogNormal { .. } => Family::LogNormal,
        }
    }

    /// Parameter vector in the family's declared order.
    pub fn params(&self) -> Vec<f64> {
        match *self {
            FittedDistribution::Normal { mean, std } => vec![mean, std],
            FittedDistribution::Exponential { loc, scale } => vec![loc, scale],
            FittedDistribution::Gamma { shape, loc, scale } => vec![shape, loc, scale],
            FittedDistribution::Triangular { lower, upper, mode } => vec![lower, upper, mode],
            FittedDistribution::Uniform { loc, scale } => vec![loc, scale],
            FittedDistribution::LogNormal { mu, sigma } => vec![mu, sigma],
        }
    }

    /// Rebuilds a distribution from its persisted name and parameters.
    ///
    /// Fails with `UnsupportedDistribution` for names outside the
    /// candidate set or parameter vectors of the wrong arity.
    pub fn from_parts(name: &str, params: &[f64]) -> Result<Self> {
        let unsupported = || SimulationError::UnsupportedDistribution(name.to_string());
        match name {
            "norm" => match params {
                &[mean, std] => Ok(FittedDistribution::Normal { mean, std }),
                _ => Err(unsupported()),
            },
            "expon" => match params {
                &[loc, scale] => Ok(FittedDistribution::Exponential { loc, scale }),
                _ => Err(unsupported()),
            },
            "gamma" => match params {
                &[shape, loc, scale] => Ok(FittedDistribution::Gamma { shape, loc, scale }),
                _ => Err(unsupported()),
            },
            "triang" => match params {
                &[lower, upper, mode] => Ok(FittedDistribution::Triangular { lower, upper, mode }),
                _ => Err(unsupported()),
            },
            "uniform" => match params {
                &[loc, scale] => Ok(FittedDistribution::Uniform { loc, scale }),
                _ => Err(unsupported()),
            },
            "lognorm" => match params {
                &[mu, sigma] => Ok(FittedDistribution::LogNormal { mu, sigma }),
                _ => Err(unsupported()),
            },
            _ => Err(unsupported()),
        }
    }

    /// Probability density at `x`.
    pub fn pdf(&self, x: f64) -> f64 {
        const SQRT_2PI: f64 = 2.5066282746310002;
        match *self {
            FittedDistribution::Normal { mean, std } => {
                let z = (x - mean) / std;
                (-0.5 * z * z).exp() / (std * SQRT_2PI)
            }
            FittedDistribution::Exponential { loc, scale } => {
                if x < loc {
                    0.0
                } else {
                    (-(x - loc) / scale).exp() / scale
                }
            }
            FittedDistribution::Gamma { shape, loc, scale } => {
                let y = x - loc;
                if y <= 0.0 {
                    0.0
                } else {
                    ((shape - 1.0) * y.ln() - y / scale - ln_gamma(shape) - shape * scale.ln())
                        .exp()
                }
            }
            FittedDistribution::Triangular { lower, upper, mode } => {
                let span = upper - lower;
                if span <= 0.0 || x < lower || x > upper {
                    0.0
                } else if x < mode {
                    2.0 * (x - lower) / (span * (mode - lower))
                } else if x > mode {
                    2.0 * (upper - x) / (span * (upper - mode))
                } else {
                    2.0 / span
                }
            }
            FittedDistribution::Uniform { loc, scale } => {
                if x < loc || x > loc + scale {
                    0.0
                } else {
                    1.0 / scale
                }
            }
            FittedDistribution::LogNormal { mu, sigma } => {
                if x <= 0.0 {
                    0.0
                } else {
                    let z = (x.ln() - mu) / sigma;
                    (-0.5 * z * z).exp() / (x * sigma * SQRT_2PI)
                }
            }
        }
    }
}
