//! Monte Carlo sampling transformations.
//!
//! Each supported family is sampled by its own transformation from
//! uniform variates — inverse transform where the CDF inverts in
//! closed form, accept-reject (Marsaglia–Tsang) for the gamma — so the
//! engine carries no external sampler dependency.
//!
//! All callers draw the same number of samples per measure so that
//! scenario rows pair `temperature[i]` with `humidity[i]` positionally.
//! That is an ordering contract, not an independence claim: draws
//! across measures are independent by construction.
//!
//! # References
//!
//! - Banks et al. (2010), "Discrete-Event System Simulation", Ch. 8
//! - Law (2015), "Simulation Modeling and Analysis", Ch. 8
//! - Marsaglia & Tsang (2000), "A Simple Method for Generating Gamma
//!   Variables"

use rand::Rng;
use statrs::function::erf::erf_inv;

use crate::fit::FittedDistribution;

/// Scenario count per (location, hour, measure) tuple.
pub const SIZE: usize = 1000;

/// Draws synthetic values from fitted distributions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonteCarloSampler;

impl MonteCarloSampler {
    /// Creates a sampler.
    pub fn new() -> Self {
        Self
    }

    /// Draws `count` values from `distribution`.
    ///
    /// The triangular transformation treats `mode` and `upper` as
    /// swappable when inverted (`mode > upper`): upstream moment fits
    /// occasionally produce such parameterizations, and enforcing
    /// `mode <= upper` before sampling keeps every draw inside
    /// `[lower, upper]`.
    pub fn sample<R: Rng>(
        &self,
        distribution: &FittedDistribution,
        rng: &mut R,
        count: usize,
    ) -> Vec<f64> {
        (0..count).map(|_| self.draw(distribution, rng)).collect()
    }

    /// Draws a single value.
    fn draw<R: Rng>(&self, distribution: &FittedDistribution, rng: &mut R) -> f64 {
        match *distribution {
            FittedDistribution::Normal { mean, std } => mean + std * standard_normal(rng),
            FittedDistribution::Exponential { loc, scale } => {
                loc - scale * (1.0 - open_unit(rng)).ln()
            }
            FittedDistribution::Gamma { shape, loc, scale } => {
                loc + scale * standard_gamma(rng, shape)
            }
            FittedDistribution::Triangular { lower, upper, mode } => {
                let (mode, upper) = if mode > upper {
                    (upper, mode)
                } else {
                    (mode, upper)
                };
                triangular(rng, lower, mode, upper)
            }
            FittedDistribution::Uniform { loc, scale } => loc + scale * rng.random::<f64>(),
            FittedDistribution::LogNormal { mu, sigma } => {
                (mu + sigma * standard_normal(rng)).exp()
            }
        }
    }
}

/// Uniform variate in the open interval (0, 1).
fn open_unit<R: Rng>(rng: &mut R) -> f64 {
    rng.random::<f64>().max(f64::MIN_POSITIVE)
}

/// Standard normal via the inverse CDF: `sqrt(2) * erf_inv(2u - 1)`.
///
/// The variate is clamped away from the interval endpoints so the
/// erf argument never rounds to ±1, where `erf_inv` diverges.
fn standard_normal<R: Rng>(rng: &mut R) -> f64 {
    let u = rng
        .random::<f64>()
        .clamp(f64::EPSILON, 1.0 - f64::EPSILON);
    std::f64::consts::SQRT_2 * erf_inv(2.0 * u - 1.0)
}

/// Triangular inverse transform. Requires `lower <= mode <= upper`.
fn triangular<R: Rng>(rng: &mut R, lower: f64, mode: f64, upper: f64) -> f64 {
    let span = upper - lower;
    if span <= 0.0 {
        return lower;
    }
    let u = rng.random::<f64>();
    let cut = (mode - lower) / span;
    if u < cut {
        lower + (u * span * (mode - lower)).sqrt()
    } else {
        upper - ((1.0 - u) * span * (upper - mode)).sqrt()
    }
}

/// Standard gamma (scale 1) via Marsaglia–Tsang for `shape >= 1`,
/// boosted by `u^(1/shape)` for `shape < 1` (Law 2015, p. 455).
fn standard_gamma<R: Rng>(rng: &mut R, shape: f64) -> f64 {
    if shape < 1.0 {
        let boost = open_unit(rng).powf(1.0 / shape);
        return standard_gamma(rng, shape + 1.0) * boost;
    }

    let d = shape - 1.0 / 3.0;
    let c = 1.0 / (9.0 * d).sqrt();
    loop {
        let x = standard_normal(rng);
        let v = (1.0 + c * x).powi(3);
        if v <= 0.0 {
            continue;
        }
        let u = open_unit(rng);
        // Squeeze check first, log check as fallback.
        if u < 1.0 - 0.0331 * x.powi(4) {
            return d * v;
        }
        if u.ln() < 0.5 * x * x + d * (1.0 - v + v.ln()) {
            return d * v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    #[test]
    fn test_sample_count_is_fixed() {
        let dist = FittedDistribution::Uniform {
            loc: 0.0,
            scale: 1.0,
        };
        let samples = MonteCarloSampler::new().sample(&dist, &mut rng(), SIZE);
        assert_eq!(samples.len(), 1000);
    }

    #[test]
    fn test_uniform_stays_in_range() {
        let dist = FittedDistribution::Uniform {
            loc: 5.0,
            scale: 10.0,
        };
        let samples = MonteCarloSampler::new().sample(&dist, &mut rng(), SIZE);
        assert!(samples.iter().all(|&v| (5.0..=15.0).contains(&v)));
    }

    #[test]
    fn test_triangular_swaps_inverted_mode() {
        // mode > upper: the sampler must swap internally and every
        // sample must stay within [lower, upper-as-given-mode].
        let dist = FittedDistribution::Triangular {
            lower: 0.0,
            upper: 6.0,
            mode: 10.0,
        };
        let samples = MonteCarloSampler::new().sample(&dist, &mut rng(), SIZE);
        assert_eq!(samples.len(), SIZE);
        assert!(samples.iter().all(|&v| (0.0..=10.0).contains(&v)));
    }

    #[test]
    fn test_triangular_well_formed_bounds() {
        let dist = FittedDistribution::Triangular {
            lower: 2.0,
            upper: 8.0,
            mode: 5.0,
        };
        let samples = MonteCarloSampler::new().sample(&dist, &mut rng(), SIZE);
        assert!(samples.iter().all(|&v| (2.0..=8.0).contains(&v)));
        // Mean of a triangular is (a + b + c) / 3 = 5.
        assert!((mean(&samples) - 5.0).abs() < 0.3);
    }

    #[test]
    fn test_normal_mean_converges() {
        let dist = FittedDistribution::Normal {
            mean: 25.0,
            std: 2.0,
        };
        let samples = MonteCarloSampler::new().sample(&dist, &mut rng(), SIZE);
        assert!((mean(&samples) - 25.0).abs() < 0.5);
    }

    #[test]
    fn test_exponential_respects_loc() {
        let dist = FittedDistribution::Exponential {
            loc: 12.0,
            scale: 3.0,
        };
        let samples = MonteCarloSampler::new().sample(&dist, &mut rng(), SIZE);
        assert!(samples.iter().all(|&v| v >= 12.0));
        assert!((mean(&samples) - 15.0).abs() < 0.6);
    }

    #[test]
    fn test_gamma_applies_loc_shift() {
        let dist = FittedDistribution::Gamma {
            shape: 4.0,
            loc: 10.0,
            scale: 0.5,
        };
        let samples = MonteCarloSampler::new().sample(&dist, &mut rng(), SIZE);
        assert!(samples.iter().all(|&v| v > 10.0));
        // Mean = loc + shape * scale = 12.
        assert!((mean(&samples) - 12.0).abs() < 0.4);
    }

    #[test]
    fn test_gamma_small_shape() {
        let dist = FittedDistribution::Gamma {
            shape: 0.5,
            loc: 0.0,
            scale: 2.0,
        };
        let samples = MonteCarloSampler::new().sample(&dist, &mut rng(), SIZE);
        assert!(samples.iter().all(|&v| v.is_finite() && v >= 0.0));
        // Mean = shape * scale = 1.
        assert!((mean(&samples) - 1.0).abs() < 0.3);
    }

    #[test]
    fn test_lognormal_positive() {
        let dist = FittedDistribution::LogNormal {
            mu: 0.0,
            sigma: 0.25,
        };
        let samples = MonteCarloSampler::new().sample(&dist, &mut rng(), SIZE);
        assert!(samples.iter().all(|&v| v > 0.0));
    }
}
