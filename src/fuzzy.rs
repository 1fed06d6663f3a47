//! Climate desirability scoring.
//!
//! The engine treats scoring as an external collaborator behind
//! [`ClimateScorer`]: two equal-length numeric columns in (already
//! clamped to their admissible ranges), one score column out, same row
//! count, no side effects. Higher scores mean friendlier climate for
//! the cargo.
//!
//! [`FuzzyScorer`] is the bundled reference implementation: a Mamdani
//! fuzzy system over a fixed 3×3 rule table relating temperature and
//! humidity bands to a 0–10 desirability score, defuzzified by
//! centroid.

/// Scoring collaborator contract.
///
/// Implementations must return exactly one score per input row and
/// must not mutate or reorder the inputs.
pub trait ClimateScorer: Send + Sync {
    /// Scores paired (temperature, humidity) rows.
    fn score(&self, temperatures: &[f64], humidities: &[f64]) -> Vec<f64>;
}

/// Reference Mamdani fuzzy scorer.
///
/// Rule table (temperature × humidity → score):
///
/// | | Low hum | Medium hum | High hum |
/// |---|---|---|---|
/// | **Low temp** | Good | Good | Poor |
/// | **Medium temp** | Good | Medium | Poor |
/// | **High temp** | Medium | Poor | Poor |
#[derive(Debug, Clone, Copy, Default)]
pub struct FuzzyScorer;

impl FuzzyScorer {
    /// Creates the scorer.
    pub fn new() -> Self {
        Self
    }

    fn score_one(&self, temperature: f64, humidity: f64) -> f64 {
        // Antecedent memberships.
        let t_low = trapezoid(temperature, 0.0, 0.0, 10.0, 25.0);
        let t_med = triangle(temperature, 20.0, 25.0, 30.0);
        let t_high = trapezoid(temperature, 25.0, 35.0, 40.0, 40.0);

        let h_low = trapezoid(humidity, 0.0, 0.0, 30.0, 50.0);
        let h_med = triangle(humidity, 40.0, 60.0, 80.0);
        let h_high = trapezoid(humidity, 70.0, 90.0, 100.0, 100.0);

        // Mamdani min-inference, max-aggregation per output label.
        let good = (t_low.min(h_low))
            .max(t_low.min(h_med))
            .max(t_med.min(h_low));
        let medium = (t_med.min(h_med)).max(t_high.min(h_low));
        let poor = (t_low.min(h_high))
            .max(t_med.min(h_high))
            .max(t_high.min(h_med))
            .max(t_high.min(h_high));

        // Centroid defuzzification over the score universe [0, 10].
        let mut num = 0.0;
        let mut den = 0.0;
        let steps = 101;
        for i in 0..steps {
            let x = 10.0 * i as f64 / (steps - 1) as f64;
            let membership = (good.min(gaussian(x, 10.0, 2.0)))
                .max(medium.min(triangle(x, 4.0, 5.0, 6.0)))
                .max(poor.min(gaussian(x, 0.0, 2.0)));
            num += x * membership;
            den += membership;
        }
        if den > 0.0 {
            num / den
        } else {
            // No rule fired (clamped inputs make this unreachable in
            // practice): fall back to the neutral midpoint.
            5.0
        }
    }
}

impl ClimateScorer for FuzzyScorer {
    fn score(&self, temperatures: &[f64], humidities: &[f64]) -> Vec<f64> {
        temperatures
            .iter()
            .zip(humidities)
            .map(|(&t, &h)| self.score_one(t, h))
            .collect()
    }
}

/// Trapezoidal membership over breakpoints a <= b <= c <= d.
fn trapezoid(x: f64, a: f64, b: f64, c: f64, d: f64) -> f64 {
    if x < a || x > d {
        0.0
    } else if x < b {
        (x - a) / (b - a)
    } else if x <= c {
        1.0
    } else {
        (d - x) / (d - c)
    }
}

/// Triangular membership peaking at b.
fn triangle(x: f64, a: f64, b: f64, c: f64) -> f64 {
    trapezoid(x, a, b, b, c)
}

/// Gaussian membership.
fn gaussian(x: f64, mean: f64, sigma: f64) -> f64 {
    let z = (x - mean) / sigma;
    (-0.5 * z * z).exp()
}
