//! Best-fit distribution selection.
//!
//! Builds an empirical density by histogram binning, fits each
//! candidate parametric family by method of moments / MLE, and selects
//! the family with the minimum sum-of-squared-error against the
//! empirical density at bin midpoints.
//!
//! # Candidate set
//!
//! Normal, Exponential, Gamma, Triangular, Uniform, LogNormal — a
//! closed set: the fitted result is a tagged enum with an exhaustive
//! match in the sampler, so an unrecognized family can only arise when
//! decoding persisted rows.
//!
//! # References
//!
//! - Law (2015), "Simulation Modeling and Analysis", Ch. 6 (Selecting
//!   Input Probability Distributions)

mod families;
mod selector;

pub use families::{Family, FittedDistribution};
pub use selector::{BinningMode, DistributionFitter, SelectedFit};
