//! Microdomain generation configuration and builder.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{MicrodomainError, Result};
use crate::scaling::OverlapDistribution;

/// Parameters of a microdomain build.
///
/// The same configuration on the same input always produces the same
/// microdomains, the overlap samples being drawn from a seeded generator.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MicrodomainConfig {
    /// Mean of the normal distribution of overlap factors, in `[0, 2)`.
    pub overlap_mean: f64,

    /// Standard deviation of the overlap factors.
    ///
    /// Samples are not clipped: a draw outside `[0, 2)` fails the build.
    pub overlap_std: f64,

    /// Seed for the overlap samples.
    pub seed: u64,

    /// Threads used by the tessellation solver, `0` for the rayon default.
    pub threads: usize,
}

impl MicrodomainConfig {
    pub fn overlap_distribution(&self) -> OverlapDistribution {
        OverlapDistribution::new(self.overlap_mean, self.overlap_std)
    }
}

impl Default for MicrodomainConfig {
    fn default() -> Self {
        Self {
            overlap_mean: 0.0,
            overlap_std: 0.0,
            seed: 0,
            threads: 1,
        }
    }
}

/// Builder for creating a [`MicrodomainConfig`] with validation.
///
/// # Example
///
/// ```rust
/// use microdomains::MicrodomainConfigBuilder;
///
/// let config = MicrodomainConfigBuilder::new()
///     .overlap(0.1, 0.01)
///     .unwrap()
///     .seed(42)
///     .threads(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.seed, 42);
/// ```
#[derive(Debug, Clone)]
pub struct MicrodomainConfigBuilder {
    config: MicrodomainConfig,
}

impl MicrodomainConfigBuilder {
    /// Defaults: no overlap, seed 0, one thread.
    pub fn new() -> Self {
        Self { config: MicrodomainConfig::default() }
    }

    /// Set the mean and standard deviation of the overlap factors.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the mean is outside `[0, 2)` or the deviation
    /// is negative or not finite.
    pub fn overlap(mut self, mean: f64, std: f64) -> Result<Self> {
        if !(0.0..2.0).contains(&mean) {
            return Err(MicrodomainError::InvalidConfig(format!(
                "overlap mean must be in [0, 2) (got {})",
                mean
            )));
        }
        if !(std >= 0.0 && std.is_finite()) {
            return Err(MicrodomainError::InvalidConfig(format!(
                "overlap standard deviation must be finite and >= 0 (got {})",
                std
            )));
        }
        self.config.overlap_mean = mean;
        self.config.overlap_std = std;
        Ok(self)
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.config.threads = threads;
        self
    }

    pub fn build(self) -> Result<MicrodomainConfig> {
        Ok(self.config)
    }
}

impl Default for MicrodomainConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
