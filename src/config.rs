//! Configuration management for the point cluster analyzer

use std::ops::RangeInclusive;

/// Seed used when the caller does not provide one
pub const DEFAULT_SEED: u64 = 2_515_546_116_454;

/// Mean member-to-center distance at or below which a cluster counts as compact
pub const COMPACTNESS_THRESHOLD: f64 = 500.0;

/// Default configuration for the point cluster analyzer
#[derive(Debug, Clone)]
pub struct Config {
    /// Number of randomized K-Means trials per run
    pub k_means_trials: usize,

    /// Number of randomized divisive trials per run
    pub divisive_trials: usize,

    /// Base seed; trial `i` draws from `seed + i`
    pub seed: u64,

    /// Compactness threshold used by the success rate
    pub compactness_threshold: f64,

    /// Number of points the generator produces
    pub num_points: usize,

    /// Number of uniformly placed points the generator starts from
    pub seed_points: usize,

    /// Bounds for both coordinates of generated points
    pub coordinate_range: RangeInclusive<i32>,

    /// Bounds for the offset applied around an existing point
    pub offset_range: RangeInclusive<i32>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            k_means_trials: 5,
            divisive_trials: 5,
            seed: DEFAULT_SEED,
            compactness_threshold: COMPACTNESS_THRESHOLD,
            num_points: 1020,
            seed_points: 20,
            coordinate_range: -5000..=5000,
            offset_range: -100..=100,
        }
    }
}

impl Config {
    /// Create a configuration with custom trial counts and seed, keeping the
    /// default generator bounds
    pub fn new(k_means_trials: usize, divisive_trials: usize, seed: u64) -> Self {
        Self {
            k_means_trials,
            divisive_trials,
            seed,
            ..Self::default()
        }
    }

    /// Override the number of generated points
    pub fn with_num_points(mut self, num_points: usize) -> Self {
        self.num_points = num_points;
        self
    }
}
