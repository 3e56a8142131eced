//! Single-pass K-Means with random restarts

use crate::cluster::{
    assign_to_nearest, finish, into_clusters, select_best, validate_k, validate_trials,
    Algorithm, Center, CenterEstimator, ClusteringEngine, ClusteringReport, Point, Trial,
};
use crate::config::Config;
use crate::error::{ClusterError, Result};
use itertools::Itertools;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::time::Instant;

/// K-Means engine: every trial seeds `k` random centers, assigns once,
/// recenters once and reassigns once. The best trial wins.
#[derive(Debug, Clone)]
pub struct KMeansEngine {
    /// Input points in caller order
    points: Vec<Point>,

    /// Distinct input points in first-seen order, the pool initial centers are drawn from
    distinct: Vec<Point>,

    k: usize,
    estimator: CenterEstimator,
    trials: usize,
    seed: u64,
    threshold: f64,
}

impl KMeansEngine {
    /// Create an engine with the default trial count, seed and threshold
    pub fn new(points: Vec<Point>, k: usize, estimator: CenterEstimator) -> Result<Self> {
        validate_k(&points, k)?;

        let defaults = Config::default();
        let distinct = points.iter().copied().unique().collect();

        Ok(Self {
            points,
            distinct,
            k,
            estimator,
            trials: defaults.k_means_trials,
            seed: defaults.seed,
            threshold: defaults.compactness_threshold,
        })
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Sample `k` distinct points without replacement
    fn initial_centers(&self, rng: &mut SmallRng) -> Vec<Center> {
        self.distinct
            .choose_multiple(rng, self.k)
            .copied()
            .collect()
    }

    fn run_trial(&self, trial: usize) -> Result<Trial> {
        let mut rng = SmallRng::seed_from_u64(self.seed.wrapping_add(trial as u64));

        // Init + Assign: each seed is its own nearest center, so no group is empty
        let seeds = self.initial_centers(&mut rng);
        let groups = assign_to_nearest(&self.points, &seeds);

        // Recenter
        let centers = groups
            .iter()
            .map(|group| self.estimator.center(group))
            .collect::<Result<Vec<_>>>()?;

        self.reassign(trial, seeds, groups, centers)
    }

    /// Final assignment against the recentered `centers`. If that leaves a
    /// group empty the trial keeps the seed grouping instead.
    fn reassign(
        &self,
        trial: usize,
        seeds: Vec<Center>,
        groups: Vec<Vec<Point>>,
        centers: Vec<Center>,
    ) -> Result<Trial> {
        match into_clusters(assign_to_nearest(&self.points, &centers)) {
            Some(partition) => Trial::scored(partition, centers, self.estimator, self.threshold),
            None => {
                log::debug!(
                    "Trial {} left a cluster empty after recentering, keeping the seed assignment",
                    trial
                );
                let partition = into_clusters(groups).ok_or_else(|| {
                    ClusterError::InvalidCluster("seed assignment produced an empty group".to_string())
                })?;
                Trial::scored(partition, seeds, self.estimator, self.threshold)
            }
        }
    }
}

impl ClusteringEngine for KMeansEngine {
    fn algorithm(&self) -> Algorithm {
        match self.estimator {
            CenterEstimator::Centroid => Algorithm::CentroidKMeans,
            CenterEstimator::Medoid => Algorithm::MedoidKMeans,
        }
    }

    fn run(&self) -> Result<ClusteringReport> {
        validate_trials(self.trials)?;
        log::info!(
            "Running {} on {} points with k = {} ({} trials)",
            self.algorithm(),
            self.points.len(),
            self.k,
            self.trials
        );

        let started = Instant::now();
        let best = select_best((0..self.trials).map(|trial| self.run_trial(trial)))?;

        Ok(finish(self.algorithm(), self.k, best, self.trials, started))
    }
}
