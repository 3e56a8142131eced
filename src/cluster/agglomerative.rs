//! Agglomerative (bottom-up) clustering

use crate::cluster::matrix::DistanceMatrix;
use crate::cluster::metrics::distance;
use crate::cluster::{
    finish, validate_k, Algorithm, Center, CenterEstimator, Cluster, ClusteringEngine,
    ClusteringReport, Partition, Point, Trial,
};
use crate::config::Config;
use crate::error::Result;
use std::time::Instant;

/// Bottom-up engine: every point starts alone and the closest pair of
/// clusters is merged until `k` remain. Deterministic, so a single trial.
#[derive(Debug, Clone)]
pub struct AgglomerativeEngine {
    points: Vec<Point>,
    k: usize,
    estimator: CenterEstimator,
    threshold: f64,
}

impl AgglomerativeEngine {
    pub fn new(points: Vec<Point>, k: usize, estimator: CenterEstimator) -> Result<Self> {
        validate_k(&points, k)?;

        Ok(Self {
            points,
            k,
            estimator,
            threshold: Config::default().compactness_threshold,
        })
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Initial state: one singleton cluster per point
    pub fn start(&self) -> Result<AgglomerativeRun> {
        AgglomerativeRun::new(&self.points, self.estimator)
    }
}

impl ClusteringEngine for AgglomerativeEngine {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Agglomerative
    }

    fn run(&self) -> Result<ClusteringReport> {
        log::info!(
            "Running agglomerative clustering on {} points with k = {}",
            self.points.len(),
            self.k
        );

        let started = Instant::now();
        let mut run = self.start()?;
        run.merge_until(self.k)?;

        let (partition, centers) = run.into_parts();
        let trial = Trial::scored(partition, centers, self.estimator, self.threshold)?;

        Ok(finish(Algorithm::Agglomerative, self.k, trial, 1, started))
    }
}

/// One executed merge, with slots as they were before the merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Merge {
    pub first: usize,
    pub second: usize,
    pub distance: u64,
}

/// Live state of an agglomerative run.
///
/// `clusters`, `centers` and the matrix slots stay index-aligned: a merge
/// removes both source slots and appends the merged cluster at the end.
#[derive(Debug, Clone)]
pub struct AgglomerativeRun {
    clusters: Vec<Cluster>,
    centers: Vec<Center>,
    matrix: DistanceMatrix,
    estimator: CenterEstimator,
}

impl AgglomerativeRun {
    pub fn new(points: &[Point], estimator: CenterEstimator) -> Result<Self> {
        let clusters: Vec<Cluster> = points.iter().copied().map(Cluster::singleton).collect();
        let centers = clusters
            .iter()
            .map(|cluster| estimator.center(cluster.points()))
            .collect::<Result<Vec<_>>>()?;
        let matrix = DistanceMatrix::from_centers(&centers);

        Ok(Self {
            clusters,
            centers,
            matrix,
            estimator,
        })
    }

    /// Number of live clusters
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn centers(&self) -> &[Center] {
        &self.centers
    }

    pub fn matrix(&self) -> &DistanceMatrix {
        &self.matrix
    }

    /// Merge the globally closest pair. Returns `None` when fewer than two
    /// clusters are live.
    pub fn step(&mut self) -> Result<Option<Merge>> {
        let pair = match self.matrix.closest_pair() {
            Some(pair) => pair,
            None => return Ok(None),
        };
        let (first, second) = (pair.row, pair.column);

        // Remove the higher slot first so the lower index stays valid
        let (low, high) = if first < second { (first, second) } else { (second, first) };
        let high_cluster = self.clusters.remove(high);
        let low_cluster = self.clusters.remove(low);
        self.centers.remove(high);
        self.centers.remove(low);
        self.matrix.remove_pair(first, second);

        let merged = if first < second {
            low_cluster.merge(high_cluster)
        } else {
            high_cluster.merge(low_cluster)
        };
        let center = self.estimator.center(merged.points())?;

        let distances: Vec<u64> = self.centers.iter().map(|&c| distance(center, c)).collect();
        self.matrix.push(&distances);
        self.clusters.push(merged);
        self.centers.push(center);

        log::trace!(
            "Merged slots {} and {} at distance {}, {} clusters left",
            first,
            second,
            pair.distance,
            self.clusters.len()
        );

        Ok(Some(Merge {
            first,
            second,
            distance: pair.distance,
        }))
    }

    /// Merge until exactly `k` clusters remain
    pub fn merge_until(&mut self, k: usize) -> Result<()> {
        while self.clusters.len() > k {
            if self.step()?.is_none() {
                break;
            }
        }
        Ok(())
    }

    pub fn into_parts(self) -> (Partition, Vec<Center>) {
        (self.clusters, self.centers)
    }
}
