//! Cluster analysis module

pub mod agglomerative;
pub mod divisive;
pub mod kmeans;
pub mod matrix;
pub mod metrics;

pub use agglomerative::{AgglomerativeEngine, AgglomerativeRun};
pub use divisive::DivisiveEngine;
pub use kmeans::KMeansEngine;
pub use metrics::{CenterEstimator, QualityScore};

use crate::config::Config;
use crate::error::{ClusterError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

/// A 2-D integer point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for Point {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Summary position of a cluster, derived by a [`CenterEstimator`]
pub type Center = Point;

/// A non-empty group of points owned by exactly one partition
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cluster {
    points: Vec<Point>,
}

impl Cluster {
    /// Build a cluster, rejecting an empty member list
    pub fn new(points: Vec<Point>) -> Result<Self> {
        if points.is_empty() {
            return Err(ClusterError::InvalidCluster(
                "a cluster needs at least one point".to_string(),
            ));
        }
        Ok(Self { points })
    }

    /// A cluster holding a single point
    pub fn singleton(point: Point) -> Self {
        Self { points: vec![point] }
    }

    /// Members in insertion order
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false for a constructed cluster
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn contains(&self, point: &Point) -> bool {
        self.points.contains(point)
    }

    /// Concatenate the members of `other` after the members of `self`
    pub fn merge(mut self, other: Cluster) -> Cluster {
        self.points.extend(other.points);
        self
    }
}

/// All clusters produced by one trial
pub type Partition = Vec<Cluster>;

/// Clustering strategy selected by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    CentroidKMeans,
    MedoidKMeans,
    Divisive,
    Agglomerative,
}

impl Algorithm {
    /// Short token accepted on the command line
    pub fn token(&self) -> &'static str {
        match self {
            Algorithm::CentroidKMeans => "c",
            Algorithm::MedoidKMeans => "m",
            Algorithm::Divisive => "d",
            Algorithm::Agglomerative => "a",
        }
    }
}

impl FromStr for Algorithm {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "c" | "centroid-kmeans" => Ok(Algorithm::CentroidKMeans),
            "m" | "medoid-kmeans" => Ok(Algorithm::MedoidKMeans),
            "d" | "divisive" => Ok(Algorithm::Divisive),
            "a" | "agglomerative" => Ok(Algorithm::Agglomerative),
            other => Err(ClusterError::Configuration(format!(
                "unknown algorithm '{}' (expected c, m, d or a)",
                other
            ))),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::CentroidKMeans => "centroid-kmeans",
            Algorithm::MedoidKMeans => "medoid-kmeans",
            Algorithm::Divisive => "divisive",
            Algorithm::Agglomerative => "agglomerative",
        };
        f.write_str(name)
    }
}

/// Center estimator requested for engines that do not fix one themselves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CenterMode {
    Centroid,
    Medoid,
}

impl FromStr for CenterMode {
    type Err = ClusterError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "centroid" => Ok(CenterMode::Centroid),
            "medoid" => Ok(CenterMode::Medoid),
            other => Err(ClusterError::Configuration(format!(
                "unknown center mode '{}' (expected centroid or medoid)",
                other
            ))),
        }
    }
}

/// Final partition of a run together with its statistics
#[derive(Debug, Clone, Serialize)]
pub struct ClusteringReport {
    pub algorithm: Algorithm,
    pub k: usize,
    pub partition: Partition,
    /// Center of each cluster, index-aligned with `partition`
    pub centers: Vec<Center>,
    pub score: QualityScore,
    /// Number of trials the partition was selected from
    pub trials: usize,
    pub elapsed: Duration,
}

impl ClusteringReport {
    pub fn success_rate(&self) -> f64 {
        self.score.success_rate
    }

    pub fn point_count(&self) -> usize {
        self.partition.iter().map(Cluster::len).sum()
    }
}

/// A configured clustering strategy
pub trait ClusteringEngine {
    fn algorithm(&self) -> Algorithm;

    /// Run every trial and return the best partition
    fn run(&self) -> Result<ClusteringReport>;
}

/// Construct the engine for `algorithm`, validating `k` before any work starts
pub fn build_engine(
    algorithm: Algorithm,
    center_mode: CenterMode,
    points: Vec<Point>,
    k: usize,
    config: &Config,
) -> Result<Box<dyn ClusteringEngine>> {
    let estimator = CenterEstimator::for_algorithm(algorithm, center_mode)?;
    log::debug!("Using {:?} centers for {}", estimator, algorithm);

    let engine: Box<dyn ClusteringEngine> = match algorithm {
        Algorithm::CentroidKMeans | Algorithm::MedoidKMeans => Box::new(
            KMeansEngine::new(points, k, estimator)?
                .with_trials(config.k_means_trials)
                .with_seed(config.seed)
                .with_threshold(config.compactness_threshold),
        ),
        Algorithm::Divisive => Box::new(
            DivisiveEngine::new(points, k, estimator)?
                .with_trials(config.divisive_trials)
                .with_seed(config.seed)
                .with_threshold(config.compactness_threshold),
        ),
        Algorithm::Agglomerative => Box::new(
            AgglomerativeEngine::new(points, k, estimator)?
                .with_threshold(config.compactness_threshold),
        ),
    };

    Ok(engine)
}

/// Reject `k` outside `1..=distinct points`
pub(crate) fn validate_k(points: &[Point], k: usize) -> Result<()> {
    if k < 1 {
        return Err(ClusterError::Configuration(
            "k must be at least 1".to_string(),
        ));
    }

    let distinct = points.iter().collect::<HashSet<_>>().len();
    if k > distinct {
        return Err(ClusterError::Configuration(format!(
            "k = {} exceeds the {} distinct input points",
            k, distinct
        )));
    }

    Ok(())
}

pub(crate) fn validate_trials(trials: usize) -> Result<()> {
    if trials == 0 {
        return Err(ClusterError::Configuration(
            "at least one trial is required".to_string(),
        ));
    }
    Ok(())
}

/// Assign every point to its nearest center; ties go to the lowest center index.
/// Groups are index-aligned with `centers` and may be empty.
pub(crate) fn assign_to_nearest(points: &[Point], centers: &[Center]) -> Vec<Vec<Point>> {
    let mut groups = vec![Vec::new(); centers.len()];
    if centers.is_empty() {
        return groups;
    }

    for &point in points {
        let index = metrics::nearest_center(point, centers).unwrap_or(0);
        groups[index].push(point);
    }

    groups
}

/// Turn assignment groups into clusters, or `None` if any group is empty
pub(crate) fn into_clusters(groups: Vec<Vec<Point>>) -> Option<Partition> {
    groups
        .into_iter()
        .map(|group| Cluster::new(group).ok())
        .collect()
}

/// One finished trial
#[derive(Debug, Clone)]
pub(crate) struct Trial {
    pub partition: Partition,
    /// Centers the partition was assigned against, index-aligned with it
    pub centers: Vec<Center>,
    pub score: QualityScore,
}

impl Trial {
    /// Score a partition whose centers are already known
    pub fn scored(
        partition: Partition,
        centers: Vec<Center>,
        estimator: CenterEstimator,
        threshold: f64,
    ) -> Result<Self> {
        let score = QualityScore::evaluate(&partition, estimator, threshold)?;
        Ok(Self { partition, centers, score })
    }

    /// Score a partition, deriving each cluster's center with `estimator`
    pub fn evaluate(partition: Partition, estimator: CenterEstimator, threshold: f64) -> Result<Self> {
        let centers = partition
            .iter()
            .map(|cluster| estimator.center(cluster.points()))
            .collect::<Result<Vec<_>>>()?;
        Self::scored(partition, centers, estimator, threshold)
    }
}

/// Keep the best trial seen so far: strictly higher success rate wins, a tie
/// on success rate is broken by strictly higher balance. Earlier trials win
/// exact ties.
pub(crate) fn select_best<I>(trials: I) -> Result<Trial>
where
    I: IntoIterator<Item = Result<Trial>>,
{
    let best = trials
        .into_iter()
        .enumerate()
        .try_fold(None::<Trial>, |best, (index, trial)| -> Result<Option<Trial>> {
            let trial = trial?;
            log::debug!(
                "Trial {}: success rate {:.2}%, balance {:.6e}",
                index,
                trial.score.success_rate,
                trial.score.balance_score
            );
            Ok(match best {
                Some(current) if !trial.score.is_better_than(&current.score) => Some(current),
                _ => Some(trial),
            })
        })?;

    best.ok_or_else(|| ClusterError::Configuration("no trials were run".to_string()))
}

/// Build the report for the selected trial
pub(crate) fn finish(
    algorithm: Algorithm,
    k: usize,
    best: Trial,
    trials: usize,
    started: Instant,
) -> ClusteringReport {
    let report = ClusteringReport {
        algorithm,
        k,
        partition: best.partition,
        centers: best.centers,
        score: best.score,
        trials,
        elapsed: started.elapsed(),
    };

    log::info!(
        "{} finished in {:?}: {} clusters, success rate {:.2}%",
        algorithm,
        report.elapsed,
        report.partition.len(),
        report.success_rate()
    );

    report
}
