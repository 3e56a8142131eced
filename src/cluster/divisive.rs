//! Divisive (bisecting K-Means) clustering

use crate::cluster::{
    assign_to_nearest, finish, select_best, validate_k, validate_trials, Algorithm, Center,
    CenterEstimator, Cluster, ClusteringEngine, ClusteringReport, Point, Trial,
};
use crate::config::Config;
use crate::error::{ClusterError, Result};
use itertools::Itertools;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::cmp::Reverse;
use std::collections::HashSet;
use std::time::Instant;

/// Top-down engine: the whole point set is bisected repeatedly until exactly
/// `k` leaf clusters exist
#[derive(Debug, Clone)]
pub struct DivisiveEngine {
    points: Vec<Point>,
    k: usize,
    estimator: CenterEstimator,
    trials: usize,
    seed: u64,
    threshold: f64,
}

/// A cluster can be bisected only if it holds two different points
fn can_split(cluster: &Cluster) -> bool {
    cluster.points().iter().unique().nth(1).is_some()
}

/// Assign `points` to the nearer of two centers, or `None` if one side ends up empty
fn split(points: &[Point], centers: [Center; 2]) -> Option<(Vec<Point>, Vec<Point>)> {
    let mut groups = assign_to_nearest(points, &centers).into_iter();
    let (first, second) = (groups.next()?, groups.next()?);
    if first.is_empty() || second.is_empty() {
        return None;
    }
    Some((first, second))
}

impl DivisiveEngine {
    pub fn new(points: Vec<Point>, k: usize, estimator: CenterEstimator) -> Result<Self> {
        validate_k(&points, k)?;

        let defaults = Config::default();
        Ok(Self {
            points,
            k,
            estimator,
            trials: defaults.divisive_trials,
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

    /// Split one cluster in two. Two random members seed the halves, then
    /// recenter + reassign repeats until a center pair comes back that was
    /// already seen during this call.
    fn bisect(&self, cluster: &Cluster, rng: &mut SmallRng) -> Result<(Cluster, Cluster)> {
        let points = cluster.points();
        let candidates: Vec<Point> = points.iter().copied().unique().collect();
        if candidates.len() < 2 {
            return Err(ClusterError::InvalidCluster(format!(
                "cannot bisect a cluster of {} identical points",
                points.len()
            )));
        }

        let seeds: Vec<Center> = candidates.choose_multiple(rng, 2).copied().collect();
        // Each seed is its own nearest center, so neither half starts empty
        let (mut first, mut second) = split(points, [seeds[0], seeds[1]]).ok_or_else(|| {
            ClusterError::InvalidCluster("seed split produced an empty half".to_string())
        })?;

        let mut seen: HashSet<(Center, Center)> = HashSet::new();
        loop {
            let centers = (self.estimator.center(&first)?, self.estimator.center(&second)?);
            if !seen.insert(centers) {
                break;
            }

            match split(points, [centers.0, centers.1]) {
                Some((a, b)) => {
                    first = a;
                    second = b;
                }
                // Both centers pulled everything to one side; keep the last valid halves
                None => break,
            }
        }

        log::trace!(
            "Bisected {} points into {} + {} after {} center pairs",
            points.len(),
            first.len(),
            second.len(),
            seen.len()
        );

        Ok((Cluster::new(first)?, Cluster::new(second)?))
    }

    /// One outer round: bisect every splittable cluster, or only the largest
    /// one when splitting all of them would overshoot `k`
    fn split_round(&self, clusters: Vec<Cluster>, rng: &mut SmallRng) -> Result<Vec<Cluster>> {
        let splittable = clusters.iter().filter(|c| can_split(c)).count();

        if clusters.len() + splittable <= self.k {
            let mut next = Vec::with_capacity(clusters.len() + splittable);
            for cluster in clusters {
                if can_split(&cluster) {
                    let (first, second) = self.bisect(&cluster, rng)?;
                    next.push(first);
                    next.push(second);
                } else {
                    next.push(cluster);
                }
            }
            return Ok(next);
        }

        // Unchanged clusters keep their order, the two halves go last
        let index = largest_splittable(&clusters).ok_or_else(|| {
            ClusterError::InvalidCluster("no cluster left to split".to_string())
        })?;
        let mut clusters = clusters;
        let largest = clusters.remove(index);
        let (first, second) = self.bisect(&largest, rng)?;
        clusters.push(first);
        clusters.push(second);

        Ok(clusters)
    }

    fn run_trial(&self, trial: usize) -> Result<Trial> {
        let mut rng = SmallRng::seed_from_u64(self.seed.wrapping_add(trial as u64));
        let mut clusters = vec![Cluster::new(self.points.clone())?];

        while clusters.len() < self.k {
            clusters = self.split_round(clusters, &mut rng)?;
        }

        Trial::evaluate(clusters, self.estimator, self.threshold)
    }
}

/// Index of the biggest cluster that can still be bisected; the first wins ties
fn largest_splittable(clusters: &[Cluster]) -> Option<usize> {
    clusters
        .iter()
        .enumerate()
        .filter(|(_, c)| can_split(c))
        .min_by_key(|(_, c)| Reverse(c.len()))
        .map(|(index, _)| index)
}

impl ClusteringEngine for DivisiveEngine {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Divisive
    }

    fn run(&self) -> Result<ClusteringReport> {
        validate_trials(self.trials)?;
        log::info!(
            "Running divisive clustering on {} points with k = {} ({} trials)",
            self.points.len(),
            self.k,
            self.trials
        );

        let started = Instant::now();
        let best = select_best((0..self.trials).map(|trial| self.run_trial(trial)))?;

        Ok(finish(Algorithm::Divisive, self.k, best, self.trials, started))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(i32, i32)]) -> Vec<Point> {
        raw.iter().copied().map(Point::from).collect()
    }

    fn blobs() -> Vec<Point> {
        let mut points = Vec::new();
        for (cx, cy) in [(0, 0), (1000, 0), (0, 1000), (1000, 1000), (2000, 2000)] {
            for dx in 0..4 {
                for dy in 0..3 {
                    points.push(Point::new(cx + dx * 3, cy + dy * 5));
                }
            }
        }
        points
    }

    #[test]
    fn test_bisect_separates_distant_groups() {
        // Arrange
        let points = pts(&[(0, 0), (1, 1), (2, 0), (100, 100), (101, 101), (102, 100)]);
        let engine = DivisiveEngine::new(points.clone(), 2, CenterEstimator::Centroid).unwrap();
        let cluster = Cluster::new(points).unwrap();
        let mut rng = SmallRng::seed_from_u64(11);

        // Act
        let (first, second) = engine.bisect(&cluster, &mut rng).unwrap();

        // Assert
        assert_eq!(first.len(), 3);
        assert_eq!(second.len(), 3);
        let low = if first.contains(&Point::new(0, 0)) { &first } else { &second };
        assert!(low.contains(&Point::new(1, 1)));
        assert!(low.contains(&Point::new(2, 0)));
    }

    /// An odd-sized compact blob and a far-away pair
    fn blob_and_outliers() -> Vec<Point> {
        let mut points: Vec<Point> = (0..5)
            .flat_map(|x| (0..3).map(move |y| Point::new(x * 3, y * 4)))
            .collect();
        points.push(Point::new(1_000_000, 0));
        points.push(Point::new(1_000_000, 1));
        points
    }

    #[test]
    fn test_bisect_returns_a_fixed_point() {
        let points = blob_and_outliers();
        let engine = DivisiveEngine::new(points.clone(), 2, CenterEstimator::Centroid).unwrap();
        let cluster = Cluster::new(points.clone()).unwrap();

        for seed in 0..20 {
            // Arrange
            let mut rng = SmallRng::seed_from_u64(seed);

            // Act
            let (first, second) = engine.bisect(&cluster, &mut rng).unwrap();

            // Assert: reassigning against the halves' own centers changes nothing
            let centers = [
                engine.estimator.center(first.points()).unwrap(),
                engine.estimator.center(second.points()).unwrap(),
            ];
            let again = split(&points, centers).unwrap();
            assert_eq!(again.0, first.points());
            assert_eq!(again.1, second.points());

            let mut sizes = [first.len(), second.len()];
            sizes.sort_unstable();
            assert_eq!(sizes, [2, 15]);
        }
    }

    #[test]
    fn test_split_ties_go_to_first_center() {
        // (1, 0) is exactly between both centers
        let points = pts(&[(0, 0), (1, 0), (2, 0)]);
        let (first, second) = split(&points, [Point::new(0, 0), Point::new(2, 0)]).unwrap();
        assert_eq!(first, pts(&[(0, 0), (1, 0)]));
        assert_eq!(second, pts(&[(2, 0)]));
    }

    #[test]
    fn test_overshooting_round_splits_only_the_largest() {
        // Arrange: 4 clusters, 3 splittable, k = 5 so splitting all would give 7
        let small = Cluster::new(pts(&[(0, 0), (1, 0)])).unwrap();
        let big = Cluster::new(pts(&[(100, 0), (101, 0), (102, 0), (200, 0), (201, 0)])).unwrap();
        let big_twin = Cluster::new(pts(&[(0, 500), (1, 500), (2, 500), (3, 500), (4, 500)])).unwrap();
        let single = Cluster::singleton(Point::new(-50, -50));
        let clusters = vec![small.clone(), big.clone(), big_twin.clone(), single.clone()];
        let all: Vec<Point> = clusters.iter().flat_map(|c| c.points().iter().copied()).collect();
        let engine = DivisiveEngine::new(all, 5, CenterEstimator::Centroid).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);

        // Act
        let next = engine.split_round(clusters, &mut rng).unwrap();

        // Assert: the first of the two largest was split, the rest kept order
        assert_eq!(next.len(), 5);
        assert_eq!(next[..3], [small, big_twin, single]);
        let halves: Vec<Point> = next[3..]
            .iter()
            .flat_map(|c| c.points().iter().copied())
            .sorted()
            .collect();
        assert_eq!(halves, big.points().iter().copied().sorted().collect::<Vec<_>>());
    }

    #[test]
    fn test_round_within_k_splits_every_splittable_cluster() {
        // Arrange
        let pair = Cluster::new(pts(&[(0, 0), (9, 9)])).unwrap();
        let single = Cluster::singleton(Point::new(50, 50));
        let engine = DivisiveEngine::new(pts(&[(0, 0), (9, 9), (50, 50)]), 3, CenterEstimator::Centroid)
            .unwrap();
        let mut rng = SmallRng::seed_from_u64(5);

        // Act
        let next = engine.split_round(vec![pair, single.clone()], &mut rng).unwrap();

        // Assert
        assert_eq!(next.len(), 3);
        assert_eq!(next[2], single);
        assert!(next[..2].iter().all(|c| c.len() == 1));
    }

    #[test]
    fn test_largest_splittable_skips_identical_points() {
        let repeated = Cluster::new(pts(&[(7, 7), (7, 7), (7, 7)])).unwrap();
        let pair = Cluster::new(pts(&[(0, 0), (1, 1)])).unwrap();
        assert_eq!(largest_splittable(&[repeated, pair]), Some(1));
    }

    #[test]
    fn test_bisect_rejects_identical_points() {
        // Arrange
        let points = pts(&[(4, 4), (4, 4)]);
        let engine = DivisiveEngine::new(points.clone(), 1, CenterEstimator::Centroid).unwrap();
        let mut rng = SmallRng::seed_from_u64(1);

        // Act
        let result = engine.bisect(&Cluster::new(points).unwrap(), &mut rng);

        // Assert
        assert!(matches!(result, Err(ClusterError::InvalidCluster(_))));
    }

    #[test]
    fn test_odd_k_lands_exactly() {
        for k in [3, 5, 6, 7] {
            // Arrange
            let engine = DivisiveEngine::new(blobs(), k, CenterEstimator::Centroid)
                .unwrap()
                .with_trials(2);

            // Act
            let report = engine.run().unwrap();

            // Assert
            assert_eq!(report.partition.len(), k);
            assert_eq!(report.point_count(), 60);
        }
    }

    #[test]
    fn test_k_equal_to_point_count_gives_singletons() {
        // Arrange
        let points = pts(&[(0, 0), (5, 5), (9, 1), (40, 2)]);
        let engine = DivisiveEngine::new(points, 4, CenterEstimator::Centroid).unwrap();

        // Act
        let report = engine.run().unwrap();

        // Assert
        assert!(report.partition.iter().all(|c| c.len() == 1));
    }

    #[test]
    fn test_k_above_point_count_is_rejected() {
        let result = DivisiveEngine::new(pts(&[(0, 0), (1, 1)]), 3, CenterEstimator::Centroid);
        assert!(matches!(result, Err(ClusterError::Configuration(_))));
    }
}
