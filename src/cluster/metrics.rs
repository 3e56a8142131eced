//! Distance, center estimation and partition quality metrics

use crate::cluster::{Algorithm, Center, CenterMode, Cluster, Point};
use crate::error::{ClusterError, Result};
use itertools::Itertools;
use serde::Serialize;

/// Euclidean distance between two points, truncated toward zero
pub fn distance(a: Point, b: Point) -> u64 {
    let dx = (i64::from(a.x) - i64::from(b.x)) as f64;
    let dy = (i64::from(a.y) - i64::from(b.y)) as f64;
    (dx * dx + dy * dy).sqrt() as u64
}

/// Index of the nearest center; the first index wins ties.
/// `None` only when `centers` is empty.
pub fn nearest_center(point: Point, centers: &[Center]) -> Option<usize> {
    centers
        .iter()
        .position_min_by_key(|&&center| distance(point, center))
}

/// Component-wise mean, each component truncated toward zero
pub fn centroid(points: &[Point]) -> Result<Center> {
    if points.is_empty() {
        return Err(empty_cluster("centroid"));
    }

    let n = points.len() as i64;
    let (sum_x, sum_y) = points.iter().fold((0i64, 0i64), |(sx, sy), p| {
        (sx + i64::from(p.x), sy + i64::from(p.y))
    });

    // Integer division truncates toward zero; the mean of i32 values fits i32
    Ok(Point::new((sum_x / n) as i32, (sum_y / n) as i32))
}

/// Member with the smallest squared deviation from the component-wise mean.
/// The first member reaching the minimum is returned.
pub fn medoid(points: &[Point]) -> Result<Center> {
    if points.is_empty() {
        return Err(empty_cluster("medoid"));
    }

    let n = points.len() as f64;
    let mean_x = points.iter().map(|p| f64::from(p.x)).sum::<f64>() / n;
    let mean_y = points.iter().map(|p| f64::from(p.y)).sum::<f64>() / n;

    let mut best = points[0];
    let mut best_deviation = f64::INFINITY;
    for &point in points {
        let dx = f64::from(point.x) - mean_x;
        let dy = f64::from(point.y) - mean_y;
        let deviation = dx * dx + dy * dy;
        if deviation < best_deviation {
            best_deviation = deviation;
            best = point;
        }
    }

    Ok(best)
}

fn empty_cluster(what: &str) -> ClusterError {
    ClusterError::InvalidCluster(format!("cannot compute the {} of an empty cluster", what))
}

/// Strategy used to summarize a cluster by a single center
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CenterEstimator {
    Centroid,
    Medoid,
}

impl CenterEstimator {
    /// Select the estimator from a mode token: centroid k-means (`c`) and
    /// divisive (`d`) use centroids, medoid k-means (`m`) uses medoids
    pub fn from_token(token: &str) -> Result<Self> {
        match token {
            "c" | "centroid-kmeans" | "d" | "divisive" => Ok(CenterEstimator::Centroid),
            "m" | "medoid-kmeans" => Ok(CenterEstimator::Medoid),
            other => Err(ClusterError::Configuration(format!(
                "no center estimator for mode '{}'",
                other
            ))),
        }
    }

    /// K-Means variants and divisive clustering fix their estimator; the
    /// agglomerative engine follows the requested center mode
    pub fn for_algorithm(algorithm: Algorithm, mode: CenterMode) -> Result<Self> {
        match algorithm {
            Algorithm::Agglomerative => Ok(match mode {
                CenterMode::Centroid => CenterEstimator::Centroid,
                CenterMode::Medoid => CenterEstimator::Medoid,
            }),
            fixed => Self::from_token(fixed.token()),
        }
    }

    pub fn center(&self, points: &[Point]) -> Result<Center> {
        match self {
            CenterEstimator::Centroid => centroid(points),
            CenterEstimator::Medoid => medoid(points),
        }
    }
}

/// Mean distance from every member to `center`
pub fn mean_distance(points: &[Point], center: Center) -> f64 {
    use statrs::statistics::Statistics;

    points
        .iter()
        .map(|&point| distance(point, center) as f64)
        .mean()
}

/// Percentage of clusters whose mean member-to-center distance is within `threshold`
pub fn success_rate(
    partition: &[Cluster],
    estimator: CenterEstimator,
    threshold: f64,
) -> Result<f64> {
    if partition.is_empty() {
        return Ok(0.0);
    }

    let mut successful = 0usize;
    for cluster in partition {
        let center = estimator.center(cluster.points())?;
        if mean_distance(cluster.points(), center) <= threshold {
            successful += 1;
        }
    }

    Ok(successful as f64 / partition.len() as f64 * 100.0)
}

/// Product of every cluster's share of the points. Highest when sizes are
/// even; a tiny cluster drives it toward zero.
pub fn balance_score(partition: &[Cluster]) -> f64 {
    let total: usize = partition.iter().map(Cluster::len).sum();
    if total == 0 {
        return 0.0;
    }

    partition
        .iter()
        .map(|cluster| cluster.len() as f64 / total as f64)
        .product()
}

/// Quality of one finished partition, used to compare trials
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualityScore {
    /// Percentage of compact clusters
    pub success_rate: f64,

    /// Size-balance product
    pub balance_score: f64,
}

impl QualityScore {
    pub fn evaluate(
        partition: &[Cluster],
        estimator: CenterEstimator,
        threshold: f64,
    ) -> Result<Self> {
        Ok(Self {
            success_rate: success_rate(partition, estimator, threshold)?,
            balance_score: balance_score(partition),
        })
    }

    /// Higher success rate wins; equal success rates fall back to balance
    pub fn is_better_than(&self, other: &QualityScore) -> bool {
        if self.success_rate != other.success_rate {
            return self.success_rate > other.success_rate;
        }
        self.balance_score > other.balance_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_ulps_eq;

    fn pts(raw: &[(i32, i32)]) -> Vec<Point> {
        raw.iter().copied().map(Point::from).collect()
    }

    #[test]
    fn test_distance_truncates() {
        assert_eq!(distance(Point::new(0, 0), Point::new(3, 4)), 5);
        assert_eq!(distance(Point::new(0, 0), Point::new(1, 1)), 1);
        assert_eq!(distance(Point::new(2, 0), Point::new(0, 0)), 2);
        assert_eq!(distance(Point::new(7, -3), Point::new(7, -3)), 0);
        assert_eq!(
            distance(Point::new(-5000, -5000), Point::new(5000, 5000)),
            distance(Point::new(5000, 5000), Point::new(-5000, -5000))
        );
    }

    #[test]
    fn test_distance_does_not_overflow() {
        let far = distance(Point::new(i32::MIN, 0), Point::new(0, 0));
        assert_eq!(far, 1u64 << 31);
    }

    #[test]
    fn test_centroid_truncates_toward_zero() {
        // Arrange
        let cluster = pts(&[(0, 0), (1, 1), (2, 0)]);
        let negative = pts(&[(-1, -1), (-2, 0)]);

        // Act / Assert
        assert_eq!(centroid(&cluster).unwrap(), Point::new(1, 0));
        assert_eq!(centroid(&negative).unwrap(), Point::new(-1, 0));
    }

    #[test]
    fn test_empty_cluster_has_no_center() {
        assert!(matches!(centroid(&[]), Err(ClusterError::InvalidCluster(_))));
        assert!(matches!(medoid(&[]), Err(ClusterError::InvalidCluster(_))));
    }

    #[test]
    fn test_medoid_is_a_member_closest_to_mean() {
        // Arrange: mean is (25.75, 25.25)
        let cluster = pts(&[(100, 100), (0, 0), (1, 1), (2, 0)]);

        // Act
        let center = medoid(&cluster).unwrap();

        // Assert
        assert_eq!(center, Point::new(1, 1));
    }

    #[test]
    fn test_medoid_tie_keeps_first_member() {
        let cluster = pts(&[(2, 0), (0, 0)]);
        assert_eq!(medoid(&cluster).unwrap(), Point::new(2, 0));
    }

    #[test]
    fn test_estimator_selection() {
        assert_eq!(CenterEstimator::from_token("c"), Ok(CenterEstimator::Centroid));
        assert_eq!(CenterEstimator::from_token("d"), Ok(CenterEstimator::Centroid));
        assert_eq!(CenterEstimator::from_token("m"), Ok(CenterEstimator::Medoid));
        assert!(CenterEstimator::from_token("x").is_err());
        assert_eq!(
            CenterEstimator::for_algorithm(Algorithm::Agglomerative, CenterMode::Medoid),
            Ok(CenterEstimator::Medoid)
        );
        assert_eq!(
            CenterEstimator::for_algorithm(Algorithm::Divisive, CenterMode::Medoid),
            Ok(CenterEstimator::Centroid)
        );
        assert_eq!(
            CenterEstimator::for_algorithm(Algorithm::MedoidKMeans, CenterMode::Centroid),
            Ok(CenterEstimator::Medoid)
        );
    }

    #[test]
    fn test_success_rate_counts_compact_clusters() {
        // Arrange
        let compact = Cluster::new(pts(&[(0, 0), (10, 0)])).unwrap();
        let sparse = Cluster::new(pts(&[(0, 0), (3000, 0)])).unwrap();

        // Act
        let rate = success_rate(&[compact, sparse], CenterEstimator::Centroid, 500.0).unwrap();

        // Assert
        assert_ulps_eq!(rate, 50.0);
    }

    #[test]
    fn test_balance_score() {
        // Arrange
        let even = vec![
            Cluster::new(pts(&[(0, 0), (1, 0)])).unwrap(),
            Cluster::new(pts(&[(5, 0), (6, 0)])).unwrap(),
        ];
        let uneven = vec![
            Cluster::new(pts(&[(0, 0), (1, 0), (5, 0)])).unwrap(),
            Cluster::singleton(Point::new(6, 0)),
        ];

        // Act / Assert
        assert_ulps_eq!(balance_score(&even), 0.25);
        assert_ulps_eq!(balance_score(&uneven), 0.1875);
    }

    #[test]
    fn test_score_ordering() {
        let high = QualityScore { success_rate: 100.0, balance_score: 0.01 };
        let low = QualityScore { success_rate: 50.0, balance_score: 0.25 };
        let balanced = QualityScore { success_rate: 100.0, balance_score: 0.2 };

        assert!(high.is_better_than(&low));
        assert!(balanced.is_better_than(&high));
        assert!(!high.is_better_than(&high));
    }
}
