//! Pairwise center-distance matrix for agglomerative clustering

use crate::cluster::metrics::distance;
use crate::cluster::Center;
use itertools::Itertools;
use ndarray::{s, Array2};

/// Distance stored on the diagonal; a cluster is never its own merge candidate
pub const INFINITE: u64 = u64::MAX;

/// Square, symmetric distance table indexed by live cluster slot.
///
/// Slots are positional: removing a pair compacts every later slot down so
/// row `i` always describes the `i`-th live cluster. The backing array keeps
/// its allocation; only the top-left `live x live` window is meaningful.
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    cells: Array2<u64>,
    live: usize,
}

/// Cheapest merge candidate found by [`DistanceMatrix::closest_pair`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosestPair {
    pub row: usize,
    pub column: usize,
    pub distance: u64,
}

impl DistanceMatrix {
    /// Build the full table over `centers`
    pub fn from_centers(centers: &[Center]) -> Self {
        let n = centers.len();
        let cells = Array2::from_shape_fn((n, n), |(row, column)| {
            if row == column {
                INFINITE
            } else {
                distance(centers[row], centers[column])
            }
        });
        Self { cells, live: n }
    }

    /// Number of live slots (rows == columns)
    pub fn dim(&self) -> usize {
        self.live
    }

    pub fn get(&self, row: usize, column: usize) -> u64 {
        debug_assert!(row < self.live && column < self.live);
        self.cells[[row, column]]
    }

    /// Global minimum over every row's minimum. Within a row the lowest column
    /// wins ties, across rows the lowest row wins.
    pub fn closest_pair(&self) -> Option<ClosestPair> {
        let mut best: Option<ClosestPair> = None;
        let window = self.cells.slice(s![..self.live, ..self.live]);

        for (row, values) in window.outer_iter().enumerate() {
            let column = match values.iter().position_min() {
                Some(column) => column,
                None => continue,
            };
            let value = values[column];
            if value == INFINITE {
                continue;
            }

            if best.map_or(true, |current| value < current.distance) {
                best = Some(ClosestPair {
                    row,
                    column,
                    distance: value,
                });
            }
        }

        best
    }

    /// Drop the rows and columns of slots `a` and `b`, compacting in place.
    ///
    /// Cells are moved in row-major order and every source cell sits at or
    /// after its target, so no value is overwritten before it is read.
    pub fn remove_pair(&mut self, a: usize, b: usize) {
        debug_assert!(a != b && a < self.live && b < self.live);
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        let source = |i: usize| {
            if i < lo {
                i
            } else if i + 1 < hi {
                i + 1
            } else {
                i + 2
            }
        };

        let live = self.live - 2;
        for row in 0..live {
            // Rows above `lo` keep their leading columns untouched
            let first = if row < lo { lo } else { 0 };
            let from = source(row);
            for column in first..live {
                let value = self.cells[[from, source(column)]];
                self.cells[[row, column]] = value;
            }
        }
        self.live = live;
    }

    /// Append a slot whose distances to the existing slots are `distances`
    pub fn push(&mut self, distances: &[u64]) {
        let n = self.live;
        debug_assert_eq!(distances.len(), n, "one distance per live slot");

        if n == self.cells.nrows() {
            let mut grown = Array2::from_elem((n + 1, n + 1), INFINITE);
            grown
                .slice_mut(s![..n, ..n])
                .assign(&self.cells.slice(s![..n, ..n]));
            self.cells = grown;
        }

        for (slot, &value) in distances.iter().enumerate() {
            self.cells[[n, slot]] = value;
            self.cells[[slot, n]] = value;
        }
        self.cells[[n, n]] = INFINITE;
        self.live = n + 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Point;

    fn centers() -> Vec<Center> {
        vec![
            Point::new(0, 0),
            Point::new(10, 0),
            Point::new(0, 3),
            Point::new(50, 50),
        ]
    }

    #[test]
    fn test_matrix_is_symmetric_with_infinite_diagonal() {
        // Act
        let matrix = DistanceMatrix::from_centers(&centers());

        // Assert
        assert_eq!(matrix.dim(), 4);
        for i in 0..4 {
            assert_eq!(matrix.get(i, i), INFINITE);
            for j in 0..4 {
                assert_eq!(matrix.get(i, j), matrix.get(j, i));
            }
        }
        assert_eq!(matrix.get(0, 1), 10);
    }

    #[test]
    fn test_closest_pair_prefers_lowest_indices() {
        // Arrange: (0,0)-(0,3) = 3 and (0,3)-(0,6) = 3
        let matrix = DistanceMatrix::from_centers(&[
            Point::new(0, 0),
            Point::new(0, 3),
            Point::new(0, 6),
        ]);

        // Act
        let pair = matrix.closest_pair().unwrap();

        // Assert
        assert_eq!(pair, ClosestPair { row: 0, column: 1, distance: 3 });
    }

    #[test]
    fn test_single_slot_has_no_pair() {
        let matrix = DistanceMatrix::from_centers(&[Point::new(1, 1)]);
        assert_eq!(matrix.closest_pair(), None);
    }

    #[test]
    fn test_remove_then_push_keeps_distances_aligned() {
        // Arrange
        let mut matrix = DistanceMatrix::from_centers(&centers());

        // Act: drop slots 0 and 2, leaving (10,0) and (50,50), then add (5,1)
        matrix.remove_pair(2, 0);
        let merged = Point::new(5, 1);
        let remaining = [Point::new(10, 0), Point::new(50, 50)];
        let distances: Vec<u64> = remaining.iter().map(|&c| distance(merged, c)).collect();
        matrix.push(&distances);

        // Assert
        let expected = DistanceMatrix::from_centers(&[remaining[0], remaining[1], merged]);
        assert_eq!(matrix.dim(), 3);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(matrix.get(i, j), expected.get(i, j));
            }
        }
    }

    fn assert_matches(matrix: &DistanceMatrix, expected: &DistanceMatrix) {
        assert_eq!(matrix.dim(), expected.dim());
        for i in 0..expected.dim() {
            for j in 0..expected.dim() {
                assert_eq!(matrix.get(i, j), expected.get(i, j), "cell ({}, {})", i, j);
            }
        }
    }

    #[test]
    fn test_remove_inner_pair_compacts_in_place() {
        // Arrange
        let points = vec![
            Point::new(0, 0),
            Point::new(7, 1),
            Point::new(-4, 9),
            Point::new(30, -2),
            Point::new(12, 12),
        ];
        let mut matrix = DistanceMatrix::from_centers(&points);

        // Act
        matrix.remove_pair(3, 1);

        // Assert
        let expected = DistanceMatrix::from_centers(&[points[0], points[2], points[4]]);
        assert_matches(&matrix, &expected);
        assert_eq!(matrix.closest_pair(), expected.closest_pair());
    }

    #[test]
    fn test_push_reuses_freed_slots_and_grows_when_full() {
        // Arrange
        let mut points = centers();
        let mut matrix = DistanceMatrix::from_centers(&points);

        // Act: refill the freed slot, then grow past the original size
        matrix.remove_pair(0, 3);
        points = vec![points[1], points[2]];
        for extra in [Point::new(-8, 4), Point::new(3, 3), Point::new(20, -9)] {
            let distances: Vec<u64> = points.iter().map(|&c| distance(extra, c)).collect();
            matrix.push(&distances);
            points.push(extra);
        }

        // Assert
        assert_matches(&matrix, &DistanceMatrix::from_centers(&points));
        assert_eq!(matrix.dim(), 5);
    }
}
