//! Synthetic point-cloud generation

use crate::cluster::Point;
use crate::config::Config;
use crate::error::{ClusterError, Result};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

/// Rejected draws tolerated per requested point before giving up
const MAX_ATTEMPTS_PER_POINT: usize = 1000;

/// Generate `config.num_points` unique points.
///
/// The first `config.seed_points` points are spread uniformly over the
/// coordinate range. Every further point is a random existing point shifted
/// by a random offset; draws that leave the range or repeat a point are
/// discarded.
pub fn generate_points(config: &Config) -> Result<Vec<Point>> {
    let side = i64::from(*config.coordinate_range.end()) - i64::from(*config.coordinate_range.start()) + 1;
    if side <= 0 {
        return Err(ClusterError::Configuration(
            "coordinate range is empty".to_string(),
        ));
    }
    if config.offset_range.is_empty() {
        return Err(ClusterError::Configuration("offset range is empty".to_string()));
    }
    if (config.num_points as u128) > (side as u128) * (side as u128) {
        return Err(ClusterError::Configuration(format!(
            "cannot place {} unique points in a {}x{} grid",
            config.num_points, side, side
        )));
    }

    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut seen: HashSet<Point> = HashSet::with_capacity(config.num_points);
    let mut points: Vec<Point> = Vec::with_capacity(config.num_points);
    let max_attempts = config.num_points.saturating_mul(MAX_ATTEMPTS_PER_POINT);
    let mut attempts = 0usize;

    let seed_points = config.seed_points.min(config.num_points);
    while points.len() < seed_points {
        let candidate = Point::new(
            rng.gen_range(config.coordinate_range.clone()),
            rng.gen_range(config.coordinate_range.clone()),
        );
        if seen.insert(candidate) {
            points.push(candidate);
        }
    }

    while points.len() < config.num_points {
        attempts += 1;
        if attempts > max_attempts {
            return Err(ClusterError::Configuration(format!(
                "gave up after placing {} of {} points",
                points.len(),
                config.num_points
            )));
        }

        // Without seed points there is nothing to offset from
        let anchor = match points.choose(&mut rng) {
            Some(&anchor) => anchor,
            None => Point::new(
                rng.gen_range(config.coordinate_range.clone()),
                rng.gen_range(config.coordinate_range.clone()),
            ),
        };
        let x = anchor.x.saturating_add(rng.gen_range(config.offset_range.clone()));
        let y = anchor.y.saturating_add(rng.gen_range(config.offset_range.clone()));

        if !config.coordinate_range.contains(&x) || !config.coordinate_range.contains(&y) {
            continue;
        }

        let candidate = Point::new(x, y);
        if seen.insert(candidate) {
            points.push(candidate);
        }
    }

    log::info!("Generated {} unique points", points.len());

    Ok(points)
}
