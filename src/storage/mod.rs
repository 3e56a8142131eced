//! Results persistence module

use anyhow::Result;
use crate::cluster::ClusteringReport;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use serde_json::{json, to_string_pretty};

/// Save a finished run to the specified directory
pub fn save_results(report: &ClusteringReport, output_dir: &str) -> Result<()> {
    log::info!("Saving {} clusters to {}", report.partition.len(), output_dir);

    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    // Save summary information
    save_summary(report, output_dir)?;

    // Save each cluster with its center
    save_clusters(report, output_dir)?;

    log::info!("Results saved successfully");

    Ok(())
}

/// Save run statistics
fn save_summary(report: &ClusteringReport, output_dir: &str) -> Result<()> {
    let path = Path::new(output_dir).join("summary.json");
    let mut file = File::create(path)?;

    // Create summary object
    let sizes = report.partition.iter().map(|c| c.len());
    let summary = json!({
        "algorithm": report.algorithm,
        "k": report.k,
        "point_count": report.point_count(),
        "trials": report.trials,
        "elapsed_ms": report.elapsed.as_secs_f64() * 1000.0,
        "success_rate": report.score.success_rate,
        "balance_score": report.score.balance_score,
        "cluster_stats": {
            "largest_cluster_size": sizes.clone().max().unwrap_or(0),
            "smallest_cluster_size": sizes.min().unwrap_or(0),
            "avg_cluster_size": report.point_count() as f64 /
                                if report.partition.is_empty() { 1.0 } else { report.partition.len() as f64 },
        }
    });

    file.write_all(to_string_pretty(&summary)?.as_bytes())?;

    Ok(())
}

/// Save every cluster with its center and members
fn save_clusters(report: &ClusteringReport, output_dir: &str) -> Result<()> {
    let path = Path::new(output_dir).join("clusters.json");
    let mut file = File::create(path)?;

    // One entry per cluster, in partition order
    let clusters_json = json!({
        "clusters": report.partition.iter().zip(&report.centers).enumerate().map(|(id, (cluster, center))| {
            json!({
                "id": id,
                "size": cluster.len(),
                "center": center,
                "points": cluster.points(),
            })
        }).collect::<Vec<_>>()
    });

    file.write_all(to_string_pretty(&clusters_json)?.as_bytes())?;

    Ok(())
}
