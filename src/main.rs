use anyhow::Result;
use clap::Parser;
use point_cluster_analyzer::config::Config;
use point_cluster_analyzer::{build_engine, data, storage, viz, Algorithm, CenterMode};

#[derive(Parser, Debug)]
#[clap(
    name = "point-cluster-analyzer",
    about = "Partition a synthetic 2-D point cloud into k clusters"
)]
struct Cli {
    /// Algorithm: centroid k-means = c, medoid k-means = m, divisive = d, agglomerative = a
    #[clap(long, short)]
    algorithm: String,

    /// Number of clusters (1 <= k <= number of points)
    #[clap(long = "clusters", short = 'k')]
    clusters: usize,

    /// Center estimator for agglomerative clustering (centroid or medoid)
    #[clap(long, default_value = "centroid")]
    center_mode: String,

    /// Number of randomized trials for k-means and divisive clustering
    #[clap(long, default_value = "5")]
    trials: usize,

    /// Random seed for point generation and trials
    #[clap(long, default_value = "2515546116454")]
    seed: u64,

    /// Number of points to generate
    #[clap(long, default_value = "1020")]
    points: usize,

    /// Output directory for results
    #[clap(long, default_value = "cluster_results")]
    output_dir: String,

    /// Skip the scatter plot
    #[clap(long)]
    skip_viz: bool,

    /// Verbose logging
    #[clap(long, short)]
    verbose: bool,
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Cli::parse();

    // Configure logging
    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();

    // Reject bad tokens before generating anything
    let algorithm: Algorithm = args.algorithm.parse()?;
    let center_mode: CenterMode = args.center_mode.parse()?;

    // Trial counts and generator size come from the command line
    let config = Config::new(args.trials, args.trials, args.seed).with_num_points(args.points);

    log::info!("Starting point cluster analysis");
    log::info!("Algorithm: {}, k = {}", algorithm, args.clusters);

    // 1. Generate points
    let points = data::generate_points(&config)?;

    // 2. Cluster
    let engine = build_engine(algorithm, center_mode, points, args.clusters, &config)?;
    let report = engine.run()?;

    log::info!("Elapsed time: {:?}", report.elapsed);
    log::info!("Success rate: {:.2}%", report.success_rate());
    log::info!("Balance score: {:.6e}", report.score.balance_score);

    // 3. Save results (creates the output directory)
    storage::save_results(&report, &args.output_dir)?;

    // 4. Generate visualizations if requested
    if !args.skip_viz {
        viz::generate_visualizations(&report, &args.output_dir)?;
    }

    log::info!("Analysis complete. Results saved to {}", args.output_dir);

    Ok(())
}
