//! Visualization generation module

use anyhow::Result;
use crate::cluster::{ClusteringReport, Point};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

/// Colors cycled across clusters
const COLORS: [&str; 23] = [
    "aqua", "azure", "beige", "blue", "brown", "chartreuse", "chocolate", "coral", "crimson",
    "darkblue", "darkgreen", "fuchsia", "gold", "grey", "khaki", "lavender", "magenta", "orange",
    "pink", "red", "violet", "yellow", "plum",
];

/// Drawing area in pixels, excluding the margin
const CANVAS: f64 = 800.0;
const MARGIN: f64 = 20.0;

/// Render the partition as a scatter plot in `output_dir/scatter.html`
pub fn generate_visualizations(report: &ClusteringReport, output_dir: &str) -> Result<()> {
    log::info!("Generating scatter plot for {} clusters", report.partition.len());

    fs::create_dir_all(output_dir)?;
    let path = Path::new(output_dir).join("scatter.html");
    let mut file = File::create(&path)?;

    let bounds = Bounds::of(report.partition.iter().flat_map(|c| c.points().iter().copied()));
    let size = CANVAS + 2.0 * MARGIN;

    writeln!(file, "<!DOCTYPE html>")?;
    writeln!(file, "<html lang=\"en\">")?;
    writeln!(file, "<head>")?;
    writeln!(file, "  <meta charset=\"UTF-8\">")?;
    writeln!(file, "  <title>{} clustering, k = {}</title>", report.algorithm, report.k)?;
    writeln!(file, "  <style>")?;
    writeln!(file, "    body {{ font-family: Arial, sans-serif; margin: 20px; }}")?;
    writeln!(file, "    svg {{ background-color: #222; }}")?;
    writeln!(file, "  </style>")?;
    writeln!(file, "</head>")?;
    writeln!(file, "<body>")?;
    writeln!(file, "  <h1>{} clustering, k = {}</h1>", report.algorithm, report.k)?;
    writeln!(
        file,
        "  <p>Success rate: {:.2}% &middot; Time: {:?}</p>",
        report.success_rate(),
        report.elapsed
    )?;
    writeln!(file, "  <svg width=\"{0}\" height=\"{0}\" viewBox=\"0 0 {0} {0}\">", size)?;

    for (id, cluster) in report.partition.iter().enumerate() {
        let color = COLORS[id % COLORS.len()];
        writeln!(file, "    <g fill=\"{}\">", color)?;
        for &point in cluster.points() {
            let (x, y) = bounds.project(point);
            writeln!(file, "      <circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"2\"/>", x, y)?;
        }
        writeln!(file, "    </g>")?;
    }

    writeln!(file, "  </svg>")?;
    writeln!(file, "</body>")?;
    writeln!(file, "</html>")?;

    log::info!("Scatter plot written to {}", path.display());

    Ok(())
}

/// Bounding box used to map point coordinates onto the canvas
struct Bounds {
    min_x: f64,
    min_y: f64,
    span: f64,
}

impl Bounds {
    fn of(points: impl Iterator<Item = Point>) -> Self {
        let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
        let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            min_x = min_x.min(f64::from(p.x));
            min_y = min_y.min(f64::from(p.y));
            max_x = max_x.max(f64::from(p.x));
            max_y = max_y.max(f64::from(p.y));
        }

        if !min_x.is_finite() {
            return Self { min_x: 0.0, min_y: 0.0, span: 1.0 };
        }

        // Keep the aspect ratio; a single point still needs a non-zero span
        let span = (max_x - min_x).max(max_y - min_y).max(1.0);
        Self { min_x, min_y, span }
    }

    /// SVG coordinates; y grows downward on screen
    fn project(&self, point: Point) -> (f64, f64) {
        let x = MARGIN + (f64::from(point.x) - self.min_x) / self.span * CANVAS;
        let y = MARGIN + CANVAS - (f64::from(point.y) - self.min_y) / self.span * CANVAS;
        (x, y)
    }
}
