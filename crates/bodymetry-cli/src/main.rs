//! bodymetry CLI — command-line interface for four-view body measurement.

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use bodymetry::{LevelTable, MeasureConfig, Measurer, ViewAngle, ViewFrames};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "bodymetry")]
#[command(
    about = "Estimate body circumferences (chest, waist, hip, limbs) from four silhouette views"
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a measurement session over four per-view frame directories.
    Measure(CliMeasureArgs),

    /// Print the embedded default level table.
    LevelsInfo,
}

#[derive(Debug, Clone, Args)]
struct CliMeasureArgs {
    /// Directory of front-view frames (sorted by file name).
    #[arg(long)]
    front: PathBuf,

    /// Directory of back-view frames.
    #[arg(long)]
    back: PathBuf,

    /// Directory of left-view frames.
    #[arg(long)]
    left: PathBuf,

    /// Directory of right-view frames.
    #[arg(long)]
    right: PathBuf,

    /// Declared subject height in centimeters.
    #[arg(long)]
    height_cm: f64,

    /// Directory to write the timestamped result record into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Path to a JSON level table overriding the embedded default.
    #[arg(long)]
    levels: Option<PathBuf>,

    /// Maximum frames consumed per view.
    #[arg(long, default_value = "30")]
    max_frames: usize,

    /// Gaussian blur sigma applied before edge detection.
    #[arg(long, default_value = "1.4")]
    blur_sigma: f32,

    /// Canny low threshold.
    #[arg(long, default_value = "20.0")]
    canny_low: f32,

    /// Canny high threshold.
    #[arg(long, default_value = "60.0")]
    canny_high: f32,

    /// Minimum enclosed contour area in pixels for a frame to count.
    #[arg(long, default_value = "500.0")]
    min_area: f64,

    /// Douglas-Peucker simplification tolerance in pixels.
    #[arg(long, default_value = "2.0")]
    dp_epsilon: f64,

    /// Minimum fraction of frames that must yield a contour per view.
    #[arg(long, default_value = "0.5")]
    min_accept_fraction: f64,

    /// Number of diagnostic width samples along the body height.
    #[arg(long, default_value = "20")]
    n_grid: usize,
}

impl CliMeasureArgs {
    fn to_config(&self) -> CliResult<MeasureConfig> {
        let mut config = MeasureConfig::default();
        config.silhouette.max_frames = self.max_frames;
        config.silhouette.blur_sigma = self.blur_sigma;
        config.silhouette.canny_low = self.canny_low;
        config.silhouette.canny_high = self.canny_high;
        config.silhouette.min_area_px = self.min_area;
        config.silhouette.dp_epsilon_px = self.dp_epsilon;
        config.silhouette.min_accept_fraction = self.min_accept_fraction;
        config.n_grid = self.n_grid;

        if let Some(path) = &self.levels {
            let text = std::fs::read_to_string(path).map_err(|e| -> CliError {
                format!("failed to read level table {}: {}", path.display(), e).into()
            })?;
            let table: LevelTable = serde_json::from_str(&text).map_err(|e| -> CliError {
                format!("invalid level table {}: {}", path.display(), e).into()
            })?;
            config.levels = table;
        }

        Ok(config)
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Measure(args) => run_measure(&args),
        Commands::LevelsInfo => run_levels_info(),
    }
}

// ── levels-info ────────────────────────────────────────────────────────

fn run_levels_info() -> CliResult<()> {
    let table = LevelTable::default();

    println!("bodymetry embedded level table");
    println!("  levels: {}", table.entries.len());
    for entry in table.iter() {
        println!(
            "  {:<12} ratio {:+.2}  ({:?})",
            entry.level, entry.ratio, entry.anchor
        );
    }

    Ok(())
}

// ── measure ────────────────────────────────────────────────────────────

fn run_measure(args: &CliMeasureArgs) -> CliResult<()> {
    if !args.height_cm.is_finite() || args.height_cm <= 0.0 {
        return Err("--height-cm must be a positive number".into());
    }

    let config = args.to_config()?;

    let views = ViewFrames {
        front: load_view_frames(&args.front, ViewAngle::Front, args.max_frames)?,
        back: load_view_frames(&args.back, ViewAngle::Back, args.max_frames)?,
        left: load_view_frames(&args.left, ViewAngle::Left, args.max_frames)?,
        right: load_view_frames(&args.right, ViewAngle::Right, args.max_frames)?,
    };

    let measurer = Measurer::with_config(config);
    let result = measurer.measure(&views, args.height_cm)?;

    tracing::info!(
        "Measured {} levels at scale {:.4} cm/px",
        result.circumferences_cm.len(),
        result.scale_cm_per_px,
    );
    for (level, cm) in &result.circumferences_cm {
        tracing::info!("  {:<12} {:.2} cm", level, cm);
    }

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    let out_path = args
        .out_dir
        .join(format!("body_measurements_{}.json", timestamp));

    std::fs::create_dir_all(&args.out_dir)?;
    let json = serde_json::to_string_pretty(&result)?;
    std::fs::write(&out_path, &json)?;
    tracing::info!("Results written to {}", out_path.display());

    Ok(())
}

/// Load the frame sequence for one view from a directory, ordered by
/// file name. Only files with common image extensions are considered.
fn load_view_frames(
    dir: &Path,
    view: ViewAngle,
    max_frames: usize,
) -> CliResult<Vec<image::DynamicImage>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|e| -> CliError {
            format!("failed to read {} view directory {}: {}", view, dir.display(), e).into()
        })?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| is_image_path(p))
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(format!("no image files in {} view directory {}", view, dir.display()).into());
    }

    let mut frames = Vec::with_capacity(paths.len().min(max_frames));
    for path in paths.iter().take(max_frames) {
        let img = image::open(path).map_err(|e| -> CliError {
            format!("failed to open frame {}: {}", path.display(), e).into()
        })?;
        frames.push(img);
    }

    tracing::info!("{}: loaded {} frames from {}", view, frames.len(), dir.display());
    Ok(frames)
}

fn is_image_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some(ext) if matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg")
    )
}
