//! innervation CLI: measure single images, replay recorded sessions, and
//! export calibrated previews.

use clap::{Args, Parser, Subcommand};
use log::info;
use std::path::{Path, PathBuf};

use innervation::measure::{compute_index, ThresholdConfig};
use innervation::raw::load_calibrated;
use innervation::script::{load_script, replay};
use innervation::state::{AdjustmentSettings, Session, SessionConfig};
use innervation::ui::canvas::Point;
use innervation::ui::roi::{RoiMask, RoiShape};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "innervation")]
#[command(about = "Measure the innervation index of grayscale microscopy images")]
#[command(version)]
struct Cli {
    /// Session config (JSON). Defaults to the user config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure one image inside a polygon given in image pixels.
    Measure(MeasureArgs),

    /// Replay a recorded session script (JSON command list).
    Replay {
        /// Path to the script.
        #[arg(long)]
        script: PathBuf,

        /// Folder relative LoadFolder paths are resolved against
        /// (default: the script's folder).
        #[arg(long)]
        base: Option<PathBuf>,
    },

    /// Write the 8-bit calibrated version of an image.
    Calibrate {
        /// Path to the input image.
        #[arg(long)]
        image: PathBuf,

        /// Output path (format from extension).
        #[arg(long)]
        out: PathBuf,
    },

    /// Print the effective session config as JSON.
    ShowConfig,
}

#[derive(Debug, Clone, Args)]
struct MeasureArgs {
    /// Path to the input image.
    #[arg(long)]
    image: PathBuf,

    /// Polygon vertices as "x,y;x,y;x,y" in image pixels.
    #[arg(long)]
    roi: String,

    /// Fit the threshold with Otsu's method on the ROI pixels.
    #[arg(long, conflicts_with = "cutoff")]
    otsu: bool,

    /// Fixed cutoff; pixels strictly above it count. Overrides the config.
    #[arg(long)]
    cutoff: Option<String>,

    /// Contrast factor (0.5 to 3.0).
    #[arg(long, default_value = "1.0")]
    contrast: f64,

    /// Brightness factor (0.5 to 3.0).
    #[arg(long, default_value = "1.0")]
    brightness: f64,

    /// Gaussian blur radius (0.0 to 5.0).
    #[arg(long, default_value = "0.0")]
    blur: f64,
}

fn main() -> CliResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Measure(args) => run_measure(&args, &config),
        Commands::Replay { script, base } => run_replay(&script, base.as_deref(), config),
        Commands::Calibrate { image, out } => run_calibrate(&image, &out),
        Commands::ShowConfig => {
            println!("{}", config.to_json()?);
            Ok(())
        }
    }
}

fn load_config(explicit: Option<&Path>) -> CliResult<SessionConfig> {
    match explicit {
        Some(path) => Ok(SessionConfig::load(path)?),
        None => match SessionConfig::default_path() {
            Some(path) => Ok(SessionConfig::load_or_default(&path)?),
            None => Ok(SessionConfig::default()),
        },
    }
}

// ── measure ────────────────────────────────────────────────────────────

fn parse_polygon(text: &str) -> CliResult<Vec<Point>> {
    text.split(';')
        .filter(|pair| !pair.trim().is_empty())
        .map(|pair| -> CliResult<Point> {
            let (x, y) = pair
                .split_once(',')
                .ok_or_else(|| -> CliError { format!("invalid vertex {:?}, expected x,y", pair).into() })?;
            Ok(Point::new(x.trim().parse()?, y.trim().parse()?))
        })
        .collect()
}

fn run_measure(args: &MeasureArgs, config: &SessionConfig) -> CliResult<()> {
    let calibrated = load_calibrated(&args.image)?;
    let vertices = parse_polygon(&args.roi)?;
    let shape = RoiShape::new(vertices)?;
    let mask = RoiMask::from_polygon(shape.points(), calibrated.width(), calibrated.height());

    let threshold = if args.otsu {
        ThresholdConfig::Otsu
    } else if let Some(text) = &args.cutoff {
        ThresholdConfig::cutoff_or_default(text)
    } else {
        config.threshold
    };
    let settings = AdjustmentSettings::new(args.contrast, args.brightness, args.blur);

    let m = compute_index(&calibrated, &mask, &settings, &threshold);
    println!(
        "{}\t{:.6}\t(threshold {:.1}, {} of {} pixels)",
        args.image.display(),
        m.index,
        m.threshold,
        m.above,
        m.samples
    );
    Ok(())
}

// ── replay ─────────────────────────────────────────────────────────────

fn run_replay(script: &Path, base: Option<&Path>, config: SessionConfig) -> CliResult<()> {
    let commands = load_script(script)?;
    let base = match base {
        Some(dir) => dir.to_path_buf(),
        None => script.parent().map(Path::to_path_buf).unwrap_or_default(),
    };
    info!("▶️  Replaying {} commands from {}", commands.len(), script.display());

    let mut session = Session::new(config);
    let summary = replay(&mut session, &commands, &base);

    println!("{} applied, {} failed", summary.applied, summary.failed);
    println!("State: {:?}", session.state());
    if let Some(progress) = session.progress() {
        println!("{}", progress);
    }
    for skipped in session.skipped() {
        println!("skipped {}: {}", skipped.filename, skipped.reason);
    }
    if let Some(log) = session.result_log() {
        println!("Results: {}", log.path().display());
    }
    Ok(())
}

// ── calibrate ──────────────────────────────────────────────────────────

fn run_calibrate(image: &Path, out: &Path) -> CliResult<()> {
    let calibrated = load_calibrated(image)?;
    calibrated.pixels().save(out)?;
    println!(
        "{} → {} (range {:.1}..{:.1})",
        image.display(),
        out.display(),
        calibrated.low,
        calibrated.high
    );
    Ok(())
}
