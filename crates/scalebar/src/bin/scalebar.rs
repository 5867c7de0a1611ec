//! scalebar CLI: estimate pixels per unit from a checkerboard scale bar.

use clap::{ArgAction, Parser, ValueEnum};
use scalebar::calib::{CropFraction, LocateParams, Position, ScaleParams, ScaleReport};
use scalebar::corners::{CornerDetectorConfig, GoodFeaturesParams, ShiTomasiParams};
use scalebar::detect;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser, Debug)]
#[command(name = "scalebar")]
#[command(about = "Estimate the image scale (pixels per unit) from a checkerboard scale bar")]
#[command(version)]
struct Cli {
    /// Path to the input image.
    image: PathBuf,

    /// Region holding the scale bar (top_right, bottom_left, top, ...), or
    /// `auto`. Defaults to the configured position, top_right.
    #[arg(long, short = 'p')]
    position: Option<Placement>,

    /// Size of a single checkerboard square in physical units (e.g. mm).
    #[arg(long, short = 'u')]
    unit: Option<f64>,

    /// Crop fraction: one value for both axes, or `x,y`.
    #[arg(long)]
    crop: Option<CropFraction>,

    /// Use a square crop with the smaller of the two extents.
    #[arg(long)]
    square: bool,

    /// Corner detection strategy.
    #[arg(long, value_enum)]
    detector: Option<DetectorArg>,

    /// Maximum number of corners to keep.
    #[arg(long)]
    max_corners: Option<usize>,

    /// Minimum distance between corners in pixels.
    #[arg(long)]
    min_distance: Option<usize>,

    /// Drop corners on flat background before measuring.
    #[arg(long)]
    filter: bool,

    /// Rotate corners to axis alignment before measuring.
    #[arg(long)]
    rectify: bool,

    /// Blur and Otsu-threshold the crop before corner detection.
    #[arg(long)]
    binarize: bool,

    /// JSON parameter file; command-line flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write a JSON diagnostics report to this path.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Write the scale to this file instead of stdout. Must not exist.
    #[arg(long, short = 'o')]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). With the
    /// `tracing` feature `RUST_LOG` takes precedence.
    #[arg(long, short = 'v', action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug)]
enum Placement {
    Auto,
    At(Position),
}

impl FromStr for Placement {
    type Err = scalebar::calib::RegionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("auto") {
            Ok(Placement::Auto)
        } else {
            s.parse().map(Placement::At)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DetectorArg {
    /// Min-eigenvalue corners with sub-pixel refinement.
    GoodFeatures,
    /// Shi-Tomasi response peaks.
    ShiTomasi,
}

/// `-v` sets the level; with the `tracing` feature `RUST_LOG` overrides it.
fn init_logging(verbose: u8) {
    let level = scalebar::core::level_from_verbosity(verbose);
    #[cfg(feature = "tracing")]
    scalebar::core::init_tracing(false, level);
    #[cfg(not(feature = "tracing"))]
    let _ = scalebar::core::init_with_level(level);
}

/// Apply command-line overrides on top of the configured parameters.
fn build_params(cli: &Cli) -> CliResult<ScaleParams> {
    let mut params = match &cli.config {
        Some(path) => ScaleParams::load_json(path)?,
        None => ScaleParams::default(),
    };

    if let Some(unit) = cli.unit {
        params.square_unit = unit;
    }
    if let Some(fraction) = cli.crop {
        params.crop.fraction = fraction;
    }
    params.crop.square |= cli.square;
    params.filter_corners |= cli.filter;
    params.rectify_corners |= cli.rectify;
    params.binarize |= cli.binarize;

    match cli.detector {
        Some(DetectorArg::GoodFeatures)
            if !matches!(params.detector, CornerDetectorConfig::GoodFeatures(_)) =>
        {
            params.detector = CornerDetectorConfig::GoodFeatures(GoodFeaturesParams::default());
        }
        Some(DetectorArg::ShiTomasi)
            if !matches!(params.detector, CornerDetectorConfig::ShiTomasi(_)) =>
        {
            params.detector = CornerDetectorConfig::ShiTomasi(ShiTomasiParams::default());
        }
        _ => {}
    }
    match &mut params.detector {
        CornerDetectorConfig::GoodFeatures(p) => {
            if cli.max_corners.is_some() {
                p.max_corners = cli.max_corners;
            }
            if let Some(d) = cli.min_distance {
                p.min_distance = d as f32;
            }
        }
        CornerDetectorConfig::ShiTomasi(p) => {
            if cli.max_corners.is_some() {
                p.max_corners = cli.max_corners;
            }
            if let Some(d) = cli.min_distance {
                p.min_distance = d;
            }
        }
    }
    Ok(params)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> CliResult<()> {
    if let Some(out) = &cli.output {
        if out.exists() {
            return Err(format!("output file {} already exists", out.display()).into());
        }
    }

    let mut params = build_params(cli)?;
    let img = detect::load_gray(&cli.image)?;
    log::info!("loaded {} ({}x{})", cli.image.display(), img.width(), img.height());

    match cli.position {
        Some(Placement::At(pos)) => params.crop.position = pos,
        Some(Placement::Auto) => {
            params.crop.position = detect::locate(&img, &params, &LocateParams::default())?
                .ok_or("could not locate a scale bar in the image")?;
        }
        None => {}
    }
    log::info!("using position {}", params.crop.position);

    let result = detect::estimate_scale(&img, &params)?;
    if let Some(path) = &cli.report {
        ScaleReport::new(&result, &params).write_json(path)?;
        log::info!("report written to {}", path.display());
    }

    let line = match result.scale {
        Some(scale) => format!("{scale:.6}"),
        None => {
            if let Some(reason) = result.failure {
                log::warn!("no scale: {reason}");
            }
            "no scale estimated".to_string()
        }
    };

    match &cli.output {
        Some(path) => std::fs::write(path, format!("{line}\n"))?,
        None => println!("{line}"),
    }
    Ok(())
}
