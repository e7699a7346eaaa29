//! hdrtone - HDR to LDR tone mapping CLI
//!
//! Batch tone mapping, Reinhard02 statistics and HDR image comparison.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::AutoValue;

#[derive(Parser)]
#[command(name = "hdrtone")]
#[command(author, version, about = "HDR to LDR tone mapping")]
#[command(long_about = "
Tone maps HDR images (Radiance .hdr, OpenEXR, float TIFF) to 8 or 16-bit
display images, with exposure or automatic Reinhard02 parameters.

Examples:
  hdrtone tonemap scene.hdr -o out/                 # sRGB, exposure 0
  hdrtone tonemap 'shots/*.exr' -o out/ -e -1.5     # glob, darker by 1.5 stops
  hdrtone tonemap scene.exr -o out/ --reinhard      # automatic parameters
  hdrtone tonemap scene.exr -o out/ --reinhard --key 0.09 --bpp16
  hdrtone tonemap scene.exr -o out/ -g 2.2 --gamma-method fast
  hdrtone stats 'shots/*.exr' --json
  hdrtone diff a.exr b.exr -o diff.png
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, global = true, default_value = "0")]
    threads: usize,

    /// Also write the log to this file
    #[arg(long, global = true)]
    log: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Tone map HDR images to PNG/TIFF
    #[command(visible_alias = "t")]
    Tonemap(TonemapArgs),

    /// Print Reinhard02 parameters of HDR images
    #[command(visible_alias = "s")]
    Stats(StatsArgs),

    /// Compare two HDR images
    #[command(visible_alias = "d")]
    Diff(DiffArgs),
}

/// sRGB evaluator choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SrgbArg {
    /// Exact piecewise curve
    Ref,
    /// Fast approximation
    Fast1,
    /// Faster approximation
    Fast2,
}

/// Gamma evaluator choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum GammaArg {
    /// powf
    Ref,
    /// Approximate log/exp
    Fast,
}

/// Arguments for the `tonemap` command.
#[derive(Args)]
struct TonemapArgs {
    /// Input images or glob patterns
    #[arg(required = true)]
    input: Vec<String>,

    /// Output directory
    #[arg(short, long)]
    output: PathBuf,

    /// Exposure in stops
    #[arg(short, long, allow_negative_numbers = true, conflicts_with = "expmult")]
    exposure: Option<f32>,

    /// Exposure as a linear multiplier
    #[arg(short = 'm', long)]
    expmult: Option<f32>,

    /// sRGB output curve [default: fast2]
    #[arg(long, value_enum, num_args = 0..=1, default_missing_value = "fast2", conflicts_with = "gamma")]
    srgb: Option<SrgbArg>,

    /// Pure power-law output curve with this gamma
    #[arg(short, long)]
    gamma: Option<f32>,

    /// Gamma evaluator
    #[arg(long, value_enum, default_value = "ref")]
    gamma_method: GammaArg,

    /// Use the Reinhard02 operator instead of plain exposure
    #[arg(long)]
    reinhard: bool,

    /// Reinhard02 key, a number or `auto`
    #[arg(long, default_value = "auto")]
    key: AutoValue,

    /// Reinhard02 white point, a number or `auto`
    #[arg(long, default_value = "auto")]
    white: AutoValue,

    /// Reinhard02 log-average luminance, a number or `auto`
    #[arg(long, default_value = "auto")]
    log_avg: AutoValue,

    /// Write 16 bits per channel
    #[arg(long)]
    bpp16: bool,

    /// Evaluate the display curve per pixel instead of through the LUT
    #[arg(long)]
    no_lut: bool,

    /// Display LUT size
    #[arg(long, default_value = "2048")]
    lut_size: usize,

    /// Output file extension
    #[arg(short, long, default_value = "png")]
    format: String,

    /// Estimate and map through the planar (SoA) layout
    #[arg(long)]
    soa: bool,
}

/// Arguments for the `stats` command.
#[derive(Args)]
struct StatsArgs {
    /// Input images or glob patterns
    #[arg(required = true)]
    input: Vec<String>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Estimate through the planar (SoA) layout
    #[arg(long)]
    soa: bool,
}

/// Arguments for the `diff` command.
#[derive(Args)]
struct DiffArgs {
    /// First image
    a: PathBuf,

    /// Second image
    b: PathBuf,

    /// Tone-mapped difference image
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Exposure of the difference preview in stops
    #[arg(short, long, default_value = "0", allow_negative_numbers = true)]
    exposure: f32,

    /// Fail if the max difference exceeds this (0 = never)
    #[arg(short, long, default_value = "0")]
    threshold: f32,
}

fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let (file, guard) = match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            let name = path
                .file_name()
                .with_context(|| format!("Invalid log file: {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file)
        .try_init()
        .context("Failed to install log subscriber")?;
    Ok(guard)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log.as_deref())?;

    // Configure thread pool
    if cli.threads > 0 {
        rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")?;
    }

    match cli.command {
        Commands::Tonemap(args) => commands::tonemap::run(args, cli.verbose),
        Commands::Stats(args) => commands::stats::run(args, cli.verbose),
        Commands::Diff(args) => commands::diff::run(args, cli.verbose),
    }
}
