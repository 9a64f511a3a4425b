//! Swell contour batch job.
//!
//! Reads decoded GFS wave documents for a run from `FILES_DIR`, contours the
//! significant swell height of every forecast hour and writes one GeoJSON
//! file per hour next to a `metadata.json` describing the run.

use anyhow::{Context, Result};
use clap::Parser;
use rayon::prelude::*;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use wave_isobands::{
    calculate_contours, contour_file_name, decode_swell, input_file_name, write_geojson,
    write_metadata, ContourOptions, GridCache, SwellDocument,
};

const LOG_FILE: &str = "gfs_wave_contours.log";
const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;
const LOG_BACKUPS: usize = 5;

#[derive(Parser, Debug)]
#[command(name = "wave-contours")]
#[command(about = "Contour GFS significant swell height into GeoJSON isobands")]
struct Args {
    /// Directory holding decoded inputs; contours are written here too
    #[arg(long, env = "FILES_DIR")]
    files_dir: PathBuf,

    /// Directory for the JSON log file (stderr only when unset)
    #[arg(long, env = "LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Keep every n-th grid row and column
    #[arg(long, env = "CONTOUR_STRIDE", default_value_t = 2)]
    stride: usize,

    /// Gaussian smoothing sigma in grid cells (0 disables)
    #[arg(long, env = "CONTOUR_SMOOTHING_SIGMA", default_value_t = 1.0)]
    smoothing_sigma: f64,

    /// Topology-preserving simplification tolerance in degrees
    #[arg(long, env = "CONTOUR_SIMPLIFY_TOLERANCE")]
    simplify_tolerance: Option<f64>,

    /// Minimum polygon area in square degrees (derived from the grid when unset)
    #[arg(long, env = "CONTOUR_MIN_AREA")]
    min_area: Option<f64>,

    /// Model run date, YYYYMMDD
    #[arg(long, env = "RUN_DATE")]
    run_date: Option<String>,

    /// Model run hour
    #[arg(long, env = "RUN_HOUR", default_value_t = 0,
          value_parser = clap::value_parser!(u32).range(0..24))]
    run_hour: u32,

    /// Comma-separated forecast hours (default: 0-120 every 3h, then 123-384 every 3h)
    #[arg(long, value_delimiter = ',')]
    forecast_hours: Vec<u32>,

    /// Worker threads (default: number of CPU cores)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Args {
    fn contour_options(&self) -> ContourOptions {
        ContourOptions::new()
            .with_stride(self.stride.max(1))
            .with_smoothing_sigma(self.smoothing_sigma)
            .with_simplify_tolerance(self.simplify_tolerance)
            .with_min_area(self.min_area)
    }

    fn hours(&self) -> Vec<u32> {
        if self.forecast_hours.is_empty() {
            default_forecast_hours()
        } else {
            self.forecast_hours.clone()
        }
    }
}

/// GFS wave output cadence: 3-hourly to 120h, then 3-hourly to 384h.
fn default_forecast_hours() -> Vec<u32> {
    (0..=120).step_by(3).chain((123..=384).step_by(3)).collect()
}

fn backup_path(path: &Path, n: usize) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(format!(".{n}"));
    PathBuf::from(name)
}

/// Shift `path` to `path.1` (and older backups up by one) once it exceeds
/// `max_bytes`. At most `backups` old files are kept.
fn rotate_log(path: &Path, max_bytes: u64, backups: usize) -> std::io::Result<bool> {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    if size < max_bytes {
        return Ok(false);
    }
    if backups == 0 {
        fs::remove_file(path)?;
        return Ok(true);
    }
    for n in (1..backups).rev() {
        let from = backup_path(path, n);
        if from.exists() {
            fs::rename(&from, backup_path(path, n + 1))?;
        }
    }
    fs::rename(path, backup_path(path, 1))?;
    Ok(true)
}

fn init_tracing(log_level: &str, log_dir: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let file_layer = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating log directory {}", dir.display()))?;
            let path = dir.join(LOG_FILE);
            rotate_log(&path, MAX_LOG_BYTES, LOG_BACKUPS)
                .with_context(|| format!("rotating log file {}", path.display()))?;
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(file_layer)
        .try_init()?;
    Ok(())
}

/// Contour one forecast hour and return the number of features written.
fn process_hour(
    files_dir: &Path,
    run_hour: u32,
    forecast_hour: u32,
    options: &ContourOptions,
    cache: &GridCache,
) -> Result<usize> {
    let input = files_dir.join(input_file_name(run_hour, forecast_hour));
    if !input.exists() {
        anyhow::bail!("input file {} not found", input.display());
    }

    let document = SwellDocument::from_path(&input)
        .with_context(|| format!("reading {}", input.display()))?;
    let swell = decode_swell(&document, cache)
        .with_context(|| format!("decoding {}", input.display()))?;

    let options = options.clone().with_property("forecast_hour", forecast_hour);
    let output = calculate_contours(&swell.height, &options)
        .with_context(|| format!("contouring forecast hour {forecast_hour:03}"))?;

    if output.collection.is_empty() {
        warn!(forecast_hour, "No contour features generated");
    }

    let path = files_dir.join(contour_file_name(forecast_hour));
    write_geojson(&path, &output.collection)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(output.collection.len())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_level, args.log_dir.as_deref())?;

    let start = Instant::now();
    let hours = args.hours();
    let options = args.contour_options();
    info!(
        files_dir = %args.files_dir.display(),
        run_hour = args.run_hour,
        forecast_hours = hours.len(),
        stride = options.stride,
        smoothing_sigma = options.smoothing_sigma,
        simplify_tolerance = ?options.simplify_tolerance,
        "Starting swell contour run"
    );

    if let Some(date) = &args.run_date {
        write_metadata(&args.files_dir, date, args.run_hour).context("writing run metadata")?;
    }

    let mut pool = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = args.jobs {
        pool = pool.num_threads(jobs);
    }
    let pool = pool.build().context("building worker pool")?;

    let cache = Arc::new(GridCache::new());
    let results: Vec<Option<usize>> = pool.install(|| {
        hours
            .par_iter()
            .map(|&forecast_hour| {
                match process_hour(&args.files_dir, args.run_hour, forecast_hour, &options, &cache) {
                    Ok(features) => {
                        info!(forecast_hour, features, "Processed forecast hour");
                        Some(features)
                    }
                    Err(e) => {
                        error!(forecast_hour, error = %format!("{e:#}"), "Error processing forecast hour");
                        None
                    }
                }
            })
            .collect()
    });

    let processed = results.iter().flatten().count();
    let empty = results.iter().flatten().filter(|&&n| n == 0).count();
    let stats = cache.stats();
    info!(
        processed,
        failed = results.len() - processed,
        empty,
        cached_grids = stats.entries,
        cache_hit_rate = %format!("{:.1}%", stats.hit_rate()),
        elapsed = ?start.elapsed(),
        "Swell contour run complete"
    );
    Ok(())
}
