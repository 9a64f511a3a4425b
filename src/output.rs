//! Output documents: contour GeoJSON files and run metadata.

use crate::error::Result;
use crate::features::ContourCollection;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the run metadata document
pub const METADATA_FILE: &str = "metadata.json";

/// `contours_{FFF}.geojson` for a forecast hour.
pub fn contour_file_name(forecast_hour: u32) -> String {
    format!("contours_{forecast_hour:03}.geojson")
}

/// Decoded input document for a run hour and forecast hour.
pub fn input_file_name(run_hour: u32, forecast_hour: u32) -> String {
    format!("gfswave.t{run_hour:02}z.global.0p16.f{forecast_hour:03}.json")
}

/// Write a collection as a GeoJSON `FeatureCollection`.
pub fn write_geojson(path: impl AsRef<Path>, collection: &ContourCollection) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(collection.to_geojson_string().as_bytes())?;
    writer.flush()?;
    info!(path = %path.display(), features = collection.len(), "Saved contours");
    Ok(())
}

/// Description of the model run the contour files belong to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Run date, `YYYYMMDD`
    pub date: String,
    /// Run hour, two digits
    pub hour: String,
    /// When the metadata was written (RFC 3339)
    pub timestamp: String,
    /// `{date}_{hour}Z`
    pub forecast_start: String,
}

impl RunMetadata {
    pub fn new(date: &str, hour: u32) -> Self {
        let hour = format!("{hour:02}");
        Self {
            forecast_start: format!("{date}_{hour}Z"),
            date: date.to_string(),
            hour,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Write `metadata.json` into `dir` and return its path.
pub fn write_metadata(dir: impl AsRef<Path>, date: &str, hour: u32) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(METADATA_FILE);
    let metadata = RunMetadata::new(date, hour);
    let writer = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(writer, &metadata)?;
    info!(path = %path.display(), forecast_start = %metadata.forecast_start, "Saved run metadata");
    Ok(path)
}
