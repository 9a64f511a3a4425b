//! End-to-end contouring: smoothing, resampling, level derivation, tracing,
//! assembly, filtering and feature building.

use crate::error::Result;
use crate::features::{build_features, ContourCollection, DEFAULT_PRECISION};
use crate::field::GriddedField;
use crate::finalize::{derive_min_area, finalize};
use crate::levels::{derive_levels, LevelSet, DEFAULT_BASE_STEP, DEFAULT_MAX_LEVELS};
use crate::marching_squares::trace;
use crate::polygon::{assemble, BandPolygon};
use crate::resample::resample;
use crate::smoothing::smooth;
use chrono::SecondsFormat;
use geojson::JsonObject;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info};

/// Default Gaussian smoothing (grid cells)
pub const DEFAULT_SMOOTHING_SIGMA: f64 = 1.0;

/// Default decimation stride
pub const DEFAULT_STRIDE: usize = 2;

/// Property that carries the field's valid time
pub const VALID_TIME: &str = "valid_time";

/// Tunables for [`calculate_contours`]
#[derive(Debug, Clone, PartialEq)]
pub struct ContourOptions {
    /// Gaussian sigma in grid cells; `<= 0` disables smoothing
    pub smoothing_sigma: f64,
    /// Keep every `stride`-th row and column; `<= 1` keeps all
    pub stride: usize,
    /// Topology-preserving simplification tolerance (degrees)
    pub simplify_tolerance: Option<f64>,
    /// Minimum polygon area (square degrees); derived from the grid when unset
    pub min_area: Option<f64>,
    /// Explicit thresholds; derived from the data when unset
    pub levels: Option<LevelSet>,
    pub base_step: f64,
    pub max_levels: usize,
    /// Decimal places kept in output coordinates
    pub precision: u32,
    /// Extra properties attached to every feature
    pub extra_properties: JsonObject,
}

impl Default for ContourOptions {
    fn default() -> Self {
        Self {
            smoothing_sigma: DEFAULT_SMOOTHING_SIGMA,
            stride: DEFAULT_STRIDE,
            simplify_tolerance: None,
            min_area: None,
            levels: None,
            base_step: DEFAULT_BASE_STEP,
            max_levels: DEFAULT_MAX_LEVELS,
            precision: DEFAULT_PRECISION,
            extra_properties: JsonObject::new(),
        }
    }
}

impl ContourOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_smoothing_sigma(mut self, sigma: f64) -> Self {
        self.smoothing_sigma = sigma;
        self
    }

    pub fn with_stride(mut self, stride: usize) -> Self {
        self.stride = stride;
        self
    }

    pub fn with_simplify_tolerance(mut self, tolerance: Option<f64>) -> Self {
        self.simplify_tolerance = tolerance;
        self
    }

    pub fn with_min_area(mut self, min_area: Option<f64>) -> Self {
        self.min_area = min_area;
        self
    }

    pub fn with_levels(mut self, levels: LevelSet) -> Self {
        self.levels = Some(levels);
        self
    }

    pub fn with_base_step(mut self, base_step: f64) -> Self {
        self.base_step = base_step;
        self
    }

    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }

    pub fn with_precision(mut self, precision: u32) -> Self {
        self.precision = precision;
        self
    }

    /// Add a property to every feature.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra_properties.insert(key.into(), value.into());
        self
    }
}

/// Result of [`calculate_contours`]
#[derive(Debug, Clone, PartialEq)]
pub struct ContourOutput {
    pub collection: ContourCollection,
    /// Thresholds the bands were traced with
    pub levels: LevelSet,
}

/// Contour a gridded field into filled bands
///
/// Masked cells are treated as missing, the field is smoothed and
/// resampled, levels are derived unless given, every band is traced and
/// assembled, small polygons are filtered out and the rest simplified. When
/// the field has a valid time and the extra properties do not already carry
/// one, it is added as `valid_time` (RFC 3339).
///
/// Fails with [`crate::ContourError::EmptyInput`] when no valid value is
/// left to derive levels from. An empty collection is not an error.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use wave_isobands::{calculate_contours, ContourOptions, GridCoordinates, GriddedField};
///
/// let lats: Vec<f32> = (0..20).map(|r| 20.0 - r as f32).collect();
/// let lons: Vec<f32> = (0..20).map(|c| c as f32).collect();
/// let coords = Arc::new(GridCoordinates::from_axes(&lats, &lons).unwrap());
/// let values: Vec<f32> = (0..400)
///     .map(|i| {
///         let (r, c) = ((i / 20) as f32 - 9.5, (i % 20) as f32 - 9.5);
///         3.0 * (-(r * r + c * c) / 20.0).exp()
///     })
///     .collect();
/// let field = GriddedField::new(coords, values).unwrap();
///
/// let options = ContourOptions::new().with_stride(1).with_property("forecast_hour", 3);
/// let output = calculate_contours(&field, &options).unwrap();
/// assert!(!output.collection.is_empty());
/// assert_eq!(output.levels.first(), 0.0);
/// ```
pub fn calculate_contours(field: &GriddedField, options: &ContourOptions) -> Result<ContourOutput> {
    let start = Instant::now();

    let grid = field.replace_values(field.masked_values());
    let grid = smooth(&grid, options.smoothing_sigma);
    let grid = resample(&grid, options.stride)?;

    let levels = match &options.levels {
        Some(levels) => levels.clone(),
        None => derive_levels(grid.values(), options.base_step, options.max_levels)?,
    };

    let bands = trace(&grid, &levels);

    let min_area = options
        .min_area
        .unwrap_or_else(|| derive_min_area(grid.coords()));

    let mut assembled = 0usize;
    let polygons: Vec<BandPolygon> = bands
        .into_iter()
        .flat_map(|band| {
            let (lower, upper) = (band.lower, band.upper);
            band.groups
                .into_iter()
                .flat_map(move |group| assemble(group, lower, upper))
        })
        .inspect(|_| assembled += 1)
        .filter_map(|polygon| finalize(polygon, options.simplify_tolerance, min_area))
        .collect();

    let mut base_properties = options.extra_properties.clone();
    if let Some(valid_time) = grid.valid_time() {
        base_properties
            .entry(VALID_TIME)
            .or_insert_with(|| Value::String(valid_time.to_rfc3339_opts(SecondsFormat::Secs, true)));
    }

    let collection = build_features(polygons, &base_properties, options.precision);

    debug!(
        assembled,
        filtered = assembled - collection.len(),
        min_area,
        "Finalized band polygons"
    );
    info!(
        rows = grid.rows(),
        cols = grid.cols(),
        levels = levels.len(),
        features = collection.len(),
        elapsed = ?start.elapsed(),
        "Contours calculated"
    );

    Ok(ContourOutput { collection, levels })
}
