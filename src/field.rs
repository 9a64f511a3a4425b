//! Gridded scalar field representation
//!
//! A field is a flat, row-major `f32` array on a regular mesh together with
//! the longitude/latitude of every grid point. Coordinate arrays are shared
//! behind an [`Arc`] so that fields on an identical grid can reuse them (see
//! [`crate::GridCache`]).

use crate::error::{ContourError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Longitude and latitude of every grid point, row-major.
///
/// # Example
///
/// ```
/// use wave_isobands::GridCoordinates;
///
/// let coords = GridCoordinates::new(
///     2,
///     3,
///     vec![0.0, 1.0, 2.0, 0.0, 1.0, 2.0],
///     vec![10.0, 10.0, 10.0, 9.0, 9.0, 9.0],
/// )
/// .unwrap();
/// assert_eq!(coords.lon_at(1, 2), 2.0);
/// assert_eq!(coords.lat_at(1, 2), 9.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GridCoordinates {
    rows: usize,
    cols: usize,
    lon: Vec<f32>,
    lat: Vec<f32>,
}

impl GridCoordinates {
    /// Create coordinate arrays for a `rows × cols` grid.
    pub fn new(rows: usize, cols: usize, lon: Vec<f32>, lat: Vec<f32>) -> Result<Self> {
        if rows < 2 || cols < 2 {
            return Err(ContourError::GridTooSmall { rows, cols });
        }
        check_len("longitude", lon.len(), rows, cols)?;
        check_len("latitude", lat.len(), rows, cols)?;
        Ok(Self { rows, cols, lon, lat })
    }

    /// Build coordinates from separate 1-D axes (latitude per row, longitude per column).
    pub fn from_axes(lats: &[f32], lons: &[f32]) -> Result<Self> {
        let rows = lats.len();
        let cols = lons.len();
        let mut lon = Vec::with_capacity(rows * cols);
        let mut lat = Vec::with_capacity(rows * cols);
        for &y in lats {
            for &x in lons {
                lon.push(x);
                lat.push(y);
            }
        }
        Self::new(rows, cols, lon, lat)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn lon(&self) -> &[f32] {
        &self.lon
    }

    pub fn lat(&self) -> &[f32] {
        &self.lat
    }

    #[inline]
    pub fn lon_at(&self, row: usize, col: usize) -> f32 {
        self.lon[row * self.cols + col]
    }

    #[inline]
    pub fn lat_at(&self, row: usize, col: usize) -> f32 {
        self.lat[row * self.cols + col]
    }

    /// Keep every `stride`-th row and column, starting at index 0.
    pub fn decimate(&self, stride: usize) -> Self {
        let lon = decimate(&self.lon, self.rows, self.cols, stride);
        let lat = decimate(&self.lat, self.rows, self.cols, stride);
        Self {
            rows: decimated_len(self.rows, stride),
            cols: decimated_len(self.cols, stride),
            lon,
            lat,
        }
    }
}

/// An immutable gridded scalar field (significant wave height)
///
/// Invalid cells are either NaN in `values` or flagged `true` in the
/// optional `mask`; both are excluded from every contour band.
#[derive(Debug, Clone)]
pub struct GriddedField {
    coords: Arc<GridCoordinates>,
    values: Vec<f32>,
    mask: Option<Vec<bool>>,
    valid_time: Option<DateTime<Utc>>,
}

impl GriddedField {
    /// Create a field over the given coordinates.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use wave_isobands::{GridCoordinates, GriddedField};
    ///
    /// let coords = Arc::new(GridCoordinates::from_axes(&[1.0, 0.0], &[0.0, 1.0]).unwrap());
    /// let field = GriddedField::new(coords, vec![0.5, 1.5, f32::NAN, 2.0]).unwrap();
    /// assert!(field.is_valid(0, 1));
    /// assert!(!field.is_valid(1, 0));
    /// ```
    pub fn new(coords: Arc<GridCoordinates>, values: Vec<f32>) -> Result<Self> {
        check_len("values", values.len(), coords.rows, coords.cols)?;
        Ok(Self {
            coords,
            values,
            mask: None,
            valid_time: None,
        })
    }

    /// Attach a validity mask (`true` marks a missing measurement).
    pub fn with_mask(mut self, mask: Vec<bool>) -> Result<Self> {
        check_len("mask", mask.len(), self.rows(), self.cols())?;
        self.mask = Some(mask);
        Ok(self)
    }

    pub fn with_valid_time(mut self, valid_time: DateTime<Utc>) -> Self {
        self.valid_time = Some(valid_time);
        self
    }

    pub fn rows(&self) -> usize {
        self.coords.rows
    }

    pub fn cols(&self) -> usize {
        self.coords.cols
    }

    pub fn coords(&self) -> &Arc<GridCoordinates> {
        &self.coords
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn mask(&self) -> Option<&[bool]> {
        self.mask.as_deref()
    }

    pub fn valid_time(&self) -> Option<DateTime<Utc>> {
        self.valid_time
    }

    #[inline]
    pub fn value(&self, row: usize, col: usize) -> f32 {
        self.values[row * self.cols() + col]
    }

    /// A cell is valid when its value is finite and it is not masked.
    #[inline]
    pub fn is_valid(&self, row: usize, col: usize) -> bool {
        let idx = row * self.cols() + col;
        self.values[idx].is_finite() && !self.mask.as_ref().is_some_and(|m| m[idx])
    }

    /// Values with every invalid cell replaced by NaN.
    pub fn masked_values(&self) -> Vec<f32> {
        self.values
            .iter()
            .enumerate()
            .map(|(idx, &v)| {
                let masked = self.mask.as_ref().is_some_and(|m| m[idx]);
                if masked || !v.is_finite() {
                    f32::NAN
                } else {
                    v
                }
            })
            .collect()
    }

    /// Number of valid cells.
    pub fn valid_count(&self) -> usize {
        (0..self.values.len())
            .filter(|&idx| {
                self.values[idx].is_finite() && !self.mask.as_ref().is_some_and(|m| m[idx])
            })
            .count()
    }

    /// Same grid and valid time, new values with invalid cells encoded as NaN.
    pub(crate) fn replace_values(&self, values: Vec<f32>) -> Self {
        debug_assert_eq!(values.len(), self.values.len());
        Self {
            coords: Arc::clone(&self.coords),
            values,
            mask: None,
            valid_time: self.valid_time,
        }
    }

    /// New field on different coordinates; shapes are checked by the caller.
    pub(crate) fn on_grid(&self, coords: GridCoordinates, values: Vec<f32>, mask: Option<Vec<bool>>) -> Self {
        debug_assert_eq!(values.len(), coords.rows * coords.cols);
        Self {
            coords: Arc::new(coords),
            values,
            mask,
            valid_time: self.valid_time,
        }
    }
}

fn check_len(array: &'static str, actual: usize, rows: usize, cols: usize) -> Result<()> {
    let expected = rows * cols;
    if actual != expected {
        return Err(ContourError::ShapeMismatch {
            array,
            actual,
            expected,
            rows,
            cols,
        });
    }
    Ok(())
}

/// Number of indices kept when taking every `stride`-th entry from `len`.
pub(crate) fn decimated_len(len: usize, stride: usize) -> usize {
    if stride <= 1 {
        len
    } else {
        len.div_ceil(stride)
    }
}

/// Row-major decimation of a flat array.
pub(crate) fn decimate<T: Copy>(data: &[T], rows: usize, cols: usize, stride: usize) -> Vec<T> {
    if stride <= 1 {
        return data.to_vec();
    }
    let mut out = Vec::with_capacity(decimated_len(rows, stride) * decimated_len(cols, stride));
    for r in (0..rows).step_by(stride) {
        let row = &data[r * cols..(r + 1) * cols];
        out.extend(row.iter().step_by(stride).copied());
    }
    out
}
