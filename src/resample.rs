//! Stride-based grid decimation.

use crate::error::{ContourError, Result};
use crate::field::{decimate, decimated_len, GriddedField};
use tracing::debug;

/// Keep every `stride`-th row and column of `field`, starting at index 0.
///
/// `stride <= 1` returns the field unchanged. Values, mask and coordinates
/// are decimated together (no averaging). Fails with
/// [`ContourError::GridTooSmall`] when fewer than 2 rows or columns would
/// remain.
pub fn resample(field: &GriddedField, stride: usize) -> Result<GriddedField> {
    if stride <= 1 {
        return Ok(field.clone());
    }

    let (rows, cols) = (field.rows(), field.cols());
    let out_rows = decimated_len(rows, stride);
    let out_cols = decimated_len(cols, stride);
    if out_rows < 2 || out_cols < 2 {
        return Err(ContourError::GridTooSmall {
            rows: out_rows,
            cols: out_cols,
        });
    }

    let coords = field.coords().decimate(stride);
    let values = decimate(field.values(), rows, cols, stride);
    let mask = field.mask().map(|m| decimate(m, rows, cols, stride));

    debug!(stride, rows, cols, out_rows, out_cols, "Resampled grid");
    Ok(field.on_grid(coords, values, mask))
}
