//! Simplification and area filtering of band polygons.

use crate::field::GridCoordinates;
use crate::polygon::BandPolygon;
use geo::SimplifyVwPreserve;
use tracing::trace;

/// Minimum polygon area derived from the grid resolution.
///
/// One eighth of the median longitude spacing (along rows) times the median
/// latitude spacing (along columns), in squared degrees. Returns 0 when the
/// spacing cannot be determined.
pub fn derive_min_area(coords: &GridCoordinates) -> f64 {
    let (rows, cols) = (coords.rows(), coords.cols());

    let mut dlon: Vec<f64> = Vec::with_capacity(rows * cols.saturating_sub(1));
    for r in 0..rows {
        for c in 0..cols.saturating_sub(1) {
            dlon.push((coords.lon_at(r, c + 1) as f64 - coords.lon_at(r, c) as f64).abs());
        }
    }
    let mut dlat: Vec<f64> = Vec::with_capacity(rows.saturating_sub(1) * cols);
    for r in 0..rows.saturating_sub(1) {
        for c in 0..cols {
            dlat.push((coords.lat_at(r + 1, c) as f64 - coords.lat_at(r, c) as f64).abs());
        }
    }

    let area = median(&mut dlon) * median(&mut dlat) / 8.0;
    if area.is_finite() {
        area
    } else {
        0.0
    }
}

/// Median, the mean of the middle pair for even sizes. NaN when empty.
fn median(values: &mut [f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.sort_by(|a, b| a.total_cmp(b));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Apply the area filter, then optional topology-preserving simplification
///
/// Polygons with area below `min_area` are discarded (a `min_area` of zero
/// or less disables the filter). With a positive `simplify_tolerance` the
/// rings are simplified with Visvalingam–Whyatt, using `tolerance²` as the
/// triangle-area threshold, in a way that never introduces intersections.
/// Holes that collapse are dropped; a collapsed exterior discards the
/// polygon.
pub fn finalize(
    polygon: BandPolygon,
    simplify_tolerance: Option<f64>,
    min_area: f64,
) -> Option<BandPolygon> {
    let area = polygon.area();
    if min_area > 0.0 && area < min_area {
        trace!(area, min_area, "Discarding polygon below minimum area");
        return None;
    }

    match simplify_tolerance {
        Some(tolerance) if tolerance > 0.0 => {
            let epsilon = tolerance * tolerance;
            let simplified = polygon.to_polygon().simplify_vw_preserve(&epsilon);
            let result = BandPolygon::from_polygon(&simplified, polygon.lower(), polygon.upper());
            if result.is_none() {
                trace!(area, tolerance, "Polygon collapsed during simplification");
            }
            result
        }
        _ => Some(polygon),
    }
}
