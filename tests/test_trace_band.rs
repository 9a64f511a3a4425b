use std::sync::Arc;
use wave_isobands::{trace_band, Band, BandPolygon, GridCoordinates, GriddedField};

/// Helper function to build a field from rows of values on a 1 degree grid
///
/// Row 0 is the northernmost row, column 0 the westernmost column.
fn create_field(rows: &[&[f32]]) -> GriddedField {
    let lats: Vec<f32> = (0..rows.len()).map(|r| (rows.len() - 1 - r) as f32).collect();
    let lons: Vec<f32> = (0..rows[0].len()).map(|c| c as f32).collect();
    let coords = Arc::new(GridCoordinates::from_axes(&lats, &lons).unwrap());
    let values = rows.iter().flat_map(|row| row.iter().copied()).collect();
    GriddedField::new(coords, values).unwrap()
}

fn band_area(field: &GriddedField, band: Band) -> f64 {
    trace_band(field, band)
        .groups
        .into_iter()
        .map(|g| BandPolygon::new(g.exterior, g.holes, band.lower, band.upper).area())
        .sum()
}

#[test]
fn test_trace_band_simple_3x3_grid() {
    // Grid layout (values):
    //   5   5   5
    //   5  15  15
    //   5  15  15
    //
    // With lower=10, upper=20 the band wraps the 15 values
    let field = create_field(&[&[5.0, 5.0, 5.0], &[5.0, 15.0, 15.0], &[5.0, 15.0, 15.0]]);
    let band = Band::new(10.0, 20.0);

    let result = trace_band(&field, band);
    assert_eq!(result.lower, 10.0);
    assert_eq!(result.upper, 20.0);
    assert_eq!(result.groups.len(), 1, "Should have exactly one polygon");
    assert!(result.groups[0].holes.is_empty(), "Should have no holes");
    assert!(result.groups[0].exterior.len() >= 4);

    // Full lower-right cell, half of each edge neighbour, a sixth of the corner cell
    let expected = 1.0 + 0.5 + 0.5 + 1.0 / 6.0;
    assert!(
        (band_area(&field, band) - expected).abs() < 1e-9,
        "Area should be {expected}"
    );
}

#[test]
fn test_trace_band_all_below_threshold() {
    let field = create_field(&[&[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0], &[5.0, 5.0, 5.0]]);

    let result = trace_band(&field, Band::new(10.0, 20.0));
    assert!(result.is_empty(), "Should have no polygons when all values below band");
}

#[test]
fn test_trace_band_all_above_threshold() {
    let field = create_field(&[&[25.0, 25.0, 25.0], &[25.0, 25.0, 25.0], &[25.0, 25.0, 25.0]]);

    let result = trace_band(&field, Band::new(10.0, 20.0));
    assert!(result.is_empty(), "Should have no polygons when all values above band");
}

#[test]
fn test_trace_band_all_within_band() {
    let field = create_field(&[&[15.0, 15.0, 15.0], &[15.0, 15.0, 15.0], &[15.0, 15.0, 15.0]]);
    let band = Band::new(10.0, 20.0);

    let result = trace_band(&field, band);
    assert_eq!(result.groups.len(), 1);
    assert_eq!(result.ring_count(), 1);
    // Interior cell edges cancel, only the grid outline is left
    assert_eq!(result.groups[0].exterior.len(), 8);
    assert!((band_area(&field, band) - 4.0).abs() < 1e-12);
}

#[test]
fn test_trace_band_single_cell_triangle() {
    // Only the south-west corner is in the band
    let field = create_field(&[&[5.0, 5.0], &[15.0, 5.0]]);
    let band = Band::new(10.0, 20.0);

    let result = trace_band(&field, band);
    assert_eq!(result.groups.len(), 1);
    assert!((band_area(&field, band) - 1.0 / 6.0).abs() < 1e-9);
}

#[test]
fn test_trace_band_with_hole() {
    // A peak above the band inside a plateau within it
    let field = create_field(&[
        &[5.0, 5.0, 5.0, 5.0, 5.0],
        &[5.0, 15.0, 15.0, 15.0, 5.0],
        &[5.0, 15.0, 25.0, 15.0, 5.0],
        &[5.0, 15.0, 15.0, 15.0, 5.0],
        &[5.0, 5.0, 5.0, 5.0, 5.0],
    ]);

    let result = trace_band(&field, Band::new(10.0, 20.0));
    assert_eq!(result.groups.len(), 1, "Plateau should be one polygon");
    assert_eq!(result.groups[0].holes.len(), 1, "Peak should cut a hole");

    let hole = &result.groups[0].holes[0];
    assert!(hole.points().iter().all(|p| (p.x - 2.0).abs() < 1.0 && (p.y - 2.0).abs() < 1.0));
}

#[test]
fn test_trace_band_separate_islands() {
    let field = create_field(&[
        &[15.0, 15.0, 5.0, 5.0, 15.0, 15.0],
        &[15.0, 15.0, 5.0, 5.0, 15.0, 15.0],
    ]);

    let result = trace_band(&field, Band::new(10.0, 20.0));
    assert_eq!(result.groups.len(), 2);
    assert!(result.groups.iter().all(|g| g.holes.is_empty()));
}

#[test]
fn test_trace_band_upper_threshold_inclusivity() {
    let field = create_field(&[&[20.0, 20.0], &[20.0, 20.0]]);

    assert!(trace_band(&field, Band::new(10.0, 20.0)).is_empty());
    assert_eq!(trace_band(&field, Band::closed(10.0, 20.0)).groups.len(), 1);
}

#[test]
fn test_trace_band_skips_masked_cells() {
    let field = create_field(&[&[15.0, 15.0, 15.0], &[15.0, 15.0, 15.0]]);
    // Masking the top-left corner removes the western cell only
    let mut mask = vec![false; 6];
    mask[0] = true;
    let field = field.with_mask(mask).unwrap();
    let band = Band::new(10.0, 20.0);

    let result = trace_band(&field, band);
    assert_eq!(result.groups.len(), 1);
    assert!((band_area(&field, band) - 1.0).abs() < 1e-12);
    assert!(result.groups[0].exterior.points().iter().all(|p| p.x >= 1.0));
}
