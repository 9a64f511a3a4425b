use std::sync::Arc;
use wave_isobands::{
    trace, trace_band, Band, BandPolygon, BandRings, GridCoordinates, GriddedField, LevelSet,
};

/// Smooth field on a 0.5 degree grid with values spanning about [0.3, 4.7]
fn create_wave_field(rows: usize, cols: usize) -> GriddedField {
    let lats: Vec<f32> = (0..rows).map(|r| 40.0 - r as f32 * 0.5).collect();
    let lons: Vec<f32> = (0..cols).map(|c| 150.0 + c as f32 * 0.5).collect();
    let coords = Arc::new(GridCoordinates::from_axes(&lats, &lons).unwrap());

    let values = (0..rows * cols)
        .map(|i| {
            let fx = (i % cols) as f32 / cols as f32;
            let fy = (i / cols) as f32 / rows as f32;
            2.5 + 1.4 * (fx * std::f32::consts::PI * 3.0).sin()
                + 0.8 * (fy * std::f32::consts::PI * 2.0).cos()
        })
        .collect();
    GriddedField::new(coords, values).unwrap()
}

/// Uniform 3x3 grid with all same values
fn create_uniform_field(value: f32) -> GriddedField {
    let coords = Arc::new(GridCoordinates::from_axes(&[2.0, 1.0, 0.0], &[0.0, 1.0, 2.0]).unwrap());
    GriddedField::new(coords, vec![value; 9]).unwrap()
}

fn rings_area(band: &BandRings) -> f64 {
    band.groups
        .iter()
        .map(|g| BandPolygon::new(g.exterior.clone(), g.holes.clone(), band.lower, band.upper).area())
        .sum()
}

#[test]
fn test_trace_multiple_bands() {
    let field = create_wave_field(24, 30);
    let levels = LevelSet::new(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

    let bands = trace(&field, &levels);
    assert_eq!(bands.len(), 5, "Should have one entry per band");
    for (band, (lower, upper)) in bands.iter().zip(levels.bands()) {
        assert_eq!(band.lower, lower);
        assert_eq!(band.upper, upper);
    }
    assert!(bands.iter().filter(|b| !b.is_empty()).count() >= 4);
}

#[test]
fn test_trace_keeps_empty_bands() {
    // All values below the first threshold
    let field = create_uniform_field(5.0);
    let levels = LevelSet::new(vec![10.0, 20.0, 30.0]).unwrap();

    let bands = trace(&field, &levels);
    assert_eq!(bands.len(), 2);
    assert!(bands.iter().all(BandRings::is_empty));
}

#[test]
fn test_trace_matches_sequential() {
    let field = create_wave_field(16, 20);
    let levels = LevelSet::new(vec![0.0, 1.5, 3.0, 4.5, 6.0]).unwrap();

    let concurrent = trace(&field, &levels);

    let last = levels.band_count() - 1;
    let sequential: Vec<BandRings> = levels
        .bands()
        .enumerate()
        .map(|(i, (lower, upper))| {
            let band = if i == last {
                Band::closed(lower, upper)
            } else {
                Band::new(lower, upper)
            };
            trace_band(&field, band)
        })
        .collect();

    assert_eq!(concurrent, sequential, "Concurrent tracing should match sequential");
}

#[test]
fn test_trace_top_band_is_closed() {
    let field = create_uniform_field(20.0);
    let levels = LevelSet::new(vec![0.0, 10.0, 20.0]).unwrap();

    let bands = trace(&field, &levels);
    assert!(bands[0].is_empty());
    assert_eq!(bands[1].groups.len(), 1, "Maximum value belongs to the top band");
}

#[test]
fn test_trace_bands_tile_the_grid() {
    let field = create_wave_field(24, 30);
    let levels = LevelSet::new(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

    let total: f64 = trace(&field, &levels).iter().map(rings_area).sum();
    let grid_area = 23.0 * 0.5 * 29.0 * 0.5;
    assert!(
        (total - grid_area).abs() < 1e-6,
        "Bands should cover the grid without gaps or overlaps: {total} vs {grid_area}"
    );
}

#[test]
fn test_trace_is_deterministic() {
    let field = create_wave_field(20, 20);
    let levels = LevelSet::new(vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

    assert_eq!(trace(&field, &levels), trace(&field, &levels));
}
