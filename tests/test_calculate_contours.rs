use geojson::{GeoJson, Value};
use std::sync::Arc;
use wave_isobands::{
    calculate_contours, derive_min_area, smooth, ContourError, ContourOptions, GridCoordinates,
    GriddedField, LevelSet,
};

/// Gaussian bump of height `peak` centred on an `n` x `n` grid with 0.5 degree spacing
fn create_bump_field(n: usize, peak: f32) -> GriddedField {
    let lats: Vec<f32> = (0..n).map(|r| -10.0 - r as f32 * 0.5).collect();
    let lons: Vec<f32> = (0..n).map(|c| 300.0 + c as f32 * 0.5).collect();
    let coords = Arc::new(GridCoordinates::from_axes(&lats, &lons).unwrap());
    let mid = (n - 1) as f32 / 2.0;
    let values = (0..n * n)
        .map(|i| {
            let r = (i / n) as f32 - mid;
            let c = (i % n) as f32 - mid;
            peak * (-(r * r + c * c) / 20.0).exp()
        })
        .collect();
    GriddedField::new(coords, values).unwrap()
}

fn polygon_rings(geojson: &str) -> Vec<Vec<Vec<Vec<f64>>>> {
    let GeoJson::FeatureCollection(fc) = geojson.parse::<GeoJson>().unwrap() else {
        panic!("Expected a FeatureCollection");
    };
    fc.features
        .into_iter()
        .map(|f| match f.geometry.expect("Should have geometry").value {
            Value::Polygon(rings) => rings,
            other => panic!("Expected Polygon geometry, got {other:?}"),
        })
        .collect()
}

#[test]
fn test_single_band_bump() {
    let field = create_bump_field(21, 2.5);
    let levels = LevelSet::new(vec![1.0, 3.0]).unwrap();
    let options = ContourOptions::new().with_stride(1).with_levels(levels);

    let output = calculate_contours(&field, &options).unwrap();
    assert_eq!(output.collection.len(), 1, "Bump should give exactly one polygon");

    let feature = &output.collection.features()[0];
    let area = feature.polygon().area();
    let grid_area = 20.0 * 0.5 * 20.0 * 0.5;
    assert!(area > 0.0 && area < grid_area, "Area {area} should be inside the grid");
    assert!(feature.polygon().holes().is_empty());
    assert_eq!(feature.contour_min(), 1.0);
    assert_eq!(feature.contour_max(), 3.0);
    assert_eq!(feature.contour_mean(), 2.0);
}

#[test]
fn test_last_band_surrounds_higher_values() {
    let field = create_bump_field(21, 2.5);
    let levels = LevelSet::new(vec![0.0, 1.0]).unwrap();
    let options = ContourOptions::new().with_stride(1).with_levels(levels);

    let output = calculate_contours(&field, &options).unwrap();
    assert_eq!(output.collection.len(), 1);
    let feature = &output.collection.features()[0];
    assert_eq!(feature.polygon().holes().len(), 1, "Peak above 1 should punch one hole");

    let rings = polygon_rings(&output.collection.to_geojson_string());
    assert_eq!(rings.len(), 1);
    assert_eq!(rings[0].len(), 2);
}

#[test]
fn test_derived_min_area_drops_small_islands() {
    // 1 degree grid, so the derived minimum area is 1/8 square degree
    let n = 12;
    let lats: Vec<f32> = (0..n).map(|r| 20.0 - r as f32).collect();
    let lons: Vec<f32> = (0..n).map(|c| 100.0 + c as f32).collect();
    let coords = Arc::new(GridCoordinates::from_axes(&lats, &lons).unwrap());
    assert!((derive_min_area(&coords) - 0.125).abs() < 1e-12);

    // A lone spike of height v covers (8/3)((v-1)/v)^2 square degrees above 1:
    // about 0.074 for v = 1.2 and 0.296 for v = 1.5
    let mut values = vec![0.0f32; n * n];
    values[3 * n + 3] = 1.2;
    values[3 * n + 8] = 1.5;
    let field = GriddedField::new(coords, values).unwrap();

    let options = ContourOptions::new()
        .with_stride(1)
        .with_smoothing_sigma(0.0)
        .with_min_area(None)
        .with_levels(LevelSet::new(vec![0.0, 1.0, 4.0]).unwrap());
    let output = calculate_contours(&field, &options).unwrap();

    let islands: Vec<_> = output
        .collection
        .iter()
        .filter(|f| f.contour_min() == 1.0)
        .collect();
    assert_eq!(islands.len(), 1, "Only the larger island should survive");

    let area = islands[0].polygon().area();
    assert!((area - 8.0 / 27.0).abs() < 1e-3, "Island area {area}");
    let bounds = islands[0].polygon().exterior().points().iter().fold(
        (f64::MAX, f64::MIN),
        |(lo, hi), c| (lo.min(c.x), hi.max(c.x)),
    );
    assert!(bounds.0 > 107.0 && bounds.1 < 109.0, "Kept island sits on the 1.5 spike");
}

#[test]
fn test_output_is_idempotent() {
    let field = create_bump_field(25, 4.0);
    let options = ContourOptions::new().with_property("forecast_hour", 12);

    let first = calculate_contours(&field, &options).unwrap();
    let second = calculate_contours(&field, &options).unwrap();
    assert_eq!(first.levels, second.levels);
    assert_eq!(
        first.collection.to_geojson_string(),
        second.collection.to_geojson_string(),
        "Same input should give byte-identical output"
    );
}

#[test]
fn test_rings_are_closed_and_non_degenerate() {
    let field = create_bump_field(31, 5.0);
    let output = calculate_contours(&field, &ContourOptions::new().with_stride(1)).unwrap();
    assert!(!output.collection.is_empty());

    for rings in polygon_rings(&output.collection.to_geojson_string()) {
        for ring in rings {
            assert!(ring.len() >= 4, "Ring should have at least 3 distinct positions");
            assert_eq!(ring.first(), ring.last(), "Ring should be closed");
            assert!(ring.windows(2).all(|w| w[0] != w[1]), "No repeated positions");
        }
    }
}

#[test]
fn test_area_filter_can_remove_everything() {
    let field = create_bump_field(21, 2.5);
    let options = ContourOptions::new().with_min_area(Some(1.0e6));

    let output = calculate_contours(&field, &options).unwrap();
    assert!(output.collection.is_empty(), "Empty collection is not an error");
    assert!(output.levels.len() >= 2);
}

#[test]
fn test_properties_on_every_feature() {
    let field = create_bump_field(21, 3.2);
    let options = ContourOptions::new()
        .with_property("forecast_hour", 6)
        .with_property("contour_min", "ignored");

    let output = calculate_contours(&field, &options).unwrap();
    assert!(!output.collection.is_empty());
    for feature in &output.collection {
        let props = feature.properties();
        assert_eq!(props["forecast_hour"], serde_json::json!(6));
        assert_eq!(props["contour_min"], serde_json::json!(feature.contour_min()));
        assert_eq!(
            props["contour_mean"].as_f64().unwrap(),
            (feature.contour_min() + feature.contour_max()) / 2.0
        );
    }
}

#[test]
fn test_levels_are_derived_from_data() {
    let field = create_bump_field(21, 2.2);
    let output = calculate_contours(&field, &ContourOptions::new().with_smoothing_sigma(0.0)).unwrap();
    // Peak of 2.2 rounds up to the next whole step
    assert_eq!(output.levels.as_slice(), &[0.0, 0.5, 1.0, 1.5, 2.0, 2.5]);
}

#[test]
fn test_flat_zero_field_is_one_band() {
    let coords = Arc::new(GridCoordinates::from_axes(&[1.0, 0.5, 0.0], &[0.0, 0.5, 1.0]).unwrap());
    let field = GriddedField::new(coords, vec![0.0; 9]).unwrap();
    let output = calculate_contours(&field, &ContourOptions::new().with_stride(1)).unwrap();

    assert_eq!(output.levels.as_slice(), &[0.0, 0.5]);
    assert_eq!(output.collection.len(), 1);
    assert!((output.collection.features()[0].polygon().area() - 1.0).abs() < 1e-9);
}

#[test]
fn test_all_missing_is_empty_input() {
    let coords = Arc::new(GridCoordinates::from_axes(&[1.0, 0.0], &[0.0, 1.0]).unwrap());
    let field = GriddedField::new(coords, vec![f32::NAN; 4]).unwrap();
    let err = calculate_contours(&field, &ContourOptions::new().with_stride(1)).unwrap_err();
    assert!(matches!(err, ContourError::EmptyInput));
}

#[test]
fn test_stride_too_large() {
    let field = create_bump_field(5, 2.0);
    let err = calculate_contours(&field, &ContourOptions::new().with_stride(8)).unwrap_err();
    assert!(matches!(err, ContourError::GridTooSmall { .. }));
}

#[test]
fn test_simplification_reduces_vertices() {
    let field = create_bump_field(41, 5.0);
    let base = ContourOptions::new().with_stride(1);

    let plain = calculate_contours(&field, &base).unwrap();
    let simplified =
        calculate_contours(&field, &base.clone().with_simplify_tolerance(Some(0.2))).unwrap();

    let vertices = |output: &wave_isobands::ContourOutput| -> usize {
        output.collection.iter().map(|f| f.polygon().vertex_count()).sum()
    };
    assert!(vertices(&simplified) < vertices(&plain));
}

#[test]
fn test_smoothing_keeps_constant_field() {
    let coords = Arc::new(GridCoordinates::from_axes(&[2.0, 1.0, 0.0], &[0.0, 1.0, 2.0]).unwrap());
    let field = GriddedField::new(coords, vec![1.5; 9]).unwrap();
    let smoothed = smooth(&field, 2.0);
    assert!(smoothed.values().iter().all(|&v| (v - 1.5).abs() < 1e-6));
}

#[test]
fn test_smoothing_ignores_missing_values() {
    let coords = Arc::new(GridCoordinates::from_axes(&[2.0, 1.0, 0.0], &[0.0, 1.0, 2.0]).unwrap());
    let mut values = vec![2.0; 9];
    values[4] = f32::NAN;
    let field = GriddedField::new(coords, values).unwrap();

    // A missing cell neither drags its neighbours towards zero nor stays missing
    let smoothed = smooth(&field, 1.0);
    assert!(smoothed.values().iter().all(|&v| (v - 2.0).abs() < 1e-6));
}
