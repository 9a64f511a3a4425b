//! Feature assembly and GeoJSON encoding
//!
//! Each surviving [`BandPolygon`] becomes one [`ContourFeature`] carrying the
//! band statistics `contour_min`, `contour_max` and `contour_mean` merged
//! over caller-supplied properties. The mandatory keys always win.

use crate::polygon::{BandPolygon, Ring};
use geo::algorithm::orient::{Direction, Orient};
use geo::LineString;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, Position, Value as GeoValue};
use serde_json::json;
use tracing::{debug, trace};

/// Default coordinate precision (5 decimal places, about 1 m)
pub const DEFAULT_PRECISION: u32 = 5;

/// Property holding a band's lower threshold
pub const CONTOUR_MIN: &str = "contour_min";
/// Property holding a band's upper threshold
pub const CONTOUR_MAX: &str = "contour_max";
/// Property holding a band's midpoint
pub const CONTOUR_MEAN: &str = "contour_mean";

/// Round a coordinate value to specified decimal places
fn round_coord_with_precision(value: f64, precision: u32) -> f64 {
    let factor = 10_f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// A band polygon with its properties
#[derive(Debug, Clone, PartialEq)]
pub struct ContourFeature {
    polygon: BandPolygon,
    properties: JsonObject,
}

impl ContourFeature {
    /// Attach the band statistics to `polygon` on top of `base_properties`.
    pub fn new(polygon: BandPolygon, base_properties: &JsonObject) -> Self {
        let mut properties = base_properties.clone();
        let (lower, upper) = (polygon.lower(), polygon.upper());
        properties.insert(CONTOUR_MIN.to_string(), json!(lower));
        properties.insert(CONTOUR_MAX.to_string(), json!(upper));
        properties.insert(CONTOUR_MEAN.to_string(), json!((lower + upper) / 2.0));
        Self {
            polygon,
            properties,
        }
    }

    pub fn polygon(&self) -> &BandPolygon {
        &self.polygon
    }

    pub fn properties(&self) -> &JsonObject {
        &self.properties
    }

    pub fn contour_min(&self) -> f64 {
        self.polygon.lower()
    }

    pub fn contour_max(&self) -> f64 {
        self.polygon.upper()
    }

    pub fn contour_mean(&self) -> f64 {
        (self.polygon.lower() + self.polygon.upper()) / 2.0
    }

    /// Whether the exterior keeps 3 distinct positions at `precision` decimals.
    fn survives_rounding(&self, precision: u32) -> bool {
        encode_ring(&self.polygon.exterior().to_line_string(), precision).is_some()
    }

    /// GeoJSON feature with a `Polygon` geometry.
    ///
    /// The exterior is counter-clockwise and holes clockwise; coordinates
    /// are rounded to `precision` decimals. Returns `None` when rounding
    /// collapses the exterior ring.
    pub fn to_geojson(&self, precision: u32) -> Option<Feature> {
        let oriented = self.polygon.to_polygon().orient(Direction::Default);
        let exterior = encode_ring(oriented.exterior(), precision)?;
        let mut rings = vec![exterior];
        for hole in oriented.interiors() {
            match encode_ring(hole, precision) {
                Some(ring) => rings.push(ring),
                None => trace!("Dropping hole collapsed by coordinate rounding"),
            }
        }

        Some(Feature {
            bbox: None,
            geometry: Some(Geometry::new(GeoValue::Polygon(rings))),
            id: None,
            properties: Some(self.properties.clone()),
            foreign_members: None,
        })
    }
}

/// Rounded, closed GeoJSON ring, or `None` below 3 distinct positions.
fn encode_ring(line: &LineString<f64>, precision: u32) -> Option<Vec<Position>> {
    let rounded = line.0.iter().map(|c| {
        geo::coord! {
            x: round_coord_with_precision(c.x, precision),
            y: round_coord_with_precision(c.y, precision),
        }
    });
    let ring = Ring::new(rounded)?;
    let mut positions: Vec<Position> = ring.points().iter().map(|c| vec![c.x, c.y]).collect();
    positions.push(positions[0].clone());
    Some(positions)
}

/// Ordered contour features: band-ascending, then discovery order
#[derive(Debug, Clone, PartialEq)]
pub struct ContourCollection {
    features: Vec<ContourFeature>,
    precision: u32,
}

impl Default for ContourCollection {
    fn default() -> Self {
        Self {
            features: Vec::new(),
            precision: DEFAULT_PRECISION,
        }
    }
}

impl ContourCollection {
    /// Collection encoded with `precision` decimals.
    ///
    /// Features whose exterior collapses at that precision are left out, so
    /// [`len`](Self::len) matches the encoded document.
    pub fn new(features: Vec<ContourFeature>, precision: u32) -> Self {
        let total = features.len();
        let features: Vec<ContourFeature> = features
            .into_iter()
            .filter(|f| f.survives_rounding(precision))
            .collect();
        if features.len() < total {
            debug!(
                dropped = total - features.len(),
                precision,
                "Dropped features collapsed by coordinate rounding"
            );
        }
        Self {
            features,
            precision,
        }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }

    pub fn features(&self) -> &[ContourFeature] {
        &self.features
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// An empty collection is a valid outcome; callers should report it.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContourFeature> {
        self.features.iter()
    }

    /// Encode as a GeoJSON `FeatureCollection`.
    pub fn to_geojson(&self) -> FeatureCollection {
        FeatureCollection {
            bbox: None,
            features: self
                .features
                .iter()
                .filter_map(|f| f.to_geojson(self.precision))
                .collect(),
            foreign_members: None,
        }
    }

    /// Serialized GeoJSON document.
    pub fn to_geojson_string(&self) -> String {
        GeoJson::from(self.to_geojson()).to_string()
    }
}

impl<'a> IntoIterator for &'a ContourCollection {
    type Item = &'a ContourFeature;
    type IntoIter = std::slice::Iter<'a, ContourFeature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.iter()
    }
}

/// One feature per polygon, in input order, encoded with `precision` decimals.
///
/// # Example
///
/// ```
/// use geo::coord;
/// use geojson::JsonObject;
/// use wave_isobands::{build_features, BandPolygon, Ring, DEFAULT_PRECISION};
///
/// let ring = Ring::new(vec![
///     coord! { x: 0.0, y: 0.0 },
///     coord! { x: 1.0, y: 0.0 },
///     coord! { x: 1.0, y: 1.0 },
/// ])
/// .unwrap();
/// let mut base = JsonObject::new();
/// base.insert("forecast_hour".to_string(), serde_json::json!(6));
///
/// let polygons = vec![BandPolygon::new(ring, vec![], 0.5, 1.0)];
/// let collection = build_features(polygons, &base, DEFAULT_PRECISION);
/// let props = collection.features()[0].properties();
/// assert_eq!(props["contour_mean"], serde_json::json!(0.75));
/// assert_eq!(props["forecast_hour"], serde_json::json!(6));
/// ```
pub fn build_features(
    polygons: Vec<BandPolygon>,
    base_properties: &JsonObject,
    precision: u32,
) -> ContourCollection {
    ContourCollection::new(
        polygons
            .into_iter()
            .map(|p| ContourFeature::new(p, base_properties))
            .collect(),
        precision,
    )
}
