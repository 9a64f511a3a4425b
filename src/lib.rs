//! # wave-isobands
//!
//! Filled contour bands (**isobands**) from gridded significant swell height,
//! emitted as GeoJSON.
//!
//! A forecast file is decoded into co-registered [`GriddedField`]s sharing one
//! set of [`GridCoordinates`]. The height field is then contoured:
//!
//! 1. masked points become missing values,
//! 2. the field is Gaussian-smoothed and decimated by a stride,
//! 3. thresholds are derived from the data (or given explicitly),
//! 4. every band is traced with marching squares in parallel,
//! 5. rings are assembled into valid polygons with holes,
//! 6. small polygons are dropped and the rest optionally simplified,
//! 7. each polygon becomes a feature with `contour_min`, `contour_max` and
//!    `contour_mean` properties.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use wave_isobands::{calculate_contours, ContourOptions, GridCoordinates, GriddedField};
//!
//! let lats: Vec<f32> = (0..16).map(|r| 45.0 - r as f32 * 0.25).collect();
//! let lons: Vec<f32> = (0..16).map(|c| 200.0 + c as f32 * 0.25).collect();
//! let coords = Arc::new(GridCoordinates::from_axes(&lats, &lons).unwrap());
//!
//! let values: Vec<f32> = (0..256)
//!     .map(|i| {
//!         let (r, c) = ((i / 16) as f32 - 7.5, (i % 16) as f32 - 7.5);
//!         2.5 * (-(r * r + c * c) / 18.0).exp()
//!     })
//!     .collect();
//! let field = GriddedField::new(coords, values).unwrap();
//!
//! let output = calculate_contours(&field, &ContourOptions::new().with_stride(1)).unwrap();
//! for feature in output.collection.iter() {
//!     assert!(feature.contour_min() < feature.contour_max());
//! }
//! let geojson = output.collection.to_geojson_string();
//! assert!(geojson.contains("contour_mean"));
//! ```
//!
//! ## Isobands
//!
//! Each band is `[lower, upper)`, except the last band of a level set which
//! also includes its upper threshold. Cells are split into four triangles
//! around their centre, so saddle configurations are resolved by the cell
//! mean and adjacent bands tile the grid without gaps or overlaps.
//!
//! ## Performance
//!
//! - **Parallel processing**: bands are traced on Rayon's work-stealing pool
//! - **Shared grids**: coordinates are cached per grid signature and shared
//!   across fields and forecast hours through [`GridCache`]

mod decode;
mod edge;
mod error;
mod features;
mod field;
mod finalize;
mod grid_cache;
mod levels;
mod marching_squares;
mod output;
mod pipeline;
mod point;
mod polygon;
mod resample;
mod ring_assembler;
mod shape;
mod smoothing;

pub use decode::{
    decode_swell, DecodedSwell, SwellDocument, SwellMessage, SWELL_DIRECTION, SWELL_HEIGHT,
    SWELL_PERIOD,
};
pub use edge::{Edge, EdgeSet, Origin};
pub use error::{ContourError, Result};
pub use features::{
    build_features, ContourCollection, ContourFeature, CONTOUR_MAX, CONTOUR_MEAN, CONTOUR_MIN,
    DEFAULT_PRECISION,
};
pub use field::{GridCoordinates, GriddedField};
pub use finalize::{derive_min_area, finalize};
pub use grid_cache::{GridCache, GridCacheStats, GridDescriptor, GridSignature, GridType};
pub use levels::{derive_levels, LevelSet, DEFAULT_BASE_STEP, DEFAULT_MAX_LEVELS};
pub use marching_squares::{trace, trace_band, BandRings};
pub use output::{
    contour_file_name, input_file_name, write_geojson, write_metadata, RunMetadata, METADATA_FILE,
};
pub use pipeline::{
    calculate_contours, ContourOptions, ContourOutput, DEFAULT_SMOOTHING_SIGMA, DEFAULT_STRIDE,
    VALID_TIME,
};
pub use point::{Point, Threshold, Vertex};
pub use polygon::{assemble, repair, BandPolygon, Ring, RingGroup};
pub use resample::resample;
pub use ring_assembler::{group_rings, RingAssembler, TracedRing};
pub use shape::{Band, Shape, ShapeType, Ternary};
pub use smoothing::{smooth, smooth_values};
