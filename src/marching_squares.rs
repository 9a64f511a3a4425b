//! Main marching squares algorithm implementation
//!
//! This module converts a [`GriddedField`] into the boundary rings of
//! filled contour bands (isobands). For every band, each grid cell is
//! classified against the two thresholds and contributes the outline of its
//! in-band region (see [`Shape`]). Outlines of neighbouring cells cancel along
//! shared edges, so what is left is exactly the boundary of the band, which
//! is then linked into rings and grouped into exteriors with holes.
//!
//! Adjacent bands split every cell along the same iso-lines, so together they
//! cover the valid part of the grid without gaps or overlaps.

use crate::edge::EdgeSet;
use crate::field::GriddedField;
use crate::levels::LevelSet;
use crate::point::Point;
use crate::polygon::RingGroup;
use crate::ring_assembler::{group_rings, RingAssembler, TracedRing};
use crate::shape::{Band, Shape};
use rayon::prelude::*;
use std::time::Instant;
use tracing::debug;

/// All ring groups traced for one band
#[derive(Debug, Clone, PartialEq)]
pub struct BandRings {
    pub lower: f64,
    pub upper: f64,
    pub groups: Vec<RingGroup>,
}

impl BandRings {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Number of exterior and hole rings.
    pub fn ring_count(&self) -> usize {
        self.groups.iter().map(|g| 1 + g.holes.len()).sum()
    }
}

/// Trace a single isoband
///
/// Cells with any invalid corner are never part of a band. Rings that come
/// out with fewer than 3 distinct points or no area are dropped.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use wave_isobands::{trace_band, Band, GridCoordinates, GriddedField};
///
/// let coords = Arc::new(
///     GridCoordinates::from_axes(&[2.0, 1.0, 0.0], &[0.0, 1.0, 2.0]).unwrap(),
/// );
/// let field = GriddedField::new(
///     coords,
///     vec![0.0, 0.0, 0.0, 0.0, 2.0, 0.0, 0.0, 0.0, 0.0],
/// )
/// .unwrap();
///
/// let band = trace_band(&field, Band::new(1.0, 3.0));
/// assert_eq!(band.groups.len(), 1);
/// assert!(band.groups[0].holes.is_empty());
/// ```
pub fn trace_band(field: &GriddedField, band: Band) -> BandRings {
    let start = Instant::now();
    let rows = field.rows();
    let cols = field.cols();

    let mut edges = EdgeSet::new();
    let mut shapes = 0usize;
    for r in 0..rows - 1 {
        for c in 0..cols - 1 {
            if let Some(shape) = Shape::create(field, &band, r, c) {
                shapes += 1;
                shape.add_edges(&mut edges);
            }
        }
    }
    let cancelled = edges.cancelled();

    let assembler = RingAssembler::new(edges);
    let boundary_edges = assembler.edge_count();
    let node_rings = assembler.link();

    let traced: Vec<TracedRing> = node_rings
        .iter()
        .filter_map(|nodes| locate_ring(field, &band, nodes))
        .collect();
    let degenerate = node_rings.len() - traced.len();
    let groups = group_rings(traced);

    debug!(
        lower = band.lower,
        upper = band.upper,
        shapes,
        cancelled,
        boundary_edges,
        rings = node_rings.len(),
        degenerate,
        groups = groups.len(),
        elapsed = ?start.elapsed(),
        "Traced band"
    );

    BandRings {
        lower: band.lower,
        upper: band.upper,
        groups,
    }
}

fn locate_ring(field: &GriddedField, band: &Band, nodes: &[Point]) -> Option<TracedRing> {
    let (index, geo): (Vec<_>, Vec<_>) = nodes
        .iter()
        .map(|p| p.locate(field, band.lower, band.upper))
        .unzip();
    TracedRing::new(index, geo)
}

/// Trace every band of a level set concurrently
///
/// Bands are independent, so each is traced on its own rayon task. The
/// result holds one entry per band, lowest band first, including bands
/// with no rings. The last band is closed at its upper threshold so the
/// field's maximum is not lost.
pub fn trace(field: &GriddedField, levels: &LevelSet) -> Vec<BandRings> {
    let levels = levels.as_slice();
    let last = levels.len() - 2;
    let start = Instant::now();

    let bands: Vec<BandRings> = (0..levels.len() - 1)
        .into_par_iter()
        .map(|i| {
            let band = if i == last {
                Band::closed(levels[i], levels[i + 1])
            } else {
                Band::new(levels[i], levels[i + 1])
            };
            trace_band(field, band)
        })
        .collect();

    debug!(
        bands = bands.len(),
        rows = field.rows(),
        cols = field.cols(),
        elapsed = ?start.elapsed(),
        "Traced all bands"
    );
    bands
}
