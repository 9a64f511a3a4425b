//! Polygon assembly and repair
//!
//! Turns the tracer's ring groups into [`BandPolygon`]s. A group whose rings
//! are not simple (self-intersecting, overlapping, or touching one another) is
//! rebuilt through a polygon union with an empty geometry, the same
//! zero-width repair that buffer-by-zero provides in other geometry stacks.

use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::{Area, BooleanOps, Coord, Line, LineString, MultiPolygon, Polygon};
use tracing::{debug, trace};

/// A closed ring of at least 3 distinct vertices, stored without the
/// closing point.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring {
    points: Vec<Coord<f64>>,
}

impl Ring {
    /// Create a ring, collapsing consecutive duplicates and an explicit
    /// closing point. Returns `None` with fewer than 3 distinct vertices.
    ///
    /// # Example
    ///
    /// ```
    /// use geo::coord;
    /// use wave_isobands::Ring;
    ///
    /// let ring = Ring::new(vec![
    ///     coord! { x: 0.0, y: 0.0 },
    ///     coord! { x: 1.0, y: 0.0 },
    ///     coord! { x: 1.0, y: 1.0 },
    ///     coord! { x: 0.0, y: 0.0 },
    /// ])
    /// .unwrap();
    /// assert_eq!(ring.len(), 3);
    /// assert!(Ring::new(vec![coord! { x: 0.0, y: 0.0 }, coord! { x: 1.0, y: 0.0 }]).is_none());
    /// ```
    pub fn new(points: impl IntoIterator<Item = Coord<f64>>) -> Option<Self> {
        let mut kept: Vec<Coord<f64>> = Vec::new();
        for p in points {
            if kept.last() != Some(&p) {
                kept.push(p);
            }
        }
        while kept.len() > 1 && kept.first() == kept.last() {
            kept.pop();
        }
        if !has_three_distinct(&kept) {
            return None;
        }
        Some(Self { points: kept })
    }

    /// Ring from a (closed or open) line string.
    pub fn from_line_string(line: &LineString<f64>) -> Option<Self> {
        Self::new(line.0.iter().copied())
    }

    pub fn points(&self) -> &[Coord<f64>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: a ring holds at least 3 points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Closed line string (first point repeated at the end).
    pub fn to_line_string(&self) -> LineString<f64> {
        let mut coords = self.points.clone();
        coords.push(self.points[0]);
        LineString::new(coords)
    }

    /// Segments of the closed ring, in order.
    pub fn segments(&self) -> impl Iterator<Item = Line<f64>> + '_ {
        let n = self.points.len();
        (0..n).map(move |i| Line::new(self.points[i], self.points[(i + 1) % n]))
    }
}

fn has_three_distinct(points: &[Coord<f64>]) -> bool {
    let Some(&a) = points.first() else {
        return false;
    };
    let Some(&b) = points.iter().find(|&&p| p != a) else {
        return false;
    };
    points.iter().any(|&p| p != a && p != b)
}

/// The rings the tracer found for one connected region of a band:
/// the region's outer boundary and the boundaries of any holes in it.
#[derive(Debug, Clone, PartialEq)]
pub struct RingGroup {
    pub exterior: Ring,
    pub holes: Vec<Ring>,
}

impl RingGroup {
    pub fn new(exterior: Ring, holes: Vec<Ring>) -> Self {
        Self { exterior, holes }
    }
}

/// A polygon of one band: exterior ring, holes and the band thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct BandPolygon {
    exterior: Ring,
    holes: Vec<Ring>,
    lower: f64,
    upper: f64,
}

impl BandPolygon {
    pub fn new(exterior: Ring, holes: Vec<Ring>, lower: f64, upper: f64) -> Self {
        Self {
            exterior,
            holes,
            lower,
            upper,
        }
    }

    /// Convert a `geo` polygon, dropping rings that collapse below 3 points.
    /// Returns `None` when the exterior collapses or the area is zero.
    pub fn from_polygon(polygon: &Polygon<f64>, lower: f64, upper: f64) -> Option<Self> {
        let exterior = Ring::from_line_string(polygon.exterior())?;
        let holes = polygon
            .interiors()
            .iter()
            .filter_map(Ring::from_line_string)
            .collect();
        let band = Self::new(exterior, holes, lower, upper);
        (band.area() > 0.0).then_some(band)
    }

    pub fn exterior(&self) -> &Ring {
        &self.exterior
    }

    pub fn holes(&self) -> &[Ring] {
        &self.holes
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(
            self.exterior.to_line_string(),
            self.holes.iter().map(Ring::to_line_string).collect(),
        )
    }

    /// Area of the exterior minus the holes, in squared coordinate units.
    pub fn area(&self) -> f64 {
        self.to_polygon().unsigned_area()
    }

    pub fn vertex_count(&self) -> usize {
        self.exterior.len() + self.holes.iter().map(Ring::len).sum::<usize>()
    }

    /// True when no ring intersects itself or any other ring.
    ///
    /// Consecutive segments of a ring may only share their common vertex;
    /// any other contact, including rings touching at a single point, makes
    /// the polygon non-simple.
    pub fn is_simple(&self) -> bool {
        let rings: Vec<&Ring> = std::iter::once(&self.exterior).chain(&self.holes).collect();
        let mut segments: Vec<RingSegment> = Vec::with_capacity(self.vertex_count());
        for (ring_index, ring) in rings.iter().enumerate() {
            for (index, line) in ring.segments().enumerate() {
                segments.push(RingSegment {
                    ring: ring_index,
                    index,
                    ring_len: ring.len(),
                    line,
                    min_x: line.start.x.min(line.end.x),
                    max_x: line.start.x.max(line.end.x),
                    min_y: line.start.y.min(line.end.y),
                    max_y: line.start.y.max(line.end.y),
                });
            }
        }
        segments.sort_by(|a, b| a.min_x.total_cmp(&b.min_x));

        for (i, a) in segments.iter().enumerate() {
            for b in &segments[i + 1..] {
                if b.min_x > a.max_x {
                    break;
                }
                if b.min_y > a.max_y || b.max_y < a.min_y {
                    continue;
                }
                let Some(hit) = line_intersection(a.line, b.line) else {
                    continue;
                };
                let allowed = a.is_adjacent(b)
                    && matches!(hit, LineIntersection::SinglePoint { is_proper: false, .. });
                if !allowed {
                    return false;
                }
            }
        }
        true
    }
}

#[derive(Debug, Clone, Copy)]
struct RingSegment {
    ring: usize,
    index: usize,
    ring_len: usize,
    line: Line<f64>,
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl RingSegment {
    fn is_adjacent(&self, other: &RingSegment) -> bool {
        if self.ring != other.ring {
            return false;
        }
        let (lo, hi) = (self.index.min(other.index), self.index.max(other.index));
        hi - lo == 1 || (lo == 0 && hi == self.ring_len - 1)
    }
}

/// Zero-width repair of a possibly invalid polygon.
///
/// Returns the valid polygons covering the same region (possibly none).
pub fn repair(polygon: &Polygon<f64>) -> Vec<Polygon<f64>> {
    let subject = MultiPolygon::new(vec![polygon.clone()]);
    let MultiPolygon(parts) = subject.union(&MultiPolygon::new(Vec::new()));
    parts
}

/// Build the band polygons of one ring group
///
/// The exterior and holes are taken as traced. If the result is not simple
/// it is repaired, which may split it into several polygons or leave
/// nothing at all; degenerate results are discarded, never reported as
/// errors.
pub fn assemble(group: RingGroup, lower: f64, upper: f64) -> Vec<BandPolygon> {
    let polygon = BandPolygon::new(group.exterior, group.holes, lower, upper);
    if polygon.is_simple() && polygon.area() > 0.0 {
        return vec![polygon];
    }

    let repaired: Vec<BandPolygon> = repair(&polygon.to_polygon())
        .iter()
        .filter_map(|p| BandPolygon::from_polygon(p, lower, upper))
        .collect();

    if repaired.is_empty() {
        debug!(
            lower,
            upper,
            vertices = polygon.vertex_count(),
            "Discarding polygon, repair produced an empty geometry"
        );
    } else {
        trace!(lower, upper, parts = repaired.len(), "Repaired non-simple polygon");
    }
    repaired
}
