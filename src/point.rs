use crate::field::GriddedField;
use geo::{coord, Coord};

/// Which threshold of a band an interpolated point lies on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Threshold {
    Lower,
    Upper,
}

/// A sample location of the triangulated grid
///
/// Every cell is split into four triangles around its centre, so besides the
/// grid corners the tracer also visits one synthetic vertex per cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Vertex {
    /// Grid point `(row, col)`
    Corner { row: usize, col: usize },
    /// Centre of the cell whose top-left corner is `(row, col)`
    Center { row: usize, col: usize },
}

impl Vertex {
    pub fn corner(row: usize, col: usize) -> Self {
        Vertex::Corner { row, col }
    }

    pub fn center(row: usize, col: usize) -> Self {
        Vertex::Center { row, col }
    }

    /// Scalar value; a centre takes the mean of its four corners.
    pub fn value(&self, field: &GriddedField) -> f64 {
        match *self {
            Vertex::Corner { row, col } => field.value(row, col) as f64,
            Vertex::Center { row, col } => {
                (field.value(row, col) as f64
                    + field.value(row, col + 1) as f64
                    + field.value(row + 1, col + 1) as f64
                    + field.value(row + 1, col) as f64)
                    / 4.0
            }
        }
    }

    /// Position in grid index space (`x` = column, `y` = row).
    pub fn index_position(&self) -> Coord<f64> {
        match *self {
            Vertex::Corner { row, col } => coord! { x: col as f64, y: row as f64 },
            Vertex::Center { row, col } => coord! { x: col as f64 + 0.5, y: row as f64 + 0.5 },
        }
    }

    /// Longitude/latitude; a centre takes the mean of its four corners.
    pub fn geo_position(&self, field: &GriddedField) -> Coord<f64> {
        let coords = field.coords();
        let at = |r: usize, c: usize| coord! { x: coords.lon_at(r, c) as f64, y: coords.lat_at(r, c) as f64 };
        match *self {
            Vertex::Corner { row, col } => at(row, col),
            Vertex::Center { row, col } => {
                let corners = [at(row, col), at(row, col + 1), at(row + 1, col + 1), at(row + 1, col)];
                let sum = corners.iter().fold(coord! { x: 0.0, y: 0.0 }, |acc, c| acc + *c);
                sum / 4.0
            }
        }
    }
}

/// A node of an isoband boundary
///
/// Nodes are topological keys rather than coordinates: two neighbouring
/// cells that reach the same grid vertex, or cross the same threshold on
/// the same triangle side, produce equal nodes. That is what lets shared
/// boundary edges cancel exactly, independent of floating point noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Point {
    /// A vertex whose value lies inside the band
    At(Vertex),
    /// Threshold crossing on the segment between two vertices.
    /// `from < to` always holds, see [`Point::crossing`].
    Crossing {
        from: Vertex,
        to: Vertex,
        threshold: Threshold,
    },
}

impl Point {
    /// Create a crossing marker; the segment's endpoints are stored in
    /// canonical order so the same crossing is equal from either side.
    pub fn crossing(a: Vertex, b: Vertex, threshold: Threshold) -> Self {
        let (from, to) = if a <= b { (a, b) } else { (b, a) };
        Point::Crossing { from, to, threshold }
    }

    /// Fraction along `from -> to` at which `level` is reached, clamped to `[0, 1]`.
    fn crossing_fraction(from: f64, to: f64, level: f64) -> f64 {
        let delta = to - from;
        if delta.abs() < f64::EPSILON {
            return 0.5;
        }
        ((level - from) / delta).clamp(0.0, 1.0)
    }

    /// Resolve this node to both grid index space and longitude/latitude.
    ///
    /// `lower`/`upper` are the band thresholds used for crossings.
    pub fn locate(&self, field: &GriddedField, lower: f64, upper: f64) -> (Coord<f64>, Coord<f64>) {
        match self {
            Point::At(v) => (v.index_position(), v.geo_position(field)),
            Point::Crossing { from, to, threshold } => {
                let level = match threshold {
                    Threshold::Lower => lower,
                    Threshold::Upper => upper,
                };
                let t = Self::crossing_fraction(from.value(field), to.value(field), level);
                let lerp = |a: Coord<f64>, b: Coord<f64>| a + (b - a) * t;
                (
                    lerp(from.index_position(), to.index_position()),
                    lerp(from.geo_position(field), to.geo_position(field)),
                )
            }
        }
    }
}
