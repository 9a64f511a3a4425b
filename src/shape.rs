use crate::edge::{EdgeSet, Origin};
use crate::field::GriddedField;
use crate::point::{Point, Threshold, Vertex};
use arrayvec::ArrayVec;

/// Ternary classification of a sample against a band
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ternary {
    Below = 0,
    Within = 1,
    Above = 2,
}

/// One isoband: `[lower, upper)`, or `[lower, upper]` for the topmost band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub lower: f64,
    pub upper: f64,
    pub closed_upper: bool,
}

impl Band {
    /// Half-open band `[lower, upper)`.
    pub fn new(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            closed_upper: false,
        }
    }

    /// Closed band `[lower, upper]`, used for the last band of a level set.
    pub fn closed(lower: f64, upper: f64) -> Self {
        Self {
            lower,
            upper,
            closed_upper: true,
        }
    }

    #[inline]
    pub fn classify(&self, value: f64) -> Ternary {
        if value < self.lower {
            Ternary::Below
        } else if value < self.upper || (self.closed_upper && value == self.upper) {
            Ternary::Within
        } else {
            Ternary::Above
        }
    }
}

/// The geometric shape type formed by a cell configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeType {
    /// All four corners inside the band; the cell outline is emitted as is.
    Square,
    /// Mixed corners; each of the four triangles is clipped to the band.
    Partial,
}

/// Outline of one triangle clipped to a band. A triangle has 3 vertices
/// and each side adds at most 2 crossings.
type Piece = ArrayVec<Point, 9>;

/// A single cell's contribution to an isoband
///
/// The cell is split into four triangles sharing its centre point (whose
/// value is the mean of the corners). Within a triangle the field is linear,
/// so the band region is a convex polygon and saddle cells are resolved by
/// the centre value. Every piece is walked counter-clockwise in index space.
#[derive(Debug)]
pub struct Shape {
    shape_type: ShapeType,
    /// Base-3 code of the corner classifications, `tl·27 + tr·9 + br·3 + bl`
    value: u8,
    row: usize,
    col: usize,
    pieces: ArrayVec<(u8, Piece), 4>,
}

impl Shape {
    /// Classify the cell with top-left corner `(row, col)` against `band`.
    ///
    /// Returns `None` for cells with an invalid corner and for cells that
    /// lie entirely below or entirely above the band.
    pub fn create(field: &GriddedField, band: &Band, row: usize, col: usize) -> Option<Self> {
        let corners = [
            Vertex::corner(row, col),
            Vertex::corner(row, col + 1),
            Vertex::corner(row + 1, col + 1),
            Vertex::corner(row + 1, col),
        ];
        let valid = [(row, col), (row, col + 1), (row + 1, col + 1), (row + 1, col)]
            .iter()
            .all(|&(r, c)| field.is_valid(r, c));
        if !valid {
            return None;
        }

        let values = corners.map(|v| v.value(field));
        let classes = values.map(|v| band.classify(v));
        let value = classes
            .iter()
            .fold(0u8, |acc, &class| acc * 3 + class as u8);

        let mut pieces = ArrayVec::new();
        let shape_type = match value {
            0 | 80 => return None,
            40 => {
                let outline: Piece = corners.iter().map(|&v| Point::At(v)).collect();
                pieces.push((Origin::WHOLE_CELL, outline));
                ShapeType::Square
            }
            _ => {
                let center = Vertex::center(row, col);
                let center_class = band.classify(center.value(field));
                for i in 0..4 {
                    let j = (i + 1) % 4;
                    let piece = clip_triangle(
                        [corners[i], corners[j], center],
                        [classes[i], classes[j], center_class],
                    );
                    if piece.len() >= 3 {
                        pieces.push((i as u8, piece));
                    }
                }
                ShapeType::Partial
            }
        };

        Some(Self {
            shape_type,
            value,
            row,
            col,
            pieces,
        })
    }

    pub fn shape_type(&self) -> ShapeType {
        self.shape_type
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn col(&self) -> usize {
        self.col
    }

    /// Outlines of the band region within this cell.
    pub fn pieces(&self) -> impl Iterator<Item = &[Point]> {
        self.pieces.iter().map(|(_, piece)| piece.as_slice())
    }

    /// Add this cell's outlines to the band's edge set.
    pub fn add_edges(&self, edges: &mut EdgeSet) {
        for (piece, outline) in &self.pieces {
            edges.insert_cycle(outline, Origin::new(self.row, self.col, *piece));
        }
    }
}

/// Clip the triangle `vertices` (counter-clockwise) to the band.
///
/// Walks the sides in order, emitting each vertex inside the band followed
/// by the thresholds crossed on the way to the next vertex.
fn clip_triangle(vertices: [Vertex; 3], classes: [Ternary; 3]) -> Piece {
    use Ternary::*;

    let mut out = Piece::new();
    for i in 0..3 {
        let j = (i + 1) % 3;
        let (a, b) = (vertices[i], vertices[j]);
        if classes[i] == Within {
            out.push(Point::At(a));
        }
        let crossings: &[Threshold] = match (classes[i], classes[j]) {
            (Below, Within) | (Within, Below) => &[Threshold::Lower],
            (Above, Within) | (Within, Above) => &[Threshold::Upper],
            (Below, Above) => &[Threshold::Lower, Threshold::Upper],
            (Above, Below) => &[Threshold::Upper, Threshold::Lower],
            _ => &[],
        };
        for &threshold in crossings {
            out.push(Point::crossing(a, b, threshold));
        }
    }
    out
}
