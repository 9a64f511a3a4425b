use crate::point::Point;
use std::collections::BTreeMap;

/// Piece of the grid an edge was emitted by
///
/// `piece` is the triangle index within the cell (0 top, 1 right, 2 bottom,
/// 3 left), or [`Origin::WHOLE_CELL`] when the whole square lies inside the band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Origin {
    pub row: usize,
    pub col: usize,
    pub piece: u8,
}

impl Origin {
    pub const WHOLE_CELL: u8 = 4;

    pub fn new(row: usize, col: usize, piece: u8) -> Self {
        Self { row, col, piece }
    }

    pub fn same_cell(&self, other: &Origin) -> bool {
        self.row == other.row && self.col == other.col
    }
}

/// A directed edge of an isoband boundary
///
/// The band region is always on the left of `start -> end` in grid index
/// space (x = column, y = row).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    start: Point,
    end: Point,
    origin: Origin,
}

impl Edge {
    pub fn new(start: Point, end: Point, origin: Origin) -> Self {
        Self { start, end, origin }
    }

    /// Get the start point of this edge
    pub fn start(&self) -> &Point {
        &self.start
    }

    /// Get the end point of this edge
    pub fn end(&self) -> &Point {
        &self.end
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }
}

/// Boundary edges of a band, with interior edges cancelled
///
/// Each cell piece contributes its outline as a closed cycle. An edge shared
/// by two pieces inside the band shows up once in each direction; inserting
/// the reverse of a stored edge removes both, leaving only the band boundary.
#[derive(Debug, Default)]
pub struct EdgeSet {
    edges: BTreeMap<(Point, Point), Origin>,
    cancelled: usize,
}

impl EdgeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one directed edge, cancelling it against its reverse if present.
    pub fn insert(&mut self, edge: Edge) {
        if edge.start == edge.end {
            return;
        }
        if self.edges.remove(&(edge.end, edge.start)).is_some() {
            self.cancelled += 1;
        } else {
            self.edges.entry((edge.start, edge.end)).or_insert(edge.origin);
        }
    }

    /// Add the closed outline `points[0] -> points[1] -> ... -> points[0]`.
    pub fn insert_cycle(&mut self, points: &[Point], origin: Origin) {
        if points.len() < 3 {
            return;
        }
        for (i, start) in points.iter().enumerate() {
            let end = points[(i + 1) % points.len()];
            self.insert(Edge::new(*start, end, origin));
        }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Number of shared edge pairs removed so far.
    pub fn cancelled(&self) -> usize {
        self.cancelled
    }

    /// Remaining boundary edges in ascending `(start, end)` order.
    pub fn into_edges(self) -> impl Iterator<Item = Edge> {
        self.edges
            .into_iter()
            .map(|((start, end), origin)| Edge::new(start, end, origin))
    }
}
