//! Ring assembly module
//!
//! Links the boundary edges left in an [`EdgeSet`] into closed rings and
//! groups them into exterior rings with their holes.

use crate::edge::{Edge, EdgeSet, Origin};
use crate::point::Point;
use crate::polygon::{Ring, RingGroup};
use geo::Coord;
use std::collections::BTreeMap;
use tracing::{debug, trace};

/// Rings with less area than this (in grid cells) are treated as degenerate.
const MIN_RING_AREA: f64 = 1e-12;

/// Bounding box for spatial optimization of ring nesting
#[derive(Debug, Clone, Copy)]
pub(crate) struct BBox {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl BBox {
    pub(crate) fn from_points(points: &[Coord<f64>]) -> Self {
        let mut bbox = Self {
            min_x: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            min_y: f64::INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for p in points {
            bbox.min_x = bbox.min_x.min(p.x);
            bbox.max_x = bbox.max_x.max(p.x);
            bbox.min_y = bbox.min_y.min(p.y);
            bbox.max_y = bbox.max_y.max(p.y);
        }
        bbox
    }

    /// Check if this bbox is completely inside another bbox
    pub(crate) fn is_inside(&self, other: &BBox) -> bool {
        self.min_x >= other.min_x
            && self.max_x <= other.max_x
            && self.min_y >= other.min_y
            && self.max_y <= other.max_y
    }
}

/// Check if a point is inside a ring using ray casting
///
/// Reference: http://www.ecse.rpi.edu/Homepages/wrf/Research/Short_Notes/pnpoly.html
pub(crate) fn point_in_ring(point: Coord<f64>, ring: &[Coord<f64>]) -> bool {
    let mut inside = false;
    let mut j = ring.len() - 1;

    for i in 0..ring.len() {
        let one = ring[i];
        let two = ring[j];

        if ((one.y > point.y) != (two.y > point.y))
            && (point.x < (two.x - one.x) * (point.y - one.y) / (two.y - one.y) + one.x)
        {
            inside = !inside;
        }

        j = i;
    }

    inside
}

/// Shoelace area; positive for counter-clockwise in a y-up frame.
pub(crate) fn signed_area(points: &[Coord<f64>]) -> f64 {
    let n = points.len();
    let mut sum = 0.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        sum += a.x * b.y - b.x * a.y;
    }
    sum / 2.0
}

/// Links directed boundary edges into closed rings of nodes
pub struct RingAssembler {
    outgoing: BTreeMap<Point, Vec<Edge>>,
    edge_count: usize,
}

impl RingAssembler {
    /// Create an assembler over the surviving boundary edges of one band
    pub fn new(edges: EdgeSet) -> Self {
        let mut outgoing: BTreeMap<Point, Vec<Edge>> = BTreeMap::new();
        let mut edge_count = 0;
        for edge in edges.into_edges() {
            outgoing.entry(*edge.start()).or_default().push(edge);
            edge_count += 1;
        }
        Self {
            outgoing,
            edge_count,
        }
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Follow edges until every one is used; returns each ring once,
    /// without repeating the starting node.
    ///
    /// Where several edges leave the same node (rings touching at a
    /// point), the edge from the same cell piece as the incoming edge is
    /// preferred, then one from the same cell, so touching regions come
    /// out as separate rings instead of one figure-eight.
    pub fn link(mut self) -> Vec<Vec<Point>> {
        let starts: Vec<Point> = self.outgoing.keys().copied().collect();
        let mut rings = Vec::new();

        for start in starts {
            while let Some(ring) = self.trace_ring(start) {
                if ring.len() >= 3 {
                    rings.push(ring);
                } else {
                    trace!(nodes = ring.len(), "Dropping degenerate ring");
                }
            }
        }

        rings
    }

    fn trace_ring(&mut self, start: Point) -> Option<Vec<Point>> {
        let first = self.take_edge(&start, None)?;
        let mut ring = vec![start];
        let mut previous = *first.origin();
        let mut current = *first.end();

        while current != start {
            ring.push(current);
            let Some(edge) = self.take_edge(&current, Some(previous)) else {
                debug!(nodes = ring.len(), "Boundary chain did not close, dropping it");
                return Some(Vec::new());
            };
            previous = *edge.origin();
            current = *edge.end();
        }

        Some(ring)
    }

    fn take_edge(&mut self, from: &Point, previous: Option<Origin>) -> Option<Edge> {
        let candidates = self.outgoing.get_mut(from)?;
        if candidates.is_empty() {
            return None;
        }
        let index = previous
            .and_then(|origin| {
                candidates
                    .iter()
                    .position(|e| *e.origin() == origin)
                    .or_else(|| candidates.iter().position(|e| e.origin().same_cell(&origin)))
            })
            .unwrap_or(0);
        Some(candidates.remove(index))
    }
}

/// A closed ring located both in grid index space and geographically
#[derive(Debug, Clone)]
pub struct TracedRing {
    index: Vec<Coord<f64>>,
    geo: Vec<Coord<f64>>,
    area: f64,
    bbox: BBox,
}

impl TracedRing {
    /// Build a ring from parallel index-space and geographic positions.
    ///
    /// Consecutive repeated positions are collapsed. Returns `None` for
    /// rings with fewer than 3 distinct points or (almost) no area.
    pub fn new(index: Vec<Coord<f64>>, geo: Vec<Coord<f64>>) -> Option<Self> {
        debug_assert_eq!(index.len(), geo.len());
        let mut kept_index: Vec<Coord<f64>> = Vec::with_capacity(index.len());
        let mut kept_geo: Vec<Coord<f64>> = Vec::with_capacity(geo.len());
        for (i, g) in index.into_iter().zip(geo) {
            if kept_index.last() != Some(&i) {
                kept_index.push(i);
                kept_geo.push(g);
            }
        }
        while kept_index.len() > 1 && kept_index.first() == kept_index.last() {
            kept_index.pop();
            kept_geo.pop();
        }
        if kept_index.len() < 3 {
            return None;
        }

        let area = signed_area(&kept_index);
        if area.abs() < MIN_RING_AREA {
            return None;
        }
        let bbox = BBox::from_points(&kept_index);
        Some(Self {
            index: kept_index,
            geo: kept_geo,
            area,
            bbox,
        })
    }

    /// Band region lies inside; otherwise the ring bounds a hole.
    ///
    /// Boundary edges keep the band on their left in index space
    /// (x = column, y = row), so exteriors have positive shoelace area.
    pub fn is_exterior(&self) -> bool {
        self.area > 0.0
    }

    pub fn area(&self) -> f64 {
        self.area.abs()
    }

    fn contains(&self, other: &TracedRing) -> bool {
        if !other.bbox.is_inside(&self.bbox) {
            return false;
        }
        let inside = other
            .index
            .iter()
            .filter(|&&p| point_in_ring(p, &self.index))
            .count();
        inside * 2 > other.index.len()
    }
}

/// Group rings into exteriors with their holes
///
/// Each hole is attached to the smallest exterior containing it. Groups are
/// returned in the order their exteriors were traced.
pub fn group_rings(rings: Vec<TracedRing>) -> Vec<RingGroup> {
    let (exteriors, holes): (Vec<TracedRing>, Vec<TracedRing>) =
        rings.into_iter().partition(|r| r.is_exterior());

    let mut hole_lists: Vec<Vec<Ring>> = vec![Vec::new(); exteriors.len()];
    let mut orphans = 0;

    for hole in holes {
        let candidates = exteriors
            .iter()
            .enumerate()
            .filter(|(_, ext)| hole.bbox.is_inside(&ext.bbox) && ext.area() > hole.area());
        let owner = candidates
            .clone()
            .filter(|(_, ext)| ext.contains(&hole))
            .min_by(|(_, a), (_, b)| a.area().total_cmp(&b.area()))
            .or_else(|| candidates.min_by(|(_, a), (_, b)| a.area().total_cmp(&b.area())))
            .map(|(i, _)| i);

        match (owner, Ring::new(hole.geo)) {
            (Some(i), Some(ring)) => hole_lists[i].push(ring),
            (None, _) => orphans += 1,
            (Some(_), None) => trace!("Hole collapsed in geographic space"),
        }
    }

    if orphans > 0 {
        debug!(orphans, "Dropped holes without an enclosing exterior");
    }

    exteriors
        .into_iter()
        .zip(hole_lists)
        .filter_map(|(ext, holes)| {
            Ring::new(ext.geo).map(|exterior| RingGroup { exterior, holes })
        })
        .collect()
}
