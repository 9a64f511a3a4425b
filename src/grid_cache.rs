//! Coordinate-array memoization keyed by grid geometry.
//!
//! Forecast files for one model run all share the same physical grid, so the
//! longitude/latitude arrays are derived once and handed out as shared
//! [`Arc`]s afterwards. Entries are never invalidated: the arrays for a given
//! grid signature cannot change.

use crate::field::GridCoordinates;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Grid projection type of a decoded message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GridType {
    /// Regular latitude/longitude grid.
    #[serde(rename = "regular_ll")]
    RegularLatLon,
}

/// Native grid description as supplied by the format decoder.
///
/// `ni` points along a row (longitude), `nj` rows (latitude).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridDescriptor {
    pub grid_type: GridType,
    pub ni: usize,
    pub nj: usize,
    pub lat_first: f64,
    pub lon_first: f64,
    pub lat_last: f64,
    pub lon_last: f64,
}

impl GridDescriptor {
    /// Hashable identity of this grid's geometry.
    pub fn signature(&self) -> GridSignature {
        GridSignature {
            grid_type: self.grid_type,
            ni: self.ni,
            nj: self.nj,
            corners: [
                self.lat_first.to_bits(),
                self.lon_first.to_bits(),
                self.lat_last.to_bits(),
                self.lon_last.to_bits(),
            ],
        }
    }

    /// Derive the coordinate arrays for every grid point.
    ///
    /// A last longitude smaller than the first is treated as wrapping
    /// through the antimeridian/prime meridian and shifted by 360°.
    pub fn coordinates(&self) -> crate::Result<GridCoordinates> {
        match self.grid_type {
            GridType::RegularLatLon => {
                let lon_last = if self.lon_last < self.lon_first {
                    self.lon_last + 360.0
                } else {
                    self.lon_last
                };
                let lats = linspace(self.lat_first, self.lat_last, self.nj);
                let lons = linspace(self.lon_first, lon_last, self.ni);
                GridCoordinates::from_axes(&lats, &lons)
            }
        }
    }
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f32> {
    if n < 2 {
        return vec![start as f32; n];
    }
    let step = (end - start) / (n - 1) as f64;
    (0..n)
        .map(|i| {
            if i == n - 1 {
                end as f32
            } else {
                (start + step * i as f64) as f32
            }
        })
        .collect()
}

/// Cache key uniquely identifying a grid's geometry.
///
/// Corner coordinates are compared by their bit patterns so the key is
/// `Eq + Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GridSignature {
    grid_type: GridType,
    ni: usize,
    nj: usize,
    corners: [u64; 4],
}

/// Statistics for the coordinate cache
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GridCacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl GridCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Thread-safe store of coordinate arrays keyed by [`GridSignature`].
///
/// Lookups take a read lock; a miss computes the arrays outside any lock
/// and then inserts them. Two threads racing on the same signature both
/// compute, and the first insert wins so every caller ends up sharing one
/// `Arc`.
///
/// Create one per process (or per test) and share it behind an `Arc`.
#[derive(Debug, Default)]
pub struct GridCache {
    entries: RwLock<HashMap<GridSignature, Arc<GridCoordinates>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl GridCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coordinate arrays for a descriptor, computed on first use.
    pub fn get_coordinates(&self, descriptor: &GridDescriptor) -> crate::Result<Arc<GridCoordinates>> {
        let signature = descriptor.signature();
        if let Some(coords) = self.lookup(&signature) {
            return Ok(coords);
        }
        let coords = descriptor.coordinates()?;
        Ok(self.insert(signature, coords))
    }

    /// Look up `signature`, computing and storing the arrays on a miss.
    pub fn get_or_compute<F>(&self, signature: GridSignature, compute: F) -> Arc<GridCoordinates>
    where
        F: FnOnce() -> GridCoordinates,
    {
        if let Some(coords) = self.lookup(&signature) {
            return coords;
        }
        self.insert(signature, compute())
    }

    fn lookup(&self, signature: &GridSignature) -> Option<Arc<GridCoordinates>> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        match entries.get(signature) {
            Some(coords) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(coords))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn insert(&self, signature: GridSignature, coords: GridCoordinates) -> Arc<GridCoordinates> {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        debug!(
            rows = coords.rows(),
            cols = coords.cols(),
            cached_grids = entries.len() + 1,
            "Caching grid coordinates"
        );
        Arc::clone(entries.entry(signature).or_insert_with(|| Arc::new(coords)))
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> GridCacheStats {
        GridCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}
