//! Decoded swell documents
//!
//! The binary meteorological format is parsed by an external decoder, which
//! hands over a JSON document holding the native grid description and one
//! message per physical quantity:
//!
//! ```json
//! {
//!   "grid": { "grid_type": "regular_ll", "ni": 2, "nj": 2,
//!             "lat_first": 1.0, "lon_first": 0.0, "lat_last": 0.0, "lon_last": 1.0 },
//!   "messages": [
//!     { "name": "Significant height of total swell",
//!       "valid_time": "2024-12-20T18:00:00Z", "values": [1.0, 2.0, null, 1.5] }
//!   ]
//! }
//! ```
//!
//! `null` values are missing measurements and end up in the field's mask.

use crate::error::{ContourError, Result};
use crate::field::GriddedField;
use crate::grid_cache::{GridCache, GridDescriptor};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Message name of the significant swell height
pub const SWELL_HEIGHT: &str = "Significant height of total swell";
/// Message name of the mean swell period
pub const SWELL_PERIOD: &str = "Mean period of total swell";
/// Message name of the swell direction
pub const SWELL_DIRECTION: &str = "Direction of swell waves";

/// One decoded quantity on the document's grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwellMessage {
    pub name: String,
    pub valid_time: DateTime<Utc>,
    /// Row-major values, `nj` rows of `ni`; `null` marks a missing point
    pub values: Vec<Option<f32>>,
}

/// A decoded file: grid description plus its messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwellDocument {
    pub grid: GridDescriptor,
    pub messages: Vec<SwellMessage>,
}

impl SwellDocument {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// First message with the given name.
    pub fn message(&self, name: &str) -> Option<&SwellMessage> {
        self.messages.iter().find(|m| m.name == name)
    }

    fn require(&self, name: &str) -> Result<&SwellMessage> {
        self.message(name)
            .ok_or_else(|| ContourError::missing_field(name))
    }
}

/// The three co-registered swell quantities of one forecast hour
#[derive(Debug, Clone)]
pub struct DecodedSwell {
    pub height: GriddedField,
    pub period: GriddedField,
    pub direction: GriddedField,
}

impl DecodedSwell {
    pub fn valid_time(&self) -> Option<DateTime<Utc>> {
        self.height.valid_time()
    }
}

/// Extract height, period and direction from a decoded document
///
/// Fails with [`ContourError::MissingField`] when a quantity is absent and
/// with [`ContourError::TimestampMismatch`] when their valid times differ.
/// Coordinates come from `cache`, so documents on the same grid share them.
pub fn decode_swell(document: &SwellDocument, cache: &GridCache) -> Result<DecodedSwell> {
    let height = document.require(SWELL_HEIGHT)?;
    let period = document.require(SWELL_PERIOD)?;
    let direction = document.require(SWELL_DIRECTION)?;

    if height.valid_time != period.valid_time || height.valid_time != direction.valid_time {
        return Err(ContourError::TimestampMismatch {
            height: height.valid_time,
            period: period.valid_time,
            direction: direction.valid_time,
        });
    }

    let coords = cache.get_coordinates(&document.grid)?;
    let to_field = |message: &SwellMessage| -> Result<GriddedField> {
        let values: Vec<f32> = message
            .values
            .iter()
            .map(|v| v.unwrap_or(f32::NAN))
            .collect();
        let field = GriddedField::new(coords.clone(), values)?.with_valid_time(message.valid_time);
        if message.values.iter().any(Option::is_none) {
            field.with_mask(message.values.iter().map(Option::is_none).collect())
        } else {
            Ok(field)
        }
    };

    let decoded = DecodedSwell {
        height: to_field(height)?,
        period: to_field(period)?,
        direction: to_field(direction)?,
    };
    debug!(
        rows = decoded.height.rows(),
        cols = decoded.height.cols(),
        valid_time = %height.valid_time,
        missing = decoded.height.rows() * decoded.height.cols() - decoded.height.valid_count(),
        "Decoded swell fields"
    );
    Ok(decoded)
}
