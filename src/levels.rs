//! Contour level sets and automatic level derivation.

use crate::error::{ContourError, Result};
use tracing::debug;

/// Default spacing between derived levels (metres of wave height).
pub const DEFAULT_BASE_STEP: f64 = 0.5;

/// Default cap on the number of derived levels.
pub const DEFAULT_MAX_LEVELS: usize = 60;

/// Strictly increasing thresholds; `N` levels define `N - 1` bands.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelSet {
    levels: Vec<f64>,
}

impl LevelSet {
    /// Validate an explicit level list.
    ///
    /// # Example
    ///
    /// ```
    /// use wave_isobands::LevelSet;
    ///
    /// let levels = LevelSet::new(vec![0.0, 1.0, 2.5]).unwrap();
    /// assert_eq!(levels.band_count(), 2);
    /// assert!(LevelSet::new(vec![1.0, 1.0]).is_err());
    /// ```
    pub fn new(levels: Vec<f64>) -> Result<Self> {
        if levels.len() < 2 {
            return Err(ContourError::invalid_levels(format!(
                "need at least 2 levels, got {}",
                levels.len()
            )));
        }
        if let Some(bad) = levels.iter().find(|l| !l.is_finite()) {
            return Err(ContourError::invalid_levels(format!("non-finite level {bad}")));
        }
        if let Some(pair) = levels.windows(2).find(|w| w[0] >= w[1]) {
            return Err(ContourError::invalid_levels(format!(
                "levels must be strictly increasing ({} >= {})",
                pair[0], pair[1]
            )));
        }
        Ok(Self { levels })
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always false: a level set holds at least 2 entries.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn band_count(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn first(&self) -> f64 {
        self.levels[0]
    }

    pub fn last(&self) -> f64 {
        self.levels[self.levels.len() - 1]
    }

    /// Consecutive `(lower, upper)` pairs, lowest band first.
    pub fn bands(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.levels.windows(2).map(|w| (w[0], w[1]))
    }
}

/// Derive levels from the range of the finite entries of `values`.
///
/// Levels run `0, base_step, 2·base_step, …` up to at least the maximum
/// value. When that would take more than `max_levels` entries, `max_levels`
/// evenly spaced levels from 0 to the maximum are used instead. A field
/// whose values are all `<= 0` gets `[0, base_step]`.
///
/// # Example
///
/// ```
/// use wave_isobands::derive_levels;
///
/// let levels = derive_levels(&[0.2, 1.1, f32::NAN], 0.5, 60).unwrap();
/// assert_eq!(levels.as_slice(), &[0.0, 0.5, 1.0, 1.5]);
/// ```
pub fn derive_levels(values: &[f32], base_step: f64, max_levels: usize) -> Result<LevelSet> {
    if !(base_step > 0.0) || !base_step.is_finite() {
        return Err(ContourError::invalid_levels(format!(
            "base step must be positive, got {base_step}"
        )));
    }
    if max_levels < 2 {
        return Err(ContourError::invalid_levels(format!(
            "max_levels must be at least 2, got {max_levels}"
        )));
    }

    let vmax = values
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| v as f64)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |m| m.max(v))))
        .ok_or(ContourError::EmptyInput)?;

    if vmax <= 0.0 {
        return LevelSet::new(vec![0.0, base_step]);
    }

    let count = ((vmax + base_step) / base_step).ceil() as usize;
    let mut levels: Vec<f64> = if count > max_levels {
        let step = vmax / (max_levels - 1) as f64;
        (0..max_levels)
            .map(|i| if i == max_levels - 1 { vmax } else { i as f64 * step })
            .collect()
    } else {
        (0..count).map(|i| i as f64 * base_step).collect()
    };

    if levels.last().is_some_and(|&last| last < vmax) {
        levels.push(vmax);
    }
    if levels.len() < 2 {
        levels = vec![0.0, vmax];
    }

    debug!(vmax, count = levels.len(), "Derived contour levels");
    LevelSet::new(levels)
}
