//! Gap-aware Gaussian smoothing
//!
//! Missing cells are given zero weight instead of a zero value: the field and
//! a 0/1 validity indicator are blurred separately and divided cell by cell,
//! so every output cell is a weighted average of its *valid* neighbours only.
//! A cell whose whole neighbourhood is invalid stays NaN.
//!
//! The kernel follows the usual separable definition: radius
//! `floor(4σ + 0.5)`, weights `exp(-x²/2σ²)` normalised to 1, and edge
//! samples replicated beyond the border (`nearest` boundary mode).

use crate::field::GriddedField;
use tracing::debug;

/// Kernel truncation in standard deviations.
const TRUNCATE: f64 = 4.0;

/// Upper bound on the kernel radius in cells.
const MAX_RADIUS: usize = 1 << 16;

fn smoothing_enabled(sigma: f64) -> bool {
    sigma > 0.0 && sigma.is_finite()
}

/// Smooth a field with a gap-aware Gaussian of standard deviation `sigma` (in cells).
///
/// Returns the input unchanged when `sigma` is not a positive finite number
/// or when no cell is valid.
/// Otherwise the result carries no mask; invalid cells are NaN.
pub fn smooth(field: &GriddedField, sigma: f64) -> GriddedField {
    if !smoothing_enabled(sigma) {
        return field.clone();
    }
    let values = field.masked_values();
    if values.iter().all(|v| v.is_nan()) {
        return field.clone();
    }
    let smoothed = smooth_values(&values, field.rows(), field.cols(), sigma);
    field.replace_values(smoothed)
}

/// Gap-aware Gaussian over a flat row-major array where NaN marks missing data.
pub fn smooth_values(values: &[f32], rows: usize, cols: usize, sigma: f64) -> Vec<f32> {
    if !smoothing_enabled(sigma) || values.iter().all(|v| v.is_nan()) {
        return values.to_vec();
    }

    let kernel = gaussian_kernel(sigma);

    let filled: Vec<f64> = values
        .iter()
        .map(|&v| if v.is_nan() { 0.0 } else { v as f64 })
        .collect();
    let indicator: Vec<f64> = values
        .iter()
        .map(|&v| if v.is_nan() { 0.0 } else { 1.0 })
        .collect();

    let numerator = gaussian_filter(&filled, rows, cols, &kernel);
    let weights = gaussian_filter(&indicator, rows, cols, &kernel);

    let mut restored = 0usize;
    let out: Vec<f32> = numerator
        .iter()
        .zip(&weights)
        .zip(values)
        .map(|((&num, &w), &orig)| {
            if w > 0.0 {
                if orig.is_nan() {
                    restored += 1;
                }
                (num / w) as f32
            } else {
                f32::NAN
            }
        })
        .collect();

    debug!(
        sigma,
        radius = kernel.len() / 2,
        filled_gaps = restored,
        "Gap-aware smoothing complete"
    );
    out
}

/// Normalised 1-D Gaussian weights of length `2 * radius + 1`.
pub(crate) fn gaussian_kernel(sigma: f64) -> Vec<f64> {
    let radius = ((TRUNCATE * sigma + 0.5) as usize).min(MAX_RADIUS);
    let mut kernel: Vec<f64> = (0..=2 * radius)
        .map(|i| {
            let x = i as f64 - radius as f64;
            (-0.5 * x * x / (sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = kernel.iter().sum();
    for w in &mut kernel {
        *w /= sum;
    }
    kernel
}

/// Separable convolution with edge replication: rows first, then columns.
fn gaussian_filter(data: &[f64], rows: usize, cols: usize, kernel: &[f64]) -> Vec<f64> {
    let radius = (kernel.len() / 2) as isize;
    let clamp = |i: isize, n: usize| i.clamp(0, n as isize - 1) as usize;

    let mut along_rows = vec![0.0; data.len()];
    for r in 0..rows {
        let row = &data[r * cols..(r + 1) * cols];
        for c in 0..cols {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let cc = clamp(c as isize + k as isize - radius, cols);
                acc += w * row[cc];
            }
            along_rows[r * cols + c] = acc;
        }
    }

    let mut out = vec![0.0; data.len()];
    for c in 0..cols {
        for r in 0..rows {
            let mut acc = 0.0;
            for (k, w) in kernel.iter().enumerate() {
                let rr = clamp(r as isize + k as isize - radius, rows);
                acc += w * along_rows[rr * cols + c];
            }
            out[r * cols + c] = acc;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::GridCoordinates;
    use std::sync::Arc;

    fn field(rows: usize, cols: usize, values: Vec<f32>) -> GriddedField {
        let lats: Vec<f32> = (0..rows).map(|r| r as f32).collect();
        let lons: Vec<f32> = (0..cols).map(|c| c as f32).collect();
        let coords = Arc::new(GridCoordinates::from_axes(&lats, &lons).unwrap());
        GriddedField::new(coords, values).unwrap()
    }

    #[test]
    fn test_kernel_normalised() {
        let kernel = gaussian_kernel(1.0);
        assert_eq!(kernel.len(), 9); // radius 4
        let sum: f64 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12);
        assert!(kernel[4] > kernel[3]);
        assert!((kernel[3] - kernel[5]).abs() < 1e-15);
    }

    #[test]
    fn test_zero_sigma_is_identity() {
        let f = field(2, 2, vec![1.0, f32::NAN, 3.0, 4.0]);
        let out = smooth(&f, 0.0);
        assert_eq!(out.values()[0], 1.0);
        assert!(out.values()[1].is_nan());
        assert_eq!(out.values()[3], 4.0);
    }

    #[test]
    fn test_non_finite_sigma_is_identity() {
        let f = field(3, 3, (0..9).map(|i| i as f32).collect());
        for sigma in [f64::INFINITY, f64::NAN, -1.0] {
            let out = smooth(&f, sigma);
            assert_eq!(out.values(), f.values());
        }
        assert_eq!(
            smooth_values(&[1.0, 2.0, 3.0, 4.0], 2, 2, f64::INFINITY),
            vec![1.0, 2.0, 3.0, 4.0]
        );
    }

    #[test]
    fn test_huge_sigma_is_bounded() {
        let kernel = gaussian_kernel(1e30);
        assert_eq!(kernel.len(), 2 * MAX_RADIUS + 1);
        let sum: f64 = kernel.iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_gap_free_matches_plain_gaussian_blur() {
        let (rows, cols, sigma) = (7usize, 9usize, 1.3);
        let values: Vec<f32> = (0..rows * cols)
            .map(|i| {
                let (r, c) = ((i / cols) as f32, (i % cols) as f32);
                (r * 0.7).sin() * 2.0 + c * 0.3 + if (r as usize + c as usize) % 3 == 0 { 1.0 } else { 0.0 }
            })
            .collect();

        // Direct 2-D convolution with edge replication, no validity weighting
        let radius = (4.0 * sigma + 0.5) as isize;
        let weight = |d: isize| (-0.5 * (d * d) as f64 / (sigma * sigma)).exp();
        let norm: f64 = (-radius..=radius).map(weight).sum();
        let mut reference = vec![0.0f64; rows * cols];
        for r in 0..rows as isize {
            for c in 0..cols as isize {
                let mut acc = 0.0;
                for dr in -radius..=radius {
                    for dc in -radius..=radius {
                        let rr = (r + dr).clamp(0, rows as isize - 1) as usize;
                        let cc = (c + dc).clamp(0, cols as isize - 1) as usize;
                        acc += weight(dr) * weight(dc) * values[rr * cols + cc] as f64;
                    }
                }
                reference[r as usize * cols + c as usize] = acc / (norm * norm);
            }
        }

        let out = smooth_values(&values, rows, cols, sigma);
        assert!(out.iter().all(|v| v.is_finite()), "no NaN without gaps");
        for (got, want) in out.iter().zip(&reference) {
            assert!((*got as f64 - want).abs() < 1e-5, "got {got}, want {want}");
        }
    }

    #[test]
    fn test_all_invalid_is_identity() {
        let f = field(3, 3, vec![f32::NAN; 9]);
        let out = smooth(&f, 2.0);
        assert!(out.values().iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_constant_field_is_preserved() {
        let f = field(5, 6, vec![2.5; 30]);
        let out = smooth(&f, 1.5);
        for v in out.values() {
            assert!((v - 2.5).abs() < 1e-5, "got {v}");
        }
    }

    #[test]
    fn test_gaps_do_not_bias_towards_zero() {
        // Constant field with a hole: the hole is filled with the constant,
        // and its neighbours are not pulled towards zero.
        let mut values = vec![3.0f32; 25];
        values[12] = f32::NAN;
        let f = field(5, 5, values);
        let out = smooth(&f, 1.0);
        for v in out.values() {
            assert!((v - 3.0).abs() < 1e-5, "got {v}");
        }
    }

    #[test]
    fn test_isolated_invalid_region_stays_invalid() {
        // 20 columns: left 3 columns valid, the rest invalid. With sigma 1 the
        // radius is 4 so cells more than 4 columns from valid data stay NaN.
        let rows = 4;
        let cols = 20;
        let values: Vec<f32> = (0..rows * cols)
            .map(|i| if i % cols < 3 { 1.0 } else { f32::NAN })
            .collect();
        let f = field(rows, cols, values);
        let out = smooth(&f, 1.0);
        for r in 0..rows {
            for c in 0..cols {
                let v = out.value(r, c);
                if c <= 2 + 4 {
                    assert!(v.is_finite(), "({r},{c}) should be filled");
                } else {
                    assert!(v.is_nan(), "({r},{c}) should stay NaN");
                }
            }
        }
    }

    #[test]
    fn test_mask_is_respected() {
        let mut mask = vec![false; 9];
        mask[0] = true;
        let values = vec![100.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0];
        let f = field(3, 3, values).with_mask(mask).unwrap();
        let out = smooth(&f, 1.0);
        assert!(out.mask().is_none());
        // The masked 100.0 must not leak into the average.
        for v in out.values() {
            assert!((v - 1.0).abs() < 1e-5, "got {v}");
        }
    }
}
