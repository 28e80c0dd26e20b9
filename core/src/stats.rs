//! Basic statistics and detrending for flux series.
//!
//! Everything here is total: degenerate input (empty, single point,
//! non-finite intermediate) yields 0 instead of NaN or a panic.

use std::cmp::Ordering;

use crate::types::{LightCurve, Sample};

/// Arithmetic mean, 0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Bessel-corrected variance (divisor `n - 1`), 0 for fewer than two values.
pub fn sample_variance(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    let variance = sum_sq / (values.len() - 1) as f64;
    if variance.is_finite() {
        variance.max(0.0)
    } else {
        0.0
    }
}

/// Median with the usual even-length convention (mean of the two middle
/// values), 0 for an empty slice.
pub fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Flux dispersion: sample standard deviation of the flux values.
pub fn rms(curve: &LightCurve) -> f64 {
    rms_of(&curve.fluxes())
}

pub fn rms_of(fluxes: &[f64]) -> f64 {
    sample_variance(fluxes).sqrt()
}

/// Shift every flux by `1 - median`, recentring the series on 1.0.
///
/// Only the constant offset is removed; there is no smoothing window.
pub fn detrend(curve: &LightCurve) -> LightCurve {
    if curve.is_empty() {
        return curve.clone();
    }
    let m = median(&curve.fluxes());
    LightCurve::new(
        curve
            .samples()
            .iter()
            .map(|s| Sample::new(s.time, s.flux - m + 1.0))
            .collect(),
    )
}
