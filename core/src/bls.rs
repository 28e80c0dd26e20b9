//! Period scan and candidate ranking.
//!
//! # Background
//!
//! A planet crossing the disc of its star dims it by a fixed fraction once
//! per orbit.  Box Least Squares (BLS) searches for that signature by
//! folding the light curve at each trial period and fitting a box-shaped
//! dip; the period with the best fit shows up as a peak in the resulting
//! *periodogram*.
//!
//! # What is implemented here
//!
//! [`SyntheticBls`] is **not** a box fit.  It produces a deterministic,
//! noise-sensitive periodic score:
//!
//! ```text
//! power(p) = |sin(0.25 p)| * 8 + 1 / max(rms, 1e-6)
//! ```
//!
//! where `rms` is the dispersion of the (detrended) flux, taken as 1 when
//! the series is perfectly flat.  Downstream consumers rely on these exact
//! numbers, so a real BLS engine must be added as a separate
//! [`PeriodSearch`] implementation rather than by changing this one.
//!
//! # Algorithm overview
//!
//! 1. **Grid**: `steps` periods spaced linearly over `[min, max]`, both
//!    ends included.  `steps` is clamped to `[10, 5000]`, 0 meaning 500.
//! 2. **Power**: one value per grid period, evaluated with **rayon**.
//!    Indexed collection keeps grid order, so the output is identical to a
//!    sequential scan.
//! 3. **Ranking**: [`rank_candidates`] stable-sorts by descending power and
//!    keeps the top `count` entries.

use std::cmp::Ordering;
use std::time::Instant;

use log::{debug, info};
use ndarray::Array1;
use rayon::prelude::*;

use crate::stats;
use crate::types::{CandidatePeriod, LightCurve};

/// Grid size used when the caller asks for zero steps.
pub const DEFAULT_STEPS: usize = 500;
pub const MIN_STEPS: usize = 10;
pub const MAX_STEPS: usize = 5000;

/// Ranker default when asked for zero candidates.
pub const DEFAULT_CANDIDATES: usize = 5;

// ---------------------------------------------------------------------------
// Periodogram
// ---------------------------------------------------------------------------

/// Parallel period / power arrays of equal length, in grid order.
#[derive(Clone, Debug, PartialEq)]
pub struct Periodogram {
    pub periods: Array1<f64>,
    pub powers: Array1<f64>,
}

impl Periodogram {
    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    /// `(period, power)` pairs in grid order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.periods.iter().copied().zip(self.powers.iter().copied())
    }

    /// Highest-power entry; the earliest one wins a tie.
    pub fn peak(&self) -> Option<(f64, f64)> {
        self.iter().fold(None, |best, (p, w)| match best {
            Some((_, bw)) if bw >= w => best,
            _ => Some((p, w)),
        })
    }
}

// ---------------------------------------------------------------------------
// PeriodSearch
// ---------------------------------------------------------------------------

/// A period-search engine: `(series, min, max, steps) -> periodogram`.
///
/// Implementations must be pure functions of their inputs so concurrent
/// runs never interfere.
pub trait PeriodSearch: Send + Sync {
    fn search(&self, series: &LightCurve, min_period: f64, max_period: f64, steps: usize)
        -> Periodogram;

    fn name(&self) -> &'static str;
}

/// Normalise a requested grid size: 0 becomes [`DEFAULT_STEPS`], anything
/// else is clamped to `[MIN_STEPS, MAX_STEPS]`.
pub fn effective_steps(requested: usize) -> usize {
    let steps = if requested == 0 { DEFAULT_STEPS } else { requested };
    steps.clamp(MIN_STEPS, MAX_STEPS)
}

/// Linear grid of `steps` periods from `min_period` upward.
///
/// The span is floored at 1e-6 so an empty or inverted range still yields
/// distinct grid points.
pub fn period_grid(min_period: f64, max_period: f64, steps: usize) -> Array1<f64> {
    let n = effective_steps(steps);
    let span = (max_period - min_period).max(1e-6);
    let last = (n - 1) as f64;
    Array1::from_iter((0..n).map(|i| min_period + (i as f64 / last) * span))
}

// ---------------------------------------------------------------------------
// SyntheticBls
// ---------------------------------------------------------------------------

/// The reference scanner (see module docs for the power formula).
#[derive(Clone, Copy, Debug, Default)]
pub struct SyntheticBls;

impl SyntheticBls {
    pub fn new() -> Self {
        Self
    }

    /// Power of a single trial period for a series with dispersion `rms`.
    pub fn power(period: f64, rms: f64) -> f64 {
        (period * 0.25).sin().abs() * 8.0 + 1.0 / rms.max(1e-6)
    }
}

impl PeriodSearch for SyntheticBls {
    fn search(
        &self,
        series: &LightCurve,
        min_period: f64,
        max_period: f64,
        steps: usize,
    ) -> Periodogram {
        let start = Instant::now();

        let rms = match stats::rms(series) {
            r if r == 0.0 => 1.0,
            r => r,
        };
        let periods = period_grid(min_period, max_period, steps);
        debug!(
            "Scanning {} periods in [{:.3}, {:.3}] (rms={:.6})",
            periods.len(),
            min_period,
            max_period,
            rms
        );

        let powers: Vec<f64> = (0..periods.len())
            .into_par_iter()
            .map(|i| {
                let w = Self::power(periods[i], rms);
                if w.is_finite() {
                    w
                } else {
                    0.0
                }
            })
            .collect();

        info!(
            "Periodogram: {} trial periods in {} ms",
            periods.len(),
            start.elapsed().as_millis()
        );

        Periodogram {
            periods,
            powers: Array1::from(powers),
        }
    }

    fn name(&self) -> &'static str {
        "synthetic-bls"
    }
}

// ---------------------------------------------------------------------------
// Candidate ranking
// ---------------------------------------------------------------------------

/// Top `count` periods by descending power (0 means [`DEFAULT_CANDIDATES`]).
///
/// The sort is stable, so among equal powers grid order is kept.  Rank `i`
/// (0-based) gets the synthetic depth `max(0.001, 0.01 (i + 1))` and
/// SNR `5 + power`.
pub fn rank_candidates(periodogram: &Periodogram, count: usize) -> Vec<CandidatePeriod> {
    let count = if count == 0 { DEFAULT_CANDIDATES } else { count };

    let mut pairs: Vec<(f64, f64)> = periodogram.iter().collect();
    pairs.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    pairs
        .into_iter()
        .take(count)
        .enumerate()
        .map(|(rank, (period, power))| CandidatePeriod {
            period,
            power,
            depth: (0.01 * (rank + 1) as f64).max(0.001),
            snr: 5.0 + power,
        })
        .collect()
}
