//! Transit statistics and physical parameter estimation.
//!
//! All estimates assume a Sun-like host (1 solar radius, 1 solar mass) and
//! are deliberately coarse:
//!
//! | Quantity              | Formula                                           |
//! |-----------------------|---------------------------------------------------|
//! | depth                 | `clamp(0.5 rms, 0.0005, 0.05)`                    |
//! | SNR                   | `10 depth / max(rms, 1e-6)`                       |
//! | duration              | `clamp(0.1 P, 0.5, 10)`                           |
//! | planet radius (R⊕)    | `109 sqrt(depth)`                                 |
//! | semi-major axis (AU)  | `(P / 365.25)^(2/3)`                              |
//! | T_eq (K)              | `T* sqrt(0.00465 / 2a) (1 - A)^(1/4)`             |
//! | false-alarm prob.     | `exp(-power) min(1, 2000 / steps)`                |
//!
//! Every function returns 0 instead of a non-finite value.

use crate::stats;
use crate::types::{LightCurve, PhysicalParameters, TransitStats};

/// Earth radii per solar radius.
const EARTH_RADII_PER_SUN: f64 = 109.0;

/// Solar radius in AU.
const SUN_RADIUS_AU: f64 = 0.00465;

const DAYS_PER_YEAR: f64 = 365.25;

/// Grid size the false-alarm scaling is normalised to.
const FAP_REFERENCE_STEPS: f64 = 2000.0;

/// Step count assumed when none is given.
const FAP_DEFAULT_STEPS: usize = 1000;

#[inline]
fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() {
        v
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Transit statistics
// ---------------------------------------------------------------------------

/// Depth, SNR and duration for `series` folded at `period`.
///
/// Placeholder estimates driven by the series' dispersion; the period only
/// enters through the duration.
pub fn transit_stats(series: &LightCurve, period: f64) -> TransitStats {
    let rms = stats::rms(series);
    let depth = (rms * 0.5).min(0.05).max(0.0005);
    let snr = (depth / rms.max(1e-6) * 10.0).max(0.0);
    let duration = (period * 0.1).min(10.0).max(0.5);

    TransitStats {
        snr: finite_or_zero(snr),
        depth: finite_or_zero(depth),
        duration: finite_or_zero(duration),
    }
}

// ---------------------------------------------------------------------------
// Physical parameters
// ---------------------------------------------------------------------------

/// Planet radius in Earth radii from a fractional transit depth.
pub fn planet_radius(depth: f64) -> f64 {
    finite_or_zero(depth.max(0.0).sqrt() * EARTH_RADII_PER_SUN)
}

/// Orbital semi-major axis in AU from a period in days (Kepler III).
pub fn semi_major_axis(period_days: f64) -> f64 {
    let years = period_days.max(1e-6) / DAYS_PER_YEAR;
    finite_or_zero(years.powi(2).cbrt())
}

/// Equilibrium temperature in K for a planet at `a_au` around a star of
/// effective temperature `stellar_temp`.
pub fn equilibrium_temperature(stellar_temp: f64, albedo: f64, a_au: f64) -> f64 {
    let dilution = (SUN_RADIUS_AU / (2.0 * a_au).max(1e-6)).sqrt();
    let absorbed = (1.0 - albedo).max(0.0).powf(0.25);
    finite_or_zero(stellar_temp * dilution * absorbed)
}

/// Probability that a peak of `power` found on a grid of `steps` trial
/// periods is noise.  Falls with power; grids denser than 2000 periods
/// lower it further.
pub fn false_alarm_probability(power: f64, steps: usize) -> f64 {
    let steps = if steps == 0 { FAP_DEFAULT_STEPS } else { steps };
    let trials_factor = (FAP_REFERENCE_STEPS / steps as f64).min(1.0);
    let fap = (-power.max(0.0)).exp() * trials_factor;
    finite_or_zero(fap).clamp(0.0, 1.0)
}

/// Bundle the physical interpretation of a detection.
pub fn physical_parameters(
    period: f64,
    depth: f64,
    power: f64,
    steps: usize,
    stellar_temp: f64,
    albedo: f64,
) -> PhysicalParameters {
    let a = semi_major_axis(period);
    PhysicalParameters {
        planet_radius: planet_radius(depth),
        semi_major_axis: a,
        equilibrium_temp: equilibrium_temperature(stellar_temp, albedo, a),
        false_alarm_probability: false_alarm_probability(power, steps),
    }
}
