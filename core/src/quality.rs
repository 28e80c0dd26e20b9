//! Detection quality checks.
//!
//! Each check looks at one figure of the best candidate and raises a named
//! flag when it falls outside the range a credible transit would occupy:
//!
//! 1. **low_snr**: transit SNR below 5.
//! 2. **shallow_depth**: depth below 0.0005 (500 ppm).
//! 3. **invalid_period**: non-positive period.
//! 4. **insufficient_points**: fewer than 100 samples.
//! 5. **invalid_duration**: non-positive duration.
//!
//! The flag list is never empty: a detection that trips none of the checks
//! carries the single flag `passes_basic_checks`.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Thresholds
// ---------------------------------------------------------------------------

const MIN_SNR: f64 = 5.0;

const MIN_DEPTH: f64 = 0.0005;

const MIN_DATA_POINTS: usize = 100;

// ---------------------------------------------------------------------------
// QualityFlag
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    LowSnr,
    ShallowDepth,
    InvalidPeriod,
    InsufficientPoints,
    InvalidDuration,
    PassesBasicChecks,
}

impl QualityFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityFlag::LowSnr => "low_snr",
            QualityFlag::ShallowDepth => "shallow_depth",
            QualityFlag::InvalidPeriod => "invalid_period",
            QualityFlag::InsufficientPoints => "insufficient_points",
            QualityFlag::InvalidDuration => "invalid_duration",
            QualityFlag::PassesBasicChecks => "passes_basic_checks",
        }
    }
}

impl fmt::Display for QualityFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// The figures the checks look at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DetectionSummary {
    pub snr: f64,
    pub depth: f64,
    pub period: f64,
    pub data_points: usize,
    pub duration: f64,
}

/// Run every check in order and return the raised flags.
pub fn validate_detection(d: &DetectionSummary) -> Vec<QualityFlag> {
    let checks = [
        (d.snr < MIN_SNR, QualityFlag::LowSnr),
        (d.depth < MIN_DEPTH, QualityFlag::ShallowDepth),
        (d.period <= 0.0, QualityFlag::InvalidPeriod),
        (d.data_points < MIN_DATA_POINTS, QualityFlag::InsufficientPoints),
        (d.duration <= 0.0, QualityFlag::InvalidDuration),
    ];

    let flags: Vec<QualityFlag> = checks
        .into_iter()
        .filter_map(|(raised, flag)| raised.then_some(flag))
        .collect();

    if flags.is_empty() {
        vec![QualityFlag::PassesBasicChecks]
    } else {
        flags
    }
}
