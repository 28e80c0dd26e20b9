//! Common types shared across the transit-search pipeline.
//!
//! These structures represent the fundamental data objects of a light-curve
//! analysis run: the parsed samples, the candidate periods produced by the
//! period scan, the derived transit and physical parameters, the pipeline
//! configuration, and the aggregated result handed to the caller.
//!
//! Every value is created fresh for one run and never shared between runs.

use std::cmp::Ordering;
use std::path::Path;

#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

use crate::pipeline::AnalysisError;

// ---------------------------------------------------------------------------
// Sample / LightCurve
// ---------------------------------------------------------------------------

/// One brightness measurement: a time stamp and the measured flux.
///
/// Times are in whatever unit the source file uses (usually days: JD, BJD,
/// MJD...).  Flux may be relative flux, raw counts or a magnitude; the
/// pipeline never converts between them.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time: f64,
    pub flux: f64,
}

impl Sample {
    pub fn new(time: f64, flux: f64) -> Self {
        Self { time, flux }
    }

    pub fn is_finite(&self) -> bool {
        self.time.is_finite() && self.flux.is_finite()
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl Sample {
    #[new]
    fn py_new(time: f64, flux: f64) -> Self {
        Self::new(time, flux)
    }

    fn __repr__(&self) -> String {
        format!("Sample(time={}, flux={})", self.time, self.flux)
    }
}

/// A time-ordered brightness series.
///
/// A light curve with fewer than [`LightCurve::MIN_USABLE`] samples cannot
/// be analysed; one with fewer than [`LightCurve::MIN_RELIABLE`] is analysed
/// but the caller is warned that the result is unreliable.
#[cfg_attr(feature = "python", pyclass)]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LightCurve {
    samples: Vec<Sample>,
}

impl LightCurve {
    pub const MIN_USABLE: usize = 2;
    pub const MIN_RELIABLE: usize = 10;

    /// Wrap samples as-is, without reordering.
    ///
    /// Used for series whose order is already meaningful (the index-time
    /// substitution and the detrended copy).  Use [`LightCurve::from_raw`]
    /// for anything coming straight out of a file.
    pub fn new(samples: Vec<Sample>) -> Self {
        Self { samples }
    }

    /// Build a clean light curve from unordered parser output.
    ///
    /// Non-finite pairs are dropped, samples sharing an exact time value are
    /// collapsed (the one written last wins) and the result is sorted
    /// ascending by time.
    pub fn from_raw(raw: Vec<Sample>) -> Self {
        let mut samples: Vec<Sample> = raw.into_iter().filter(Sample::is_finite).collect();

        // Stable sort keeps file order inside runs of equal time.
        samples.sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));

        let mut unique: Vec<Sample> = Vec::with_capacity(samples.len());
        for s in samples {
            match unique.last_mut() {
                Some(last) if last.time == s.time => *last = s,
                _ => unique.push(s),
            }
        }

        Self { samples: unique }
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<Sample> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_usable(&self) -> bool {
        self.len() >= Self::MIN_USABLE
    }

    pub fn is_reliable(&self) -> bool {
        self.len() >= Self::MIN_RELIABLE
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    pub fn fluxes(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.flux).collect()
    }

    /// Last time minus first time; 0 for fewer than two samples.
    pub fn time_span(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(first), Some(last)) if self.samples.len() >= 2 => last.time - first.time,
            _ => 0.0,
        }
    }

    pub fn is_strictly_increasing(&self) -> bool {
        self.samples.windows(2).all(|w| w[1].time > w[0].time)
    }

    /// Same fluxes, in the same order, with time replaced by the 0-based
    /// sample index.
    pub fn with_index_time(&self) -> Self {
        Self {
            samples: self
                .samples
                .iter()
                .enumerate()
                .map(|(i, s)| Sample::new(i as f64, s.flux))
                .collect(),
        }
    }

    /// Render as `time,flux` CSV text that the reader parses back to the
    /// identical sample sequence.
    pub fn to_csv(&self) -> String {
        let mut out = String::from("time,flux\n");
        for s in &self.samples {
            out.push_str(&format!("{:?},{:?}\n", s.time, s.flux));
        }
        out
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl LightCurve {
    #[pyo3(name = "samples")]
    fn py_samples(&self) -> Vec<Sample> {
        self.samples.clone()
    }

    fn __len__(&self) -> usize {
        self.len()
    }

    fn __repr__(&self) -> String {
        format!("LightCurve(samples={}, span={:.3})", self.len(), self.time_span())
    }
}

// ---------------------------------------------------------------------------
// CandidatePeriod
// ---------------------------------------------------------------------------

/// A trial period singled out by the candidate ranker.
///
/// `power` is a relative figure of merit from the period scan, not a
/// probability.  `depth` and `snr` are synthetic estimates attached by the
/// ranker, not measurements.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidatePeriod {
    pub period: f64,
    pub power: f64,
    pub depth: f64,
    pub snr: f64,
}

#[cfg(feature = "python")]
#[pymethods]
impl CandidatePeriod {
    fn __repr__(&self) -> String {
        format!(
            "CandidatePeriod(period={:.4}, power={:.3}, depth={:.4}, snr={:.2})",
            self.period, self.power, self.depth, self.snr,
        )
    }
}

// ---------------------------------------------------------------------------
// TransitStats / PhysicalParameters
// ---------------------------------------------------------------------------

/// Transit figures derived for the best candidate period.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TransitStats {
    pub snr: f64,
    /// Fractional flux drop.
    pub depth: f64,
    /// Same time unit as the light curve.
    pub duration: f64,
}

/// Physical interpretation of the best candidate, assuming a Sun-like host.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicalParameters {
    /// Earth radii.
    pub planet_radius: f64,
    /// Astronomical units.
    pub semi_major_axis: f64,
    /// Kelvin.
    pub equilibrium_temp: f64,
    pub false_alarm_probability: f64,
}

// ---------------------------------------------------------------------------
// Run lifecycle
// ---------------------------------------------------------------------------

/// Named pipeline stages, in the order the orchestrator reports them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessingStep {
    Parsing,
    Validation,
    Preprocessing,
    Periodogram,
    TransitSearch,
    ValidationChecks,
    Statistics,
}

impl ProcessingStep {
    pub const ALL: [ProcessingStep; 7] = [
        ProcessingStep::Parsing,
        ProcessingStep::Validation,
        ProcessingStep::Preprocessing,
        ProcessingStep::Periodogram,
        ProcessingStep::TransitSearch,
        ProcessingStep::ValidationChecks,
        ProcessingStep::Statistics,
    ];

    /// Stage identifier as seen by presentation layers.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStep::Parsing => "parsing",
            ProcessingStep::Validation => "validation",
            ProcessingStep::Preprocessing => "preprocessing",
            ProcessingStep::Periodogram => "periodogram",
            ProcessingStep::TransitSearch => "transit_search",
            ProcessingStep::ValidationChecks => "validation_checks",
            ProcessingStep::Statistics => "statistics",
        }
    }

    /// Advisory completion percentage reached when this stage starts.
    pub fn progress(&self) -> u8 {
        match self {
            ProcessingStep::Parsing => 10,
            ProcessingStep::Validation => 20,
            ProcessingStep::Preprocessing => 30,
            ProcessingStep::Periodogram => 50,
            ProcessingStep::TransitSearch => 70,
            ProcessingStep::ValidationChecks => 85,
            ProcessingStep::Statistics => 95,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ProcessingStep::Parsing => "Parsing data file...",
            ProcessingStep::Validation => "Validating data quality...",
            ProcessingStep::Preprocessing => "Preprocessing light curve...",
            ProcessingStep::Periodogram => "Running Box Least Squares...",
            ProcessingStep::TransitSearch => "Searching for transit signals...",
            ProcessingStep::ValidationChecks => "Validating detections...",
            ProcessingStep::Statistics => "Computing final statistics...",
        }
    }
}

/// Coarse lifecycle of one analysis run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    Idle,
    Uploading,
    Processing,
    Complete,
    Error,
}

// ---------------------------------------------------------------------------
// PipelineParams
// ---------------------------------------------------------------------------

/// Tuning constants for one analysis run.
///
/// The defaults are the literal values the detection rules were calibrated
/// with; they carry no physical derivation, which is why they are exposed
/// here instead of being baked into the stages.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineParams {
    /// Shortest trial period.
    pub min_period: f64,
    /// Longest trial period ever searched, whatever the baseline.
    pub max_period_cap: f64,
    /// Floor of the effective upper bound, keeps the grid non-degenerate.
    pub min_upper_period: f64,
    /// The upper bound is the observation baseline divided by this.
    pub baseline_divisor: f64,

    /// Grid resolution is `points * steps_per_point`, clamped to
    /// `[min_steps, max_steps]`.
    pub min_steps: usize,
    pub max_steps: usize,
    pub steps_per_point: usize,

    /// How many ranked periods end up in the result.
    pub candidate_count: usize,

    /// A planet is reported only when the best power AND the transit SNR
    /// both exceed their thresholds.
    pub power_threshold: f64,
    pub snr_threshold: f64,

    /// Host star effective temperature in K.
    pub stellar_temperature: f64,
    /// Bond albedo used for the equilibrium temperature.
    pub albedo: f64,

    /// Below this many samples the run carries a low-data warning.
    pub min_points_warning: usize,
}

impl Default for PipelineParams {
    fn default() -> Self {
        Self {
            min_period: 0.5,
            max_period_cap: 50.0,
            min_upper_period: 0.6,
            baseline_divisor: 3.0,
            min_steps: 200,
            max_steps: 2000,
            steps_per_point: 5,
            candidate_count: 10,
            power_threshold: 5.0,
            snr_threshold: 5.0,
            stellar_temperature: 5778.0,
            albedo: 0.0,
            min_points_warning: LightCurve::MIN_RELIABLE,
        }
    }
}

impl PipelineParams {
    /// Parse overrides from JSON; absent keys keep their default value.
    pub fn from_json(json: &str) -> Result<Self, AnalysisError> {
        let params: Self = serde_json::from_str(json)
            .map_err(|e| AnalysisError::InvalidParams(format!("malformed JSON: {}", e)))?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AnalysisError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            AnalysisError::InvalidParams(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Reject configurations the scan cannot run with.
    pub fn validate(&self) -> Result<(), AnalysisError> {
        let positive = [
            ("min_period", self.min_period),
            ("max_period_cap", self.max_period_cap),
            ("min_upper_period", self.min_upper_period),
            ("baseline_divisor", self.baseline_divisor),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(AnalysisError::InvalidParams(format!(
                    "{} must be finite and positive, got {}",
                    name, value
                )));
            }
        }
        for (name, value) in [
            ("power_threshold", self.power_threshold),
            ("snr_threshold", self.snr_threshold),
            ("stellar_temperature", self.stellar_temperature),
            ("albedo", self.albedo),
        ] {
            if !value.is_finite() {
                return Err(AnalysisError::InvalidParams(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }
        if self.min_steps == 0 || self.max_steps < self.min_steps {
            return Err(AnalysisError::InvalidParams(format!(
                "step limits must satisfy 0 < min_steps <= max_steps, got {}..{}",
                self.min_steps, self.max_steps
            )));
        }
        if self.candidate_count == 0 {
            return Err(AnalysisError::InvalidParams(
                "candidate_count must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Scan bounds for a series spanning `time_span` time units.
    ///
    /// The upper bound is a third of the baseline (capped), floored so the
    /// range never collapses below the lower bound.
    pub fn period_range(&self, time_span: f64) -> (f64, f64) {
        let safe_span = time_span.max(1e-3);
        let max_period = (safe_span / self.baseline_divisor).min(self.max_period_cap);
        (self.min_period, max_period.max(self.min_upper_period))
    }

    /// Adaptive grid resolution for `points` samples.
    pub fn grid_steps(&self, points: usize) -> usize {
        points
            .saturating_mul(self.steps_per_point)
            .clamp(self.min_steps, self.max_steps)
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl PipelineParams {
    #[new]
    #[pyo3(signature = (candidate_count=10, power_threshold=5.0, snr_threshold=5.0, albedo=0.0))]
    fn py_new(candidate_count: usize, power_threshold: f64, snr_threshold: f64, albedo: f64) -> Self {
        Self {
            candidate_count,
            power_threshold,
            snr_threshold,
            albedo,
            ..Self::default()
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "PipelineParams(periods={:.2}..{:.1}, steps={}..{}, power>{:.1}, snr>{:.1})",
            self.min_period,
            self.max_period_cap,
            self.min_steps,
            self.max_steps,
            self.power_threshold,
            self.snr_threshold,
        )
    }
}

// ---------------------------------------------------------------------------
// AnalysisResult
// ---------------------------------------------------------------------------

/// Everything a presentation layer needs to report one analysis run.
///
/// Field names serialize in camelCase; display figures that consumers print
/// verbatim are pre-formatted decimal strings.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub planet_detected: bool,
    /// Percentage in `[10, 95]`.
    pub confidence: u32,

    pub transit_depth: String,
    pub period: String,
    pub duration: String,

    pub signal_to_noise: f64,
    /// Placeholder with no statistical meaning, see [`crate::pipeline::Chi2Source`].
    pub chi2: f64,
    pub false_alarm_probability: f64,

    pub data_points: usize,
    pub observation_time: String,
    pub rms_noise: f64,

    pub semi_major_axis: String,
    pub planet_radius: String,
    pub equilibrium_temp: String,

    /// Ranked by descending power.
    pub best_periods: Vec<CandidatePeriod>,
    pub quality_flags: Vec<String>,

    pub light_curve_data: LightCurve,
    pub detrended_data: LightCurve,
}

impl AnalysisResult {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Human-readable report used by the command-line front end.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(if self.planet_detected {
            "Planet candidate detected\n"
        } else {
            "No planet detected\n"
        });
        out.push_str(&format!("  confidence         {}%\n", self.confidence));
        out.push_str(&format!("  period             {}\n", self.period));
        out.push_str(&format!("  transit depth      {}\n", self.transit_depth));
        out.push_str(&format!("  duration           {}\n", self.duration));
        out.push_str(&format!("  SNR                {:.2}\n", self.signal_to_noise));
        out.push_str(&format!("  FAP                {:.3e}\n", self.false_alarm_probability));
        out.push_str(&format!("  chi2 (placeholder) {:.3}\n", self.chi2));
        out.push_str(&format!(
            "  data points        {} over {}\n",
            self.data_points, self.observation_time
        ));
        out.push_str(&format!("  RMS noise          {:.6}\n", self.rms_noise));
        out.push_str(&format!("  planet radius      {} R_earth\n", self.planet_radius));
        out.push_str(&format!("  semi-major axis    {} AU\n", self.semi_major_axis));
        out.push_str(&format!("  equilibrium temp   {} K\n", self.equilibrium_temp));
        out.push_str(&format!("  quality flags      {}\n", self.quality_flags.join(", ")));
        out.push_str("  best periods:\n");
        for (rank, c) in self.best_periods.iter().enumerate() {
            out.push_str(&format!(
                "    #{:<2} P={:<8} power={:<8} depth={:<6} snr={}\n",
                rank + 1,
                c.period,
                c.power,
                c.depth,
                c.snr
            ));
        }
        out
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl AnalysisResult {
    /// Serialise the result to a JSON string for interoperability.
    #[pyo3(name = "to_json")]
    fn py_to_json(&self) -> PyResult<String> {
        self.to_json()
            .map_err(|e| pyo3::exceptions::PyValueError::new_err(e.to_string()))
    }

    fn __repr__(&self) -> String {
        format!(
            "AnalysisResult(detected={}, confidence={}%, period={}, snr={:.2}, points={})",
            self.planet_detected, self.confidence, self.period, self.signal_to_noise, self.data_points,
        )
    }
}
