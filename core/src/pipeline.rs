//! Analysis orchestrator: one light-curve file in, one report out.
//!
//! # Stages
//!
//! | Step                | %   | Work                                              |
//! |---------------------|-----|---------------------------------------------------|
//! | `parsing`           | 10  | decode and parse, reject < 2 rows, warn on < 10   |
//! | `validation`        | 20  | time-axis guard, RMS, median detrend              |
//! | `preprocessing`     | 30  | observation baseline                              |
//! | `periodogram`       | 50  | period scan over the adaptive grid                |
//! | `transit_search`    | 70  | rank the top candidates                           |
//! | `validation_checks` | 85  | transit statistics of the best candidate          |
//! | `statistics`        | 95  | detection decision, physical parameters, flags    |
//!
//! Progress is reported through a [`ProgressObserver`]; it is advisory and
//! has no influence on the result.  A run either returns a complete
//! [`AnalysisResult`] or an [`AnalysisError`], never a partial result.
//!
//! Every stage is a pure function of its inputs, so any number of runs may
//! execute concurrently on separate threads.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::time::Instant;

use log::{debug, error, info, warn};
#[cfg(feature = "python")]
use pyo3::prelude::*;
use rand::Rng;

use crate::bls::{rank_candidates, PeriodSearch, SyntheticBls};
use crate::lightcurve::{LightCurveError, LightCurveReader};
use crate::quality::{validate_detection, DetectionSummary};
use crate::stats;
use crate::transit::{physical_parameters, transit_stats};
use crate::types::{
    AnalysisResult, AnalysisStatus, CandidatePeriod, LightCurve, PipelineParams, ProcessingStep,
};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Reasons an analysis run can fail.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("No usable data rows found ({found} parsed). Ensure file has at least two numeric columns (time, flux).")]
    InsufficientData { found: usize },

    #[error("failed to read light curve: {0}")]
    Read(LightCurveError),

    #[error("invalid pipeline parameters: {0}")]
    InvalidParams(String),

    #[error("analysis failed: {0}")]
    Failed(String),
}

impl From<LightCurveError> for AnalysisError {
    fn from(e: LightCurveError) -> Self {
        match e {
            LightCurveError::InsufficientData { found } => AnalysisError::InsufficientData { found },
            other => AnalysisError::Read(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Collaborator interfaces
// ---------------------------------------------------------------------------

/// Receives advisory progress from a run.
///
/// All methods default to no-ops.  [`AnalysisStatus::Complete`] implies
/// 100 %.
pub trait ProgressObserver {
    fn on_status(&mut self, _status: AnalysisStatus) {}

    fn on_step(&mut self, _step: ProcessingStep, _percent: u8) {}

    /// Non-fatal advisory, e.g. too few samples for a reliable result.
    fn on_warning(&mut self, _message: &str) {}
}

/// Observer that ignores everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {}

/// Source of the uniform variate behind the `chi2` placeholder.
///
/// `chi2 = 1.2 + 0.8 u` has no statistical meaning; it is kept only for
/// output compatibility and is pluggable so tests can pin it.
pub trait Chi2Source {
    /// A value in `[0, 1)`.
    fn sample(&mut self) -> f64;
}

/// Thread-local RNG.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomChi2;

impl Chi2Source for RandomChi2 {
    fn sample(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Always returns the wrapped value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedChi2(pub f64);

impl Chi2Source for FixedChi2 {
    fn sample(&mut self) -> f64 {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Replace time with the sample index unless it is strictly increasing with
/// a positive span.  Returns the curve to analyse and whether time was
/// replaced.
pub fn guard_time_axis(curve: LightCurve) -> (LightCurve, bool) {
    if curve.is_strictly_increasing() && curve.time_span() > 0.0 {
        (curve, false)
    } else {
        (curve.with_index_time(), true)
    }
}

/// Enough fractional digits to print any `f64` exactly.
const EXACT_DIGITS: usize = 1100;

/// Fixed-point decimal string.
///
/// Ties on the exact binary value round away from zero, so `2.25` renders
/// as `"2.3"` and `0.5` as `"1"`.  `format!` alone rounds ties to even.
fn fixed(value: f64, decimals: usize) -> String {
    let nearest = format!("{:.*}", decimals, value);
    if !value.is_finite() || decimals >= EXACT_DIGITS {
        return nearest;
    }

    let exact = format!("{:.*}", EXACT_DIGITS, value.abs());
    let point = match exact.find('.') {
        Some(p) => p,
        None => return nearest,
    };
    let tail = &exact[point + 1 + decimals..];
    let is_tie = tail.starts_with('5') && tail[1..].bytes().all(|b| b == b'0');
    if !is_tie {
        return nearest;
    }

    let kept = if decimals == 0 { &exact[..point] } else { &exact[..point + 1 + decimals] };
    let up = increment_decimal(kept);
    if value < 0.0 {
        format!("-{}", up)
    } else {
        up
    }
}

/// Add one unit in the last place of a plain decimal string.
fn increment_decimal(digits: &str) -> String {
    let mut chars: Vec<char> = digits.chars().collect();
    for c in chars.iter_mut().rev() {
        match *c {
            '.' => continue,
            '9' => *c = '0',
            d => {
                *c = char::from_digit(d.to_digit(10).unwrap_or(0) + 1, 10).unwrap_or('0');
                return chars.into_iter().collect();
            }
        }
    }
    chars.insert(0, '1');
    chars.into_iter().collect()
}

/// `value` rounded through its fixed-point rendering.
fn rounded(value: f64, decimals: usize) -> f64 {
    fixed(value, decimals).parse().unwrap_or(value)
}

fn confidence(power: f64, lo: u32, hi: u32) -> u32 {
    let pct = (power * 10.0).round();
    if pct.is_finite() {
        pct.clamp(lo as f64, hi as f64) as u32
    } else {
        lo
    }
}

fn report(observer: &mut dyn ProgressObserver, step: ProcessingStep) {
    debug!("{} ({}%)", step.description(), step.progress());
    observer.on_step(step, step.progress());
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown error occurred".to_string()
    }
}

// ---------------------------------------------------------------------------
// TransitPipeline
// ---------------------------------------------------------------------------

/// Runs the full analysis on one light curve.
///
/// Construct with [`PipelineParams`] (defaults reproduce the reference
/// thresholds) and call one of the `analyze_*` methods.  The period scan
/// engine can be swapped with [`TransitPipeline::with_search`].
#[cfg_attr(feature = "python", pyclass)]
pub struct TransitPipeline {
    params: PipelineParams,
    search: Box<dyn PeriodSearch>,
    reader: LightCurveReader,
}

impl fmt::Debug for TransitPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransitPipeline")
            .field("params", &self.params)
            .field("search", &self.search.name())
            .finish()
    }
}

impl Default for TransitPipeline {
    fn default() -> Self {
        Self::new(PipelineParams::default())
    }
}

impl TransitPipeline {
    pub fn new(params: PipelineParams) -> Self {
        Self {
            params,
            search: Box::new(SyntheticBls::new()),
            reader: LightCurveReader::new(),
        }
    }

    /// Use a different period-search engine.
    pub fn with_search(mut self, search: impl PeriodSearch + 'static) -> Self {
        self.search = Box::new(search);
        self
    }

    pub fn params(&self) -> &PipelineParams {
        &self.params
    }

    pub fn analyze_file(&self, path: impl AsRef<Path>) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_file_with(path, &mut NoProgress, &mut RandomChi2)
    }

    pub fn analyze_text(&self, text: &str) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_bytes(text.as_bytes())
    }

    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<AnalysisResult, AnalysisError> {
        self.analyze_with(bytes, &mut NoProgress, &mut RandomChi2)
    }

    /// Load `path` and analyse it, reporting `uploading` while reading.
    pub fn analyze_file_with(
        &self,
        path: impl AsRef<Path>,
        observer: &mut dyn ProgressObserver,
        chi2: &mut dyn Chi2Source,
    ) -> Result<AnalysisResult, AnalysisError> {
        let path = path.as_ref();
        observer.on_status(AnalysisStatus::Uploading);
        info!("Loading light curve from {}", path.display());

        match self.reader.load(path) {
            Ok(bytes) => self.analyze_with(&bytes, observer, chi2),
            Err(e) => {
                error!("Analysis failed: {}", e);
                observer.on_status(AnalysisStatus::Error);
                Err(e.into())
            }
        }
    }

    /// Analyse raw file contents.
    ///
    /// Reports `processing`, then each stage, then `complete` or `error`.
    /// A panic inside a stage is caught here and surfaced as
    /// [`AnalysisError::Failed`].
    pub fn analyze_with(
        &self,
        bytes: &[u8],
        observer: &mut dyn ProgressObserver,
        chi2: &mut dyn Chi2Source,
    ) -> Result<AnalysisResult, AnalysisError> {
        let start = Instant::now();
        observer.on_status(AnalysisStatus::Processing);
        info!("Starting analysis: {} bytes, search={}", bytes.len(), self.search.name());

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(bytes, &mut *observer, &mut *chi2)))
            .unwrap_or_else(|payload| Err(AnalysisError::Failed(panic_message(payload))));

        match outcome {
            Ok(result) => {
                info!(
                    "Analysis complete in {} ms: detected={}, period={}, snr={:.2}, confidence={}%",
                    start.elapsed().as_millis(),
                    result.planet_detected,
                    result.period,
                    result.signal_to_noise,
                    result.confidence,
                );
                observer.on_status(AnalysisStatus::Complete);
                Ok(result)
            }
            Err(e) => {
                error!("Analysis failed after {} ms: {}", start.elapsed().as_millis(), e);
                observer.on_status(AnalysisStatus::Error);
                Err(e)
            }
        }
    }

    // ======================================================================
    // Stages
    // ======================================================================

    fn run(
        &self,
        bytes: &[u8],
        observer: &mut dyn ProgressObserver,
        chi2: &mut dyn Chi2Source,
    ) -> Result<AnalysisResult, AnalysisError> {
        let params = &self.params;
        params.validate()?;

        // -- parsing -------------------------------------------------------
        report(observer, ProcessingStep::Parsing);
        let parsed = self.reader.parse_bytes(bytes)?.require_usable()?;
        let n = parsed.curve.len();
        if n < params.min_points_warning {
            let message = format!(
                "Only {} points found. Results may be unreliable but analysis will proceed.",
                n
            );
            warn!("{}", message);
            observer.on_warning(&message);
        }
        let (data, substituted) = guard_time_axis(parsed.curve);
        if substituted {
            warn!("time column is not strictly increasing, using sample index as time");
        }

        // -- validation ----------------------------------------------------
        report(observer, ProcessingStep::Validation);
        let rms = stats::rms(&data);
        let clean = stats::detrend(&data);

        // -- preprocessing -------------------------------------------------
        report(observer, ProcessingStep::Preprocessing);
        let time_span = data.time_span();

        // -- periodogram ---------------------------------------------------
        report(observer, ProcessingStep::Periodogram);
        let (min_period, max_period) = params.period_range(time_span);
        let steps = params.grid_steps(data.len());
        let periodogram = self.search.search(&clean, min_period, max_period, steps);

        // -- transit_search ------------------------------------------------
        report(observer, ProcessingStep::TransitSearch);
        let candidates = rank_candidates(&periodogram, params.candidate_count);
        let best = *candidates
            .first()
            .ok_or_else(|| AnalysisError::Failed("period search produced no candidates".into()))?;
        info!(
            "Best period {:.4} (power {:.3}) of {} trial periods in [{:.3}, {:.3}]",
            best.period,
            best.power,
            periodogram.len(),
            min_period,
            max_period
        );

        // -- validation_checks ---------------------------------------------
        report(observer, ProcessingStep::ValidationChecks);
        let transit = transit_stats(&clean, best.period);

        // -- statistics ----------------------------------------------------
        report(observer, ProcessingStep::Statistics);
        let planet_detected =
            best.power > params.power_threshold && transit.snr > params.snr_threshold;
        let physical = physical_parameters(
            best.period,
            transit.depth,
            best.power,
            steps,
            params.stellar_temperature,
            params.albedo,
        );
        let quality_flags = validate_detection(&DetectionSummary {
            snr: transit.snr,
            depth: transit.depth,
            period: best.period,
            data_points: data.len(),
            duration: transit.duration,
        });

        Ok(AnalysisResult {
            planet_detected,
            confidence: confidence(best.power, 10, 95),
            transit_depth: fixed(transit.depth, 3),
            period: fixed(best.period, 2),
            duration: fixed(transit.duration, 1),
            signal_to_noise: transit.snr,
            chi2: 1.2 + chi2.sample() * 0.8,
            false_alarm_probability: physical.false_alarm_probability,
            data_points: data.len(),
            observation_time: fixed(time_span, 1),
            rms_noise: rms,
            semi_major_axis: fixed(physical.semi_major_axis, 3),
            planet_radius: fixed(physical.planet_radius, 3),
            equilibrium_temp: fixed(physical.equilibrium_temp, 0),
            best_periods: candidates
                .iter()
                .map(|c| CandidatePeriod {
                    period: rounded(c.period, 2),
                    power: rounded(c.power, 2),
                    depth: rounded(c.power * 0.1, 3),
                    snr: rounded(c.snr, 1),
                })
                .collect(),
            quality_flags: quality_flags.iter().map(|f| f.as_str().to_string()).collect(),
            light_curve_data: data,
            detrended_data: clean,
        })
    }
}

// ---------------------------------------------------------------------------
// Python bindings
// ---------------------------------------------------------------------------

/// Forwards progress to a Python callable `progress(stage, percent, message)`.
#[cfg(feature = "python")]
struct PyProgress {
    callback: PyObject,
    percent: u8,
}

#[cfg(feature = "python")]
impl PyProgress {
    fn emit(&self, stage: &str, message: &str) {
        Python::with_gil(|py| {
            if let Err(e) = self.callback.call1(py, (stage, self.percent, message)) {
                warn!("progress callback raised: {}", e);
            }
        });
    }
}

#[cfg(feature = "python")]
impl ProgressObserver for PyProgress {
    fn on_status(&mut self, status: AnalysisStatus) {
        if status == AnalysisStatus::Complete {
            self.percent = 100;
        }
        let name = match status {
            AnalysisStatus::Idle => "idle",
            AnalysisStatus::Uploading => "uploading",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Complete => "complete",
            AnalysisStatus::Error => "error",
        };
        self.emit(name, "");
    }

    fn on_step(&mut self, step: ProcessingStep, percent: u8) {
        self.percent = percent;
        self.emit(step.as_str(), step.description());
    }

    fn on_warning(&mut self, message: &str) {
        self.emit("warning", message);
    }
}

#[cfg(feature = "python")]
fn to_py_err(e: AnalysisError) -> PyErr {
    match e {
        AnalysisError::Read(LightCurveError::Io(io)) => pyo3::exceptions::PyIOError::new_err(io.to_string()),
        AnalysisError::InvalidParams(msg) => pyo3::exceptions::PyValueError::new_err(msg),
        other => pyo3::exceptions::PyRuntimeError::new_err(other.to_string()),
    }
}

#[cfg(feature = "python")]
#[pymethods]
impl TransitPipeline {
    #[new]
    #[pyo3(signature = (params=None))]
    fn py_new(params: Option<PipelineParams>) -> Self {
        Self::new(params.unwrap_or_default())
    }

    /// Analyse a light-curve file.  `progress`, if given, is called as
    /// `progress(stage, percent, message)`.
    #[pyo3(name = "analyze", signature = (path, progress=None))]
    fn py_analyze(&self, path: &str, progress: Option<PyObject>) -> PyResult<AnalysisResult> {
        let result = match progress {
            Some(callback) => {
                let mut observer = PyProgress { callback, percent: 0 };
                self.analyze_file_with(path, &mut observer, &mut RandomChi2)
            }
            None => self.analyze_file(path),
        };
        result.map_err(to_py_err)
    }

    #[pyo3(name = "analyze_text")]
    fn py_analyze_text(&self, text: &str) -> PyResult<AnalysisResult> {
        self.analyze_text(text).map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!("TransitPipeline(search={}, candidates={})", self.search.name(), self.params.candidate_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bls::Periodogram;
    use crate::types::Sample;
    use assert_approx_eq::assert_approx_eq;
    use ndarray::Array1;

    #[derive(Default)]
    struct Recorder {
        statuses: Vec<AnalysisStatus>,
        steps: Vec<(ProcessingStep, u8)>,
        warnings: Vec<String>,
    }

    impl ProgressObserver for Recorder {
        fn on_status(&mut self, status: AnalysisStatus) {
            self.statuses.push(status);
        }

        fn on_step(&mut self, step: ProcessingStep, percent: u8) {
            self.steps.push((step, percent));
        }

        fn on_warning(&mut self, message: &str) {
            self.warnings.push(message.to_string());
        }
    }

    struct EmptySearch;

    impl PeriodSearch for EmptySearch {
        fn search(&self, _: &LightCurve, _: f64, _: f64, _: usize) -> Periodogram {
            Periodogram {
                periods: Array1::zeros(0),
                powers: Array1::zeros(0),
            }
        }

        fn name(&self) -> &'static str {
            "empty"
        }
    }

    struct BrokenSearch;

    impl PeriodSearch for BrokenSearch {
        fn search(&self, _: &LightCurve, _: f64, _: f64, _: usize) -> Periodogram {
            panic!("grid exploded")
        }

        fn name(&self) -> &'static str {
            "broken"
        }
    }

    /// 200 evenly spaced points around 1.0 with a small repeating wiggle.
    fn flat_csv() -> String {
        let wiggle = [0.0, -0.01, 0.01];
        let mut text = String::new();
        for i in 0..200 {
            text.push_str(&format!("{},{}\n", i, 1.0 + wiggle[i % 3]));
        }
        text
    }

    fn run(text: &str) -> (Result<AnalysisResult, AnalysisError>, Recorder) {
        let mut rec = Recorder::default();
        let result = TransitPipeline::default().analyze_with(text.as_bytes(), &mut rec, &mut FixedChi2(0.5));
        (result, rec)
    }

    #[test]
    fn flat_series_detection_matches_thresholds() {
        let (result, _) = run(&flat_csv());
        let result = result.unwrap();

        let fluxes: Vec<f64> = (0..200).map(|i| 1.0 + [0.0, -0.01, 0.01][i % 3]).collect();
        let rms = stats::rms(&result.detrended_data);
        // span 199 -> max period min(199/3, 50) = 50; steps min(2000, 200*5) = 1000
        let best_power = crate::bls::period_grid(0.5, 50.0, 1000)
            .iter()
            .map(|&p| SyntheticBls::power(p, rms))
            .fold(f64::MIN, f64::max);
        let depth = (rms * 0.5).clamp(0.0005, 0.05);
        let snr = depth / rms * 10.0;

        assert_eq!(result.planet_detected, best_power > 5.0 && snr > 5.0);
        assert_approx_eq!(result.rms_noise, stats::rms_of(&fluxes));
        assert_approx_eq!(result.signal_to_noise, snr);
        assert_eq!(result.data_points, 200);
        assert_eq!(result.observation_time, "199.0");
        assert_approx_eq!(result.chi2, 1.6);
        assert_eq!(result.best_periods.len(), 10);
        assert_eq!(result.best_periods[0].power, rounded(best_power, 2));
        assert_eq!(result.light_curve_data.len(), 200);
        assert_approx_eq!(stats::median(&result.detrended_data.fluxes()), 1.0);
    }

    #[test]
    fn stages_are_reported_in_order() {
        let (result, rec) = run(&flat_csv());
        assert!(result.is_ok());
        let expected: Vec<(ProcessingStep, u8)> =
            ProcessingStep::ALL.iter().map(|s| (*s, s.progress())).collect();
        assert_eq!(rec.steps, expected);
        assert_eq!(rec.statuses, vec![AnalysisStatus::Processing, AnalysisStatus::Complete]);
        assert!(rec.warnings.is_empty());
    }

    #[test]
    fn result_fields_are_formatted() {
        let result = run(&flat_csv()).0.unwrap();
        assert_eq!(result.period.split('.').nth(1).map(str::len), Some(2));
        assert_eq!(result.transit_depth.split('.').nth(1).map(str::len), Some(3));
        assert_eq!(result.duration.split('.').nth(1).map(str::len), Some(1));
        assert!(!result.equilibrium_temp.contains('.'));
        assert!((10..=95).contains(&result.confidence));
        assert!(result
            .best_periods
            .windows(2)
            .all(|w| w[0].power >= w[1].power));
        for c in &result.best_periods {
            assert_approx_eq!(c.depth, rounded(c.power * 0.1, 3));
        }
    }

    #[test]
    fn exact_ties_round_away_from_zero() {
        assert_eq!(fixed(2.25, 1), "2.3");
        assert_eq!(fixed(0.5, 0), "1");
        assert_eq!(fixed(9.5, 0), "10");
        assert_eq!(fixed(0.125, 2), "0.13");
        assert_eq!(fixed(-2.25, 1), "-2.3");
        assert_eq!(fixed(99.75, 1), "99.8");
        // 1.005 is stored just below the tie.
        assert_eq!(fixed(1.005, 2), "1.00");
        assert_eq!(fixed(2.24, 1), "2.2");
        assert_eq!(fixed(3.0, 3), "3.000");
        assert_eq!(rounded(8.125, 2), 8.13);
    }

    #[test]
    fn too_few_rows_is_fatal() {
        let (result, rec) = run("time,flux\n");
        assert!(matches!(result, Err(AnalysisError::InsufficientData { found: 0 })));
        assert_eq!(rec.statuses.last(), Some(&AnalysisStatus::Error));
        assert_eq!(rec.steps, vec![(ProcessingStep::Parsing, 10)]);
    }

    #[test]
    fn few_rows_warn_but_proceed() {
        let (result, rec) = run("0,1.0\n1,0.98\n2,1.01\n3,1.0\n");
        let result = result.unwrap();
        assert_eq!(rec.warnings.len(), 1);
        assert!(rec.warnings[0].contains("Only 4 points"));
        assert_eq!(result.data_points, 4);
        assert!(result.quality_flags.contains(&"insufficient_points".to_string()));
        // span 3 -> max(3/3, 0.6) = 1.0
        assert!(result.best_periods.iter().all(|c| (0.5..=1.0).contains(&c.period)));
    }

    #[test]
    fn time_guard_substitutes_index() {
        let ordered = LightCurve::new(vec![Sample::new(1.0, 1.0), Sample::new(2.0, 0.9)]);
        let (kept, substituted) = guard_time_axis(ordered.clone());
        assert!(!substituted);
        assert_eq!(kept, ordered);

        let reversed = LightCurve::new(vec![Sample::new(5.0, 1.0), Sample::new(2.0, 0.9)]);
        let (fixed_curve, substituted) = guard_time_axis(reversed);
        assert!(substituted);
        assert_eq!(fixed_curve.times(), vec![0.0, 1.0]);
        assert_eq!(fixed_curve.fluxes(), vec![1.0, 0.9]);
    }

    #[test]
    fn thresholds_are_configurable() {
        let params = PipelineParams {
            power_threshold: 1e9,
            ..PipelineParams::default()
        };
        let result = TransitPipeline::new(params)
            .analyze_with(flat_csv().as_bytes(), &mut NoProgress, &mut FixedChi2(0.0))
            .unwrap();
        assert!(!result.planet_detected);
        assert_approx_eq!(result.chi2, 1.2);
    }

    #[test]
    fn invalid_params_are_rejected() {
        let params = PipelineParams {
            candidate_count: 0,
            ..PipelineParams::default()
        };
        let err = TransitPipeline::new(params).analyze_text(&flat_csv()).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParams(_)));
    }

    #[test]
    fn empty_periodogram_fails_cleanly() {
        let err = TransitPipeline::default()
            .with_search(EmptySearch)
            .analyze_text(&flat_csv())
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Failed(_)));
    }

    #[test]
    fn panicking_stage_becomes_failure() {
        let mut rec = Recorder::default();
        let err = TransitPipeline::default()
            .with_search(BrokenSearch)
            .analyze_with(flat_csv().as_bytes(), &mut rec, &mut FixedChi2(0.0))
            .unwrap_err();
        match err {
            AnalysisError::Failed(msg) => assert!(msg.contains("grid exploded")),
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(rec.statuses.last(), Some(&AnalysisStatus::Error));
    }

    #[test]
    fn chi2_stays_in_range() {
        let mut source = RandomChi2;
        for _ in 0..100 {
            let chi2 = 1.2 + source.sample() * 0.8;
            assert!((1.2..2.0).contains(&chi2));
        }
    }
}
