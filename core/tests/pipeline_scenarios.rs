//! End-to-end runs of the analysis pipeline on on-disk fixtures.

use std::io::Write;

use assert_approx_eq::assert_approx_eq;
use transitscan_core::bls::period_grid;
use transitscan_core::stats;
use transitscan_core::{
    AnalysisError, AnalysisResult, AnalysisStatus, FixedChi2, PipelineParams, ProcessingStep,
    ProgressObserver, SyntheticBls, TransitPipeline,
};

#[derive(Default)]
struct Log {
    statuses: Vec<AnalysisStatus>,
    percents: Vec<u8>,
    warnings: usize,
}

impl ProgressObserver for Log {
    fn on_status(&mut self, status: AnalysisStatus) {
        self.statuses.push(status);
    }

    fn on_step(&mut self, _step: ProcessingStep, percent: u8) {
        self.percents.push(percent);
    }

    fn on_warning(&mut self, _message: &str) {
        self.warnings += 1;
    }
}

fn write_fixture(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(body.as_bytes()).unwrap();
    path
}

/// Kepler-style export: header, comments, 300 cadences with a box dip
/// every 12 days.
fn kepler_like() -> String {
    let mut text = String::from("# KIC 0000000 long cadence\nTIME,PDCSAP_FLUX,PDCSAP_FLUX_ERR\n");
    for i in 0..300 {
        let t = 100.0 + i as f64 * 0.2;
        let in_transit = (t % 12.0) < 0.4;
        let flux = if in_transit { 0.99 } else { 1.0 + ((i * 7) % 5) as f64 * 1e-4 };
        text.push_str(&format!("{:.4},{:.6},0.0002\n", t, flux));
    }
    text
}

fn analyze(
    params: PipelineParams,
    path: &std::path::Path,
    log: &mut Log,
) -> Result<AnalysisResult, AnalysisError> {
    TransitPipeline::new(params).analyze_file_with(path, log, &mut FixedChi2(0.25))
}

#[test]
fn kepler_file_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "kepler.csv", &kepler_like());
    let mut log = Log::default();

    let result = analyze(PipelineParams::default(), &path, &mut log).unwrap();

    assert_eq!(
        log.statuses,
        vec![AnalysisStatus::Uploading, AnalysisStatus::Processing, AnalysisStatus::Complete]
    );
    assert_eq!(log.percents, vec![10, 20, 30, 50, 70, 85, 95]);
    assert_eq!(log.warnings, 0);

    assert_eq!(result.data_points, 300);
    assert_eq!(result.observation_time, "59.8");
    assert_approx_eq!(result.chi2, 1.4);

    // Recompute the detection rule from the same deterministic pieces.
    let rms = stats::rms(&result.detrended_data);
    let (lo, hi) = PipelineParams::default().period_range(result.light_curve_data.time_span());
    let best = period_grid(lo, hi, 1500)
        .iter()
        .map(|&p| SyntheticBls::power(p, rms))
        .fold(f64::MIN, f64::max);
    let depth = (rms * 0.5).clamp(0.0005, 0.05);
    let snr = depth / rms * 10.0;
    assert_eq!(result.planet_detected, best > 5.0 && snr > 5.0);
    assert_eq!(result.confidence, 95);

    assert!(!result.quality_flags.is_empty());
    assert_eq!(
        result.quality_flags.iter().any(|f| f == "passes_basic_checks"),
        result.quality_flags.len() == 1
    );

    let json = result.to_json().unwrap();
    assert!(json.contains("\"planetDetected\""));
    assert!(json.contains("\"bestPeriods\""));
    assert!(json.contains("\"lightCurveData\""));
}

#[test]
fn config_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(&dir, "params.json", r#"{ "candidate_count": 3, "power_threshold": 1000000.0 }"#);
    let data = write_fixture(&dir, "curve.txt", &kepler_like());

    let params = PipelineParams::from_path(&config).unwrap();
    assert_eq!(params.candidate_count, 3);
    assert_eq!(params.snr_threshold, 5.0);

    let result = analyze(params, &data, &mut Log::default()).unwrap();
    assert_eq!(result.best_periods.len(), 3);
    assert!(!result.planet_detected);
}

#[test]
fn bad_config_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(&dir, "params.json", r#"{ "max_steps": 10, "min_steps": 20 }"#);
    assert!(matches!(
        PipelineParams::from_path(&config),
        Err(AnalysisError::InvalidParams(_))
    ));
    assert!(matches!(
        PipelineParams::from_path(dir.path().join("missing.json")),
        Err(AnalysisError::InvalidParams(_))
    ));
}

#[test]
fn header_only_file_fails_without_result() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "empty.csv", "time,flux\n# nothing recorded\n");
    let mut log = Log::default();

    let err = analyze(PipelineParams::default(), &path, &mut log).unwrap_err();
    assert!(matches!(err, AnalysisError::InsufficientData { found: 0 }));
    assert!(err.to_string().starts_with("No usable data rows found"));
    assert_eq!(log.statuses.last(), Some(&AnalysisStatus::Error));
}

#[test]
fn missing_file_reports_error_status() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = Log::default();
    let err = analyze(PipelineParams::default(), &dir.path().join("nope.csv"), &mut log).unwrap_err();
    assert!(matches!(err, AnalysisError::Read(_)));
    assert_eq!(log.statuses, vec![AnalysisStatus::Uploading, AnalysisStatus::Error]);
}

#[test]
fn short_series_warns_and_completes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_fixture(&dir, "short.csv", "0 1.00\n1 0.97\n2 1.02\n3 0.99\n4 1.01\n");
    let mut log = Log::default();

    let result = analyze(PipelineParams::default(), &path, &mut log).unwrap();
    assert_eq!(log.warnings, 1);
    assert_eq!(result.data_points, 5);
    assert!(result.quality_flags.contains(&"insufficient_points".to_string()));
}

#[test]
fn quarter_day_cadence_rounds_span_up() {
    let text: String = (0..10).map(|i| format!("{},{}\n", i as f64 * 0.25, 1.0 + (i % 3) as f64 * 1e-3)).collect();
    let result = TransitPipeline::default()
        .analyze_with(text.as_bytes(), &mut Log::default(), &mut FixedChi2(0.5))
        .unwrap();
    assert_eq!(result.data_points, 10);
    assert_eq!(result.observation_time, "2.3");
}

#[test]
fn concurrent_runs_do_not_interfere() {
    let text = kepler_like();
    let expected = TransitPipeline::default()
        .analyze_with(text.as_bytes(), &mut Log::default(), &mut FixedChi2(0.0))
        .unwrap();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let text = text.clone();
            std::thread::spawn(move || {
                TransitPipeline::default()
                    .analyze_with(text.as_bytes(), &mut Log::default(), &mut FixedChi2(0.0))
                    .unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
