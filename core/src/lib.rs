//! # transitscan-core
//!
//! Light-curve ingestion and periodic transit search, with optional Python
//! bindings via [PyO3](https://pyo3.rs).
//!
//! ## Overview
//!
//! | Module         | Purpose                                                        |
//! |----------------|----------------------------------------------------------------|
//! | [`lightcurve`] | Reads heterogeneous CSV/TXT/DAT tables into a clean series     |
//! | [`numeric`]    | Locale- and unit-tolerant number and date parsing              |
//! | [`stats`]      | RMS, median and median detrending                              |
//! | [`bls`]        | Period scan (`PeriodSearch`) and candidate ranking             |
//! | [`transit`]    | Transit statistics and physical parameter estimates            |
//! | [`quality`]    | Threshold checks producing quality flags                       |
//! | [`pipeline`]   | `TransitPipeline` orchestrator, progress and error reporting   |
//! | [`types`]      | Shared data structures (samples, candidates, params, results)  |
//!
//! ## Rust usage
//!
//! ```no_run
//! use transitscan_core::TransitPipeline;
//!
//! let result = TransitPipeline::default().analyze_file("kepler.csv")?;
//! println!("{}", result.summary());
//! # Ok::<(), transitscan_core::AnalysisError>(())
//! ```
//!
//! ## Python usage
//!
//! Built with `--features python`, the library is an extension module
//! called `transitscan_core`:
//!
//! ```python
//! import transitscan_core
//!
//! pipeline = transitscan_core.TransitPipeline()
//! result = pipeline.analyze("kepler.csv", progress=lambda stage, pct, msg: print(pct, stage))
//! print(result.period, result.quality_flags)
//! ```

pub mod bls;
pub mod lightcurve;
pub mod numeric;
pub mod pipeline;
pub mod quality;
pub mod stats;
pub mod transit;
pub mod types;

// Re-export the most commonly used items at crate root for convenience.
pub use bls::{PeriodSearch, Periodogram, SyntheticBls};
pub use lightcurve::{parse_light_curve, LightCurveError, LightCurveReader};
pub use pipeline::{
    AnalysisError, Chi2Source, FixedChi2, NoProgress, ProgressObserver, RandomChi2,
    TransitPipeline,
};
pub use quality::QualityFlag;
pub use types::{
    AnalysisResult, AnalysisStatus, CandidatePeriod, LightCurve, PipelineParams, ProcessingStep,
    Sample,
};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Parse light-curve text into cleaned samples.
#[cfg(feature = "python")]
#[pyfunction]
#[pyo3(name = "parse_light_curve")]
fn py_parse_light_curve(text: &str) -> LightCurve {
    lightcurve::parse_light_curve(text)
}

/// The top-level Python module exposed by this crate.
///
/// Registered classes:
/// - `TransitPipeline`: the analysis orchestrator
/// - `LightCurveReader`: file reader
/// - `PipelineParams`: tuning constants
/// - `AnalysisResult`: aggregated report
/// - `CandidatePeriod`: one ranked trial period
/// - `LightCurve`, `Sample`: parsed data
#[cfg(feature = "python")]
#[pymodule]
fn transitscan_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<TransitPipeline>()?;
    m.add_class::<LightCurveReader>()?;
    m.add_class::<PipelineParams>()?;
    m.add_class::<AnalysisResult>()?;
    m.add_class::<CandidatePeriod>()?;
    m.add_class::<LightCurve>()?;
    m.add_class::<Sample>()?;
    m.add_function(wrap_pyfunction!(py_parse_light_curve, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add("__doc__", "Light-curve transit search core.")?;

    Ok(())
}
