//! # metapool
//!
//! Statistical meta-analysis engine: pooled effect estimation,
//! heterogeneity assessment, subgroup and sensitivity breakdowns, and a
//! publication-bias check.
//!
//! This crate takes per-study quantitative datapoints extracted from a
//! literature corpus and produces:
//! - A pooled effect estimate under a fixed-effect or DerSimonian-Laird
//!   random-effects model
//! - Q / I-squared heterogeneity statistics with chi-squared p-values
//! - Subgroup analyses per covariate category and leave-one-out sensitivity
//!   re-analyses
//! - An Egger funnel-asymmetry verdict
//! - Forest-plot coordinate data for a downstream renderer
//!
//! The engine is a pure computation over an in-memory study set: no
//! network, no file I/O (the optional [`input`] module reads the upstream
//! CSV contract), no state between runs. Upstream stages (search,
//! retrieval, extraction) and downstream rendering are out of scope.
//!
//! ## Quick Start
//!
//! ```ignore
//! use metapool::{analyze, EffectMetric, StudyData, StudyRecord};
//!
//! let records = vec![
//!     StudyRecord::new("ota2019", EffectMetric::MeanDifference,
//!         StudyData::Precomputed { effect: 2.0, standard_error: 0.5 }),
//!     StudyRecord::new("kim2021", EffectMetric::MeanDifference,
//!         StudyData::Precomputed { effect: 3.0, standard_error: 1.0 }),
//! ];
//!
//! let report = analyze(&records)?;
//! println!("{}", metapool::output::format_report(&report));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod constants;
mod engine;
mod error;
mod report;
mod result;
mod study;

// Functional modules
pub mod analysis;
pub mod input;
pub mod output;
pub mod statistics;

// Re-exports for public API
pub use config::{AnalysisOptions, PoolingModel};
pub use constants::{DEFAULT_CONFIDENCE_LEVEL, MIN_STUDIES_FOR_EGGER, MIN_STUDIES_FOR_POOLING};
pub use engine::{analyze, MetaAnalysis};
pub use error::{AnalysisError, IngestError};
pub use result::{
    AnalysisReport, BiasCheck, BiasTest, EffectEstimate, ExcludedStudy, ForestDiamond,
    ForestPlot, ForestStudy, HeterogeneityMagnitude, HeterogeneityStats, LeaveOneOutAnalysis,
    PoolingResult, SliceOutcome, SubgroupAnalysis, SubgroupOutcome,
};
pub use study::{ArmCounts, ArmSummary, EffectMetric, ParseMetricError, StudyData, StudyRecord};
