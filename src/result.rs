//! Result types produced by the analysis pipeline.
//!
//! Everything here is plain serializable data. Field names and nesting are
//! part of the output contract: downstream prose generation keys off exact
//! names, so changes here are breaking changes.

use serde::{Deserialize, Serialize};

use crate::config::{AnalysisOptions, PoolingModel};
use crate::error::AnalysisError;
use crate::study::EffectMetric;

/// A per-study or pooled effect estimate on the analysis scale.
///
/// Ratio metrics stay on the log scale here; display-scale values appear
/// only in forest-plot coordinates and terminal output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectEstimate {
    /// Effect point estimate.
    pub point: f64,
    /// Variance of the estimate. Always strictly positive.
    pub variance: f64,
    /// `sqrt(variance)`.
    pub standard_error: f64,
    /// Lower bound of the symmetric Wald interval.
    pub ci_low: f64,
    /// Upper bound of the symmetric Wald interval.
    pub ci_high: f64,
    /// Inverse-variance weight used by the pooling model that produced this
    /// estimate. For per-study estimates this is `1/variance`; for pooled
    /// estimates it is the total weight of the contributing studies.
    pub weight: f64,
}

impl EffectEstimate {
    /// Build an estimate from a point and a positive variance.
    ///
    /// `z` is the critical value matching the configured confidence level.
    pub(crate) fn from_point_variance(point: f64, variance: f64, z: f64) -> Self {
        debug_assert!(variance > 0.0, "variance must be positive");
        let standard_error = variance.sqrt();
        Self {
            point,
            variance,
            standard_error,
            ci_low: point - z * standard_error,
            ci_high: point + z * standard_error,
            weight: 1.0 / variance,
        }
    }
}

/// Heterogeneity summary attached to every pooling result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeterogeneityStats {
    /// Cochran's Q statistic, computed under fixed-effect weights.
    pub q: f64,
    /// Degrees of freedom: `study_count - 1`.
    pub degrees_of_freedom: usize,
    /// P-value of Q under a chi-squared distribution.
    pub p_value: f64,
    /// I squared, percent of variability beyond sampling error, in [0, 100].
    pub i_squared: f64,
    /// Banded interpretation of I squared.
    pub magnitude: HeterogeneityMagnitude,
}

/// Conventional interpretation bands for I squared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeterogeneityMagnitude {
    /// I squared below 25%.
    Low,
    /// 25% to 50%.
    Moderate,
    /// 50% to 75%.
    Substantial,
    /// 75% and above.
    Considerable,
}

impl HeterogeneityMagnitude {
    /// Band an I squared value (percent).
    pub fn from_i_squared(i_squared: f64) -> Self {
        if i_squared < 25.0 {
            HeterogeneityMagnitude::Low
        } else if i_squared < 50.0 {
            HeterogeneityMagnitude::Moderate
        } else if i_squared < 75.0 {
            HeterogeneityMagnitude::Substantial
        } else {
            HeterogeneityMagnitude::Considerable
        }
    }
}

/// Result of pooling two or more study estimates under one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolingResult {
    /// Model the estimate was pooled under.
    pub model: PoolingModel,
    /// The pooled estimate.
    pub pooled: EffectEstimate,
    /// Number of contributing studies (always at least 2).
    pub study_count: usize,
    /// Between-study variance. Zero under the fixed-effect model.
    pub tau_squared: f64,
    /// Q / I squared / p-value block.
    pub heterogeneity: HeterogeneityStats,
}

/// Outcome of one analysis slice: computed, or explicitly unavailable.
///
/// Slices that cannot be computed (too few studies, degenerate numbers) are
/// reported with a reason rather than omitted, so downstream consumers never
/// see missing fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SliceOutcome<T> {
    /// The slice was computed.
    Computed {
        /// The computed value.
        result: T,
    },
    /// The slice could not be computed.
    Unavailable {
        /// Why the slice is unavailable.
        reason: String,
    },
}

impl<T> SliceOutcome<T> {
    /// Wrap a pipeline result, converting the error into its display form.
    pub(crate) fn from_result(res: Result<T, AnalysisError>) -> Self {
        match res {
            Ok(result) => SliceOutcome::Computed { result },
            Err(e) => SliceOutcome::Unavailable {
                reason: e.to_string(),
            },
        }
    }

    /// The computed value, if any.
    pub fn computed(&self) -> Option<&T> {
        match self {
            SliceOutcome::Computed { result } => Some(result),
            SliceOutcome::Unavailable { .. } => None,
        }
    }

    /// Whether the slice was computed.
    pub fn is_computed(&self) -> bool {
        matches!(self, SliceOutcome::Computed { .. })
    }
}

/// A study excluded from all pooling, with the validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExcludedStudy {
    /// Identifier of the excluded study.
    pub study_id: String,
    /// Validation failure that caused the exclusion.
    pub reason: String,
}

/// Outcome of one subgroup category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SubgroupOutcome {
    /// Two or more studies, pooled under the primary model.
    Pooled {
        /// Pooling result for the category.
        result: PoolingResult,
    },
    /// Exactly one study: its unpooled estimate, never a pooling result.
    SingleStudy {
        /// The lone study.
        study_id: String,
        /// Its per-study estimate.
        estimate: EffectEstimate,
    },
    /// The category could not be analyzed.
    Unavailable {
        /// Why the category is unavailable.
        reason: String,
    },
}

/// One subgroup category's analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubgroupAnalysis {
    /// Covariate dimension, e.g. "design".
    pub dimension: String,
    /// Category value within the dimension, e.g. "RCT".
    pub category: String,
    /// Contributing studies, input order.
    pub study_ids: Vec<String>,
    /// Category outcome.
    pub outcome: SubgroupOutcome,
}

/// One leave-one-out re-analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaveOneOutAnalysis {
    /// Study excluded from this re-analysis.
    pub excluded_study: String,
    /// Pooling of the remaining studies under the primary model.
    pub outcome: SliceOutcome<PoolingResult>,
}

/// Which asymmetry test the bias check ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiasTest {
    /// Egger's regression of standardized effect on precision.
    Egger,
    /// Fewer than three studies; no regression attempted.
    InsufficientData,
}

/// Funnel-plot asymmetry verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasCheck {
    /// Test that produced the verdict.
    pub test: BiasTest,
    /// Whether the intercept differs significantly from zero.
    pub bias_detected: bool,
    /// Egger intercept, absent when no regression was run.
    pub intercept: Option<f64>,
    /// Two-sided p-value for the intercept, absent when no regression ran.
    pub intercept_p_value: Option<f64>,
}

/// One study's row in the forest plot, on the metric's display scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestStudy {
    /// Study identifier.
    pub study_id: String,
    /// Display-scale point estimate.
    pub point: f64,
    /// Display-scale lower CI bound.
    pub ci_low: f64,
    /// Display-scale upper CI bound.
    pub ci_high: f64,
    /// This study's share of total pooling weight, in [0, 1].
    pub weight_fraction: f64,
}

/// Pooled diamond coordinates, on the display scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestDiamond {
    /// Display-scale pooled point.
    pub point: f64,
    /// Display-scale lower CI bound.
    pub ci_low: f64,
    /// Display-scale upper CI bound.
    pub ci_high: f64,
}

/// Forest-plot coordinate data for a downstream renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestPlot {
    /// Per-study rows, input order.
    pub studies: Vec<ForestStudy>,
    /// Pooled diamond; absent when the primary pooling was unavailable.
    pub diamond: Option<ForestDiamond>,
}

/// Complete output of one meta-analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Options the run was invoked with.
    pub options: AnalysisOptions,
    /// Common effect metric of the analysis.
    pub metric: EffectMetric,
    /// Number of valid studies contributing.
    pub study_count: usize,
    /// Studies excluded during validation, with reasons.
    pub excluded: Vec<ExcludedStudy>,
    /// Primary pooled analysis.
    pub primary: SliceOutcome<PoolingResult>,
    /// Per-category subgroup analyses, covariate discovery order.
    pub subgroups: Vec<SubgroupAnalysis>,
    /// Leave-one-out analyses, one per valid study, input order.
    pub leave_one_out: Vec<LeaveOneOutAnalysis>,
    /// Funnel-plot asymmetry check.
    pub publication_bias: SliceOutcome<BiasCheck>,
    /// Forest-plot coordinates.
    pub forest_plot: ForestPlot,
}
