//! Per-study input records.
//!
//! A `StudyRecord` is one included study's contribution to the analysis:
//! an identifier, a declared effect metric, exactly one form of quantitative
//! input (raw arm data or a pre-computed effect), and optional covariates
//! for subgroup analysis. Records are immutable inputs; the engine never
//! mutates them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Effect-size metric a study reports on.
///
/// Ratio metrics (odds ratio, risk ratio) are analyzed on the log scale and
/// only transformed back for display; correlations are analyzed on the
/// Fisher-z scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectMetric {
    /// Raw difference of arm means.
    MeanDifference,
    /// Hedges' g: bias-corrected difference of means over pooled SD.
    StandardizedMeanDifference,
    /// Log odds ratio from a 2x2 table.
    OddsRatio,
    /// Log risk ratio from a 2x2 table.
    RiskRatio,
    /// Single-arm event proportion.
    Proportion,
    /// Pearson correlation, analyzed as Fisher z.
    Correlation,
}

impl EffectMetric {
    /// Whether the metric is pooled on the log scale.
    pub fn is_log_scale(self) -> bool {
        matches!(self, EffectMetric::OddsRatio | EffectMetric::RiskRatio)
    }

    /// Map an analysis-scale value back to the metric's display scale.
    ///
    /// Identity for additive metrics, `exp` for ratio metrics, `tanh` for
    /// correlations. Used only when emitting forest-plot coordinates and
    /// terminal output; all pooling arithmetic stays on the analysis scale.
    pub fn display_value(self, analysis_scale: f64) -> f64 {
        match self {
            EffectMetric::OddsRatio | EffectMetric::RiskRatio => analysis_scale.exp(),
            EffectMetric::Correlation => analysis_scale.tanh(),
            _ => analysis_scale,
        }
    }

    /// Neutral reference value on the display scale (no effect).
    pub fn null_value(self) -> f64 {
        if self.is_log_scale() {
            1.0
        } else {
            0.0
        }
    }
}

impl fmt::Display for EffectMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EffectMetric::MeanDifference => "mean difference",
            EffectMetric::StandardizedMeanDifference => "standardized mean difference",
            EffectMetric::OddsRatio => "odds ratio",
            EffectMetric::RiskRatio => "risk ratio",
            EffectMetric::Proportion => "proportion",
            EffectMetric::Correlation => "correlation",
        };
        f.write_str(label)
    }
}

/// Error from parsing an unrecognized effect metric tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMetricError;

impl fmt::Display for ParseMetricError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("unrecognized effect metric tag")
    }
}

impl std::error::Error for ParseMetricError {}

impl FromStr for EffectMetric {
    type Err = ParseMetricError;

    /// Parse the snake_case tag used by the tabular input contract.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mean_difference" => Ok(EffectMetric::MeanDifference),
            "standardized_mean_difference" => Ok(EffectMetric::StandardizedMeanDifference),
            "odds_ratio" => Ok(EffectMetric::OddsRatio),
            "risk_ratio" => Ok(EffectMetric::RiskRatio),
            "proportion" => Ok(EffectMetric::Proportion),
            "correlation" => Ok(EffectMetric::Correlation),
            _ => Err(ParseMetricError),
        }
    }
}

/// Summary statistics for one continuous arm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmSummary {
    /// Number of participants in the arm.
    pub n: u64,
    /// Arm mean.
    pub mean: f64,
    /// Arm standard deviation.
    pub sd: f64,
}

/// Event counts for one binary arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArmCounts {
    /// Number of events observed.
    pub events: u64,
    /// Number of participants in the arm.
    pub total: u64,
}

/// Quantitative input carried by a study.
///
/// Exactly one input form is present by construction: a record carries raw
/// arm data or a pre-computed effect, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyData {
    /// (n, mean, sd) per arm, for continuous metrics.
    Continuous {
        /// Treatment arm summary.
        treatment: ArmSummary,
        /// Control arm summary.
        control: ArmSummary,
    },
    /// 2x2 event/total counts per arm, for ratio metrics.
    Binary {
        /// Treatment arm counts.
        treatment: ArmCounts,
        /// Control arm counts.
        control: ArmCounts,
    },
    /// Single-arm event counts, for the proportion metric.
    Proportion {
        /// Number of events observed.
        events: u64,
        /// Number of participants.
        total: u64,
    },
    /// Sample size and Pearson r, for the correlation metric.
    Correlation {
        /// Number of paired observations.
        n: u64,
        /// Observed correlation coefficient.
        r: f64,
    },
    /// Pre-computed effect and standard error, already on the analysis scale.
    Precomputed {
        /// Effect point estimate (log scale for ratio metrics).
        effect: f64,
        /// Standard error of the effect.
        standard_error: f64,
    },
}

/// One included study's contribution to the analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyRecord {
    /// Unique identifier, stable across re-runs.
    pub study_id: String,
    /// Declared effect metric.
    pub metric: EffectMetric,
    /// Quantitative input for the metric.
    pub data: StudyData,
    /// Subgroup dimension to category value, e.g. `{"design": "RCT"}`.
    ///
    /// A BTreeMap keeps iteration and serialization order deterministic.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub covariates: BTreeMap<String, String>,
}

impl StudyRecord {
    /// Create a record with no covariates.
    pub fn new(study_id: impl Into<String>, metric: EffectMetric, data: StudyData) -> Self {
        Self {
            study_id: study_id.into(),
            metric,
            data,
            covariates: BTreeMap::new(),
        }
    }

    /// Attach a covariate, builder style.
    pub fn with_covariate(
        mut self,
        dimension: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        self.covariates.insert(dimension.into(), category.into());
        self
    }
}
