//! Configuration for a meta-analysis run.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_CONFIDENCE_LEVEL, MIN_STUDIES_FOR_POOLING};

/// Pooling model choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolingModel {
    /// One true effect shared by all studies; weights are purely
    /// within-study inverse variances.
    Fixed,
    /// True effects vary across studies; DerSimonian-Laird between-study
    /// variance (tau squared) is added to every study's variance.
    Random,
}

/// Options for `MetaAnalysis`.
///
/// All tunables are passed explicitly into the engine entry point. There is
/// no ambient global state, so concurrent runs with different options cannot
/// interfere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Pooling model (default: random effects, which degrades to the fixed
    /// point estimate when tau squared is zero).
    pub model: PoolingModel,

    /// Confidence level for all Wald intervals, in (0, 1) (default: 0.95).
    pub confidence_level: f64,

    /// Minimum studies a subgroup category needs to be pooled (default: 2).
    ///
    /// Categories with exactly one study are reported as an unpooled
    /// single-study estimate; categories between one and this threshold are
    /// reported as unavailable. Values below 2 are treated as 2, since
    /// pooling a single study is undefined.
    pub min_subgroup_studies: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            model: PoolingModel::Random,
            confidence_level: DEFAULT_CONFIDENCE_LEVEL,
            min_subgroup_studies: MIN_STUDIES_FOR_POOLING,
        }
    }
}

impl AnalysisOptions {
    /// The subgroup pooling threshold, never below the global pooling minimum.
    pub(crate) fn subgroup_threshold(&self) -> usize {
        self.min_subgroup_studies.max(MIN_STUDIES_FOR_POOLING)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = AnalysisOptions::default();
        assert_eq!(opts.model, PoolingModel::Random);
        assert!((opts.confidence_level - 0.95).abs() < 1e-12);
        assert_eq!(opts.min_subgroup_studies, 2);
    }

    #[test]
    fn test_subgroup_threshold_floor() {
        let opts = AnalysisOptions {
            min_subgroup_studies: 0,
            ..AnalysisOptions::default()
        };
        assert_eq!(opts.subgroup_threshold(), 2);
    }

    #[test]
    fn test_model_serde_tags() {
        assert_eq!(
            serde_json::to_string(&PoolingModel::Fixed).unwrap(),
            "\"fixed\""
        );
        assert_eq!(
            serde_json::to_string(&PoolingModel::Random).unwrap(),
            "\"random\""
        );
    }
}
