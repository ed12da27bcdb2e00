//! Main `MetaAnalysis` entry point and pipeline orchestration.

use crate::analysis::{compute_effect, eggers_test, pool, sensitivity, StudyEffect};
use crate::config::{AnalysisOptions, PoolingModel};
use crate::error::AnalysisError;
use crate::report;
use crate::result::{AnalysisReport, ExcludedStudy, SliceOutcome};
use crate::statistics::critical_z;
use crate::study::{EffectMetric, StudyRecord};

/// Main entry point for a meta-analysis run.
///
/// Configure with the builder methods, then call [`MetaAnalysis::run`] with
/// the study set. The engine holds only options, never study state: every
/// run is a pure function of the input records and the options.
///
/// # Example
///
/// ```ignore
/// use metapool::{MetaAnalysis, PoolingModel};
///
/// let report = MetaAnalysis::new()
///     .model(PoolingModel::Random)
///     .confidence_level(0.95)
///     .run(&records)?;
///
/// println!("{}", metapool::output::to_json_pretty(&report)?);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetaAnalysis {
    options: AnalysisOptions,
}

impl MetaAnalysis {
    /// Create with default options (random effects, 95% confidence).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create from an existing options value.
    pub fn with_options(options: AnalysisOptions) -> Self {
        Self { options }
    }

    /// Set the pooling model.
    pub fn model(mut self, model: PoolingModel) -> Self {
        self.options.model = model;
        self
    }

    /// Set the confidence level for all Wald intervals. Must lie in (0, 1).
    pub fn confidence_level(mut self, level: f64) -> Self {
        self.options.confidence_level = level;
        self
    }

    /// Set the minimum studies a subgroup category needs to be pooled.
    pub fn min_subgroup_studies(mut self, min: usize) -> Self {
        self.options.min_subgroup_studies = min;
        self
    }

    /// The configured options.
    pub fn options(&self) -> &AnalysisOptions {
        &self.options
    }

    /// Run the full pipeline over a study set.
    ///
    /// Invalid studies are excluded and recorded, insufficient or degenerate
    /// slices surface as unavailable markers in the report. The only fatal
    /// condition is an empty valid set: with zero valid studies no
    /// meaningful report exists and `InsufficientData` is returned.
    pub fn run(&self, records: &[StudyRecord]) -> Result<AnalysisReport, AnalysisError> {
        let level = self.options.confidence_level;
        if level <= 0.0 || level >= 1.0 || !level.is_finite() {
            return Err(AnalysisError::NumericalDegeneracy {
                reason: format!("confidence level {} is outside (0, 1)", level),
            });
        }
        let z = critical_z(level);

        let (studies, metric, excluded) = self.validate(records, z);
        log::debug!(
            "validated {} of {} study records ({} excluded)",
            studies.len(),
            records.len(),
            excluded.len()
        );

        if studies.is_empty() {
            return Err(AnalysisError::InsufficientData {
                available: 0,
                required: 1,
            });
        }
        let metric = metric.expect("non-empty study set fixes the metric");

        let estimates: Vec<_> = studies.iter().map(|s| s.estimate.clone()).collect();
        let primary = SliceOutcome::from_result(pool(&estimates, self.options.model, z));
        let subgroups = sensitivity::subgroup_analyses(&studies, &self.options, z);
        let leave_one_out = sensitivity::leave_one_out(&studies, &self.options, z);
        let publication_bias = SliceOutcome::from_result(eggers_test(&estimates));

        Ok(report::assemble(
            self.options.clone(),
            metric,
            &studies,
            excluded,
            primary,
            subgroups,
            leave_one_out,
            publication_bias,
        ))
    }

    /// Compute per-study effects, excluding records that fail validation.
    ///
    /// The first valid record fixes the analysis metric; later records with
    /// a different declared metric are excluded, since pooling across
    /// metrics has no meaning. Duplicate study ids are excluded as well to
    /// keep leave-one-out and forest rows unambiguous.
    fn validate(
        &self,
        records: &[StudyRecord],
        z: f64,
    ) -> (Vec<StudyEffect>, Option<EffectMetric>, Vec<ExcludedStudy>) {
        let mut studies: Vec<StudyEffect> = Vec::with_capacity(records.len());
        let mut excluded: Vec<ExcludedStudy> = Vec::new();
        let mut metric: Option<EffectMetric> = None;

        for record in records {
            if studies.iter().any(|s| s.study_id == record.study_id) {
                let reason = "duplicate study_id".to_string();
                log::warn!("excluding study '{}': {}", record.study_id, reason);
                excluded.push(ExcludedStudy {
                    study_id: record.study_id.clone(),
                    reason,
                });
                continue;
            }

            if let Some(expected) = metric {
                if record.metric != expected {
                    let reason = format!(
                        "metric {} differs from the analysis metric {}",
                        record.metric, expected
                    );
                    log::warn!("excluding study '{}': {}", record.study_id, reason);
                    excluded.push(ExcludedStudy {
                        study_id: record.study_id.clone(),
                        reason,
                    });
                    continue;
                }
            }

            match compute_effect(record, z) {
                Ok(estimate) => {
                    metric.get_or_insert(record.metric);
                    studies.push(StudyEffect {
                        study_id: record.study_id.clone(),
                        covariates: record.covariates.clone(),
                        estimate,
                    });
                }
                Err(e) => {
                    log::warn!("excluding study '{}': {}", record.study_id, e);
                    let reason = match e {
                        AnalysisError::InvalidStudyData { reason, .. } => reason,
                        other => other.to_string(),
                    };
                    excluded.push(ExcludedStudy {
                        study_id: record.study_id.clone(),
                        reason,
                    });
                }
            }
        }

        (studies, metric, excluded)
    }
}

/// Run a meta-analysis with default options.
///
/// Equivalent to `MetaAnalysis::new().run(records)`.
pub fn analyze(records: &[StudyRecord]) -> Result<AnalysisReport, AnalysisError> {
    MetaAnalysis::new().run(records)
}
