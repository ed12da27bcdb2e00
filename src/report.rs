//! Report assembly: shape packaging only, no computation beyond weight
//! normalization and display-scale transforms.

use crate::analysis::{model_weights, StudyEffect};
use crate::config::AnalysisOptions;
use crate::result::{
    AnalysisReport, BiasCheck, EffectEstimate, ExcludedStudy, ForestDiamond, ForestPlot,
    ForestStudy, LeaveOneOutAnalysis, PoolingResult, SliceOutcome, SubgroupAnalysis,
};
use crate::study::EffectMetric;

/// Package all analysis slices into the final report.
#[allow(clippy::too_many_arguments)]
pub(crate) fn assemble(
    options: AnalysisOptions,
    metric: EffectMetric,
    studies: &[StudyEffect],
    excluded: Vec<ExcludedStudy>,
    primary: SliceOutcome<PoolingResult>,
    subgroups: Vec<SubgroupAnalysis>,
    leave_one_out: Vec<LeaveOneOutAnalysis>,
    publication_bias: SliceOutcome<BiasCheck>,
) -> AnalysisReport {
    let forest_plot = forest_coordinates(metric, studies, &primary);

    AnalysisReport {
        options,
        metric,
        study_count: studies.len(),
        excluded,
        primary,
        subgroups,
        leave_one_out,
        publication_bias,
        forest_plot,
    }
}

/// Forest-plot coordinates on the metric's display scale.
///
/// Weight fractions come from the primary model's weights; when the primary
/// pooling is unavailable (fewer than two studies) plain inverse-variance
/// weights keep the per-study rows renderable and the diamond is omitted.
fn forest_coordinates(
    metric: EffectMetric,
    studies: &[StudyEffect],
    primary: &SliceOutcome<PoolingResult>,
) -> ForestPlot {
    let tau_squared = primary.computed().map_or(0.0, |p| p.tau_squared);
    let estimates: Vec<EffectEstimate> = studies.iter().map(|s| s.estimate.clone()).collect();
    let weights = model_weights(&estimates, tau_squared);
    let total_weight: f64 = weights.iter().sum();

    let rows = studies
        .iter()
        .zip(&weights)
        .map(|(study, w)| ForestStudy {
            study_id: study.study_id.clone(),
            point: metric.display_value(study.estimate.point),
            ci_low: metric.display_value(study.estimate.ci_low),
            ci_high: metric.display_value(study.estimate.ci_high),
            weight_fraction: if total_weight > 0.0 {
                w / total_weight
            } else {
                0.0
            },
        })
        .collect();

    let diamond = primary.computed().map(|p| ForestDiamond {
        point: metric.display_value(p.pooled.point),
        ci_low: metric.display_value(p.pooled.ci_low),
        ci_high: metric.display_value(p.pooled.ci_high),
    });

    ForestPlot {
        studies: rows,
        diamond,
    }
}
