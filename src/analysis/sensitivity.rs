//! Subgroup and leave-one-out re-analyses.
//!
//! Both sub-analyses are fan-out/fan-in over a fixed index set: covariate
//! categories for subgroups, study positions for leave-one-out. Each slice
//! re-invokes the pooling engine on a read-only subset of the study arena
//! under the exact model and options chosen for the primary analysis, so any
//! difference from the primary result is attributable solely to the change
//! in study set. Slices are mutually independent and run on rayon; results
//! are collected in index order, so output is reproducible regardless of
//! thread count.

use rayon::prelude::*;

use crate::config::AnalysisOptions;
use crate::result::{
    EffectEstimate, LeaveOneOutAnalysis, SliceOutcome, SubgroupAnalysis, SubgroupOutcome,
};

use super::pooling;
use super::StudyEffect;

/// One discovered subgroup category and the arena indices it covers.
struct Category {
    dimension: String,
    category: String,
    members: Vec<usize>,
}

/// Partition studies by covariate category, in discovery order.
///
/// A dimension qualifies when at least two studies carry it; categories keep
/// the order in which they are first seen while scanning studies in input
/// order.
fn discover_categories(studies: &[StudyEffect]) -> Vec<Category> {
    let mut dimensions: Vec<&str> = Vec::new();
    for study in studies {
        for dim in study.covariates.keys() {
            if !dimensions.contains(&dim.as_str()) {
                dimensions.push(dim.as_str());
            }
        }
    }

    let mut categories: Vec<Category> = Vec::new();
    for dim in dimensions {
        let carriers = studies
            .iter()
            .filter(|s| s.covariates.contains_key(dim))
            .count();
        if carriers < 2 {
            continue;
        }
        for (idx, study) in studies.iter().enumerate() {
            let Some(value) = study.covariates.get(dim) else {
                continue;
            };
            match categories
                .iter_mut()
                .find(|c| c.dimension == dim && c.category == *value)
            {
                Some(existing) => existing.members.push(idx),
                None => categories.push(Category {
                    dimension: dim.to_string(),
                    category: value.clone(),
                    members: vec![idx],
                }),
            }
        }
    }
    categories
}

/// Run one pooled analysis per subgroup category.
///
/// Categories with exactly one study report that study's unpooled estimate;
/// categories below the configured pooling threshold report an unavailable
/// slice. One category's failure never affects another.
pub(crate) fn subgroup_analyses(
    studies: &[StudyEffect],
    options: &AnalysisOptions,
    z: f64,
) -> Vec<SubgroupAnalysis> {
    let threshold = options.subgroup_threshold();
    let categories = discover_categories(studies);

    categories
        .into_par_iter()
        .map(|cat| {
            let study_ids: Vec<String> = cat
                .members
                .iter()
                .map(|&i| studies[i].study_id.clone())
                .collect();

            let outcome = if cat.members.len() == 1 {
                let lone = &studies[cat.members[0]];
                SubgroupOutcome::SingleStudy {
                    study_id: lone.study_id.clone(),
                    estimate: lone.estimate.clone(),
                }
            } else if cat.members.len() < threshold {
                SubgroupOutcome::Unavailable {
                    reason: format!(
                        "{} studies, below the minimum subgroup size of {}",
                        cat.members.len(),
                        threshold
                    ),
                }
            } else {
                let subset: Vec<EffectEstimate> = cat
                    .members
                    .iter()
                    .map(|&i| studies[i].estimate.clone())
                    .collect();
                match pooling::pool(&subset, options.model, z) {
                    Ok(result) => SubgroupOutcome::Pooled { result },
                    Err(e) => SubgroupOutcome::Unavailable {
                        reason: e.to_string(),
                    },
                }
            };

            SubgroupAnalysis {
                dimension: cat.dimension,
                category: cat.category,
                study_ids,
                outcome,
            }
        })
        .collect()
}

/// Re-pool the full set minus each study in turn.
///
/// Produces exactly one entry per study, in input order, so the influence of
/// any single study is visible as the delta between the primary pooled point
/// and the matching leave-one-out point.
pub(crate) fn leave_one_out(
    studies: &[StudyEffect],
    options: &AnalysisOptions,
    z: f64,
) -> Vec<LeaveOneOutAnalysis> {
    (0..studies.len())
        .into_par_iter()
        .map(|excluded| {
            let subset: Vec<EffectEstimate> = studies
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != excluded)
                .map(|(_, s)| s.estimate.clone())
                .collect();

            LeaveOneOutAnalysis {
                excluded_study: studies[excluded].study_id.clone(),
                outcome: SliceOutcome::from_result(pooling::pool(&subset, options.model, z)),
            }
        })
        .collect()
}
