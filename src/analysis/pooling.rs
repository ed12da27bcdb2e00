//! Inverse-variance pooling under fixed-effect and random-effects models.
//!
//! Fixed effect: `w_i = 1/v_i`, pooled point `sum(w_i x_i)/sum(w_i)`,
//! pooled variance `1/sum(w_i)`.
//!
//! Random effects (DerSimonian-Laird): the fixed-effect Q statistic feeds
//! `tau^2 = max(0, (Q - df)/C)` with `C = sum(w) - sum(w^2)/sum(w)`, then
//! every study is re-weighted as `1/(v_i + tau^2)` and the pooled point and
//! variance are recomputed with the adjusted weights.
//!
//! Heterogeneity is always assessed from the fixed-effect Q, whichever model
//! is requested, so fixed and random results over the same studies report
//! identical Q and I squared.

use crate::config::PoolingModel;
use crate::constants::MIN_STUDIES_FOR_POOLING;
use crate::error::AnalysisError;
use crate::result::{EffectEstimate, PoolingResult};

use super::heterogeneity;

/// Intermediate fixed-effect quantities shared by both models.
struct FixedPool {
    point: f64,
    sum_weights: f64,
    sum_sq_weights: f64,
    q: f64,
}

fn fixed_pool(estimates: &[EffectEstimate]) -> FixedPool {
    let weights: Vec<f64> = estimates.iter().map(|e| 1.0 / e.variance).collect();
    let sum_weights: f64 = weights.iter().sum();
    let sum_sq_weights: f64 = weights.iter().map(|w| w * w).sum();
    let point: f64 = estimates
        .iter()
        .zip(&weights)
        .map(|(e, w)| w * e.point)
        .sum::<f64>()
        / sum_weights;
    let q: f64 = estimates
        .iter()
        .zip(&weights)
        .map(|(e, w)| w * (e.point - point).powi(2))
        .sum();

    FixedPool {
        point,
        sum_weights,
        sum_sq_weights,
        q,
    }
}

/// Pool two or more study estimates under the requested model.
///
/// Fails with `InsufficientData` below two studies: a single study cannot be
/// pooled and callers are expected to check before invoking.
pub fn pool(
    estimates: &[EffectEstimate],
    model: PoolingModel,
    z: f64,
) -> Result<PoolingResult, AnalysisError> {
    if estimates.len() < MIN_STUDIES_FOR_POOLING {
        return Err(AnalysisError::InsufficientData {
            available: estimates.len(),
            required: MIN_STUDIES_FOR_POOLING,
        });
    }

    let study_count = estimates.len();
    let df = study_count - 1;
    let fixed = fixed_pool(estimates);
    let heterogeneity = heterogeneity::assess(fixed.q, df);

    let (point, variance, tau_squared, total_weight) = match model {
        PoolingModel::Fixed => (
            fixed.point,
            1.0 / fixed.sum_weights,
            0.0,
            fixed.sum_weights,
        ),
        PoolingModel::Random => {
            let c = fixed.sum_weights - fixed.sum_sq_weights / fixed.sum_weights;
            let tau_squared = ((fixed.q - df as f64) / c).max(0.0);

            let adjusted = model_weights(estimates, tau_squared);
            let sum_adjusted: f64 = adjusted.iter().sum();
            let point: f64 = estimates
                .iter()
                .zip(&adjusted)
                .map(|(e, w)| w * e.point)
                .sum::<f64>()
                / sum_adjusted;
            (point, 1.0 / sum_adjusted, tau_squared, sum_adjusted)
        }
    };

    let mut pooled = EffectEstimate::from_point_variance(point, variance, z);
    pooled.weight = total_weight;

    Ok(PoolingResult {
        model,
        pooled,
        study_count,
        tau_squared,
        heterogeneity,
    })
}

/// Per-study weights under a given between-study variance.
///
/// `tau_squared = 0` yields plain inverse-variance (fixed-effect) weights.
pub fn model_weights(estimates: &[EffectEstimate], tau_squared: f64) -> Vec<f64> {
    estimates
        .iter()
        .map(|e| 1.0 / (e.variance + tau_squared))
        .collect()
}
