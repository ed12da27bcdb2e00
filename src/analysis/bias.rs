//! Funnel-plot asymmetry testing (Egger's regression).
//!
//! Egger's formulation regresses the standardized effect `point/SE` on the
//! precision `1/SE` and asks whether the intercept differs from zero. In a
//! symmetric funnel, small imprecise studies scatter around the same
//! underlying effect as large precise ones and the intercept stays near
//! zero; selective publication of significant small studies pulls it away.

use crate::constants::{EGGER_ALPHA, MIN_STUDIES_FOR_EGGER};
use crate::error::AnalysisError;
use crate::result::{BiasCheck, BiasTest, EffectEstimate};
use crate::statistics::{fit_line, t_p_value_two_sided};

/// Test funnel-plot asymmetry from per-study effect/precision pairs.
///
/// With fewer than three studies the regression is not well posed and the
/// verdict is `insufficient_data` with no test attempted. A degenerate
/// design (identical precision across all studies) fails with
/// `NumericalDegeneracy`; the engine reports that slice unavailable.
pub fn eggers_test(estimates: &[EffectEstimate]) -> Result<BiasCheck, AnalysisError> {
    if estimates.len() < MIN_STUDIES_FOR_EGGER {
        return Ok(BiasCheck {
            test: BiasTest::InsufficientData,
            bias_detected: false,
            intercept: None,
            intercept_p_value: None,
        });
    }

    let precision: Vec<f64> = estimates.iter().map(|e| 1.0 / e.standard_error).collect();
    let standardized: Vec<f64> = estimates
        .iter()
        .map(|e| e.point / e.standard_error)
        .collect();

    let spread = precision
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| {
            (lo.min(p), hi.max(p))
        });
    if (spread.1 - spread.0).abs() < f64::EPSILON * spread.1.abs() {
        return Err(AnalysisError::NumericalDegeneracy {
            reason: "identical precision across all studies".to_string(),
        });
    }

    let fit = fit_line(&precision, &standardized)?;
    let t = fit.intercept / fit.intercept_se;
    let p_value = t_p_value_two_sided(t, fit.residual_df);

    Ok(BiasCheck {
        test: BiasTest::Egger,
        bias_detected: p_value < EGGER_ALPHA,
        intercept: Some(fit.intercept),
        intercept_p_value: Some(p_value),
    })
}
