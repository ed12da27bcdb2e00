//! Effect calculation: raw study data to a common effect size.
//!
//! Each metric's arithmetic is independent and dispatched once per study on
//! the record's tagged data variant:
//!
//! - Mean difference: `mean_t - mean_c`, variance `sd_t^2/n_t + sd_c^2/n_c`
//! - Standardized mean difference: Cohen's d over the pooled SD with the
//!   Hedges small-sample correction `J = 1 - 3/(4 df - 1)`
//! - Odds/risk ratio: log scale from the 2x2 table, delta-method variance,
//!   continuity correction of 0.5 when any cell is zero
//! - Proportion: raw scale with Wald variance `p(1 - p)/n`
//! - Correlation: Fisher z with variance `1/(n - 3)`
//! - Precomputed effect and standard error: validated pass-through
//!
//! A record that fails validation produces `InvalidStudyData`; the engine
//! excludes it from pooling and records the exclusion.

use crate::constants::CONTINUITY_CORRECTION;
use crate::error::AnalysisError;
use crate::result::EffectEstimate;
use crate::study::{ArmCounts, ArmSummary, EffectMetric, StudyData, StudyRecord};

/// Derive one study's effect estimate on its declared metric.
///
/// `z` is the critical value for the configured confidence level and only
/// shapes the Wald interval, never the point or variance.
pub fn compute_effect(record: &StudyRecord, z: f64) -> Result<EffectEstimate, AnalysisError> {
    let (point, variance) = match (record.metric, &record.data) {
        (EffectMetric::MeanDifference, StudyData::Continuous { treatment, control }) => {
            mean_difference(treatment, control)
        }
        (EffectMetric::StandardizedMeanDifference, StudyData::Continuous { treatment, control }) => {
            standardized_mean_difference(treatment, control)
        }
        (EffectMetric::OddsRatio, StudyData::Binary { treatment, control }) => {
            log_odds_ratio(treatment, control)
        }
        (EffectMetric::RiskRatio, StudyData::Binary { treatment, control }) => {
            log_risk_ratio(treatment, control)
        }
        (EffectMetric::Proportion, StudyData::Proportion { events, total }) => {
            proportion(*events, *total)
        }
        (EffectMetric::Correlation, StudyData::Correlation { n, r }) => fisher_z(*n, *r),
        (_, StudyData::Precomputed {
            effect,
            standard_error,
        }) => precomputed(*effect, *standard_error),
        (metric, data) => Err(format!(
            "{} cannot be derived from {} inputs",
            metric,
            data_kind(data)
        )),
    }
    .map_err(|reason| invalid(record, reason))?;

    if !point.is_finite() {
        return Err(invalid(record, "computed effect is not finite".to_string()));
    }
    if variance <= 0.0 || !variance.is_finite() {
        return Err(invalid(
            record,
            format!("computed variance {} is not positive", variance),
        ));
    }

    Ok(EffectEstimate::from_point_variance(point, variance, z))
}

fn invalid(record: &StudyRecord, reason: String) -> AnalysisError {
    AnalysisError::InvalidStudyData {
        study_id: record.study_id.clone(),
        reason,
    }
}

fn data_kind(data: &StudyData) -> &'static str {
    match data {
        StudyData::Continuous { .. } => "continuous arm",
        StudyData::Binary { .. } => "binary arm",
        StudyData::Proportion { .. } => "single-arm proportion",
        StudyData::Correlation { .. } => "correlation",
        StudyData::Precomputed { .. } => "precomputed",
    }
}

fn check_arm_summary(label: &str, arm: &ArmSummary) -> Result<(), String> {
    if arm.n == 0 {
        return Err(format!("{} arm has n = 0", label));
    }
    if !arm.mean.is_finite() {
        return Err(format!("{} arm mean is not finite", label));
    }
    if !arm.sd.is_finite() || arm.sd < 0.0 {
        return Err(format!("{} arm standard deviation is negative", label));
    }
    Ok(())
}

fn check_arm_counts(label: &str, arm: &ArmCounts) -> Result<(), String> {
    if arm.total == 0 {
        return Err(format!("{} arm has no participants", label));
    }
    if arm.events > arm.total {
        return Err(format!("{} arm reports more events than participants", label));
    }
    Ok(())
}

fn mean_difference(treatment: &ArmSummary, control: &ArmSummary) -> Result<(f64, f64), String> {
    check_arm_summary("treatment", treatment)?;
    check_arm_summary("control", control)?;

    let point = treatment.mean - control.mean;
    let variance = treatment.sd.powi(2) / treatment.n as f64
        + control.sd.powi(2) / control.n as f64;
    if variance <= 0.0 {
        return Err("both arms report zero spread".to_string());
    }
    Ok((point, variance))
}

fn standardized_mean_difference(
    treatment: &ArmSummary,
    control: &ArmSummary,
) -> Result<(f64, f64), String> {
    check_arm_summary("treatment", treatment)?;
    check_arm_summary("control", control)?;

    let n1 = treatment.n as f64;
    let n2 = control.n as f64;
    let df = n1 + n2 - 2.0;
    if df < 1.0 {
        return Err("too few participants for a pooled standard deviation".to_string());
    }

    let pooled_var =
        ((n1 - 1.0) * treatment.sd.powi(2) + (n2 - 1.0) * control.sd.powi(2)) / df;
    let pooled_sd = pooled_var.sqrt();
    if pooled_sd <= 0.0 {
        return Err("pooled standard deviation is zero".to_string());
    }

    let d = (treatment.mean - control.mean) / pooled_sd;
    let correction = 1.0 - 3.0 / (4.0 * df - 1.0);
    let g = correction * d;
    let variance = (n1 + n2) / (n1 * n2) + g.powi(2) / (2.0 * (n1 + n2));
    Ok((g, variance))
}

/// 2x2 cells (a, b, c, d) as floats, continuity-corrected when any is zero.
fn corrected_cells(treatment: &ArmCounts, control: &ArmCounts) -> (f64, f64, f64, f64) {
    let a = treatment.events as f64;
    let b = (treatment.total - treatment.events) as f64;
    let c = control.events as f64;
    let d = (control.total - control.events) as f64;
    if a == 0.0 || b == 0.0 || c == 0.0 || d == 0.0 {
        (
            a + CONTINUITY_CORRECTION,
            b + CONTINUITY_CORRECTION,
            c + CONTINUITY_CORRECTION,
            d + CONTINUITY_CORRECTION,
        )
    } else {
        (a, b, c, d)
    }
}

fn log_odds_ratio(treatment: &ArmCounts, control: &ArmCounts) -> Result<(f64, f64), String> {
    check_arm_counts("treatment", treatment)?;
    check_arm_counts("control", control)?;

    let (a, b, c, d) = corrected_cells(treatment, control);
    let point = ((a * d) / (b * c)).ln();
    let variance = 1.0 / a + 1.0 / b + 1.0 / c + 1.0 / d;
    Ok((point, variance))
}

fn log_risk_ratio(treatment: &ArmCounts, control: &ArmCounts) -> Result<(f64, f64), String> {
    check_arm_counts("treatment", treatment)?;
    check_arm_counts("control", control)?;

    let (a, b, c, d) = corrected_cells(treatment, control);
    let n1 = a + b;
    let n2 = c + d;
    let point = ((a / n1) / (c / n2)).ln();
    let variance = 1.0 / a - 1.0 / n1 + 1.0 / c - 1.0 / n2;
    Ok((point, variance))
}

fn proportion(events: u64, total: u64) -> Result<(f64, f64), String> {
    if total == 0 {
        return Err("proportion has no participants".to_string());
    }
    if events == 0 || events >= total {
        return Err(format!(
            "proportion events must lie strictly between 0 and {}, got {}",
            total, events
        ));
    }
    let p = events as f64 / total as f64;
    let variance = p * (1.0 - p) / total as f64;
    Ok((p, variance))
}

fn fisher_z(n: u64, r: f64) -> Result<(f64, f64), String> {
    if n < 4 {
        return Err("correlation requires at least 4 observations".to_string());
    }
    if !r.is_finite() || r.abs() >= 1.0 {
        return Err(format!("correlation {} is outside (-1, 1)", r));
    }
    let point = r.atanh();
    let variance = 1.0 / (n as f64 - 3.0);
    Ok((point, variance))
}

fn precomputed(effect: f64, standard_error: f64) -> Result<(f64, f64), String> {
    if !effect.is_finite() {
        return Err("precomputed effect is not finite".to_string());
    }
    if !standard_error.is_finite() || standard_error <= 0.0 {
        return Err("precomputed standard error is not positive".to_string());
    }
    Ok((effect, standard_error * standard_error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::StudyRecord;

    const Z95: f64 = 1.959964;

    fn continuous(id: &str, metric: EffectMetric, t: (u64, f64, f64), c: (u64, f64, f64)) -> StudyRecord {
        StudyRecord::new(
            id,
            metric,
            StudyData::Continuous {
                treatment: ArmSummary { n: t.0, mean: t.1, sd: t.2 },
                control: ArmSummary { n: c.0, mean: c.1, sd: c.2 },
            },
        )
    }

    #[test]
    fn test_mean_difference_point_and_variance() {
        let record = continuous(
            "md",
            EffectMetric::MeanDifference,
            (10, 5.0, 2.0),
            (20, 3.0, 1.0),
        );
        let est = compute_effect(&record, Z95).unwrap();
        assert!((est.point - 2.0).abs() < 1e-12);
        assert!((est.variance - (4.0 / 10.0 + 1.0 / 20.0)).abs() < 1e-12);
    }

    #[test]
    fn test_hedges_g_matches_hand_calculation() {
        // n1 = n2 = 10, sd1 = sd2 = 2, means 6 and 4:
        // pooled sd = 2, d = 1, J = 1 - 3/71, g = 68/71.
        let record = continuous(
            "smd",
            EffectMetric::StandardizedMeanDifference,
            (10, 6.0, 2.0),
            (10, 4.0, 2.0),
        );
        let est = compute_effect(&record, Z95).unwrap();
        let g = 68.0 / 71.0;
        assert!((est.point - g).abs() < 1e-12);
        let expected_var = 20.0 / 100.0 + g * g / 40.0;
        assert!((est.variance - expected_var).abs() < 1e-12);
    }

    #[test]
    fn test_zero_pooled_sd_is_invalid() {
        let record = continuous(
            "flat",
            EffectMetric::StandardizedMeanDifference,
            (10, 6.0, 0.0),
            (10, 4.0, 0.0),
        );
        let err = compute_effect(&record, Z95).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidStudyData { .. }));
    }

    #[test]
    fn test_zero_n_is_invalid() {
        let record = continuous(
            "empty",
            EffectMetric::MeanDifference,
            (0, 5.0, 2.0),
            (20, 3.0, 1.0),
        );
        let err = compute_effect(&record, Z95).unwrap_err();
        match err {
            AnalysisError::InvalidStudyData { study_id, reason } => {
                assert_eq!(study_id, "empty");
                assert!(reason.contains("n = 0"));
            }
            other => panic!("expected InvalidStudyData, got {:?}", other),
        }
    }

    #[test]
    fn test_log_odds_ratio_known_table() {
        // a=10 b=10 c=5 d=15: OR = (10*15)/(10*5) = 3.
        let record = StudyRecord::new(
            "or",
            EffectMetric::OddsRatio,
            StudyData::Binary {
                treatment: ArmCounts { events: 10, total: 20 },
                control: ArmCounts { events: 5, total: 20 },
            },
        );
        let est = compute_effect(&record, Z95).unwrap();
        assert!((est.point - 3.0f64.ln()).abs() < 1e-12);
        let expected_var = 0.1 + 0.1 + 0.2 + 1.0 / 15.0;
        assert!((est.variance - expected_var).abs() < 1e-12);
    }

    #[test]
    fn test_zero_cell_gets_continuity_correction() {
        let record = StudyRecord::new(
            "rare",
            EffectMetric::OddsRatio,
            StudyData::Binary {
                treatment: ArmCounts { events: 0, total: 20 },
                control: ArmCounts { events: 5, total: 20 },
            },
        );
        let est = compute_effect(&record, Z95).unwrap();
        // All four cells corrected: a=0.5, b=20.5, c=5.5, d=15.5.
        let expected = ((0.5_f64 * 15.5) / (20.5 * 5.5)).ln();
        assert!((est.point - expected).abs() < 1e-12);
        assert!(est.variance > 0.0);
    }

    #[test]
    fn test_risk_ratio_known_table() {
        let record = StudyRecord::new(
            "rr",
            EffectMetric::RiskRatio,
            StudyData::Binary {
                treatment: ArmCounts { events: 10, total: 20 },
                control: ArmCounts { events: 5, total: 20 },
            },
        );
        let est = compute_effect(&record, Z95).unwrap();
        assert!((est.point - 2.0f64.ln()).abs() < 1e-12);
        let expected_var = 0.1 - 0.05 + 0.2 - 0.05;
        assert!((est.variance - expected_var).abs() < 1e-12);
    }

    #[test]
    fn test_proportion_bounds() {
        let inside = StudyRecord::new(
            "p",
            EffectMetric::Proportion,
            StudyData::Proportion { events: 30, total: 100 },
        );
        let est = compute_effect(&inside, Z95).unwrap();
        assert!((est.point - 0.3).abs() < 1e-12);
        assert!((est.variance - 0.3 * 0.7 / 100.0).abs() < 1e-12);

        let boundary = StudyRecord::new(
            "p0",
            EffectMetric::Proportion,
            StudyData::Proportion { events: 0, total: 100 },
        );
        assert!(compute_effect(&boundary, Z95).is_err());
    }

    #[test]
    fn test_fisher_z_transform() {
        let record = StudyRecord::new(
            "r",
            EffectMetric::Correlation,
            StudyData::Correlation { n: 28, r: 0.5 },
        );
        let est = compute_effect(&record, Z95).unwrap();
        assert!((est.point - 0.5f64.atanh()).abs() < 1e-12);
        assert!((est.variance - 1.0 / 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_precomputed_pass_through() {
        let record = StudyRecord::new(
            "pre",
            EffectMetric::MeanDifference,
            StudyData::Precomputed { effect: 2.0, standard_error: 0.5 },
        );
        let est = compute_effect(&record, Z95).unwrap();
        assert!((est.point - 2.0).abs() < 1e-12);
        assert!((est.variance - 0.25).abs() < 1e-12);
        assert!(est.ci_low <= est.point && est.point <= est.ci_high);
    }

    #[test]
    fn test_metric_data_mismatch() {
        let record = StudyRecord::new(
            "mix",
            EffectMetric::OddsRatio,
            StudyData::Correlation { n: 30, r: 0.2 },
        );
        let err = compute_effect(&record, Z95).unwrap_err();
        match err {
            AnalysisError::InvalidStudyData { reason, .. } => {
                assert!(reason.contains("odds ratio"));
            }
            other => panic!("expected InvalidStudyData, got {:?}", other),
        }
    }
}
