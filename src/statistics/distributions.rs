//! Distribution lookups: critical values and p-values.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal, StudentsT};

/// Two-sided standard-normal critical value for a confidence level.
///
/// `critical_z(0.95)` is the familiar 1.96. The caller guarantees the level
/// lies strictly inside (0, 1).
pub fn critical_z(confidence_level: f64) -> f64 {
    debug_assert!(
        confidence_level > 0.0 && confidence_level < 1.0,
        "confidence level must lie in (0, 1)"
    );
    let standard_normal = Normal::new(0.0, 1.0).expect("standard normal parameters are valid");
    standard_normal.inverse_cdf(0.5 + confidence_level / 2.0)
}

/// Upper-tail p-value of a chi-squared statistic with `df` degrees of freedom.
///
/// Returns 1.0 for non-positive statistics. `df` must be at least 1, which
/// pooling guarantees (`study_count >= 2`).
pub fn chi_squared_p_value(statistic: f64, df: usize) -> f64 {
    debug_assert!(df >= 1, "chi-squared needs at least one degree of freedom");
    if statistic <= 0.0 {
        return 1.0;
    }
    let dist = ChiSquared::new(df as f64).expect("degrees of freedom are positive");
    (1.0 - dist.cdf(statistic)).clamp(0.0, 1.0)
}

/// Two-sided p-value of a t statistic with `df` degrees of freedom.
///
/// A non-finite statistic (zero standard error with a nonzero estimate)
/// maps to 0.0.
pub fn t_p_value_two_sided(statistic: f64, df: usize) -> f64 {
    debug_assert!(df >= 1, "t-test needs at least one degree of freedom");
    if !statistic.is_finite() {
        return 0.0;
    }
    let dist = StudentsT::new(0.0, 1.0, df as f64).expect("degrees of freedom are positive");
    (2.0 * (1.0 - dist.cdf(statistic.abs()))).clamp(0.0, 1.0)
}
