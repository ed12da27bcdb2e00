//! Simple linear regression via normal equations.
//!
//! The bias checker needs a two-parameter least-squares fit with a standard
//! error for the intercept. The normal equations form a 2x2 system, solved
//! with a Cholesky factorization; a design matrix with no spread in the
//! predictor is not positive definite and is rejected as degenerate.

use nalgebra::{Cholesky, Matrix2, Vector2};

use crate::error::AnalysisError;

/// Ordinary least-squares fit of `y = intercept + slope * x`.
#[derive(Debug, Clone)]
pub struct LinearFit {
    /// Fitted intercept.
    pub intercept: f64,
    /// Fitted slope.
    pub slope: f64,
    /// Standard error of the intercept.
    pub intercept_se: f64,
    /// Residual degrees of freedom: `n - 2`.
    pub residual_df: usize,
}

/// Fit a line by ordinary least squares.
///
/// Requires `x.len() == y.len()` and at least 3 points so one residual
/// degree of freedom remains. Fails with `NumericalDegeneracy` when the
/// design is singular (constant predictor) or the residual variance
/// collapses to zero.
pub fn fit_line(x: &[f64], y: &[f64]) -> Result<LinearFit, AnalysisError> {
    assert_eq!(x.len(), y.len(), "predictor and response lengths differ");
    let n = x.len();
    if n < 3 {
        return Err(AnalysisError::InsufficientData {
            available: n,
            required: 3,
        });
    }

    let sum_x: f64 = x.iter().sum();
    let sum_xx: f64 = x.iter().map(|v| v * v).sum();
    let sum_y: f64 = y.iter().sum();
    let sum_yy: f64 = y.iter().map(|v| v * v).sum();
    let sum_xy: f64 = x.iter().zip(y).map(|(a, b)| a * b).sum();

    // Normal equations: (X^T X) beta = X^T y for X = [1 | x].
    let xtx = Matrix2::new(n as f64, sum_x, sum_x, sum_xx);
    let xty = Vector2::new(sum_y, sum_xy);

    let chol = Cholesky::new(xtx).ok_or_else(|| AnalysisError::NumericalDegeneracy {
        reason: "singular regression design".to_string(),
    })?;
    let beta = chol.solve(&xty);
    let (intercept, slope) = (beta[0], beta[1]);

    let rss: f64 = x
        .iter()
        .zip(y)
        .map(|(a, b)| {
            let fitted = intercept + slope * a;
            (b - fitted) * (b - fitted)
        })
        .sum();

    let residual_df = n - 2;
    let residual_variance = rss / residual_df as f64;
    // An exact fit leaves only float dust in the residuals; the threshold is
    // relative to the response magnitude so scale does not matter.
    let negligible = rss <= 1e-12 * sum_yy.max(f64::MIN_POSITIVE);
    if negligible || !residual_variance.is_finite() {
        return Err(AnalysisError::NumericalDegeneracy {
            reason: "zero residual variance in regression".to_string(),
        });
    }

    // Var(beta) = s^2 (X^T X)^-1; the intercept variance is the (0,0) entry.
    let xtx_inv = chol.inverse();
    let intercept_se = (residual_variance * xtx_inv[(0, 0)]).sqrt();

    Ok(LinearFit {
        intercept,
        slope,
        intercept_se,
        residual_df,
    })
}
