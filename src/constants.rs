//! Shared numeric constants.

/// Default confidence level for Wald intervals.
pub const DEFAULT_CONFIDENCE_LEVEL: f64 = 0.95;

/// Minimum number of studies a pooling operation accepts.
pub const MIN_STUDIES_FOR_POOLING: usize = 2;

/// Minimum number of studies for a well-posed Egger regression.
pub const MIN_STUDIES_FOR_EGGER: usize = 3;

/// Significance level for the Egger intercept test.
pub const EGGER_ALPHA: f64 = 0.05;

/// Continuity correction added to every 2x2 cell when any cell is zero.
pub const CONTINUITY_CORRECTION: f64 = 0.5;
