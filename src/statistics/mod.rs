//! Statistical primitives shared by the analysis stages.
//!
//! This module provides the numeric infrastructure the pipeline stages build
//! on: distribution lookups (critical values and p-values) and a small
//! least-squares fit for the bias regression.

mod distributions;
mod regression;

pub use distributions::{chi_squared_p_value, critical_z, t_p_value_two_sided};
pub use regression::{fit_line, LinearFit};
