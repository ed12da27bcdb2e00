//! Heterogeneity assessment from fixed-effect pooling intermediates.

use crate::result::{HeterogeneityMagnitude, HeterogeneityStats};
use crate::statistics::chi_squared_p_value;

/// Summarize between-study inconsistency from the Q statistic.
///
/// `I^2 = max(0, (Q - df)/Q) * 100`, zero whenever `Q <= df`, and the
/// p-value comes from a chi-squared distribution with `df` degrees of
/// freedom. Attached to every pooling result, including subgroup and
/// leave-one-out slices.
pub fn assess(q: f64, df: usize) -> HeterogeneityStats {
    let i_squared = if q > df as f64 {
        (q - df as f64) / q * 100.0
    } else {
        0.0
    };

    HeterogeneityStats {
        q,
        degrees_of_freedom: df,
        p_value: chi_squared_p_value(q, df),
        i_squared,
        magnitude: HeterogeneityMagnitude::from_i_squared(i_squared),
    }
}
