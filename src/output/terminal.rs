//! Terminal output formatting with colors.

use colored::Colorize;

use crate::result::{
    AnalysisReport, BiasTest, HeterogeneityMagnitude, PoolingResult, SliceOutcome,
    SubgroupOutcome,
};

/// Format an AnalysisReport for human-readable terminal output.
pub fn format_report(report: &AnalysisReport) -> String {
    let mut output = String::new();
    let sep = "\u{2500}".repeat(62);

    output.push_str("metapool\n");
    output.push_str(&sep);
    output.push('\n');
    output.push('\n');

    output.push_str(&format!("  Metric:  {}\n", report.metric));
    output.push_str(&format!(
        "  Studies: {} included, {} excluded\n",
        report.study_count,
        report.excluded.len()
    ));
    output.push('\n');

    match &report.primary {
        SliceOutcome::Computed { result } => {
            output.push_str(&format!(
                "  {}\n",
                format_pooled(report, result, "Pooled effect")
            ));
            let h = &result.heterogeneity;
            output.push_str(&format!(
                "  Heterogeneity: I\u{00b2} = {:.1}% ({}), Q = {:.2} on {} df (p = {:.3}), \u{03c4}\u{00b2} = {:.4}\n",
                h.i_squared,
                format_magnitude(h.magnitude),
                h.q,
                h.degrees_of_freedom,
                h.p_value,
                result.tau_squared
            ));
        }
        SliceOutcome::Unavailable { reason } => {
            output.push_str(&format!(
                "  {} {}\n",
                "\u{26A0} Primary pooling unavailable:".yellow().bold(),
                reason
            ));
        }
    }
    output.push('\n');

    if !report.subgroups.is_empty() {
        output.push_str("  Subgroups:\n");
        for subgroup in &report.subgroups {
            let line = match &subgroup.outcome {
                SubgroupOutcome::Pooled { result } => {
                    format_pooled(report, result, "pooled")
                }
                SubgroupOutcome::SingleStudy { study_id, estimate } => format!(
                    "single study {} at {:.3}",
                    study_id,
                    report.metric.display_value(estimate.point)
                ),
                SubgroupOutcome::Unavailable { reason } => {
                    format!("unavailable ({})", reason)
                }
            };
            output.push_str(&format!(
                "    {} = {}: {}\n",
                subgroup.dimension, subgroup.category, line
            ));
        }
        output.push('\n');
    }

    if let Some(range) = leave_one_out_range(report) {
        output.push_str(&format!(
            "  Leave-one-out pooled range: {:.3} to {:.3}\n",
            range.0, range.1
        ));
        output.push('\n');
    }

    match &report.publication_bias {
        SliceOutcome::Computed { result } => match result.test {
            BiasTest::Egger => {
                if result.bias_detected {
                    output.push_str(&format!(
                        "  {} (Egger intercept {:.3}, p = {:.3})\n",
                        "\u{26A0} Funnel asymmetry detected".yellow().bold(),
                        result.intercept.unwrap_or(f64::NAN),
                        result.intercept_p_value.unwrap_or(f64::NAN)
                    ));
                } else {
                    output.push_str(&format!(
                        "  {} (Egger p = {:.3})\n",
                        "\u{2713} No funnel asymmetry detected".green().bold(),
                        result.intercept_p_value.unwrap_or(f64::NAN)
                    ));
                }
            }
            BiasTest::InsufficientData => {
                output.push_str("  Publication bias: too few studies to test\n");
            }
        },
        SliceOutcome::Unavailable { reason } => {
            output.push_str(&format!("  Publication bias: unavailable ({})\n", reason));
        }
    }

    if !report.excluded.is_empty() {
        output.push('\n');
        output.push_str("  Excluded studies:\n");
        for excluded in &report.excluded {
            output.push_str(&format!(
                "    {}: {}\n",
                excluded.study_id, excluded.reason
            ));
        }
    }

    output.push('\n');
    output.push_str(&sep);
    output.push('\n');

    output
}

/// One pooled estimate on the display scale, with its interval.
fn format_pooled(report: &AnalysisReport, result: &PoolingResult, label: &str) -> String {
    let metric = report.metric;
    format!(
        "{}: {:.3} ({:.0}% CI {:.3} to {:.3}, {} studies, {} model)",
        label,
        metric.display_value(result.pooled.point),
        report.options.confidence_level * 100.0,
        metric.display_value(result.pooled.ci_low),
        metric.display_value(result.pooled.ci_high),
        result.study_count,
        match result.model {
            crate::config::PoolingModel::Fixed => "fixed-effect",
            crate::config::PoolingModel::Random => "random-effects",
        }
    )
}

/// Format a HeterogeneityMagnitude for display.
fn format_magnitude(magnitude: HeterogeneityMagnitude) -> String {
    match magnitude {
        HeterogeneityMagnitude::Low => "low".green().to_string(),
        HeterogeneityMagnitude::Moderate => "moderate".yellow().to_string(),
        HeterogeneityMagnitude::Substantial => "substantial".yellow().to_string(),
        HeterogeneityMagnitude::Considerable => "considerable".red().to_string(),
    }
}

/// Display-scale min and max of the computed leave-one-out pooled points.
fn leave_one_out_range(report: &AnalysisReport) -> Option<(f64, f64)> {
    let points: Vec<f64> = report
        .leave_one_out
        .iter()
        .filter_map(|entry| entry.outcome.computed())
        .map(|pooled| report.metric.display_value(pooled.pooled.point))
        .collect();
    if points.is_empty() {
        return None;
    }
    let lo = points.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = points.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((lo, hi))
}
