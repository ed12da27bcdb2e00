//! End-to-end tests over the public API.

use metapool::{
    analyze, AnalysisError, BiasTest, EffectMetric, MetaAnalysis, PoolingModel, StudyData,
    StudyRecord, SubgroupOutcome,
};

fn md(id: &str, effect: f64, se: f64) -> StudyRecord {
    StudyRecord::new(
        id,
        EffectMetric::MeanDifference,
        StudyData::Precomputed {
            effect,
            standard_error: se,
        },
    )
}

/// Worked fixed-effect example from the engine contract:
/// (2.0/0.25 + 3.0/1.0)/(4 + 1) = 2.2 with pooled variance 0.2.
#[test]
fn fixed_effect_worked_example() {
    let records = vec![md("a", 2.0, 0.5), md("b", 3.0, 1.0)];
    let report = MetaAnalysis::new()
        .model(PoolingModel::Fixed)
        .run(&records)
        .unwrap();

    let primary = report.primary.computed().expect("two valid studies pool");
    assert!((primary.pooled.point - 2.2).abs() < 1e-12);
    assert!((primary.pooled.variance - 0.2).abs() < 1e-12);
    assert!((primary.pooled.standard_error - 0.2f64.sqrt()).abs() < 1e-12);
    assert_eq!(primary.study_count, 2);
    assert_eq!(primary.heterogeneity.degrees_of_freedom, 1);
}

#[test]
fn equal_variances_make_models_agree() {
    let records = vec![md("a", 1.0, 0.5), md("b", 1.6, 0.5), md("c", 1.3, 0.5)];
    let fixed = MetaAnalysis::new()
        .model(PoolingModel::Fixed)
        .run(&records)
        .unwrap();
    let random = MetaAnalysis::new()
        .model(PoolingModel::Random)
        .run(&records)
        .unwrap();

    let f = fixed.primary.computed().unwrap();
    let r = random.primary.computed().unwrap();
    assert!((f.pooled.point - r.pooled.point).abs() < 1e-12);
    assert_eq!(f.model, PoolingModel::Fixed);
    assert_eq!(r.model, PoolingModel::Random);
    assert_eq!(f.tau_squared, 0.0);
    // Q below df here, so the DL estimate truncates to zero.
    assert_eq!(r.tau_squared, 0.0);
}

#[test]
fn leave_one_out_covers_every_study_once() {
    let records = vec![
        md("a", 2.0, 0.5),
        md("b", 3.0, 1.0),
        md("c", 2.5, 0.8),
        md("d", 1.8, 0.6),
    ];
    let report = analyze(&records).unwrap();

    assert_eq!(report.leave_one_out.len(), 4);
    let mut excluded: Vec<&str> = report
        .leave_one_out
        .iter()
        .map(|entry| entry.excluded_study.as_str())
        .collect();
    assert_eq!(excluded, vec!["a", "b", "c", "d"]);
    excluded.dedup();
    assert_eq!(excluded.len(), 4);

    for entry in &report.leave_one_out {
        let pooled = entry.outcome.computed().expect("three studies remain");
        assert_eq!(pooled.study_count, 3);
    }
}

#[test]
fn invalid_study_is_excluded_and_recorded() {
    let bad = StudyRecord::new(
        "empty-arm",
        EffectMetric::MeanDifference,
        StudyData::Continuous {
            treatment: metapool::ArmSummary {
                n: 0,
                mean: 5.0,
                sd: 1.0,
            },
            control: metapool::ArmSummary {
                n: 20,
                mean: 3.0,
                sd: 1.0,
            },
        },
    );
    let records = vec![md("a", 2.0, 0.5), md("b", 3.0, 1.0), bad];

    let report = analyze(&records).unwrap();
    assert_eq!(report.study_count, 2);
    assert_eq!(report.excluded.len(), 1);
    assert_eq!(report.excluded[0].study_id, "empty-arm");
    assert!(report.excluded[0].reason.contains("n = 0"));
    assert!(report.primary.is_computed());
}

#[test]
fn single_valid_study_yields_unavailable_primary() {
    let records = vec![md("only", 2.0, 0.5)];
    let report = analyze(&records).unwrap();

    assert_eq!(report.study_count, 1);
    assert!(!report.primary.is_computed());
    assert_eq!(report.forest_plot.studies.len(), 1);
    assert!(report.forest_plot.diamond.is_none());
}

#[test]
fn zero_valid_studies_is_the_only_fatal_case() {
    let err = analyze(&[md("bad", 1.0, 0.0)]).unwrap_err();
    assert!(matches!(err, AnalysisError::InsufficientData { .. }));
}

#[test]
fn egger_short_circuits_below_three_studies() {
    let records = vec![md("a", 2.0, 0.5), md("b", 3.0, 1.0)];
    let report = analyze(&records).unwrap();
    let bias = report.publication_bias.computed().unwrap();
    assert_eq!(bias.test, BiasTest::InsufficientData);
    assert!(!bias.bias_detected);
}

#[test]
fn identical_precision_degrades_bias_slice_only() {
    let records = vec![md("a", 1.0, 0.5), md("b", 2.0, 0.5), md("c", 1.5, 0.5)];
    let report = analyze(&records).unwrap();
    assert!(report.primary.is_computed());
    assert!(!report.publication_bias.is_computed());
}

#[test]
fn subgroups_follow_primary_model_and_report_singletons() {
    let records = vec![
        md("a", 2.0, 0.5).with_covariate("design", "RCT"),
        md("b", 3.0, 1.0).with_covariate("design", "RCT"),
        md("c", 2.5, 0.8).with_covariate("design", "cohort"),
    ];
    let report = MetaAnalysis::new()
        .model(PoolingModel::Fixed)
        .run(&records)
        .unwrap();

    assert_eq!(report.subgroups.len(), 2);
    match &report.subgroups[0].outcome {
        SubgroupOutcome::Pooled { result } => {
            assert_eq!(result.model, PoolingModel::Fixed);
            assert_eq!(result.study_count, 2);
            // Same studies as the worked example, so the same pooled point.
            assert!((result.pooled.point - 2.2).abs() < 1e-12);
        }
        other => panic!("expected pooled RCT subgroup, got {:?}", other),
    }
    match &report.subgroups[1].outcome {
        SubgroupOutcome::SingleStudy { study_id, estimate } => {
            assert_eq!(study_id, "c");
            assert!((estimate.point - 2.5).abs() < 1e-12);
        }
        other => panic!("expected single-study cohort subgroup, got {:?}", other),
    }
}

#[test]
fn ratio_metric_forest_is_on_display_scale() {
    let or = |id: &str, effect: f64, se: f64| {
        StudyRecord::new(
            id,
            EffectMetric::OddsRatio,
            StudyData::Precomputed {
                effect,
                standard_error: se,
            },
        )
    };
    // Log odds ratios 0.0 and 0.7 pool somewhere in between; the forest
    // reports exponentiated values.
    let records = vec![or("a", 0.0, 0.2), or("b", 0.7, 0.3)];
    let report = analyze(&records).unwrap();

    let primary = report.primary.computed().unwrap();
    assert!(primary.pooled.point > 0.0 && primary.pooled.point < 0.7);

    let diamond = report.forest_plot.diamond.as_ref().unwrap();
    assert!(diamond.point > 1.0);
    assert!((report.forest_plot.studies[0].point - 1.0).abs() < 1e-12);
}

#[test]
fn report_is_deterministic_across_runs() {
    let records = vec![
        md("a", 2.0, 0.5).with_covariate("design", "RCT"),
        md("b", 3.0, 1.0).with_covariate("design", "cohort"),
        md("c", 2.5, 0.8).with_covariate("design", "RCT"),
        md("d", 1.8, 0.6),
    ];

    let first = analyze(&records).unwrap();
    let second = analyze(&records).unwrap();
    let json_first = metapool::output::to_json(&first).unwrap();
    let json_second = metapool::output::to_json(&second).unwrap();
    assert_eq!(json_first, json_second);
}

#[test]
fn report_round_trips_through_serde() {
    let records = vec![md("a", 2.0, 0.5), md("b", 3.0, 1.0), md("c", 2.2, 0.7)];
    let report = analyze(&records).unwrap();
    let json = metapool::output::to_json(&report).unwrap();
    let back: metapool::AnalysisReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back, report);
}
