//! Tabular input contract.
//!
//! The upstream extraction stage emits one CSV row per study. Column names
//! carry the metric tag, arm-level statistics, and covariates:
//!
//! - `study_id`, `metric` are always required
//! - continuous arms: `n_treat`, `mean_treat`, `sd_treat`, `n_control`,
//!   `mean_control`, `sd_control`
//! - binary arms: `events_treat`, `total_treat`, `events_control`,
//!   `total_control`
//! - single-arm proportion: `events`, `total`
//! - correlation: `n`, `r`
//! - pre-computed: `effect`, `standard_error`
//!
//! A row with both `effect` and `standard_error` filled loads as a
//! pre-computed record regardless of metric-specific columns. Every other
//! non-empty column becomes a covariate dimension. Blank cells denote absent
//! optional fields; required numeric fields for the declared metric must be
//! present.
//!
//! The parser only checks shape: rows that parse but violate the statistical
//! invariants (say, `sd < 0`) still load and are excluded later by the
//! effect calculator, so the exclusion lands in the report instead of
//! aborting ingestion.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::IngestError;
use crate::study::{ArmCounts, ArmSummary, EffectMetric, StudyData, StudyRecord};

/// Column names consumed by the record schema, never covariates.
const RESERVED: &[&str] = &[
    "study_id",
    "metric",
    "n_treat",
    "mean_treat",
    "sd_treat",
    "n_control",
    "mean_control",
    "sd_control",
    "events_treat",
    "total_treat",
    "events_control",
    "total_control",
    "events",
    "total",
    "n",
    "r",
    "effect",
    "standard_error",
];

/// Read study records from CSV bytes.
pub fn read_records<R: Read>(reader: R) -> Result<Vec<StudyRecord>, IngestError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut records = Vec::new();
    for (i, row) in csv_reader.records().enumerate() {
        let row = row?;
        let row_number = i + 1;
        let fields = RowFields {
            headers: &headers,
            row: &row,
            row_number,
        };
        records.push(parse_row(&fields)?);
    }
    Ok(records)
}

/// Read study records from a CSV file on disk.
pub fn read_records_from_path(path: impl AsRef<Path>) -> Result<Vec<StudyRecord>, IngestError> {
    let file = File::open(path)?;
    read_records(file)
}

struct RowFields<'a> {
    headers: &'a [String],
    row: &'a csv::StringRecord,
    row_number: usize,
}

impl RowFields<'_> {
    /// The cell under a column, `None` when the column is absent or blank.
    fn get(&self, column: &str) -> Option<&str> {
        let idx = self.headers.iter().position(|h| h == column)?;
        self.row.get(idx).filter(|v| !v.is_empty())
    }

    fn require(&self, column: &str) -> Result<&str, IngestError> {
        self.get(column).ok_or_else(|| IngestError::MissingColumn {
            row: self.row_number,
            column: column.to_string(),
        })
    }

    fn require_f64(&self, column: &str) -> Result<f64, IngestError> {
        let raw = self.require(column)?;
        raw.parse::<f64>().map_err(|_| IngestError::InvalidNumber {
            row: self.row_number,
            column: column.to_string(),
            value: raw.to_string(),
        })
    }

    /// Counts are non-negative integers; "12.0" is tolerated, "-3" and
    /// "12.5" are not.
    fn require_count(&self, column: &str) -> Result<u64, IngestError> {
        let raw = self.require(column)?;
        let parsed = raw.parse::<f64>().ok().filter(|v| {
            v.is_finite() && *v >= 0.0 && v.fract() == 0.0 && *v <= u64::MAX as f64
        });
        match parsed {
            Some(v) => Ok(v as u64),
            None => Err(IngestError::InvalidNumber {
                row: self.row_number,
                column: column.to_string(),
                value: raw.to_string(),
            }),
        }
    }
}

fn parse_row(fields: &RowFields<'_>) -> Result<StudyRecord, IngestError> {
    let study_id = fields.require("study_id")?.to_string();
    let metric_tag = fields.require("metric")?;
    let metric: EffectMetric =
        metric_tag
            .parse()
            .map_err(|_| IngestError::UnknownMetric {
                row: fields.row_number,
                value: metric_tag.to_string(),
            })?;

    let data = parse_data(fields, metric)?;

    let mut covariates = BTreeMap::new();
    for header in fields.headers {
        if RESERVED.contains(&header.as_str()) {
            continue;
        }
        if let Some(value) = fields.get(header) {
            covariates.insert(header.clone(), value.to_string());
        }
    }

    Ok(StudyRecord {
        study_id,
        metric,
        data,
        covariates,
    })
}

fn parse_data(fields: &RowFields<'_>, metric: EffectMetric) -> Result<StudyData, IngestError> {
    // A filled effect/standard_error pair wins over raw columns.
    if fields.get("effect").is_some() && fields.get("standard_error").is_some() {
        return Ok(StudyData::Precomputed {
            effect: fields.require_f64("effect")?,
            standard_error: fields.require_f64("standard_error")?,
        });
    }

    match metric {
        EffectMetric::MeanDifference | EffectMetric::StandardizedMeanDifference => {
            Ok(StudyData::Continuous {
                treatment: ArmSummary {
                    n: fields.require_count("n_treat")?,
                    mean: fields.require_f64("mean_treat")?,
                    sd: fields.require_f64("sd_treat")?,
                },
                control: ArmSummary {
                    n: fields.require_count("n_control")?,
                    mean: fields.require_f64("mean_control")?,
                    sd: fields.require_f64("sd_control")?,
                },
            })
        }
        EffectMetric::OddsRatio | EffectMetric::RiskRatio => Ok(StudyData::Binary {
            treatment: ArmCounts {
                events: fields.require_count("events_treat")?,
                total: fields.require_count("total_treat")?,
            },
            control: ArmCounts {
                events: fields.require_count("events_control")?,
                total: fields.require_count("total_control")?,
            },
        }),
        EffectMetric::Proportion => Ok(StudyData::Proportion {
            events: fields.require_count("events")?,
            total: fields.require_count("total")?,
        }),
        EffectMetric::Correlation => Ok(StudyData::Correlation {
            n: fields.require_count("n")?,
            r: fields.require_f64("r")?,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_continuous_row_with_covariates() {
        let csv = "\
study_id,metric,n_treat,mean_treat,sd_treat,n_control,mean_control,sd_control,design,species
ota2019,mean_difference,12,5.1,1.2,11,4.0,1.1,RCT,human
";
        let records = read_records(csv.as_bytes()).unwrap();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.study_id, "ota2019");
        assert_eq!(record.metric, EffectMetric::MeanDifference);
        match &record.data {
            StudyData::Continuous { treatment, control } => {
                assert_eq!(treatment.n, 12);
                assert!((control.mean - 4.0).abs() < 1e-12);
            }
            other => panic!("expected continuous data, got {:?}", other),
        }
        assert_eq!(record.covariates.get("design").unwrap(), "RCT");
        assert_eq!(record.covariates.get("species").unwrap(), "human");
    }

    #[test]
    fn test_blank_covariate_cell_is_absent() {
        let csv = "\
study_id,metric,effect,standard_error,design
a,mean_difference,1.5,0.4,
b,mean_difference,2.0,0.6,RCT
";
        let records = read_records(csv.as_bytes()).unwrap();
        assert!(records[0].covariates.is_empty());
        assert_eq!(records[1].covariates.get("design").unwrap(), "RCT");
    }

    #[test]
    fn test_precomputed_wins_over_raw_columns() {
        let csv = "\
study_id,metric,n_treat,mean_treat,sd_treat,n_control,mean_control,sd_control,effect,standard_error
a,mean_difference,12,5.1,1.2,11,4.0,1.1,1.1,0.45
";
        let records = read_records(csv.as_bytes()).unwrap();
        assert!(matches!(records[0].data, StudyData::Precomputed { .. }));
    }

    #[test]
    fn test_binary_row() {
        let csv = "\
study_id,metric,events_treat,total_treat,events_control,total_control
a,odds_ratio,10,20,5,20
";
        let records = read_records(csv.as_bytes()).unwrap();
        match &records[0].data {
            StudyData::Binary { treatment, .. } => assert_eq!(treatment.events, 10),
            other => panic!("expected binary data, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_required_column() {
        let csv = "\
study_id,metric,n_treat,mean_treat,sd_treat
a,mean_difference,12,5.1,1.2
";
        let err = read_records(csv.as_bytes()).unwrap_err();
        match err {
            IngestError::MissingColumn { row, column } => {
                assert_eq!(row, 1);
                assert_eq!(column, "n_control");
            }
            other => panic!("expected missing column, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_count_is_rejected() {
        let csv = "\
study_id,metric,events,total
a,proportion,-3,100
";
        let err = read_records(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, IngestError::InvalidNumber { .. }));
    }

    #[test]
    fn test_unknown_metric_tag() {
        let csv = "\
study_id,metric,effect,standard_error
a,hazard_ratio,0.8,0.2
";
        let err = read_records(csv.as_bytes()).unwrap_err();
        match err {
            IngestError::UnknownMetric { value, .. } => assert_eq!(value, "hazard_ratio"),
            other => panic!("expected unknown metric, got {:?}", other),
        }
    }
}
