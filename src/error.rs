//! Error types for the analysis pipeline.

use std::fmt;
use std::io;

/// Error raised by the analysis pipeline.
///
/// Per-study and per-slice failures are contained by the engine and surface
/// as explicit markers in the report; `MetaAnalysis::run` only returns an
/// error when no valid study remains for the primary pooling.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// A study record failed validation and was excluded from pooling.
    InvalidStudyData {
        /// Identifier of the failing study.
        study_id: String,
        /// Human-readable validation failure.
        reason: String,
    },
    /// Fewer valid studies than the operation requires.
    InsufficientData {
        /// Number of valid studies available.
        available: usize,
        /// Minimum number required.
        required: usize,
    },
    /// A computed quantity lost statistical meaning (non-positive variance,
    /// singular regression design).
    NumericalDegeneracy {
        /// What degenerated.
        reason: String,
    },
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::InvalidStudyData { study_id, reason } => {
                write!(f, "invalid study data for '{}': {}", study_id, reason)
            }
            AnalysisError::InsufficientData {
                available,
                required,
            } => {
                write!(
                    f,
                    "insufficient data: {} valid studies available, {} required",
                    available, required
                )
            }
            AnalysisError::NumericalDegeneracy { reason } => {
                write!(f, "numerical degeneracy: {}", reason)
            }
        }
    }
}

impl std::error::Error for AnalysisError {}

/// Error raised while reading the tabular input contract.
#[derive(Debug)]
pub enum IngestError {
    /// The underlying CSV reader failed.
    Csv(csv::Error),
    /// Opening the input file failed.
    Io(io::Error),
    /// A required column is missing or blank for the row's declared metric.
    MissingColumn {
        /// 1-based data row number.
        row: usize,
        /// Name of the missing column.
        column: String,
    },
    /// A cell could not be parsed as the expected numeric type.
    InvalidNumber {
        /// 1-based data row number.
        row: usize,
        /// Column the cell belongs to.
        column: String,
        /// The offending cell content.
        value: String,
    },
    /// The metric column holds an unrecognized tag.
    UnknownMetric {
        /// 1-based data row number.
        row: usize,
        /// The offending tag.
        value: String,
    },
}

impl fmt::Display for IngestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestError::Csv(e) => write!(f, "csv error: {}", e),
            IngestError::Io(e) => write!(f, "io error: {}", e),
            IngestError::MissingColumn { row, column } => {
                write!(f, "row {}: missing required column '{}'", row, column)
            }
            IngestError::InvalidNumber { row, column, value } => {
                write!(f, "row {}: column '{}' is not numeric: '{}'", row, column, value)
            }
            IngestError::UnknownMetric { row, value } => {
                write!(f, "row {}: unknown metric '{}'", row, value)
            }
        }
    }
}

impl std::error::Error for IngestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            IngestError::Csv(e) => Some(e),
            IngestError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<csv::Error> for IngestError {
    fn from(e: csv::Error) -> Self {
        IngestError::Csv(e)
    }
}

impl From<io::Error> for IngestError {
    fn from(e: io::Error) -> Self {
        IngestError::Io(e)
    }
}
