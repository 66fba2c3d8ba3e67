use chrono::{NaiveDate, NaiveDateTime};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttributionError {
    /// Unknown or missing configuration key, or an unsupported rounding method.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Requested range lies outside the window covered by both schedule and spend data.
    #[error(
        "Requested range {requested_start} to {requested_end} is outside the data range \
         {coverage_start} to {coverage_end}"
    )]
    DateRange {
        requested_start: NaiveDate,
        requested_end: NaiveDate,
        coverage_start: NaiveDate,
        coverage_end: NaiveDate,
    },

    #[error("Invalid date range: start {start} is after end {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("No {0} data available to attribute")]
    NoCoverage(&'static str),

    /// The previous output file could not be removed or the new one created.
    #[error("Cannot write output file {}: {source}", path.display())]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed schedule at row {row}, column '{column}': {message}")]
    MalformedSchedule {
        row: usize,
        column: String,
        message: String,
    },

    #[error("Malformed spend record at line {line}: {message}")]
    MalformedSpend { line: usize, message: String },

    /// Only raised under the strict missing-data policy.
    #[error("No cumulative spend recorded for {presenter}'s interval {start} to {end}")]
    MissingAttributionData {
        presenter: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
    },
}

impl AttributionError {
    pub fn is_date_range(&self) -> bool {
        matches!(
            self,
            AttributionError::DateRange { .. }
                | AttributionError::InvertedRange { .. }
                | AttributionError::NoCoverage(_)
        )
    }
}

pub type Result<T, E = AttributionError> = std::result::Result<T, E>;
