//! Analysis error types

use thiserror::Error;

use super::report::AnalysisReport;

/// Input could not be turned into a usable table
#[derive(Debug, Error, PartialEq)]
pub enum DataFormatError {
    /// The text ends before the metadata block and header line
    #[error("log has {lines} lines, expected {expected} metadata lines and a header")]
    MissingHeader { lines: usize, expected: usize },

    /// Every candidate row was filtered out
    #[error("no valid data rows after filtering ({candidates} candidate rows, all dropped)")]
    NoDataRows { candidates: usize },

    /// A data row carries a timestamp that is not H:MM:SS
    #[error("line {line}: invalid timestamp '{value}'")]
    InvalidTimestamp { line: u64, value: String },

    /// Log start plus elapsed time falls outside the representable calendar
    #[error("timestamp '{value}' on day {day} is out of range for the log start")]
    TimestampOutOfRange { value: String, day: u32 },

    #[error("CSV read error: {0}")]
    Csv(String),
}

impl From<csv::Error> for DataFormatError {
    fn from(err: csv::Error) -> Self {
        DataFormatError::Csv(err.to_string())
    }
}

/// Chart generation failed
#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("no data to plot in chart '{chart}'")]
    EmptyDataset { chart: &'static str },

    #[error("failed to draw chart '{chart}': {message}")]
    Draw { chart: &'static str, message: String },

    #[error("failed to encode chart '{chart}': {message}")]
    Encode { chart: &'static str, message: String },

    /// The annotated renderer was required but no usable font was found
    #[error("chart font unavailable: {0}")]
    FontUnavailable(String),
}

/// Failure of one analysis run, tagged with the stage that failed
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("parse stage: {0}")]
    DataFormat(#[from] DataFormatError),

    /// Rendering failed after every statistical artifact was computed.
    /// The report is kept so callers can still use it.
    #[error("render stage: {source}")]
    Render {
        #[source]
        source: RenderError,
        report: Box<AnalysisReport>,
    },
}

impl AnalysisError {
    pub fn stage(&self) -> &'static str {
        match self {
            AnalysisError::DataFormat(_) => "parse",
            AnalysisError::Render { .. } => "render",
        }
    }
}
