use std::path::PathBuf;

use thiserror::Error;

pub type CotResult<T> = Result<T, CotError>;

#[derive(Debug, Error)]
pub enum CotError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Data(#[from] DataError),

    #[error(transparent)]
    Io(#[from] IoError),
}

impl CotError {
    /// Structural errors halt the pipeline before any metric is derived.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Schema(_) | Self::Source(_))
    }
}

/// Errors raised while verifying the header layout of a raw report.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Missing required columns: {}", .names.join(", "))]
    MissingColumns { names: Vec<String> },

    #[error("Duplicate column after header normalization: '{0}'")]
    DuplicateColumn(String),
}

/// Errors raised when the input file cannot be opened or parsed at all.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Source file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Unreadable source '{}': {cause}", .path.display())]
    Unreadable { path: PathBuf, cause: String },

    #[error("Unsupported source format: {0}")]
    UnsupportedFormat(String),
}

/// Errors related to pipeline parameters supplied by the caller.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid rolling window: {0} (must be at least 5 weeks)")]
    InvalidRollingWindow(u16),

    #[error("Invalid month-over-month clip bound: {0} (must be finite and positive)")]
    InvalidClipBound(f64),

    #[error("Invalid intensity tiers: {0}")]
    InvalidIntensityTiers(String),

    #[error("Invalid sentiment epsilon: {0}")]
    InvalidEpsilon(f64),

    #[error("Invalid lookback: {0} (must be at least 1 period)")]
    InvalidLookback(usize),

    #[error("Invalid date range (start: {start}, end: {end}): start must not be after end")]
    InvalidDateRange { start: String, end: String },

    #[error("Failed to encode pipeline configuration")]
    Encoding(#[from] postcard::Error),
}

/// Errors related to building or reshaping data frames.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("Data frame error: {0}")]
    DataFrame(String),

    #[error("Column '{column}' has unexpected type: {msg}")]
    ColumnType { column: String, msg: String },
}

/// Errors related to exporting reports.
#[derive(Debug, Error)]
pub enum IoError {
    #[error("IO operation failed")]
    Io(#[from] std::io::Error),

    #[error("Serialization failed")]
    Json(#[from] serde_json::Error),

    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Failed to write data: {0}")]
    WriteFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_message_lists_every_name() {
        let err = SchemaError::MissingColumns {
            names: vec![
                "Commercial Positions-Long (All)".to_string(),
                "Commercial Positions-Short (All)".to_string(),
            ],
        };
        assert_eq!(
            err.to_string(),
            "Missing required columns: Commercial Positions-Long (All), Commercial Positions-Short (All)"
        );
    }

    #[test]
    fn test_structural_classification() {
        let schema: CotError = SchemaError::DuplicateColumn("x".to_string()).into();
        let source: CotError = SourceError::UnsupportedFormat("xlsx".to_string()).into();
        let config: CotError = ConfigError::InvalidRollingWindow(0).into();
        assert!(schema.is_structural());
        assert!(source.is_structural());
        assert!(!config.is_structural());
    }
}
