use thiserror::Error;

/// Input-validation errors raised before any aggregation runs.
#[derive(Debug, Error)]
pub enum GradboardError {
    #[error("Unknown attribute '{0}' (expected one of: {expected})", expected = crate::domain::Attribute::NAMES.join(", "))]
    UnknownAttribute(String),

    #[error("Unknown metric '{0}' (expected 'age' or 'months')")]
    UnknownMetric(String),

    #[error("Column '{0}' not found in dataset header")]
    MissingColumn(String),

    #[error("Invalid institution pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
