use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum AnalysisError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("API error: {0}")]
    ApiError(String),
}

/// Failure to read a formatted fundamentals value back as a number.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("value not available")]
    NotAvailable,

    #[error("not a number: {0:?}")]
    Invalid(String),
}
