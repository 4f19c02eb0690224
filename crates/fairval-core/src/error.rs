use thiserror::Error;

/// Validation and contract errors exposed by `fairval-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("ticker is empty")]
    EmptyTicker,
    #[error("ticker '{ticker}' is longer than {max} characters")]
    TickerTooLong { ticker: String, max: usize },
    #[error("ticker '{ticker}' has unexpected character '{ch}' at position {index}")]
    TickerInvalidChar {
        ticker: String,
        ch: char,
        index: usize,
    },
    #[error("ticker '{ticker}' must begin and end with a letter or digit")]
    TickerMalformed { ticker: String },

    #[error("invalid valuation method '{value}', expected one of eps, ocf")]
    InvalidMethod { value: String },
    #[error("invalid reporting period '{value}', expected one of annual, quarterly")]
    InvalidPeriod { value: String },
    #[error("invalid source '{value}', expected one of auto, alphavantage, yahoo, none")]
    InvalidSource { value: String },

    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },
    #[error("date range start {start} is after end {end}")]
    InvertedDateRange { start: String, end: String },

    #[error("multiple must be a positive finite number, got {value}")]
    InvalidMultiple { value: String },

    #[error("field '{field}' must be finite")]
    NonFiniteValue { field: &'static str },
    #[error("field '{field}' must be non-negative")]
    NegativeValue { field: &'static str },

    #[error("request_id must be at least 8 characters")]
    InvalidRequestId,
    #[error("schema_version must match vMAJOR.MINOR.PATCH: '{value}'")]
    InvalidSchemaVersion { value: String },
    #[error("source_chain must contain at least one source")]
    EmptySourceChain,

    #[error("error code cannot be empty")]
    EmptyErrorCode,
    #[error("error message cannot be empty")]
    EmptyErrorMessage,
}
