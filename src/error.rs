use thiserror::Error;

#[derive(Error, Debug)]
pub enum CashFlowError {
    #[error("Invalid month key '{0}': expected YYYY-MM")]
    InvalidMonthKey(String),

    #[error("Invalid horizon '{0}': expected '6months' or 'yearend'")]
    InvalidHorizon(String),

    #[error("Invalid engine configuration: {0}")]
    InvalidConfig(String),

    #[error("Insufficient history: {months_found} month(s) of transactions, at least 2 required")]
    InsufficientHistory { months_found: usize },

    #[error("Timeline has a gap between {previous} and {next}")]
    TimelineGap { previous: String, next: String },

    #[error("Actual entry for {month} follows a forecast entry")]
    KindOrder { month: String },

    #[error(
        "Forecast balance for {month} starts from {found}, expected {expected} \
         (difference {difference})"
    )]
    BalanceDiscontinuity {
        month: String,
        expected: f64,
        found: f64,
        difference: f64,
    },

    #[error("Store error: {0}")]
    Store(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CashFlowError>;
