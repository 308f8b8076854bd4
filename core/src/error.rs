use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommissionError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Source unavailable: cannot read {what}: {reason}")]
    SourceUnavailable { what: String, reason: String },

    #[error("Cannot resolve contract '{contract_id}': {reason}")]
    ItemResolution { contract_id: String, reason: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Invalid batch size: must be at least 1")]
    InvalidBatchSize,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type CommissionResult<T> = Result<T, CommissionError>;

/// Reasons a single calculation is rejected before any arithmetic runs.
/// These never escape the calculator; their text becomes the error message
/// of an `error`-status result.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid monthly premium: '{0}' is not a number")]
    UnparseablePremium(String),

    #[error("Invalid monthly premium: value is not finite")]
    NotFinite,

    #[error("Invalid monthly premium: {0} must be greater than zero")]
    NonPositivePremium(f64),

    #[error("Invalid monthly premium: {premium} exceeds the ceiling of {ceiling}")]
    PremiumAboveCeiling { premium: f64, ceiling: f64 },

    #[error("No active commission configuration found for carrier '{0}'")]
    UnknownCarrier(String),
}
