//! Error Types for the Opportunity Store

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalystError>;

#[derive(Error, Debug)]
pub enum AnalystError {
    /// A field value breaks a record constraint (e.g. confidence out of range)
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Opportunity not found: {0}")]
    NotFound(String),

    /// The storage backend could not complete the call; not retried
    #[error("Storage backend unavailable: {0}")]
    BackendUnavailable(String),

    /// A stored row could not be decoded back into an opportunity
    #[error("Corrupt record {id}: {reason}")]
    CorruptRecord { id: String, reason: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl AnalystError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<sqlx::Error> for AnalystError {
    fn from(err: sqlx::Error) -> Self {
        Self::BackendUnavailable(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AnalystError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::BackendUnavailable(format!("migration failed: {err}"))
    }
}
