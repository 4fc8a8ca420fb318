/// Domain-specific error types for the bond ledger.
/// Only precondition violations and startup failures are hard errors.
/// Pricing failures and persistence warnings are recoverable and are
/// reported back to the caller for display.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Pricing(#[from] PricingFailure),

    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("session closed before the result arrived")]
    SessionClosed,

    #[error("state corruption: {0}")]
    StateCorruption(String),
}

/// A failed call to the remote pricing service. No record is created.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PricingFailure {
    #[error("pricing service unreachable: {0}")]
    Unreachable(String),

    #[error("pricing service error: {status} {body}")]
    Rejected { status: u16, body: String },

    #[error("malformed pricing response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for PricingFailure {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            PricingFailure::Malformed(e.to_string())
        } else {
            PricingFailure::Unreachable(e.to_string())
        }
    }
}

/// Failure of a single key-value operation against the durable store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PersistenceError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("quota exceeded: {needed} bytes needed, {limit} allowed")]
    QuotaExceeded { needed: usize, limit: usize },

    #[error("serialization failed: {0}")]
    Serialize(String),
}

impl From<rusqlite::Error> for PersistenceError {
    fn from(e: rusqlite::Error) -> Self {
        PersistenceError::Unavailable(e.to_string())
    }
}

/// A write-through that did not reach the durable store. The in-memory
/// sequence still reflects the mutation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PersistenceWarning {
    pub key: &'static str,
    pub message: String,
}

impl PersistenceWarning {
    pub fn new(key: &'static str, err: &PersistenceError) -> Self {
        Self {
            key,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for PersistenceWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to persist {:?}: {}", self.key, self.message)
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        LedgerError::Parse(e.to_string())
    }
}

impl From<rusqlite::Error> for LedgerError {
    fn from(e: rusqlite::Error) -> Self {
        LedgerError::Database(e.to_string())
    }
}

impl From<std::io::Error> for LedgerError {
    fn from(e: std::io::Error) -> Self {
        LedgerError::Io(e.to_string())
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(e: reqwest::Error) -> Self {
        LedgerError::Pricing(e.into())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
