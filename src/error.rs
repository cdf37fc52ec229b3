use thiserror::Error;

/// Failure inside a record store. Services never let these escape to callers.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("TRANSPORT: {0}")]
    Transport(String),
    /// The backend answered but refused the request, or wrote none of the records.
    #[error("REJECTED: {0}")]
    Rejected(String),
    #[error("DECODE: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Decode(value.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
