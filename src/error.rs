//! Error taxonomy shared by every ledger operation

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error("identity error: {0}")]
    Identity(String),
    #[error("permission denied for {op}: {reason}")]
    PermissionDenied { op: &'static str, reason: String },
    #[error("record {0} already exists")]
    DuplicateId(String),
    #[error("record {0} not found")]
    NotFound(String),
    #[error("corrupt record at {key}: {reason}")]
    CorruptRecord { key: String, reason: String },
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("amount {requested} exceeds the available limit of {limit}")]
    CapacityExceeded { requested: f64, limit: f64 },
    #[error("store error: {0}")]
    Store(String),
    #[error("encoding error: {0}")]
    Codec(String),
}

impl LedgerError {
    pub(crate) fn denied(op: &'static str, reason: impl Into<String>) -> Self {
        LedgerError::PermissionDenied {
            op,
            reason: reason.into(),
        }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, LedgerError::PermissionDenied { .. })
    }
}

impl From<sled::Error> for LedgerError {
    fn from(value: sled::Error) -> Self {
        LedgerError::Store(value.to_string())
    }
}

impl<E: std::fmt::Display> From<minicbor::encode::Error<E>> for LedgerError {
    fn from(value: minicbor::encode::Error<E>) -> Self {
        LedgerError::Codec(value.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(value: serde_json::Error) -> Self {
        LedgerError::Codec(value.to_string())
    }
}
