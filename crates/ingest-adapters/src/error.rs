use thiserror::Error;

/// Error taxonomy for the store/transport adapters (§6, §7). Kinds, not
/// wire-level detail: callers branch on these, never on a driver-specific
/// error type.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("already exists")]
    AlreadyExists,
    #[error("transient I/O error: {0}")]
    Transient(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("data shape error: {0}")]
    DataShape(String),
    #[error("fatal: {0}")]
    Fatal(String),
}

impl AdapterError {
    pub fn message(&self) -> String {
        self.to_string()
    }
}
