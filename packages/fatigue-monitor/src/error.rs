use thiserror::Error;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frame on line {line}: {source}")]
    Parse {
        line: u64,
        #[source]
        source: serde_json::Error,
    },

    #[error("alarm notification failed: {0}")]
    Notify(String),
}

impl MonitorError {
    /// Per-line problems the session can continue past.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, MonitorError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;
