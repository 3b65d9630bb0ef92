use thiserror::Error;

/// Errors raised while talking to the media server.
///
/// These never escape the strategy chain; each one is folded into a failed
/// attempt so the chain can move on.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl SyncError {
    /// HTTP status attached to this error, if the server answered at all.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            SyncError::Api { status, .. } => Some(*status),
            SyncError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
