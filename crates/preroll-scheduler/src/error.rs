use thiserror::Error;

/// Errors that can occur within the scheduler subsystem.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The provided schedule definition is invalid. Never persisted.
    #[error("Invalid schedule: {0}")]
    Validation(String),

    /// No schedule with the given ID exists in the store.
    #[error("Schedule not found: {id}")]
    ScheduleNotFound { id: String },

    /// The schedule document was written by a newer version.
    #[error("Unsupported schedule document version {found}")]
    UnsupportedVersion { found: u64 },

    /// The schedule document exists but cannot be understood.
    #[error("Schedule store error: {0}")]
    StoreIo(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SchedulerError {
    /// Short error code string returned to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            SchedulerError::Validation(_) => "VALIDATION_ERROR",
            SchedulerError::ScheduleNotFound { .. } => "SCHEDULE_NOT_FOUND",
            SchedulerError::UnsupportedVersion { .. }
            | SchedulerError::StoreIo(_)
            | SchedulerError::Io(_)
            | SchedulerError::Serialization(_) => "STORE_IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
