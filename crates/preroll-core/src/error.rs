use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrerollError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Category not found: {name}")]
    CategoryNotFound { name: String },

    #[error("Category '{name}' has no eligible video files")]
    CategoryEmpty { name: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PrerollError {
    /// Short error code string returned to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            PrerollError::Config(_) => "CONFIG_ERROR",
            PrerollError::Validation(_) => "VALIDATION_ERROR",
            PrerollError::CategoryNotFound { .. } => "CATEGORY_NOT_FOUND",
            PrerollError::CategoryEmpty { .. } => "CATEGORY_EMPTY",
            PrerollError::Io(_) => "IO_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, PrerollError>;
