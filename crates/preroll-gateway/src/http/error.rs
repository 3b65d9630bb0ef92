use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use preroll_core::PrerollError;
use preroll_scheduler::SchedulerError;
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: &'static str,
}

/// Error returned by every operator handler: a status plus `{error, code}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                code,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<PrerollError> for ApiError {
    fn from(e: PrerollError) -> Self {
        let status = match &e {
            PrerollError::Validation(_) => StatusCode::BAD_REQUEST,
            PrerollError::CategoryNotFound { .. } => StatusCode::NOT_FOUND,
            PrerollError::CategoryEmpty { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            _ => {
                error!(err = %e, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiError::new(status, e.code(), e.to_string())
    }
}

impl From<SchedulerError> for ApiError {
    fn from(e: SchedulerError) -> Self {
        let status = match &e {
            SchedulerError::Validation(_) => StatusCode::BAD_REQUEST,
            SchedulerError::ScheduleNotFound { .. } => StatusCode::NOT_FOUND,
            _ => {
                error!(err = %e, "schedule store error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        ApiError::new(status, e.code(), e.to_string())
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
