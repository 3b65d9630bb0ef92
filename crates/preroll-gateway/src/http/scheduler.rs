use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use preroll_scheduler::ExecutionOutcome;

use crate::app::AppState;
use crate::http::error::{ApiError, ApiResult};

/// POST /scheduler/tick: evaluate schedules now. 409 while another
/// evaluation is running.
pub async fn tick_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<ExecutionOutcome>>> {
    state.engine.tick(Utc::now()).await.map(Json).ok_or_else(|| {
        ApiError::new(
            StatusCode::CONFLICT,
            "TICK_IN_PROGRESS",
            "a scheduler evaluation is already running",
        )
    })
}
