//! Schedule CRUD: thin wrappers over `ScheduleStore`.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use preroll_scheduler::{Schedule, ScheduleSpec};

use crate::app::AppState;
use crate::http::error::{ApiError, ApiResult};

/// Malformed JSON is a validation failure like any other bad spec.
fn spec_from(body: Result<Json<ScheduleSpec>, JsonRejection>) -> ApiResult<ScheduleSpec> {
    body.map(|Json(spec)| spec).map_err(|rejection| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_ERROR",
            rejection.body_text(),
        )
    })
}

/// GET /schedules
pub async fn list_schedules(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Schedule>>> {
    Ok(Json(state.store.list()?))
}

/// POST /schedules
pub async fn create_schedule(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ScheduleSpec>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Schedule>)> {
    let spec = spec_from(body)?;
    let schedule = state.store.create(&spec)?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

/// GET /schedules/{id}
pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Schedule>> {
    Ok(Json(state.store.get(&id)?))
}

/// PUT /schedules/{id}
pub async fn update_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Result<Json<ScheduleSpec>, JsonRejection>,
) -> ApiResult<Json<Schedule>> {
    let spec = spec_from(body)?;
    Ok(Json(state.store.update(&id, &spec)?))
}

/// DELETE /schedules/{id}
pub async fn delete_schedule(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    state.store.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
