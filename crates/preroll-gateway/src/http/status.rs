use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use preroll_core::ActiveCategory;
use preroll_sync::LibrarySection;
use serde::Serialize;
use tracing::warn;

use crate::app::AppState;
use crate::http::error::{ApiError, ApiResult};

#[derive(Debug, Serialize)]
pub struct MediaServerStatus {
    pub url: String,
    pub configured: bool,
    pub reachable: bool,
    pub name: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusReply {
    pub active: Option<ActiveCategory>,
    pub categories: usize,
    pub total_assets: usize,
    pub schedules: usize,
    pub active_schedules: usize,
    pub scheduler_enabled: bool,
    pub tick_interval_secs: u64,
    pub media_server: MediaServerStatus,
}

/// GET /status
pub async fn status_handler(State(state): State<Arc<AppState>>) -> ApiResult<Json<StatusReply>> {
    let catalog = state.gateway.catalog();
    let categories = catalog.list_categories()?;
    let schedules = state.store.list()?;

    Ok(Json(StatusReply {
        active: state.gateway.active(),
        total_assets: catalog.total_assets()?,
        categories: categories.len(),
        active_schedules: schedules.iter().filter(|s| s.is_active).count(),
        schedules: schedules.len(),
        scheduler_enabled: state.config.scheduler.enabled,
        tick_interval_secs: state.config.scheduler.tick_interval_secs,
        media_server: probe_media_server(&state).await,
    }))
}

async fn probe_media_server(state: &AppState) -> MediaServerStatus {
    let client = &state.media_server;
    let mut status = MediaServerStatus {
        url: client.base_url().to_string(),
        configured: client.is_configured(),
        reachable: false,
        name: None,
        error: None,
    };
    if !status.configured {
        return status;
    }
    match client.identity().await {
        Ok(name) => {
            status.reachable = true;
            status.name = Some(name);
        }
        Err(e) => {
            warn!(err = %e, "media server identity probe failed");
            status.reachable = e.http_status().is_some();
            status.error = Some(e.to_string());
        }
    }
    status
}

/// GET /media-server/sections
pub async fn sections_handler(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<LibrarySection>>> {
    if !state.media_server.is_configured() {
        return Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "MEDIA_SERVER_NOT_CONFIGURED",
            "media server token not configured",
        ));
    }
    state.media_server.library_sections().await.map(Json).map_err(|e| {
        warn!(err = %e, "listing library sections failed");
        ApiError::new(StatusCode::BAD_GATEWAY, "MEDIA_SERVER_ERROR", e.to_string())
    })
}
