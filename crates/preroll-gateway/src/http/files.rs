use std::sync::Arc;

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use tracing::debug;

use crate::app::AppState;
use crate::http::error::ApiError;

/// GET /files/{category}/{file}: streams one asset so the media server can
/// play URL-form pools. Anything that is not an eligible asset is a 404.
pub async fn serve_asset(
    State(state): State<Arc<AppState>>,
    Path((category, file)): Path<(String, String)>,
    request: Request,
) -> Response {
    let path = match state.gateway.catalog().resolve_file(&category, &file) {
        Ok(path) => path,
        Err(e) => {
            debug!(category = %category, file = %file, err = %e, "asset not served");
            return ApiError::new(StatusCode::NOT_FOUND, "ASSET_NOT_FOUND", e.to_string())
                .into_response();
        }
    };

    match ServeFile::new(path).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}
