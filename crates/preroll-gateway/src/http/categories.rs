use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use preroll_core::{ActivationResult, AssetRef};
use serde::Serialize;

use crate::app::AppState;
use crate::http::error::ApiResult;

#[derive(Debug, Serialize)]
pub struct CategoryView {
    pub name: String,
    pub file_count: usize,
    pub is_active: bool,
}

/// Activation result plus the error code of its remote half, if any.
#[derive(Debug, Serialize)]
pub struct ActivationReply {
    #[serde(flatten)]
    pub result: ActivationResult,
    pub code: Option<&'static str>,
}

/// GET /categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<CategoryView>>> {
    let active = state.gateway.active().map(|a| a.category);
    let categories = state
        .gateway
        .catalog()
        .list_categories()?
        .into_iter()
        .map(|c| CategoryView {
            is_active: active.as_deref() == Some(c.name.as_str()),
            name: c.name,
            file_count: c.file_count,
        })
        .collect();
    Ok(Json(categories))
}

/// GET /categories/{name}/files
pub async fn list_category_files(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<Vec<AssetRef>>> {
    Ok(Json(state.gateway.catalog().list_files(&name)?))
}

/// POST /categories/{name}/activate
///
/// 200 whenever the category became active locally, even if the media
/// server did not accept it; `code` is `REMOTE_SYNC_FAILED` in that case.
pub async fn activate_category(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<Json<ActivationReply>> {
    let result = state.gateway.activate(&name).await?;
    let code = result.remote_code();
    Ok(Json(ActivationReply { result, code }))
}
