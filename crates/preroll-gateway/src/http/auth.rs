//! Bearer token guard for the operator routes.
//!
//! - `auth.mode = "none"`: every request passes.
//! - `auth.mode = "token"`: requires `Authorization: Bearer <token>`. Token
//!   mode without a configured token denies everything.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use preroll_core::config::{AuthConfig, AuthMode};
use sha2::{Digest, Sha256};

use crate::app::AppState;
use crate::http::error::ApiError;

/// Returns true if the request is authorised.
pub fn is_authorized(auth: &AuthConfig, headers: &HeaderMap) -> bool {
    match auth.mode {
        AuthMode::None => true,
        AuthMode::Token => {
            let Some(expected) = auth.token.as_deref().filter(|t| !t.is_empty()) else {
                return false;
            };
            extract_bearer(headers).is_some_and(|provided| {
                Sha256::digest(provided.as_bytes()) == Sha256::digest(expected.as_bytes())
            })
        }
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

pub async fn require_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if is_authorized(&state.config.gateway.auth, request.headers()) {
        next.run(request).await
    } else {
        ApiError::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "Unauthorized. Set 'Authorization: Bearer <your-token>' header.",
        )
        .into_response()
    }
}
