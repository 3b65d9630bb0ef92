use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use preroll_activation::ActivationGateway;
use preroll_core::PrerollConfig;
use preroll_scheduler::{ScheduleEngine, ScheduleStore};
use preroll_sync::MediaServerClient;

use crate::http;

/// Central shared state, passed as `Arc<AppState>` to all Axum handlers.
pub struct AppState {
    pub config: PrerollConfig,
    pub store: Arc<ScheduleStore>,
    pub gateway: Arc<ActivationGateway>,
    pub engine: Arc<ScheduleEngine>,
    /// Used for status probes and section listing, not for activation.
    pub media_server: Arc<MediaServerClient>,
}

impl AppState {
    pub fn new(
        config: PrerollConfig,
        store: Arc<ScheduleStore>,
        gateway: Arc<ActivationGateway>,
        engine: Arc<ScheduleEngine>,
        media_server: Arc<MediaServerClient>,
    ) -> Self {
        Self {
            config,
            store,
            gateway,
            engine,
            media_server,
        }
    }
}

/// Assemble the full Axum router.
///
/// `/health` and `/files/...` are open so the media server can fetch URL-form
/// pools; everything else sits behind the bearer-token middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let operator = Router::new()
        .route(
            "/schedules",
            get(http::schedules::list_schedules).post(http::schedules::create_schedule),
        )
        .route(
            "/schedules/{id}",
            get(http::schedules::get_schedule)
                .put(http::schedules::update_schedule)
                .delete(http::schedules::delete_schedule),
        )
        .route("/categories", get(http::categories::list_categories))
        .route(
            "/categories/{name}/files",
            get(http::categories::list_category_files),
        )
        .route(
            "/categories/{name}/activate",
            post(http::categories::activate_category),
        )
        .route("/status", get(http::status::status_handler))
        .route(
            "/media-server/sections",
            get(http::status::sections_handler),
        )
        .route("/scheduler/tick", post(http::scheduler::tick_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            http::auth::require_token,
        ));

    Router::new()
        .route("/health", get(http::health::health_handler))
        .route("/files/{category}/{file}", get(http::files::serve_asset))
        .merge(operator)
        .with_state(state)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
