//! Integration tests for the HTTP API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use preroll_activation::ActivationGateway;
use preroll_core::config::{AuthConfig, AuthMode};
use preroll_core::{AssetCatalog, AssetRef, CategoryActivator, PrerollConfig, SyncAttemptResult};
use preroll_gateway::{build_router, AppState};
use preroll_scheduler::{ScheduleEngine, ScheduleStore};
use preroll_sync::{MediaServerClient, RemoteSync, SyncReport};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

const TOKEN: &str = "test-token";

/// Media server that rejects every strategy.
struct Unauthorized;

#[async_trait]
impl RemoteSync for Unauthorized {
    async fn apply(&self, _assets: &[AssetRef]) -> SyncReport {
        let failure = SyncAttemptResult::failure("preroll-id", Some(401), "Unauthorized");
        SyncReport {
            result: failure.clone(),
            attempts: vec![failure],
        }
    }
}

struct TestApp {
    router: Router,
    _library: TempDir,
    _data: TempDir,
}

fn test_app() -> TestApp {
    let library = TempDir::new().unwrap();
    for (category, files) in [
        ("Christmas", &["snow.mp4", "tree.mkv", "notes.txt"][..]),
        ("Halloween", &["ghost.mp4"][..]),
        ("Empty", &[][..]),
    ] {
        let dir = library.path().join(category);
        std::fs::create_dir_all(&dir).unwrap();
        for file in files {
            std::fs::write(dir.join(file), b"fake video bytes").unwrap();
        }
    }
    let data = TempDir::new().unwrap();

    let mut config = PrerollConfig::default();
    config.gateway.auth = AuthConfig {
        mode: AuthMode::Token,
        token: Some(TOKEN.to_string()),
    };
    config.library.path = library.path().to_path_buf();
    config.storage.data_dir = data.path().to_path_buf();
    config.scheduler.enabled = false;

    let store = Arc::new(ScheduleStore::open(config.storage.schedules_path()).unwrap());
    let gateway = Arc::new(ActivationGateway::new(
        AssetCatalog::new(library.path()),
        Arc::new(Unauthorized),
    ));
    let activator: Arc<dyn CategoryActivator> = gateway.clone();
    let engine = Arc::new(ScheduleEngine::new(
        store.clone(),
        activator,
        Duration::from_secs(60),
    ));
    let media_server = Arc::new(MediaServerClient::new(&config.media_server).unwrap());

    let state = Arc::new(AppState::new(config, store, gateway, engine, media_server));
    TestApp {
        router: build_router(state),
        _library: library,
        _data: data,
    }
}

fn authed(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

fn spec(description: &str, category: &str, recurrence: &str) -> Value {
    json!({
        "description": description,
        "category_name": category,
        "start_date": "2020-01-01T00:00:00Z",
        "recurrence": recurrence,
    })
}

// ============================================================================
// Health and auth
// ============================================================================

#[tokio::test]
async fn health_is_open() {
    let app = test_app();

    let (status, json) = send(
        &app,
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["scheduler_enabled"], false);
}

#[tokio::test]
async fn operator_routes_require_token() {
    let app = test_app();

    let (status, json) = send(
        &app,
        Request::get("/schedules").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["code"], "UNAUTHORIZED");

    let wrong = Request::get("/schedules")
        .header(header::AUTHORIZATION, "Bearer nope")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Schedules
// ============================================================================

#[tokio::test]
async fn schedule_crud() {
    let app = test_app();

    let (status, created) = send(
        &app,
        authed("POST", "/schedules", Some(spec("Xmas", "Christmas", "yearly"))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["category_name"], "Christmas");

    let (status, list) = send(&app, authed("GET", "/schedules", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (status, updated) = send(
        &app,
        authed(
            "PUT",
            &format!("/schedules/{id}"),
            Some(spec("Spooky", "Halloween", "daily")),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["id"], id.as_str());
    assert_eq!(updated["category_name"], "Halloween");

    let (status, fetched) = send(&app, authed("GET", &format!("/schedules/{id}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["description"], "Spooky");

    let (status, _) = send(&app, authed("DELETE", &format!("/schedules/{id}"), None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, json) = send(&app, authed("GET", &format!("/schedules/{id}"), None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "SCHEDULE_NOT_FOUND");
}

#[tokio::test]
async fn invalid_schedules_are_rejected() {
    let app = test_app();

    let (status, json) = send(
        &app,
        authed("POST", "/schedules", Some(spec("Bad", "Christmas", "fortnightly"))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let (status, json) = send(
        &app,
        authed("POST", "/schedules", Some(json!({ "description": "no dates" }))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["code"], "VALIDATION_ERROR");

    let (_, list) = send(&app, authed("GET", "/schedules", None)).await;
    assert!(list.as_array().unwrap().is_empty());
}

// ============================================================================
// Categories and activation
// ============================================================================

#[tokio::test]
async fn categories_list_counts_only_videos() {
    let app = test_app();

    let (status, json) = send(&app, authed("GET", "/categories", None)).await;
    assert_eq!(status, StatusCode::OK);

    let christmas = json
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Christmas")
        .unwrap();
    assert_eq!(christmas["file_count"], 2);
    assert_eq!(christmas["is_active"], false);

    let (status, files) = send(&app, authed("GET", "/categories/Christmas/files", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(files.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn activation_reports_remote_failure_separately() {
    let app = test_app();

    let (status, json) = send(
        &app,
        authed("POST", "/categories/Halloween/activate", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "local_only");
    assert_eq!(json["local_success"], true);
    assert_eq!(json["remote_success"], false);
    assert_eq!(json["code"], "REMOTE_SYNC_FAILED");
    assert_eq!(json["attempts"][0]["http_status"], 401);

    let (_, categories) = send(&app, authed("GET", "/categories", None)).await;
    let halloween = categories
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Halloween")
        .unwrap();
    assert_eq!(halloween["is_active"], true);

    let (_, status_json) = send(&app, authed("GET", "/status", None)).await;
    assert_eq!(status_json["active"]["category"], "Halloween");
    assert_eq!(status_json["total_assets"], 3);
    assert_eq!(status_json["media_server"]["configured"], false);
}

#[tokio::test]
async fn activation_rejects_unknown_and_empty_categories() {
    let app = test_app();

    let (status, json) = send(&app, authed("POST", "/categories/Easter/activate", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "CATEGORY_NOT_FOUND");

    let (status, json) = send(&app, authed("POST", "/categories/Empty/activate", None)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json["code"], "CATEGORY_EMPTY");

    let (_, status_json) = send(&app, authed("GET", "/status", None)).await;
    assert!(status_json["active"].is_null());
}

#[tokio::test]
async fn sections_need_a_configured_media_server() {
    let app = test_app();

    let (status, json) = send(&app, authed("GET", "/media-server/sections", None)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["code"], "MEDIA_SERVER_NOT_CONFIGURED");
}

// ============================================================================
// Asset serving
// ============================================================================

#[tokio::test]
async fn files_are_served_without_auth() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get("/files/Christmas/snow.mp4")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"fake video bytes");

    let (status, json) = send(
        &app,
        Request::get("/files/Christmas/notes.txt")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["code"], "ASSET_NOT_FOUND");
}

// ============================================================================
// Scheduler
// ============================================================================

#[tokio::test]
async fn manual_tick_fires_due_schedule() {
    let app = test_app();

    let (status, _) = send(
        &app,
        authed("POST", "/schedules", Some(spec("Xmas", "Christmas", "once"))),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, fired) = send(&app, authed("POST", "/scheduler/tick", None)).await;
    assert_eq!(status, StatusCode::OK);
    let fired = fired.as_array().unwrap();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0]["category_name"], "Christmas");
    assert_eq!(fired[0]["status"], "local_only");

    let (_, again) = send(&app, authed("POST", "/scheduler/tick", None)).await;
    assert!(again.as_array().unwrap().is_empty());

    let (_, list) = send(&app, authed("GET", "/schedules", None)).await;
    assert!(!list[0]["last_executed"].is_null());
}
