//! Router composition.

use std::time::Duration;

use auth::{AccountRepository, AuthAppState, admin_router, auth_router};
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracker::{TrackerAppState, TrackerStore, tracker_router};

use crate::config::CorsOrigins;

/// `/health` at the root, everything else under `/api/v1`.
pub fn build_app<R, S>(auth: AuthAppState<R>, tracker: TrackerAppState<S>) -> Router
where
    R: AccountRepository + Send + Sync + 'static,
    S: TrackerStore,
{
    let api = Router::new()
        .nest("/auth", auth_router(auth.clone()))
        .nest("/admin", admin_router(auth.clone()))
        .merge(tracker_router(tracker, auth));

    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api)
}

pub fn with_middleware(app: Router, cors: &CorsOrigins, timeout: Option<Duration>) -> Router {
    let app = app.layer(cors_layer(cors)).layer(TraceLayer::new_for_http());
    match timeout {
        Some(limit) => app.layer(TimeoutLayer::new(limit)),
        None => app,
    }
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let origin = match origins {
        CorsOrigins::Any => AllowOrigin::any(),
        CorsOrigins::List(list) => AllowOrigin::list(
            list.iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok()),
        ),
    };
    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
