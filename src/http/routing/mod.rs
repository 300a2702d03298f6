use std::time::Duration;

use axum::http::{Method, StatusCode, Uri};
use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Wraps the todo routes with the service-level endpoints and middleware.
/// `request_timeout` bounds each request; timing out drops the in-flight store call.
pub fn app(router: Router, request_timeout: Duration) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/health", get(health))
        .merge(router)
        .fallback(route_not_found)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
}

async fn welcome() -> Json<Value> {
    Json(json!({
        "message": "Todo App API Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": chrono::Utc::now() }))
}

async fn route_not_found(method: Method, uri: Uri) -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found", "message": format!("Cannot {method} {uri}") })),
    )
}
