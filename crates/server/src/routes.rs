use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    timeout::TimeoutLayer,
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;

use common::types::Health;

use crate::observability;
use crate::state::AppState;

pub mod kv;

/// Path prefixes that route to the same store as the unversioned paths.
pub const API_VERSIONS: &[&str] = &["v1"];

pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn metrics(State(state): State<AppState>) -> (StatusCode, String) {
    let count = state.store.count().await;
    observability::ENTRIES.set(i64::try_from(count).unwrap_or(i64::MAX));
    observability::encode_metrics()
}

/// get/put/keys/count, mounted once per version prefix and once at the root.
fn kv_routes() -> Router<AppState> {
    Router::new()
        .route("/get", get(kv::get_value))
        .route("/put", put(kv::put_values).post(kv::put_values))
        .route("/keys", get(kv::list_keys))
        .route("/count", get(kv::count_keys))
}

/// Build the full application router around an injected store.
pub fn build_router(state: AppState, cors: CorsLayer, request_timeout: Duration) -> Router {
    observability::init();

    let mut app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .merge(kv_routes());
    for version in API_VERSIONS {
        app = app.nest(&format!("/{version}"), kv_routes());
    }

    app.with_state(state)
        .layer(cors)
        .layer(TimeoutLayer::new(request_timeout))
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
