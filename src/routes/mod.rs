use axum::{
    Json, Router,
    http::{StatusCode, Uri},
    routing::get,
};
use tower_http::limit::RequestBodyLimitLayer;

use crate::{
    response::{ApiResponse, Meta},
    state::AppState,
};

pub mod accounts;
pub mod doc;
pub mod health;
pub mod merchants;
pub mod params;
pub mod products;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/accounts", accounts::router())
        .nest("/merchants", merchants::router())
        .nest("/products", products::router())
}

/// Full application: health, `/api`, docs and the JSON 404 fallback.
/// Tracing and request-id layers are added by the binary.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", create_api_router())
        .merge(doc::scalar_docs())
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(1024 * 1024))
        .with_state(state)
}

async fn not_found(uri: Uri) -> (StatusCode, Json<ApiResponse<serde_json::Value>>) {
    let body = ApiResponse::success(
        "Not Found",
        serde_json::json!({ "path": uri.path() }),
        Some(Meta::empty()),
    );
    (StatusCode::NOT_FOUND, Json(body))
}
