use std::sync::Arc;

use axum::{Router, routing};
use tower_http::trace::TraceLayer;

use crate::app_state::AppState;

pub mod tag;

pub const VERSION: &str = "v1.0.0";

/// All routes of the service.
///
/// Trailing slashes are normalized by the caller, see `main`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/tag", routing::post(tag::tag_build_post))
        .route("/ping", routing::get(ping_get))
        .route("/version", routing::get(version_get))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// full endpoint: `/ping`
pub async fn ping_get() -> &'static str {
    "pong\n"
}

/// full endpoint: `/version`
pub async fn version_get() -> String {
    format!("{}\n", VERSION)
}
