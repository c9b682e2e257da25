//! Paths used by devices and tooling deployed before the versioned API.
//! Flashed devices poll `/api/firmware/latest.bin`, so these stay stable.

use axum::{
    Router,
    routing::{get, post},
};

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn legacy_routes(config: &AppConfig) -> Router<AppState> {
    Router::new()
        .route(
            "/api/upload",
            post(handlers::firmware::upload_artifact).layer(
                handlers::firmware::upload_body_limit(config.storage.max_artifact_size),
            ),
        )
        .route("/api/firmware/list", get(handlers::firmware::list_artifacts))
        .route(
            "/api/firmware/{filename}",
            get(handlers::firmware::download_artifact).delete(handlers::firmware::delete_artifact),
        )
        .route("/api/stats", get(handlers::stats::get_stats))
}
