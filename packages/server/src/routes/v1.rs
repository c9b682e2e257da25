use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/artifacts", artifact_routes(config))
        .nest("/stats", stats_routes())
        .nest("/server-config", system_routes())
}

fn artifact_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::firmware::list_artifacts,
            handlers::firmware::upload_artifact
        ))
        .routes(routes!(
            handlers::firmware::download_artifact,
            handlers::firmware::delete_artifact
        ))
        .layer(handlers::firmware::upload_body_limit(
            config.storage.max_artifact_size,
        ))
}

fn stats_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::stats::get_stats))
        .routes(routes!(handlers::stats::get_download_history))
}

fn system_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::system::get_server_config))
}
