use axum::Json;
use axum::extract::State;

use crate::models::system::ServerConfigResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/",
    tag = "System",
    operation_id = "getServerConfig",
    summary = "OTA endpoint settings",
    description = "Returns the URL devices should be configured with to fetch the latest firmware, \
        and the maximum accepted upload size.",
    responses(
        (status = 200, description = "Server settings", body = ServerConfigResponse),
    ),
)]
pub async fn get_server_config(State(state): State<AppState>) -> Json<ServerConfigResponse> {
    let config = &state.config;
    Json(ServerConfigResponse {
        host: config.server.host.clone(),
        port: config.server.port,
        firmware_url: config.firmware_url(),
        max_upload_size: config.storage.max_artifact_size,
    })
}
