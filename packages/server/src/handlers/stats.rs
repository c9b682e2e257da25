use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::models::stats::{DownloadHistoryResponse, StatsResponse};
use crate::state::AppState;
use crate::utils::format::{format_bytes, format_uptime};

#[utoipa::path(
    get,
    path = "/",
    tag = "Stats",
    operation_id = "getStats",
    summary = "Server and download statistics",
    description = "Counts stored firmware, reports the newest upload and the most recent download, \
        process uptime and the disk space taken by firmware files. The download counter is never \
        reset by trimming of the download history.",
    responses(
        (status = 200, description = "Statistics", body = StatsResponse),
        (status = 500, description = "Storage failure (INTERNAL_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state))]
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, AppError> {
    let stats = state.service.stats().await?;

    Ok(Json(StatsResponse {
        total_firmware_files: stats.total_artifacts,
        total_downloads: stats.ledger.total_downloads,
        last_update: stats.last_update,
        last_download: stats.ledger.last_download,
        server_uptime: format_uptime(state.started_at.elapsed()),
        disk_space_used: format_bytes(stats.disk_usage),
    }))
}

#[utoipa::path(
    get,
    path = "/downloads",
    tag = "Stats",
    operation_id = "getDownloadHistory",
    summary = "Recent downloads",
    description = "Returns the retained download history (the most recent 100 downloads by \
        default), newest first.",
    responses(
        (status = 200, description = "Download history", body = DownloadHistoryResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn get_download_history(State(state): State<AppState>) -> Json<DownloadHistoryResponse> {
    let downloads = state.service.download_history().await;
    let total = downloads.len();
    Json(DownloadHistoryResponse { downloads, total })
}
