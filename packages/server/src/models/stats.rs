use chrono::{DateTime, Utc};
use firmware_store::AccessEvent;
use serde::Serialize;

/// Server and download statistics.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    /// Stored firmware files, excluding `latest.bin`.
    #[schema(example = 3)]
    pub total_firmware_files: usize,
    #[schema(example = 42)]
    pub total_downloads: u64,
    /// Creation time of the newest firmware file.
    pub last_update: Option<DateTime<Utc>>,
    pub last_download: Option<DateTime<Utc>>,
    #[schema(example = "1d 2h 3m")]
    pub server_uptime: String,
    /// Bytes held by `.bin` files, `latest.bin` included.
    #[schema(example = "12.5 MB")]
    pub disk_space_used: String,
}

/// Recent downloads, newest first.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DownloadHistoryResponse {
    pub downloads: Vec<AccessEvent>,
    pub total: usize,
}
