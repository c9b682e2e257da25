use serde::Serialize;

/// Where devices should fetch updates from, and upload limits.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfigResponse {
    #[schema(example = "0.0.0.0")]
    pub host: String,
    #[schema(example = 3000)]
    pub port: u16,
    /// URL to flash into devices for OTA updates.
    #[schema(example = "http://192.168.1.20:3000/api/firmware/latest.bin")]
    pub firmware_url: String,
    /// Largest accepted upload in bytes.
    #[schema(example = 52428800)]
    pub max_upload_size: u64,
}
