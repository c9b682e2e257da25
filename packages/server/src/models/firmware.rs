use chrono::{DateTime, Utc};
use firmware_store::service::{ArtifactEntry, UploadReceipt};
use serde::Serialize;

/// Response DTO for a completed upload.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[schema(example = "Firmware uploaded successfully")]
    pub message: String,
    /// Stored artifact id, derived from the upload time.
    #[schema(example = "firmware-2025-03-01T12-30-45-123456789Z.bin")]
    pub id: String,
    /// Size in bytes.
    #[schema(example = 1048576)]
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

impl From<UploadReceipt> for UploadResponse {
    fn from(receipt: UploadReceipt) -> Self {
        Self {
            message: "Firmware uploaded successfully".into(),
            id: receipt.id.into_inner(),
            size: receipt.size,
            created_at: receipt.created_at,
        }
    }
}

/// One stored firmware file.
#[derive(Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FirmwareFile {
    #[schema(example = "firmware-2025-03-01T12-30-45-123456789Z.bin")]
    pub name: String,
    #[schema(example = 1048576)]
    pub size: u64,
    pub upload_date: DateTime<Utc>,
    /// Date tag parsed from the name, when it follows the upload naming scheme.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "2025-03-01")]
    pub version: Option<String>,
    /// Present (and `true`) only on the file `latest.bin` currently serves.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_latest: Option<bool>,
}

impl From<ArtifactEntry> for FirmwareFile {
    fn from(entry: ArtifactEntry) -> Self {
        Self {
            name: entry.metadata.id.into_inner(),
            size: entry.metadata.size_bytes,
            upload_date: entry.metadata.created_at,
            version: entry.version,
            is_latest: entry.is_latest.then_some(true),
        }
    }
}

/// Response DTO for listing firmware files.
#[derive(Serialize, utoipa::ToSchema)]
pub struct FirmwareListResponse {
    /// Files, newest first.
    pub files: Vec<FirmwareFile>,
    pub total: usize,
    #[schema(example = "Found 3 firmware file(s)")]
    pub message: String,
}

impl FirmwareListResponse {
    pub fn new(entries: Vec<ArtifactEntry>) -> Self {
        let files: Vec<FirmwareFile> = entries.into_iter().map(FirmwareFile::from).collect();
        let total = files.len();
        Self {
            files,
            total,
            message: format!("Found {total} firmware file(s)"),
        }
    }
}

/// Response DTO for a deletion.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteResponse {
    #[schema(example = "Firmware file deleted successfully")]
    pub message: String,
    #[schema(example = "firmware-2025-03-01T12-30-45-123456789Z.bin")]
    pub id: String,
}
