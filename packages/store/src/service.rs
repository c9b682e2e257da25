use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{info, instrument};

use crate::filename::{self, ArtifactId, FilenameError, LATEST_ALIAS};
use crate::stats::{AccessEvent, LedgerSnapshot, StatsLedger};
use crate::storage::{ArtifactMetadata, ArtifactRepository, BoxReader, StorageError};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    InvalidName(#[from] FilenameError),

    #[error("File size too large. Maximum {limit} bytes allowed")]
    TooLarge { limit: u64 },

    #[error("Firmware file not found: {0}")]
    NotFound(String),

    #[error("Cannot delete the latest firmware alias")]
    LatestProtected,

    #[error("Storage failure: {0}")]
    Io(#[source] StorageError),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(id) => ServiceError::NotFound(id),
            StorageError::SizeLimitExceeded { limit, .. } => ServiceError::TooLarge { limit },
            StorageError::LatestProtected => ServiceError::LatestProtected,
            other => ServiceError::Io(other),
        }
    }
}

/// What a successful upload produced.
#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub id: ArtifactId,
    pub size: u64,
    pub created_at: DateTime<Utc>,
}

/// A listed artifact, decorated for display.
#[derive(Debug, Clone)]
pub struct ArtifactEntry {
    pub metadata: ArtifactMetadata,
    pub version: Option<String>,
    pub is_latest: bool,
}

/// An opened artifact ready to stream to the caller.
pub struct Retrieval {
    pub metadata: ArtifactMetadata,
    pub reader: BoxReader,
}

/// Aggregate view over the repository and the ledger.
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub total_artifacts: usize,
    pub last_update: Option<DateTime<Utc>>,
    pub ledger: LedgerSnapshot,
    pub disk_usage: u64,
}

/// Upload, listing, retrieval and removal of firmware artifacts.
///
/// The only writer of artifacts, the `latest` alias and access events.
pub struct DistributionService {
    repo: Arc<dyn ArtifactRepository>,
    ledger: Arc<StatsLedger>,
}

impl DistributionService {
    pub fn new(repo: Arc<dyn ArtifactRepository>, ledger: Arc<StatsLedger>) -> Self {
        Self { repo, ledger }
    }

    /// Store a new artifact and promote it to `latest`.
    ///
    /// `raw_filename` is the client-side name; it is checked for the `.bin`
    /// extension but the stored id is derived from the clock. The repository
    /// enforces the size limit while streaming. If anything fails before
    /// promotion the previous `latest` keeps serving.
    #[instrument(skip(self, reader))]
    pub async fn upload(
        &self,
        raw_filename: &str,
        reader: BoxReader,
    ) -> Result<UploadReceipt, ServiceError> {
        filename::check_upload_name(raw_filename)?;

        let id = filename::derive_id(Utc::now());
        let metadata = self.repo.put_stream(&id, reader).await?;
        self.repo.promote(&id).await?;

        info!(id = %id, size = metadata.size_bytes, "Firmware uploaded");

        Ok(UploadReceipt {
            id,
            size: metadata.size_bytes,
            created_at: metadata.created_at,
        })
    }

    /// Open an artifact (or `latest`) and record the access.
    #[instrument(skip(self))]
    pub async fn retrieve(
        &self,
        requested_id: &str,
        caller_tag: Option<&str>,
    ) -> Result<Retrieval, ServiceError> {
        let id = filename::validate(requested_id)?;
        let (metadata, reader) = self.repo.get_stream(&id).await?;

        self.ledger
            .record(AccessEvent {
                artifact_id: id.to_string(),
                timestamp: Utc::now(),
                caller_tag: caller_tag.map(str::to_owned),
                size_bytes: metadata.size_bytes,
            })
            .await;

        if id.is_latest() || caller_tag.is_some_and(|tag| tag.contains("ESP32")) {
            info!(
                id = %id,
                size = metadata.size_bytes,
                caller = caller_tag.unwrap_or_default(),
                "OTA download"
            );
        }

        Ok(Retrieval { metadata, reader })
    }

    /// Delete a stored artifact.
    ///
    /// Only the alias name itself is protected. Deleting the artifact `latest`
    /// was promoted from is allowed: the alias keeps serving its bytes and no
    /// listed entry is flagged latest until the next upload.
    #[instrument(skip(self))]
    pub async fn remove(&self, requested_id: &str) -> Result<ArtifactId, ServiceError> {
        let trimmed = requested_id.trim();
        if trimmed == "latest" || trimmed == LATEST_ALIAS {
            return Err(ServiceError::LatestProtected);
        }

        let id = filename::validate(requested_id)?;
        self.repo.delete(&id).await?;

        info!(id = %id, "Firmware deleted");
        Ok(id)
    }

    /// All artifacts, newest first, with the one `latest` serves flagged.
    pub async fn enumerate(&self) -> Result<Vec<ArtifactEntry>, ServiceError> {
        let listed = self.repo.list().await?;
        let target = self.repo.latest_target().await?;

        let entries = listed
            .into_iter()
            .enumerate()
            .map(|(index, metadata)| {
                let is_latest = match &target {
                    Some(target) => metadata.id == *target,
                    // No pointer record: directory predates it, assume newest.
                    None => index == 0,
                };
                ArtifactEntry {
                    version: filename::parse_version_tag(&metadata.id),
                    metadata,
                    is_latest,
                }
            })
            .collect();

        Ok(entries)
    }

    pub async fn stats(&self) -> Result<StoreStats, ServiceError> {
        let listed = self.repo.list().await?;
        let disk_usage = self.repo.disk_usage().await?;
        let ledger = self.ledger.snapshot().await;

        Ok(StoreStats {
            total_artifacts: listed.len(),
            last_update: listed.first().map(|m| m.created_at),
            ledger,
            disk_usage,
        })
    }

    pub async fn download_history(&self) -> Vec<AccessEvent> {
        self.ledger.snapshot().await.recent_history
    }
}
