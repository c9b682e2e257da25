use std::io::Cursor;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncReadExt};

use super::error::StorageError;
use crate::filename::ArtifactId;

/// Type alias for a boxed async reader.
pub type BoxReader = Box<dyn AsyncRead + Unpin + Send>;

/// Size and creation time of a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactMetadata {
    pub id: ArtifactId,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

/// Durable storage for firmware artifacts and the `latest` alias.
#[async_trait]
pub trait ArtifactRepository: Send + Sync {
    /// Store bytes under `id`.
    async fn put(&self, id: &ArtifactId, data: &[u8]) -> Result<ArtifactMetadata, StorageError> {
        let reader: BoxReader = Box::new(Cursor::new(data.to_vec()));
        self.put_stream(id, reader).await
    }

    /// Store data from an async reader under `id`.
    ///
    /// Readers never observe a partially written artifact: the data lands in a
    /// private temp file first and is renamed into place.
    async fn put_stream(
        &self,
        id: &ArtifactId,
        reader: BoxReader,
    ) -> Result<ArtifactMetadata, StorageError>;

    /// Atomically point the `latest` alias at the bytes stored under `id`.
    async fn promote(&self, id: &ArtifactId) -> Result<(), StorageError>;

    /// The artifact `latest` was last promoted from, if recorded.
    async fn latest_target(&self) -> Result<Option<ArtifactId>, StorageError>;

    /// Retrieve all bytes of an artifact (or of the alias).
    async fn get(&self, id: &ArtifactId) -> Result<Vec<u8>, StorageError> {
        let (_, mut reader) = self.get_stream(id).await?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    /// Open an artifact for streaming, along with the metadata of the opened file.
    async fn get_stream(
        &self,
        id: &ArtifactId,
    ) -> Result<(ArtifactMetadata, BoxReader), StorageError>;

    async fn stat(&self, id: &ArtifactId) -> Result<ArtifactMetadata, StorageError>;

    /// All stored artifacts except the alias, newest first.
    async fn list(&self) -> Result<Vec<ArtifactMetadata>, StorageError>;

    /// Delete an artifact. The alias itself can never be deleted.
    async fn delete(&self, id: &ArtifactId) -> Result<(), StorageError>;

    /// Total bytes held by artifact files, the alias included.
    async fn disk_usage(&self) -> Result<u64, StorageError>;
}
