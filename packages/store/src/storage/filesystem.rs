use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::error::StorageError;
use super::traits::{ArtifactMetadata, ArtifactRepository, BoxReader};
use crate::filename::{self, ARTIFACT_EXTENSION, ArtifactId, LATEST_ALIAS};

const TEMP_DIR: &str = ".tmp";
const POINTER_FILE: &str = ".latest";

/// Filesystem-backed artifact repository.
///
/// Layout: `{root}/{id}` per artifact, `{root}/latest.bin` for the alias,
/// `{root}/.latest` naming the artifact the alias was promoted from, and
/// `{root}/.tmp/` for in-flight writes.
pub struct FilesystemArtifactRepository {
    root: PathBuf,
    max_size: u64,
    promote_lock: Mutex<()>,
}

impl FilesystemArtifactRepository {
    /// Open (creating if needed) a repository rooted at `root`.
    ///
    /// Temp files left behind by an interrupted process are removed.
    pub async fn new(root: PathBuf, max_size: u64) -> Result<Self, StorageError> {
        fs::create_dir_all(&root).await?;
        fs::create_dir_all(root.join(TEMP_DIR)).await?;

        let repo = Self {
            root,
            max_size,
            promote_lock: Mutex::new(()),
        };
        repo.sweep_temp_dir().await?;
        Ok(repo)
    }

    #[cfg(test)]
    fn root(&self) -> &Path {
        &self.root
    }

    fn artifact_path(&self, id: &ArtifactId) -> PathBuf {
        self.root.join(id.as_str())
    }

    fn pointer_path(&self) -> PathBuf {
        self.root.join(POINTER_FILE)
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.root
            .join(TEMP_DIR)
            .join(uuid::Uuid::new_v4().to_string())
    }

    async fn sweep_temp_dir(&self) -> Result<(), StorageError> {
        let mut entries = fs::read_dir(self.root.join(TEMP_DIR)).await?;
        let mut removed = 0usize;
        while let Some(entry) = entries.next_entry().await? {
            if fs::remove_file(entry.path()).await.is_ok() {
                removed += 1;
            }
        }
        if removed > 0 {
            info!(removed, "Removed stale upload temp files");
        }
        Ok(())
    }

    /// Copy `reader` into `temp_path`, enforcing the size limit. Returns the byte count.
    async fn write_temp(
        &self,
        temp_path: &Path,
        mut reader: BoxReader,
    ) -> Result<u64, StorageError> {
        let mut temp_file = fs::File::create(temp_path).await?;
        let mut buf = vec![0u8; 64 * 1024];
        let mut total_bytes: u64 = 0;

        loop {
            let n = reader.read(&mut buf).await?;
            if n == 0 {
                break;
            }

            total_bytes += n as u64;
            if total_bytes > self.max_size {
                return Err(StorageError::SizeLimitExceeded {
                    actual: total_bytes,
                    limit: self.max_size,
                });
            }

            temp_file.write_all(&buf[..n]).await?;
        }

        temp_file.flush().await?;
        temp_file.sync_all().await?;
        Ok(total_bytes)
    }

    /// Rename a finished temp file over `target`, discarding it on failure.
    async fn publish(temp_path: &Path, target: &Path) -> Result<(), StorageError> {
        if let Err(e) = fs::rename(temp_path, target).await {
            let _ = fs::remove_file(temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Stage a copy of `source` at `temp_path`, hard-linking when the filesystem allows.
    async fn stage_alias(source: &Path, temp_path: &Path) -> std::io::Result<()> {
        match fs::hard_link(source, temp_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(e),
            Err(e) => {
                debug!(error = %e, "Hard link unavailable, copying artifact for alias");
                fs::copy(source, temp_path).await.map(|_| ())
            }
        }
    }

    async fn write_pointer(&self, id: &ArtifactId) -> Result<(), StorageError> {
        let temp_path = self.temp_path();
        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(id.as_str().as_bytes()).await?;
            file.sync_all().await
        }
        .await;
        if let Err(e) = written {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Self::publish(&temp_path, &self.pointer_path()).await
    }
}

fn metadata_from(
    id: ArtifactId,
    meta: &std::fs::Metadata,
) -> Result<ArtifactMetadata, StorageError> {
    let modified: DateTime<Utc> = meta.modified()?.into();
    Ok(ArtifactMetadata {
        id,
        size_bytes: meta.len(),
        created_at: modified,
    })
}

fn not_found_or(err: std::io::Error, id: &ArtifactId) -> StorageError {
    if err.kind() == ErrorKind::NotFound {
        StorageError::NotFound(id.to_string())
    } else {
        err.into()
    }
}

#[async_trait]
impl ArtifactRepository for FilesystemArtifactRepository {
    async fn put_stream(
        &self,
        id: &ArtifactId,
        reader: BoxReader,
    ) -> Result<ArtifactMetadata, StorageError> {
        if id.is_latest() {
            return Err(StorageError::LatestProtected);
        }

        let temp_path = self.temp_path();
        if let Err(e) = self.write_temp(&temp_path, reader).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }

        let target = self.artifact_path(id);
        Self::publish(&temp_path, &target).await?;

        let meta = fs::metadata(&target).await.map_err(|e| not_found_or(e, id))?;
        metadata_from(id.clone(), &meta)
    }

    async fn promote(&self, id: &ArtifactId) -> Result<(), StorageError> {
        if id.is_latest() {
            return Err(StorageError::LatestProtected);
        }

        // Alias bytes and pointer record are replaced as a pair.
        let _guard = self.promote_lock.lock().await;

        let temp_path = self.temp_path();
        if let Err(e) = Self::stage_alias(&self.artifact_path(id), &temp_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(not_found_or(e, id));
        }

        Self::publish(&temp_path, &self.root.join(LATEST_ALIAS)).await?;

        // The alias already serves the new bytes; a missing pointer only
        // affects which listed entry is flagged.
        if let Err(e) = self.write_pointer(id).await {
            warn!(id = %id, error = %e, "Failed to record latest pointer");
            if let Err(e) = fs::remove_file(self.pointer_path()).await
                && e.kind() != ErrorKind::NotFound
            {
                warn!(error = %e, "Failed to remove stale latest pointer");
            }
        }
        Ok(())
    }

    async fn latest_target(&self) -> Result<Option<ArtifactId>, StorageError> {
        let raw = match fs::read_to_string(self.pointer_path()).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                warn!(error = %e, "Ignoring unreadable latest pointer record");
                return Ok(None);
            }
        };

        match filename::validate(&raw) {
            Ok(id) if !id.is_latest() => Ok(Some(id)),
            _ => {
                warn!(pointer = %raw.trim(), "Ignoring malformed latest pointer record");
                Ok(None)
            }
        }
    }

    async fn get_stream(
        &self,
        id: &ArtifactId,
    ) -> Result<(ArtifactMetadata, BoxReader), StorageError> {
        let file = fs::File::open(self.artifact_path(id))
            .await
            .map_err(|e| not_found_or(e, id))?;
        // Metadata of the opened handle, so size matches the bytes streamed even
        // if the name is replaced concurrently.
        let meta = file.metadata().await?;
        let metadata = metadata_from(id.clone(), &meta)?;
        Ok((metadata, Box::new(BufReader::new(file))))
    }

    async fn stat(&self, id: &ArtifactId) -> Result<ArtifactMetadata, StorageError> {
        let meta = fs::metadata(self.artifact_path(id))
            .await
            .map_err(|e| not_found_or(e, id))?;
        metadata_from(id.clone(), &meta)
    }

    async fn list(&self) -> Result<Vec<ArtifactMetadata>, StorageError> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut artifacts = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if !name.ends_with(ARTIFACT_EXTENSION) || name == LATEST_ALIAS {
                continue;
            }
            let Ok(id) = filename::validate(&name) else {
                continue;
            };

            let meta = match entry.metadata().await {
                Ok(meta) => meta,
                // Deleted between read_dir and stat.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            if !meta.is_file() {
                continue;
            }
            artifacts.push(metadata_from(id, &meta)?);
        }

        artifacts.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(artifacts)
    }

    async fn delete(&self, id: &ArtifactId) -> Result<(), StorageError> {
        if id.is_latest() {
            return Err(StorageError::LatestProtected);
        }
        fs::remove_file(self.artifact_path(id))
            .await
            .map_err(|e| not_found_or(e, id))
    }

    async fn disk_usage(&self) -> Result<u64, StorageError> {
        let mut entries = fs::read_dir(&self.root).await?;
        let mut total = 0u64;

        while let Some(entry) = entries.next_entry().await? {
            let is_artifact = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.ends_with(ARTIFACT_EXTENSION));
            if !is_artifact {
                continue;
            }
            match entry.metadata().await {
                Ok(meta) if meta.is_file() => total += meta.len(),
                Ok(_) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        Ok(total)
    }
}
