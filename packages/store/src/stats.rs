use std::collections::VecDeque;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

/// One successful artifact retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccessEvent {
    /// Artifact that was served (`latest.bin` for alias downloads).
    #[schema(example = "latest.bin")]
    pub artifact_id: String,
    pub timestamp: DateTime<Utc>,
    /// Free-form caller description, usually the `User-Agent`.
    #[schema(example = "ESP32-http-Update")]
    pub caller_tag: Option<String>,
    #[schema(example = 1048576)]
    pub size_bytes: u64,
}

/// Persisted form of the ledger.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct LedgerDocument {
    total_downloads: u64,
    last_download: Option<DateTime<Utc>>,
    history: VecDeque<AccessEvent>,
}

/// Read-only view of the ledger.
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    pub total_downloads: u64,
    pub last_download: Option<DateTime<Utc>>,
    /// Retained events, newest first.
    pub recent_history: Vec<AccessEvent>,
}

/// Bounded download history plus counters, persisted as a JSON document.
///
/// The in-memory document and the file write are guarded by one mutex, so
/// concurrent retrievals never lose an update. Persistence failures are logged
/// and otherwise ignored.
pub struct StatsLedger {
    path: PathBuf,
    history_limit: usize,
    state: Mutex<LedgerDocument>,
}

impl StatsLedger {
    /// Load the ledger at `path`. A missing or unreadable document starts empty.
    pub async fn open(path: PathBuf, history_limit: usize) -> Self {
        let mut doc = match fs::read(&path).await {
            Ok(raw) => serde_json::from_slice::<LedgerDocument>(&raw).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Stats ledger is corrupt, starting empty");
                LedgerDocument::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => LedgerDocument::default(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read stats ledger, starting empty");
                LedgerDocument::default()
            }
        };

        while doc.history.len() > history_limit {
            doc.history.pop_front();
        }

        Self {
            path,
            history_limit,
            state: Mutex::new(doc),
        }
    }

    /// Append an event, bump the counters, and persist.
    pub async fn record(&self, event: AccessEvent) {
        let mut doc = self.state.lock().await;

        doc.total_downloads += 1;
        doc.last_download = Some(event.timestamp);
        doc.history.push_back(event);
        while doc.history.len() > self.history_limit {
            doc.history.pop_front();
        }

        if let Err(e) = self.persist(&doc).await {
            warn!(path = %self.path.display(), error = %e, "Failed to persist stats ledger");
        }
    }

    pub async fn snapshot(&self) -> LedgerSnapshot {
        let doc = self.state.lock().await;
        LedgerSnapshot {
            total_downloads: doc.total_downloads,
            last_download: doc.last_download,
            recent_history: doc.history.iter().rev().cloned().collect(),
        }
    }

    async fn persist(&self, doc: &LedgerDocument) -> std::io::Result<()> {
        let bytes = serde_json::to_vec_pretty(doc)?;

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).await?;
        }

        let file_name = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("stats.json");
        let temp_path = self
            .path
            .with_file_name(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

        let written = async {
            let mut file = fs::File::create(&temp_path).await?;
            file.write_all(&bytes).await?;
            file.sync_all().await?;
            fs::rename(&temp_path, &self.path).await
        }
        .await;

        if written.is_err() {
            let _ = fs::remove_file(&temp_path).await;
        }
        written
    }
}
