use std::sync::Arc;
use std::time::Instant;

use firmware_store::storage::FilesystemArtifactRepository;
use firmware_store::{DistributionService, StatsLedger, StorageError};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DistributionService>,
    pub config: AppConfig,
    /// Process start, for the uptime counter.
    pub started_at: Instant,
}

impl AppState {
    /// Open the artifact directory and stats ledger named by `config`.
    pub async fn new(config: AppConfig) -> Result<Self, StorageError> {
        let repo = FilesystemArtifactRepository::new(
            config.storage.firmware_dir.clone(),
            config.storage.max_artifact_size,
        )
        .await?;
        let ledger = StatsLedger::open(
            config.storage.stats_path.clone(),
            config.stats.history_limit,
        )
        .await;

        let service = DistributionService::new(Arc::new(repo), Arc::new(ledger));

        Ok(Self {
            service: Arc::new(service),
            config,
            started_at: Instant::now(),
        })
    }
}
