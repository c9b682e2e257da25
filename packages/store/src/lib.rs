pub mod config;
pub mod filename;
pub mod service;
pub mod stats;
pub mod storage;

pub use config::{StatsConfig, StorageConfig};
pub use filename::{ArtifactId, FilenameError};
pub use service::{DistributionService, ServiceError};
pub use stats::{AccessEvent, LedgerSnapshot, StatsLedger};
pub use storage::{ArtifactMetadata, ArtifactRepository, StorageError};
