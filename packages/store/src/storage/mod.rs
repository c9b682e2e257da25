mod error;
mod traits;

pub mod filesystem;

pub use error::StorageError;
pub use filesystem::FilesystemArtifactRepository;
pub use traits::{ArtifactMetadata, ArtifactRepository, BoxReader};
