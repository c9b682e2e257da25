use std::fmt;

/// Errors that can occur during artifact storage operations.
#[derive(Debug)]
pub enum StorageError {
    /// The requested artifact was not found.
    NotFound(String),
    /// An I/O error occurred.
    Io(std::io::Error),
    /// The artifact exceeds the configured size limit.
    SizeLimitExceeded { actual: u64, limit: u64 },
    /// The operation targeted the reserved `latest.bin` alias.
    LatestProtected,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "artifact not found: {id}"),
            Self::Io(err) => write!(f, "storage IO error: {err}"),
            Self::SizeLimitExceeded { actual, limit } => {
                write!(f, "artifact exceeds size limit ({actual} > {limit} bytes)")
            }
            Self::LatestProtected => write!(f, "the latest alias cannot be modified directly"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}
