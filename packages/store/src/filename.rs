use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

/// Extension every stored artifact carries.
pub const ARTIFACT_EXTENSION: &str = ".bin";

/// On-disk name of the reserved alias devices download.
pub const LATEST_ALIAS: &str = "latest.bin";

const ID_PREFIX: &str = "firmware-";
const MAX_FILENAME_LEN: usize = 255;

/// A validated artifact file name (`firmware-<stamp>.bin` or the `latest.bin` alias).
///
/// Only [`derive_id`] and [`validate`] construct one, so holding an `ArtifactId`
/// means the name is safe to join onto the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ArtifactId(String);

impl ArtifactId {
    /// The reserved `latest.bin` alias.
    pub fn latest() -> Self {
        Self(LATEST_ALIAS.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_latest(&self) -> bool {
        self.0 == LATEST_ALIAS
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ArtifactId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Reasons an externally supplied file name is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FilenameError {
    #[error("Filename cannot be empty")]
    Empty,
    #[error("Invalid firmware filename: only .bin files are allowed")]
    WrongExtension,
    #[error("Invalid filename: null bytes are not allowed")]
    NullByte,
    #[error("Invalid filename: control characters are not allowed")]
    ControlCharacter,
    #[error("Invalid filename: path separators are not allowed")]
    ContainsPathSeparator,
    #[error("Invalid filename: '..' is not allowed")]
    PathTraversal,
    #[error("Invalid filename: hidden files (starting with '.') are not allowed")]
    Hidden,
    #[error("Invalid filename: drive or stream qualifiers (':') are not allowed")]
    DriveQualifier,
    #[error("Invalid filename: exceeds {MAX_FILENAME_LEN} bytes")]
    TooLong,
}

/// Derive the artifact id for an upload received at `now`.
///
/// Two uploads landing on the same nanosecond derive the same id; the later
/// write replaces the earlier one.
pub fn derive_id(now: DateTime<Utc>) -> ArtifactId {
    let stamp = now
        .to_rfc3339_opts(SecondsFormat::Nanos, true)
        .replace([':', '.'], "-");
    ArtifactId(format!("{ID_PREFIX}{stamp}{ARTIFACT_EXTENSION}"))
}

/// Validate an untrusted artifact name before it is used as a path component.
///
/// `latest` and `latest.bin` both resolve to the reserved alias.
pub fn validate(candidate: &str) -> Result<ArtifactId, FilenameError> {
    let trimmed = check_flat_name(candidate)?;

    if trimmed == "latest" || trimmed == LATEST_ALIAS {
        return Ok(ArtifactId::latest());
    }

    check_extension(trimmed)?;
    Ok(ArtifactId(trimmed.to_string()))
}

/// Check the client-side name of an uploaded file.
///
/// The name is never used on disk (the stored id is derived from the clock),
/// so only emptiness and the extension matter.
pub fn check_upload_name(raw: &str) -> Result<(), FilenameError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }
    check_extension(trimmed)
}

/// Best-effort `YYYY-MM-DD` tag from the timestamp embedded in a derived id.
pub fn parse_version_tag(id: &ArtifactId) -> Option<String> {
    let stamp = id
        .as_str()
        .strip_prefix(ID_PREFIX)?
        .strip_suffix(ARTIFACT_EXTENSION)?;
    let (date, time) = stamp.split_once('T')?;

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    NaiveTime::parse_from_str(time.get(..8)?, "%H-%M-%S").ok()?;

    Some(date.format("%Y-%m-%d").to_string())
}

fn check_extension(name: &str) -> Result<(), FilenameError> {
    match name.strip_suffix(ARTIFACT_EXTENSION) {
        Some(stem) if !stem.is_empty() => Ok(()),
        _ => Err(FilenameError::WrongExtension),
    }
}

fn check_flat_name(filename: &str) -> Result<&str, FilenameError> {
    let trimmed = filename.trim();

    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }

    if trimmed.contains('\0') {
        return Err(FilenameError::NullByte);
    }

    // Also keeps CRLF out of the Content-Disposition header.
    if trimmed.chars().any(|c| c.is_ascii_control()) {
        return Err(FilenameError::ControlCharacter);
    }

    if trimmed.contains('/') || trimmed.contains('\\') {
        return Err(FilenameError::ContainsPathSeparator);
    }

    if trimmed == ".." {
        return Err(FilenameError::PathTraversal);
    }

    if trimmed.starts_with('.') {
        return Err(FilenameError::Hidden);
    }

    if trimmed.contains(':') {
        return Err(FilenameError::DriveQualifier);
    }

    if trimmed.len() > MAX_FILENAME_LEN {
        return Err(FilenameError::TooLong);
    }

    Ok(trimmed)
}
