//! Path utilities for generated outputs and clip lookup

use std::path::{Component, Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::domain::errors::DomainError;

/// Extension of every rendered or exported file
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Collision-free output path `<dir>/<prefix>_<uuid>.mp4`
pub fn unique_output(dir: &Path, prefix: &str) -> PathBuf {
    dir.join(format!("{}_{}.{}", prefix, Uuid::new_v4(), OUTPUT_EXTENSION))
}

/// Resolve an export filename against the media directory.
///
/// Names that climb out of the directory are refused.
pub fn resolve_clip(media_dir: &Path, filename: &str) -> Option<PathBuf> {
    let name = Path::new(filename.trim());
    if name.as_os_str().is_empty() || name.components().any(|c| c == Component::ParentDir) {
        return None;
    }
    Some(media_dir.join(name))
}

/// Create a directory and its parents if missing
pub async fn ensure_dir(dir: &Path) -> Result<(), DomainError> {
    tokio::fs::create_dir_all(dir).await.map_err(|e| {
        DomainError::Io(format!("Failed to create directory {}: {}", dir.display(), e))
    })
}

/// Whether `path` is an existing regular file
pub async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}

/// Remove a file left behind by a failed run; missing files are fine
pub async fn remove_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => debug!(path = %path.display(), error = %e, "Could not remove partial output"),
    }
}
