//! JSON snapshot files.
//!
//! Writes go to a sibling temp file first and are renamed into place, so a
//! crash mid-write leaves the previous snapshot intact.

use super::Snapshot;
use std::io;
use std::path::{Path, PathBuf};

/// Errors reading or writing snapshot files.
#[derive(thiserror::Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot io: {0}")]
    Io(#[from] io::Error),
    #[error("snapshot encoding: {0}")]
    Json(#[from] serde_json::Error),
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Persist `snapshot` at `path`.
pub async fn save(path: &Path, snapshot: &Snapshot) -> Result<(), SnapshotError> {
    let bytes = serde_json::to_vec_pretty(snapshot)?;
    let tmp = temp_path(path);
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    tracing::debug!(
        path = %path.display(),
        users = snapshot.users.len(),
        admins = snapshot.admins.len(),
        tokens = snapshot.anonymous_usage.len(),
        "snapshot_saved"
    );
    Ok(())
}

/// Read the snapshot at `path`; `None` if the file does not exist.
pub async fn load(path: &Path) -> Result<Option<Snapshot>, SnapshotError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
