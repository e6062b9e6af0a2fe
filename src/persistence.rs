/// Snapshot persistence for [`MemoryStore`].
///
/// The whole database tree is written as one JSON document together with a
/// format version. Writes go to a temporary file first and are then renamed
/// into place, so a crash never leaves a half-written snapshot behind.
///
/// # Usage
///
/// ```ignore
/// persistence::save(&store, &path).await?;
/// let store = persistence::load(&path).await?;
/// ```
use crate::error::{RefDbError, RefDbResult};
use crate::store::MemoryStore;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use tokio::fs;

/// On-disk form of a store.
#[derive(Debug, Serialize, Deserialize)]
struct StoreSnapshot {
    /// Format version for future compatibility
    version: u32,
    /// The database tree (`null` when empty)
    tree: JsonValue,
}

const SNAPSHOT_VERSION: u32 = 1;

/// Save the store to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns `RefDbError::Storage` if the directory or file cannot be written.
pub async fn save(store: &MemoryStore, path: &Path) -> RefDbResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(|e| RefDbError::Storage(format!("Failed to create directory: {}", e)))?;
    }

    let snapshot = StoreSnapshot {
        version: SNAPSHOT_VERSION,
        tree: store.snapshot().await,
    };

    let bytes = serde_json::to_vec_pretty(&snapshot)
        .map_err(|e| RefDbError::Storage(format!("Failed to serialize snapshot: {}", e)))?;

    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, &bytes)
        .await
        .map_err(|e| RefDbError::Storage(format!("Failed to write temporary file: {}", e)))?;

    fs::rename(&temp_path, path)
        .await
        .map_err(|e| RefDbError::Storage(format!("Failed to rename file: {}", e)))?;

    tracing::debug!("saved snapshot to {}", path.display());
    Ok(())
}

/// Load a store previously written by [`save`].
///
/// # Errors
///
/// Returns `RefDbError::Storage` if the file cannot be read or parsed, or was
/// written by an incompatible version.
pub async fn load(path: &Path) -> RefDbResult<MemoryStore> {
    let bytes = fs::read(path)
        .await
        .map_err(|e| RefDbError::Storage(format!("Failed to read snapshot file: {}", e)))?;

    let snapshot: StoreSnapshot = serde_json::from_slice(&bytes)
        .map_err(|e| RefDbError::Storage(format!("Failed to deserialize snapshot: {}", e)))?;

    if snapshot.version != SNAPSHOT_VERSION {
        return Err(RefDbError::Storage(format!(
            "Incompatible snapshot version: {} (expected {})",
            snapshot.version, SNAPSHOT_VERSION
        )));
    }

    Ok(MemoryStore::from_snapshot(snapshot.tree))
}

/// Check if a snapshot file exists at `path`.
pub async fn exists(path: &Path) -> bool {
    fs::metadata(path).await.is_ok()
}
