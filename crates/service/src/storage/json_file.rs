use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt};
use tracing::{debug, info};

use super::{Collections, Snapshot, StorageBackend, SNAPSHOT_VERSION};
use crate::errors::ServiceError;

/// JSON file-backed storage.
///
/// Persists every collection into a single versioned JSON document and
/// rewrites it wholesale on each flush. Writes go to a sibling `.tmp` file
/// that is synced and renamed over the target, so a crash mid-write leaves
/// the previous snapshot in place.
#[derive(Clone, Debug)]
pub struct JsonFileStorage {
    file_path: PathBuf,
}

impl JsonFileStorage {
    /// Bind to a path, creating parent directories. The file itself is
    /// written on first flush.
    pub async fn new<P: Into<PathBuf>>(path: P) -> Result<Self, ServiceError> {
        let file_path = path.into();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await.map_err(ServiceError::storage)?;
        }
        Ok(Self { file_path })
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.file_path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[async_trait]
impl StorageBackend for JsonFileStorage {
    async fn load(&self) -> Result<Collections, ServiceError> {
        let bytes = match fs::read(&self.file_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.file_path.display(), "no snapshot on disk; starting empty");
                return Ok(Collections::new());
            }
            Err(e) => return Err(ServiceError::storage(e)),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Collections::new());
        }

        let snapshot: Snapshot = serde_json::from_slice(&bytes).map_err(|e| {
            ServiceError::Storage(format!("cannot parse {}: {e}", self.file_path.display()))
        })?;
        if snapshot.version > SNAPSHOT_VERSION {
            return Err(ServiceError::Storage(format!(
                "snapshot version {} is newer than supported version {SNAPSHOT_VERSION}",
                snapshot.version
            )));
        }
        debug!(
            path = %self.file_path.display(),
            collections = snapshot.collections.len(),
            "snapshot loaded"
        );
        Ok(snapshot.collections)
    }

    async fn flush(&self, collections: &Collections) -> Result<(), ServiceError> {
        #[derive(serde::Serialize)]
        struct SnapshotRef<'a> {
            version: u32,
            collections: &'a Collections,
        }

        let data = serde_json::to_vec_pretty(&SnapshotRef { version: SNAPSHOT_VERSION, collections })
            .map_err(ServiceError::storage)?;

        let tmp = self.tmp_path();
        let staged: std::io::Result<()> = async {
            let mut file = fs::File::create(&tmp).await?;
            file.write_all(&data).await?;
            file.sync_all().await?;
            drop(file);
            fs::rename(&tmp, &self.file_path).await
        }
        .await;
        if let Err(e) = staged {
            // leave no partial snapshot behind, whichever step failed
            let _ = fs::remove_file(&tmp).await;
            return Err(ServiceError::storage(e));
        }
        debug!(path = %self.file_path.display(), bytes = data.len(), "snapshot flushed");
        Ok(())
    }
}
