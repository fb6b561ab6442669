//! File-backed offline cache
//!
//! Layout under the cache directory, keyed by the hex-encoded file id:
//!
//! ```text
//! <key>.bin   raw bytes
//! <key>.json  metadata sidecar (name, mime type, digest, saved_at)
//! ```
//!
//! Both files are written to a temporary name and renamed into place. The
//! sidecar goes last, so an entry exists exactly when its sidecar exists.

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    storage::{CachedFile, OfflineStore},
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct Sidecar {
    file_id: String,
    file_name: String,
    mime_type: String,
    sha256: String,
    size: u64,
    saved_at: DateTime<Utc>,
}

/// [`OfflineStore`] backed by plain files on local disk
pub struct FileOfflineStore {
    root: PathBuf,
}

impl FileOfflineStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Store under the platform cache directory (`<cache>/library-sync/offline`)
    pub fn in_default_location() -> Self {
        let root = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("library-sync")
            .join("offline");
        Self::new(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn key(file_id: &str) -> String {
        hex::encode(file_id.as_bytes())
    }

    fn data_path(&self, file_id: &str) -> PathBuf {
        self.root.join(format!("{}.bin", Self::key(file_id)))
    }

    fn sidecar_path(&self, file_id: &str) -> PathBuf {
        self.root.join(format!("{}.json", Self::key(file_id)))
    }

    async fn write_atomic(&self, target: &Path, contents: &[u8]) -> Result<()> {
        let tmp = self
            .root
            .join(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
        fs::write(&tmp, contents).await?;
        if let Err(e) = fs::rename(&tmp, target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn read_sidecar(&self, file_id: &str) -> Result<Option<Sidecar>> {
        match fs::read(self.sidecar_path(file_id)).await {
            Ok(raw) => serde_json::from_slice(&raw).map(Some).map_err(|e| {
                BridgeError::OperationFailed(format!(
                    "Corrupt offline metadata for {}: {}",
                    file_id, e
                ))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_if_present(path: &Path) -> Result<bool> {
        match fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[async_trait]
impl OfflineStore for FileOfflineStore {
    async fn put(&self, entry: CachedFile) -> Result<()> {
        fs::create_dir_all(&self.root).await?;

        let digest = sha256_hex(&entry.bytes);
        if !entry.sha256.is_empty() && !entry.sha256.eq_ignore_ascii_case(&digest) {
            return Err(BridgeError::OperationFailed(format!(
                "Digest mismatch while caching {}",
                entry.file_id
            )));
        }

        // An existing sidecar would point at the old bytes while we swap them
        Self::remove_if_present(&self.sidecar_path(&entry.file_id)).await?;
        self.write_atomic(&self.data_path(&entry.file_id), &entry.bytes)
            .await?;

        let sidecar = Sidecar {
            file_id: entry.file_id.clone(),
            file_name: entry.file_name,
            mime_type: entry.mime_type,
            sha256: digest,
            size: entry.bytes.len() as u64,
            saved_at: entry.saved_at,
        };
        let raw = serde_json::to_vec_pretty(&sidecar).map_err(|e| {
            BridgeError::OperationFailed(format!("Failed to encode offline metadata: {}", e))
        })?;
        self.write_atomic(&self.sidecar_path(&entry.file_id), &raw)
            .await?;

        debug!(file_id = %entry.file_id, size = sidecar.size, "Stored offline copy");
        Ok(())
    }

    async fn get(&self, file_id: &str) -> Result<Option<CachedFile>> {
        let Some(sidecar) = self.read_sidecar(file_id).await? else {
            return Ok(None);
        };

        let bytes = match fs::read(self.data_path(file_id)).await {
            Ok(bytes) => Bytes::from(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(file_id, "Offline metadata without data, dropping entry");
                self.remove(file_id).await?;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if sha256_hex(&bytes) != sidecar.sha256 {
            warn!(file_id, "Offline copy failed digest check, dropping entry");
            self.remove(file_id).await?;
            return Ok(None);
        }

        Ok(Some(CachedFile {
            file_id: sidecar.file_id,
            bytes,
            file_name: sidecar.file_name,
            mime_type: sidecar.mime_type,
            sha256: sidecar.sha256,
            saved_at: sidecar.saved_at,
        }))
    }

    async fn has(&self, file_id: &str) -> Result<bool> {
        Ok(fs::try_exists(self.sidecar_path(file_id)).await?)
    }

    async fn remove(&self, file_id: &str) -> Result<bool> {
        let had_sidecar = Self::remove_if_present(&self.sidecar_path(file_id)).await?;
        let had_data = Self::remove_if_present(&self.data_path(file_id)).await?;
        Ok(had_sidecar || had_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> FileOfflineStore {
        let dir = std::env::temp_dir().join(format!("offline-store-{}", uuid::Uuid::new_v4()));
        FileOfflineStore::new(dir)
    }

    fn entry(id: &str, bytes: &'static [u8]) -> CachedFile {
        CachedFile {
            file_id: id.to_string(),
            bytes: Bytes::from_static(bytes),
            file_name: "Autumn Leaves.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            sha256: String::new(),
            saved_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_put_get_has() {
        let store = temp_store();
        assert!(!store.has("f1").await.unwrap());

        store.put(entry("f1", b"chart bytes")).await.unwrap();

        assert!(store.has("f1").await.unwrap());
        let cached = store.get("f1").await.unwrap().unwrap();
        assert_eq!(&cached.bytes[..], b"chart bytes");
        assert_eq!(cached.file_name, "Autumn Leaves.pdf");
        assert_eq!(cached.sha256, sha256_hex(b"chart bytes"));

        let _ = fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn test_missing_entry() {
        let store = temp_store();
        assert!(store.get("nope").await.unwrap().is_none());
        assert!(!store.remove("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_replaces_previous_entry() {
        let store = temp_store();
        store.put(entry("f1", b"old")).await.unwrap();
        store.put(entry("f1", b"new")).await.unwrap();

        let cached = store.get("f1").await.unwrap().unwrap();
        assert_eq!(&cached.bytes[..], b"new");

        let _ = fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn test_rejects_wrong_digest() {
        let store = temp_store();
        let mut bad = entry("f1", b"payload");
        bad.sha256 = "00".repeat(32);

        assert!(store.put(bad).await.is_err());
        assert!(!store.has("f1").await.unwrap());

        let _ = fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn test_corrupted_data_is_dropped() {
        let store = temp_store();
        store.put(entry("f1", b"payload")).await.unwrap();
        fs::write(store.data_path("f1"), b"tampered").await.unwrap();

        assert!(store.get("f1").await.unwrap().is_none());
        assert!(!store.has("f1").await.unwrap());

        let _ = fs::remove_dir_all(store.root()).await;
    }

    #[tokio::test]
    async fn test_ids_with_path_separators() {
        let store = temp_store();
        store.put(entry("../etc/passwd", b"x")).await.unwrap();

        assert!(store.has("../etc/passwd").await.unwrap());
        assert!(store.data_path("../etc/passwd").starts_with(store.root()));

        let _ = fs::remove_dir_all(store.root()).await;
    }
}
