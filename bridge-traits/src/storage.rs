//! Storage Abstractions
//!
//! Contracts for the two byte/metadata stores the core talks to:
//! - [`StorageProvider`]: the authoritative, hierarchical external file store
//!   (paginated listing, metadata lookup, content download)
//! - [`OfflineStore`]: the local durable cache used for offline replication

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// MIME type the external store uses for folders
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// A file or folder as reported by the external store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFile {
    /// Stable identifier assigned by the external store
    pub id: String,
    pub name: String,
    pub mime_type: String,
    /// Parent folder ids (a file may live in several folders)
    pub parent_ids: Vec<String>,
    pub web_view_link: Option<String>,
    pub thumbnail_link: Option<String>,
    pub trashed: bool,
}

impl RemoteFile {
    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}

/// One page of a listing
#[derive(Debug, Clone, Default)]
pub struct RemotePage {
    pub files: Vec<RemoteFile>,
    /// Token for the next page, `None` when the listing is exhausted
    pub next_page_token: Option<String>,
}

/// Downloaded content together with the content type reported by the store
#[derive(Debug, Clone)]
pub struct RemoteContent {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// External hierarchical file store
///
/// Implementations are expected to exclude trashed items from listings, but
/// callers must not rely on it.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::storage::StorageProvider;
///
/// async fn first_page(provider: &dyn StorageProvider) -> Result<usize> {
///     let page = provider.list_children(Some("root"), None).await?;
///     Ok(page.files.len())
/// }
/// ```
#[async_trait]
pub trait StorageProvider: Send + Sync {
    /// List one page of items.
    ///
    /// With `folder_id` set, only direct children of that folder are listed.
    /// With `folder_id` unset, every item visible to the caller's credentials
    /// is listed as a single flat collection.
    async fn list_children(
        &self,
        folder_id: Option<&str>,
        page_token: Option<String>,
    ) -> Result<RemotePage>;

    /// Fetch metadata for a single item
    async fn get_metadata(&self, file_id: &str) -> Result<RemoteFile>;

    /// Download file content, optionally restricted to a byte range
    /// (`bytes=start-end`)
    async fn download(&self, file_id: &str, range: Option<&str>) -> Result<RemoteContent>;
}

/// A fully persisted offline copy of a remote file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedFile {
    pub file_id: String,
    pub bytes: Bytes,
    pub file_name: String,
    pub mime_type: String,
    /// Hex-encoded SHA-256 of `bytes`
    pub sha256: String,
    pub saved_at: DateTime<Utc>,
}

/// Local durable cache keyed by file id
///
/// No network access. An entry becomes visible to `get`/`has` only once all of
/// its bytes are durably written; there is no partially cached state.
#[async_trait]
pub trait OfflineStore: Send + Sync {
    /// Persist an entry, replacing any previous entry for the same id
    async fn put(&self, entry: CachedFile) -> Result<()>;

    /// Retrieve an entry
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    async fn get(&self, file_id: &str) -> Result<Option<CachedFile>>;

    /// Check presence without loading the bytes
    async fn has(&self, file_id: &str) -> Result<bool>;

    /// Remove an entry, returning whether it existed
    async fn remove(&self, file_id: &str) -> Result<bool>;
}
