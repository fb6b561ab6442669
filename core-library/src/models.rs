//! # Index Data Models
//!
//! - [`FileDescriptor`]: a file as the external store reports it
//! - [`IndexEntry`]: the persisted projection of a descriptor
//! - [`Ghost`]: an index entry whose file no longer exists externally
//!
//! The external store's file id is the primary key everywhere; it is never
//! re-keyed.

use bridge_traits::storage::RemoteFile;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A file as reported by the external store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub parents: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_link: Option<String>,
}

impl FileDescriptor {
    pub fn new(id: impl Into<String>, name: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_type: mime_type.into(),
            parents: BTreeSet::new(),
            web_view_link: None,
            thumbnail_link: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parents.insert(parent_id.into());
        self
    }
}

impl From<RemoteFile> for FileDescriptor {
    fn from(file: RemoteFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            parents: file.parent_ids.into_iter().collect(),
            web_view_link: file.web_view_link,
            thumbnail_link: file.thumbnail_link,
        }
    }
}

/// Persisted projection of a [`FileDescriptor`].
///
/// Sync owns the descriptor fields plus `last_synced_at` and `source`.
/// `first_indexed_at` is written once, and `annotations` belongs to other
/// writers; a re-sync never touches either.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub parents: BTreeSet<String>,
    pub web_view_link: Option<String>,
    pub thumbnail_link: Option<String>,
    pub last_synced_at: DateTime<Utc>,
    pub source: String,
    pub first_indexed_at: DateTime<Utc>,
    #[serde(default)]
    pub annotations: BTreeMap<String, serde_json::Value>,
}

impl IndexEntry {
    /// Project a descriptor as of `synced_at`
    pub fn from_descriptor(
        descriptor: FileDescriptor,
        source: impl Into<String>,
        synced_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: descriptor.id,
            name: descriptor.name,
            mime_type: descriptor.mime_type,
            parents: descriptor.parents,
            web_view_link: descriptor.web_view_link,
            thumbnail_link: descriptor.thumbnail_link,
            last_synced_at: synced_at,
            source: source.into(),
            first_indexed_at: synced_at,
            annotations: BTreeMap::new(),
        }
    }

    /// Apply the sync-owned fields of `incoming` onto `self`
    pub fn merge_sync_fields(&mut self, incoming: &IndexEntry) {
        self.name.clone_from(&incoming.name);
        self.mime_type.clone_from(&incoming.mime_type);
        self.parents.clone_from(&incoming.parents);
        self.web_view_link.clone_from(&incoming.web_view_link);
        self.thumbnail_link.clone_from(&incoming.thumbnail_link);
        self.last_synced_at = incoming.last_synced_at;
        self.source.clone_from(&incoming.source);
    }

    pub fn to_ghost(&self) -> Ghost {
        Ghost {
            id: self.id.clone(),
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            last_synced_at: self.last_synced_at,
        }
    }
}

/// An index entry with no live external file, offered for human review.
///
/// Derived on every scan and never persisted in the index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ghost {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub last_synced_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_descriptor_from_remote_file() {
        let remote = RemoteFile {
            id: "f1".to_string(),
            name: "Hallelujah.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            parent_ids: vec!["a".to_string(), "b".to_string(), "a".to_string()],
            web_view_link: Some("https://drive.google.com/file/d/f1/view".to_string()),
            thumbnail_link: None,
            trashed: false,
        };

        let descriptor = FileDescriptor::from(remote);

        assert_eq!(descriptor.parents.len(), 2);
        assert!(descriptor.web_view_link.is_some());
    }

    #[test]
    fn test_merge_keeps_foreign_fields() {
        let first = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();

        let mut stored = IndexEntry::from_descriptor(
            FileDescriptor::new("f1", "Old.pdf", "application/pdf"),
            "google-drive",
            first,
        );
        stored
            .annotations
            .insert("key".to_string(), serde_json::json!("D minor"));

        let incoming = IndexEntry::from_descriptor(
            FileDescriptor::new("f1", "New.pdf", "application/pdf").with_parent("root"),
            "google-drive",
            later,
        );
        stored.merge_sync_fields(&incoming);

        assert_eq!(stored.name, "New.pdf");
        assert_eq!(stored.last_synced_at, later);
        assert_eq!(stored.first_indexed_at, first);
        assert_eq!(stored.annotations["key"], serde_json::json!("D minor"));
        assert!(stored.parents.contains("root"));
    }

    #[test]
    fn test_ghost_serializes_camel_case() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 12, 0, 0).unwrap();
        let entry = IndexEntry::from_descriptor(
            FileDescriptor::new("gone", "Removed.mp3", "audio/mpeg"),
            "google-drive",
            at,
        );

        let json = serde_json::to_value(entry.to_ghost()).unwrap();

        assert_eq!(json["id"], "gone");
        assert_eq!(json["mimeType"], "audio/mpeg");
        assert!(json.get("lastSyncedAt").is_some());
    }
}
