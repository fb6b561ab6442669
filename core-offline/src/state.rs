//! Offline status snapshot and working-set references

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A track in a working set, naming the files to make available offline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRef {
    pub id: String,
    pub title: String,
    /// Sheet music, chart or other primary document
    pub primary_file_id: Option<String>,
    pub audio_file_id: Option<String>,
}

impl TrackRef {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            primary_file_id: None,
            audio_file_id: None,
        }
    }

    pub fn with_primary(mut self, file_id: impl Into<String>) -> Self {
        self.primary_file_id = Some(file_id.into());
        self
    }

    pub fn with_audio(mut self, file_id: impl Into<String>) -> Self {
        self.audio_file_id = Some(file_id.into());
        self
    }

    /// Referenced file ids, primary first, blanks skipped
    pub fn file_ids(&self) -> impl Iterator<Item = &str> {
        [self.primary_file_id.as_deref(), self.audio_file_id.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Per-file download state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadState {
    Idle,
    Downloading,
    Cached,
}

/// Immutable snapshot of offline status.
///
/// Never mutated in place once published; every transition publishes a new
/// snapshot, so observers always see a consistent whole.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OfflineState {
    /// Known offline availability by file id
    pub offline: HashMap<String, bool>,
    /// Ids with a fetch in flight
    pub downloading: HashSet<String>,
}

impl OfflineState {
    pub fn state_of(&self, file_id: &str) -> DownloadState {
        if self.downloading.contains(file_id) {
            DownloadState::Downloading
        } else if self.is_offline(file_id) {
            DownloadState::Cached
        } else {
            DownloadState::Idle
        }
    }

    pub fn is_offline(&self, file_id: &str) -> bool {
        self.offline.get(file_id).copied().unwrap_or(false)
    }
}
