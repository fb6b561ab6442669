//! # Library Configuration
//!
//! Settings for index synchronization, consistency scans, pruning and offline
//! replication.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::LibraryConfig;
//! use std::time::Duration;
//!
//! let config = LibraryConfig::builder()
//!     .root_folder_id("1AbCdEf")
//!     .database_path("/var/lib/library/index.db")
//!     .ghost_report_dir("/var/lib/library/reports")
//!     .sync_timeout(Duration::from_secs(600))
//!     .proxy_base_url("https://library.example.com/api/files")
//!     .max_concurrent_downloads(4)
//!     .build()?;
//! ```
//!
//! `build()` validates every value and fails fast with an actionable message:
//!
//! ```should_panic
//! use core_runtime::config::LibraryConfig;
//!
//! let config = LibraryConfig::builder()
//!     .index_batch_size(0)
//!     .build()
//!     .expect("batch size of zero is rejected");
//! ```

use crate::error::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Hard limit on operations in one atomic index commit
pub const INDEX_BATCH_HARD_LIMIT: usize = 500;

/// Default batch size, kept under the hard limit
pub const DEFAULT_INDEX_BATCH_SIZE: usize = 450;

/// Source tag stamped on index entries when none is configured
pub const DEFAULT_SOURCE_TAG: &str = "google-drive";

/// Validated configuration for the library engine.
///
/// Use [`LibraryConfig::builder`] to construct instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConfig {
    /// Maximum operations per index commit (1..=500)
    pub index_batch_size: usize,

    /// Folder to enumerate from; `None` enumerates the entire accessible scope
    pub root_folder_id: Option<String>,

    /// Tag written to `IndexEntry::source`
    pub source_tag: String,

    /// Maximum execution time of a sync run
    pub sync_timeout: Duration,

    /// Maximum execution time of a consistency scan
    pub scan_timeout: Duration,

    /// Maximum execution time of a prune call
    pub prune_timeout: Duration,

    /// Where scan reports are persisted; `None` keeps them transient
    pub ghost_report_dir: Option<PathBuf>,

    /// SQLite index location; `None` uses an in-memory database
    pub database_path: Option<PathBuf>,

    /// Base URL of the authenticated file proxy
    pub proxy_base_url: Option<String>,

    /// Cap on concurrent offline downloads; `None` is uncapped
    pub max_concurrent_downloads: Option<usize>,

    /// Directory for the file-backed offline cache
    pub offline_cache_dir: Option<PathBuf>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            index_batch_size: DEFAULT_INDEX_BATCH_SIZE,
            root_folder_id: None,
            source_tag: DEFAULT_SOURCE_TAG.to_string(),
            sync_timeout: Duration::from_secs(300),
            scan_timeout: Duration::from_secs(120),
            prune_timeout: Duration::from_secs(60),
            ghost_report_dir: None,
            database_path: None,
            proxy_base_url: None,
            max_concurrent_downloads: None,
            offline_cache_dir: None,
        }
    }
}

impl LibraryConfig {
    pub fn builder() -> LibraryConfigBuilder {
        LibraryConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// This checks:
    /// - Batch size is within 1..=500
    /// - Source tag and root folder id are not blank
    /// - Route timeouts are non-zero
    /// - Proxy URL is http(s) without a trailing slash requirement
    /// - Download cap is not zero
    pub fn validate(&self) -> Result<()> {
        if self.index_batch_size == 0 || self.index_batch_size > INDEX_BATCH_HARD_LIMIT {
            return Err(Error::Config(format!(
                "Index batch size must be between 1 and {}, got {}",
                INDEX_BATCH_HARD_LIMIT, self.index_batch_size
            )));
        }

        if self.source_tag.trim().is_empty() {
            return Err(Error::Config("Source tag cannot be empty".to_string()));
        }

        if let Some(root) = &self.root_folder_id {
            if root.trim().is_empty() {
                return Err(Error::Config(
                    "Root folder id cannot be blank. Omit it to enumerate the whole scope."
                        .to_string(),
                ));
            }
        }

        for (name, timeout) in [
            ("Sync", self.sync_timeout),
            ("Scan", self.scan_timeout),
            ("Prune", self.prune_timeout),
        ] {
            if timeout.is_zero() {
                return Err(Error::Config(format!(
                    "{} timeout must be greater than zero",
                    name
                )));
            }
        }

        if let Some(url) = &self.proxy_base_url {
            if !(url.starts_with("https://") || url.starts_with("http://")) {
                return Err(Error::Config(format!(
                    "Proxy base URL must start with http:// or https://, got '{}'",
                    url
                )));
            }
        }

        if self.max_concurrent_downloads == Some(0) {
            return Err(Error::Config(
                "max_concurrent_downloads must be at least 1. Leave it unset for no cap."
                    .to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for [`LibraryConfig`]
#[derive(Debug, Default)]
pub struct LibraryConfigBuilder {
    config: LibraryConfig,
}

impl LibraryConfigBuilder {
    pub fn index_batch_size(mut self, size: usize) -> Self {
        self.config.index_batch_size = size;
        self
    }

    pub fn root_folder_id(mut self, id: impl Into<String>) -> Self {
        self.config.root_folder_id = Some(id.into());
        self
    }

    pub fn source_tag(mut self, tag: impl Into<String>) -> Self {
        self.config.source_tag = tag.into();
        self
    }

    pub fn sync_timeout(mut self, timeout: Duration) -> Self {
        self.config.sync_timeout = timeout;
        self
    }

    pub fn scan_timeout(mut self, timeout: Duration) -> Self {
        self.config.scan_timeout = timeout;
        self
    }

    pub fn prune_timeout(mut self, timeout: Duration) -> Self {
        self.config.prune_timeout = timeout;
        self
    }

    pub fn ghost_report_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.ghost_report_dir = Some(dir.into());
        self
    }

    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config.database_path = Some(path.into());
        self
    }

    /// Base URL of the file proxy; a trailing `/` is stripped
    pub fn proxy_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.config.proxy_base_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    pub fn max_concurrent_downloads(mut self, limit: usize) -> Self {
        self.config.max_concurrent_downloads = Some(limit);
        self
    }

    pub fn offline_cache_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.config.offline_cache_dir = Some(dir.into());
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<LibraryConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LibraryConfig::builder().build().unwrap();

        assert_eq!(config.index_batch_size, 450);
        assert_eq!(config.source_tag, "google-drive");
        assert_eq!(config.sync_timeout, Duration::from_secs(300));
        assert_eq!(config.scan_timeout, Duration::from_secs(120));
        assert_eq!(config.prune_timeout, Duration::from_secs(60));
        assert!(config.root_folder_id.is_none());
        assert!(config.max_concurrent_downloads.is_none());
    }

    #[test]
    fn test_batch_size_bounds() {
        assert!(LibraryConfig::builder().index_batch_size(1).build().is_ok());
        assert!(LibraryConfig::builder()
            .index_batch_size(500)
            .build()
            .is_ok());

        let err = LibraryConfig::builder()
            .index_batch_size(501)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("between 1 and 500"));
    }

    #[test]
    fn test_rejects_blank_root_folder() {
        let err = LibraryConfig::builder()
            .root_folder_id("  ")
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Root folder id"));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = LibraryConfig::builder()
            .scan_timeout(Duration::ZERO)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("Scan timeout"));
    }

    #[test]
    fn test_proxy_url() {
        let config = LibraryConfig::builder()
            .proxy_base_url("https://example.com/api/files/")
            .build()
            .unwrap();
        assert_eq!(
            config.proxy_base_url.as_deref(),
            Some("https://example.com/api/files")
        );

        assert!(LibraryConfig::builder()
            .proxy_base_url("ftp://example.com")
            .build()
            .is_err());
    }

    #[test]
    fn test_download_cap_of_zero_is_rejected() {
        assert!(LibraryConfig::builder()
            .max_concurrent_downloads(0)
            .build()
            .is_err());
        assert_eq!(
            LibraryConfig::builder()
                .max_concurrent_downloads(3)
                .build()
                .unwrap()
                .max_concurrent_downloads,
            Some(3)
        );
    }

    #[test]
    fn test_builder_accepts_str_and_pathbuf() {
        let config = LibraryConfig::builder()
            .database_path("/db/index.db")
            .ghost_report_dir(PathBuf::from("/reports"))
            .build()
            .unwrap();

        assert_eq!(config.database_path, Some(PathBuf::from("/db/index.db")));
        assert_eq!(config.ghost_report_dir, Some(PathBuf::from("/reports")));
    }
}
