//! Desktop wiring: reqwest HTTP, Google Drive, SQLite index, file-backed
//! offline cache.

use bridge_desktop::ReqwestHttpClient;
use bridge_traits::http::HttpClient;
use bridge_traits::time::SystemClock;
use core_auth::IdentityVerifier;
use core_library::db::{create_pool, DatabaseConfig};
use core_library::SqliteIndexStore;
use core_runtime::config::INDEX_BATCH_HARD_LIMIT;
use core_runtime::LibraryConfig;
use provider_google_drive::GoogleDriveConnector;
use std::sync::Arc;
use tracing::info;

use crate::error::Result;
use crate::service::{LibraryDependencies, LibraryService};

/// Build a [`LibraryService`] over Google Drive and a SQLite index.
///
/// `drive_access_token` is obtained by the host; this crate does not run
/// OAuth flows.
pub async fn bootstrap_desktop(
    config: LibraryConfig,
    drive_access_token: impl Into<String>,
    verifier: Arc<dyn IdentityVerifier>,
) -> Result<LibraryService> {
    config.validate()?;

    let http: Arc<dyn HttpClient> = Arc::new(ReqwestHttpClient::try_new()?);
    let provider = Arc::new(GoogleDriveConnector::new(http, drive_access_token.into()));

    let db_config = match &config.database_path {
        Some(path) => DatabaseConfig::new(path),
        None => DatabaseConfig::in_memory(),
    };
    let pool = create_pool(db_config).await?;
    let store = Arc::new(SqliteIndexStore::new(pool, INDEX_BATCH_HARD_LIMIT));

    info!(
        database = ?config.database_path,
        root_folder_id = ?config.root_folder_id,
        batch_size = config.index_batch_size,
        "Library service ready"
    );

    Ok(LibraryService::new(
        config,
        LibraryDependencies::new(provider, store, Arc::new(SystemClock), verifier),
    ))
}

#[cfg(feature = "offline")]
pub use offline::build_offline_manager;

#[cfg(feature = "offline")]
mod offline {
    use super::*;
    use crate::error::CoreError;
    use bridge_desktop::FileOfflineStore;
    use core_offline::{HttpFileProxy, OfflineReplicationManager};

    /// Build the offline manager and the proxy whose session token the host
    /// keeps current.
    pub fn build_offline_manager(
        config: &LibraryConfig,
        http: Arc<dyn HttpClient>,
    ) -> Result<(OfflineReplicationManager, Arc<HttpFileProxy>)> {
        let base_url = config.proxy_base_url.as_deref().ok_or_else(|| {
            CoreError::InitializationFailed(
                "proxy_base_url is required for offline replication".to_string(),
            )
        })?;

        let proxy = Arc::new(HttpFileProxy::new(http, base_url));
        let store = Arc::new(match &config.offline_cache_dir {
            Some(dir) => FileOfflineStore::new(dir),
            None => FileOfflineStore::in_default_location(),
        });
        let cache_dir = store.root().to_path_buf();

        let mut manager =
            OfflineReplicationManager::new(proxy.clone(), store, Arc::new(SystemClock));
        if let Some(limit) = config.max_concurrent_downloads {
            manager = manager.with_max_concurrent_downloads(limit);
        }

        info!(
            cache_dir = %cache_dir.display(),
            max_concurrent_downloads = ?config.max_concurrent_downloads,
            "Offline replication ready"
        );
        Ok((manager, proxy))
    }
}
