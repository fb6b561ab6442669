//! Operator routes: sync, scan and prune
//!
//! Each route verifies the caller's bearer credential, requires the admin
//! role, and runs under its own maximum execution duration. Nothing touches
//! the index before the caller is verified.

use bridge_traits::storage::StorageProvider;
use bridge_traits::time::Clock;
use core_auth::{require_operator, CallerIdentity, IdentityVerifier};
use core_library::IndexStore;
use core_runtime::LibraryConfig;
use core_sync::{
    ConsistencyScanner, IndexWriter, PruneExecutor, PruneResult, RemoteEnumerator, ScanReport,
    SyncStats,
};
use serde::Serialize;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::error::{CoreError, Result};

/// Host-provided collaborators the service needs
pub struct LibraryDependencies {
    pub provider: Arc<dyn StorageProvider>,
    pub index_store: Arc<dyn IndexStore>,
    pub clock: Arc<dyn Clock>,
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl LibraryDependencies {
    pub fn new(
        provider: Arc<dyn StorageProvider>,
        index_store: Arc<dyn IndexStore>,
        clock: Arc<dyn Clock>,
        verifier: Arc<dyn IdentityVerifier>,
    ) -> Self {
        Self {
            provider,
            index_store,
            clock,
            verifier,
        }
    }
}

/// Scan report plus where it was persisted, if anywhere
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    #[serde(flatten)]
    pub report: ScanReport,
    pub report_path: Option<PathBuf>,
}

/// Façade over the sync engine for operator-facing routes
pub struct LibraryService {
    config: LibraryConfig,
    verifier: Arc<dyn IdentityVerifier>,
    index_store: Arc<dyn IndexStore>,
    writer: IndexWriter,
    scanner: ConsistencyScanner,
    pruner: PruneExecutor,
}

impl LibraryService {
    pub fn new(config: LibraryConfig, deps: LibraryDependencies) -> Self {
        let enumerator = Arc::new(RemoteEnumerator::new(deps.provider));
        let writer = IndexWriter::new(
            Arc::clone(&enumerator),
            Arc::clone(&deps.index_store),
            Arc::clone(&deps.clock),
        )
        .with_batch_size(config.index_batch_size)
        .with_source_tag(config.source_tag.clone());
        let scanner = ConsistencyScanner::new(
            enumerator,
            Arc::clone(&deps.index_store),
            deps.clock,
        );
        let pruner = PruneExecutor::new(Arc::clone(&deps.index_store));

        Self {
            config,
            verifier: deps.verifier,
            index_store: deps.index_store,
            writer,
            scanner,
            pruner,
        }
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn index_store(&self) -> Arc<dyn IndexStore> {
        Arc::clone(&self.index_store)
    }

    /// Mirror the external store into the index. Never deletes.
    #[instrument(skip(self, authorization))]
    pub async fn sync(&self, authorization: Option<&str>) -> Result<SyncStats> {
        let caller = self.authorize(authorization).await?;
        let root = self.config.root_folder_id.as_deref();

        let stats = run_with_limit("sync", self.config.sync_timeout, async {
            Ok::<_, CoreError>(self.writer.sync_library_index(root).await?)
        })
        .await?;

        info!(
            subject = %caller.subject,
            added = stats.added,
            updated = stats.updated,
            errors = stats.errors,
            "Sync route finished"
        );
        Ok(stats)
    }

    /// Report ghosts without modifying the index
    #[instrument(skip(self, authorization))]
    pub async fn scan(&self, authorization: Option<&str>) -> Result<ScanResponse> {
        let caller = self.authorize(authorization).await?;
        let root = self.config.root_folder_id.as_deref();

        let report = run_with_limit("scan", self.config.scan_timeout, async {
            Ok::<_, CoreError>(self.scanner.scan(root).await?)
        })
        .await?;

        // The scan already succeeded; a report that cannot be written is logged
        let report_path = match &self.config.ghost_report_dir {
            Some(dir) => match report.save_to(dir).await {
                Ok(path) => Some(path),
                Err(e) => {
                    warn!(error = %e, "Failed to persist scan report");
                    None
                }
            },
            None => None,
        };

        info!(
            subject = %caller.subject,
            report_id = %report.report_id,
            ghost_count = report.ghost_count,
            "Scan route finished"
        );
        Ok(ScanResponse {
            report,
            report_path,
        })
    }

    /// Delete exactly the given ids from the index
    #[instrument(skip(self, authorization, ids), fields(ids = ids.len()))]
    pub async fn execute_prune(
        &self,
        authorization: Option<&str>,
        ids: &[String],
    ) -> Result<PruneResult> {
        let caller = self.authorize(authorization).await?;
        PruneExecutor::normalize_ids(ids)?;

        let result = run_with_limit("prune", self.config.prune_timeout, async {
            Ok::<_, CoreError>(self.pruner.execute(ids).await?)
        })
        .await?;

        info!(
            subject = %caller.subject,
            requested = result.requested,
            deleted_count = result.deleted_count,
            "Prune route finished"
        );
        Ok(result)
    }

    async fn authorize(&self, authorization: Option<&str>) -> Result<CallerIdentity> {
        Ok(require_operator(self.verifier.as_ref(), authorization).await?)
    }
}

async fn run_with_limit<T, F>(route: &'static str, limit: Duration, work: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, work).await {
        Ok(result) => result,
        Err(_) => {
            warn!(route, limit_secs = limit.as_secs_f64(), "Route timed out");
            Err(CoreError::Timeout {
                route,
                after: limit,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::storage::{RemoteContent, RemoteFile, RemotePage};
    use bridge_traits::time::SystemClock;
    use bridge_traits::BridgeError;
    use core_auth::{AuthError, Role};
    use core_library::{FileDescriptor, IndexEntry, MemoryIndexStore};
    use mockall::mock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    mock! {
        Verifier {}

        #[async_trait]
        impl IdentityVerifier for Verifier {
            async fn verify(&self, bearer: &str) -> core_auth::Result<CallerIdentity>;
        }
    }

    struct StaticProvider {
        ids: Vec<String>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl StaticProvider {
        fn new(ids: &[&str]) -> Self {
            Self {
                ids: ids.iter().map(|s| s.to_string()).collect(),
                delay: None,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl StorageProvider for StaticProvider {
        async fn list_children(
            &self,
            _folder_id: Option<&str>,
            _page_token: Option<String>,
        ) -> BridgeResult<RemotePage> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            Ok(RemotePage {
                files: self
                    .ids
                    .iter()
                    .map(|id| RemoteFile {
                        id: id.clone(),
                        name: format!("{}.pdf", id),
                        mime_type: "application/pdf".to_string(),
                        parent_ids: vec![],
                        web_view_link: None,
                        thumbnail_link: None,
                        trashed: false,
                    })
                    .collect(),
                next_page_token: None,
            })
        }

        async fn get_metadata(&self, file_id: &str) -> BridgeResult<RemoteFile> {
            Err(BridgeError::NotAvailable(file_id.to_string()))
        }

        async fn download(&self, file_id: &str, _range: Option<&str>) -> BridgeResult<RemoteContent> {
            Err(BridgeError::NotAvailable(file_id.to_string()))
        }
    }

    fn verifier() -> MockVerifier {
        let mut verifier = MockVerifier::new();
        verifier.expect_verify().returning(|token| match token {
            "admin-token" => Ok(CallerIdentity::new("ops-1", Role::Admin)),
            "member-token" => Ok(CallerIdentity::new("m-1", Role::Member)),
            _ => Err(AuthError::InvalidCredential("unknown token".to_string())),
        });
        verifier
    }

    async fn seeded_store(ids: &[&str]) -> Arc<MemoryIndexStore> {
        let store = Arc::new(MemoryIndexStore::default());
        let entries: Vec<_> = ids
            .iter()
            .map(|id| {
                IndexEntry::from_descriptor(
                    FileDescriptor::new(*id, format!("{}.pdf", id), "application/pdf"),
                    "google-drive",
                    chrono::Utc::now(),
                )
            })
            .collect();
        store.seed(entries).await;
        store
    }

    fn service(
        config: LibraryConfig,
        provider: Arc<StaticProvider>,
        store: Arc<MemoryIndexStore>,
    ) -> LibraryService {
        LibraryService::new(
            config,
            LibraryDependencies::new(provider, store, Arc::new(SystemClock), Arc::new(verifier())),
        )
    }

    #[tokio::test]
    async fn test_sync_requires_admin() {
        let provider = Arc::new(StaticProvider::new(&["A"]));
        let store = Arc::new(MemoryIndexStore::default());
        let service = service(LibraryConfig::default(), provider.clone(), store.clone());

        let missing = service.sync(None).await.unwrap_err();
        assert_eq!(missing.status_code(), 401);

        let forbidden = service.sync(Some("Bearer member-token")).await.unwrap_err();
        assert_eq!(forbidden.status_code(), 403);

        let invalid = service.sync(Some("Bearer nope")).await.unwrap_err();
        assert_eq!(invalid.status_code(), 401);

        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.count().await.unwrap(), 0);

        let stats = service.sync(Some("Bearer admin-token")).await.unwrap();
        assert_eq!(stats.added, 1);
    }

    #[tokio::test]
    async fn test_scan_then_prune() {
        let provider = Arc::new(StaticProvider::new(&["A", "B"]));
        let store = seeded_store(&["A", "B", "C"]).await;
        let service = service(LibraryConfig::default(), provider, store.clone());

        let scan = service.scan(Some("Bearer admin-token")).await.unwrap();
        assert_eq!(scan.report.ghost_ids(), vec!["C".to_string()]);
        assert!(scan.report_path.is_none());
        assert_eq!(store.count().await.unwrap(), 3);

        let result = service
            .execute_prune(Some("Bearer admin-token"), &scan.report.ghost_ids())
            .await
            .unwrap();
        assert_eq!(result.deleted_count, 1);
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_empty_prune_is_bad_request() {
        let store = seeded_store(&["A"]).await;
        let service = service(
            LibraryConfig::default(),
            Arc::new(StaticProvider::new(&[])),
            store.clone(),
        );

        let err = service
            .execute_prune(Some("Bearer admin-token"), &[])
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), 400);
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_scan_report_persisted_when_configured() {
        let dir = std::env::temp_dir().join(format!("ghost-reports-{}", uuid::Uuid::new_v4()));
        let config = LibraryConfig::builder()
            .ghost_report_dir(&dir)
            .build()
            .unwrap();
        let service = service(
            config,
            Arc::new(StaticProvider::new(&[])),
            seeded_store(&["G"]).await,
        );

        let scan = service.scan(Some("Bearer admin-token")).await.unwrap();

        let path = scan.report_path.unwrap();
        assert!(path.starts_with(&dir));
        let saved = ScanReport::load_from(&path).await.unwrap();
        assert_eq!(saved.ghost_count, 1);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn test_route_timeout() {
        let provider = Arc::new(StaticProvider {
            delay: Some(Duration::from_secs(5)),
            ..StaticProvider::new(&["A"])
        });
        let config = LibraryConfig::builder()
            .sync_timeout(Duration::from_millis(20))
            .build()
            .unwrap();
        let store = Arc::new(MemoryIndexStore::default());
        let service = service(config, provider, store.clone());

        let err = service.sync(Some("Bearer admin-token")).await.unwrap_err();

        assert!(matches!(err, CoreError::Timeout { route: "sync", .. }));
        assert_eq!(err.status_code(), 504);
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
