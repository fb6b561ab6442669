//! # Remote Enumerator
//!
//! Produces the complete, deduplicated set of file descriptors visible in the
//! external store.
//!
//! Two modes:
//! - **Whole scope** (`root_id = None`): one flat paginated listing of every
//!   non-trashed item.
//! - **Rooted**: breadth-first walk of folders under `root_id`. A folder is
//!   listed at most once even when it is linked from several parents or the
//!   link structure has a cycle.
//!
//! Folders are traversed but never emitted. Any listing error aborts the
//! whole call: a truncated listing must never reach the index or the scanner,
//! where it would surface as false ghosts.

use bridge_traits::storage::{RemoteFile, StorageProvider};
use core_library::FileDescriptor;
use std::collections::{BTreeMap, HashSet, VecDeque};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::error::{Result, SyncError};

/// Walks the external store
pub struct RemoteEnumerator {
    provider: Arc<dyn StorageProvider>,
}

impl RemoteEnumerator {
    pub fn new(provider: Arc<dyn StorageProvider>) -> Self {
        Self { provider }
    }

    /// List every file under `root_id` (or the whole scope), sorted by id.
    #[instrument(skip(self), fields(root_id = ?root_id))]
    pub async fn list_all_files(&self, root_id: Option<&str>) -> Result<Vec<FileDescriptor>> {
        let mut files: BTreeMap<String, FileDescriptor> = BTreeMap::new();

        match root_id {
            None => {
                for item in self.list_every_page(None).await? {
                    Self::collect(&mut files, item);
                }
            }
            Some(root) => {
                let mut visited: HashSet<String> = HashSet::from([root.to_string()]);
                let mut queue: VecDeque<String> = VecDeque::from([root.to_string()]);

                while let Some(folder) = queue.pop_front() {
                    for item in self.list_every_page(Some(&folder)).await? {
                        if item.trashed {
                            continue;
                        }
                        if item.is_folder() {
                            if visited.insert(item.id.clone()) {
                                queue.push_back(item.id);
                            }
                        } else {
                            Self::collect(&mut files, item);
                        }
                    }
                }

                debug!(folders = visited.len(), "Folder walk complete");
            }
        }

        info!(files = files.len(), "Enumeration complete");
        Ok(files.into_values().collect())
    }

    fn collect(files: &mut BTreeMap<String, FileDescriptor>, item: RemoteFile) {
        if item.trashed || item.is_folder() {
            return;
        }
        match files.get_mut(&item.id) {
            Some(existing) => existing.parents.extend(item.parent_ids),
            None => {
                files.insert(item.id.clone(), FileDescriptor::from(item));
            }
        }
    }

    /// Follow pagination for one listing scope
    async fn list_every_page(&self, folder_id: Option<&str>) -> Result<Vec<RemoteFile>> {
        let mut items = Vec::new();
        let mut seen_tokens: HashSet<String> = HashSet::new();
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = self
                .provider
                .list_children(folder_id, page_token.clone())
                .await?;
            pages += 1;
            items.extend(page.files);

            match page.next_page_token {
                Some(token) => {
                    if !seen_tokens.insert(token.clone()) {
                        return Err(SyncError::PaginationLoop {
                            scope: folder_id.unwrap_or("<all>").to_string(),
                            token,
                        });
                    }
                    page_token = Some(token);
                }
                None => break,
            }
        }

        debug!(folder_id = ?folder_id, pages, items = items.len(), "Listed scope");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::{BridgeError, Result as BridgeResult};
    use bridge_traits::storage::{RemoteContent, RemotePage, FOLDER_MIME_TYPE};
    use std::collections::HashMap;

    /// Provider answering from a fixed folder → pages table
    #[derive(Default)]
    struct TableProvider {
        pages: HashMap<(Option<String>, Option<String>), RemotePage>,
        failing_folder: Option<String>,
    }

    impl TableProvider {
        fn page(
            mut self,
            folder: Option<&str>,
            token: Option<&str>,
            files: Vec<RemoteFile>,
            next: Option<&str>,
        ) -> Self {
            self.pages.insert(
                (folder.map(String::from), token.map(String::from)),
                RemotePage {
                    files,
                    next_page_token: next.map(String::from),
                },
            );
            self
        }
    }

    #[async_trait]
    impl StorageProvider for TableProvider {
        async fn list_children(
            &self,
            folder_id: Option<&str>,
            page_token: Option<String>,
        ) -> BridgeResult<RemotePage> {
            if folder_id.is_some() && folder_id == self.failing_folder.as_deref() {
                return Err(BridgeError::OperationFailed("503".to_string()));
            }
            Ok(self
                .pages
                .get(&(folder_id.map(String::from), page_token))
                .cloned()
                .unwrap_or_default())
        }

        async fn get_metadata(&self, file_id: &str) -> BridgeResult<RemoteFile> {
            Err(BridgeError::NotFound(file_id.to_string()))
        }

        async fn download(&self, file_id: &str, _range: Option<&str>) -> BridgeResult<RemoteContent> {
            Err(BridgeError::NotFound(file_id.to_string()))
        }
    }

    fn file(id: &str, parent: &str) -> RemoteFile {
        RemoteFile {
            id: id.to_string(),
            name: format!("{}.pdf", id),
            mime_type: "application/pdf".to_string(),
            parent_ids: vec![parent.to_string()],
            web_view_link: None,
            thumbnail_link: None,
            trashed: false,
        }
    }

    fn folder(id: &str, parent: &str) -> RemoteFile {
        RemoteFile {
            mime_type: FOLDER_MIME_TYPE.to_string(),
            ..file(id, parent)
        }
    }

    fn ids(files: &[FileDescriptor]) -> Vec<&str> {
        files.iter().map(|f| f.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_whole_scope_follows_pagination() {
        let provider = TableProvider::default()
            .page(None, None, vec![file("b", "x"), folder("dir", "x")], Some("t1"))
            .page(None, Some("t1"), vec![file("a", "x")], None);

        let files = RemoteEnumerator::new(Arc::new(provider))
            .list_all_files(None)
            .await
            .unwrap();

        assert_eq!(ids(&files), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_rooted_walk_flattens_and_dedups() {
        let mut trashed = file("old", "root");
        trashed.trashed = true;

        // sub is linked from root and from itself through "loop"
        let provider = TableProvider::default()
            .page(
                Some("root"),
                None,
                vec![file("a", "root"), folder("sub", "root"), trashed],
                None,
            )
            .page(
                Some("sub"),
                None,
                vec![file("b", "sub"), file("a", "sub"), folder("loop", "sub")],
                None,
            )
            .page(Some("loop"), None, vec![folder("sub", "loop"), folder("root", "loop")], None);

        let files = RemoteEnumerator::new(Arc::new(provider))
            .list_all_files(Some("root"))
            .await
            .unwrap();

        assert_eq!(ids(&files), vec!["a", "b"]);
        assert_eq!(files[0].parents.len(), 2);
    }

    #[tokio::test]
    async fn test_failure_returns_no_partial_result() {
        let mut provider = TableProvider::default()
            .page(Some("root"), None, vec![file("a", "root"), folder("bad", "root")], None);
        provider.failing_folder = Some("bad".to_string());

        let result = RemoteEnumerator::new(Arc::new(provider))
            .list_all_files(Some("root"))
            .await;

        assert!(matches!(result, Err(SyncError::Provider(_))));
    }

    #[tokio::test]
    async fn test_repeated_page_token_is_detected() {
        let provider = TableProvider::default()
            .page(None, None, vec![file("a", "x")], Some("t1"))
            .page(None, Some("t1"), vec![file("b", "x")], Some("t1"));

        let result = RemoteEnumerator::new(Arc::new(provider))
            .list_all_files(None)
            .await;

        assert!(matches!(result, Err(SyncError::PaginationLoop { ref token, .. }) if token == "t1"));
    }
}
