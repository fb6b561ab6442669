//! Google Drive API connector implementation
//!
//! Implements the `StorageProvider` trait for Google Drive API v3.

use async_trait::async_trait;
use bridge_traits::error::Result;
use bridge_traits::http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
use bridge_traits::storage::{RemoteContent, RemoteFile, RemotePage, StorageProvider};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::error::GoogleDriveError;
use crate::types::{ApiErrorResponse, DriveFile, FilesListResponse};

/// Google Drive API base URL
const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";

/// Maximum results per page (Google Drive API limit)
const MAX_PAGE_SIZE: u32 = 1000;

/// Fields to request for file resources
const FILE_FIELDS: &str = "id,name,mimeType,parents,webViewLink,thumbnailLink,trashed";

/// Attempts per request before giving up on 429/5xx
const MAX_ATTEMPTS: u32 = 4;

/// Google Drive API connector
///
/// # Features
///
/// - Folder-children and whole-scope listings, both excluding trashed items
/// - Shared drive items included (`supportsAllDrives`)
/// - Exponential backoff for rate limiting and transient errors
/// - Refuses listings Drive flags as `incompleteSearch`
///
/// # Example
///
/// ```ignore
/// use provider_google_drive::GoogleDriveConnector;
/// use bridge_traits::storage::StorageProvider;
///
/// let connector = GoogleDriveConnector::new(http_client, access_token);
/// let page = connector.list_children(Some("folder-id"), None).await?;
/// ```
pub struct GoogleDriveConnector {
    /// HTTP client for API requests
    http_client: Arc<dyn HttpClient>,

    /// OAuth 2.0 access token with at least `drive.readonly` scope
    access_token: String,

    /// Base delay for exponential backoff
    backoff_base: Duration,
}

impl GoogleDriveConnector {
    pub fn new(http_client: Arc<dyn HttpClient>, access_token: String) -> Self {
        Self {
            http_client,
            access_token,
            backoff_base: Duration::from_millis(200),
        }
    }

    /// Override the backoff base delay (tests use zero)
    pub fn with_backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = base;
        self
    }

    /// Build the `q` parameter for a listing
    ///
    /// Folder ids are quoted; single quotes and backslashes are escaped as the
    /// Drive query language requires.
    fn listing_query(folder_id: Option<&str>) -> String {
        match folder_id {
            Some(id) => {
                let escaped = id.replace('\\', "\\\\").replace('\'', "\\'");
                format!("'{}' in parents and trashed=false", escaped)
            }
            None => "trashed=false".to_string(),
        }
    }

    fn listing_url(folder_id: Option<&str>, page_token: Option<&str>) -> String {
        let mut url = format!(
            "{}/files?q={}&pageSize={}&supportsAllDrives=true&includeItemsFromAllDrives=true&fields={}",
            DRIVE_API_BASE,
            urlencoding::encode(&Self::listing_query(folder_id)),
            MAX_PAGE_SIZE,
            urlencoding::encode(&format!(
                "nextPageToken,incompleteSearch,files({})",
                FILE_FIELDS
            )),
        );

        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }

        url
    }

    fn convert_file(drive_file: DriveFile) -> RemoteFile {
        RemoteFile {
            id: drive_file.id,
            name: drive_file.name,
            mime_type: drive_file.mime_type,
            parent_ids: drive_file.parents,
            web_view_link: drive_file.web_view_link,
            thumbnail_link: drive_file.thumbnail_link,
            trashed: drive_file.trashed,
        }
    }

    /// Map a non-success response to a provider error
    fn error_for(response: &HttpResponse, file_id: Option<&str>) -> GoogleDriveError {
        let message = serde_json::from_slice::<ApiErrorResponse>(&response.body)
            .map(|body| body.error.message)
            .unwrap_or_else(|_| String::from_utf8_lossy(&response.body).to_string());

        match (response.status, file_id) {
            (401, _) | (403, _) => GoogleDriveError::AuthenticationFailed(message),
            (404, Some(id)) => GoogleDriveError::FileNotFound {
                file_id: id.to_string(),
            },
            (status, _) => GoogleDriveError::ApiError {
                status_code: status,
                message,
            },
        }
    }

    /// Execute a GET with retry on 429, 5xx and transient transport errors.
    ///
    /// This loop owns retries; the client is asked for a single attempt so
    /// backoff is not multiplied by a second retry layer.
    #[instrument(skip(self, url), fields(url = %url))]
    async fn get_with_retry(
        &self,
        url: String,
        range: Option<&str>,
        file_id: Option<&str>,
        timeout: Duration,
    ) -> std::result::Result<HttpResponse, GoogleDriveError> {
        let mut attempt = 0;

        loop {
            let mut request = HttpRequest::get(url.clone())
                .bearer_token(self.access_token.clone())
                .timeout(timeout);
            if let Some(range) = range {
                request = request.range(range);
            }

            attempt += 1;
            match self
                .http_client
                .execute_with_retry(request, RetryPolicy::single_attempt())
                .await
            {
                Ok(response) if response.is_success() => {
                    debug!(status = response.status, attempt, "Drive request succeeded");
                    return Ok(response);
                }
                Ok(response) if response.is_retryable() => {
                    if attempt >= MAX_ATTEMPTS {
                        warn!(status = response.status, attempt, "Drive request failed, giving up");
                        return Err(if response.status == 429 {
                            GoogleDriveError::RateLimitExceeded { attempts: attempt }
                        } else {
                            Self::error_for(&response, file_id)
                        });
                    }
                    warn!(status = response.status, attempt, "Drive request failed, retrying");
                }
                Ok(response) => return Err(Self::error_for(&response, file_id)),
                Err(e) => {
                    if !e.is_transient() || attempt >= MAX_ATTEMPTS {
                        warn!(error = %e, attempt, "Drive request failed, giving up");
                        return Err(e.into());
                    }
                    warn!(error = %e, attempt, "Drive request failed, retrying");
                }
            }

            let backoff = self.backoff_base * 2u32.pow(attempt - 1);
            tokio::time::sleep(backoff).await;
        }
    }
}

#[async_trait]
impl StorageProvider for GoogleDriveConnector {
    #[instrument(skip(self), fields(folder_id = ?folder_id))]
    async fn list_children(
        &self,
        folder_id: Option<&str>,
        page_token: Option<String>,
    ) -> Result<RemotePage> {
        let url = Self::listing_url(folder_id, page_token.as_deref());
        let response = self
            .get_with_retry(url, None, None, Duration::from_secs(30))
            .await?;

        let listing: FilesListResponse = serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to parse files list response: {}", e))
        })?;

        if listing.incomplete_search {
            return Err(GoogleDriveError::IncompleteListing {
                scope: folder_id.unwrap_or("<all>").to_string(),
            }
            .into());
        }

        let files: Vec<RemoteFile> = listing.files.into_iter().map(Self::convert_file).collect();
        debug!(count = files.len(), has_more = listing.next_page_token.is_some(), "Listed page");

        Ok(RemotePage {
            files,
            next_page_token: listing.next_page_token,
        })
    }

    #[instrument(skip(self), fields(file_id = %file_id))]
    async fn get_metadata(&self, file_id: &str) -> Result<RemoteFile> {
        let url = format!(
            "{}/files/{}?supportsAllDrives=true&fields={}",
            DRIVE_API_BASE,
            urlencoding::encode(file_id),
            FILE_FIELDS
        );

        let response = self
            .get_with_retry(url, None, Some(file_id), Duration::from_secs(30))
            .await?;

        let drive_file: DriveFile = serde_json::from_slice(&response.body).map_err(|e| {
            GoogleDriveError::ParseError(format!("Failed to parse file metadata: {}", e))
        })?;

        Ok(Self::convert_file(drive_file))
    }

    #[instrument(skip(self), fields(file_id = %file_id, range = ?range))]
    async fn download(&self, file_id: &str, range: Option<&str>) -> Result<RemoteContent> {
        let url = format!(
            "{}/files/{}?alt=media&supportsAllDrives=true",
            DRIVE_API_BASE,
            urlencoding::encode(file_id)
        );

        let response = self
            .get_with_retry(url, range, Some(file_id), Duration::from_secs(120))
            .await?;

        info!(bytes = response.body.len(), "Downloaded file content");

        Ok(RemoteContent {
            content_type: response.header("Content-Type").map(str::to_string),
            bytes: response.body,
        })
    }
}
