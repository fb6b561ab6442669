//! Authenticated file proxy
//!
//! Clients never hold long-lived store credentials. File bytes are fetched
//! from a server-side proxy that resolves an id on behalf of the current
//! session and enforces access control.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::{OfflineError, Result};

/// Content type assumed when the proxy does not send one
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Bytes returned by the proxy
#[derive(Debug, Clone)]
pub struct ProxiedFile {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Resolves a file id to its bytes for the current session
#[async_trait]
pub trait FileProxy: Send + Sync {
    async fn fetch(&self, file_id: &str) -> Result<ProxiedFile>;
}

/// [`FileProxy`] over HTTP: `GET {base_url}/{file_id}`
pub struct HttpFileProxy {
    http: Arc<dyn HttpClient>,
    base_url: String,
    session_token: RwLock<Option<String>>,
    timeout: Duration,
}

impl HttpFileProxy {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session_token: RwLock::new(None),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Install or replace the short-lived session token
    pub async fn set_session_token(&self, token: impl Into<String>) {
        *self.session_token.write().await = Some(token.into());
    }

    pub async fn clear_session(&self) {
        *self.session_token.write().await = None;
    }

    fn file_url(&self, file_id: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(file_id))
    }
}

#[async_trait]
impl FileProxy for HttpFileProxy {
    #[instrument(skip(self), fields(file_id = %file_id))]
    async fn fetch(&self, file_id: &str) -> Result<ProxiedFile> {
        let token = self
            .session_token
            .read()
            .await
            .clone()
            .ok_or(OfflineError::NoSession)?;

        let request = HttpRequest::get(self.file_url(file_id))
            .bearer_token(token)
            .timeout(self.timeout);
        let response = self.http.execute(request).await?;

        if !response.is_success() {
            return Err(OfflineError::Proxy {
                file_id: file_id.to_string(),
                status: response.status,
                message: response.text().unwrap_or_default(),
            });
        }

        let content_type = response
            .header("Content-Type")
            .map(str::to_string)
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
        debug!(bytes = response.body.len(), %content_type, "Fetched file through proxy");

        Ok(ProxiedFile {
            bytes: response.body,
            content_type,
        })
    }
}
