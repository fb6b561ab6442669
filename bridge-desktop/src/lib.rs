//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop hosts
//! (macOS, Windows, Linux):
//! - [`ReqwestHttpClient`]: `HttpClient` using `reqwest`
//! - [`FileOfflineStore`]: `OfflineStore` using `tokio::fs`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{FileOfflineStore, ReqwestHttpClient};
//! use std::sync::Arc;
//!
//! let http = Arc::new(ReqwestHttpClient::try_new()?);
//! let offline = Arc::new(FileOfflineStore::in_default_location());
//! ```

mod http;
mod offline_store;

pub use http::ReqwestHttpClient;
pub use offline_store::FileOfflineStore;
