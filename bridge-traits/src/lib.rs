//! # Host Bridge Traits
//!
//! Capability contracts between the library sync core and the outside world.
//!
//! ## Overview
//!
//! The core never talks to a network, a disk or a clock directly. Every such
//! capability is expressed as a trait here and injected by the host:
//!
//! - [`HttpClient`](http::HttpClient) - Async HTTP with retry policy
//! - [`StorageProvider`](storage::StorageProvider) - The authoritative external
//!   file store (paginated listing, metadata, content)
//! - [`OfflineStore`](storage::OfflineStore) - Local durable byte cache used
//!   for offline replication
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](log::LoggerSink) - Forward structured logs to host logging
//!
//! Desktop implementations live in `bridge-desktop`; the Google Drive
//! `StorageProvider` lives in `provider-google-drive`.
//!
//! ## Error Handling
//!
//! All bridge traits use [`BridgeError`](error::BridgeError). Implementations
//! should convert platform errors into it and keep messages actionable
//! (file ids, HTTP status, paths).
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so they can be shared as
//! `Arc<dyn Trait>` across async tasks.

pub mod error;
pub mod http;
pub mod log;
pub mod storage;
pub mod time;

pub use error::BridgeError;

pub use http::{HttpClient, HttpRequest, HttpResponse, RetryPolicy};
pub use storage::{
    CachedFile, OfflineStore, RemoteContent, RemoteFile, RemotePage, StorageProvider,
    FOLDER_MIME_TYPE,
};
pub use log::{ConsoleLogger, LogEntry, LogLevel, LoggerSink};
pub use time::{Clock, FixedClock, SystemClock};
