//! # Google Drive Provider
//!
//! Implements `StorageProvider` for Google Drive API v3.
//!
//! ## Overview
//!
//! This module provides:
//! - Paginated listing of a folder's children or of the whole accessible scope
//! - Server-side trashed filtering (`trashed=false`)
//! - Metadata lookup and content download with range support
//! - Exponential backoff on rate limiting and server errors
//!
//! Authentication is out of scope: the connector receives an access token
//! obtained by the host.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::GoogleDriveConnector;
pub use error::{GoogleDriveError, Result};
