//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridge implementations (external store,
//! index store, clock, identity verifier) into the sync engine and exposes
//! the operator routes through [`LibraryService`]. Desktop apps typically
//! enable the `desktop-shims` feature, which provides [`bootstrap_desktop`]
//! over reqwest, Google Drive and SQLite. The `offline` feature adds
//! `build_offline_manager` for file-backed offline replication.

pub mod error;
pub mod service;

#[cfg(feature = "desktop-shims")]
mod bootstrap;

pub use error::{CoreError, Result};
pub use service::{LibraryDependencies, LibraryService, ScanResponse};

#[cfg(feature = "desktop-shims")]
pub use bootstrap::bootstrap_desktop;

#[cfg(all(feature = "desktop-shims", feature = "offline"))]
pub use bootstrap::build_offline_manager;
