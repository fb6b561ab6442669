//! # Core Runtime Module
//!
//! Runtime infrastructure shared by the library engine crates:
//! - [`config`]: validated [`LibraryConfig`](config::LibraryConfig) built with a builder
//! - [`logging`]: `tracing-subscriber` setup and redaction helpers

pub mod config;
pub mod error;
pub mod logging;

pub use config::{LibraryConfig, LibraryConfigBuilder};
pub use error::{Error, Result};
