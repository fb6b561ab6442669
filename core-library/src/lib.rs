//! # Library Index
//!
//! The queryable local projection of the external file store.
//!
//! ## Overview
//!
//! - [`models`]: [`FileDescriptor`], [`IndexEntry`] and the derived [`Ghost`] view
//! - [`store`]: the [`IndexStore`] contract with bounded atomic [`WriteBatch`]es,
//!   plus [`MemoryIndexStore`]
//! - [`sqlite_store`]: [`SqliteIndexStore`] over the pool from [`db`]

pub mod db;
pub mod error;
pub mod models;
pub mod sqlite_store;
pub mod store;

pub use error::{LibraryError, Result};
pub use models::{FileDescriptor, Ghost, IndexEntry};
pub use sqlite_store::SqliteIndexStore;
pub use store::{BatchOutcome, IndexStore, MemoryIndexStore, WriteBatch, WriteOp};
