//! SQLite-backed, versioned cache store.
//!
//! This module provides the persistent store the edge cache reads and writes
//! through. It supports:
//!
//! - Named generations (one per engine version), listed and deleted wholesale
//! - Entries keyed by request identity (method + full URL)
//! - Automatic schema migrations
//! - WAL mode for concurrent access

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod store;

pub use crate::Error;

pub use connection::CacheDb;
pub use store::{CacheStore, RequestKey};
