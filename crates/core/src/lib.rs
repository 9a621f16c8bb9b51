//! Core types and shared functionality for edgecache.
//!
//! This crate provides:
//! - Versioned cache store with SQLite backend
//! - The response type shared by network, cache and synthetic paths
//! - Staleness evaluation
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod response;
pub mod staleness;

pub use cache::{CacheDb, CacheStore, RequestKey};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use response::EdgeResponse;
pub use staleness::is_stale;
