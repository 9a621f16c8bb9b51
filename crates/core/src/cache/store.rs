//! The store abstraction the engine reads and writes through.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::hash::compute_entry_key;
use crate::{EdgeResponse, Error};

/// Identity of a cached request: method plus the full URL, query included.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self { method: method.into().to_ascii_uppercase(), url: url.into() }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new("GET", url)
    }

    /// Only GET requests may be stored.
    pub fn is_cacheable(&self) -> bool {
        self.method == "GET"
    }

    pub fn hash(&self) -> String {
        compute_entry_key(&self.method, &self.url)
    }
}

/// A set of named cache generations, each mapping request keys to responses.
///
/// Writes are whole-entry replacements; implementations must be safe for
/// concurrent readers and writers without external locking.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Open (creating if absent) the generation `name`.
    async fn open(&self, name: &str) -> Result<(), Error>;

    /// Look up the entry for `key` in generation `name`.
    async fn get(&self, name: &str, key: &RequestKey) -> Result<Option<EdgeResponse>, Error>;

    /// Store `response` under `key`, replacing any previous entry.
    async fn put(&self, name: &str, key: &RequestKey, response: &EdgeResponse) -> Result<(), Error>;

    /// Delete one entry. Returns whether it existed.
    async fn delete(&self, name: &str, key: &RequestKey) -> Result<bool, Error>;

    /// Delete a whole generation and its entries. Returns whether it existed.
    async fn delete_store(&self, name: &str) -> Result<bool, Error>;

    /// Names of all existing generations.
    async fn store_names(&self) -> Result<Vec<String>, Error>;

    /// Keys of every entry in generation `name`, oldest write first.
    async fn keys(&self, name: &str) -> Result<Vec<RequestKey>, Error>;
}
