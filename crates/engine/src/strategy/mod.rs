//! Caching strategies and the table routing asset classes to them.
//!
//! | class              | strategy                          |
//! |--------------------|-----------------------------------|
//! | `CriticalDocument` | network first, 3s race            |
//! | `HashedBuildAsset` | stale while revalidate            |
//! | `ImageAsset`       | cache first, refreshed after 7d   |
//! | `StaticAsset`      | cache first                       |
//!
//! Exactly one strategy runs per request and strategies never call each
//! other. Store failures are logged and read as misses (on lookup) or
//! ignored (on write); no strategy caches a synthetic response.

mod cache_first;
mod network_first;
mod stale_while_revalidate;

pub use cache_first::{cache_first, cache_first_with_refresh};
pub use network_first::network_first;
pub use stale_while_revalidate::stale_while_revalidate;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use edgecache_client::{Fetcher, PageRequest};
use edgecache_core::{CacheStore, EdgeResponse, Error, RequestKey};
use serde::Serialize;

use crate::classify::AssetClass;
use crate::tasks::BackgroundTasks;

/// Body of the 503 served when a critical document is unavailable.
pub const DOCUMENT_OFFLINE_BODY: &str = "Contenuto non disponibile offline";

/// Body of the 404 served when an image is neither cached nor reachable.
pub const IMAGE_UNAVAILABLE_BODY: &str = "Risorsa non disponibile";

/// Body of the 503 served when a static asset is neither cached nor reachable.
pub const ASSET_OFFLINE_BODY: &str = "Risorsa non disponibile offline";

/// A caching algorithm with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    NetworkFirst { timeout: Duration },
    StaleWhileRevalidate,
    CacheFirstWithRefresh { max_age: Duration },
    CacheFirst,
}

/// Where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    Synthetic,
    PassThrough,
}

/// A response together with the path that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Served {
    pub response: EdgeResponse,
    pub source: ResponseSource,
}

impl Served {
    pub fn network(response: EdgeResponse) -> Self {
        Self { response, source: ResponseSource::Network }
    }

    pub fn cache(response: EdgeResponse) -> Self {
        Self { response, source: ResponseSource::Cache }
    }

    pub fn synthetic(status: u16, body: &'static str) -> Self {
        Self { response: EdgeResponse::synthetic(status, body), source: ResponseSource::Synthetic }
    }

    pub fn pass_through(response: EdgeResponse) -> Self {
        Self { response, source: ResponseSource::PassThrough }
    }
}

/// Mapping from asset class to strategy.
#[derive(Debug, Clone)]
pub struct DispatchTable {
    routes: HashMap<AssetClass, Strategy>,
}

impl DispatchTable {
    pub fn new(network_timeout: Duration, image_max_age: Duration) -> Self {
        let routes = HashMap::from([
            (AssetClass::CriticalDocument, Strategy::NetworkFirst { timeout: network_timeout }),
            (AssetClass::HashedBuildAsset, Strategy::StaleWhileRevalidate),
            (AssetClass::ImageAsset, Strategy::CacheFirstWithRefresh { max_age: image_max_age }),
            (AssetClass::StaticAsset, Strategy::CacheFirst),
        ]);
        Self { routes }
    }

    pub fn strategy_for(&self, class: AssetClass) -> Strategy {
        self.routes.get(&class).copied().unwrap_or(Strategy::CacheFirst)
    }
}

/// What a strategy needs: the current generation of the store, the network
/// and somewhere to park background work.
#[derive(Clone)]
pub struct StrategyContext {
    pub store: Arc<dyn CacheStore>,
    pub fetcher: Arc<dyn Fetcher>,
    pub cache_name: String,
    pub tasks: BackgroundTasks,
}

impl StrategyContext {
    /// Cache lookup; a store error reads as a miss.
    pub async fn lookup(&self, key: &RequestKey) -> Option<EdgeResponse> {
        match self.store.get(&self.cache_name, key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!("cache lookup failed for {}: {}", key.url, e);
                None
            }
        }
    }

    /// Whole-entry write; a store error leaves the entry uncached.
    pub async fn store(&self, key: &RequestKey, response: &EdgeResponse) {
        let mut entry = response.clone();
        entry.stamp_if_missing(chrono::Utc::now());
        if let Err(e) = self.store.put(&self.cache_name, key, &entry).await {
            tracing::warn!("cache write failed for {}: {}", key.url, e);
        }
    }
}

/// Run `strategy` for `request`.
///
/// Only [`Strategy::StaleWhileRevalidate`] can fail, on a cold miss whose
/// fetch fails.
pub async fn run(strategy: Strategy, ctx: &StrategyContext, request: &PageRequest) -> Result<Served, Error> {
    match strategy {
        Strategy::NetworkFirst { timeout } => Ok(network_first(ctx, request, timeout).await),
        Strategy::StaleWhileRevalidate => stale_while_revalidate(ctx, request).await,
        Strategy::CacheFirstWithRefresh { max_age } => Ok(cache_first_with_refresh(ctx, request, max_age).await),
        Strategy::CacheFirst => Ok(cache_first(ctx, request).await),
    }
}

pub(crate) fn cache_key(request: &PageRequest) -> RequestKey {
    RequestKey::new(request.method.as_str(), key_url(&request.url).as_str())
}

/// The URL a cache entry is keyed by: query kept, fragment dropped.
pub(crate) fn key_url(url: &url::Url) -> url::Url {
    let mut key = url.clone();
    key.set_fragment(None);
    key
}
