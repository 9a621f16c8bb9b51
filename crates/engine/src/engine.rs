//! The engine object and its request entry point.

use std::sync::Arc;

use edgecache_client::{Fetcher, PageRequest};
use edgecache_core::{CacheStore, EdgeResponse, Error, RequestKey};
use tokio::sync::RwLock;

use crate::classify::{classify, is_intercepted};
use crate::config::EngineConfig;
use crate::lifecycle::{LifecycleState, Phase};
use crate::sessions::Sessions;
use crate::strategy::{self, DispatchTable, Served, StrategyContext, key_url};
use crate::tasks::BackgroundTasks;

/// Client-side edge cache.
///
/// Cloning is cheap; clones share the store, the network, the lifecycle
/// state, the page sessions and the background tasks.
#[derive(Clone)]
pub struct Engine {
    pub(crate) store: Arc<dyn CacheStore>,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) config: Arc<EngineConfig>,
    pub(crate) dispatch: Arc<DispatchTable>,
    pub(crate) lifecycle: Arc<RwLock<LifecycleState>>,
    pub(crate) sessions: Sessions,
    pub(crate) tasks: BackgroundTasks,
}

impl Engine {
    pub fn new(store: Arc<dyn CacheStore>, fetcher: Arc<dyn Fetcher>, config: EngineConfig) -> Self {
        let dispatch = DispatchTable::new(config.network_timeout, config.image_max_age);
        Self {
            store,
            fetcher,
            config: Arc::new(config),
            dispatch: Arc::new(dispatch),
            lifecycle: Arc::new(RwLock::new(LifecycleState::default())),
            sessions: Sessions::new(),
            tasks: BackgroundTasks::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sessions(&self) -> &Sessions {
        &self.sessions
    }

    /// Name of the generation this engine owns.
    pub fn cache_name(&self) -> String {
        self.config.generation.name()
    }

    pub fn version(&self) -> &str {
        self.config.generation.version()
    }

    pub async fn phase(&self) -> Phase {
        self.lifecycle.read().await.phase
    }

    /// Wait for background revalidations to finish.
    pub async fn settle(&self) {
        self.tasks.settle().await;
    }

    /// Handle one request from the page.
    ///
    /// Non-GET, cross-origin, and any request reaching an engine that is not
    /// active yet go straight to the network without touching the store.
    pub async fn on_request(&self, request: &PageRequest) -> Result<Served, Error> {
        if !is_intercepted(request, &self.config.origin) || self.phase().await != Phase::Active {
            return self.pass_through(request).await;
        }

        let class = classify(&request.url);
        let strategy = self.dispatch.strategy_for(class);
        tracing::debug!(url = %request.url, ?class, ?strategy, "dispatching request");

        let served = strategy::run(strategy, &self.strategy_context(), request).await;
        if let Err(e) = &served {
            tracing::warn!("{} failed with no fallback: {}", request.url, e);
        }
        served
    }

    /// Entry for `url` in the current generation.
    pub async fn cached(&self, url: &url::Url) -> Result<Option<EdgeResponse>, Error> {
        self.store.get(&self.cache_name(), &RequestKey::get(key_url(url).as_str())).await
    }

    /// Drop the entry for `url` from the current generation.
    pub async fn purge(&self, url: &url::Url) -> Result<bool, Error> {
        self.store.delete(&self.cache_name(), &RequestKey::get(key_url(url).as_str())).await
    }

    pub(crate) fn strategy_context(&self) -> StrategyContext {
        StrategyContext {
            store: self.store.clone(),
            fetcher: self.fetcher.clone(),
            cache_name: self.cache_name(),
            tasks: self.tasks.clone(),
        }
    }

    async fn pass_through(&self, request: &PageRequest) -> Result<Served, Error> {
        tracing::trace!("passing through {} {}", request.method, request.url);
        self.fetcher.fetch(request).await.map(Served::pass_through)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Generation;
    use crate::strategy::{DOCUMENT_OFFLINE_BODY, ResponseSource};
    use crate::testing::{CountingStore, Reply, StubFetcher, active_engine, config, get, ok, url};
    use edgecache_client::Method;
    use edgecache_core::CacheDb;
    use std::time::Duration;

    #[tokio::test]
    async fn test_non_get_never_touches_store() {
        let store = Arc::new(CountingStore::new().await);
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.on("/api/contact", Reply::Respond(ok("sent")));
        let engine = active_engine(store.clone(), fetcher.clone()).await;
        let before = store.calls();

        let served = engine
            .on_request(&PageRequest::new(Method::POST, url("/api/contact")))
            .await
            .unwrap();

        assert_eq!(served.source, ResponseSource::PassThrough);
        assert_eq!(store.calls(), before);
    }

    #[tokio::test]
    async fn test_cross_origin_never_touches_store() {
        let store = Arc::new(CountingStore::new().await);
        let fetcher = Arc::new(StubFetcher::new());
        let engine = active_engine(store.clone(), fetcher.clone()).await;
        let before = store.calls();

        let cross = PageRequest::get(url::Url::parse("https://fonts.example.com/inter.css").unwrap());
        let result = engine.on_request(&cross).await;

        assert!(result.unwrap_err().is_transport());
        assert_eq!(store.calls(), before);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_inactive_engine_passes_through() {
        let store = Arc::new(CountingStore::new().await);
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.on("/manifest.json", Reply::Respond(ok("{}")));
        let engine = Engine::new(store.clone(), fetcher.clone(), config(Generation::new("site-cache", "v2")));

        let served = engine.on_request(&get("/manifest.json")).await.unwrap();

        assert_eq!(served.source, ResponseSource::PassThrough);
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_critical_documents_use_network_first() {
        let store = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.on("/index.html?utm_source=mail", Reply::Hang);
        let engine = active_engine(store, fetcher).await;

        let served = engine.on_request(&get("/index.html?utm_source=mail")).await.unwrap();

        // only network-first answers a hanging fetch with the offline document
        assert_eq!(served.response.status, 503);
        assert_eq!(&served.response.body[..], DOCUMENT_OFFLINE_BODY.as_bytes());
    }

    #[tokio::test]
    async fn test_hashed_assets_use_stale_while_revalidate() {
        let store = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(StubFetcher::new());
        let engine = active_engine(store, fetcher).await;

        let hashed = engine.on_request(&get("/assets/index-4f3c2a1b.js")).await;
        let plain = engine.on_request(&get("/assets/index.js")).await.unwrap();

        // cold miss + dead network: only stale-while-revalidate surfaces an error
        assert!(hashed.is_err());
        assert_eq!(plain.source, ResponseSource::Synthetic);
        assert_eq!(plain.response.status, 503);
    }

    #[tokio::test]
    async fn test_images_use_cache_first_with_refresh() {
        let store = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let engine = active_engine(store, Arc::new(StubFetcher::new())).await;

        let served = engine.on_request(&get("/images/poster.webp")).await.unwrap();

        assert_eq!(served.response.status, 404);
    }

    #[tokio::test]
    async fn test_cache_first_twice_is_one_network_call() {
        let store = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.on("/manifest.json", Reply::Respond(ok("{}")));
        let engine = active_engine(store, fetcher.clone()).await;

        engine.on_request(&get("/manifest.json")).await.unwrap();
        let second = engine.on_request(&get("/manifest.json")).await.unwrap();

        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_network_first_write_is_readable_by_cache_first() {
        let store = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(StubFetcher::new());
        let page = ok("<html>home</html>");
        fetcher.on("/", Reply::Delay(Duration::from_secs(1), page.clone()));
        let engine = active_engine(store, fetcher.clone()).await;

        let written = engine.on_request(&get("/")).await.unwrap();
        assert_eq!(written.source, ResponseSource::Network);

        let read = strategy::cache_first(&engine.strategy_context(), &get("/")).await;

        assert_eq!(read.source, ResponseSource::Cache);
        assert_eq!(read.response.status, written.response.status);
        assert_eq!(read.response.body, written.response.body);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_fragment_does_not_change_cache_identity() {
        let store = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.on("/manifest.json", Reply::Respond(ok("{}")));
        let engine = active_engine(store.clone(), fetcher.clone()).await;

        engine.on_request(&get("/manifest.json")).await.unwrap();
        let second = engine.on_request(&get("/manifest.json#install")).await.unwrap();

        assert_eq!(second.source, ResponseSource::Cache);
        assert_eq!(&second.response.body[..], b"{}");
        assert_eq!(fetcher.calls(), 1);
        assert_eq!(store.keys("site-cache-v2").await.unwrap().len(), 1);
        assert!(engine.cached(&url("/manifest.json#top")).await.unwrap().is_some());
        assert!(engine.purge(&url("/manifest.json#top")).await.unwrap());
    }

    #[tokio::test]
    async fn test_cached_and_purge() {
        let store = Arc::new(CacheDb::open_in_memory().await.unwrap());
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.on("/manifest.json", Reply::Respond(ok("{}")));
        let engine = active_engine(store, fetcher).await;

        engine.on_request(&get("/manifest.json")).await.unwrap();
        assert!(engine.cached(&url("/manifest.json")).await.unwrap().is_some());

        assert!(engine.purge(&url("/manifest.json")).await.unwrap());
        assert!(engine.cached(&url("/manifest.json")).await.unwrap().is_none());
    }
}
