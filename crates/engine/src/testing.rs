//! Test doubles: a scripted network and store wrappers.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use edgecache_client::{Fetcher, PageRequest};
use edgecache_core::{CacheDb, CacheStore, EdgeResponse, Error, RequestKey};
use url::Url;

use crate::{Engine, EngineConfig, Generation};

pub const ORIGIN: &str = "https://www.bottamedi.test";

pub fn origin() -> Url {
    Url::parse(ORIGIN).unwrap()
}

pub fn url(path: &str) -> Url {
    origin().join(path).unwrap()
}

pub fn get(path: &str) -> PageRequest {
    PageRequest::get(url(path))
}

/// A 200 response captured now.
pub fn ok(body: &str) -> EdgeResponse {
    with_status(200, body)
}

pub fn with_status(status: u16, body: &str) -> EdgeResponse {
    EdgeResponse::new(status, vec![("date".into(), chrono::Utc::now().to_rfc2822())], body.to_string())
}

/// A 200 response captured `age` ago.
pub fn aged(body: &str, age: chrono::Duration) -> EdgeResponse {
    EdgeResponse::new(200, vec![("date".into(), (chrono::Utc::now() - age).to_rfc2822())], body.to_string())
}

/// How the stub network answers one URL.
#[derive(Debug, Clone)]
pub enum Reply {
    Respond(EdgeResponse),
    Delay(Duration, EdgeResponse),
    Fail,
    Hang,
}

/// Scripted network. Unscripted URLs fail like an unreachable host.
#[derive(Default)]
pub struct StubFetcher {
    replies: Mutex<HashMap<String, Reply>>,
    calls: AtomicUsize,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, path: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(url(path).to_string(), reply);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &PageRequest) -> Result<EdgeResponse, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.replies.lock().unwrap().get(request.url.as_str()).cloned();
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Delay(delay, response)) => {
                tokio::time::sleep(delay).await;
                Ok(response)
            }
            Some(Reply::Hang) => std::future::pending().await,
            Some(Reply::Fail) | None => Err(Error::Transport(format!("{}: connection refused", request.url))),
        }
    }
}

/// Store that fails every operation.
pub struct FailingStore;

#[async_trait]
impl CacheStore for FailingStore {
    async fn open(&self, _name: &str) -> Result<(), Error> {
        Err(Error::CorruptEntry("store unavailable".into()))
    }

    async fn get(&self, _name: &str, _key: &RequestKey) -> Result<Option<EdgeResponse>, Error> {
        Err(Error::CorruptEntry("store unavailable".into()))
    }

    async fn put(&self, _name: &str, _key: &RequestKey, _response: &EdgeResponse) -> Result<(), Error> {
        Err(Error::CorruptEntry("quota exceeded".into()))
    }

    async fn delete(&self, _name: &str, _key: &RequestKey) -> Result<bool, Error> {
        Err(Error::CorruptEntry("store unavailable".into()))
    }

    async fn delete_store(&self, _name: &str) -> Result<bool, Error> {
        Err(Error::CorruptEntry("store unavailable".into()))
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        Err(Error::CorruptEntry("store unavailable".into()))
    }

    async fn keys(&self, _name: &str) -> Result<Vec<RequestKey>, Error> {
        Err(Error::CorruptEntry("store unavailable".into()))
    }
}

/// SQLite store that counts every operation.
pub struct CountingStore {
    inner: CacheDb,
    calls: AtomicUsize,
}

impl CountingStore {
    pub async fn new() -> Self {
        Self { inner: CacheDb::open_in_memory().await.unwrap(), calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl CacheStore for CountingStore {
    async fn open(&self, name: &str) -> Result<(), Error> {
        self.hit();
        self.inner.open(name).await
    }

    async fn get(&self, name: &str, key: &RequestKey) -> Result<Option<EdgeResponse>, Error> {
        self.hit();
        self.inner.get(name, key).await
    }

    async fn put(&self, name: &str, key: &RequestKey, response: &EdgeResponse) -> Result<(), Error> {
        self.hit();
        self.inner.put(name, key, response).await
    }

    async fn delete(&self, name: &str, key: &RequestKey) -> Result<bool, Error> {
        self.hit();
        self.inner.delete(name, key).await
    }

    async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        self.hit();
        self.inner.delete_store(name).await
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.hit();
        self.inner.store_names().await
    }

    async fn keys(&self, name: &str) -> Result<Vec<RequestKey>, Error> {
        self.hit();
        self.inner.keys(name).await
    }
}

/// Config for the test origin with an explicit generation and no manifest.
pub fn config(generation: Generation) -> EngineConfig {
    EngineConfig::new(origin()).with_generation(generation).with_manifest(Vec::<String>::new())
}

/// Engine over `store` and `fetcher`, already activated.
pub async fn active_engine(store: Arc<dyn CacheStore>, fetcher: Arc<StubFetcher>) -> Engine {
    let engine = Engine::new(store, fetcher, config(Generation::new("site-cache", "v2")));
    engine.on_activate().await;
    engine
}
