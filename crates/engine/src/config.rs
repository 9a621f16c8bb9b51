//! Compiled-in identity of the engine and its runtime configuration.

use std::time::Duration;

use edgecache_core::{AppConfig, Error};
use url::Url;

/// Name of the cache store; combined with [`CACHE_VERSION`] into the
/// generation name.
pub const STORE_NAME: &str = "bottamedi-cache";

/// Version of this engine build. Bumping it creates a new generation and
/// makes activation delete every other one.
pub const CACHE_VERSION: &str = "v2";

/// Same-origin paths fetched and stored during install.
pub const PRECACHE_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/manifest.json",
    "/logo-bottamedi.webp",
    "/favicon.webp",
    "/apple-touch-icon.webp",
    "/images/poster.webp",
    "/images/banchetto.webp",
];

/// How long a critical document waits on the network before the cache answers.
pub const NETWORK_FIRST_TIMEOUT: Duration = Duration::from_secs(3);

/// Age after which a cached image is refreshed.
pub const IMAGE_MAX_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// One versioned instance of the cache store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    store: String,
    version: String,
}

impl Generation {
    pub fn new(store: impl Into<String>, version: impl Into<String>) -> Self {
        Self { store: store.into(), version: version.into() }
    }

    /// The generation this build owns.
    pub fn current() -> Self {
        Self::new(STORE_NAME, CACHE_VERSION)
    }

    /// Store name, e.g. `bottamedi-cache-v2`.
    pub fn name(&self) -> String {
        format!("{}-{}", self.store, self.version)
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

impl Default for Generation {
    fn default() -> Self {
        Self::current()
    }
}

/// Everything the engine needs besides its store and its network.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Only GET requests to this origin are intercepted.
    pub origin: Url,
    pub generation: Generation,
    /// Paths (relative to `origin`) pre-populated on install.
    pub manifest: Vec<String>,
    pub network_timeout: Duration,
    pub image_max_age: Duration,
}

impl EngineConfig {
    /// Compiled-in defaults for `origin`.
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            generation: Generation::current(),
            manifest: PRECACHE_MANIFEST.iter().map(|p| p.to_string()).collect(),
            network_timeout: NETWORK_FIRST_TIMEOUT,
            image_max_age: IMAGE_MAX_AGE,
        }
    }

    /// Build from the loaded application configuration.
    pub fn from_app(config: &AppConfig) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("{}: {e}", config.origin)))?;
        Ok(Self { network_timeout: config.network_timeout(), image_max_age: config.image_max_age(), ..Self::new(origin) })
    }

    pub fn with_generation(mut self, generation: Generation) -> Self {
        self.generation = generation;
        self
    }

    pub fn with_manifest<I, S>(mut self, manifest: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.manifest = manifest.into_iter().map(Into::into).collect();
        self
    }
}
