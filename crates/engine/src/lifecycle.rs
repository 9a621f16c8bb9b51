//! Install and activate.
//!
//! ```text
//!   Idle --on_install--> Installed --on_activate--> Active
//!                            |  (skip-waiting set by install or SKIP_WAITING)
//! ```
//!
//! Install pre-populates the current generation from the manifest, one asset
//! at a time failing independently. Activate deletes every other generation
//! and claims the open page sessions, both at once.

use edgecache_client::{PageRequest, canonicalize};
use edgecache_core::{EdgeResponse, Error, RequestKey};
use futures_util::future::join_all;
use serde::Serialize;

use crate::engine::Engine;
use crate::sessions::PageMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    /// Installed and waiting to take over.
    Installed,
    Active,
}

#[derive(Debug)]
pub(crate) struct LifecycleState {
    pub(crate) phase: Phase,
    skip_waiting: bool,
    /// Install found generations of an earlier build.
    replacing: bool,
}

impl Default for LifecycleState {
    fn default() -> Self {
        Self { phase: Phase::Idle, skip_waiting: false, replacing: false }
    }
}

/// Outcome of [`Engine::on_install`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<String>,
}

/// Outcome of [`Engine::on_activate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivateReport {
    pub deleted: Vec<String>,
    pub claimed: usize,
}

impl Engine {
    /// Open the current generation and pre-populate it from the manifest.
    ///
    /// Never fails: every manifest entry that cannot be fetched or stored is
    /// logged and reported, and simply stays uncached.
    pub async fn on_install(&self) -> InstallReport {
        let name = self.cache_name();
        tracing::info!(generation = %name, "installing");

        if let Err(e) = self.store.open(&name).await {
            tracing::warn!("failed to open {}: {}", name, e);
        }

        let replacing = match self.store.store_names().await {
            Ok(names) => names.iter().any(|n| *n != name),
            Err(e) => {
                tracing::warn!("failed to list cache generations: {}", e);
                false
            }
        };

        let results = join_all(self.config.manifest.iter().map(|path| self.precache(path))).await;

        let mut report = InstallReport::default();
        for (path, result) in self.config.manifest.iter().zip(results) {
            match result {
                Ok(()) => report.cached.push(path.clone()),
                Err(e) => {
                    tracing::warn!("pre-cache of {} failed: {}", path, e);
                    report.failed.push(path.clone());
                }
            }
        }

        {
            let mut state = self.lifecycle.write().await;
            state.phase = Phase::Installed;
            state.skip_waiting = true;
            state.replacing = replacing;
        }

        tracing::info!(
            generation = %name,
            cached = report.cached.len(),
            failed = report.failed.len(),
            "installed"
        );
        report
    }

    /// Installed and asking to take over without waiting for old sessions.
    pub async fn wants_activation(&self) -> bool {
        let state = self.lifecycle.read().await;
        state.phase == Phase::Installed && state.skip_waiting
    }

    /// Delete every other generation and claim all open page sessions.
    pub async fn on_activate(&self) -> ActivateReport {
        let name = self.cache_name();
        tracing::info!(generation = %name, "activating");

        let (deleted, claimed) = tokio::join!(self.delete_other_generations(), self.sessions.claim(self.version()));

        let replacing = {
            let mut state = self.lifecycle.write().await;
            state.phase = Phase::Active;
            std::mem::take(&mut state.replacing)
        };

        if replacing {
            let reached = self
                .sessions
                .broadcast(PageMessage::UpdateAvailable { version: self.version().to_string() })
                .await;
            tracing::info!(version = self.version(), sessions = reached, "announced update");
        }

        tracing::info!(generation = %name, deleted = deleted.len(), claimed, "active");
        ActivateReport { deleted, claimed }
    }

    /// Activate now if an installed engine is waiting.
    pub(crate) async fn skip_waiting(&self) {
        let waiting = {
            let mut state = self.lifecycle.write().await;
            state.skip_waiting = true;
            state.phase == Phase::Installed
        };
        if waiting {
            self.on_activate().await;
        } else {
            tracing::debug!("skip waiting: nothing waiting to activate");
        }
    }

    async fn precache(&self, path: &str) -> Result<(), Error> {
        let url = canonicalize(path, Some(&self.config.origin)).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let response = self.fetcher.fetch(&PageRequest::get(url.clone())).await?;
        if !response.is_ok() {
            return Err(Error::Transport(format!("{} returned {}", url, response.status)));
        }

        let mut entry: EdgeResponse = response;
        entry.stamp_if_missing(chrono::Utc::now());
        self.store.put(&self.cache_name(), &RequestKey::get(url.as_str()), &entry).await
    }

    async fn delete_other_generations(&self) -> Vec<String> {
        let current = self.cache_name();
        let names = match self.store.store_names().await {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!("failed to list cache generations: {}", e);
                return Vec::new();
            }
        };

        let stale: Vec<String> = names.into_iter().filter(|n| *n != current).collect();
        let results = join_all(stale.iter().map(|n| self.store.delete_store(n))).await;

        stale
            .into_iter()
            .zip(results)
            .filter_map(|(name, result)| match result {
                Ok(_) => {
                    tracing::info!("deleted old cache generation {}", name);
                    Some(name)
                }
                Err(e) => {
                    tracing::warn!("failed to delete cache generation {}: {}", name, e);
                    None
                }
            })
            .collect()
    }
}
