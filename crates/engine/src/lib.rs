//! Edge cache engine.
//!
//! Sits between a page and the network. Same-origin GET requests are
//! classified by URL and served by one of four strategies; everything else
//! goes straight to the network. Each build owns one named cache generation,
//! pre-populated on install; activation deletes all the others.

pub mod classify;
pub mod config;
pub mod control;
pub mod engine;
pub mod lifecycle;
pub mod sessions;
pub mod strategy;
pub mod tasks;

#[cfg(test)]
mod testing;

pub use classify::{AssetClass, classify, is_intercepted};
pub use config::{
    CACHE_VERSION, EngineConfig, Generation, IMAGE_MAX_AGE, NETWORK_FIRST_TIMEOUT, PRECACHE_MANIFEST, STORE_NAME,
};
pub use control::{ControlMessage, ControlReply};
pub use engine::Engine;
pub use lifecycle::{ActivateReport, InstallReport, Phase};
pub use sessions::{PageMessage, PageSession, SessionId, Sessions};
pub use strategy::{ResponseSource, Served, Strategy};
pub use tasks::BackgroundTasks;
