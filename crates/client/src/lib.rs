//! Client code for edgecache.
//!
//! This crate provides the network side of the cache: the `Fetcher` seam,
//! the reqwest-backed HTTP client and URL helpers shared by the engine and
//! the server.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, Fetcher, PageRequest, UrlError, canonicalize, same_origin};

pub use reqwest::Method;
