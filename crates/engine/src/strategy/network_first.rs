use std::time::Duration;

use edgecache_client::PageRequest;
use tokio::sync::oneshot;

use super::{DOCUMENT_OFFLINE_BODY, Served, StrategyContext, cache_key};

/// Race the network against `timeout`; fall back to the cache, then to a 503.
///
/// The fetch runs as a background task so losing the race does not cancel
/// it; its late result is discarded.
pub async fn network_first(ctx: &StrategyContext, request: &PageRequest, timeout: Duration) -> Served {
    let key = cache_key(request);

    let (tx, rx) = oneshot::channel();
    let fetcher = ctx.fetcher.clone();
    let race_request = request.clone();
    ctx.tasks.spawn(async move {
        let _ = tx.send(fetcher.fetch(&race_request).await);
    });

    match tokio::time::timeout(timeout, rx).await {
        Ok(Ok(Ok(response))) if response.is_ok() => {
            ctx.store(&key, &response).await;
            return Served::network(response);
        }
        Ok(Ok(Ok(response))) => {
            tracing::debug!("network returned {} for {}, trying cache", response.status, request.url);
        }
        Ok(Ok(Err(e))) => tracing::debug!("network failed for {}: {}, trying cache", request.url, e),
        Ok(Err(_)) => tracing::warn!("network task for {} dropped", request.url),
        Err(_) => tracing::debug!("network slower than {:?} for {}, trying cache", timeout, request.url),
    }

    match ctx.lookup(&key).await {
        Some(cached) => Served::cache(cached),
        None => Served::synthetic(503, DOCUMENT_OFFLINE_BODY),
    }
}
