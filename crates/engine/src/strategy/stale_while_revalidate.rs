use edgecache_client::PageRequest;
use edgecache_core::Error;
use tokio::sync::oneshot;

use super::{Served, StrategyContext, cache_key};

/// Serve the cached copy immediately and refresh it in the background.
///
/// The refresh starts on every request. On a cold miss the caller waits for
/// that same fetch, and a transport failure is returned as an error: there is
/// no second source to fall back to.
pub async fn stale_while_revalidate(ctx: &StrategyContext, request: &PageRequest) -> Result<Served, Error> {
    let key = cache_key(request);
    let cached = ctx.lookup(&key).await;

    let (tx, rx) = oneshot::channel();
    let revalidate = ctx.clone();
    let revalidate_request = request.clone();
    ctx.tasks.spawn(async move {
        let result = revalidate.fetcher.fetch(&revalidate_request).await;
        match &result {
            Ok(response) if response.is_ok() => revalidate.store(&key, response).await,
            Ok(response) => {
                tracing::debug!("revalidation of {} returned {}, keeping cache", revalidate_request.url, response.status)
            }
            Err(e) => tracing::debug!("revalidation of {} failed: {}", revalidate_request.url, e),
        }
        let _ = tx.send(result);
    });

    if let Some(cached) = cached {
        return Ok(Served::cache(cached));
    }

    match rx.await {
        Ok(result) => result.map(Served::network),
        Err(_) => Err(Error::Transport(format!("revalidation of {} was dropped", request.url))),
    }
}
