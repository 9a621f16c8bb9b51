use std::time::Duration;

use edgecache_client::PageRequest;
use edgecache_core::is_stale;

use super::{ASSET_OFFLINE_BODY, IMAGE_UNAVAILABLE_BODY, Served, StrategyContext, cache_key};

/// Serve from cache; go to the network only on a miss.
///
/// Whatever the network delivers is returned. Responses below 400 are stored;
/// error statuses are passed on without pinning them in a cache that only a
/// version bump or an explicit clear would flush.
pub async fn cache_first(ctx: &StrategyContext, request: &PageRequest) -> Served {
    let key = cache_key(request);

    if let Some(cached) = ctx.lookup(&key).await {
        tracing::debug!("cache hit for {}", request.url);
        return Served::cache(cached);
    }

    match ctx.fetcher.fetch(request).await {
        Ok(response) => {
            if response.status < 400 {
                ctx.store(&key, &response).await;
            }
            Served::network(response)
        }
        Err(e) => {
            tracing::debug!("{} unavailable: {}", request.url, e);
            Served::synthetic(503, ASSET_OFFLINE_BODY)
        }
    }
}

/// Cache first, but refetch entries older than `max_age`.
///
/// When the refetch does not produce a 200, a stale copy still beats nothing.
pub async fn cache_first_with_refresh(ctx: &StrategyContext, request: &PageRequest, max_age: Duration) -> Served {
    let key = cache_key(request);
    let cached = ctx.lookup(&key).await;

    if let Some(hit) = &cached
        && !is_stale(hit, max_age, chrono::Utc::now())
    {
        tracing::debug!("fresh cache hit for {}", request.url);
        return Served::cache(hit.clone());
    }

    match ctx.fetcher.fetch(request).await {
        Ok(response) if response.is_ok() => {
            ctx.store(&key, &response).await;
            Served::network(response)
        }
        Ok(response) => match cached {
            Some(stale) => {
                tracing::debug!("refresh of {} returned {}, serving stale copy", request.url, response.status);
                Served::cache(stale)
            }
            None => Served::network(response),
        },
        Err(e) => match cached {
            Some(stale) => {
                tracing::debug!("refresh of {} failed ({}), serving stale copy", request.url, e);
                Served::cache(stale)
            }
            None => Served::synthetic(404, IMAGE_UNAVAILABLE_BODY),
        },
    }
}
