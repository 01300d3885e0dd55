use tokio::time::interval;

use crate::{constants::LIMITER_EVICTION_INTERVAL, limiter::rate_limiter::RateLimiterStore};

/// Periodically drops idle contact-form rate limit buckets so the map does
/// not grow with every client ever seen.
pub async fn start_limiter_eviction(limiter: RateLimiterStore) {
    let mut interval = interval(LIMITER_EVICTION_INTERVAL);

    loop {
        interval.tick().await;

        let removed = limiter.evict_idle();
        if removed > 0 {
            tracing::debug!(
                removed,
                remaining = limiter.tracked_clients(),
                "Evicted idle rate limit buckets"
            );
        }
    }
}
