use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use dashmap::DashMap;
use parking_lot::Mutex;

/// A token bucket which allows fractional tokens for precise refill
#[derive(Debug)]
struct TokenBucket {
    capacity: f64,
    tokens: f64,
    refill_per_sec: f64,
    last_refill: Instant,
    last_seen: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, refill_per_sec: f64, now: Instant) -> Self {
        Self {
            capacity,
            tokens: capacity,
            refill_per_sec,
            last_refill: now,
            last_seen: now,
        }
    }

    fn refill(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.last_refill).as_secs_f64();
        if elapsed > 0.0 {
            self.tokens = (self.tokens + elapsed * self.refill_per_sec).min(self.capacity);
            self.last_refill = now;
        }
    }

    /// Small epsilon to avoid fp surprises
    fn try_consume(&mut self, now: Instant) -> RateDecision {
        self.last_seen = now;
        self.refill(now);

        if self.tokens + 1e-9 >= 1.0 {
            self.tokens -= 1.0;
            RateDecision::Allowed {
                remaining: self.tokens.floor().max(0.0) as u32,
            }
        } else {
            let missing = 1.0 - self.tokens;
            let secs = (missing / self.refill_per_sec).ceil().max(1.0) as u64;
            RateDecision::Limited {
                retry_after: Duration::from_secs(secs),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

type Key = String;

/// Per-client token buckets: `limit` requests per `window`, refilled continuously.
#[derive(Clone)]
pub struct RateLimiterStore {
    map: Arc<DashMap<Key, Arc<Mutex<TokenBucket>>>>,
    capacity: f64,
    refill_per_sec: f64,
    window: Duration,
}

impl RateLimiterStore {
    pub fn per_window(limit: u32, window: Duration) -> Self {
        let capacity = f64::from(limit.max(1));
        let window_secs = window.as_secs_f64().max(1.0);

        Self {
            map: Arc::new(DashMap::new()),
            capacity,
            refill_per_sec: capacity / window_secs,
            window,
        }
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let bucket = self.get_bucket(key, now);
        let mut b = bucket.lock();
        b.try_consume(now)
    }

    fn get_bucket(&self, key: &str, now: Instant) -> Arc<Mutex<TokenBucket>> {
        if let Some(existing) = self.map.get(key) {
            return existing.clone();
        }

        self.map
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(TokenBucket::new(self.capacity, self.refill_per_sec, now))))
            .clone()
    }

    /// Drops buckets that have been idle for a full window; they would be full again anyway.
    /// Returns how many were removed.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Instant::now())
    }

    fn evict_idle_at(&self, now: Instant) -> usize {
        let before = self.map.len();
        let window = self.window;
        self.map
            .retain(|_, bucket| now.saturating_duration_since(bucket.lock().last_seen) < window);
        before - self.map.len()
    }

    pub fn tracked_clients(&self) -> usize {
        self.map.len()
    }
}
