//! Per-route request limiting
//!
//! Requests are counted per `(client, method + route)`. A key may spend a
//! whole window's quota at once; capacity then returns one request every
//! `period / times`.
//! The counter store sits behind [`RateLimiter`] so the HTTP layer never
//! depends on where counts live.

use axum::{
    extract::{ConnectInfo, MatchedPath, Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use governor::{DefaultKeyedRateLimiter, Quota};
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::api::error::ApiError;
use crate::infrastructure::AppState;

/// How many requests a key may make per period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RateWindow {
    pub times: u32,
    pub period: Duration,
}

impl RateWindow {
    /// `times` requests at once, refilling one every `period / times`.
    /// `None` when the window admits nothing.
    fn quota(&self) -> Option<Quota> {
        let burst = NonZeroU32::new(self.times)?;
        Quota::with_period(self.period / burst.get()).map(|q| q.allow_burst(burst))
    }
}

/// Shared request counter keyed by client and route
pub trait RateLimiter: Send + Sync {
    /// Count one request against `key`; `false` once the window is exhausted.
    fn check_and_increment(&self, key: &str, window: RateWindow) -> bool;

    /// Drop state for keys that have fully recovered.
    fn prune(&self) {}
}

/// Process-local limiter backed by governor, one keyed limiter per window.
#[derive(Default)]
pub struct InMemoryRateLimiter {
    limiters: DashMap<RateWindow, Arc<DefaultKeyedRateLimiter<String>>>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently tracked across all windows
    pub fn tracked_keys(&self) -> usize {
        self.limiters.iter().map(|limiter| limiter.len()).sum()
    }

    fn limiter_for(
        &self,
        window: RateWindow,
        quota: Quota,
    ) -> Arc<DefaultKeyedRateLimiter<String>> {
        self.limiters
            .entry(window)
            .or_insert_with(|| Arc::new(governor::RateLimiter::keyed(quota)))
            .clone()
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn check_and_increment(&self, key: &str, window: RateWindow) -> bool {
        let Some(quota) = window.quota() else {
            tracing::warn!("Rate window {:?} admits no requests", window);
            return false;
        };

        self.limiter_for(window, quota)
            .check_key(&key.to_string())
            .is_ok()
    }

    fn prune(&self) {
        for limiter in self.limiters.iter() {
            limiter.retain_recent();
            limiter.shrink_to_fit();
        }
    }
}

/// Prune `limiter` every `every` (at least once a second) until aborted.
pub fn spawn_pruning(limiter: Arc<dyn RateLimiter>, every: Duration) -> JoinHandle<()> {
    let every = every.max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            limiter.prune();
        }
    })
}

/// First `X-Forwarded-For` hop, else the peer address.
fn client_id(request: &Request, peer: Option<SocketAddr>) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(str::trim)
        .filter(|h| !h.is_empty())
    {
        return forwarded.to_string();
    }

    peer.map(|addr| addr.ip().to_string()).unwrap_or_else(|| "anonymous".to_string())
}

fn route_key(request: &Request) -> String {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    format!("{} {}", request.method(), route)
}

/// Rejects over-limit requests with 429 before any handler or extractor runs.
/// Must be installed with `route_layer` so the matched route is known.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if !state.config.rate_limit_enabled {
        return Ok(next.run(request).await);
    }

    let window = RateWindow {
        times: state.config.rate_limiter_times,
        period: state.config.rate_limiter_window,
    };
    let peer = peer.map(|ConnectInfo(addr)| addr);
    let key = format!("{}:{}", client_id(&request, peer), route_key(&request));

    if !state.rate_limiter.check_and_increment(&key, window) {
        tracing::warn!("Rate limit exceeded for {}", key);
        return Err(ApiError::RateLimited {
            retry_after: window.period.as_secs().max(1),
        });
    }

    let mut response = next.run(request).await;
    if let Ok(limit) = HeaderValue::from_str(&window.times.to_string()) {
        response
            .headers_mut()
            .insert(HeaderName::from_static("x-ratelimit-limit"), limit);
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: RateWindow = RateWindow {
        times: 3,
        period: Duration::from_secs(60),
    };

    #[test]
    fn blocks_after_quota() {
        let limiter = InMemoryRateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.check_and_increment("a:GET /contacts/", WINDOW));
        }
        assert!(!limiter.check_and_increment("a:GET /contacts/", WINDOW));
        assert!(!limiter.check_and_increment("a:GET /contacts/", WINDOW));
    }

    #[test]
    fn keys_are_independent() {
        let limiter = InMemoryRateLimiter::new();
        for _ in 0..3 {
            assert!(limiter.check_and_increment("a:GET /contacts/", WINDOW));
        }
        assert!(limiter.check_and_increment("a:POST /contacts/", WINDOW));
        assert!(limiter.check_and_increment("b:GET /contacts/", WINDOW));
    }

    #[test]
    fn window_resets() {
        let limiter = InMemoryRateLimiter::new();
        let short = RateWindow {
            times: 1,
            period: Duration::from_millis(20),
        };
        assert!(limiter.check_and_increment("k", short));
        assert!(!limiter.check_and_increment("k", short));
        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.check_and_increment("k", short));
    }

    #[test]
    fn empty_window_denies() {
        let limiter = InMemoryRateLimiter::new();
        let closed = RateWindow {
            times: 0,
            period: Duration::from_secs(60),
        };
        assert!(!limiter.check_and_increment("k", closed));
    }

    #[test]
    fn prune_drops_recovered_keys() {
        let limiter = InMemoryRateLimiter::new();
        let short = RateWindow {
            times: 1,
            period: Duration::from_millis(20),
        };
        for client in ["10.0.0.1", "10.0.0.2", "10.0.0.3"] {
            assert!(limiter.check_and_increment(client, short));
        }
        assert!(limiter.check_and_increment("busy", WINDOW));
        assert_eq!(limiter.tracked_keys(), 4);

        std::thread::sleep(Duration::from_millis(40));
        limiter.prune();

        // Only the key still inside its 60s window survives
        assert_eq!(limiter.tracked_keys(), 1);
    }
}
