//! Rate limiting middleware.
//!
//! Fixed-window limiting per client IP for the credential endpoints
//! (login/register brute force). Requests that carry no connection info
//! (in-process callers, tests) are not limited.

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Configuration for rate limiting.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window.
    pub max_requests: u32,
    /// Window duration.
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn per_minute(max_requests: u32) -> Self {
        Self {
            max_requests,
            window: Duration::from_secs(60),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::per_minute(30)
    }
}

/// Rate limiter state tracking requests per IP.
#[derive(Clone)]
pub struct RateLimitLayer {
    config: RateLimitConfig,
    state: Arc<Mutex<HashMap<IpAddr, RateLimitEntry>>>,
}

struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

#[derive(Debug, PartialEq, Eq)]
enum RateLimitResult {
    Allowed { remaining: u32 },
    Exceeded { retry_after: Duration },
}

impl RateLimitLayer {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn check(&self, ip: IpAddr, now: Instant) -> RateLimitResult {
        let mut state = self.state.lock();

        let entry = state.entry(ip).or_insert(RateLimitEntry {
            count: 0,
            window_start: now,
        });

        // Reset window if expired
        if now.duration_since(entry.window_start) >= self.config.window {
            entry.count = 0;
            entry.window_start = now;
        }

        entry.count = entry.count.saturating_add(1);

        if entry.count > self.config.max_requests {
            let reset_at = entry.window_start + self.config.window;
            RateLimitResult::Exceeded {
                retry_after: reset_at.saturating_duration_since(now),
            }
        } else {
            RateLimitResult::Allowed {
                remaining: self.config.max_requests - entry.count,
            }
        }
    }

    /// Drop idle entries (call from a background task).
    pub fn cleanup(&self) {
        let mut state = self.state.lock();
        let now = Instant::now();
        let window = self.config.window;

        state.retain(|_, entry| now.duration_since(entry.window_start) < window * 2);
    }

    pub fn tracked_clients(&self) -> usize {
        self.state.lock().len()
    }
}

/// Rate limiting middleware function.
pub async fn rate_limit_middleware(
    State(limiter): State<RateLimitLayer>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(ip) = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
    else {
        return next.run(request).await;
    };

    match limiter.check(ip, Instant::now()) {
        RateLimitResult::Allowed { .. } => next.run(request).await,
        RateLimitResult::Exceeded { retry_after } => {
            // Round up so clients never retry early
            let retry_secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            warn!(
                ip = %ip,
                path = %request.uri().path(),
                retry_after_secs = retry_secs,
                "Rate limit exceeded"
            );

            let body = serde_json::json!({
                "error": "rate_limit_exceeded",
                "message": "Too many requests. Please slow down.",
                "retry_after_seconds": retry_secs,
            });

            (
                StatusCode::TOO_MANY_REQUESTS,
                [("Retry-After", retry_secs.to_string())],
                Json(body),
            )
                .into_response()
        }
    }
}
