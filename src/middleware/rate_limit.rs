//! Per-IP request rate limiting on the route layer.
//!
//! Uses `governor` keyed limiters: each client IP gets its own quota of
//! `rate_limit_requests` per `rate_limit_window_secs`, with a stricter
//! bucket for the authentication endpoints. Disabled entirely when
//! `api.enable_rate_limiting` is off (the development default).

use axum::{
    extract::{ConnectInfo, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    middleware::NoOpMiddleware,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use once_cell::sync::Lazy;
use std::{collections::HashMap, net::SocketAddr, num::NonZeroU32, sync::Arc, time::Duration};
use tokio::sync::RwLock;

use crate::config;
use crate::error::ApiError;

type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Per-key rate limiter, one quota bucket per client IP.
pub struct KeyedRateLimiter {
    limiters: RwLock<HashMap<String, Arc<Limiter>>>,
    quota: Quota,
    cleanup_threshold: usize,
}

impl KeyedRateLimiter {
    fn new(requests: u32, window_secs: u64) -> Self {
        let burst = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
        let period = Duration::from_secs(window_secs.max(1)) / burst.get();
        let quota = Quota::with_period(period)
            .unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN))
            .allow_burst(burst);

        Self {
            limiters: RwLock::new(HashMap::new()),
            quota,
            cleanup_threshold: 10_000,
        }
    }

    async fn check(&self, key: &str) -> bool {
        let limiter = {
            let limiters = self.limiters.read().await;
            limiters.get(key).cloned()
        };

        let limiter = match limiter {
            Some(l) => l,
            None => {
                let mut limiters = self.limiters.write().await;

                // Bound memory when many distinct IPs show up.
                if limiters.len() > self.cleanup_threshold {
                    limiters.clear();
                }

                let new_limiter = Arc::new(RateLimiter::direct(self.quota));
                limiters.insert(key.to_string(), Arc::clone(&new_limiter));
                new_limiter
            }
        };

        limiter.check().is_ok()
    }
}

struct RateLimitState {
    api_limiter: KeyedRateLimiter,
    auth_limiter: KeyedRateLimiter,
}

static STATE: Lazy<RateLimitState> = Lazy::new(|| {
    let api = &config::config().api;
    RateLimitState {
        api_limiter: KeyedRateLimiter::new(api.rate_limit_requests, api.rate_limit_window_secs),
        // Login attempts get a tenth of the general quota.
        auth_limiter: KeyedRateLimiter::new(
            (api.rate_limit_requests / 10).max(5),
            api.rate_limit_window_secs,
        ),
    }
});

/// Extract client IP from request
fn client_ip(req: &Request) -> String {
    if let Some(forwarded) = req.headers().get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            if let Some(ip) = value.split(',').next() {
                return ip.trim().to_string();
            }
        }
    }

    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

pub async fn rate_limit_middleware(req: Request, next: Next) -> Response {
    if !config::config().api.enable_rate_limiting {
        return next.run(req).await;
    }

    let ip = client_ip(&req);
    let is_auth = req.uri().path().starts_with("/api/auth");

    let allowed = if is_auth {
        STATE.auth_limiter.check(&ip).await
    } else {
        STATE.api_limiter.check(&ip).await
    };

    if allowed {
        next.run(req).await
    } else {
        let message = if is_auth {
            "Authentication rate limit exceeded. Please wait before trying again."
        } else {
            "Rate limit exceeded"
        };
        ApiError::too_many_requests(message).into_response()
    }
}
