use std::collections::HashMap;
use std::future::{Ready, ready};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    error::ErrorTooManyRequests,
};
use futures_util::future::LocalBoxFuture;

/// Fixed-window request counter keyed by client address. The policy lives
/// here at the transport boundary; handlers never see rejected requests.
#[derive(Clone)]
pub struct FixedWindow {
    max_requests: u32,
    window: Duration,
    counters: Arc<Mutex<HashMap<String, (Instant, u32)>>>,
}

impl FixedWindow {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            counters: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Register one request for `key` at `now`. Returns false once the
    /// quota for the current window is exhausted.
    pub fn check(&self, key: &str, now: Instant) -> bool {
        let mut counters = self.counters.lock().unwrap();

        // Evict expired windows before a new key grows the map, so the
        // counters never accumulate one entry per client IP forever.
        if !counters.contains_key(key) {
            counters.retain(|_, entry| now.duration_since(entry.0) < self.window);
        }

        let entry = counters.entry(key.to_string()).or_insert((now, 0));

        if now.duration_since(entry.0) >= self.window {
            *entry = (now, 0);
        }

        if entry.1 >= self.max_requests {
            return false;
        }
        entry.1 += 1;
        true
    }
}

/// Per-client-IP rate limiting middleware.
pub struct RateLimiter {
    window: FixedWindow,
}

impl RateLimiter {
    /// Quota of `max_requests` per minute per client IP.
    pub fn per_minute(max_requests: u32) -> Self {
        Self {
            window: FixedWindow::new(max_requests, Duration::from_secs(60)),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimiter
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = RateLimiterMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimiterMiddleware {
            service,
            window: self.window.clone(),
        }))
    }
}

pub struct RateLimiterMiddleware<S> {
    service: S,
    window: FixedWindow,
}

impl<S, B> Service<ServiceRequest> for RateLimiterMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let key = {
            let connection_info = req.connection_info();
            connection_info
                .realip_remote_addr()
                .unwrap_or("unknown")
                .to_string()
        };

        if !self.window.check(&key, Instant::now()) {
            return Box::pin(async move { Err(ErrorTooManyRequests("Too many requests")) });
        }

        Box::pin(self.service.call(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quota_is_enforced_within_a_window() {
        let window = FixedWindow::new(3, Duration::from_secs(60));
        let now = Instant::now();

        assert!(window.check("203.0.113.7", now));
        assert!(window.check("203.0.113.7", now));
        assert!(window.check("203.0.113.7", now));
        assert!(!window.check("203.0.113.7", now));
    }

    #[test]
    fn quota_resets_after_the_window() {
        let window = FixedWindow::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(window.check("203.0.113.7", now));
        assert!(!window.check("203.0.113.7", now));
        assert!(window.check("203.0.113.7", now + Duration::from_secs(61)));
    }

    #[test]
    fn stale_keys_are_evicted_when_new_clients_arrive() {
        let window = FixedWindow::new(1, Duration::from_secs(60));
        let now = Instant::now();

        for i in 0..100 {
            assert!(window.check(&format!("10.0.0.{}", i), now));
        }
        assert_eq!(window.counters.lock().unwrap().len(), 100);

        // every window has long expired; a fresh client triggers the sweep
        let later = now + Duration::from_secs(3600);
        assert!(window.check("198.51.100.4", later));
        assert_eq!(window.counters.lock().unwrap().len(), 1);
    }

    #[test]
    fn live_keys_survive_the_sweep() {
        let window = FixedWindow::new(5, Duration::from_secs(60));
        let now = Instant::now();

        assert!(window.check("203.0.113.7", now));
        // still inside the first window when a new client shows up
        assert!(window.check("198.51.100.4", now + Duration::from_secs(30)));
        assert_eq!(window.counters.lock().unwrap().len(), 2);
    }

    #[test]
    fn keys_are_counted_independently() {
        let window = FixedWindow::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert!(window.check("203.0.113.7", now));
        assert!(window.check("198.51.100.4", now));
        assert!(!window.check("203.0.113.7", now));
    }
}
