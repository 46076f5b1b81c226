use crate::error::AppError;
use axum::{
    extract::{ConnectInfo, Request, State},
    http::{header::RETRY_AFTER, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);

pub type KeyFn = Arc<dyn Fn(&Request) -> String + Send + Sync>;

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    window_start: Instant,
    count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Fixed-window request counter keyed per client
#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<DashMap<String, RateWindow>>,
    limit: u32,
    window: Duration,
    key_fn: KeyFn,
}

impl RateLimiter {
    /// `limit` requests per minute, keyed by the socket peer
    pub fn per_minute(limit: u32) -> Self {
        Self::new(limit, DEFAULT_WINDOW)
    }

    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            limit,
            window,
            key_fn: Arc::new(client_ip_key),
        }
    }

    pub fn with_key_fn<F>(mut self, key_fn: F) -> Self
    where
        F: Fn(&Request) -> String + Send + Sync + 'static,
    {
        self.key_fn = Arc::new(key_fn);
        self
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn key_for(&self, request: &Request) -> String {
        (self.key_fn)(request)
    }

    pub fn check(&self, key: &str) -> RateDecision {
        self.check_at(key, Instant::now())
    }

    /// Count one request for `key` at `now`.
    ///
    /// The entry guard holds the shard lock, so the read-modify-write is atomic.
    pub fn check_at(&self, key: &str, now: Instant) -> RateDecision {
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert(RateWindow {
                window_start: now,
                count: 0,
            });

        let elapsed = now.saturating_duration_since(entry.window_start);
        if elapsed >= self.window {
            entry.window_start = now;
            entry.count = 0;
        }

        if entry.count >= self.limit {
            let elapsed = now.saturating_duration_since(entry.window_start);
            return RateDecision::Limited {
                retry_after: self.window.saturating_sub(elapsed),
            };
        }

        entry.count += 1;
        RateDecision::Allowed {
            remaining: self.limit - entry.count,
        }
    }

    pub fn purge_stale(&self) -> usize {
        self.purge_stale_at(Instant::now())
    }

    /// Drop windows that have fully elapsed
    pub fn purge_stale_at(&self, now: Instant) -> usize {
        let before = self.windows.len();
        self.windows
            .retain(|_, w| now.saturating_duration_since(w.window_start) < self.window);
        before.saturating_sub(self.windows.len())
    }

    pub fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

/// Socket peer address, or "unknown" when the server runs without connect info
pub fn client_ip_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Client IP as reported by a reverse proxy, falling back to the socket peer.
///
/// Clients can forge these headers, so this key is only used when the
/// deployment trusts its proxy.
pub fn forwarded_ip_key(request: &Request) -> String {
    let headers = request.headers();

    if let Some(ip) = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return ip.to_string();
    }

    if let Some(ip) = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
    {
        return ip.to_string();
    }

    client_ip_key(request)
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let key = limiter.key_for(&request);

    match limiter.check(&key) {
        RateDecision::Allowed { .. } => next.run(request).await,
        RateDecision::Limited { retry_after } => {
            tracing::warn!(
                key = %key,
                path = %request.uri().path(),
                limit = limiter.limit(),
                "Rate limit exceeded"
            );

            let mut response = AppError::rate_limited().into_response();
            let seconds = retry_after.as_secs().max(1);
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(seconds));
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::post, Router};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    #[test]
    fn test_allows_limit_then_rejects() {
        let limiter = RateLimiter::per_minute(5);
        let now = Instant::now();

        for i in 0..5 {
            assert_eq!(
                limiter.check_at("1.2.3.4", now),
                RateDecision::Allowed { remaining: 4 - i }
            );
        }
        assert!(!limiter.check_at("1.2.3.4", now).is_allowed());
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::per_minute(1);
        let now = Instant::now();

        assert!(limiter.check_at("a", now).is_allowed());
        assert!(limiter.check_at("b", now).is_allowed());
        assert!(!limiter.check_at("a", now).is_allowed());
        assert_eq!(limiter.tracked_keys(), 2);
    }

    #[test]
    fn test_window_resets_when_elapsed() {
        let limiter = RateLimiter::per_minute(2);
        let start = Instant::now();

        assert!(limiter.check_at("k", start).is_allowed());
        assert!(limiter.check_at("k", start).is_allowed());

        let almost = start + Duration::from_secs(59);
        match limiter.check_at("k", almost) {
            RateDecision::Limited { retry_after } => {
                assert_eq!(retry_after, Duration::from_secs(1))
            }
            other => panic!("expected limit, got {:?}", other),
        }

        assert!(limiter
            .check_at("k", start + Duration::from_secs(60))
            .is_allowed());
    }

    #[test]
    fn test_zero_limit_rejects_everything() {
        let limiter = RateLimiter::per_minute(0);
        assert!(!limiter.check("k").is_allowed());
    }

    #[test]
    fn test_purge_stale() {
        let limiter = RateLimiter::per_minute(10);
        let start = Instant::now();
        limiter.check_at("old", start);
        limiter.check_at("new", start + Duration::from_secs(50));

        assert_eq!(limiter.purge_stale_at(start + Duration::from_secs(61)), 1);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    fn request_with(headers: &[(&str, &str)]) -> Request {
        let mut builder = Request::builder().uri("/");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    fn from_peer(mut request: Request, peer: [u8; 4]) -> Request {
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 4242))));
        request
    }

    #[test]
    fn test_client_ip_key_ignores_forwarding_headers() {
        let forged = request_with(&[("x-forwarded-for", "10.0.0.1"), ("x-real-ip", "10.0.0.2")]);
        assert_eq!(client_ip_key(&forged), "unknown");
        assert_eq!(
            client_ip_key(&from_peer(forged, [192, 168, 1, 9])),
            "192.168.1.9"
        );
    }

    #[test]
    fn test_forwarded_ip_key() {
        assert_eq!(
            forwarded_ip_key(&request_with(&[("x-forwarded-for", "10.0.0.1, 172.16.0.1")])),
            "10.0.0.1"
        );
        assert_eq!(
            forwarded_ip_key(&request_with(&[("x-real-ip", "10.0.0.2")])),
            "10.0.0.2"
        );
        assert_eq!(
            forwarded_ip_key(&from_peer(request_with(&[]), [192, 168, 1, 9])),
            "192.168.1.9"
        );
    }

    #[tokio::test]
    async fn test_middleware_rejects_over_limit() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let app = Router::new()
            .route(
                "/api/auth/login",
                post(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        "ok"
                    }
                }),
            )
            .layer(middleware::from_fn_with_state(
                RateLimiter::per_minute(2),
                rate_limit_middleware,
            ));

        let send = || {
            app.clone().oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/auth/login")
                    .header("x-forwarded-for", "203.0.113.7")
                    .body(Body::empty())
                    .unwrap(),
            )
        };

        assert_eq!(send().await.unwrap().status(), StatusCode::OK);
        assert_eq!(send().await.unwrap().status(), StatusCode::OK);

        let rejected = send().await.unwrap();
        assert_eq!(rejected.status(), StatusCode::TOO_MANY_REQUESTS);
        assert!(rejected.headers().contains_key(RETRY_AFTER));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    fn login_counter() -> (Router, Arc<AtomicUsize>, RateLimiter) {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let limiter = RateLimiter::per_minute(5);
        let app = Router::new()
            .route(
                "/api/auth/login",
                post(move || {
                    let counter = counter.clone();
                    async move {
                        counter.fetch_add(1, Ordering::SeqCst);
                        "ok"
                    }
                }),
            )
            .layer(middleware::from_fn_with_state(
                limiter.clone(),
                rate_limit_middleware,
            ));
        (app, hits, limiter)
    }

    fn login_from(peer: [u8; 4], forwarded_for: &str) -> Request {
        from_peer(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("x-forwarded-for", forwarded_for)
                .body(Body::empty())
                .unwrap(),
            peer,
        )
    }

    #[tokio::test]
    async fn test_rotating_forwarded_for_shares_peer_window() {
        let (app, hits, limiter) = login_counter();

        let mut statuses = Vec::new();
        for i in 0..6 {
            let request = login_from([203, 0, 113, 7], &format!("10.0.0.{}", i));
            statuses.push(app.clone().oneshot(request).await.unwrap().status());
        }

        assert!(statuses[..5].iter().all(|s| *s == StatusCode::OK));
        assert_eq!(statuses[5], StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(hits.load(Ordering::SeqCst), 5);
        assert_eq!(limiter.tracked_keys(), 1);
    }

    #[test]
    fn test_forwarded_key_is_opt_in() {
        let limiter = RateLimiter::per_minute(1).with_key_fn(forwarded_ip_key);
        let request = login_from([203, 0, 113, 7], "198.51.100.4");
        assert_eq!(limiter.key_for(&request), "198.51.100.4");
        assert_eq!(RateLimiter::per_minute(1).key_for(&request), "203.0.113.7");
    }
}
