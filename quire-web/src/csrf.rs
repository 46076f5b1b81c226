use crate::error::AppError;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::CONTENT_TYPE, Method},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const CSRF_HEADER: &str = "x-csrf-token";
pub const CSRF_COOKIE: &str = "csrf_token";
pub const CSRF_FORM_FIELD: &str = "csrf_token";

const TOKEN_BYTES: usize = 32;
const MAX_FORM_BYTES: usize = 64 * 1024;

/// Issued CSRF tokens and their expiry.
///
/// Tokens are not consumed by validation; they stay usable until they expire.
#[derive(Clone)]
pub struct CsrfGuard {
    inner: Arc<CsrfInner>,
}

struct CsrfInner {
    tokens: RwLock<HashMap<String, DateTime<Utc>>>,
    ttl: Duration,
    exempt_paths: Vec<String>,
}

impl CsrfGuard {
    pub fn new(ttl: Duration, exempt_paths: Vec<String>) -> Self {
        Self {
            inner: Arc::new(CsrfInner {
                tokens: RwLock::new(HashMap::new()),
                ttl,
                exempt_paths,
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    pub fn is_exempt(&self, path: &str) -> bool {
        self.inner.exempt_paths.iter().any(|p| p == path)
    }

    pub async fn generate(&self) -> String {
        self.generate_at(Utc::now()).await
    }

    pub async fn generate_at(&self, now: DateTime<Utc>) -> String {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = URL_SAFE_NO_PAD.encode(bytes);

        self.inner
            .tokens
            .write()
            .await
            .insert(token.clone(), now + self.inner.ttl);

        token
    }

    pub async fn validate(&self, token: &str) -> bool {
        self.validate_at(token, Utc::now()).await
    }

    /// Unknown tokens fail; expired ones fail and are dropped.
    pub async fn validate_at(&self, token: &str, now: DateTime<Utc>) -> bool {
        let expires_at = match self.inner.tokens.read().await.get(token) {
            Some(expires_at) => *expires_at,
            None => return false,
        };

        if now < expires_at {
            return true;
        }

        let mut tokens = self.inner.tokens.write().await;
        if tokens.get(token).is_some_and(|e| now >= *e) {
            tokens.remove(token);
        }
        false
    }

    /// Double-submit check for one request.
    ///
    /// A present cookie must match the supplied token, and the supplied token
    /// must be live in the pool.
    pub async fn verify_submission(&self, supplied: Option<&str>, cookie: Option<&str>) -> bool {
        let Some(supplied) = supplied.filter(|t| !t.is_empty()) else {
            return false;
        };

        if let Some(cookie) = cookie.filter(|c| !c.is_empty()) {
            if cookie != supplied {
                return false;
            }
        }

        self.validate(supplied).await
    }

    pub async fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now()).await
    }

    pub async fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut tokens = self.inner.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, expires_at| now < *expires_at);
        before - tokens.len()
    }

    pub async fn len(&self) -> usize {
        self.inner.tokens.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Periodically purge expired tokens until `shutdown` fires
    pub fn spawn_sweeper(
        &self,
        interval: std::time::Duration,
        shutdown: CancellationToken,
    ) -> JoinHandle<()> {
        let guard = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => {
                        tracing::debug!("CSRF sweeper stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let removed = guard.sweep_expired().await;
                        if removed > 0 {
                            tracing::debug!(removed, "Swept expired CSRF tokens");
                        }
                    }
                }
            }
        })
    }
}

/// Cookie half of the double-submit pair. Scripts must be able to read it.
pub fn csrf_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((CSRF_COOKIE, token))
        .path("/")
        .http_only(false)
        .secure(secure)
        .same_site(SameSite::Strict)
        .build()
}

/// Reject state-changing requests that lack a valid CSRF token
pub async fn csrf_protection_middleware(
    State(guard): State<CsrfGuard>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if matches!(*request.method(), Method::GET | Method::HEAD | Method::OPTIONS)
        || guard.is_exempt(request.uri().path())
    {
        return Ok(next.run(request).await);
    }

    let path = request.uri().path().to_string();
    let (supplied, request) = supplied_token(request).await?;
    let cookie = jar.get(CSRF_COOKIE).map(|c| c.value().to_string());

    if !guard
        .verify_submission(supplied.as_deref(), cookie.as_deref())
        .await
    {
        tracing::warn!(path = %path, has_token = supplied.is_some(), "CSRF validation failed");
        return Err(AppError::forbidden("Invalid CSRF token"));
    }

    Ok(next.run(request).await)
}

/// Read the token from the header, or from an urlencoded form body.
///
/// A consumed form body is put back so the handler can still read it.
async fn supplied_token(request: Request) -> Result<(Option<String>, Request), AppError> {
    if let Some(token) = request
        .headers()
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
    {
        return Ok((Some(token.to_string()), request));
    }

    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
    if !is_form {
        return Ok((None, request));
    }

    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|_| AppError::bad_request("Request body too large"))?;

    let token = serde_urlencoded::from_bytes::<Vec<(String, String)>>(&bytes)
        .ok()
        .and_then(|pairs| {
            pairs
                .into_iter()
                .find(|(key, _)| key == CSRF_FORM_FIELD)
                .map(|(_, value)| value)
        });

    Ok((token, Request::from_parts(parts, Body::from(bytes))))
}
