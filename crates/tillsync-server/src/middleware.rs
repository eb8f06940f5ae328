//! Request middleware: request IDs, bearer auth, and sync-trigger spacing.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Newtype wrapping a request ID string, stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Bearer-token auth for the protected routes.
///
/// `keys: None` means auth is switched off (development with no keys
/// configured); `Some` holds the accepted tokens.
#[derive(Debug, Clone)]
pub struct AuthState {
    keys: Option<Arc<HashSet<String>>>,
}

impl AuthState {
    /// Builds auth config from `TILLSYNC_API_KEYS` (comma-separated bearer
    /// tokens).
    ///
    /// In development, empty/missing keys disable auth for local iteration.
    /// In non-development envs, empty/missing keys fail startup.
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("TILLSYNC_API_KEYS").unwrap_or_default();
        let keys = parse_keys(&raw);

        if keys.is_empty() {
            anyhow::ensure!(
                is_development,
                "TILLSYNC_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
            tracing::warn!(
                "TILLSYNC_API_KEYS not set; bearer auth disabled in development environment"
            );
            return Ok(Self { keys: None });
        }

        Ok(Self {
            keys: Some(Arc::new(keys)),
        })
    }

    fn allows(&self, authorization: Option<&HeaderValue>) -> bool {
        match &self.keys {
            None => true,
            Some(keys) => bearer_token(authorization).is_some_and(|t| keys.contains(t)),
        }
    }
}

fn parse_keys(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    let token = value?.to_str().ok()?.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Spacing guard for the sync trigger route.
///
/// A run refetches the full lookback window for every shop, so a trigger
/// arriving moments after the last one repeats all of that work for no new
/// data. Instead of a request budget, the trigger route enforces a minimum
/// gap between accepted invocations; the read routes are never throttled.
#[derive(Debug, Clone)]
pub struct SyncThrottle {
    min_gap: Duration,
    last_accepted: Arc<Mutex<Option<Instant>>>,
}

impl SyncThrottle {
    #[must_use]
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last_accepted: Arc::new(Mutex::new(None)),
        }
    }

    /// Accepts and records the trigger unless one was accepted less than
    /// `min_gap` ago.
    async fn admit(&self) -> bool {
        let mut last = self.last_accepted.lock().await;
        let now = Instant::now();
        match *last {
            Some(prev) if now.duration_since(prev) < self.min_gap => false,
            _ => {
                *last = Some(now);
                true
            }
        }
    }
}

/// Axum middleware that extracts or generates a request ID.
///
/// If the incoming request has an `x-request-id` header, that value is used.
/// Otherwise a new `UUIDv4` is generated. The ID is:
/// - Inserted into request extensions as [`RequestId`]
/// - Set on the response as the `x-request-id` header
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;

    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }

    res
}

/// Middleware enforcing bearer auth when keys are configured.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if auth.allows(req.headers().get(AUTHORIZATION)) {
        next.run(req).await
    } else {
        reject(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid bearer token",
        )
    }
}

/// Middleware spacing out accepted sync triggers.
pub async fn throttle_sync_trigger(
    State(throttle): State<SyncThrottle>,
    req: Request,
    next: Next,
) -> Response {
    if throttle.admit().await {
        next.run(req).await
    } else {
        reject(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "a sync was triggered too recently; retry shortly",
        )
    }
}

fn reject(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    let body = serde_json::json!({ "error": { "code": code, "message": message } });
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth_with_keys(keys: &[&str]) -> AuthState {
        AuthState {
            keys: Some(Arc::new(
                keys.iter().map(ToString::to_string).collect::<HashSet<_>>(),
            )),
        }
    }

    #[test]
    fn bearer_token_is_extracted_and_trimmed() {
        let value = HeaderValue::from_static("Bearer  abc123 ");
        assert_eq!(bearer_token(Some(&value)), Some("abc123"));
    }

    #[test]
    fn missing_or_malformed_header_yields_none() {
        assert_eq!(bearer_token(None), None);

        let value = HeaderValue::from_static("Basic abc123");
        assert_eq!(bearer_token(Some(&value)), None);

        let value = HeaderValue::from_static("Bearer ");
        assert_eq!(bearer_token(Some(&value)), None);
    }

    #[test]
    fn configured_auth_accepts_only_known_tokens() {
        let auth = auth_with_keys(&["abc123"]);

        let good = HeaderValue::from_static("Bearer abc123");
        assert!(auth.allows(Some(&good)));

        let bad = HeaderValue::from_static("Bearer nope");
        assert!(!auth.allows(Some(&bad)));
        assert!(!auth.allows(None));
    }

    #[test]
    fn disabled_auth_accepts_anything() {
        let auth = AuthState { keys: None };
        assert!(auth.allows(None));
    }

    #[test]
    fn keys_are_split_and_trimmed() {
        let keys = parse_keys(" one , two ,, three");
        assert_eq!(keys.len(), 3);
        assert!(keys.contains("two"));
    }

    #[tokio::test]
    async fn throttle_rejects_back_to_back_triggers() {
        let throttle = SyncThrottle::new(Duration::from_secs(60));
        assert!(throttle.admit().await);
        assert!(!throttle.admit().await);
    }

    #[tokio::test]
    async fn zero_gap_throttle_admits_every_trigger() {
        let throttle = SyncThrottle::new(Duration::ZERO);
        assert!(throttle.admit().await);
        assert!(throttle.admit().await);
    }
}
