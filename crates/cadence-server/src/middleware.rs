use std::{
    collections::HashMap,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ApiError;

const REQUEST_ID_HEADER: &str = "x-request-id";
const ANONYMOUS_CALLER: &str = "anonymous";

/// Correlation id for one request, available to handlers as an extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer token that passed [`require_bearer_auth`]; keys the rate limit.
#[derive(Debug, Clone)]
struct AuthenticatedCaller(String);

impl RequestId {
    fn of(req: &Request) -> String {
        req.extensions()
            .get::<RequestId>()
            .map_or_else(String::new, |id| id.0.clone())
    }
}

/// Bearer tokens accepted on protected routes.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<Vec<String>>,
    pub enabled: bool,
}

impl AuthState {
    /// Build from `CADENCE_API_KEYS`. Blank entries are ignored.
    ///
    /// With no usable key, auth is switched off in development and startup
    /// fails everywhere else.
    ///
    /// # Errors
    ///
    /// Returns an error outside development when no key is configured.
    pub fn new(keys: &[String], is_development: bool) -> anyhow::Result<Self> {
        let api_keys: Vec<String> = keys
            .iter()
            .map(String::as_str)
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        match (api_keys.is_empty(), is_development) {
            (false, _) => Ok(Self {
                api_keys: Arc::new(api_keys),
                enabled: true,
            }),
            (true, true) => {
                tracing::warn!("no CADENCE_API_KEYS configured; API auth is off in development");
                Ok(Self {
                    api_keys: Arc::new(Vec::new()),
                    enabled: false,
                })
            }
            (true, false) => anyhow::bail!(
                "CADENCE_API_KEYS must list at least one bearer token outside development"
            ),
        }
    }

    /// Every key is compared so timing does not reveal which one matched.
    fn allows(&self, token: &str) -> bool {
        self.api_keys.iter().fold(false, |found, key| {
            found | bool::from(key.as_bytes().ct_eq(token.as_bytes()))
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct CallerWindow {
    opened_at: Instant,
    used: usize,
}

/// Fixed-window request budget, counted separately for each authenticated
/// token. Requests without one (auth disabled) share a single budget.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    callers: Arc<Mutex<HashMap<String, CallerWindow>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            callers: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count one request for `caller`; `false` once the budget is spent.
    async fn admit(&self, caller: &str) -> bool {
        let now = Instant::now();
        let mut callers = self.callers.lock().await;
        callers.retain(|_, w| now.duration_since(w.opened_at) < self.window);

        let window = callers.entry(caller.to_owned()).or_insert(CallerWindow {
            opened_at: now,
            used: 0,
        });
        if window.used >= self.max_requests {
            return false;
        }
        window.used += 1;
        true
    }
}

/// Reuse the caller's `x-request-id` or mint a UUID, expose it to handlers
/// and echo it on the response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .map_or_else(|| Uuid::new_v4().to_string(), str::to_owned);

    req.extensions_mut().insert(RequestId(id.clone()));
    let mut response = next.run(req).await;

    if let Ok(value) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    let token = extract_bearer_token(req.headers().get(AUTHORIZATION))
        .filter(|token| auth.allows(token))
        .map(str::to_owned);
    match token {
        Some(token) => {
            req.extensions_mut().insert(AuthenticatedCaller(token));
            next.run(req).await
        }
        None => {
            let rid = RequestId::of(&req);
            tracing::warn!(
                request_id = %rid,
                path = %req.uri().path(),
                "rejected unauthenticated request"
            );
            ApiError::new(rid, "unauthorized", "missing or invalid bearer token").into_response()
        }
    }
}

pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    // Raw header values are never keys: unverified tokens would each get a
    // fresh window.
    let caller = req
        .extensions()
        .get::<AuthenticatedCaller>()
        .map_or_else(|| ANONYMOUS_CALLER.to_owned(), |c| c.0.clone());

    if rate_limit.admit(&caller).await {
        return next.run(req).await;
    }

    ApiError::new(
        RequestId::of(&req),
        "rate_limited",
        format!(
            "more than {} requests in {}s",
            rate_limit.max_requests,
            rate_limit.window.as_secs()
        ),
    )
    .into_response()
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
