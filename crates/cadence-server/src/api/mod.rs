mod analytics;
mod orchestrator;
mod plans;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use cadence_core::{BrandsFile, StorageError, Store};
use cadence_orchestrator::{Orchestrator, OrchestratorError};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub orchestrator: Arc<Orchestrator>,
    pub brands: Arc<BrandsFile>,
    pub retention_days: u32,
    /// Present when the Postgres backend is in use; checked by `/health`.
    pub pool: Option<PgPool>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    store: &'static str,
}

pub(super) type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

impl ResponseMeta {
    fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

/// Wrap `data` in the success envelope.
pub(super) fn envelope<T: Serialize>(request_id: String, data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        data,
        meta: ResponseMeta::new(request_id),
    })
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_storage_error(request_id: String, error: &StorageError) -> ApiError {
    tracing::error!(error = %error, "store operation failed");
    ApiError::new(request_id, "internal_error", "store operation failed")
}

pub(super) fn map_orchestrator_error(request_id: String, error: &OrchestratorError) -> ApiError {
    match error {
        OrchestratorError::NoActivePlan { .. }
        | OrchestratorError::NoPostsScheduled { .. }
        | OrchestratorError::NoPostForPlatform { .. } => {
            ApiError::new(request_id, "not_found", error.to_string())
        }
        OrchestratorError::Storage(e) => map_storage_error(request_id, e),
    }
}

/// Parse a `YYYY-MM-DD` path or query value into a validation error on failure.
pub(super) fn parse_date(request_id: &str, value: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        ApiError::new(
            request_id,
            "validation_error",
            format!("date must be YYYY-MM-DD, got '{value}'"),
        )
    })
}

/// Brand named in a request, or the scheduled brand when none is given.
pub(super) fn brand_or_scheduled(
    state: &AppState,
    request_id: &str,
    brand: Option<String>,
) -> Result<String, ApiError> {
    if let Some(brand) = brand.filter(|b| !b.trim().is_empty()) {
        return Ok(brand);
    }
    state
        .brands
        .scheduled()
        .map(|b| b.name.clone())
        .ok_or_else(|| {
            ApiError::new(
                request_id,
                "validation_error",
                "brand is required when no brand is scheduled",
            )
        })
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/plans", post(plans::create_plan))
        .route("/api/v1/plans/{brand}/active", get(plans::get_active_plan))
        .route(
            "/api/v1/plans/{brand}/posts/{date}",
            get(plans::list_posts_for_date),
        )
        .route(
            "/api/v1/orchestrator/daily",
            post(orchestrator::execute_daily),
        )
        .route(
            "/api/v1/orchestrator/status",
            get(orchestrator::execution_status),
        )
        .route(
            "/api/v1/orchestrator/retry/{date}/{platform}",
            post(orchestrator::retry_post),
        )
        .route(
            "/api/v1/analytics/yesterday/{brand}",
            get(analytics::yesterday_performance),
        )
        .route("/api/v1/metrics", post(analytics::record_metrics))
        .route("/api/v1/data/cleanup", delete(analytics::cleanup))
        .layer(
            // Auth runs first so the limiter only sees verified callers.
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> (StatusCode, Json<ApiResponse<HealthData>>) {
    let (status, data) = match &state.pool {
        None => (
            StatusCode::OK,
            HealthData {
                status: "ok",
                store: "file",
            },
        ),
        Some(pool) => match cadence_db::health_check(pool).await {
            Ok(()) => (
                StatusCode::OK,
                HealthData {
                    status: "ok",
                    store: "postgres",
                },
            ),
            Err(e) => {
                tracing::warn!(error = %e, "health check: database unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    HealthData {
                        status: "degraded",
                        store: "unavailable",
                    },
                )
            }
        },
    };
    (status, envelope(req_id.0, data))
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
