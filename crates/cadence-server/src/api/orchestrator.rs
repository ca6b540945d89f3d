//! Daily execution handlers.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    Extension,
};
use cadence_core::Platform;
use cadence_orchestrator::{DailyRunRequest, ExecutionStatus, RunSummary};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{
    brand_or_scheduled, envelope, map_orchestrator_error, parse_date, ApiError,
    ApiResult, AppState,
    };

#[derive(Debug, Default, Deserialize)]
pub(super) struct DailyRunBody {
    pub brand: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub force: bool,
    #[serde(default)]
    pub dry_run: bool,
    pub platforms: Option<Vec<Platform>>,
}

#[derive(Debug, Deserialize)]
pub(super) struct BrandDateQuery {
    pub brand: Option<String>,
    pub date: Option<String>,
}

/// POST /api/v1/orchestrator/daily: run (or dry-run) one day.
///
/// An empty body runs today for the scheduled brand. A run rejected by the
/// per-date gate still returns 200, with `success: false` and the
/// "already executed" message in the summary.
pub(super) async fn execute_daily(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Bytes,
) -> ApiResult<RunSummary> {
    let rid = &req_id.0;
    let body: DailyRunBody = if body.is_empty() {
        DailyRunBody::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            ApiError::new(rid, "validation_error", format!("invalid request body: {e}"))
        })?
    };
    let brand = brand_or_scheduled(&state, rid, body.brand)?;

    let mut request = DailyRunRequest::new(&brand)
        .force(body.force)
        .dry_run(body.dry_run);
    if let Some(date) = body.date {
        request = request.on(date);
    }
    if let Some(platforms) = body.platforms.filter(|p| !p.is_empty()) {
        request = request.platforms(platforms);
    }

    let summary = state
        .orchestrator
        .execute_daily(&request)
        .await
        .map_err(|e| map_orchestrator_error(rid.clone(), &e))?;

    Ok(envelope(req_id.0, summary))
}

pub(super) async fn execution_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<BrandDateQuery>,
) -> ApiResult<ExecutionStatus> {
    let rid = &req_id.0;
    let brand = brand_or_scheduled(&state, rid, query.brand)?;
    let date = query.date.as_deref().map(|d| parse_date(rid, d)).transpose()?;

    let status = state
        .orchestrator
        .get_execution_status(&brand, date)
        .await
        .map_err(|e| map_orchestrator_error(rid.clone(), &e))?;

    Ok(envelope(req_id.0, status))
}

/// POST /api/v1/orchestrator/retry/{date}/{platform}: re-dispatch one post.
pub(super) async fn retry_post(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((date, platform)): Path<(String, String)>,
    Query(query): Query<BrandDateQuery>,
) -> ApiResult<RunSummary> {
    let rid = &req_id.0;
    let date = parse_date(rid, &date)?;
    let platform: Platform = platform.parse().map_err(|_| {
        ApiError::new(
            rid,
            "validation_error",
            format!("unknown platform '{platform}'"),
        )
    })?;
    let brand = brand_or_scheduled(&state, rid, query.brand)?;

    let summary = state
        .orchestrator
        .retry_post(&brand, date, platform)
        .await
        .map_err(|e| map_orchestrator_error(rid.clone(), &e))?;

    Ok(envelope(req_id.0, summary))
}
