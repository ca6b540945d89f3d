//! Performance, metrics and retention handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use cadence_core::{
    performance::engagement_rate, CleanupStats, PerformanceMetrics, PerformanceSummary, Platform,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    envelope, map_storage_error, parse_date, ApiError, ApiResponse, ApiResult, AppState,
};

#[derive(Debug, Deserialize)]
pub(super) struct DateQuery {
    /// Reference date; the summary covers the day before it.
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RecordMetricsRequest {
    pub post_id: String,
    pub platform: Platform,
    #[serde(default)]
    pub impressions: i64,
    #[serde(default)]
    pub engagements: i64,
    #[serde(default)]
    pub clicks: i64,
    #[serde(default)]
    pub shares: i64,
    #[serde(default)]
    pub comments: i64,
    #[serde(default)]
    pub likes: i64,
    pub measured_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub(super) struct RecordMetricsResponse {
    pub post_id: String,
    pub engagement_rate: f64,
}

#[derive(Debug, Deserialize)]
pub(super) struct CleanupQuery {
    pub days: Option<u32>,
}

pub(super) async fn yesterday_performance(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(brand): Path<String>,
    Query(query): Query<DateQuery>,
) -> ApiResult<PerformanceSummary> {
    let rid = &req_id.0;
    let today = match query.date.as_deref() {
        Some(d) => parse_date(rid, d)?,
        None => Utc::now().date_naive(),
    };

    let summary = state
        .store
        .get_yesterday_performance(&brand, today)
        .await
        .map_err(|e| map_storage_error(rid.clone(), &e))?;

    Ok(envelope(req_id.0, summary))
}

pub(super) async fn record_metrics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RecordMetricsRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RecordMetricsResponse>>), ApiError> {
    let rid = &req_id.0;
    if body.post_id.trim().is_empty() {
        return Err(ApiError::new(rid, "validation_error", "post_id is required"));
    }
    let counts = [
        body.impressions,
        body.engagements,
        body.clicks,
        body.shares,
        body.comments,
        body.likes,
    ];
    if counts.iter().any(|v| *v < 0) {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "metric counts must be non-negative",
        ));
    }

    let metrics = PerformanceMetrics {
        post_id: body.post_id,
        platform: body.platform,
        impressions: body.impressions,
        engagements: body.engagements,
        clicks: body.clicks,
        shares: body.shares,
        comments: body.comments,
        likes: body.likes,
        engagement_rate: engagement_rate(body.engagements, body.impressions),
        measured_at: body.measured_at.unwrap_or_else(Utc::now),
    };
    state
        .store
        .save_metrics(&metrics)
        .await
        .map_err(|e| map_storage_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        envelope(
            req_id.0,
            RecordMetricsResponse {
                post_id: metrics.post_id,
                engagement_rate: metrics.engagement_rate,
            },
        ),
    ))
}

/// DELETE /api/v1/data/cleanup: apply the retention window.
pub(super) async fn cleanup(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CleanupQuery>,
) -> ApiResult<CleanupStats> {
    let rid = &req_id.0;
    let days = query.days.unwrap_or(state.retention_days);
    if days == 0 {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "days must be at least 1",
        ));
    }

    let stats = state
        .store
        .cleanup(days)
        .await
        .map_err(|e| map_storage_error(rid.clone(), &e))?;
    tracing::info!(days, posts_deleted = stats.posts_deleted, "cleanup via api");

    Ok(envelope(req_id.0, stats))
}
