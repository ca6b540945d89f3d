//! Plan handlers.
//!
//! - `POST /api/v1/plans`: generate and activate a plan
//! - `GET  /api/v1/plans/{brand}/active`: the brand's active plan
//! - `GET  /api/v1/plans/{brand}/posts/{date}`: planned posts for one day

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use cadence_core::{DailyPost, StoredPlan};
use cadence_strategy::{generate_plan, PlanRequest, StrategyError};
use chrono::{NaiveDate, Utc};
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    brand_or_scheduled, envelope, map_storage_error, parse_date, ApiError, ApiResponse,
    ApiResult, AppState,
    };

#[derive(Debug, Deserialize)]
pub(super) struct CreatePlanRequest {
    /// Brand profile name from `brands.yaml`; defaults to the scheduled brand.
    pub brand: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub duration_days: Option<u32>,
    /// Fixes the variation picks so the plan is reproducible.
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
pub(super) struct CreatePlanResponse {
    pub plan_id: String,
    pub brand_name: String,
    pub campaign_name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_posts: usize,
}

pub(super) async fn create_plan(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreatePlanResponse>>), ApiError> {
    let rid = &req_id.0;
    let brand = brand_or_scheduled(&state, rid, body.brand)?;
    let profile = state
        .brands
        .find(&brand)
        .ok_or_else(|| ApiError::new(rid, "not_found", format!("brand '{brand}' not found")))?;

    let start = body.start_date.unwrap_or_else(|| Utc::now().date_naive());
    let mut request = PlanRequest::from_brand(profile, start);
    if let Some(days) = body.duration_days {
        request.duration_days = days;
    }

    let mut rng = body
        .seed
        .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
    let plan = generate_plan(&request, &mut rng).map_err(|e| strategy_error(rid, &e))?;
    let plan_id = state
        .store
        .save_plan(&plan)
        .await
        .map_err(|e| map_storage_error(rid.clone(), &e))?;

    tracing::info!(brand = %plan.brand_name, plan_id = %plan_id, "plan generated");

    Ok((
        StatusCode::CREATED,
        envelope(
            req_id.0,
            CreatePlanResponse {
                plan_id,
                brand_name: plan.brand_name,
                campaign_name: plan.campaign_name,
                start_date: plan.calendar.start_date,
                end_date: plan.calendar.end_date,
                total_posts: plan.calendar.total_posts,
            },
        ),
    ))
}

fn strategy_error(request_id: &str, error: &StrategyError) -> ApiError {
    ApiError::new(request_id, "validation_error", error.to_string())
}

async fn load_active(
    state: &AppState,
    request_id: &str,
    brand: &str,
) -> Result<StoredPlan, ApiError> {
    state
        .store
        .get_active_plan(brand)
        .await
        .map_err(|e| map_storage_error(request_id.to_owned(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                request_id,
                "not_found",
                format!("no active plan for brand '{brand}'"),
            )
        })
}

pub(super) async fn get_active_plan(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(brand): Path<String>,
) -> ApiResult<StoredPlan> {
    let plan = load_active(&state, &req_id.0, &brand).await?;
    Ok(envelope(req_id.0, plan))
}

pub(super) async fn list_posts_for_date(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((brand, date)): Path<(String, String)>,
) -> ApiResult<Vec<DailyPost>> {
    let rid = &req_id.0;
    let date = parse_date(rid, &date)?;
    let plan = load_active(&state, rid, &brand).await?;

    let posts: Vec<DailyPost> = plan.plan.posts_for(date).into_iter().cloned().collect();
    Ok(envelope(req_id.0, posts))
}
