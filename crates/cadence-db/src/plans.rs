//! Database operations for `monthly_plans`.

use cadence_core::{MonthlyPlan, StoredPlan};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `monthly_plans` table (plan body decoded from JSONB).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PlanRow {
    pub id: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub plan: Json<MonthlyPlan>,
}

impl From<PlanRow> for StoredPlan {
    fn from(row: PlanRow) -> Self {
        StoredPlan {
            id: row.id,
            is_active: row.is_active,
            saved_at: row.created_at,
            plan: row.plan.0,
        }
    }
}

/// Insert `plan` under `plan_id` and make it the brand's only active plan.
///
/// Deactivation and insert share one transaction, and a per-brand advisory
/// lock serialises concurrent saves for the same brand.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the transaction is rolled back.
pub async fn insert_active_plan(
    pool: &PgPool,
    plan_id: &str,
    plan: &MonthlyPlan,
) -> Result<(), DbError> {
    let slug = plan.brand_slug();
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(&slug)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE monthly_plans SET is_active = FALSE WHERE brand_slug = $1 AND is_active")
        .bind(&slug)
        .execute(&mut *tx)
        .await?;

    sqlx::query(
        "INSERT INTO monthly_plans \
         (id, brand_slug, brand_name, start_date, end_date, plan, is_active, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, TRUE, clock_timestamp())",
    )
    .bind(plan_id)
    .bind(&slug)
    .bind(&plan.brand_name)
    .bind(plan.calendar.start_date)
    .bind(plan.calendar.end_date)
    .bind(Json(plan))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Returns the active plan for `brand_slug`, newest first if more than one
/// somehow survives.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_active_plan(pool: &PgPool, brand_slug: &str) -> Result<Option<PlanRow>, DbError> {
    let row = sqlx::query_as::<_, PlanRow>(
        "SELECT id, is_active, created_at, plan \
         FROM monthly_plans \
         WHERE brand_slug = $1 AND is_active \
         ORDER BY created_at DESC \
         LIMIT 1",
    )
    .bind(brand_slug)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
