//! Database operations for `performance_metrics`.

use cadence_core::{PerformanceMetrics, Platform};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MetricsRow {
    pub id: i64,
    pub post_id: String,
    pub platform: String,
    pub impressions: i64,
    pub engagements: i64,
    pub clicks: i64,
    pub shares: i64,
    pub comments: i64,
    pub likes: i64,
    pub engagement_rate: f64,
    pub measured_at: DateTime<Utc>,
}

impl TryFrom<MetricsRow> for PerformanceMetrics {
    type Error = DbError;

    fn try_from(row: MetricsRow) -> Result<Self, Self::Error> {
        let platform = row
            .platform
            .parse::<Platform>()
            .map_err(|e| DbError::Corrupt {
                table: "performance_metrics",
                reason: e.to_string(),
            })?;

        Ok(PerformanceMetrics {
            post_id: row.post_id,
            platform,
            impressions: row.impressions,
            engagements: row.engagements,
            clicks: row.clicks,
            shares: row.shares,
            comments: row.comments,
            likes: row.likes,
            engagement_rate: row.engagement_rate,
            measured_at: row.measured_at,
        })
    }
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_metrics(pool: &PgPool, metrics: &PerformanceMetrics) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO performance_metrics \
         (post_id, platform, impressions, engagements, clicks, shares, comments, likes, \
          engagement_rate, measured_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         RETURNING id",
    )
    .bind(&metrics.post_id)
    .bind(metrics.platform.as_str())
    .bind(metrics.impressions)
    .bind(metrics.engagements)
    .bind(metrics.clicks)
    .bind(metrics.shares)
    .bind(metrics.comments)
    .bind(metrics.likes)
    .bind(metrics.engagement_rate)
    .bind(metrics.measured_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Samples for `post_id`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_metrics_for_post(
    pool: &PgPool,
    post_id: &str,
) -> Result<Vec<PerformanceMetrics>, DbError> {
    let rows = sqlx::query_as::<_, MetricsRow>(
        "SELECT id, post_id, platform, impressions, engagements, clicks, shares, comments, \
                likes, engagement_rate, measured_at \
         FROM performance_metrics \
         WHERE post_id = $1 \
         ORDER BY measured_at DESC, id DESC",
    )
    .bind(post_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(PerformanceMetrics::try_from).collect()
}

/// Delete samples measured before midnight UTC of `cutoff`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_metrics_before(pool: &PgPool, cutoff: NaiveDate) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM performance_metrics WHERE measured_at < $1")
        .bind(cutoff.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()))
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
