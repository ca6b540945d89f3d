//! Database operations for `post_records`.

use cadence_core::{GeneratedPost, Platform, PostRecord, PostingResult};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `post_records` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRecordRow {
    pub id: String,
    pub brand_name: String,
    pub post_date: NaiveDate,
    pub platform: String,
    pub post_id: String,
    pub content_hash: String,
    pub posting_result: Json<PostingResult>,
    pub generated_post: Json<GeneratedPost>,
    pub recorded_at: DateTime<Utc>,
}

impl TryFrom<PostRecordRow> for PostRecord {
    type Error = DbError;

    fn try_from(row: PostRecordRow) -> Result<Self, Self::Error> {
        let platform = row
            .platform
            .parse::<Platform>()
            .map_err(|e| DbError::Corrupt {
                table: "post_records",
                reason: e.to_string(),
            })?;

        Ok(PostRecord {
            id: row.id,
            brand_name: row.brand_name,
            date: row.post_date,
            platform,
            post_id: row.post_id,
            content_hash: row.content_hash,
            posting_result: row.posting_result.0,
            generated_post: row.generated_post.0,
            recorded_at: row.recorded_at,
        })
    }
}

const SELECT_COLUMNS: &str = "SELECT id, brand_name, post_date, platform, post_id, content_hash, \
                              posting_result, generated_post, recorded_at \
                              FROM post_records";

/// Insert `record`. A second insert with the same `id` is ignored.
///
/// Returns `true` when a row was written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_post_record(pool: &PgPool, record: &PostRecord) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO post_records \
         (id, brand_name, post_date, platform, post_id, content_hash, success, \
          posting_result, generated_post, recorded_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(&record.id)
    .bind(&record.brand_name)
    .bind(record.date)
    .bind(record.platform.as_str())
    .bind(&record.post_id)
    .bind(&record.content_hash)
    .bind(record.posting_result.success)
    .bind(Json(&record.posting_result))
    .bind(Json(&record.generated_post))
    .bind(record.recorded_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn has_successful_post(
    pool: &PgPool,
    date: NaiveDate,
    platform: Platform,
) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (\
            SELECT 1 FROM post_records \
            WHERE post_date = $1 AND platform = $2 AND success\
         )",
    )
    .bind(date)
    .bind(platform.as_str())
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// True when `hash` is recorded under any pair other than `(date, platform)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn hash_exists_elsewhere(
    pool: &PgPool,
    hash: &str,
    date: NaiveDate,
    platform: Platform,
) -> Result<bool, DbError> {
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (\
            SELECT 1 FROM post_records \
            WHERE content_hash = $1 AND NOT (post_date = $2 AND platform = $3)\
         )",
    )
    .bind(hash)
    .bind(date)
    .bind(platform.as_str())
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Records dated within `[start, end]`, optionally for one platform, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or [`DbError::Corrupt`] if a
/// row holds an unknown platform.
pub async fn list_post_records(
    pool: &PgPool,
    start: NaiveDate,
    end: NaiveDate,
    platform: Option<Platform>,
) -> Result<Vec<PostRecord>, DbError> {
    let sql = format!(
        "{SELECT_COLUMNS} \
         WHERE post_date BETWEEN $1 AND $2 \
           AND ($3::TEXT IS NULL OR platform = $3) \
         ORDER BY post_date DESC, recorded_at DESC"
    );

    let rows = sqlx::query_as::<_, PostRecordRow>(&sql)
        .bind(start)
        .bind(end)
        .bind(platform.map(Platform::as_str))
        .fetch_all(pool)
        .await?;

    rows.into_iter().map(PostRecord::try_from).collect()
}

/// Delete records dated before `cutoff`, returning the number removed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_post_records_before(pool: &PgPool, cutoff: NaiveDate) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM post_records WHERE post_date < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
