//! Database operations for `orchestrator_runs` and `orchestrator_states`.

use cadence_core::{OrchestratorState, RunRecord};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `orchestrator_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RunRow {
    pub run_date: NaiveDate,
    pub brand_name: String,
    pub attempted: i64,
    pub succeeded: i64,
    pub failed: i64,
    pub skipped: i64,
    pub errors: Json<Vec<String>>,
    pub executed_at: DateTime<Utc>,
}

fn count(field: &'static str, value: i64) -> Result<u32, DbError> {
    u32::try_from(value).map_err(|_| DbError::Corrupt {
        table: "orchestrator_runs",
        reason: format!("{field} out of range: {value}"),
    })
}

impl TryFrom<RunRow> for RunRecord {
    type Error = DbError;

    fn try_from(row: RunRow) -> Result<Self, Self::Error> {
        Ok(RunRecord {
            run_date: row.run_date,
            brand_name: row.brand_name,
            attempted: count("attempted", row.attempted)?,
            succeeded: count("succeeded", row.succeeded)?,
            failed: count("failed", row.failed)?,
            skipped: count("skipped", row.skipped)?,
            errors: row.errors.0,
            executed_at: row.executed_at,
        })
    }
}

// ---------------------------------------------------------------------------
// orchestrator_runs operations
// ---------------------------------------------------------------------------

/// Insert or overwrite the run row for `run.run_date`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_run(pool: &PgPool, run: &RunRecord) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO orchestrator_runs \
         (run_date, brand_name, attempted, succeeded, failed, skipped, errors, executed_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (run_date) DO UPDATE SET \
           brand_name = EXCLUDED.brand_name, \
           attempted = EXCLUDED.attempted, \
           succeeded = EXCLUDED.succeeded, \
           failed = EXCLUDED.failed, \
           skipped = EXCLUDED.skipped, \
           errors = EXCLUDED.errors, \
           executed_at = EXCLUDED.executed_at",
    )
    .bind(run.run_date)
    .bind(&run.brand_name)
    .bind(i64::from(run.attempted))
    .bind(i64::from(run.succeeded))
    .bind(i64::from(run.failed))
    .bind(i64::from(run.skipped))
    .bind(Json(&run.errors))
    .bind(run.executed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_run(pool: &PgPool, run_date: NaiveDate) -> Result<Option<RunRecord>, DbError> {
    let row = sqlx::query_as::<_, RunRow>(
        "SELECT run_date, brand_name, attempted, succeeded, failed, skipped, errors, executed_at \
         FROM orchestrator_runs \
         WHERE run_date = $1",
    )
    .bind(run_date)
    .fetch_optional(pool)
    .await?;

    row.map(RunRecord::try_from).transpose()
}

// ---------------------------------------------------------------------------
// orchestrator_states operations
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_state(pool: &PgPool, state: &OrchestratorState) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO orchestrator_states (run_date, state, updated_at) \
         VALUES ($1, $2, NOW()) \
         ON CONFLICT (run_date) DO UPDATE SET state = EXCLUDED.state, updated_at = NOW()",
    )
    .bind(state.current_date)
    .bind(Json(state))
    .execute(pool)
    .await?;

    Ok(())
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_state(
    pool: &PgPool,
    run_date: NaiveDate,
) -> Result<Option<OrchestratorState>, DbError> {
    let state = sqlx::query_scalar::<_, Json<OrchestratorState>>(
        "SELECT state FROM orchestrator_states WHERE run_date = $1",
    )
    .bind(run_date)
    .fetch_optional(pool)
    .await?;

    Ok(state.map(|s| s.0))
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails.
pub async fn delete_states_before(pool: &PgPool, cutoff: NaiveDate) -> Result<u64, DbError> {
    let result = sqlx::query("DELETE FROM orchestrator_states WHERE run_date < $1")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
