//! Screening task queue database operations
//!
//! Leasing uses `FOR UPDATE SKIP LOCKED` so any number of workers can poll the
//! same table. Every acknowledgement is fenced on `(id, attempts, 'leased')`:
//! once a lease has expired and the task was handed to someone else, the
//! original holder's ack matches no row.

use crate::db::models::{QueuedTask, ScreeningTask, TaskId, TaskStatus};
use crate::db::DbPool;
use crate::error::Result;
use sqlx::Row;
use std::time::Duration;

/// Insert a new queued task
pub async fn insert_task(pool: &DbPool, task: &ScreeningTask, max_attempts: i32) -> Result<TaskId> {
    let id = sqlx::query_scalar::<_, TaskId>(
        r#"
        INSERT INTO screening_tasks (role_id, candidate_id, max_attempts)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(&task.role_id)
    .bind(&task.candidate_id)
    .bind(max_attempts)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Atomically lease the next available task and return it.
///
/// Increments `attempts`, so the returned row carries the attempt number of
/// this delivery.
pub async fn lease_next_task(
    pool: &DbPool,
    worker_id: &str,
    lease_for: Duration,
) -> Result<Option<QueuedTask>> {
    let task = sqlx::query_as::<_, QueuedTask>(
        r#"
        WITH next_task AS (
            SELECT id FROM screening_tasks
            WHERE status = 'queued'
              AND available_at <= NOW()
            ORDER BY available_at ASC, id ASC
            LIMIT 1
            FOR UPDATE SKIP LOCKED
        )
        UPDATE screening_tasks
        SET status = 'leased',
            attempts = attempts + 1,
            leased_by = $1,
            lease_expires_at = NOW() + make_interval(secs => $2),
            updated_at = NOW()
        WHERE id = (SELECT id FROM next_task)
        RETURNING *
        "#,
    )
    .bind(worker_id)
    .bind(lease_for.as_secs_f64())
    .fetch_optional(pool)
    .await?;

    Ok(task)
}

/// Finish a leased task as completed or skipped
///
/// Returns false when the lease is no longer held.
pub async fn finish_task(
    pool: &DbPool,
    task_id: TaskId,
    attempt: i32,
    status: TaskStatus,
    outcome: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE screening_tasks
        SET status = $3,
            outcome = $4,
            last_error = NULL,
            leased_by = NULL,
            lease_expires_at = NULL,
            finished_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
          AND attempts = $2
          AND status = 'leased'
        "#,
    )
    .bind(task_id)
    .bind(attempt)
    .bind(status.as_str())
    .bind(outcome)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Put a leased task back on the queue after `delay`, or fail it when its
/// attempts are exhausted
///
/// Returns the resulting status, or None when the lease is no longer held.
pub async fn requeue_task(
    pool: &DbPool,
    task_id: TaskId,
    attempt: i32,
    error_msg: &str,
    delay: Duration,
) -> Result<Option<TaskStatus>> {
    let row = sqlx::query(
        r#"
        UPDATE screening_tasks
        SET status = CASE WHEN attempts >= max_attempts THEN 'failed' ELSE 'queued' END,
            available_at = CASE
                WHEN attempts >= max_attempts THEN available_at
                ELSE NOW() + make_interval(secs => $4)
            END,
            finished_at = CASE WHEN attempts >= max_attempts THEN NOW() ELSE NULL END,
            last_error = $3,
            leased_by = NULL,
            lease_expires_at = NULL,
            updated_at = NOW()
        WHERE id = $1
          AND attempts = $2
          AND status = 'leased'
        RETURNING status
        "#,
    )
    .bind(task_id)
    .bind(attempt)
    .bind(error_msg)
    .bind(delay.as_secs_f64())
    .fetch_optional(pool)
    .await?;

    Ok(row.and_then(|r| TaskStatus::parse(r.get::<&str, _>("status"))))
}

/// Terminally fail a leased task
pub async fn fail_task(
    pool: &DbPool,
    task_id: TaskId,
    attempt: i32,
    error_msg: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE screening_tasks
        SET status = 'failed',
            last_error = $3,
            leased_by = NULL,
            lease_expires_at = NULL,
            finished_at = NOW(),
            updated_at = NOW()
        WHERE id = $1
          AND attempts = $2
          AND status = 'leased'
        "#,
    )
    .bind(task_id)
    .bind(attempt)
    .bind(error_msg)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Release leases whose holder stopped responding
///
/// Tasks with attempts left become available again, the rest are failed.
pub async fn reclaim_expired_leases(pool: &DbPool) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE screening_tasks
        SET status = CASE WHEN attempts >= max_attempts THEN 'failed' ELSE 'queued' END,
            finished_at = CASE WHEN attempts >= max_attempts THEN NOW() ELSE NULL END,
            last_error = 'lease expired',
            available_at = NOW(),
            leased_by = NULL,
            lease_expires_at = NULL,
            updated_at = NOW()
        WHERE status = 'leased'
          AND lease_expires_at < NOW()
        "#,
    )
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Count tasks per status for monitoring
pub async fn count_tasks_by_status(pool: &DbPool) -> Result<Vec<(String, i64)>> {
    let rows = sqlx::query_as::<_, (String, i64)>(
        r#"
        SELECT status, COUNT(*) AS count
        FROM screening_tasks
        GROUP BY status
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Get a task by ID
pub async fn get_task_by_id(pool: &DbPool, task_id: TaskId) -> Result<Option<QueuedTask>> {
    let task = sqlx::query_as::<_, QueuedTask>("SELECT * FROM screening_tasks WHERE id = $1")
        .bind(task_id)
        .fetch_optional(pool)
        .await?;

    Ok(task)
}
