//! Postgres-backed task queue

use crate::db::models::{ScreeningTask, TaskId, TaskStatus};
use crate::db::{tasks, DbPool};
use crate::error::Result;
use crate::queue::{LeasedTask, QueueStats, TaskOutcome, TaskQueue};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// Queue stored in the `screening_tasks` table
#[derive(Clone)]
pub struct PgTaskQueue {
    pool: DbPool,
}

impl PgTaskQueue {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskQueue for PgTaskQueue {
    async fn enqueue(&self, task: &ScreeningTask, max_attempts: i32) -> Result<TaskId> {
        tasks::insert_task(&self.pool, task, max_attempts).await
    }

    async fn lease(&self, worker_id: &str, lease_for: Duration) -> Result<Option<LeasedTask>> {
        let row = tasks::lease_next_task(&self.pool, worker_id, lease_for).await?;

        Ok(row.map(|row| LeasedTask {
            id: row.id,
            task: row.task(),
            attempt: row.attempts,
            max_attempts: row.max_attempts,
        }))
    }

    async fn complete(&self, lease: &LeasedTask, outcome: &TaskOutcome) -> Result<bool> {
        tasks::finish_task(
            &self.pool,
            lease.id,
            lease.attempt,
            outcome.status(),
            &outcome.to_string(),
        )
        .await
    }

    async fn retry_later(
        &self,
        lease: &LeasedTask,
        error: &str,
        delay: Duration,
    ) -> Result<Option<TaskStatus>> {
        tasks::requeue_task(&self.pool, lease.id, lease.attempt, error, delay).await
    }

    async fn fail(&self, lease: &LeasedTask, error: &str) -> Result<bool> {
        tasks::fail_task(&self.pool, lease.id, lease.attempt, error).await
    }

    async fn reclaim_expired(&self) -> Result<u64> {
        tasks::reclaim_expired_leases(&self.pool).await
    }

    async fn stats(&self) -> Result<QueueStats> {
        let mut stats = QueueStats::default();
        for (status, count) in tasks::count_tasks_by_status(&self.pool).await? {
            match TaskStatus::parse(&status) {
                Some(status) => stats.add(status, count),
                None => warn!("Unknown task status in screening_tasks: {}", status),
            }
        }
        Ok(stats)
    }
}
