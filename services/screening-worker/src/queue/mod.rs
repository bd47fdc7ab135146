//! Durable screening task queue
//!
//! This module provides:
//! - TaskQueue: the queue contract consumed by the worker and the enqueuer
//! - PgTaskQueue: Postgres-backed implementation (screening_tasks table)
//! - MemoryQueue: in-process implementation with lease accounting
//! - TaskEnqueuer: web-tier entry point that schedules screenings

pub mod enqueuer;
pub mod memory;
pub mod postgres;

pub use enqueuer::TaskEnqueuer;
pub use memory::MemoryQueue;
pub use postgres::PgTaskQueue;

use crate::db::models::{ScreeningTask, TaskId, TaskStatus};
use crate::error::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// A task currently leased by one worker
#[derive(Debug, Clone, PartialEq)]
pub struct LeasedTask {
    pub id: TaskId,
    pub task: ScreeningTask,
    /// 1-based attempt number of this delivery
    pub attempt: i32,
    pub max_attempts: i32,
}

/// How a processed task ended
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    /// A screening was written
    Completed { score_total: f64 },
    /// The task was acknowledged without scoring
    Skipped { reason: String },
}

impl TaskOutcome {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskOutcome::Completed { .. } => TaskStatus::Completed,
            TaskOutcome::Skipped { .. } => TaskStatus::Skipped,
        }
    }
}

impl fmt::Display for TaskOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskOutcome::Completed { score_total } => write!(f, "score_total={}", score_total),
            TaskOutcome::Skipped { reason } => write!(f, "skipped: {}", reason),
        }
    }
}

/// Task counts per status
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub queued: i64,
    pub leased: i64,
    pub completed: i64,
    pub skipped: i64,
    pub failed: i64,
}

impl QueueStats {
    pub fn add(&mut self, status: TaskStatus, count: i64) {
        match status {
            TaskStatus::Queued => self.queued += count,
            TaskStatus::Leased => self.leased += count,
            TaskStatus::Completed => self.completed += count,
            TaskStatus::Skipped => self.skipped += count,
            TaskStatus::Failed => self.failed += count,
        }
    }
}

/// Durable queue contract
///
/// Delivery is at-least-once: a task whose lease expires before it is
/// acknowledged is handed out again by [`TaskQueue::reclaim_expired`].
#[async_trait]
pub trait TaskQueue: Send + Sync {
    /// Persist a task; fails if the queue storage is unreachable
    async fn enqueue(&self, task: &ScreeningTask, max_attempts: i32) -> Result<TaskId>;

    /// Lease the next available task for `lease_for`
    async fn lease(&self, worker_id: &str, lease_for: Duration) -> Result<Option<LeasedTask>>;

    /// Acknowledge a leased task as completed or skipped.
    ///
    /// Returns false when the lease was lost in the meantime.
    async fn complete(&self, lease: &LeasedTask, outcome: &TaskOutcome) -> Result<bool>;

    /// Re-queue a leased task after `delay`, or fail it once attempts are exhausted.
    ///
    /// Returns the resulting status, or None when the lease was lost.
    async fn retry_later(
        &self,
        lease: &LeasedTask,
        error: &str,
        delay: Duration,
    ) -> Result<Option<TaskStatus>>;

    /// Terminally fail a leased task without retrying
    async fn fail(&self, lease: &LeasedTask, error: &str) -> Result<bool>;

    /// Re-queue (or fail) tasks whose lease has expired
    async fn reclaim_expired(&self) -> Result<u64>;

    async fn stats(&self) -> Result<QueueStats>;
}
