//! In-process task queue
//!
//! Same semantics as the Postgres queue (leases, fenced acks, bounded
//! attempts), kept in memory. Also records how many leases are held at once,
//! which is what the worker's concurrency bound is measured against.

use crate::db::models::{ScreeningTask, TaskId, TaskStatus};
use crate::error::{Result, ScreeningError};
use crate::queue::{LeasedTask, QueueStats, TaskOutcome, TaskQueue};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Snapshot of one task held by a [`MemoryQueue`]
#[derive(Debug, Clone)]
pub struct MemoryTask {
    pub task: ScreeningTask,
    pub status: TaskStatus,
    pub attempts: i32,
    pub max_attempts: i32,
    pub leased_by: Option<String>,
    pub last_error: Option<String>,
    pub outcome: Option<String>,
    available_at: Instant,
    lease_expires_at: Option<Instant>,
}

#[derive(Default)]
struct QueueState {
    tasks: BTreeMap<TaskId, MemoryTask>,
    next_id: TaskId,
    in_flight: usize,
    peak_in_flight: usize,
    total_leases: usize,
}

impl QueueState {
    /// Look up a task still leased under this attempt
    fn leased_mut(&mut self, lease: &LeasedTask) -> Option<&mut MemoryTask> {
        self.tasks
            .get_mut(&lease.id)
            .filter(|t| t.status == TaskStatus::Leased && t.attempts == lease.attempt)
    }

    fn release(&mut self) {
        self.in_flight = self.in_flight.saturating_sub(1);
    }
}

/// In-memory [`TaskQueue`]
#[derive(Default)]
pub struct MemoryQueue {
    state: Mutex<QueueState>,
    unavailable: AtomicBool,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Simulate an unreachable queue: every call fails with `QueueUnavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ScreeningError::QueueUnavailable(
                "memory queue is unavailable".to_string(),
            ));
        }
        Ok(())
    }

    /// Snapshot of a task by id
    pub fn get(&self, task_id: TaskId) -> Option<MemoryTask> {
        self.state().tasks.get(&task_id).cloned()
    }

    /// Leases currently held
    pub fn in_flight(&self) -> usize {
        self.state().in_flight
    }

    /// Highest number of leases held at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.state().peak_in_flight
    }

    /// Number of deliveries handed out so far
    pub fn total_leases(&self) -> usize {
        self.state().total_leases
    }

    /// Whether every task has reached a terminal state
    pub fn is_drained(&self) -> bool {
        self.state().tasks.values().all(|t| t.status.is_terminal())
    }
}

#[async_trait]
impl TaskQueue for MemoryQueue {
    async fn enqueue(&self, task: &ScreeningTask, max_attempts: i32) -> Result<TaskId> {
        self.check_available()?;
        let mut state = self.state();
        state.next_id += 1;
        let id = state.next_id;
        state.tasks.insert(
            id,
            MemoryTask {
                task: task.clone(),
                status: TaskStatus::Queued,
                attempts: 0,
                max_attempts,
                leased_by: None,
                last_error: None,
                outcome: None,
                available_at: Instant::now(),
                lease_expires_at: None,
            },
        );
        Ok(id)
    }

    async fn lease(&self, worker_id: &str, lease_for: Duration) -> Result<Option<LeasedTask>> {
        self.check_available()?;
        let now = Instant::now();
        let mut state = self.state();

        let next = state
            .tasks
            .iter()
            .filter(|(_, t)| t.status == TaskStatus::Queued && t.available_at <= now)
            .min_by_key(|(id, t)| (t.available_at, **id))
            .map(|(id, _)| *id);

        let Some(id) = next else {
            return Ok(None);
        };

        let leased = {
            let Some(task) = state.tasks.get_mut(&id) else {
                return Ok(None);
            };
            task.status = TaskStatus::Leased;
            task.attempts += 1;
            task.leased_by = Some(worker_id.to_string());
            task.lease_expires_at = Some(now + lease_for);
            LeasedTask {
                id,
                task: task.task.clone(),
                attempt: task.attempts,
                max_attempts: task.max_attempts,
            }
        };

        state.in_flight += 1;
        state.total_leases += 1;
        state.peak_in_flight = state.peak_in_flight.max(state.in_flight);

        Ok(Some(leased))
    }

    async fn complete(&self, lease: &LeasedTask, outcome: &TaskOutcome) -> Result<bool> {
        self.check_available()?;
        let mut state = self.state();
        let Some(task) = state.leased_mut(lease) else {
            return Ok(false);
        };
        task.status = outcome.status();
        task.outcome = Some(outcome.to_string());
        task.last_error = None;
        task.leased_by = None;
        task.lease_expires_at = None;
        state.release();
        Ok(true)
    }

    async fn retry_later(
        &self,
        lease: &LeasedTask,
        error: &str,
        delay: Duration,
    ) -> Result<Option<TaskStatus>> {
        self.check_available()?;
        let mut state = self.state();
        let Some(task) = state.leased_mut(lease) else {
            return Ok(None);
        };
        task.status = if task.attempts >= task.max_attempts {
            TaskStatus::Failed
        } else {
            task.available_at = Instant::now() + delay;
            TaskStatus::Queued
        };
        task.last_error = Some(error.to_string());
        task.leased_by = None;
        task.lease_expires_at = None;
        let status = task.status;
        state.release();
        Ok(Some(status))
    }

    async fn fail(&self, lease: &LeasedTask, error: &str) -> Result<bool> {
        self.check_available()?;
        let mut state = self.state();
        let Some(task) = state.leased_mut(lease) else {
            return Ok(false);
        };
        task.status = TaskStatus::Failed;
        task.last_error = Some(error.to_string());
        task.leased_by = None;
        task.lease_expires_at = None;
        state.release();
        Ok(true)
    }

    async fn reclaim_expired(&self) -> Result<u64> {
        self.check_available()?;
        let now = Instant::now();
        let mut state = self.state();
        let mut reclaimed = 0;

        for task in state.tasks.values_mut() {
            let expired = task.status == TaskStatus::Leased
                && task.lease_expires_at.map(|at| at < now).unwrap_or(false);
            if !expired {
                continue;
            }
            task.status = if task.attempts >= task.max_attempts {
                TaskStatus::Failed
            } else {
                TaskStatus::Queued
            };
            task.available_at = now;
            task.last_error = Some("lease expired".to_string());
            task.leased_by = None;
            task.lease_expires_at = None;
            reclaimed += 1;
        }

        state.in_flight = state.in_flight.saturating_sub(reclaimed);
        Ok(reclaimed as u64)
    }

    async fn stats(&self) -> Result<QueueStats> {
        self.check_available()?;
        let mut stats = QueueStats::default();
        for task in self.state().tasks.values() {
            stats.add(task.status, 1);
        }
        Ok(stats)
    }
}
