//! Task enqueuer used by the web tier

use crate::db::models::{CandidateId, RoleId, ScreeningTask, TaskId};
use crate::error::{Result, ScreeningError};
use crate::queue::TaskQueue;
use std::sync::Arc;
use tracing::{error, info};

/// Schedules screenings on a [`TaskQueue`]
///
/// The caller has already validated that role and candidate exist; nothing
/// is re-checked here and no scoring happens synchronously.
#[derive(Clone)]
pub struct TaskEnqueuer {
    queue: Arc<dyn TaskQueue>,
    max_attempts: i32,
}

impl TaskEnqueuer {
    pub fn new(queue: Arc<dyn TaskQueue>, max_attempts: i32) -> Self {
        Self {
            queue,
            max_attempts,
        }
    }

    /// Durably schedule one (role, candidate) screening
    ///
    /// Fails with [`ScreeningError::QueueUnavailable`] when the queue can't be
    /// written, so the caller can report that the screening was not scheduled.
    pub async fn enqueue(&self, role_id: &RoleId, candidate_id: &CandidateId) -> Result<TaskId> {
        let task = ScreeningTask {
            role_id: role_id.clone(),
            candidate_id: candidate_id.clone(),
        };

        match self.queue.enqueue(&task, self.max_attempts).await {
            Ok(task_id) => {
                info!(task_id, %role_id, %candidate_id, "Screening task enqueued");
                Ok(task_id)
            }
            Err(e) => {
                error!(%role_id, %candidate_id, "Failed to enqueue screening task: {}", e);
                Err(match e {
                    ScreeningError::QueueUnavailable(msg) => ScreeningError::QueueUnavailable(msg),
                    other => ScreeningError::QueueUnavailable(other.to_string()),
                })
            }
        }
    }

    /// Schedule one screening per candidate for a role
    ///
    /// Stops at the first queue failure; tasks enqueued before it stay queued.
    pub async fn enqueue_for_role(
        &self,
        role_id: &RoleId,
        candidate_ids: &[CandidateId],
    ) -> Result<usize> {
        let mut enqueued = 0;
        for candidate_id in candidate_ids {
            self.enqueue(role_id, candidate_id).await?;
            enqueued += 1;
        }

        info!(%role_id, enqueued, "Scheduled screenings for role");
        Ok(enqueued)
    }
}
