//! Task runner - main worker loop

use crate::db::models::TaskStatus;
use crate::error::{Result, ScreeningError};
use crate::queue::{LeasedTask, TaskOutcome, TaskQueue};
use crate::worker::{TaskProcessor, WorkerConfig};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tokio::time::{Duration, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// What happened to one delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskDisposition {
    Completed,
    Skipped,
    /// Handed back to the queue for a later attempt
    Retried,
    Failed,
    /// The lease expired before the acknowledgement; another delivery owns the task
    LeaseLost,
    /// The acknowledgement itself failed; the lease will expire and be redelivered
    AckFailed,
}

/// Counts of dispositions over one `run`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub completed: usize,
    pub skipped: usize,
    pub retried: usize,
    pub failed: usize,
    pub lease_lost: usize,
    pub ack_failed: usize,
    pub panicked: usize,
}

impl RunSummary {
    fn record(&mut self, disposition: TaskDisposition) {
        match disposition {
            TaskDisposition::Completed => self.completed += 1,
            TaskDisposition::Skipped => self.skipped += 1,
            TaskDisposition::Retried => self.retried += 1,
            TaskDisposition::Failed => self.failed += 1,
            TaskDisposition::LeaseLost => self.lease_lost += 1,
            TaskDisposition::AckFailed => self.ack_failed += 1,
        }
    }

    fn record_joined(&mut self, joined: std::result::Result<TaskDisposition, JoinError>) {
        match joined {
            Ok(disposition) => self.record(disposition),
            Err(e) => {
                error!("Screening task aborted: {}", e);
                self.panicked += 1;
            }
        }
    }

    /// Deliveries that reached the queue acknowledgement step
    pub fn total(&self) -> usize {
        self.completed
            + self.skipped
            + self.retried
            + self.failed
            + self.lease_lost
            + self.ack_failed
            + self.panicked
    }
}

/// Task runner that leases and processes screening tasks
///
/// At most `concurrency` leases are held at once: a semaphore permit is
/// taken before each lease and released when the task is acknowledged.
pub struct TaskRunner {
    queue: Arc<dyn TaskQueue>,
    processor: Arc<TaskProcessor>,
    config: WorkerConfig,
    shutdown: CancellationToken,
}

impl TaskRunner {
    /// Create a new task runner
    pub fn new(queue: Arc<dyn TaskQueue>, processor: TaskProcessor, config: WorkerConfig) -> Self {
        Self {
            queue,
            processor: Arc::new(processor),
            config,
            shutdown: CancellationToken::new(),
        }
    }

    /// Get a handle to signal shutdown
    pub fn shutdown_handle(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Main worker loop
    ///
    /// Leases tasks until shutdown is signaled, then stops leasing and waits
    /// for every in-flight task to be acknowledged before returning.
    pub async fn run(&self) -> Result<RunSummary> {
        info!("Starting screening worker {}...", self.config.worker_id);
        info!("Concurrency: {}", self.config.concurrency);
        info!("Poll interval: {:?}", self.config.poll_interval);
        info!("Task timeout: {:?}", self.config.task_timeout);
        info!("Lease timeout: {:?}", self.config.lease_timeout);

        // First tick fires immediately, so leftovers from a crash are swept on startup
        let mut reclaim = tokio::time::interval(self.config.reclaim_interval);
        reclaim.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let semaphore = Arc::new(Semaphore::new(self.config.concurrency));
        let mut in_flight: JoinSet<TaskDisposition> = JoinSet::new();
        let mut summary = RunSummary::default();

        loop {
            while let Some(joined) = in_flight.try_join_next() {
                summary.record_joined(joined);
            }

            let permit = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = reclaim.tick() => {
                    self.reclaim_expired().await;
                    continue;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
            };

            if self.shutdown.is_cancelled() {
                break;
            }

            match self
                .queue
                .lease(&self.config.worker_id, self.config.lease_timeout)
                .await
            {
                Ok(Some(lease)) => {
                    let queue = Arc::clone(&self.queue);
                    let processor = Arc::clone(&self.processor);
                    let config = self.config.clone();
                    in_flight.spawn(async move {
                        let _permit = permit;
                        execute(queue.as_ref(), &processor, &config, lease).await
                    });
                }
                Ok(None) => {
                    drop(permit);
                    debug!("No queued tasks, sleeping for {:?}", self.config.poll_interval);
                    self.reclaim_expired().await;
                    self.pause(self.config.poll_interval).await;
                }
                Err(e) => {
                    drop(permit);
                    error!("Failed to lease task: {}", e);
                    self.pause(self.config.error_backoff).await;
                }
            }
        }

        info!(
            "Shutdown signal received, waiting for {} in-flight tasks...",
            in_flight.len()
        );
        while let Some(joined) = in_flight.join_next().await {
            summary.record_joined(joined);
        }

        info!(
            "Worker stopped: {} completed, {} skipped, {} retried, {} failed",
            summary.completed, summary.skipped, summary.retried, summary.failed
        );
        Ok(summary)
    }

    /// Process a single task (useful for testing with --once flag)
    ///
    /// Returns None if no task was available.
    pub async fn process_one_task(&self) -> Result<Option<TaskDisposition>> {
        let lease = match self
            .queue
            .lease(&self.config.worker_id, self.config.lease_timeout)
            .await?
        {
            Some(lease) => lease,
            None => return Ok(None),
        };

        Ok(Some(
            execute(self.queue.as_ref(), &self.processor, &self.config, lease).await,
        ))
    }

    /// Run once and exit (for testing)
    pub async fn run_once(&self) -> Result<Option<TaskDisposition>> {
        info!("Running worker in single-task mode...");
        self.reclaim_expired().await;
        self.process_one_task().await
    }

    async fn reclaim_expired(&self) {
        match self.queue.reclaim_expired().await {
            Ok(0) => {}
            Ok(n) => warn!("Reclaimed {} tasks with expired leases", n),
            Err(e) => error!("Failed to reclaim expired leases: {}", e),
        }
    }

    /// Sleep, waking early on shutdown
    async fn pause(&self, duration: Duration) {
        tokio::select! {
            _ = self.shutdown.cancelled() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }
}

/// Process one leased task and acknowledge it
async fn execute(
    queue: &dyn TaskQueue,
    processor: &TaskProcessor,
    config: &WorkerConfig,
    lease: LeasedTask,
) -> TaskDisposition {
    let task_id = lease.id;
    let role_id = &lease.task.role_id;
    let candidate_id = &lease.task.candidate_id;
    info!(
        task_id,
        %role_id,
        %candidate_id,
        attempt = lease.attempt,
        "Processing screening task"
    );

    let result =
        match tokio::time::timeout(config.task_timeout, processor.process(&lease.task)).await {
            Ok(result) => result,
            Err(_) => Err(ScreeningError::TaskTimeout),
        };

    let acked = match result {
        Ok(outcome) => {
            let disposition = match &outcome {
                TaskOutcome::Completed { score_total } => {
                    info!(task_id, %role_id, %candidate_id, score_total, "Screening completed");
                    TaskDisposition::Completed
                }
                TaskOutcome::Skipped { reason } => {
                    info!(task_id, %role_id, %candidate_id, %reason, "Screening skipped");
                    TaskDisposition::Skipped
                }
            };
            queue
                .complete(&lease, &outcome)
                .await
                .map(|applied| {
                    if applied {
                        disposition
                    } else {
                        TaskDisposition::LeaseLost
                    }
                })
        }
        Err(e) if e.is_retryable() => {
            let delay = config.retry_delay(lease.attempt);
            warn!(
                task_id,
                %role_id,
                %candidate_id,
                "Screening attempt {}/{} failed: {}",
                lease.attempt,
                lease.max_attempts,
                e
            );
            queue
                .retry_later(&lease, &e.to_string(), delay)
                .await
                .map(|status| match status {
                    Some(TaskStatus::Failed) => {
                        error!(
                            task_id,
                            %role_id,
                            %candidate_id,
                            "Screening retries exhausted: {}",
                            e
                        );
                        TaskDisposition::Failed
                    }
                    Some(_) => TaskDisposition::Retried,
                    None => TaskDisposition::LeaseLost,
                })
        }
        Err(e) => {
            error!(task_id, %role_id, %candidate_id, "Screening failed permanently: {}", e);
            queue
                .fail(&lease, &e.to_string())
                .await
                .map(|applied| {
                    if applied {
                        TaskDisposition::Failed
                    } else {
                        TaskDisposition::LeaseLost
                    }
                })
        }
    };

    match acked {
        Ok(TaskDisposition::LeaseLost) => {
            warn!(task_id, "Lease lost before acknowledgement, result discarded");
            TaskDisposition::LeaseLost
        }
        Ok(disposition) => disposition,
        Err(e) => {
            error!(task_id, "Failed to acknowledge task: {}", e);
            TaskDisposition::AckFailed
        }
    }
}

/// Setup signal handlers for graceful shutdown
///
/// Cancels `shutdown` on Ctrl+C or SIGTERM.
pub fn setup_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        if wait_for_signal().await {
            info!("Received termination signal, initiating shutdown...");
            shutdown.cancel();
        }
    });
}

#[cfg(unix)]
async fn wait_for_signal() -> bool {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to listen for SIGTERM: {}", e);
            return wait_for_ctrl_c().await;
        }
    };

    first_signal(wait_for_ctrl_c(), async move { terminate.recv().await.is_some() }).await
}

/// Resolve on whichever listener reports a signal first
///
/// A listener that resolves `false` could not be registered; the other one is
/// still awaited.
#[cfg_attr(not(unix), allow(dead_code))]
async fn first_signal(
    ctrl_c: impl Future<Output = bool>,
    terminate: impl Future<Output = bool>,
) -> bool {
    tokio::pin!(ctrl_c, terminate);
    tokio::select! {
        received = &mut ctrl_c => received || terminate.await,
        received = &mut terminate => received || ctrl_c.await,
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> bool {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() -> bool {
    match tokio::signal::ctrl_c().await {
        Ok(()) => true,
        Err(e) => {
            error!("Failed to listen for Ctrl+C: {}", e);
            false
        }
    }
}
