//! Worker configuration

use std::time::Duration;

/// Worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Identifier recorded on every lease
    pub worker_id: String,

    /// Maximum number of tasks leased at the same time
    pub concurrency: usize,

    /// Poll interval when no tasks available
    pub poll_interval: Duration,

    /// Upper bound for processing one task
    pub task_timeout: Duration,

    /// How long a lease hides a task from other workers; must exceed `task_timeout`
    pub lease_timeout: Duration,

    /// Deliveries per task before it is failed for good
    pub max_attempts: i32,

    /// Backoff after the first failed attempt, doubled on each further attempt
    pub retry_base_delay: Duration,

    /// Cap for the retry backoff
    pub retry_max_delay: Duration,

    /// Pause after the queue itself returned an error
    pub error_backoff: Duration,

    /// How often expired leases are swept back into the queue, busy or idle
    pub reclaim_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            worker_id: format!("screening-worker-{}", std::process::id()),
            concurrency: 5,
            poll_interval: Duration::from_secs(2),
            task_timeout: Duration::from_secs(120),
            lease_timeout: Duration::from_secs(300), // 5 minutes
            max_attempts: 3,
            retry_base_delay: Duration::from_secs(5),
            retry_max_delay: Duration::from_secs(300),
            error_backoff: Duration::from_secs(10),
            reclaim_interval: Duration::from_secs(60),
        }
    }
}

impl WorkerConfig {
    /// Create a new config builder
    pub fn builder() -> WorkerConfigBuilder {
        WorkerConfigBuilder::default()
    }

    /// Backoff before re-delivering a task whose `attempt`-th delivery failed
    pub fn retry_delay(&self, attempt: i32) -> Duration {
        let exponent = attempt.saturating_sub(1).clamp(0, 16) as u32;
        self.retry_base_delay
            .saturating_mul(2_u32.pow(exponent))
            .min(self.retry_max_delay)
    }
}

/// Builder for WorkerConfig
#[derive(Default)]
pub struct WorkerConfigBuilder {
    config: WorkerConfig,
}

impl WorkerConfigBuilder {
    pub fn worker_id(mut self, worker_id: &str) -> Self {
        self.config.worker_id = worker_id.to_string();
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency.max(1);
        self
    }

    pub fn poll_interval(mut self, duration: Duration) -> Self {
        self.config.poll_interval = duration;
        self
    }

    pub fn task_timeout(mut self, duration: Duration) -> Self {
        self.config.task_timeout = duration;
        self
    }

    pub fn lease_timeout(mut self, duration: Duration) -> Self {
        self.config.lease_timeout = duration;
        self
    }

    pub fn max_attempts(mut self, max_attempts: i32) -> Self {
        self.config.max_attempts = max_attempts.max(1);
        self
    }

    /// Set both ends of the retry backoff
    pub fn retry_delays(mut self, base: Duration, max: Duration) -> Self {
        self.config.retry_base_delay = base;
        self.config.retry_max_delay = max;
        self
    }

    pub fn error_backoff(mut self, duration: Duration) -> Self {
        self.config.error_backoff = duration;
        self
    }

    pub fn reclaim_interval(mut self, duration: Duration) -> Self {
        self.config.reclaim_interval = duration.max(Duration::from_millis(1));
        self
    }

    /// Build the config
    pub fn build(self) -> WorkerConfig {
        self.config
    }
}
