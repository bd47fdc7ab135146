//! Application configuration
//!
//! Layers, lowest priority first:
//! 1. built-in defaults
//! 2. `DATABASE_URL` / `OPENAI_API_KEY`
//! 3. `screening-worker.toml` (or the file passed with `--config` or
//!    `SCREENING_CONFIG`), if present
//! 4. `SCREENING_` environment variables, nested keys split on `__`
//!    (`SCREENING_WORKER__CONCURRENCY=8`)

use crate::embedding::{DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL};
use crate::error::{Result, ScreeningError};
use crate::scoring::openai::DEFAULT_SCORING_MODEL;
use crate::worker::WorkerConfig;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file read when no `--config` path is given
pub const DEFAULT_CONFIG_FILE: &str = "screening-worker.toml";

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "SCREENING_";

/// Environment variable naming the config file, read by the CLI
pub const CONFIG_PATH_ENV: &str = "SCREENING_CONFIG";

/// Which scorer the worker runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoringProvider {
    /// Chat completion in JSON mode
    #[default]
    OpenAi,
    /// Deterministic local scoring, no network calls
    Heuristic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    pub concurrency: usize,
    pub poll_interval_secs: u64,
    pub task_timeout_secs: u64,
    pub lease_timeout_secs: u64,
    pub max_attempts: i32,
    pub retry_base_delay_secs: u64,
    pub retry_max_delay_secs: u64,
    pub reclaim_interval_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub worker_id: Option<String>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            concurrency: 5,
            poll_interval_secs: 2,
            task_timeout_secs: 120,
            lease_timeout_secs: 300,
            max_attempts: 3,
            retry_base_delay_secs: 5,
            retry_max_delay_secs: 300,
            reclaim_interval_secs: 60,
            worker_id: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub provider: ScoringProvider,
    pub model: String,
    pub temperature: f32,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            provider: ScoringProvider::OpenAi,
            model: DEFAULT_SCORING_MODEL.to_string(),
            temperature: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub model: String,
    pub dimensions: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    pub max_connections: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai_api_key: Option<String>,
    pub worker: WorkerSettings,
    pub scoring: ScoringSettings,
    pub embedding: EmbeddingSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: 10,
            openai_api_key: None,
            worker: WorkerSettings::default(),
            scoring: ScoringSettings::default(),
            embedding: EmbeddingSettings::default(),
        }
    }
}

impl AppConfig {
    /// The layered provider chain, without extracting
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Env::raw().only(&["database_url", "openai_api_key"]))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).ignore(&["config"]).split("__"))
    }

    /// Load and validate the configuration
    ///
    /// A missing config file is not an error; a malformed one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let config: AppConfig = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the worker cannot run with
    pub fn validate(&self) -> Result<()> {
        let worker = &self.worker;
        if worker.concurrency == 0 {
            return Err(ScreeningError::ConfigError(
                "worker.concurrency must be at least 1".to_string(),
            ));
        }
        if worker.max_attempts < 1 {
            return Err(ScreeningError::ConfigError(
                "worker.max_attempts must be at least 1".to_string(),
            ));
        }
        if worker.lease_timeout_secs <= worker.task_timeout_secs {
            return Err(ScreeningError::ConfigError(format!(
                "worker.lease_timeout_secs ({}) must exceed worker.task_timeout_secs ({})",
                worker.lease_timeout_secs, worker.task_timeout_secs
            )));
        }
        if worker.reclaim_interval_secs == 0 {
            return Err(ScreeningError::ConfigError(
                "worker.reclaim_interval_secs must be at least 1".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ScreeningError::ConfigError(
                "max_connections must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn database_url(&self) -> Result<&str> {
        self.database_url
            .as_deref()
            .filter(|url| !url.is_empty())
            .ok_or_else(|| {
                ScreeningError::ConfigError(
                    "database_url not set (DATABASE_URL or SCREENING_DATABASE_URL)".to_string(),
                )
            })
    }

    pub fn openai_api_key(&self) -> Result<&str> {
        self.openai_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| {
                ScreeningError::ConfigError(
                    "openai_api_key not set (OPENAI_API_KEY or SCREENING_OPENAI_API_KEY)"
                        .to_string(),
                )
            })
    }

    /// Runtime view of the `worker` section
    pub fn worker_config(&self) -> WorkerConfig {
        let worker = &self.worker;
        let mut builder = WorkerConfig::builder()
            .concurrency(worker.concurrency)
            .poll_interval(Duration::from_secs(worker.poll_interval_secs))
            .task_timeout(Duration::from_secs(worker.task_timeout_secs))
            .lease_timeout(Duration::from_secs(worker.lease_timeout_secs))
            .max_attempts(worker.max_attempts)
            .reclaim_interval(Duration::from_secs(worker.reclaim_interval_secs))
            .retry_delays(
                Duration::from_secs(worker.retry_base_delay_secs),
                Duration::from_secs(worker.retry_max_delay_secs),
            );
        if let Some(worker_id) = &worker.worker_id {
            builder = builder.worker_id(worker_id);
        }
        builder.build()
    }
}
