//! Error types for screening-worker

use crate::db::models::{CandidateId, RoleId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreeningError {
    #[error("Role not found: {role_id}")]
    RoleNotFound { role_id: RoleId },

    #[error("Candidate not found: {candidate_id}")]
    CandidateNotFound { candidate_id: CandidateId },

    #[error("Candidate {candidate_id} has no profile text to embed")]
    EmptyProfile { candidate_id: CandidateId },

    #[error("Scoring error: {0}")]
    ScoringError(String),

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Screening could not be scheduled: {0}")]
    QueueUnavailable(String),

    #[error("Invalid task: {0}")]
    InvalidTask(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("OpenAI API error: {0}")]
    OpenAiError(#[from] async_openai::error::OpenAIError),

    #[error("Task timeout")]
    TaskTimeout,
}

impl ScreeningError {
    /// Whether the queue should re-deliver a task that failed with this error.
    ///
    /// Missing rows can never succeed on a later attempt, everything that
    /// touches the network or the database can.
    pub fn is_retryable(&self) -> bool {
        match self {
            ScreeningError::RoleNotFound { .. }
            | ScreeningError::CandidateNotFound { .. }
            | ScreeningError::EmptyProfile { .. }
            | ScreeningError::InvalidTask(_)
            | ScreeningError::SerializationError(_)
            | ScreeningError::MigrationError(_)
            | ScreeningError::ConfigError(_) => false,
            ScreeningError::ScoringError(_)
            | ScreeningError::EmbeddingError(_)
            | ScreeningError::QueueUnavailable(_)
            | ScreeningError::DatabaseError(_)
            | ScreeningError::OpenAiError(_)
            | ScreeningError::TaskTimeout => true,
        }
    }
}

impl From<figment::Error> for ScreeningError {
    fn from(err: figment::Error) -> Self {
        ScreeningError::ConfigError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ScreeningError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_rows_are_permanent() {
        let err = ScreeningError::RoleNotFound {
            role_id: RoleId::from("R1"),
        };
        assert!(!err.is_retryable());

        let err = ScreeningError::CandidateNotFound {
            candidate_id: CandidateId::from("C1"),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_service_failures_are_retryable() {
        assert!(ScreeningError::ScoringError("rate limited".into()).is_retryable());
        assert!(ScreeningError::TaskTimeout.is_retryable());
    }
}
