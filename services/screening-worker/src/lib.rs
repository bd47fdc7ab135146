//! Screening Worker - background scoring and indexing for the recruiting platform
//!
//! The web tier enqueues one task per (role, candidate) pair through
//! [`TaskEnqueuer`]. Workers lease those tasks, load the role and the
//! candidate's profile, ask a [`Scorer`] for a verdict and upsert exactly one
//! screening per pair. Separately, [`CandidateIndexer`] turns each candidate
//! profile into a text summary and stores one embedding vector per candidate.
//!
//! Delivery is at-least-once. Scoring a pair twice overwrites the previous
//! screening, so redelivery is harmless.

pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod indexing;
pub mod queue;
pub mod scoring;
pub mod store;
pub mod worker;

pub use config::{AppConfig, ScoringProvider};
pub use embedding::{Embedder, EmbeddingClient};
pub use error::{Result, ScreeningError};
pub use indexing::{build_profile_text, BatchReport, CandidateIndexer, IndexedCandidate};
pub use queue::{
    LeasedTask, MemoryQueue, PgTaskQueue, QueueStats, TaskEnqueuer, TaskOutcome, TaskQueue,
};
pub use scoring::{HeuristicScorer, OpenAiScorer, ScoreResult, Scorer};
pub use store::RecruitingStore;
pub use worker::{TaskProcessor, TaskRunner, WorkerConfig};
