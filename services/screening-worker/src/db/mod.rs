//! Database module for screening-worker
//!
//! Provides PostgreSQL operations for the recruiting tables the worker reads
//! (roles, candidates and their children) and the tables it owns
//! (screening_tasks, screenings, candidate_embeddings).

pub mod candidates;
pub mod connection;
pub mod embeddings;
pub mod models;
pub mod roles;
pub mod screenings;
pub mod store;
pub mod tasks;

pub use connection::{create_pool, run_migrations, DbPool};
pub use models::*;
pub use store::PgStore;
