//! Worker module for leasing and processing screening tasks
//!
//! This module provides:
//! - TaskRunner: Main worker loop with bounded concurrency and graceful shutdown
//! - TaskProcessor: Processes individual tasks (load, score, upsert)
//! - WorkerConfig: Configuration for the worker

pub mod config;
pub mod processor;
pub mod task_runner;

pub use config::WorkerConfig;
pub use processor::TaskProcessor;
pub use task_runner::{setup_signal_handler, RunSummary, TaskDisposition, TaskRunner};
