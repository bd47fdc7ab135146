//! Screening Worker CLI
//!
//! Runs the screening consumer loop and the operational commands around it:
//! enqueueing, candidate indexing, queue status and migrations.

use anyhow::Result;
use clap::{Parser, Subcommand};
use screening_worker::config::CONFIG_PATH_ENV;
use screening_worker::db::{create_pool, run_migrations, CandidateId, DbPool, PgStore, RoleId};
use screening_worker::worker::{setup_signal_handler, TaskDisposition, TaskProcessor, TaskRunner};
use screening_worker::{
    AppConfig, CandidateIndexer, EmbeddingClient, HeuristicScorer, OpenAiScorer, PgTaskQueue,
    RecruitingStore, ScoringProvider, Scorer, ScreeningError, TaskEnqueuer, TaskQueue,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Candidate ids fetched per page when walking the candidates table
const CANDIDATE_PAGE_SIZE: i64 = 500;

#[derive(Parser)]
#[command(name = "screening-worker")]
#[command(about = "Score candidates against roles and index candidate embeddings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: ./screening-worker.toml, optional)
    #[arg(short, long, global = true, env = CONFIG_PATH_ENV)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run as worker, leasing tasks from the screening_tasks queue
    Worker {
        /// Process at most one task and exit
        #[arg(long)]
        once: bool,

        /// Override worker.concurrency
        #[arg(long)]
        concurrency: Option<usize>,
    },

    /// Schedule one screening
    Enqueue {
        #[arg(long)]
        role: String,

        #[arg(long)]
        candidate: String,
    },

    /// Schedule a screening of every candidate against a role
    ScreenRole {
        #[arg(long)]
        role: String,
    },

    /// Build embeddings for the given candidates, or for all of them
    Index {
        /// Candidate id (repeatable)
        #[arg(long = "candidate")]
        candidates: Vec<String>,

        /// Index every candidate
        #[arg(long, conflicts_with = "candidates")]
        all: bool,
    },

    /// Print task counts per status as JSON
    Status,

    /// Apply database migrations
    Migrate,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = AppConfig::load(cli.config.as_deref())?;

    let pool = create_pool(config.database_url()?, config.max_connections).await?;
    info!("Database connection established");

    let result = run_command(cli.command, &config, pool.clone()).await;
    pool.close().await;
    result
}

async fn run_command(command: Commands, config: &AppConfig, pool: DbPool) -> Result<()> {
    let store = Arc::new(PgStore::new(pool.clone()));
    let queue: Arc<dyn TaskQueue> = Arc::new(PgTaskQueue::new(pool.clone()));

    match command {
        Commands::Worker { once, concurrency } => {
            let mut worker_config = config.worker_config();
            if let Some(concurrency) = concurrency {
                worker_config.concurrency = concurrency.max(1);
            }

            let scorer = build_scorer(config)?;
            info!("Using scorer: {}", scorer.name());

            let processor = TaskProcessor::new(store, scorer);
            let runner = TaskRunner::new(queue, processor, worker_config);

            if once {
                match runner.run_once().await? {
                    Some(TaskDisposition::Completed) => println!("Task processed successfully"),
                    Some(disposition) => println!("Task processed: {:?}", disposition),
                    None => println!("No queued tasks found"),
                }
            } else {
                // Setup graceful shutdown
                setup_signal_handler(runner.shutdown_handle());

                let summary = runner.run().await?;
                println!("{}", serde_json::to_string_pretty(&summary)?);
            }
        }

        Commands::Enqueue { role, candidate } => {
            let role_id = RoleId::from(role);
            let candidate_id = CandidateId::from(candidate);
            ensure_role(store.as_ref(), &role_id).await?;
            if store.find_candidate(&candidate_id).await?.is_none() {
                return Err(ScreeningError::CandidateNotFound { candidate_id }.into());
            }

            let enqueuer = TaskEnqueuer::new(queue, config.worker.max_attempts);
            let task_id = enqueuer.enqueue(&role_id, &candidate_id).await?;
            println!("Enqueued task {}", task_id);
        }

        Commands::ScreenRole { role } => {
            let role_id = RoleId::from(role);
            ensure_role(store.as_ref(), &role_id).await?;

            let candidate_ids = all_candidate_ids(store.as_ref()).await?;
            let enqueuer = TaskEnqueuer::new(queue, config.worker.max_attempts);
            let count = enqueuer.enqueue_for_role(&role_id, &candidate_ids).await?;
            println!("Enqueued {} screenings for role {}", count, role_id);
        }

        Commands::Index { candidates, all } => {
            let embedder = EmbeddingClient::new(config.openai_api_key()?, &config.embedding.model)
                .with_dimensions(config.embedding.dimensions);
            let indexer = CandidateIndexer::new(store, Arc::new(embedder));

            let report = if all {
                indexer.index_all(CANDIDATE_PAGE_SIZE).await?
            } else if candidates.is_empty() {
                anyhow::bail!("Pass --candidate <ID> (repeatable) or --all");
            } else {
                let ids: Vec<CandidateId> = candidates.into_iter().map(CandidateId::from).collect();
                indexer.index_batch(&ids).await
            };

            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Status => {
            let stats = queue.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }

        Commands::Migrate => {
            run_migrations(&pool).await?;
            println!("Migrations applied");
        }
    }

    Ok(())
}

fn build_scorer(config: &AppConfig) -> Result<Arc<dyn Scorer>> {
    let scorer: Arc<dyn Scorer> = match config.scoring.provider {
        ScoringProvider::OpenAi => Arc::new(
            OpenAiScorer::new(config.openai_api_key()?, &config.scoring.model)
                .with_temperature(config.scoring.temperature),
        ),
        ScoringProvider::Heuristic => Arc::new(HeuristicScorer::new()),
    };
    Ok(scorer)
}

async fn ensure_role(store: &dyn RecruitingStore, role_id: &RoleId) -> Result<()> {
    if store.find_role(role_id).await?.is_none() {
        return Err(ScreeningError::RoleNotFound {
            role_id: role_id.clone(),
        }
        .into());
    }
    Ok(())
}

async fn all_candidate_ids(store: &dyn RecruitingStore) -> Result<Vec<CandidateId>> {
    let mut ids = Vec::new();
    loop {
        let page = store
            .list_candidate_ids(ids.last(), CANDIDATE_PAGE_SIZE)
            .await?;
        let done = (page.len() as i64) < CANDIDATE_PAGE_SIZE;
        ids.extend(page);
        if done {
            break;
        }
    }
    Ok(ids)
}
