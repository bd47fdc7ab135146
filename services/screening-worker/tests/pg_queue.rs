//! Postgres queue tests
//!
//! Need a database with the `vector` extension available:
//! `DATABASE_URL=postgres://... cargo test --test pg_queue -- --ignored`

use screening_worker::db::{create_pool, run_migrations, tasks, DbPool, ScreeningTask, TaskStatus};
use screening_worker::{PgTaskQueue, TaskOutcome, TaskQueue};
use std::time::Duration;

async fn pool() -> DbPool {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let pool = create_pool(&database_url, 4).await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

#[tokio::test]
#[ignore] // Requires database
async fn test_lease_ack_is_fenced_by_attempt() {
    let pool = pool().await;
    let queue = PgTaskQueue::new(pool.clone());
    let role_id = unique("R");
    let id = queue
        .enqueue(&ScreeningTask::new(role_id.as_str(), "C1"), 3)
        .await
        .unwrap();

    // Drain anything older until our task comes up
    let lease = loop {
        let lease = queue
            .lease("pg-test", Duration::from_secs(1))
            .await
            .unwrap()
            .expect("task should be leasable");
        if lease.id == id {
            break lease;
        }
        queue.fail(&lease, "cleared by pg_queue test").await.unwrap();
    };
    assert_eq!(lease.attempt, 1);

    // Let the lease expire and hand the task to a second worker
    tokio::time::sleep(Duration::from_millis(1100)).await;
    assert!(queue.reclaim_expired().await.unwrap() >= 1);
    let second = queue
        .lease("pg-test-2", Duration::from_secs(30))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.id, id);
    assert_eq!(second.attempt, 2);

    let outcome = TaskOutcome::Completed { score_total: 55.0 };
    assert!(!queue.complete(&lease, &outcome).await.unwrap());
    assert!(queue.complete(&second, &outcome).await.unwrap());

    let row = tasks::get_task_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(TaskStatus::parse(&row.status), Some(TaskStatus::Completed));
    assert_eq!(row.attempts, 2);
    assert!(row.finished_at.is_some());
}
