//! In-memory fakes shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use screening_worker::db::{
    Candidate, CandidateEmbedding, CandidateId, CandidateProfile, CandidateSkill, Certification,
    Education, Experience, NewCandidateEmbedding, NewScreening, Project, Role, RoleId, Screening,
    SkillId,
};
use screening_worker::scoring::{CandidatePayload, RolePayload};
use screening_worker::worker::{RunSummary, TaskRunner, WorkerConfig};
use screening_worker::{
    Embedder, MemoryQueue, RecruitingStore, Result, ScoreResult, Scorer, ScreeningError,
};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

// ============================================================================
// Store
// ============================================================================

#[derive(Default)]
struct StoreState {
    roles: HashMap<RoleId, Role>,
    profiles: HashMap<CandidateId, CandidateProfile>,
    screenings: HashMap<(RoleId, CandidateId), Screening>,
    embeddings: HashMap<CandidateId, CandidateEmbedding>,
    next_screening_id: i64,
}

/// Recruiting store held in memory
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
    screening_upserts: AtomicUsize,
    embedding_upserts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap()
    }

    pub fn insert_role(&self, role: Role) {
        self.state().roles.insert(role.id.clone(), role);
    }

    pub fn insert_profile(&self, profile: CandidateProfile) {
        self.state()
            .profiles
            .insert(profile.candidate.id.clone(), profile);
    }

    pub fn remove_role(&self, role_id: &RoleId) {
        self.state().roles.remove(role_id);
    }

    pub fn remove_candidate(&self, candidate_id: &CandidateId) {
        self.state().profiles.remove(candidate_id);
    }

    pub fn screening(&self, role_id: &str, candidate_id: &str) -> Option<Screening> {
        self.state()
            .screenings
            .get(&(RoleId::from(role_id), CandidateId::from(candidate_id)))
            .cloned()
    }

    pub fn screening_count(&self) -> usize {
        self.state().screenings.len()
    }

    pub fn screening_upserts(&self) -> usize {
        self.screening_upserts.load(Ordering::SeqCst)
    }

    pub fn embedding(&self, candidate_id: &str) -> Option<CandidateEmbedding> {
        self.state()
            .embeddings
            .get(&CandidateId::from(candidate_id))
            .cloned()
    }

    pub fn embedding_count(&self) -> usize {
        self.state().embeddings.len()
    }

    fn profile_part<T>(
        &self,
        candidate_id: &CandidateId,
        part: impl FnOnce(&CandidateProfile) -> Vec<T>,
    ) -> Vec<T> {
        self.state()
            .profiles
            .get(candidate_id)
            .map(part)
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecruitingStore for MemoryStore {
    async fn find_role(&self, role_id: &RoleId) -> Result<Option<Role>> {
        Ok(self.state().roles.get(role_id).cloned())
    }

    async fn find_candidate(&self, candidate_id: &CandidateId) -> Result<Option<Candidate>> {
        Ok(self
            .state()
            .profiles
            .get(candidate_id)
            .map(|p| p.candidate.clone()))
    }

    async fn list_experiences(&self, candidate_id: &CandidateId) -> Result<Vec<Experience>> {
        Ok(self.profile_part(candidate_id, |p| p.experiences.clone()))
    }

    async fn list_education(&self, candidate_id: &CandidateId) -> Result<Vec<Education>> {
        Ok(self.profile_part(candidate_id, |p| p.education.clone()))
    }

    async fn list_certifications(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<Certification>> {
        Ok(self.profile_part(candidate_id, |p| p.certifications.clone()))
    }

    async fn list_skills(&self, candidate_id: &CandidateId) -> Result<Vec<CandidateSkill>> {
        Ok(self.profile_part(candidate_id, |p| p.skills.clone()))
    }

    async fn list_projects(&self, candidate_id: &CandidateId) -> Result<Vec<Project>> {
        Ok(self.profile_part(candidate_id, |p| p.projects.clone()))
    }

    async fn list_candidate_ids(
        &self,
        after: Option<&CandidateId>,
        limit: i64,
    ) -> Result<Vec<CandidateId>> {
        let mut ids: Vec<CandidateId> = self
            .state()
            .profiles
            .keys()
            .filter(|id| after.map(|a| *id > a).unwrap_or(true))
            .cloned()
            .collect();
        ids.sort();
        ids.truncate(limit.max(0) as usize);
        Ok(ids)
    }

    async fn upsert_screening(&self, screening: &NewScreening) -> Result<Screening> {
        self.screening_upserts.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state();
        let key = (screening.role_id.clone(), screening.candidate_id.clone());

        // Each overwrite is stamped strictly after the previous one
        let previous = state.screenings.get(&key).map(|s| (s.id, s.created_at));
        let now = Utc::now();
        let created_at: DateTime<Utc> = match previous {
            Some((_, at)) if now <= at => at + ChronoDuration::microseconds(1),
            _ => now,
        };
        let id = match previous {
            Some((id, _)) => id,
            None => {
                state.next_screening_id += 1;
                state.next_screening_id
            }
        };

        let result = &screening.result;
        let row = Screening {
            id,
            role_id: screening.role_id.clone(),
            candidate_id: screening.candidate_id.clone(),
            score_total: result.score_total,
            score_breakdown: result.score_breakdown.clone(),
            must_haves_satisfied: result.must_haves_satisfied.clone(),
            missing_must_haves: result.missing_must_haves.clone(),
            knockout: result.knockout,
            reasons: result.reasons.clone(),
            flags: result.flags.clone(),
            scorer: screening.scorer.clone(),
            created_at,
        };
        state.screenings.insert(key, row.clone());
        Ok(row)
    }

    async fn find_screening(
        &self,
        role_id: &RoleId,
        candidate_id: &CandidateId,
    ) -> Result<Option<Screening>> {
        Ok(self
            .state()
            .screenings
            .get(&(role_id.clone(), candidate_id.clone()))
            .cloned())
    }

    async fn upsert_embedding(
        &self,
        embedding: &NewCandidateEmbedding,
    ) -> Result<CandidateEmbedding> {
        self.embedding_upserts.fetch_add(1, Ordering::SeqCst);
        let row = CandidateEmbedding {
            candidate_id: embedding.candidate_id.clone(),
            embedding: pgvector::Vector::from(embedding.embedding.clone()),
            model: embedding.model.clone(),
            dimensions: embedding.embedding.len() as i32,
            source_hash: embedding.source_hash.clone(),
            updated_at: Utc::now(),
        };
        self.state()
            .embeddings
            .insert(embedding.candidate_id.clone(), row.clone());
        Ok(row)
    }
}

// ============================================================================
// Scorer
// ============================================================================

/// Scripted scorer: fixed score, optional latency and failures
pub struct FakeScorer {
    score: f64,
    delay: Duration,
    failures: AtomicUsize,
    calls: AtomicUsize,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl FakeScorer {
    pub fn new(score: f64) -> Self {
        Self {
            score,
            delay: Duration::ZERO,
            failures: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            active: AtomicUsize::new(0),
            peak_active: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail the next `n` calls with a retryable error
    pub fn failing_first(self, n: usize) -> Self {
        self.failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn always_failing(self) -> Self {
        self.failing_first(usize::MAX)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn peak_active(&self) -> usize {
        self.peak_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scorer for FakeScorer {
    fn name(&self) -> &str {
        "fake"
    }

    async fn evaluate(
        &self,
        _candidate: &CandidatePayload,
        role: &RolePayload,
    ) -> Result<ScoreResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(active, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        let failed = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(ScreeningError::ScoringError("model unavailable".to_string()));
        }

        Ok(ScoreResult {
            score_total: self.score,
            score_breakdown: json!({ "fake": self.score }),
            must_haves_satisfied: role.must_have_skills.clone(),
            missing_must_haves: vec![],
            knockout: false,
            reasons: format!("scored {}", self.score),
            flags: json!({}),
        })
    }
}

// ============================================================================
// Embedder
// ============================================================================

/// Embedder returning a constant vector; fails for texts containing a marker
pub struct FakeEmbedder {
    dimensions: usize,
    fail_on: HashSet<String>,
    calls: AtomicUsize,
}

impl FakeEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            fail_on: HashSet::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(mut self, marker: &str) -> Self {
        self.fail_on.insert(marker.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for FakeEmbedder {
    fn model(&self) -> &str {
        "fake-embedding"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.iter().any(|marker| text.contains(marker)) {
            return Err(ScreeningError::EmbeddingError(
                "embedding service returned 503".to_string(),
            ));
        }
        Ok(vec![0.25; self.dimensions])
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn role(id: &str, must_have: &[&str]) -> Role {
    Role {
        id: RoleId::from(id),
        title: "Backend Engineer".to_string(),
        seniority: Some("Mid".to_string()),
        must_have_skills: must_have.iter().map(|s| s.to_string()).collect(),
        nice_to_have_skills: vec!["Kafka".to_string()],
        is_active: true,
        ..Default::default()
    }
}

pub fn skill(name: &str) -> CandidateSkill {
    CandidateSkill {
        skill_id: SkillId::from(name.to_lowercase()),
        name: name.to_string(),
        level: None,
        years_experience: None,
    }
}

pub fn experience(
    title: &str,
    company: &str,
    start: (i32, u32),
    end: Option<(i32, u32)>,
) -> Experience {
    Experience {
        title: title.to_string(),
        company: company.to_string(),
        start_date: NaiveDate::from_ymd_opt(start.0, start.1, 1),
        end_date: end.and_then(|(y, m)| NaiveDate::from_ymd_opt(y, m, 1)),
        is_current: end.is_none(),
        ..Default::default()
    }
}

pub fn profile(id: &str, skills: &[&str]) -> CandidateProfile {
    CandidateProfile {
        candidate: Candidate {
            id: CandidateId::from(id),
            full_name: format!("Candidate {}", id),
            headline: Some(format!("Engineer {}", id)),
            ..Default::default()
        },
        experiences: vec![experience("Engineer", "Acme", (2019, 1), None)],
        skills: skills.iter().map(|s| skill(s)).collect(),
        ..Default::default()
    }
}

/// Worker settings with no waiting between retries
pub fn fast_config(concurrency: usize) -> WorkerConfig {
    WorkerConfig::builder()
        .worker_id("test-worker")
        .concurrency(concurrency)
        .poll_interval(Duration::from_millis(10))
        .task_timeout(Duration::from_secs(5))
        .lease_timeout(Duration::from_secs(30))
        .retry_delays(Duration::ZERO, Duration::ZERO)
        .error_backoff(Duration::from_millis(10))
        .build()
}

/// Wait until `condition` holds, polling every few milliseconds
pub async fn wait_for(condition: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached within 10s");
}

/// Run the worker loop until every task is terminal, then shut it down
pub async fn run_until_drained(runner: Arc<TaskRunner>, queue: &MemoryQueue) -> RunSummary {
    let shutdown = runner.shutdown_handle();
    let handle = tokio::spawn(async move { runner.run().await });

    wait_for(|| queue.is_drained()).await;
    shutdown.cancel();

    handle.await.expect("runner panicked").expect("runner failed")
}
