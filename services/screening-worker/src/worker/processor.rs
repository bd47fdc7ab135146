//! Task processor: turns one screening task into a stored screening

use crate::db::models::{CandidateProfile, NewScreening, ScreeningTask};
use crate::error::{Result, ScreeningError};
use crate::queue::TaskOutcome;
use crate::scoring::{CandidatePayload, RolePayload, Scorer};
use crate::store::RecruitingStore;
use std::sync::Arc;
use tracing::debug;

/// Loads the records for a task, scores them and upserts the result
pub struct TaskProcessor {
    store: Arc<dyn RecruitingStore>,
    scorer: Arc<dyn Scorer>,
}

impl TaskProcessor {
    /// Create a new task processor
    pub fn new(store: Arc<dyn RecruitingStore>, scorer: Arc<dyn Scorer>) -> Self {
        Self { store, scorer }
    }

    /// Process a single screening task
    ///
    /// Missing role or candidate rows are permanent errors. An inactive role
    /// is acknowledged as [`TaskOutcome::Skipped`] without writing anything.
    /// Scoring failures are always reported as retryable.
    pub async fn process(&self, task: &ScreeningTask) -> Result<TaskOutcome> {
        // Step 1: Role
        let role = self
            .store
            .find_role(&task.role_id)
            .await?
            .ok_or_else(|| ScreeningError::RoleNotFound {
                role_id: task.role_id.clone(),
            })?;

        // Step 2: Inactive roles are skipped, not scored
        if !role.is_active {
            return Ok(TaskOutcome::Skipped {
                reason: format!("role {} is inactive", role.id),
            });
        }

        // Step 3: Candidate root record
        let candidate = self
            .store
            .find_candidate(&task.candidate_id)
            .await?
            .ok_or_else(|| ScreeningError::CandidateNotFound {
                candidate_id: task.candidate_id.clone(),
            })?;

        // Step 4: Owned child collections
        let (experiences, education, certifications, skills) = tokio::try_join!(
            self.store.list_experiences(&task.candidate_id),
            self.store.list_education(&task.candidate_id),
            self.store.list_certifications(&task.candidate_id),
            self.store.list_skills(&task.candidate_id),
        )?;

        let profile = CandidateProfile {
            candidate,
            experiences,
            education,
            certifications,
            skills,
            projects: Vec::new(),
        };

        // Step 5: Evaluation payloads
        let candidate_payload = CandidatePayload::from_profile(&profile);
        let role_payload = RolePayload::from(&role);
        debug!(
            "Scoring {} with {} experiences, {} skills",
            task,
            candidate_payload.experiences.len(),
            candidate_payload.skills.len()
        );

        // Step 6: Score
        let result = self
            .scorer
            .evaluate(&candidate_payload, &role_payload)
            .await
            .and_then(|r| r.normalized())
            .map_err(|e| {
                if e.is_retryable() {
                    e
                } else {
                    ScreeningError::ScoringError(e.to_string())
                }
            })?;

        // Step 7: Upsert keyed by (role, candidate)
        let screening = self
            .store
            .upsert_screening(&NewScreening {
                role_id: task.role_id.clone(),
                candidate_id: task.candidate_id.clone(),
                result,
                scorer: self.scorer.name().to_string(),
            })
            .await?;

        Ok(TaskOutcome::Completed {
            score_total: screening.score_total,
        })
    }
}
