//! Relational store contract used by the worker and the indexer

use crate::db::models::{
    Candidate, CandidateEmbedding, CandidateId, CandidateProfile, CandidateSkill, Certification,
    Education, Experience, NewCandidateEmbedding, NewScreening, Project, Role, RoleId, Screening,
};
use crate::error::{Result, ScreeningError};
use async_trait::async_trait;

/// Point lookups, foreign-key listings and the two upserts the pipeline owns
#[async_trait]
pub trait RecruitingStore: Send + Sync {
    async fn find_role(&self, role_id: &RoleId) -> Result<Option<Role>>;

    async fn find_candidate(&self, candidate_id: &CandidateId) -> Result<Option<Candidate>>;

    async fn list_experiences(&self, candidate_id: &CandidateId) -> Result<Vec<Experience>>;

    async fn list_education(&self, candidate_id: &CandidateId) -> Result<Vec<Education>>;

    async fn list_certifications(&self, candidate_id: &CandidateId)
        -> Result<Vec<Certification>>;

    /// Skill associations joined to the skill dictionary for names
    async fn list_skills(&self, candidate_id: &CandidateId) -> Result<Vec<CandidateSkill>>;

    async fn list_projects(&self, candidate_id: &CandidateId) -> Result<Vec<Project>>;

    /// Candidate ids ordered by id, for paging through the whole table
    async fn list_candidate_ids(
        &self,
        after: Option<&CandidateId>,
        limit: i64,
    ) -> Result<Vec<CandidateId>>;

    /// Insert or overwrite the screening for (role, candidate)
    async fn upsert_screening(&self, screening: &NewScreening) -> Result<Screening>;

    async fn find_screening(
        &self,
        role_id: &RoleId,
        candidate_id: &CandidateId,
    ) -> Result<Option<Screening>>;

    /// Insert or overwrite the embedding for a candidate
    async fn upsert_embedding(&self, embedding: &NewCandidateEmbedding)
        -> Result<CandidateEmbedding>;

    /// Load the full candidate aggregate, children included
    async fn load_profile(&self, candidate_id: &CandidateId) -> Result<CandidateProfile> {
        let candidate = self.find_candidate(candidate_id).await?.ok_or_else(|| {
            ScreeningError::CandidateNotFound {
                candidate_id: candidate_id.clone(),
            }
        })?;

        let (experiences, education, certifications, skills, projects) = tokio::try_join!(
            self.list_experiences(candidate_id),
            self.list_education(candidate_id),
            self.list_certifications(candidate_id),
            self.list_skills(candidate_id),
            self.list_projects(candidate_id),
        )?;

        Ok(CandidateProfile {
            candidate,
            experiences,
            education,
            certifications,
            skills,
            projects,
        })
    }
}
