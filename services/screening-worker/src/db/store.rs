//! Postgres implementation of [`RecruitingStore`]

use crate::db::models::{
    Candidate, CandidateEmbedding, CandidateId, CandidateSkill, Certification, Education,
    Experience, NewCandidateEmbedding, NewScreening, Project, Role, RoleId, Screening,
};
use crate::db::{candidates, embeddings, roles, screenings, DbPool};
use crate::error::Result;
use crate::store::RecruitingStore;
use async_trait::async_trait;

/// Recruiting store backed by the shared Postgres database
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl RecruitingStore for PgStore {
    async fn find_role(&self, role_id: &RoleId) -> Result<Option<Role>> {
        roles::get_role_by_id(&self.pool, role_id).await
    }

    async fn find_candidate(&self, candidate_id: &CandidateId) -> Result<Option<Candidate>> {
        candidates::get_candidate_by_id(&self.pool, candidate_id).await
    }

    async fn list_experiences(&self, candidate_id: &CandidateId) -> Result<Vec<Experience>> {
        candidates::list_experiences(&self.pool, candidate_id).await
    }

    async fn list_education(&self, candidate_id: &CandidateId) -> Result<Vec<Education>> {
        candidates::list_education(&self.pool, candidate_id).await
    }

    async fn list_certifications(
        &self,
        candidate_id: &CandidateId,
    ) -> Result<Vec<Certification>> {
        candidates::list_certifications(&self.pool, candidate_id).await
    }

    async fn list_skills(&self, candidate_id: &CandidateId) -> Result<Vec<CandidateSkill>> {
        candidates::list_skills(&self.pool, candidate_id).await
    }

    async fn list_projects(&self, candidate_id: &CandidateId) -> Result<Vec<Project>> {
        candidates::list_projects(&self.pool, candidate_id).await
    }

    async fn list_candidate_ids(
        &self,
        after: Option<&CandidateId>,
        limit: i64,
    ) -> Result<Vec<CandidateId>> {
        candidates::list_candidate_ids(&self.pool, after, limit).await
    }

    async fn upsert_screening(&self, screening: &NewScreening) -> Result<Screening> {
        screenings::upsert_screening(&self.pool, screening).await
    }

    async fn find_screening(
        &self,
        role_id: &RoleId,
        candidate_id: &CandidateId,
    ) -> Result<Option<Screening>> {
        screenings::get_screening(&self.pool, role_id, candidate_id).await
    }

    async fn upsert_embedding(
        &self,
        embedding: &NewCandidateEmbedding,
    ) -> Result<CandidateEmbedding> {
        embeddings::upsert_embedding(&self.pool, embedding).await
    }
}
