//! Candidate profile database operations

use crate::db::models::{
    Candidate, CandidateId, CandidateSkill, Certification, Education, Experience, Project,
};
use crate::db::DbPool;
use crate::error::Result;

/// Get a candidate root record by ID
pub async fn get_candidate_by_id(
    pool: &DbPool,
    candidate_id: &CandidateId,
) -> Result<Option<Candidate>> {
    let candidate = sqlx::query_as::<_, Candidate>(
        r#"
        SELECT id, full_name, email, phone, location, headline, summary,
               work_authorization, availability, salary_expectation, salary_currency
        FROM candidates
        WHERE id = $1
        "#,
    )
    .bind(candidate_id)
    .fetch_optional(pool)
    .await?;

    Ok(candidate)
}

/// List experiences, current and most recent first
pub async fn list_experiences(
    pool: &DbPool,
    candidate_id: &CandidateId,
) -> Result<Vec<Experience>> {
    let rows = sqlx::query_as::<_, Experience>(
        r#"
        SELECT title, company, location, start_date, end_date,
               COALESCE(is_current, FALSE) AS is_current,
               description,
               COALESCE(bullets, '{}') AS bullets
        FROM candidate_experiences
        WHERE candidate_id = $1
        ORDER BY is_current DESC, start_date DESC NULLS LAST, id ASC
        "#,
    )
    .bind(candidate_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List education entries, most recent first
pub async fn list_education(pool: &DbPool, candidate_id: &CandidateId) -> Result<Vec<Education>> {
    let rows = sqlx::query_as::<_, Education>(
        r#"
        SELECT institution, degree, field_of_study, start_year, end_year
        FROM candidate_education
        WHERE candidate_id = $1
        ORDER BY end_year DESC NULLS FIRST, id ASC
        "#,
    )
    .bind(candidate_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List certifications
pub async fn list_certifications(
    pool: &DbPool,
    candidate_id: &CandidateId,
) -> Result<Vec<Certification>> {
    let rows = sqlx::query_as::<_, Certification>(
        r#"
        SELECT name, issuer, issued_on, expires_on
        FROM candidate_certifications
        WHERE candidate_id = $1
        ORDER BY issued_on DESC NULLS LAST, id ASC
        "#,
    )
    .bind(candidate_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List skill associations with names from the shared skill dictionary
pub async fn list_skills(pool: &DbPool, candidate_id: &CandidateId) -> Result<Vec<CandidateSkill>> {
    let rows = sqlx::query_as::<_, CandidateSkill>(
        r#"
        SELECT cs.skill_id, s.name, cs.level, cs.years_experience
        FROM candidate_skills cs
        JOIN skills s ON s.id = cs.skill_id
        WHERE cs.candidate_id = $1
        ORDER BY s.name ASC
        "#,
    )
    .bind(candidate_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// List projects
pub async fn list_projects(pool: &DbPool, candidate_id: &CandidateId) -> Result<Vec<Project>> {
    let rows = sqlx::query_as::<_, Project>(
        r#"
        SELECT name, description,
               COALESCE(technologies, '{}') AS technologies,
               url
        FROM candidate_projects
        WHERE candidate_id = $1
        ORDER BY id ASC
        "#,
    )
    .bind(candidate_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Page through candidate IDs in id order (keyset pagination)
pub async fn list_candidate_ids(
    pool: &DbPool,
    after: Option<&CandidateId>,
    limit: i64,
) -> Result<Vec<CandidateId>> {
    let ids = sqlx::query_scalar::<_, CandidateId>(
        r#"
        SELECT id FROM candidates
        WHERE ($1::text IS NULL OR id > $1)
        ORDER BY id ASC
        LIMIT $2
        "#,
    )
    .bind(after)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
