//! Database models for the recruiting tables read and written by the worker

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use crate::scoring::ScoreResult;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
            sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a role (job requisition), generated by the web tier
    RoleId
);
string_id!(
    /// Identifier of a candidate profile, generated by the web tier
    CandidateId
);
string_id!(
    /// Identifier of an entry in the shared skill dictionary
    SkillId
);

/// Queue row identifier (BIGSERIAL)
pub type TaskId = i64;

// ============================================================================
// Screening Tasks
// ============================================================================

/// A request to screen one candidate against one role
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningTask {
    pub role_id: RoleId,
    pub candidate_id: CandidateId,
}

impl ScreeningTask {
    pub fn new(role_id: impl Into<RoleId>, candidate_id: impl Into<CandidateId>) -> Self {
        Self {
            role_id: role_id.into(),
            candidate_id: candidate_id.into(),
        }
    }
}

impl fmt::Display for ScreeningTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.role_id, self.candidate_id)
    }
}

/// Queue task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Queued,
    Leased,
    Completed,
    Skipped,
    Failed,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 5] = [
        TaskStatus::Queued,
        TaskStatus::Leased,
        TaskStatus::Completed,
        TaskStatus::Skipped,
        TaskStatus::Failed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Queued => "queued",
            TaskStatus::Leased => "leased",
            TaskStatus::Completed => "completed",
            TaskStatus::Skipped => "skipped",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }

    /// Terminal states are never leased again
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Skipped | TaskStatus::Failed
        )
    }
}

/// QueuedTask - Matches screening_tasks table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QueuedTask {
    pub id: TaskId,
    pub role_id: RoleId,
    pub candidate_id: CandidateId,
    pub status: String,
    pub attempts: i32,
    pub max_attempts: i32,
    pub available_at: DateTime<Utc>,
    pub leased_by: Option<String>,
    pub lease_expires_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub outcome: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl QueuedTask {
    pub fn task(&self) -> ScreeningTask {
        ScreeningTask {
            role_id: self.role_id.clone(),
            candidate_id: self.candidate_id.clone(),
        }
    }
}

// ============================================================================
// Roles
// ============================================================================

/// Role - Matches roles table (read-only for the worker)
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub title: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub employment_type: Option<String>,
    pub seniority: Option<String>,
    pub must_have_skills: Vec<String>,
    pub nice_to_have_skills: Vec<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub salary_currency: Option<String>,
    pub knockout_criteria: Option<serde_json::Value>,
    pub scoring_weights: Option<serde_json::Value>,
    pub is_active: bool,
}

// ============================================================================
// Candidates
// ============================================================================

/// Candidate - Matches candidates table (root of the profile aggregate)
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub headline: Option<String>,
    pub summary: Option<String>,
    pub work_authorization: Option<String>,
    pub availability: Option<String>,
    pub salary_expectation: Option<i32>,
    pub salary_currency: Option<String>,
}

/// Experience - Matches candidate_experiences table
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    pub description: Option<String>,
    pub bullets: Vec<String>,
}

/// Education - Matches candidate_education table
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub degree: Option<String>,
    pub field_of_study: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
}

/// Certification - Matches candidate_certifications table
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct Certification {
    pub name: String,
    pub issuer: Option<String>,
    pub issued_on: Option<NaiveDate>,
    pub expires_on: Option<NaiveDate>,
}

/// CandidateSkill - candidate_skills joined to the skills dictionary
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CandidateSkill {
    pub skill_id: SkillId,
    pub name: String,
    pub level: Option<String>,
    pub years_experience: Option<i32>,
}

/// Project - Matches candidate_projects table
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub description: Option<String>,
    pub technologies: Vec<String>,
    pub url: Option<String>,
}

/// A candidate root record together with its owned child collections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub candidate: Candidate,
    pub experiences: Vec<Experience>,
    pub education: Vec<Education>,
    pub certifications: Vec<Certification>,
    pub skills: Vec<CandidateSkill>,
    pub projects: Vec<Project>,
}

// ============================================================================
// Screenings
// ============================================================================

/// Screening - Matches screenings table, unique on (role_id, candidate_id)
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Screening {
    pub id: i64,
    pub role_id: RoleId,
    pub candidate_id: CandidateId,
    pub score_total: f64,
    pub score_breakdown: serde_json::Value,
    pub must_haves_satisfied: Vec<String>,
    pub missing_must_haves: Vec<String>,
    pub knockout: bool,
    pub reasons: String,
    pub flags: serde_json::Value,
    pub scorer: String,
    /// Time the scores were (re)computed; advances on every overwrite
    pub created_at: DateTime<Utc>,
}

/// NewScreening - For upserting a scored pair
#[derive(Debug, Clone)]
pub struct NewScreening {
    pub role_id: RoleId,
    pub candidate_id: CandidateId,
    pub result: ScoreResult,
    pub scorer: String,
}

// ============================================================================
// Candidate Embeddings
// ============================================================================

/// CandidateEmbedding - Matches candidate_embeddings table, unique on candidate_id
#[derive(Debug, Clone, FromRow)]
pub struct CandidateEmbedding {
    pub candidate_id: CandidateId,
    pub embedding: pgvector::Vector,
    pub model: String,
    pub dimensions: i32,
    pub source_hash: String,
    pub updated_at: DateTime<Utc>,
}

/// NewCandidateEmbedding - For overwriting a candidate's vector
#[derive(Debug, Clone)]
pub struct NewCandidateEmbedding {
    pub candidate_id: CandidateId,
    pub embedding: Vec<f32>,
    pub model: String,
    pub source_hash: String,
}
