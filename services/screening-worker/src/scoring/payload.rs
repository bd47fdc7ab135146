//! Normalized evaluation payloads handed to a [`Scorer`](super::Scorer)
//!
//! Payloads are plain projections of the database rows. Blank strings become
//! absent fields and absent fields are left out of the serialized JSON, so a
//! sparse profile never turns into a stream of `null`s for the model.

use crate::db::models::{
    CandidateId, CandidateProfile, Certification, Education, Experience, Role, RoleId,
};
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidatePayload {
    pub id: CandidateId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_authorization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_expectation: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_currency: Option<String>,
    pub experiences: Vec<ExperiencePayload>,
    pub education: Vec<EducationPayload>,
    pub certifications: Vec<CertificationPayload>,
    pub skills: Vec<SkillPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExperiencePayload {
    pub title: String,
    pub company: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    pub is_current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bullets: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EducationPayload {
    pub institution: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_of_study: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificationPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_on: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years_experience: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RolePayload {
    pub id: RoleId,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employment_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seniority: Option<String>,
    pub must_have_skills: Vec<String>,
    pub nice_to_have_skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_min: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_max: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary_currency: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub knockout_criteria: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scoring_weights: Option<Value>,
}

/// Trim a value and drop it when nothing is left
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn non_empty_list(values: &[String]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| non_empty(Some(v)))
        .collect()
}

fn non_null(value: Option<&Value>) -> Option<Value> {
    value.filter(|v| !v.is_null()).cloned()
}

impl CandidatePayload {
    pub fn from_profile(profile: &CandidateProfile) -> Self {
        let candidate = &profile.candidate;
        Self {
            id: candidate.id.clone(),
            name: candidate.full_name.trim().to_string(),
            headline: non_empty(candidate.headline.as_deref()),
            summary: non_empty(candidate.summary.as_deref()),
            location: non_empty(candidate.location.as_deref()),
            work_authorization: non_empty(candidate.work_authorization.as_deref()),
            availability: non_empty(candidate.availability.as_deref()),
            salary_expectation: candidate.salary_expectation,
            salary_currency: non_empty(candidate.salary_currency.as_deref()),
            experiences: profile.experiences.iter().map(ExperiencePayload::from).collect(),
            education: profile.education.iter().map(EducationPayload::from).collect(),
            certifications: profile
                .certifications
                .iter()
                .map(CertificationPayload::from)
                .collect(),
            skills: profile
                .skills
                .iter()
                .filter_map(|s| {
                    non_empty(Some(&s.name)).map(|name| SkillPayload {
                        name,
                        level: non_empty(s.level.as_deref()),
                        years_experience: s.years_experience,
                    })
                })
                .collect(),
        }
    }
}

impl From<&Experience> for ExperiencePayload {
    fn from(exp: &Experience) -> Self {
        Self {
            title: exp.title.trim().to_string(),
            company: exp.company.trim().to_string(),
            location: non_empty(exp.location.as_deref()),
            start_date: exp.start_date,
            end_date: exp.end_date,
            is_current: exp.is_current,
            description: non_empty(exp.description.as_deref()),
            bullets: non_empty_list(&exp.bullets),
        }
    }
}

impl From<&Education> for EducationPayload {
    fn from(edu: &Education) -> Self {
        Self {
            institution: edu.institution.trim().to_string(),
            degree: non_empty(edu.degree.as_deref()),
            field_of_study: non_empty(edu.field_of_study.as_deref()),
            start_year: edu.start_year,
            end_year: edu.end_year,
        }
    }
}

impl From<&Certification> for CertificationPayload {
    fn from(cert: &Certification) -> Self {
        Self {
            name: cert.name.trim().to_string(),
            issuer: non_empty(cert.issuer.as_deref()),
            issued_on: cert.issued_on,
            expires_on: cert.expires_on,
        }
    }
}

impl From<&Role> for RolePayload {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id.clone(),
            title: role.title.trim().to_string(),
            description: non_empty(role.description.as_deref()),
            location: non_empty(role.location.as_deref()),
            employment_type: non_empty(role.employment_type.as_deref()),
            seniority: non_empty(role.seniority.as_deref()),
            must_have_skills: non_empty_list(&role.must_have_skills),
            nice_to_have_skills: non_empty_list(&role.nice_to_have_skills),
            salary_min: role.salary_min,
            salary_max: role.salary_max,
            salary_currency: non_empty(role.salary_currency.as_deref()),
            knockout_criteria: non_null(role.knockout_criteria.as_ref()),
            scoring_weights: non_null(role.scoring_weights.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Candidate, CandidateSkill, SkillId};

    #[test]
    fn test_blank_fields_are_omitted() {
        let profile = CandidateProfile {
            candidate: Candidate {
                id: CandidateId::from("C1"),
                full_name: " Ada Lovelace ".into(),
                headline: Some("   ".into()),
                summary: None,
                ..Default::default()
            },
            skills: vec![CandidateSkill {
                skill_id: SkillId::from("s1"),
                name: "Rust".into(),
                level: Some(String::new()),
                years_experience: None,
            }],
            ..Default::default()
        };

        let payload = CandidatePayload::from_profile(&profile);
        assert_eq!(payload.name, "Ada Lovelace");
        assert_eq!(payload.headline, None);

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("headline").is_none());
        assert!(json.get("summary").is_none());
        assert_eq!(json["skills"][0], serde_json::json!({"name": "Rust"}));
    }

    #[test]
    fn test_role_payload_drops_blank_skills() {
        let role = Role {
            id: RoleId::from("R1"),
            title: "Backend Engineer".into(),
            must_have_skills: vec!["Rust".into(), " ".into()],
            knockout_criteria: Some(Value::Null),
            is_active: true,
            ..Default::default()
        };

        let payload = RolePayload::from(&role);
        assert_eq!(payload.must_have_skills, vec!["Rust".to_string()]);
        assert_eq!(payload.knockout_criteria, None);
    }
}
