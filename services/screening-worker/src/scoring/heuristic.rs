//! Deterministic scorer based on skill coverage and experience length
//!
//! Used when no model is configured and as the reference scorer in tests.
//! Recognised role settings:
//! - `scoring_weights`: `{"must_have": f, "nice_to_have": f, "experience": f}`
//! - `knockout_criteria`: `{"require_all_must_haves": bool,
//!   "work_authorization": "<value>", "enforce_salary_range": bool}`

use crate::error::Result;
use crate::scoring::payload::{CandidatePayload, ExperiencePayload, RolePayload};
use crate::scoring::{ScoreResult, Scorer, MAX_SCORE};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::OnceLock;

const DEFAULT_MUST_HAVE_WEIGHT: f64 = 0.6;
const DEFAULT_NICE_TO_HAVE_WEIGHT: f64 = 0.2;
const DEFAULT_EXPERIENCE_WEIGHT: f64 = 0.2;

/// Years credited for a position without dates
const UNDATED_POSITION_YEARS: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Weights {
    must_have: f64,
    nice_to_have: f64,
    experience: f64,
}

impl Weights {
    fn from_role(role: &RolePayload) -> Self {
        let read = |key: &str, default: f64| {
            role.scoring_weights
                .as_ref()
                .and_then(|w| w.get(key))
                .and_then(Value::as_f64)
                .filter(|w| w.is_finite() && *w >= 0.0)
                .unwrap_or(default)
        };

        let weights = Self {
            must_have: read("must_have", DEFAULT_MUST_HAVE_WEIGHT),
            nice_to_have: read("nice_to_have", DEFAULT_NICE_TO_HAVE_WEIGHT),
            experience: read("experience", DEFAULT_EXPERIENCE_WEIGHT),
        };

        let sum = weights.must_have + weights.nice_to_have + weights.experience;
        if sum <= f64::EPSILON {
            return Self {
                must_have: DEFAULT_MUST_HAVE_WEIGHT,
                nice_to_have: DEFAULT_NICE_TO_HAVE_WEIGHT,
                experience: DEFAULT_EXPERIENCE_WEIGHT,
            };
        }

        Self {
            must_have: weights.must_have / sum,
            nice_to_have: weights.nice_to_have / sum,
            experience: weights.experience / sum,
        }
    }
}

/// Scorer computing coverage of the role's skill lists
pub struct HeuristicScorer {
    reference_date: Option<NaiveDate>,
}

impl HeuristicScorer {
    pub fn new() -> Self {
        Self {
            reference_date: None,
        }
    }

    /// Pin "today" for open-ended positions
    pub fn with_reference_date(date: NaiveDate) -> Self {
        Self {
            reference_date: Some(date),
        }
    }

    fn today(&self) -> NaiveDate {
        self.reference_date.unwrap_or_else(|| Utc::now().date_naive())
    }

    fn total_years(&self, experiences: &[ExperiencePayload]) -> f64 {
        let today = self.today();
        experiences
            .iter()
            .map(|exp| match exp.start_date {
                Some(start) => {
                    let end = match (exp.end_date, exp.is_current) {
                        (_, true) | (None, false) => today,
                        (Some(end), false) => end,
                    };
                    ((end - start).num_days().max(0) as f64) / 365.25
                }
                None => UNDATED_POSITION_YEARS,
            })
            .sum()
    }
}

impl Default for HeuristicScorer {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a skill name for comparison
///
/// "Node.js" and "nodejs" match, "C++" and "C#" stay distinct.
pub fn normalize_skill(name: &str) -> String {
    static NON_SKILL_CHARS: OnceLock<Regex> = OnceLock::new();
    let re = NON_SKILL_CHARS.get_or_init(|| {
        Regex::new(r"[^a-z0-9+#]").expect("invalid skill normalization regex")
    });
    re.replace_all(&name.to_lowercase(), "").into_owned()
}

/// Split a required skill list into (satisfied, missing), keeping the role's spelling
fn partition_skills(required: &[String], have: &HashSet<String>) -> (Vec<String>, Vec<String>) {
    required
        .iter()
        .cloned()
        .partition(|skill| have.contains(&normalize_skill(skill)))
}

fn coverage(satisfied: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        satisfied as f64 / total as f64
    }
}

fn target_years(seniority: Option<&str>) -> f64 {
    match seniority.map(|s| s.to_ascii_lowercase()) {
        Some(s) if s.contains("intern") || s.contains("entry") => 0.5,
        Some(s) if s.contains("junior") => 1.0,
        Some(s) if s.contains("senior") => 5.0,
        Some(s) if s.contains("lead") || s.contains("staff") || s.contains("principal") => 8.0,
        _ => 3.0,
    }
}

#[async_trait]
impl Scorer for HeuristicScorer {
    fn name(&self) -> &str {
        "heuristic"
    }

    async fn evaluate(
        &self,
        candidate: &CandidatePayload,
        role: &RolePayload,
    ) -> Result<ScoreResult> {
        let have: HashSet<String> = candidate
            .skills
            .iter()
            .map(|s| normalize_skill(&s.name))
            .filter(|s| !s.is_empty())
            .collect();

        let (must_satisfied, must_missing) = partition_skills(&role.must_have_skills, &have);
        let (nice_satisfied, _) = partition_skills(&role.nice_to_have_skills, &have);

        let must_cov = coverage(must_satisfied.len(), role.must_have_skills.len());
        let nice_cov = coverage(nice_satisfied.len(), role.nice_to_have_skills.len());

        let years = self.total_years(&candidate.experiences);
        let target = target_years(role.seniority.as_deref());
        let exp_cov = (years / target).min(1.0);

        let weights = Weights::from_role(role);
        let raw = weights.must_have * must_cov
            + weights.nice_to_have * nice_cov
            + weights.experience * exp_cov;
        let score_total = (raw * MAX_SCORE * 10.0).round() / 10.0;

        let criteria = role.knockout_criteria.as_ref();
        let criterion_bool = |key: &str| {
            criteria
                .and_then(|c| c.get(key))
                .and_then(Value::as_bool)
                .unwrap_or(false)
        };

        let missing_must_have_knockout =
            criterion_bool("require_all_must_haves") && !must_missing.is_empty();

        let work_authorization_mismatch = criteria
            .and_then(|c| c.get("work_authorization"))
            .and_then(Value::as_str)
            .map(|required| {
                candidate
                    .work_authorization
                    .as_deref()
                    .map(|have| !have.eq_ignore_ascii_case(required.trim()))
                    .unwrap_or(true)
            })
            .unwrap_or(false);

        let salary_above_range = match (candidate.salary_expectation, role.salary_max) {
            (Some(expected), Some(max)) => expected > max,
            _ => false,
        };
        let salary_knockout = criterion_bool("enforce_salary_range") && salary_above_range;

        let knockout = missing_must_have_knockout || work_authorization_mismatch || salary_knockout;

        let mut reasons = vec![format!(
            "Matches {}/{} must-have and {}/{} nice-to-have skills.",
            must_satisfied.len(),
            role.must_have_skills.len(),
            nice_satisfied.len(),
            role.nice_to_have_skills.len()
        )];
        reasons.push(format!(
            "About {:.1} years of experience against a target of {:.1}.",
            years, target
        ));
        if !must_missing.is_empty() {
            reasons.push(format!("Missing: {}.", must_missing.join(", ")));
        }
        if work_authorization_mismatch {
            reasons.push("Work authorization does not meet the role requirement.".to_string());
        }
        if salary_above_range {
            reasons.push("Salary expectation is above the role's range.".to_string());
        }

        Ok(ScoreResult {
            score_total,
            score_breakdown: json!({
                "must_have": must_cov,
                "nice_to_have": nice_cov,
                "experience": exp_cov,
                "weights": {
                    "must_have": weights.must_have,
                    "nice_to_have": weights.nice_to_have,
                    "experience": weights.experience,
                },
            }),
            must_haves_satisfied: must_satisfied,
            missing_must_haves: must_missing,
            knockout,
            reasons: reasons.join(" "),
            flags: json!({
                "salary_above_range": salary_above_range,
                "work_authorization_mismatch": work_authorization_mismatch,
                "no_experience": candidate.experiences.is_empty(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CandidateId, RoleId};
    use crate::scoring::payload::SkillPayload;

    fn candidate(skills: &[&str]) -> CandidatePayload {
        CandidatePayload {
            id: CandidateId::from("C1"),
            name: "Grace Hopper".into(),
            headline: None,
            summary: None,
            location: None,
            work_authorization: Some("US Citizen".into()),
            availability: None,
            salary_expectation: Some(150_000),
            salary_currency: Some("USD".into()),
            experiences: vec![ExperiencePayload {
                title: "Engineer".into(),
                company: "Acme".into(),
                location: None,
                start_date: NaiveDate::from_ymd_opt(2020, 1, 1),
                end_date: None,
                is_current: true,
                description: None,
                bullets: vec![],
            }],
            education: vec![],
            certifications: vec![],
            skills: skills
                .iter()
                .map(|s| SkillPayload {
                    name: s.to_string(),
                    level: None,
                    years_experience: None,
                })
                .collect(),
        }
    }

    fn role(must: &[&str], nice: &[&str]) -> RolePayload {
        RolePayload {
            id: RoleId::from("R1"),
            title: "Backend Engineer".into(),
            description: None,
            location: None,
            employment_type: None,
            seniority: Some("Mid".into()),
            must_have_skills: must.iter().map(|s| s.to_string()).collect(),
            nice_to_have_skills: nice.iter().map(|s| s.to_string()).collect(),
            salary_min: Some(100_000),
            salary_max: Some(140_000),
            salary_currency: Some("USD".into()),
            knockout_criteria: None,
            scoring_weights: None,
        }
    }

    fn scorer() -> HeuristicScorer {
        HeuristicScorer::with_reference_date(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())
    }

    #[test]
    fn test_normalize_skill() {
        assert_eq!(normalize_skill("Node.js"), "nodejs");
        assert_eq!(normalize_skill(" PostgreSQL "), "postgresql");
        assert_eq!(normalize_skill("C++"), "c++");
        assert_ne!(normalize_skill("C#"), normalize_skill("C++"));
    }

    #[tokio::test]
    async fn test_full_coverage_scores_100() {
        let result = scorer()
            .evaluate(&candidate(&["rust", "Postgres"]), &role(&["Rust"], &["postgres"]))
            .await
            .unwrap();

        assert_eq!(result.score_total, 100.0);
        assert_eq!(result.must_haves_satisfied, vec!["Rust".to_string()]);
        assert!(result.missing_must_haves.is_empty());
        assert!(!result.knockout);
        assert_eq!(result.flags["salary_above_range"], json!(true));
    }

    #[tokio::test]
    async fn test_missing_must_have_reported_in_role_spelling() {
        let result = scorer()
            .evaluate(&candidate(&["Rust"]), &role(&["Rust", "Kafka"], &[]))
            .await
            .unwrap();

        assert_eq!(result.missing_must_haves, vec!["Kafka".to_string()]);
        // 0.6 * 0.5 + 0.2 * 1.0 + 0.2 * 1.0
        assert_eq!(result.score_total, 70.0);
        assert!(!result.knockout);
    }

    #[tokio::test]
    async fn test_knockout_criteria() {
        let mut r = role(&["Rust", "Kafka"], &[]);
        r.knockout_criteria = Some(json!({"require_all_must_haves": true}));
        let result = scorer().evaluate(&candidate(&["Rust"]), &r).await.unwrap();
        assert!(result.knockout);

        let mut r = role(&["Rust"], &[]);
        r.knockout_criteria = Some(json!({"work_authorization": "EU Citizen"}));
        let result = scorer().evaluate(&candidate(&["Rust"]), &r).await.unwrap();
        assert!(result.knockout);
        assert_eq!(result.flags["work_authorization_mismatch"], json!(true));

        let mut r = role(&["Rust"], &[]);
        r.knockout_criteria = Some(json!({"enforce_salary_range": true}));
        let result = scorer().evaluate(&candidate(&["Rust"]), &r).await.unwrap();
        assert!(result.knockout);
    }

    #[tokio::test]
    async fn test_custom_weights_are_normalized() {
        let mut r = role(&["Rust", "Kafka"], &[]);
        r.scoring_weights = Some(json!({"must_have": 2.0, "nice_to_have": 0.0, "experience": 0.0}));
        let result = scorer().evaluate(&candidate(&["Rust"]), &r).await.unwrap();
        assert_eq!(result.score_total, 50.0);
    }
}
