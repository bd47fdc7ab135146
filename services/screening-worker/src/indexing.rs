//! Candidate indexing: one semantic-search vector per candidate
//!
//! The profile text is assembled in a fixed section order so the same
//! profile always produces the same text (and the same `source_hash`).

use crate::db::models::{CandidateId, CandidateProfile, NewCandidateEmbedding};
use crate::embedding::Embedder;
use crate::error::{Result, ScreeningError};
use crate::store::RecruitingStore;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::{Arc, OnceLock};
use tracing::{info, warn};

/// Collapse internal whitespace and trim
fn clean(value: &str) -> String {
    static WHITESPACE: OnceLock<Regex> = OnceLock::new();
    let re = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("invalid whitespace regex"));
    re.replace_all(value.trim(), " ").into_owned()
}

fn clean_opt<S: AsRef<str>>(value: Option<S>) -> Option<String> {
    value.map(|v| clean(v.as_ref())).filter(|s| !s.is_empty())
}

/// Join the non-empty parts with `sep`
fn join_present(parts: impl IntoIterator<Item = Option<String>>, sep: &str) -> Option<String> {
    let parts: Vec<String> = parts.into_iter().flatten().collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(sep))
    }
}

/// Build the deterministic text summary that gets embedded
///
/// Sections without data are left out entirely.
pub fn build_profile_text(profile: &CandidateProfile) -> String {
    let candidate = &profile.candidate;
    let mut sections: Vec<String> = Vec::new();

    if let Some(headline) = clean_opt(candidate.headline.as_deref()) {
        sections.push(format!("Headline: {}", headline));
    }
    if let Some(summary) = clean_opt(candidate.summary.as_deref()) {
        sections.push(format!("Summary: {}", summary));
    }
    if let Some(location) = clean_opt(candidate.location.as_deref()) {
        sections.push(format!("Location: {}", location));
    }

    let skills = join_present(
        profile.skills.iter().map(|s| clean_opt(Some(&s.name))),
        ", ",
    );
    if let Some(skills) = skills {
        sections.push(format!("Skills: {}", skills));
    }

    let experiences = join_present(
        profile.experiences.iter().map(|exp| {
            let title = clean_opt(Some(&exp.title));
            let company = clean_opt(Some(&exp.company));
            let role = match (title, company) {
                (Some(t), Some(c)) => Some(format!("{} at {}", t, c)),
                (Some(t), None) => Some(t),
                (None, Some(c)) => Some(c),
                (None, None) => None,
            };
            let bullets = join_present(exp.bullets.iter().map(|b| clean_opt(Some(b))), ". ");
            match (role, bullets) {
                (Some(r), Some(b)) => Some(format!("{}: {}", r, b)),
                (r, b) => r.or(b),
            }
        }),
        "; ",
    );
    if let Some(experiences) = experiences {
        sections.push(format!("Experience: {}", experiences));
    }

    let education = join_present(
        profile.education.iter().map(|edu| {
            let degree = match (
                clean_opt(edu.degree.as_deref()),
                clean_opt(edu.field_of_study.as_deref()),
            ) {
                (Some(d), Some(f)) => Some(format!("{} in {}", d, f)),
                (d, f) => d.or(f),
            };
            join_present([degree, clean_opt(Some(&edu.institution))], ", ")
        }),
        "; ",
    );
    if let Some(education) = education {
        sections.push(format!("Education: {}", education));
    }

    let projects = join_present(
        profile.projects.iter().map(|project| {
            let head = match (
                clean_opt(Some(&project.name)),
                clean_opt(project.description.as_deref()),
            ) {
                (Some(n), Some(d)) => Some(format!("{}: {}", n, d)),
                (n, d) => n.or(d),
            };
            let tech = join_present(
                project.technologies.iter().map(|t| clean_opt(Some(t))),
                ", ",
            );
            match (head, tech) {
                (Some(h), Some(t)) => Some(format!("{} ({})", h, t)),
                (h, t) => h.or(t),
            }
        }),
        "; ",
    );
    if let Some(projects) = projects {
        sections.push(format!("Projects: {}", projects));
    }

    sections.join("\n")
}

/// Generate a content hash for the embedded text
pub fn hash_text(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Result of indexing a single candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexedCandidate {
    pub candidate_id: CandidateId,
    pub dimensions: usize,
    pub source_hash: String,
}

/// Outcome counts of a batch run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub successful: usize,
    pub failed: usize,
    pub failures: Vec<(CandidateId, String)>,
}

/// Builds and stores candidate embeddings
pub struct CandidateIndexer {
    store: Arc<dyn RecruitingStore>,
    embedder: Arc<dyn Embedder>,
}

impl CandidateIndexer {
    pub fn new(store: Arc<dyn RecruitingStore>, embedder: Arc<dyn Embedder>) -> Self {
        Self { store, embedder }
    }

    /// Embed one candidate and overwrite its stored vector
    ///
    /// An empty profile fails without calling the embedding service.
    pub async fn index_candidate(&self, candidate_id: &CandidateId) -> Result<IndexedCandidate> {
        let profile = self.store.load_profile(candidate_id).await?;
        let text = build_profile_text(&profile);

        if text.trim().is_empty() {
            return Err(ScreeningError::EmptyProfile {
                candidate_id: candidate_id.clone(),
            });
        }

        let embedding = self.embedder.embed(&text).await?;
        if embedding.is_empty() {
            return Err(ScreeningError::EmbeddingError(format!(
                "Empty vector returned for candidate {}",
                candidate_id
            )));
        }

        let source_hash = hash_text(&text);
        let dimensions = embedding.len();
        self.store
            .upsert_embedding(&NewCandidateEmbedding {
                candidate_id: candidate_id.clone(),
                embedding,
                model: self.embedder.model().to_string(),
                source_hash: source_hash.clone(),
            })
            .await?;

        info!(
            "Indexed candidate {} ({} dims, {} chars)",
            candidate_id,
            dimensions,
            text.len()
        );

        Ok(IndexedCandidate {
            candidate_id: candidate_id.clone(),
            dimensions,
            source_hash,
        })
    }

    /// Index candidates one after another
    ///
    /// A failing candidate is counted and the batch moves on; nothing is retried.
    pub async fn index_batch(&self, candidate_ids: &[CandidateId]) -> BatchReport {
        let mut report = BatchReport::default();

        for candidate_id in candidate_ids {
            match self.index_candidate(candidate_id).await {
                Ok(_) => report.successful += 1,
                Err(e) => {
                    warn!("Indexing failed for candidate {}: {}", candidate_id, e);
                    report.failed += 1;
                    report.failures.push((candidate_id.clone(), e.to_string()));
                }
            }
        }

        info!(
            "Indexing batch finished: {} successful, {} failed",
            report.successful, report.failed
        );
        report
    }

    /// Index every candidate in the store, `page_size` ids at a time
    pub async fn index_all(&self, page_size: i64) -> Result<BatchReport> {
        let mut report = BatchReport::default();
        let mut after: Option<CandidateId> = None;

        loop {
            let page = self
                .store
                .list_candidate_ids(after.as_ref(), page_size)
                .await?;
            let Some(last) = page.last().cloned() else {
                break;
            };

            let page_report = self.index_batch(&page).await;
            report.successful += page_report.successful;
            report.failed += page_report.failed;
            report.failures.extend(page_report.failures);

            if (page.len() as i64) < page_size {
                break;
            }
            after = Some(last);
        }

        Ok(report)
    }
}
