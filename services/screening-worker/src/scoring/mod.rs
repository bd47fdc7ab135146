//! Candidate-vs-role scoring
//!
//! The worker only depends on the [`Scorer`] trait. Two implementations ship:
//! - [`OpenAiScorer`]: asks a chat model for a JSON verdict
//! - [`HeuristicScorer`]: deterministic skill/experience coverage, used offline

pub mod heuristic;
pub mod openai;
pub mod payload;
pub mod prompt;

pub use heuristic::HeuristicScorer;
pub use openai::OpenAiScorer;
pub use payload::{CandidatePayload, RolePayload};

use crate::error::{Result, ScreeningError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Highest score a screening can carry
pub const MAX_SCORE: f64 = 100.0;

/// Scoring service contract
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Short identifier stored alongside each screening
    fn name(&self) -> &str;

    /// Evaluate one candidate against one role
    async fn evaluate(&self, candidate: &CandidatePayload, role: &RolePayload)
        -> Result<ScoreResult>;
}

/// Result returned by a scorer, persisted as a screening row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub score_total: f64,
    #[serde(default = "empty_object")]
    pub score_breakdown: Value,
    #[serde(default)]
    pub must_haves_satisfied: Vec<String>,
    #[serde(default)]
    pub missing_must_haves: Vec<String>,
    #[serde(default)]
    pub knockout: bool,
    #[serde(default)]
    pub reasons: String,
    #[serde(default = "empty_object")]
    pub flags: Value,
}

fn empty_object() -> Value {
    Value::Object(Default::default())
}

impl ScoreResult {
    /// Clamp the total into `0..=MAX_SCORE` and replace null objects.
    ///
    /// A non-finite total can't be stored meaningfully and is rejected.
    pub fn normalized(mut self) -> Result<Self> {
        if !self.score_total.is_finite() {
            return Err(ScreeningError::ScoringError(format!(
                "score_total is not a finite number: {}",
                self.score_total
            )));
        }
        self.score_total = self.score_total.clamp(0.0, MAX_SCORE);
        if self.score_breakdown.is_null() {
            self.score_breakdown = empty_object();
        }
        if self.flags.is_null() {
            self.flags = empty_object();
        }
        Ok(self)
    }
}
