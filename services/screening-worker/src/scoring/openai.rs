//! OpenAI chat-completion scorer

use crate::error::{Result, ScreeningError};
use crate::scoring::prompt::{build_user_prompt, parse_score_response, SYSTEM_PROMPT};
use crate::scoring::{CandidatePayload, RolePayload, ScoreResult, Scorer};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use tracing::debug;

/// Default chat model used for scoring
pub const DEFAULT_SCORING_MODEL: &str = "gpt-4o-mini";

/// Scorer that asks an OpenAI chat model for a JSON verdict
pub struct OpenAiScorer {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiScorer {
    /// Create a new scorer
    ///
    /// # Arguments
    /// * `api_key` - OpenAI API key
    /// * `model` - Chat model name (e.g., "gpt-4o-mini")
    pub fn new(api_key: &str, model: &str) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl Scorer for OpenAiScorer {
    fn name(&self) -> &str {
        &self.model
    }

    async fn evaluate(
        &self,
        candidate: &CandidatePayload,
        role: &RolePayload,
    ) -> Result<ScoreResult> {
        let user_prompt = build_user_prompt(candidate, role)?;
        debug!(
            "Scoring prompt for candidate {} / role {}: {} chars",
            candidate.id,
            role.id,
            user_prompt.len()
        );

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .temperature(self.temperature)
            .response_format(ResponseFormat::JsonObject)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_prompt)
                    .build()?
                    .into(),
            ])
            .build()?;

        let response = self.client.chat().create(request).await?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ScreeningError::ScoringError("Empty scoring response".to_string()))?;

        parse_score_response(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{CandidateId, RoleId};

    #[tokio::test]
    #[ignore] // Requires API key
    async fn test_evaluate_live() {
        dotenvy::dotenv().ok();
        let api_key = std::env::var("OPENAI_API_KEY").unwrap();
        let scorer = OpenAiScorer::new(&api_key, DEFAULT_SCORING_MODEL);

        let candidate = CandidatePayload {
            id: CandidateId::from("C1"),
            name: "Test Candidate".into(),
            headline: Some("Rust engineer".into()),
            summary: None,
            location: None,
            work_authorization: None,
            availability: None,
            salary_expectation: None,
            salary_currency: None,
            experiences: vec![],
            education: vec![],
            certifications: vec![],
            skills: vec![],
        };
        let role = RolePayload {
            id: RoleId::from("R1"),
            title: "Rust Engineer".into(),
            description: None,
            location: None,
            employment_type: None,
            seniority: None,
            must_have_skills: vec!["Rust".into()],
            nice_to_have_skills: vec![],
            salary_min: None,
            salary_max: None,
            salary_currency: None,
            knockout_criteria: None,
            scoring_weights: None,
        };

        let result = scorer.evaluate(&candidate, &role).await.unwrap();
        assert!((0.0..=100.0).contains(&result.score_total));
    }
}
