//! Prompt construction and response parsing for model-backed scoring

use crate::error::{Result, ScreeningError};
use crate::scoring::{CandidatePayload, RolePayload, ScoreResult};

/// System prompt describing the verdict schema
pub const SYSTEM_PROMPT: &str = r#"You are an experienced technical recruiter screening candidates for a role.
Evaluate the candidate strictly against the role requirements and respond with a single JSON object:

{
  "score_total": number between 0 and 100,
  "score_breakdown": { "<dimension>": number, ... },
  "must_haves_satisfied": [ "<must-have skill the candidate clearly has>", ... ],
  "missing_must_haves": [ "<must-have skill the candidate lacks>", ... ],
  "knockout": true if any knockout criterion disqualifies the candidate,
  "reasons": "short paragraph explaining the score",
  "flags": { "<flag name>": true/false or short string, ... }
}

Every entry of the role's must_have_skills must appear in exactly one of
must_haves_satisfied or missing_must_haves, spelled as in the role.
Do not include any text outside the JSON object."#;

/// Build the user message carrying both payloads
pub fn build_user_prompt(candidate: &CandidatePayload, role: &RolePayload) -> Result<String> {
    let role_json = serde_json::to_string_pretty(role)?;
    let candidate_json = serde_json::to_string_pretty(candidate)?;

    Ok(format!(
        r#"## Role

```json
{role_json}
```

## Candidate

```json
{candidate_json}
```

Score this candidate for the role."#
    ))
}

/// Characters of a malformed response kept in the error message
const RESPONSE_EXCERPT_CHARS: usize = 300;

/// Parse a model response into a normalized [`ScoreResult`]
///
/// JSON mode normally yields a bare object, but code fences or prose around
/// it are tolerated: only the outermost `{ .. }` span is parsed. Malformed
/// output surfaces as [`ScreeningError::ScoringError`] so the task is retried
/// rather than stored.
pub fn parse_score_response(response: &str) -> Result<ScoreResult> {
    let object = object_span(response).ok_or_else(|| {
        ScreeningError::ScoringError(format!(
            "Scoring response contains no JSON object: {}",
            excerpt(response)
        ))
    })?;

    let result: ScoreResult = serde_json::from_str(object).map_err(|e| {
        ScreeningError::ScoringError(format!(
            "Failed to parse scoring response: {}. Response: {}",
            e,
            excerpt(response)
        ))
    })?;

    result.normalized()
}

fn object_span(response: &str) -> Option<&str> {
    let start = response.find('{')?;
    let end = response.rfind('}')?;
    (start < end).then(|| &response[start..=end])
}

fn excerpt(response: &str) -> String {
    let mut chars = response.chars();
    let head: String = chars.by_ref().take(RESPONSE_EXCERPT_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
