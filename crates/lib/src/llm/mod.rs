//! AI classification backends.
//!
//! A backend receives the raw message plus the intent schema and returns a
//! structured verdict. Ollama (native `/api/chat`) and any OpenAI-compatible
//! server (`/v1/chat/completions`, e.g. LM Studio) are supported.

mod ollama;
mod openai;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use crate::nlu::intent::IntentKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("llm api error: {0}")]
    Api(String),
    #[error("llm response could not be parsed: {0}")]
    Parse(String),
}

/// One chat message in the request sent to a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// The intents a backend may answer with, each with a short description.
#[derive(Debug, Clone)]
pub struct IntentSchema {
    pub intents: Vec<(String, String)>,
}

impl IntentSchema {
    /// Schema covering every known intent.
    pub fn known() -> Self {
        Self {
            intents: IntentKind::KNOWN
                .iter()
                .map(|k| (k.label().to_string(), k.description().to_string()))
                .collect(),
        }
    }

    /// Fixed instruction set sent as the system message.
    pub fn instructions(&self) -> String {
        let mut out = String::from(
            "You classify messages sent to a Brazilian football (soccer) assistant. \
             Messages are usually in Portuguese.\n\nKnown intents:\n",
        );
        for (label, description) in &self.intents {
            out.push_str("- ");
            out.push_str(label);
            out.push_str(": ");
            out.push_str(description);
            out.push('\n');
        }
        out.push_str(
            "\nAnswer with a single JSON object and nothing else:\n\
             {\"intent\": \"<one of the known intents>\", \"confidence\": <0.0-1.0>, \
             \"entities\": {\"team\": null, \"competition\": null, \"player\": null, \
             \"homeTeam\": null, \"awayTeam\": null}, \"reasoning\": \"<short>\"}\n\
             Use null for entities that are not mentioned. If no intent fits, use the \
             closest one with a low confidence.",
        );
        out
    }
}

/// Entities as named by the backend (free text, not yet resolved).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiEntities {
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub competition: Option<String>,
    #[serde(default)]
    pub player: Option<String>,
    #[serde(default)]
    pub home_team: Option<String>,
    #[serde(default)]
    pub away_team: Option<String>,
}

/// Structured answer from a backend. `intent` is an unvalidated label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiVerdict {
    pub intent: String,
    #[serde(default)]
    pub confidence: f32,
    #[serde(default)]
    pub entities: AiEntities,
    #[serde(default)]
    pub reasoning: String,
}

/// Parse the JSON object out of a model reply (tolerates code fences and surrounding prose).
pub fn parse_verdict(content: &str) -> Result<AiVerdict, LlmError> {
    let start = content
        .find('{')
        .ok_or_else(|| LlmError::Parse("no JSON object in reply".to_string()))?;
    let end = content
        .rfind('}')
        .filter(|end| *end > start)
        .ok_or_else(|| LlmError::Parse("unterminated JSON object in reply".to_string()))?;
    serde_json::from_str(&content[start..=end]).map_err(|e| LlmError::Parse(e.to_string()))
}

/// External intent classification service.
#[async_trait]
pub trait ClassificationBackend: Send + Sync {
    /// Backend name for logs ("ollama", "openai").
    fn name(&self) -> &str;

    async fn classify(&self, text: &str, schema: &IntentSchema) -> Result<AiVerdict, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_fenced_reply() {
        let reply = "```json\n{\"intent\":\"next_match\",\"confidence\":0.82,\"entities\":{\"team\":\"Flamengo\"},\"reasoning\":\"asks for next game\"}\n```";
        let v = parse_verdict(reply).unwrap();
        assert_eq!(v.intent, "next_match");
        assert_eq!(v.entities.team.as_deref(), Some("Flamengo"));
        assert!((v.confidence - 0.82).abs() < 1e-6);
    }

    #[test]
    fn missing_fields_default() {
        let v = parse_verdict("{\"intent\":\"greeting\"}").unwrap();
        assert_eq!(v.confidence, 0.0);
        assert_eq!(v.entities, AiEntities::default());
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(parse_verdict("I think it's a greeting"), Err(LlmError::Parse(_))));
        assert!(matches!(parse_verdict("} {"), Err(LlmError::Parse(_))));
    }

    #[test]
    fn instructions_list_every_intent() {
        let text = IntentSchema::known().instructions();
        for kind in IntentKind::KNOWN {
            assert!(text.contains(kind.label()), "missing {}", kind);
        }
    }
}
