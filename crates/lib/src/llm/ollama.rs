//! Ollama API client (http://127.0.0.1:11434 by default).
//! Classification uses non-streaming `/api/chat` with `format: "json"`.

use super::{parse_verdict, AiVerdict, ChatMessage, ClassificationBackend, IntentSchema, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:11434";
const DEFAULT_MODEL: &str = "llama3.2:latest";

/// Client for Ollama HTTP API.
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(base_url: Option<String>, model: Option<String>) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// POST /api/chat, non-streaming.
    pub async fn chat(&self, messages: Vec<ChatMessage>, json: bool) -> Result<ChatResponse, LlmError> {
        let url = format!("{}/api/chat", self.base_url);
        let body = ChatRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            format: json.then(|| "json".to_string()),
            options: ChatOptions { temperature: 0.0 },
        };
        let res = self.client.post(&url).json(&body).send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{} {}", status, body)));
        }
        let data: ChatResponse = res.json().await?;
        Ok(data)
    }
}

#[async_trait]
impl ClassificationBackend for OllamaClient {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn classify(&self, text: &str, schema: &IntentSchema) -> Result<AiVerdict, LlmError> {
        let messages = vec![
            ChatMessage::system(schema.instructions()),
            ChatMessage::user(text),
        ];
        let res = self.chat(messages, true).await?;
        parse_verdict(res.content())
    }
}

#[derive(Debug, Serialize)]
struct ChatOptions {
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    options: ChatOptions,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub message: Option<ChatMessage>,
    #[serde(default)]
    pub done: bool,
}

impl ChatResponse {
    /// Text content of the assistant message, if any.
    pub fn content(&self) -> &str {
        self.message
            .as_ref()
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_trailing_slash() {
        let c = OllamaClient::new(Some("http://gpu-box:11434/".into()), Some("  ".into()));
        assert_eq!(c.base_url, "http://gpu-box:11434");
        assert_eq!(c.model(), DEFAULT_MODEL);
    }

    #[test]
    fn request_asks_for_json() {
        let body = ChatRequest {
            model: "qwen3:8b".into(),
            messages: vec![ChatMessage::user("oi")],
            stream: false,
            format: Some("json".into()),
            options: ChatOptions { temperature: 0.0 },
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["format"], "json");
        assert_eq!(v["stream"], false);
    }

    #[test]
    fn response_content() {
        let r: ChatResponse =
            serde_json::from_str(r#"{"message":{"role":"assistant","content":"{}"},"done":true}"#).unwrap();
        assert_eq!(r.content(), "{}");
    }
}
