//! OpenAI-compatible client (`/v1/chat/completions`), e.g. LM Studio or a hosted API.
//!
//! Classification requests `response_format: json_object`; the API key is sent
//! as a bearer token when configured.

use super::{parse_verdict, AiVerdict, ChatMessage, ClassificationBackend, IntentSchema, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:1234/v1";
const DEFAULT_MODEL: &str = "gpt-oss-20b";

#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl OpenAiClient {
    pub fn new(base_url: Option<String>, model: Option<String>, api_key: Option<String>) -> Self {
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
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// POST /chat/completions, non-streaming; returns the first choice's content.
    pub async fn chat(&self, messages: Vec<ChatMessage>, json: bool) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = OpenAiChatRequest {
            model: self.model.clone(),
            messages,
            stream: false,
            temperature: 0.0,
            response_format: json.then(|| ResponseFormat {
                typ: "json_object".to_string(),
            }),
        };
        let mut req = self.client.post(&url).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }
        let res = req.send().await?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{} {}", status, body)));
        }
        let data: OpenAiChatResponse = res.json().await?;
        data.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| LlmError::Api("response had no choices".to_string()))
    }
}

#[async_trait]
impl ClassificationBackend for OpenAiClient {
    fn name(&self) -> &str {
        "openai"
    }

    async fn classify(&self, text: &str, schema: &IntentSchema) -> Result<AiVerdict, LlmError> {
        let messages = vec![
            ChatMessage::system(schema.instructions()),
            ChatMessage::user(text),
        ];
        let content = self.chat(messages, true).await?;
        parse_verdict(&content)
    }
}

// --- OpenAI wire types ---

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    typ: String,
}

#[derive(Debug, Serialize)]
struct OpenAiChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    #[serde(default)]
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_api_key_is_dropped() {
        let c = OpenAiClient::new(None, None, Some(" ".into()));
        assert!(c.api_key.is_none());
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
        assert_eq!(c.model(), DEFAULT_MODEL);
    }

    #[test]
    fn request_wire_format() {
        let body = OpenAiChatRequest {
            model: "m".into(),
            messages: vec![ChatMessage::system("s"), ChatMessage::user("u")],
            stream: false,
            temperature: 0.0,
            response_format: Some(ResponseFormat {
                typ: "json_object".into(),
            }),
        };
        let v = serde_json::to_value(&body).unwrap();
        assert_eq!(v["response_format"]["type"], "json_object");
        assert_eq!(v["messages"][0]["role"], "system");
    }

    #[test]
    fn response_first_choice() {
        let r: OpenAiChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"{\"intent\":\"help\"}"}}]}"#,
        )
        .unwrap();
        assert_eq!(r.choices[0].message.content.as_deref(), Some("{\"intent\":\"help\"}"));
    }
}
