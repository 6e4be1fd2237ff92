//! Outbound transport: text replies and option-list menus.

use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuOption {
    /// Quick-action token echoed back when the user picks the option.
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuPayload {
    pub title: String,
    pub body: String,
    pub button_label: String,
    pub options: Vec<MenuOption>,
}

/// Sends messages to a user. Failures are reported as `false` and never retried.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn send(&self, user: &str, text: &str) -> bool;

    async fn send_menu(&self, user: &str, menu: &MenuPayload) -> bool;
}

/// Messaging gateway over HTTP (`POST {base}/send-text`, `POST {base}/send-option-list`).
pub struct HttpResponder {
    base_url: String,
    token: Option<String>,
    client: reqwest::Client,
}

impl HttpResponder {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
            client: reqwest::Client::new(),
        }
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(), String> {
        let url = format!("{}/{}", self.base_url, path);
        let mut req = self.client.post(&url).json(&body);
        if let Some(token) = &self.token {
            req = req.header("Client-Token", token);
        }
        let res = req.send().await.map_err(|e| e.to_string())?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(format!("{} failed: {} {}", path, status, body));
        }
        Ok(())
    }
}

#[async_trait]
impl Responder for HttpResponder {
    async fn send(&self, user: &str, text: &str) -> bool {
        let body = serde_json::json!({ "phone": user, "message": text });
        match self.post("send-text", body).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("responder: send to {} failed: {}", user, e);
                false
            }
        }
    }

    async fn send_menu(&self, user: &str, menu: &MenuPayload) -> bool {
        let body = serde_json::json!({
            "phone": user,
            "message": menu.body,
            "optionList": {
                "title": menu.title,
                "buttonLabel": menu.button_label,
                "options": menu.options,
            }
        });
        match self.post("send-option-list", body).await {
            Ok(()) => true,
            Err(e) => {
                log::warn!("responder: menu to {} failed: {}", user, e);
                false
            }
        }
    }
}

/// Responder used when no messaging gateway is configured: writes to the log.
#[derive(Debug, Default)]
pub struct LogResponder;

#[async_trait]
impl Responder for LogResponder {
    async fn send(&self, user: &str, text: &str) -> bool {
        log::info!("responder: -> {}: {}", user, text);
        true
    }

    async fn send_menu(&self, user: &str, menu: &MenuPayload) -> bool {
        log::info!(
            "responder: menu -> {}: {} ({} options)",
            user,
            menu.title,
            menu.options.len()
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_serializes_camel_case() {
        let menu = MenuPayload {
            title: "Menu".into(),
            body: "Escolha".into(),
            button_label: "Ver opções".into(),
            options: vec![MenuOption {
                id: "qa:standings".into(),
                title: "Tabela".into(),
                description: None,
            }],
        };
        let v = serde_json::to_value(&menu).unwrap();
        assert_eq!(v["buttonLabel"], "Ver opções");
        assert_eq!(v["options"][0]["id"], "qa:standings");
        assert!(v["options"][0].get("description").is_none());
    }

    #[tokio::test]
    async fn unreachable_gateway_reports_false() {
        let r = HttpResponder::new("http://127.0.0.1:1/", None);
        assert!(!r.send("5511999990000", "oi").await);
    }
}
