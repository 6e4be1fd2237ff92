//! Inbound message from a channel, after payload normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where a message came from. Follow-up menus are only sent to the messaging app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OriginChannel {
    MessagingApp,
    WebWidget,
}

/// A user message ready for dispatch.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub sender_id: String,
    pub text: String,
    pub display_name: Option<String>,
    pub origin: OriginChannel,
    pub received_at: DateTime<Utc>,
    /// Text is a list row / button id rather than typed text.
    pub selection: bool,
}

impl InboundMessage {
    pub fn new(sender_id: impl Into<String>, text: impl Into<String>, origin: OriginChannel) -> Self {
        Self {
            sender_id: sender_id.into(),
            text: text.into(),
            display_name: None,
            origin,
            received_at: Utc::now(),
            selection: false,
        }
    }

    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name.filter(|n| !n.trim().is_empty());
        self
    }

    /// First name for greetings ("Maria Souza" -> "Maria").
    pub fn first_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .and_then(|n| n.split_whitespace().next())
    }
}
