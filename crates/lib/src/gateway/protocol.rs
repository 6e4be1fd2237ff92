//! Gateway wire types: webhook acknowledgements and request bodies.

use crate::channels::{FilterReason, IgnoreReason};
use crate::nlu::intent::IntentKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Processed,
    Filtered,
    Ignored,
    Error,
}

/// Webhook response body. `success` is false only when the body was not JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub success: bool,
    pub status: AckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<IntentKind>,
    /// Reply text, returned inline for web widget events.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn label<T: Serialize>(value: &T) -> Option<String> {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
}

impl Ack {
    fn new(success: bool, status: AckStatus) -> Self {
        Self {
            success,
            status,
            reason: None,
            intent: None,
            reply: None,
            error: None,
        }
    }

    pub fn processed(intent: IntentKind, reply: Option<String>) -> Self {
        Self {
            intent: Some(intent),
            reply,
            ..Self::new(true, AckStatus::Processed)
        }
    }

    pub fn filtered(reason: &FilterReason) -> Self {
        Self {
            reason: label(reason),
            ..Self::new(true, AckStatus::Filtered)
        }
    }

    pub fn ignored(reason: &IgnoreReason) -> Self {
        Self {
            reason: label(reason),
            ..Self::new(true, AckStatus::Ignored)
        }
    }

    pub fn invalid_body(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(false, AckStatus::Error)
        }
    }
}

/// Body of `POST /simulate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulateParams {
    pub user_id: String,
    pub message: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Response of `POST /simulate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulateReply {
    pub reply: String,
}

/// Response of `POST /admin/reload-aliases`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReloadReply {
    pub ok: bool,
    pub teams: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filtered_ack_shape() {
        let v = serde_json::to_value(Ack::filtered(&FilterReason::FromSelf)).unwrap();
        assert_eq!(v["success"], true);
        assert_eq!(v["status"], "filtered");
        assert_eq!(v["reason"], "from_self");
        assert!(v.get("reply").is_none());
    }

    #[test]
    fn processed_ack_carries_intent() {
        let v = serde_json::to_value(Ack::processed(IntentKind::NextMatch, Some("x".into()))).unwrap();
        assert_eq!(v["intent"], "next_match");
        assert_eq!(v["reply"], "x");
    }
}
