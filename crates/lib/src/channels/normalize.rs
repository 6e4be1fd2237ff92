//! Inbound payload normalization and anti-loop filtering.
//!
//! Webhook bodies arrive in several loosely structured shapes depending on the
//! messaging gateway (flat callbacks, event envelopes, the web widget). Known
//! shapes are read through typed structs; anything else goes through a
//! depth-first walker, and a regex pass over the serialized body is the last
//! resort. Normalization never fails: every payload ends as a message, a
//! filtered event or an ignored one.

use crate::channels::inbound::{InboundMessage, OriginChannel};
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event types that carry a new user message.
const NEW_MESSAGE_TYPES: &[&str] = &[
    "receivedcallback",
    "messages.upsert",
    "messages_upsert",
    "message",
    "message.received",
];

/// Delivery / read receipt event types.
const RECEIPT_TYPES: &[&str] = &[
    "messagestatuscallback",
    "deliverycallback",
    "readcallback",
    "messages.update",
    "messages_update",
    "message-receipt.update",
    "message.ack",
];

const STATUS_TYPES: &[&str] = &["status", "status.update", "statuscallback", "status_update"];

const STATUS_BROADCAST_JID: &str = "status@broadcast";
const GROUP_JID_SUFFIX: &str = "@g.us";

const SENDER_KEYS: &[&str] = &["phone", "from", "sender", "remoteJid", "userId", "chatId"];
const TEXT_KEYS: &[&str] = &["message", "text", "body", "conversation", "content", "caption"];
const SELECTION_KEYS: &[&str] = &["selectedRowId", "buttonId", "selectedButtonId"];
const NAME_KEYS: &[&str] = &["senderName", "pushName", "name", "chatName"];

/// Minimum digit count for an id to be treated as a phone number.
const MIN_PHONE_DIGITS: usize = 8;

/// Bot-owned identities used by the anti-loop filters.
#[derive(Debug, Clone, Default)]
pub struct LoopGuard {
    /// Sender ids owned by the bot (phone numbers; compared digits-only).
    pub bot_ids: Vec<String>,
    /// Messages starting with this marker were produced by the system itself.
    pub system_marker: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterReason {
    FromSelf,
    StatusEvent,
    Receipt,
    NonMessageEvent,
    BotSender,
    SystemMarker,
    Group,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    NotAnObject,
    NoSender,
    NoText,
}

#[derive(Debug, Clone)]
pub enum Normalized {
    Message(InboundMessage),
    Filtered(FilterReason),
    Ignored(IgnoreReason),
}

/// Flat gateway callback (`{"type":"ReceivedCallback","phone":..,"text":{"message":..}}`).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct CallbackPayload {
    phone: Option<Value>,
    sender_name: Option<String>,
    chat_name: Option<String>,
    text: Option<TextField>,
    list_response_message: Option<SelectionField>,
    buttons_response_message: Option<SelectionField>,
}

/// Event envelope (`{"event":"messages.upsert","data":{"key":..,"message":..}}`).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct EnvelopePayload {
    data: EnvelopeData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct EnvelopeData {
    key: EnvelopeKey,
    push_name: Option<String>,
    message: Option<EnvelopeMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct EnvelopeKey {
    remote_jid: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct EnvelopeMessage {
    conversation: Option<String>,
    extended_text_message: Option<ExtendedText>,
    list_response_message: Option<SelectionField>,
    buttons_response_message: Option<SelectionField>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ExtendedText {
    text: Option<String>,
}

/// Web widget post (`{"channel":"web","userId":..,"message":..}`).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WidgetPayload {
    user_id: Option<Value>,
    session_id: Option<Value>,
    message: Option<String>,
    text: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TextField {
    Plain(String),
    Wrapped {
        #[serde(default)]
        message: Option<String>,
    },
}

/// List row or button reply; gateways disagree on the field name.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SelectionField {
    selected_row_id: Option<String>,
    button_id: Option<String>,
    selected_button_id: Option<String>,
    single_select_reply: Option<SingleSelectReply>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SingleSelectReply {
    selected_row_id: Option<String>,
}

impl SelectionField {
    fn id(&self) -> Option<String> {
        [
            self.selected_row_id.as_deref(),
            self.single_select_reply
                .as_ref()
                .and_then(|r| r.selected_row_id.as_deref()),
            self.button_id.as_deref(),
            self.selected_button_id.as_deref(),
        ]
        .into_iter()
        .flatten()
        .find_map(non_blank)
    }
}

enum KnownPayload {
    Callback(CallbackPayload),
    Envelope(EnvelopePayload),
    Widget(WidgetPayload),
    Unrecognized,
}

/// Fields pulled out of a payload; each is set at most once.
#[derive(Debug, Default)]
struct Extracted {
    sender: Option<String>,
    text: Option<String>,
    name: Option<String>,
    selection: Option<String>,
}

impl Extracted {
    fn fill_from(&mut self, other: Extracted) {
        self.sender = self.sender.take().or(other.sender);
        self.text = self.text.take().or(other.text);
        self.name = self.name.take().or(other.name);
        self.selection = self.selection.take().or(other.selection);
    }
}

pub struct PayloadNormalizer {
    guard: LoopGuard,
    bot_ids: Vec<String>,
    phone_re: Option<Regex>,
    text_re: Option<Regex>,
}

impl PayloadNormalizer {
    pub fn new(guard: LoopGuard) -> Self {
        let bot_ids = guard
            .bot_ids
            .iter()
            .map(|id| normalize_sender(id))
            .filter(|id| !id.is_empty())
            .collect();
        Self {
            guard,
            bot_ids,
            phone_re: compile(r#""phone"\s*:\s*"([^"]+)""#),
            text_re: compile(r#""(?:message|text|body)"\s*:\s*"((?:[^"\\]|\\.)*)""#),
        }
    }

    pub fn normalize(&self, payload: &Value) -> Normalized {
        let Some(obj) = payload.as_object() else {
            return Normalized::Ignored(IgnoreReason::NotAnObject);
        };

        if any_flag(payload, "fromMe") {
            return Normalized::Filtered(FilterReason::FromSelf);
        }
        if any_flag(payload, "isStatusReply") || any_string(payload, STATUS_BROADCAST_JID) {
            return Normalized::Filtered(FilterReason::StatusEvent);
        }
        let event_type = obj
            .get("type")
            .or_else(|| obj.get("event"))
            .and_then(Value::as_str)
            .map(|t| t.trim().to_ascii_lowercase());
        if let Some(t) = event_type.as_deref() {
            if STATUS_TYPES.contains(&t) {
                return Normalized::Filtered(FilterReason::StatusEvent);
            }
            if RECEIPT_TYPES.contains(&t) {
                return Normalized::Filtered(FilterReason::Receipt);
            }
            if !NEW_MESSAGE_TYPES.contains(&t) {
                return Normalized::Filtered(FilterReason::NonMessageEvent);
            }
        }
        if any_flag(payload, "isGroup") || any_string_ending(payload, GROUP_JID_SUFFIX) {
            return Normalized::Filtered(FilterReason::Group);
        }

        let (mut fields, origin) = match detect(payload) {
            KnownPayload::Callback(p) => (from_callback(p), OriginChannel::MessagingApp),
            KnownPayload::Envelope(p) => (from_envelope(p), OriginChannel::MessagingApp),
            KnownPayload::Widget(p) => (from_widget(p), OriginChannel::WebWidget),
            KnownPayload::Unrecognized => (Extracted::default(), OriginChannel::MessagingApp),
        };
        if fields.sender.is_none() || (fields.text.is_none() && fields.selection.is_none()) {
            let mut walked = Extracted::default();
            walk(payload, &mut walked);
            fields.fill_from(walked);
        }
        if fields.sender.is_none() || (fields.text.is_none() && fields.selection.is_none()) {
            fields.fill_from(self.regex_fallback(payload));
        }

        let Some(sender) = fields.sender.map(|s| normalize_sender(&s)).filter(|s| !s.is_empty())
        else {
            log::debug!("normalize: no sender in payload");
            return Normalized::Ignored(IgnoreReason::NoSender);
        };
        if self.bot_ids.contains(&sender) {
            return Normalized::Filtered(FilterReason::BotSender);
        }

        let (text, selection) = match fields.selection {
            Some(id) => (id, true),
            None => match fields.text {
                Some(text) => (text, false),
                None => {
                    log::debug!("normalize: no text from {}", sender);
                    return Normalized::Ignored(IgnoreReason::NoText);
                }
            },
        };
        if let Some(marker) = self.guard.system_marker.as_deref().filter(|m| !m.is_empty()) {
            if text.starts_with(marker) {
                return Normalized::Filtered(FilterReason::SystemMarker);
            }
        }

        Normalized::Message(InboundMessage {
            sender_id: sender,
            text,
            display_name: fields.name,
            origin,
            received_at: Utc::now(),
            selection,
        })
    }

    fn regex_fallback(&self, payload: &Value) -> Extracted {
        let raw = payload.to_string();
        let capture = |re: &Option<Regex>| {
            re.as_ref()
                .and_then(|re| re.captures(&raw))
                .and_then(|c| c.get(1))
                .and_then(|m| serde_json::from_str::<String>(&format!("\"{}\"", m.as_str())).ok())
                .and_then(|s| non_blank(&s))
        };
        Extracted {
            sender: capture(&self.phone_re),
            text: capture(&self.text_re),
            ..Default::default()
        }
    }
}

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            log::warn!("normalize: invalid fallback pattern {}: {}", pattern, e);
            None
        }
    }
}

fn detect(payload: &Value) -> KnownPayload {
    let shape = if payload.get("channel").and_then(Value::as_str) == Some("web") {
        serde_json::from_value(payload.clone()).map(KnownPayload::Widget)
    } else if payload
        .get("data")
        .is_some_and(|d| d.get("key").is_some() || d.get("message").is_some())
    {
        serde_json::from_value(payload.clone()).map(KnownPayload::Envelope)
    } else if payload.get("phone").is_some() {
        serde_json::from_value(payload.clone()).map(KnownPayload::Callback)
    } else {
        return KnownPayload::Unrecognized;
    };
    shape.unwrap_or_else(|e| {
        log::debug!("normalize: known shape did not parse ({}), walking payload", e);
        KnownPayload::Unrecognized
    })
}

fn from_callback(p: CallbackPayload) -> Extracted {
    let text = match p.text {
        Some(TextField::Plain(s)) => non_blank(&s),
        Some(TextField::Wrapped { message }) => message.as_deref().and_then(non_blank),
        None => None,
    };
    Extracted {
        sender: p.phone.as_ref().and_then(scalar),
        text,
        name: p
            .sender_name
            .as_deref()
            .and_then(non_blank)
            .or_else(|| p.chat_name.as_deref().and_then(non_blank)),
        selection: p
            .list_response_message
            .as_ref()
            .and_then(SelectionField::id)
            .or_else(|| p.buttons_response_message.as_ref().and_then(SelectionField::id)),
    }
}

fn from_envelope(p: EnvelopePayload) -> Extracted {
    let data = p.data;
    let message = data.message.unwrap_or_default();
    let text = message
        .conversation
        .as_deref()
        .and_then(non_blank)
        .or_else(|| {
            message
                .extended_text_message
                .as_ref()
                .and_then(|e| e.text.as_deref())
                .and_then(non_blank)
        });
    Extracted {
        sender: data.key.remote_jid.as_deref().and_then(non_blank),
        text,
        name: data.push_name.as_deref().and_then(non_blank),
        selection: message
            .list_response_message
            .as_ref()
            .and_then(SelectionField::id)
            .or_else(|| message.buttons_response_message.as_ref().and_then(SelectionField::id)),
    }
}

fn from_widget(p: WidgetPayload) -> Extracted {
    Extracted {
        sender: p
            .user_id
            .as_ref()
            .and_then(scalar)
            .or_else(|| p.session_id.as_ref().and_then(scalar)),
        text: p
            .message
            .as_deref()
            .and_then(non_blank)
            .or_else(|| p.text.as_deref().and_then(non_blank)),
        name: p.name.as_deref().and_then(non_blank),
        selection: None,
    }
}

/// Depth-first walk; the first non-empty value per field wins.
fn walk(value: &Value, out: &mut Extracted) {
    match value {
        Value::Object(map) => {
            for (key, v) in map {
                let key = key.as_str();
                if out.sender.is_none() && SENDER_KEYS.contains(&key) {
                    out.sender = scalar(v);
                }
                if out.text.is_none() && TEXT_KEYS.contains(&key) {
                    out.text = v.as_str().and_then(non_blank);
                }
                if out.selection.is_none() && SELECTION_KEYS.contains(&key) {
                    out.selection = v.as_str().and_then(non_blank);
                }
                if out.name.is_none() && NAME_KEYS.contains(&key) {
                    out.name = v.as_str().and_then(non_blank);
                }
                if v.is_object() || v.is_array() {
                    walk(v, out);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                walk(item, out);
            }
        }
        _ => {}
    }
}

fn any_flag(value: &Value, key: &str) -> bool {
    match value {
        Value::Object(map) => map
            .iter()
            .any(|(k, v)| (k == key && v.as_bool() == Some(true)) || any_flag(v, key)),
        Value::Array(items) => items.iter().any(|v| any_flag(v, key)),
        _ => false,
    }
}

fn any_string(value: &Value, needle: &str) -> bool {
    any_string_where(value, &|s| s == needle)
}

fn any_string_ending(value: &Value, suffix: &str) -> bool {
    any_string_where(value, &|s| s.ends_with(suffix))
}

fn any_string_where(value: &Value, pred: &dyn Fn(&str) -> bool) -> bool {
    match value {
        Value::String(s) => pred(s),
        Value::Object(map) => map.values().any(|v| any_string_where(v, pred)),
        Value::Array(items) => items.iter().any(|v| any_string_where(v, pred)),
        _ => false,
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn scalar(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => non_blank(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Strip jid suffixes and reduce phone-like ids to digits; other ids are kept trimmed.
pub fn normalize_sender(raw: &str) -> String {
    let id = raw.trim();
    let id = id.split('@').next().unwrap_or(id);
    let phone_like = id
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | ' ' | '(' | ')' | '.'));
    let digits: String = id.chars().filter(char::is_ascii_digit).collect();
    if phone_like && digits.len() >= MIN_PHONE_DIGITS {
        digits
    } else {
        id.to_string()
    }
}
