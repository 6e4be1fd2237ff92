//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (`~/.torcida/config.json` or
//! `TORCIDA_CONFIG_PATH`). Every section is optional; secrets can come from
//! the environment instead of the file.

use crate::channels::LoopGuard;
use crate::dialogue::{self, DialogueSettings};
use crate::nlu::classifier::{ClassifierSettings, DEFAULT_AI_TIMEOUT_MS, DEFAULT_MIN_AI_CONFIDENCE};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Gateway server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Messaging channel settings.
    #[serde(default)]
    pub channels: ChannelsConfig,

    /// AI classification backend. Absent backend => rule tiers only.
    #[serde(default)]
    pub classifier: ClassifierConfig,

    /// Follow-up menus, pending-state expiry, display timezone.
    #[serde(default)]
    pub dialogue: DialogueConfig,

    /// Football data source.
    #[serde(default)]
    pub data: DataConfig,

    /// Team-name arbitration.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Gateway bind, port, and auth settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 15151).
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "127.0.0.1").
    #[serde(default = "default_gateway_bind")]
    pub bind: String,

    /// Auth for admin routes. When absent, defaults to no auth for loopback bind.
    #[serde(default)]
    pub auth: GatewayAuthConfig,
}

/// Gateway auth: token or none (loopback-only when none).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayAuthConfig {
    /// "none" = no shared secret (only safe when bind is loopback). "token" = admin routes require a bearer token.
    #[serde(default)]
    pub mode: GatewayAuthMode,

    /// Bearer token for admin routes. Overridden by TORCIDA_GATEWAY_TOKEN env.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayAuthMode {
    /// No auth; allow only when bind is loopback.
    #[default]
    None,

    /// Require `Authorization: Bearer <token>` on admin routes.
    Token,
}

fn default_gateway_port() -> u16 {
    15151
}

fn default_gateway_bind() -> String {
    "127.0.0.1".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
            auth: GatewayAuthConfig::default(),
        }
    }
}

/// Per-channel config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelsConfig {
    #[serde(default)]
    pub messaging: MessagingChannelConfig,
}

/// Messaging gateway (the app users chat from).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagingChannelConfig {
    /// Base URL of the gateway's send API. When unset, replies are only logged.
    pub api_url: Option<String>,
    /// Client token for the send API. Overridden by TORCIDA_MESSAGING_TOKEN env.
    pub api_token: Option<String>,
    /// Shared secret expected in `X-Webhook-Secret` on inbound webhooks.
    pub webhook_secret: Option<String>,
    /// Phone numbers owned by the bot; messages from them are dropped.
    #[serde(default)]
    pub bot_numbers: Vec<String>,
    /// Texts starting with this marker are system messages and are dropped.
    pub system_marker: Option<String>,
}

impl MessagingChannelConfig {
    pub fn loop_guard(&self) -> LoopGuard {
        LoopGuard {
            bot_ids: self.bot_numbers.clone(),
            system_marker: self
                .system_marker
                .as_ref()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackendKind {
    /// Ollama native `/api/chat`.
    #[default]
    Ollama,
    /// Any OpenAI-compatible `/v1/chat/completions` server.
    Openai,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifierConfig {
    /// When false, the AI tier is skipped.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub backend: ClassifierBackendKind,
    pub base_url: Option<String>,
    pub model: Option<String>,
    /// API key for OpenAI-compatible servers. Overridden by TORCIDA_CLASSIFIER_API_KEY env.
    pub api_key: Option<String>,
    #[serde(default = "default_classifier_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,
}

fn default_classifier_timeout_ms() -> u64 {
    DEFAULT_AI_TIMEOUT_MS
}

fn default_min_confidence() -> f32 {
    DEFAULT_MIN_AI_CONFIDENCE
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            backend: ClassifierBackendKind::default(),
            base_url: None,
            model: None,
            api_key: None,
            timeout_ms: default_classifier_timeout_ms(),
            min_confidence: default_min_confidence(),
        }
    }
}

impl ClassifierConfig {
    pub fn settings(&self) -> ClassifierSettings {
        ClassifierSettings {
            min_ai_confidence: self.min_confidence.clamp(0.0, 1.0),
            ai_timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialogueConfig {
    #[serde(default = "default_menu_delay_ms")]
    pub menu_delay_ms: u64,
    /// Pending questions older than this are dropped.
    #[serde(default = "default_state_ttl_secs")]
    pub state_ttl_secs: i64,
    /// Whole hours east of UTC for "today" and kickoff times (default -3).
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
    /// Competition for table/scorer questions that name none. Empty => ask.
    #[serde(default = "default_competition")]
    pub default_competition: String,
}

fn default_menu_delay_ms() -> u64 {
    dialogue::DEFAULT_MENU_DELAY_MS
}

fn default_state_ttl_secs() -> i64 {
    dialogue::DEFAULT_STATE_TTL_SECS
}

fn default_utc_offset_hours() -> i32 {
    dialogue::DEFAULT_UTC_OFFSET_HOURS
}

fn default_competition() -> String {
    dialogue::DEFAULT_COMPETITION.to_string()
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            menu_delay_ms: default_menu_delay_ms(),
            state_ttl_secs: default_state_ttl_secs(),
            utc_offset_hours: default_utc_offset_hours(),
            default_competition: default_competition(),
        }
    }
}

impl DialogueConfig {
    pub fn settings(&self) -> DialogueSettings {
        let competition = self.default_competition.trim();
        DialogueSettings {
            menu_delay: Duration::from_millis(self.menu_delay_ms),
            state_ttl: chrono::Duration::seconds(self.state_ttl_secs.max(0)),
            utc_offset: dialogue::offset_from_hours(self.utc_offset_hours),
            default_competition: (!competition.is_empty()).then(|| competition.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataConfig {
    /// Catalog file. Relative paths are resolved against the config file's parent.
    /// Default: `catalog.json` next to the config file.
    pub catalog: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Ambiguous name -> team id, merged over the built-in table (e.g. "atletico": "atletico-pr").
    #[serde(default)]
    pub priority: BTreeMap<String, String>,
}

fn env_or(var: &str, fallback: Option<&String>) -> Option<String> {
    std::env::var(var)
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            fallback
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        })
}

/// Resolve the gateway token: env TORCIDA_GATEWAY_TOKEN overrides config.
pub fn resolve_gateway_token(config: &Config) -> Option<String> {
    env_or("TORCIDA_GATEWAY_TOKEN", config.gateway.auth.token.as_ref())
}

/// Resolve the messaging API token: env TORCIDA_MESSAGING_TOKEN overrides config.
pub fn resolve_messaging_token(config: &Config) -> Option<String> {
    env_or(
        "TORCIDA_MESSAGING_TOKEN",
        config.channels.messaging.api_token.as_ref(),
    )
}

/// Resolve the classifier API key: env TORCIDA_CLASSIFIER_API_KEY overrides config.
pub fn resolve_classifier_api_key(config: &Config) -> Option<String> {
    env_or(
        "TORCIDA_CLASSIFIER_API_KEY",
        config.classifier.api_key.as_ref(),
    )
}

/// True if the bind address is loopback (127.0.0.1, ::1, etc.).
pub fn is_loopback_bind(bind: &str) -> bool {
    let b = bind.trim();
    b == "127.0.0.1" || b == "::1" || b == "localhost"
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("TORCIDA_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".torcida").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

fn config_parent(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Resolve the catalog path: `data.catalog` if set (relative to the config file's parent), else `catalog.json` beside the config.
pub fn resolve_catalog_path(config: &Config, config_path: &Path) -> PathBuf {
    match &config.data.catalog {
        Some(p) if !p.as_os_str().is_empty() => {
            if p.is_absolute() {
                p.clone()
            } else {
                config_parent(config_path).join(p)
            }
        }
        _ => config_parent(config_path).join("catalog.json"),
    }
}

/// Load config from the default path (or TORCIDA_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used (for resolving the catalog).
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
