//! Assistant facade: the two entry points the host calls.
//!
//! `handle_inbound_event` takes a raw webhook body, `process_message` a plain
//! (user, text) pair. Both end in the dialogue dispatcher.

use crate::channels::{
    HttpResponder, InboundMessage, LogResponder, LoopGuard, Normalized, OriginChannel,
    PayloadNormalizer, Responder,
};
use crate::config::{self, ClassifierBackendKind, Config};
use crate::dialogue::{DialogueSettings, Dispatcher, Handlers, MenuScheduler};
use crate::gateway::protocol::Ack;
use crate::llm::{ClassificationBackend, OllamaClient, OpenAiClient};
use crate::nlu::aliases::TeamAliasIndex;
use crate::nlu::{
    ClassifierMemo, ClassifierSettings, EntityResolver, IntentClassifier, MetricsSnapshot,
};
use crate::providers::{
    Catalog, CatalogProvider, FootballData, InMemoryPreferences, ProviderError, UserPreferences,
};
use crate::state::{InMemoryStateStore, StateStore};
use anyhow::Result;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// Collaborators the assistant talks to.
pub struct AssistantDeps {
    pub data: Arc<dyn FootballData>,
    pub prefs: Arc<dyn UserPreferences>,
    pub states: Arc<dyn StateStore>,
    pub responder: Arc<dyn Responder>,
    pub backend: Option<Arc<dyn ClassificationBackend>>,
}

#[derive(Debug, Clone, Default)]
pub struct AssistantSettings {
    pub loop_guard: LoopGuard,
    pub classifier: ClassifierSettings,
    pub dialogue: DialogueSettings,
    /// Extra entries for the ambiguous-name priority table.
    pub priority: BTreeMap<String, String>,
}

pub struct Assistant {
    normalizer: PayloadNormalizer,
    dispatcher: Dispatcher,
    responder: Arc<dyn Responder>,
    data: Arc<dyn FootballData>,
}

impl Assistant {
    /// Build the assistant and load the alias index from the data provider.
    pub async fn new(deps: AssistantDeps, settings: AssistantSettings) -> Self {
        let resolver = Arc::new(EntityResolver::with_priority(
            TeamAliasIndex::default(),
            &settings.priority,
        ));
        let mut classifier = IntentClassifier::new(resolver.clone(), Arc::new(ClassifierMemo::new()))
            .with_settings(settings.classifier);
        if let Some(backend) = deps.backend {
            log::info!("assistant: AI classification via {}", backend.name());
            classifier = classifier.with_backend(backend);
        }
        let menus = MenuScheduler::new(deps.responder.clone(), settings.dialogue.menu_delay);
        let handlers = Handlers::new(
            deps.data.clone(),
            deps.prefs,
            deps.states.clone(),
            resolver,
            settings.dialogue,
        );
        let assistant = Self {
            normalizer: PayloadNormalizer::new(settings.loop_guard),
            dispatcher: Dispatcher::new(Arc::new(classifier), handlers, deps.states, menus),
            responder: deps.responder,
            data: deps.data,
        };
        if let Err(e) = assistant.reload_aliases().await {
            log::warn!("assistant: initial alias load failed: {}", e);
        }
        assistant
    }

    /// Wire the assistant from config: catalog provider, in-memory preferences and
    /// state, HTTP responder when a messaging API is configured, optional AI backend.
    pub async fn from_config(config: &Config, config_path: &Path) -> Result<Self> {
        let dialogue = config.dialogue.settings();
        let catalog_path = config::resolve_catalog_path(config, config_path);
        let catalog = Catalog::load(&catalog_path)?;
        log::info!(
            "assistant: catalog {} ({} teams, {} matches)",
            catalog_path.display(),
            catalog.teams.len(),
            catalog.matches.len()
        );
        let data = Arc::new(CatalogProvider::new(catalog, dialogue.utc_offset));

        let responder: Arc<dyn Responder> = match config
            .channels
            .messaging
            .api_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
        {
            Some(url) => Arc::new(HttpResponder::new(url, config::resolve_messaging_token(config))),
            None => {
                log::info!("assistant: no messaging apiUrl configured, replies are logged only");
                Arc::new(LogResponder)
            }
        };

        let deps = AssistantDeps {
            data,
            prefs: Arc::new(InMemoryPreferences::new()),
            states: Arc::new(InMemoryStateStore::new()),
            responder,
            backend: backend_from_config(config),
        };
        let settings = AssistantSettings {
            loop_guard: config.channels.messaging.loop_guard(),
            classifier: config.classifier.settings(),
            dialogue,
            priority: config.resolver.priority.clone(),
        };
        Ok(Self::new(deps, settings).await)
    }

    /// Normalize, filter and answer one webhook event. Messaging-app replies are
    /// sent through the responder; web-widget replies are returned in the ack.
    pub async fn handle_inbound_event(&self, event: &serde_json::Value) -> Ack {
        let msg = match self.normalizer.normalize(event) {
            Normalized::Message(msg) => msg,
            Normalized::Filtered(reason) => {
                log::debug!("assistant: event filtered ({:?})", reason);
                return Ack::filtered(&reason);
            }
            Normalized::Ignored(reason) => {
                log::debug!("assistant: event ignored ({:?})", reason);
                return Ack::ignored(&reason);
            }
        };

        let outcome = self.dispatcher.dispatch(&msg).await;
        match msg.origin {
            OriginChannel::MessagingApp => {
                if !self.responder.send(&msg.sender_id, &outcome.reply).await {
                    log::warn!("assistant: reply to {} was not delivered", msg.sender_id);
                }
                self.dispatcher.schedule_follow_up(&msg.sender_id, &outcome);
                Ack::processed(outcome.intent, None)
            }
            OriginChannel::WebWidget => Ack::processed(outcome.intent, Some(outcome.reply)),
        }
    }

    /// Answer a plain message without any transport (simulation, CLI chat).
    pub async fn process_message(&self, user: &str, text: &str, display_name: Option<&str>) -> String {
        let msg = InboundMessage::new(user, text, OriginChannel::WebWidget)
            .with_display_name(display_name.map(str::to_string));
        self.dispatcher.dispatch(&msg).await.reply
    }

    /// Rebuild the alias index from the data provider and clear the classification cache.
    /// Returns the number of teams indexed.
    pub async fn reload_aliases(&self) -> Result<usize, ProviderError> {
        let teams = self.data.list_teams().await?;
        let competitions = self.data.list_competitions().await?;
        self.dispatcher
            .classifier()
            .reload_aliases(&teams, &competitions);
        Ok(teams.len())
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.dispatcher.classifier().metrics()
    }

    pub fn classifier(&self) -> &Arc<IntentClassifier> {
        self.dispatcher.classifier()
    }
}

fn backend_from_config(config: &Config) -> Option<Arc<dyn ClassificationBackend>> {
    let c = &config.classifier;
    if !c.enabled {
        return None;
    }
    let backend: Arc<dyn ClassificationBackend> = match c.backend {
        ClassifierBackendKind::Ollama => Arc::new(OllamaClient::new(c.base_url.clone(), c.model.clone())),
        ClassifierBackendKind::Openai => Arc::new(OpenAiClient::new(
            c.base_url.clone(),
            c.model.clone(),
            config::resolve_classifier_api_key(config),
        )),
    };
    Some(backend)
}
