//! Dialogue dispatcher: routes one inbound message to a handler.
//!
//! Order: quick-action token, unknown menu selection, pending state, literal phrases,
//! classifier. Messages from one user are serialized so a pending state is consumed once.

use crate::channels::{InboundMessage, MenuPayload, OriginChannel};
use crate::dialogue::handlers::{Handlers, UserCtx};
use crate::dialogue::locks::UserLocks;
use crate::dialogue::menu::{main_menu, MenuScheduler};
use crate::dialogue::quick_actions::QuickAction;
use crate::nlu::intent::{EntityQuery, IntentKind};
use crate::nlu::text::normalize_text;
use crate::nlu::IntentClassifier;
use crate::providers::ProviderError;
use crate::state::StateStore;
use chrono::Utc;
use std::sync::Arc;

const APOLOGY: &str =
    "Desculpe, não consegui buscar essas informações agora. Tente novamente em instantes. 🙏";

/// Phrases routed without classification.
const LITERAL_PHRASES: &[(&str, IntentKind)] = &[
    ("meu time", IntentKind::MyTeam),
    ("time favorito", IntentKind::SetFavoriteTeam),
    ("definir time", IntentKind::SetFavoriteTeam),
];

#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub reply: String,
    pub intent: IntentKind,
    /// Menu to send after the reply (messaging app only).
    pub follow_up: Option<MenuPayload>,
    /// Menu turn this outcome belongs to.
    pub turn: u64,
}

pub struct Dispatcher {
    classifier: Arc<IntentClassifier>,
    handlers: Handlers,
    states: Arc<dyn StateStore>,
    menus: MenuScheduler,
    locks: UserLocks,
}

impl Dispatcher {
    pub fn new(
        classifier: Arc<IntentClassifier>,
        handlers: Handlers,
        states: Arc<dyn StateStore>,
        menus: MenuScheduler,
    ) -> Self {
        Self {
            classifier,
            handlers,
            states,
            menus,
            locks: UserLocks::new(),
        }
    }

    pub fn classifier(&self) -> &Arc<IntentClassifier> {
        &self.classifier
    }

    pub async fn dispatch(&self, msg: &InboundMessage) -> DispatchOutcome {
        let _guard = self.locks.lock(&msg.sender_id).await;
        let turn = self.menus.begin_turn(&msg.sender_id);

        let user = UserCtx {
            id: &msg.sender_id,
            first_name: msg.first_name(),
        };
        let text = msg.text.trim();

        if let Some(action) = QuickAction::parse(text) {
            // Picking a menu option abandons any open question.
            self.states.clear(user.id).await;
            log::debug!("dispatcher: {} quick action {}", user.id, action.token());
            let result = self
                .handlers
                .handle(&user, action.intent, &action.entities(), "")
                .await;
            return self.finish(msg, turn, action.intent, result).await;
        }

        if msg.selection {
            self.states.clear(user.id).await;
            log::info!("dispatcher: {} picked unknown option {:?}", user.id, text);
            let result = self
                .handlers
                .handle(&user, IntentKind::Help, &EntityQuery::None, "")
                .await;
            return self.finish(msg, turn, IntentKind::Help, result).await;
        }

        if let Some(state) = self.states.get(user.id).await {
            self.states.clear(user.id).await;
            if state.is_expired(Utc::now(), self.handlers.settings().state_ttl) {
                log::debug!("dispatcher: {} state {:?} expired", user.id, state.pending);
            } else {
                log::debug!("dispatcher: {} answers {:?}", user.id, state.pending);
                let result = self.handlers.answer_pending(&user, state.pending, text).await;
                return self.finish(msg, turn, state.pending.intent(), result).await;
            }
        }

        let key = normalize_text(text);
        let (intent, entities) = match LITERAL_PHRASES.iter().find(|(p, _)| *p == key) {
            Some((_, intent)) => (*intent, EntityQuery::None),
            None => {
                let r = self.classifier.classify(text).await;
                log::info!(
                    "dispatcher: {} -> {} ({:.2}, {:?})",
                    user.id,
                    r.intent,
                    r.confidence,
                    r.source
                );
                (r.intent, r.entities)
            }
        };
        let result = self.handlers.handle(&user, intent, &entities, text).await;
        self.finish(msg, turn, intent, result).await
    }

    async fn finish(
        &self,
        msg: &InboundMessage,
        turn: u64,
        intent: IntentKind,
        result: Result<String, ProviderError>,
    ) -> DispatchOutcome {
        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                log::warn!(
                    "dispatcher: {} failed for {}: {}",
                    intent,
                    msg.sender_id,
                    e
                );
                APOLOGY.to_string()
            }
        };
        let follow_up = if msg.origin == OriginChannel::MessagingApp && intent.wants_follow_up_menu() {
            let favorite = self.handlers.favorite_with_name(&msg.sender_id).await;
            Some(main_menu(
                favorite.as_ref().map(|(id, name)| (id.as_str(), name.as_str())),
            ))
        } else {
            None
        };
        DispatchOutcome {
            reply,
            intent,
            follow_up,
            turn,
        }
    }

    /// Queue the follow-up menu of an outcome, if any. Skipped when the user sent
    /// another message after this outcome was produced.
    pub fn schedule_follow_up(&self, user: &str, outcome: &DispatchOutcome) {
        if let Some(menu) = &outcome.follow_up {
            self.menus.schedule(user, outcome.turn, menu.clone());
        }
    }
}
