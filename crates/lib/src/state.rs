//! Per-user conversation state: at most one pending follow-up question.
//!
//! A pending state means the next message from that user answers the question
//! instead of being classified. States carry their creation time so stale ones
//! can be expired by the dispatcher.

use crate::nlu::intent::IntentKind;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Opaque user identifier (phone digits, widget session id).
pub type UserId = String;

/// What the assistant is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingKind {
    AwaitingTeamForNextMatch,
    AwaitingTeamForLastMatch,
    AwaitingTeamForBroadcast,
    AwaitingTeamForInfo,
    AwaitingTeamForFavorite,
    AwaitingPlayerName,
    AwaitingCompetitionForStandings,
}

impl PendingKind {
    /// Intent the answer is handled as.
    pub fn intent(self) -> IntentKind {
        match self {
            PendingKind::AwaitingTeamForNextMatch => IntentKind::NextMatch,
            PendingKind::AwaitingTeamForLastMatch => IntentKind::LastMatch,
            PendingKind::AwaitingTeamForBroadcast => IntentKind::Broadcast,
            PendingKind::AwaitingTeamForInfo => IntentKind::TeamInfo,
            PendingKind::AwaitingTeamForFavorite => IntentKind::SetFavoriteTeam,
            PendingKind::AwaitingPlayerName => IntentKind::PlayerInfo,
            PendingKind::AwaitingCompetitionForStandings => IntentKind::Standings,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    pub pending: PendingKind,
    pub created_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(pending: PendingKind) -> Self {
        Self {
            pending,
            created_at: Utc::now(),
        }
    }

    /// True when the state is older than `ttl` at `now`.
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.created_at) > ttl
    }
}

/// Storage for the single pending state of each user.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, user: &str) -> Option<ConversationState>;

    /// Replace any existing state.
    async fn set(&self, user: &str, state: ConversationState);

    async fn clear(&self, user: &str);
}

/// In-process state store.
#[derive(Clone, Default)]
pub struct InMemoryStateStore {
    inner: Arc<RwLock<HashMap<UserId, ConversationState>>>,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, user: &str) -> Option<ConversationState> {
        self.inner.read().await.get(user).cloned()
    }

    async fn set(&self, user: &str, state: ConversationState) {
        log::debug!("state: {} -> {:?}", user, state.pending);
        self.inner.write().await.insert(user.to_string(), state);
    }

    async fn clear(&self, user: &str) {
        self.inner.write().await.remove(user);
    }
}
