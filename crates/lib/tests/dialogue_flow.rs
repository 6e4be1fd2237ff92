//! Integration tests: the assistant end to end over the bundled catalog, with a
//! recording responder in place of the messaging gateway.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use lib::assistant::{Assistant, AssistantDeps, AssistantSettings};
use lib::channels::{LoopGuard, MenuPayload, Responder};
use lib::dialogue::DialogueSettings;
use lib::gateway::AckStatus;
use lib::nlu::{IntentKind, SourceTier};
use lib::providers::{
    Broadcast, Catalog, CatalogProvider, Competition, FootballData, InMemoryPreferences, Match,
    NewsItem, Player, ProviderError, Scorer, StandingRow, Team,
};
use lib::state::{ConversationState, InMemoryStateStore, PendingKind, StateStore};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const CATALOG: &str = include_str!("../config/catalog.json");

fn catalog() -> Catalog {
    serde_json::from_str(CATALOG).expect("bundled catalog parses")
}

fn pinned_now() -> DateTime<Utc> {
    "2026-10-15T12:00:00Z".parse().expect("valid timestamp")
}

fn catalog_provider() -> CatalogProvider {
    CatalogProvider::new(catalog(), DialogueSettings::default().utc_offset).with_now(pinned_now())
}

#[derive(Default)]
struct RecordingResponder {
    texts: Mutex<Vec<(String, String)>>,
    menus: Mutex<Vec<(String, MenuPayload)>>,
    send_delay: Duration,
}

impl RecordingResponder {
    fn slow(send_delay: Duration) -> Self {
        Self {
            send_delay,
            ..Self::default()
        }
    }

    fn texts(&self) -> Vec<(String, String)> {
        self.texts.lock().unwrap().clone()
    }

    fn menu_count(&self) -> usize {
        self.menus.lock().unwrap().len()
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn send(&self, user: &str, text: &str) -> bool {
        if !self.send_delay.is_zero() {
            tokio::time::sleep(self.send_delay).await;
        }
        self.texts
            .lock()
            .unwrap()
            .push((user.to_string(), text.to_string()));
        true
    }

    async fn send_menu(&self, user: &str, menu: &MenuPayload) -> bool {
        self.menus
            .lock()
            .unwrap()
            .push((user.to_string(), menu.clone()));
        true
    }
}

struct Harness {
    assistant: Assistant,
    states: Arc<InMemoryStateStore>,
    responder: Arc<RecordingResponder>,
}

fn settings() -> AssistantSettings {
    AssistantSettings {
        loop_guard: LoopGuard {
            bot_ids: vec!["5511900000000".to_string()],
            system_marker: Some("[sistema]".to_string()),
        },
        dialogue: DialogueSettings {
            menu_delay: Duration::from_millis(50),
            ..DialogueSettings::default()
        },
        ..AssistantSettings::default()
    }
}

async fn harness_with(data: Arc<dyn FootballData>, settings: AssistantSettings) -> Harness {
    harness_with_responder(data, settings, Arc::new(RecordingResponder::default())).await
}

async fn harness_with_responder(
    data: Arc<dyn FootballData>,
    settings: AssistantSettings,
    responder: Arc<RecordingResponder>,
) -> Harness {
    let states = Arc::new(InMemoryStateStore::new());
    let deps = AssistantDeps {
        data,
        prefs: Arc::new(InMemoryPreferences::new()),
        states: states.clone(),
        responder: responder.clone(),
        backend: None,
    };
    Harness {
        assistant: Assistant::new(deps, settings).await,
        states,
        responder,
    }
}

async fn harness() -> Harness {
    harness_with(Arc::new(catalog_provider()), settings()).await
}

#[tokio::test]
async fn favorite_team_is_asked_then_stored() {
    let h = harness().await;

    let ask = h.assistant.process_message("u1", "meu time", None).await;
    assert!(ask.contains("ainda não definiu um time favorito"), "{}", ask);
    assert!(h.states.get("u1").await.is_some());

    let done = h.assistant.process_message("u1", "palmeiras", None).await;
    assert!(done.starts_with("✅ Pronto! O Palmeiras agora é o seu time favorito."), "{}", done);
    assert!(h.states.get("u1").await.is_none(), "pending state is consumed once");

    let mine = h.assistant.process_message("u1", "meu time", None).await;
    assert!(mine.contains("Próximo jogo do Palmeiras"), "{}", mine);
    assert!(mine.contains("Último jogo do Palmeiras"), "{}", mine);
}

#[tokio::test]
async fn unknown_team_answer_closes_question() {
    let h = harness().await;
    h.assistant.process_message("u2", "definir time", None).await;

    let miss = h.assistant.process_message("u2", "xablau fc", None).await;
    assert!(miss.contains("Não encontrei o time \"xablau fc\""), "{}", miss);
    assert!(h.states.get("u2").await.is_none(), "state is consumed even on a miss");

    let next = h.assistant.process_message("u2", "tabela", None).await;
    assert!(next.contains("Tabela do"), "classified normally: {}", next);
    let mine = h.assistant.process_message("u2", "meu time", None).await;
    assert!(mine.contains("ainda não definiu"), "{}", mine);
}

#[tokio::test]
async fn pending_team_question_takes_any_next_message() {
    let h = harness().await;
    let ask = h.assistant.process_message("u8", "próximo jogo", None).await;
    assert!(ask.contains("De qual time você quer saber o próximo jogo?"), "{}", ask);

    let miss = h.assistant.process_message("u8", "oi", None).await;
    assert!(miss.contains("Não encontrei o time \"oi\""), "{}", miss);
    assert!(h.states.get("u8").await.is_none());

    let standings = h.assistant.process_message("u8", "tabela", None).await;
    assert!(standings.contains("Tabela do"), "{}", standings);

    h.assistant.process_message("u8", "próximo jogo", None).await;
    let hit = h.assistant.process_message("u8", "flamengo", None).await;
    assert!(hit.contains("Próximo jogo do Flamengo"), "{}", hit);
}

#[tokio::test]
async fn expired_state_is_dropped_and_message_classified() {
    let h = harness().await;
    let ttl = DialogueSettings::default().state_ttl;
    h.states
        .set(
            "u3",
            ConversationState {
                pending: PendingKind::AwaitingTeamForFavorite,
                created_at: Utc::now() - ttl - chrono::Duration::seconds(100),
            },
        )
        .await;

    let reply = h.assistant.process_message("u3", "palmeiras", None).await;
    assert!(reply.contains("Próximo jogo do Palmeiras"), "{}", reply);
    assert!(h.states.get("u3").await.is_none());
    let mine = h.assistant.process_message("u3", "meu time", None).await;
    assert!(mine.contains("ainda não definiu"), "{}", mine);
}

#[tokio::test]
async fn state_within_ttl_is_answered() {
    let h = harness().await;
    h.states
        .set(
            "u9",
            ConversationState {
                pending: PendingKind::AwaitingTeamForFavorite,
                created_at: Utc::now() - chrono::Duration::seconds(60),
            },
        )
        .await;

    let done = h.assistant.process_message("u9", "palmeiras", None).await;
    assert!(done.contains("O Palmeiras agora é o seu time favorito"), "{}", done);
}

#[tokio::test]
async fn missing_competition_gets_a_hint_without_pending_state() {
    let mut s = settings();
    s.dialogue.default_competition = None;
    let h = harness_with(Arc::new(catalog_provider()), s).await;

    let scorers = h.assistant.process_message("u10", "qa:top_scorers", None).await;
    assert!(scorers.starts_with("Diga o campeonato"), "{}", scorers);
    assert!(!scorers.ends_with('?'), "{}", scorers);
    assert!(h.states.get("u10").await.is_none());

    let info = h.assistant.process_message("u10", "qa:competition_info", None).await;
    assert!(info.starts_with("Diga o campeonato"), "{}", info);
    assert!(h.states.get("u10").await.is_none());

    let standings = h.assistant.process_message("u10", "qa:standings", None).await;
    assert!(standings.ends_with('?'), "{}", standings);
    assert!(h.states.get("u10").await.is_some());
}

#[tokio::test]
async fn next_match_for_named_team() {
    let h = harness().await;
    let reply = h
        .assistant
        .process_message("u4", "próximo jogo do flamengo", None)
        .await;
    assert!(reply.contains("Próximo jogo do Flamengo"), "{}", reply);
    assert!(reply.contains("Maracanã"), "{}", reply);
    assert!(reply.contains("18/10 às 18:00"), "kickoff in local time: {}", reply);
}

#[tokio::test]
async fn fixture_broadcast_lists_channels() {
    let h = harness().await;
    let reply = h
        .assistant
        .process_message("u5", "onde passa bahia x fluminense", None)
        .await;
    assert!(reply.starts_with("📺"), "{}", reply);
    assert!(reply.contains("SporTV"), "{}", reply);
    assert!(reply.contains("Premiere"), "{}", reply);
}

#[tokio::test]
async fn quick_action_uses_default_competition() {
    let h = harness().await;
    let reply = h.assistant.process_message("u6", "qa:standings", None).await;
    assert!(reply.contains("Tabela do Campeonato Brasileiro Série A"), "{}", reply);
    assert!(reply.contains("1º Flamengo"), "{}", reply);
}

#[tokio::test]
async fn second_classification_is_served_from_cache() {
    let h = harness().await;
    let first = h.assistant.classifier().classify("quando joga o galo").await;
    let second = h.assistant.classifier().classify("quando joga o galo").await;
    assert_eq!(first.intent, IntentKind::NextMatch);
    assert_ne!(first.source, SourceTier::Cache);
    assert_eq!(second.source, SourceTier::Cache);
    assert_eq!(second.intent, first.intent);
    assert_eq!(second.entities, first.entities);

    let m = h.assistant.metrics();
    assert_eq!(m.total_requests, 2);
    assert_eq!(m.cache_hits, 1);
}

#[tokio::test]
async fn reload_aliases_clears_cache() {
    let h = harness().await;
    h.assistant.classifier().classify("tabela").await;
    assert_eq!(h.assistant.metrics().cached_entries, 1);
    let teams = h.assistant.reload_aliases().await.unwrap();
    assert_eq!(teams, catalog().teams.len());
    assert_eq!(h.assistant.metrics().cached_entries, 0);
}

#[tokio::test]
async fn own_messages_are_filtered_without_reply() {
    let h = harness().await;
    let ack = h
        .assistant
        .handle_inbound_event(&json!({
            "type": "ReceivedCallback",
            "phone": "5511999990000",
            "fromMe": true,
            "text": {"message": "próximo jogo do flamengo"}
        }))
        .await;
    assert!(ack.success);
    assert_eq!(ack.status, AckStatus::Filtered);
    assert_eq!(ack.reason.as_deref(), Some("from_self"));
    assert!(h.responder.texts().is_empty());
}

#[tokio::test]
async fn messaging_app_reply_is_sent_then_menu_follows() {
    let h = harness().await;
    let ack = h
        .assistant
        .handle_inbound_event(&json!({
            "type": "ReceivedCallback",
            "phone": "5511999990000",
            "senderName": "Maria Souza",
            "text": {"message": "próximo jogo do flamengo"}
        }))
        .await;
    assert_eq!(ack.status, AckStatus::Processed);
    assert_eq!(ack.intent, Some(IntentKind::NextMatch));
    assert!(ack.reply.is_none());

    let texts = h.responder.texts();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].0, "5511999990000");
    assert!(texts[0].1.contains("Próximo jogo do Flamengo"));

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(h.responder.menu_count(), 1);
}

#[tokio::test]
async fn newer_message_cancels_pending_menu() {
    let mut s = settings();
    s.dialogue.menu_delay = Duration::from_millis(400);
    let h = harness_with(Arc::new(catalog_provider()), s).await;
    let event = |text: &str| {
        json!({"type": "ReceivedCallback", "phone": "5511988887777", "text": {"message": text}})
    };

    h.assistant.handle_inbound_event(&event("oi")).await;
    h.assistant.handle_inbound_event(&event("obrigado")).await;
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(h.responder.texts().len(), 2);
    assert_eq!(h.responder.menu_count(), 0, "thanks carries no menu and cancels the greeting's");
}

#[tokio::test]
async fn menu_is_not_queued_after_a_newer_message_during_slow_send() {
    let mut s = settings();
    s.dialogue.menu_delay = Duration::from_millis(100);
    let responder = Arc::new(RecordingResponder::slow(Duration::from_millis(200)));
    let h = harness_with_responder(Arc::new(catalog_provider()), s, responder).await;
    let greeting = json!({"type": "ReceivedCallback", "phone": "5511977776666", "text": {"message": "oi"}});
    let thanks =
        json!({"type": "ReceivedCallback", "phone": "5511977776666", "text": {"message": "obrigado"}});

    let first = h.assistant.handle_inbound_event(&greeting);
    let second = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        h.assistant.handle_inbound_event(&thanks).await
    };
    let (a, b) = tokio::join!(first, second);
    assert_eq!(a.status, AckStatus::Processed);
    assert_eq!(b.status, AckStatus::Processed);

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(h.responder.texts().len(), 2);
    assert_eq!(h.responder.menu_count(), 0, "greeting menu belongs to a superseded turn");
}

#[tokio::test]
async fn unknown_menu_selection_shows_help() {
    let h = harness().await;
    h.states
        .set("5511966665555", ConversationState::new(PendingKind::AwaitingTeamForNextMatch))
        .await;
    let ack = h
        .assistant
        .handle_inbound_event(&json!({
            "type": "ReceivedCallback",
            "phone": "5511966665555",
            "listResponseMessage": {"selectedRowId": "menu_antigo_3", "title": "Tabela"}
        }))
        .await;
    assert_eq!(ack.status, AckStatus::Processed);
    assert_eq!(ack.intent, Some(IntentKind::Help));
    let texts = h.responder.texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].1.starts_with("Posso te ajudar com"), "{}", texts[0].1);
    assert!(h.states.get("5511966665555").await.is_none());
}

#[tokio::test]
async fn web_widget_reply_is_inline() {
    let h = harness().await;
    let ack = h
        .assistant
        .handle_inbound_event(&json!({"channel": "web", "userId": "w-1", "message": "oi", "name": "Ana Lima"}))
        .await;
    assert_eq!(ack.status, AckStatus::Processed);
    let reply = ack.reply.expect("inline reply");
    assert!(reply.starts_with("Olá, Ana!"), "{}", reply);
    assert!(h.responder.texts().is_empty());
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert_eq!(h.responder.menu_count(), 0);
}

/// Teams and competitions come from the catalog; every other call fails.
struct FlakyData {
    inner: CatalogProvider,
}

#[async_trait]
impl FootballData for FlakyData {
    async fn list_teams(&self) -> Result<Vec<Team>, ProviderError> {
        self.inner.list_teams().await
    }

    async fn list_competitions(&self) -> Result<Vec<Competition>, ProviderError> {
        self.inner.list_competitions().await
    }

    async fn find_team_candidates(&self, _name: &str) -> Result<Vec<Team>, ProviderError> {
        Err(ProviderError::Unavailable("timeout".into()))
    }

    async fn find_next_match(&self, _team: &str) -> Result<Option<Match>, ProviderError> {
        Err(ProviderError::Unavailable("timeout".into()))
    }

    async fn find_last_match(&self, _team: &str) -> Result<Option<Match>, ProviderError> {
        Err(ProviderError::Unavailable("timeout".into()))
    }

    async fn matches_on(&self, _day: NaiveDate) -> Result<Vec<Match>, ProviderError> {
        Err(ProviderError::Unavailable("timeout".into()))
    }

    async fn live_matches(&self) -> Result<Vec<Match>, ProviderError> {
        Err(ProviderError::Unavailable("timeout".into()))
    }

    async fn find_match_between(&self, _a: &str, _b: &str) -> Result<Option<Match>, ProviderError> {
        Err(ProviderError::Unavailable("timeout".into()))
    }

    async fn get_standings(&self, _c: &str) -> Result<Vec<StandingRow>, ProviderError> {
        Err(ProviderError::Backend("500".into()))
    }

    async fn top_scorers(&self, _c: &str) -> Result<Vec<Scorer>, ProviderError> {
        Err(ProviderError::Backend("500".into()))
    }

    async fn get_broadcasts_for_match(&self, _id: &str) -> Result<Vec<Broadcast>, ProviderError> {
        Err(ProviderError::Backend("500".into()))
    }

    async fn find_players(&self, _name: &str) -> Result<Vec<Player>, ProviderError> {
        Err(ProviderError::Backend("500".into()))
    }

    async fn team_squad(&self, _team: &str) -> Result<Vec<Player>, ProviderError> {
        Err(ProviderError::Backend("500".into()))
    }

    async fn latest_news(&self, _limit: usize) -> Result<Vec<NewsItem>, ProviderError> {
        Err(ProviderError::Backend("500".into()))
    }
}

#[tokio::test]
async fn provider_failure_becomes_apology() {
    let data = Arc::new(FlakyData {
        inner: catalog_provider(),
    });
    let h = harness_with(data, settings()).await;

    let reply = h
        .assistant
        .process_message("u7", "próximo jogo do flamengo", None)
        .await;
    assert!(reply.starts_with("Desculpe, não consegui buscar"), "{}", reply);

    let greeting = h.assistant.process_message("u7", "oi", None).await;
    assert!(greeting.starts_with("Olá!"), "{}", greeting);
}
