//! Follow-up menus: the main option list and its delayed, cancellable delivery.

use crate::channels::{MenuOption, MenuPayload, Responder};
use crate::dialogue::quick_actions::QuickAction;
use crate::nlu::intent::IntentKind;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

fn option(intent: IntentKind, arg: Option<&str>, title: &str, description: Option<&str>) -> MenuOption {
    MenuOption {
        id: QuickAction::new(intent, arg).token(),
        title: title.to_string(),
        description: description.map(str::to_string),
    }
}

/// Main menu. With a favorite team the team-bound options point straight at it.
pub fn main_menu(favorite: Option<(&str, &str)>) -> MenuPayload {
    let mut options = Vec::new();
    match favorite {
        Some((team, name)) => {
            let next = format!("Próximo jogo do {}", name);
            options.push(option(IntentKind::NextMatch, Some(team), &next, None));
            options.push(option(IntentKind::MyTeam, None, "Meu time", Some(name)));
        }
        None => {
            options.push(option(IntentKind::NextMatch, None, "Próximo jogo", None));
            options.push(option(
                IntentKind::SetFavoriteTeam,
                None,
                "Definir time favorito",
                Some("Respostas mais rápidas sobre o seu time"),
            ));
        }
    }
    options.push(option(IntentKind::MatchesToday, None, "Jogos de hoje", None));
    options.push(option(IntentKind::LiveMatches, None, "Jogos ao vivo", None));
    options.push(option(IntentKind::Standings, None, "Tabela", None));
    options.push(option(IntentKind::TopScorers, None, "Artilharia", None));
    options.push(option(
        IntentKind::Broadcast,
        favorite.map(|(team, _)| team),
        "Onde assistir",
        None,
    ));
    options.push(option(IntentKind::Help, None, "Ajuda", None));
    MenuPayload {
        title: "Menu".to_string(),
        body: "Quer saber mais alguma coisa? Escolha uma opção:".to_string(),
        button_label: "Ver opções".to_string(),
        options,
    }
}

struct PendingMenu {
    id: u64,
    handle: JoinHandle<()>,
}

/// Latest turn of one user and the menu scheduled for it, if any.
struct UserSlot {
    turn: u64,
    menu: Option<PendingMenu>,
}

const SLOT_PRUNE_THRESHOLD: usize = 1024;

/// Sends menus after a delay. A newer message from the same user cancels the pending menu.
///
/// Each inbound message starts a turn (`begin_turn`). A menu is only scheduled for the
/// user's latest turn, so a slow reply cannot queue a menu after a newer message arrived.
pub struct MenuScheduler {
    responder: Arc<dyn Responder>,
    delay: Duration,
    next_id: AtomicU64,
    slots: Arc<Mutex<HashMap<String, UserSlot>>>,
}

impl MenuScheduler {
    pub fn new(responder: Arc<dyn Responder>, delay: Duration) -> Self {
        Self {
            responder,
            delay,
            next_id: AtomicU64::new(1),
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Start a new turn for `user`: cancels the waiting menu and returns the turn id.
    pub fn begin_turn(&self, user: &str) -> u64 {
        let turn = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots.len() >= SLOT_PRUNE_THRESHOLD {
            slots.retain(|_, s| s.menu.as_ref().is_some_and(|m| !m.handle.is_finished()));
        }
        let slot = slots.entry(user.to_string()).or_insert(UserSlot { turn, menu: None });
        slot.turn = turn;
        if let Some(previous) = slot.menu.take() {
            if !previous.handle.is_finished() {
                previous.handle.abort();
                log::debug!("menu: cancelled pending menu for {}", user);
            }
        }
        turn
    }

    /// Schedule `menu` for `user` on behalf of `turn`. Dropped when a newer turn has begun.
    /// Returns true when the menu was queued.
    pub fn schedule(&self, user: &str, turn: u64, menu: MenuPayload) -> bool {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(slot) = slots.get_mut(user).filter(|s| s.turn == turn) else {
            log::debug!("menu: dropped stale menu for {} (turn {})", user, turn);
            return false;
        };
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let responder = self.responder.clone();
        let shared = self.slots.clone();
        let delay = self.delay;
        let owner = user.to_string();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if !responder.send_menu(&owner, &menu).await {
                log::warn!("menu: follow-up menu to {} was not delivered", owner);
            }
            let mut slots = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if slots
                .get(&owner)
                .and_then(|s| s.menu.as_ref())
                .is_some_and(|m| m.id == id)
            {
                slots.remove(&owner);
            }
        });
        if let Some(previous) = slot.menu.replace(PendingMenu { id, handle }) {
            previous.handle.abort();
        }
        true
    }

    #[cfg(test)]
    fn pending_count(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|s| s.menu.as_ref().is_some_and(|m| !m.handle.is_finished()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingResponder {
        menus: AtomicUsize,
    }

    #[async_trait]
    impl Responder for CountingResponder {
        async fn send(&self, _user: &str, _text: &str) -> bool {
            true
        }

        async fn send_menu(&self, _user: &str, _menu: &MenuPayload) -> bool {
            self.menus.fetch_add(1, Ordering::SeqCst);
            true
        }
    }

    #[test]
    fn menu_uses_favorite_team() {
        let menu = main_menu(Some(("flamengo", "Flamengo")));
        assert_eq!(menu.options[0].id, "qa:next_match:flamengo");
        assert!(menu.options.iter().any(|o| o.id == "qa:broadcast:flamengo"));

        let menu = main_menu(None);
        assert_eq!(menu.options[0].id, "qa:next_match");
        assert!(menu.options.iter().any(|o| o.id == "qa:set_favorite_team"));
        assert!(menu.options.len() <= 10);
    }

    #[tokio::test]
    async fn menu_is_sent_after_delay() {
        let responder = Arc::new(CountingResponder::default());
        let scheduler = MenuScheduler::new(responder.clone(), Duration::from_millis(20));
        let turn = scheduler.begin_turn("u1");
        assert!(scheduler.schedule("u1", turn, main_menu(None)));
        assert_eq!(scheduler.pending_count(), 1);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(responder.menus.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[tokio::test]
    async fn newer_message_cancels_menu() {
        let responder = Arc::new(CountingResponder::default());
        let scheduler = MenuScheduler::new(responder.clone(), Duration::from_millis(100));
        let turn = scheduler.begin_turn("u1");
        scheduler.schedule("u1", turn, main_menu(None));
        scheduler.begin_turn("u1");
        assert_eq!(scheduler.pending_count(), 0);
        let turn = scheduler.begin_turn("u2");
        scheduler.schedule("u2", turn, main_menu(None));
        scheduler.schedule("u2", turn, main_menu(None));
        assert_eq!(scheduler.pending_count(), 1);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(responder.menus.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn menu_for_superseded_turn_is_dropped() {
        let responder = Arc::new(CountingResponder::default());
        let scheduler = MenuScheduler::new(responder.clone(), Duration::from_millis(20));
        let first = scheduler.begin_turn("u1");
        let second = scheduler.begin_turn("u1");
        assert!(!scheduler.schedule("u1", first, main_menu(None)));
        assert_eq!(scheduler.pending_count(), 0);
        assert!(scheduler.schedule("u1", second, main_menu(None)));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(responder.menus.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn schedule_without_turn_is_dropped() {
        let responder = Arc::new(CountingResponder::default());
        let scheduler = MenuScheduler::new(responder.clone(), Duration::from_millis(10));
        assert!(!scheduler.schedule("nobody", 1, main_menu(None)));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(responder.menus.load(Ordering::SeqCst), 0);
    }
}
