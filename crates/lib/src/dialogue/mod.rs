//! Dialogue orchestration: pending states, quick actions, intent handlers and follow-up menus.

pub mod dispatcher;
pub mod handlers;
pub mod locks;
pub mod menu;
pub mod quick_actions;

pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use handlers::{Handlers, UserCtx};
pub use locks::UserLocks;
pub use menu::{main_menu, MenuScheduler};
pub use quick_actions::QuickAction;

use chrono::{FixedOffset, Offset, Utc};
use std::time::Duration;

pub const DEFAULT_MENU_DELAY_MS: u64 = 2500;
pub const DEFAULT_STATE_TTL_SECS: i64 = 600;
/// Brasília time.
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = -3;
pub const DEFAULT_COMPETITION: &str = "brasileirao";

#[derive(Debug, Clone)]
pub struct DialogueSettings {
    pub menu_delay: Duration,
    pub state_ttl: chrono::Duration,
    /// Offset used for "today", "tomorrow" and kickoff times.
    pub utc_offset: FixedOffset,
    /// Competition used for table and scorer questions that name none.
    pub default_competition: Option<String>,
}

impl Default for DialogueSettings {
    fn default() -> Self {
        Self {
            menu_delay: Duration::from_millis(DEFAULT_MENU_DELAY_MS),
            state_ttl: chrono::Duration::seconds(DEFAULT_STATE_TTL_SECS),
            utc_offset: offset_from_hours(DEFAULT_UTC_OFFSET_HOURS),
            default_competition: Some(DEFAULT_COMPETITION.to_string()),
        }
    }
}

/// Fixed offset for whole hours east of UTC; out-of-range values fall back to UTC.
pub fn offset_from_hours(hours: i32) -> FixedOffset {
    FixedOffset::east_opt(hours.saturating_mul(3600)).unwrap_or_else(|| Utc.fix())
}
