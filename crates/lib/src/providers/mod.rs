//! Data providers: read-only football data and per-user preferences.
//!
//! The assistant only talks to these traits. `CatalogProvider` is a JSON-file
//! backed implementation used for local runs and tests.

mod catalog;
mod types;

pub use catalog::{Catalog, CatalogProvider, InMemoryPreferences};
pub use types::{
    Broadcast, Competition, CompetitionId, Match, MatchStatus, NewsItem, Player, Scorer,
    StandingRow, Team, TeamId,
};

use async_trait::async_trait;
use chrono::NaiveDate;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("data source unavailable: {0}")]
    Unavailable(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("data source error: {0}")]
    Backend(String),
}

/// Read-only football data. Every call may fail; handlers catch failures.
#[async_trait]
pub trait FootballData: Send + Sync {
    async fn list_teams(&self) -> Result<Vec<Team>, ProviderError>;

    async fn list_competitions(&self) -> Result<Vec<Competition>, ProviderError>;

    /// Teams whose name or aliases loosely match `name`, best first. Very short
    /// queries should only match exactly.
    async fn find_team_candidates(&self, name: &str) -> Result<Vec<Team>, ProviderError>;

    async fn find_next_match(&self, team: &str) -> Result<Option<Match>, ProviderError>;

    async fn find_last_match(&self, team: &str) -> Result<Option<Match>, ProviderError>;

    /// Fixtures on a calendar day in the assistant's display timezone.
    async fn matches_on(&self, day: NaiveDate) -> Result<Vec<Match>, ProviderError>;

    async fn live_matches(&self) -> Result<Vec<Match>, ProviderError>;

    /// Next (or most recent, when none is upcoming) fixture between two teams, either side at home.
    async fn find_match_between(
        &self,
        team_a: &str,
        team_b: &str,
    ) -> Result<Option<Match>, ProviderError>;

    async fn get_standings(&self, competition: &str) -> Result<Vec<StandingRow>, ProviderError>;

    async fn top_scorers(&self, competition: &str) -> Result<Vec<Scorer>, ProviderError>;

    async fn get_broadcasts_for_match(&self, match_id: &str) -> Result<Vec<Broadcast>, ProviderError>;

    async fn find_players(&self, name: &str) -> Result<Vec<Player>, ProviderError>;

    async fn team_squad(&self, team: &str) -> Result<Vec<Player>, ProviderError>;

    async fn latest_news(&self, limit: usize) -> Result<Vec<NewsItem>, ProviderError>;
}

/// Per-user settings (favorite team).
#[async_trait]
pub trait UserPreferences: Send + Sync {
    async fn favorite_team(&self, user: &str) -> Result<Option<TeamId>, ProviderError>;

    async fn set_favorite_team(&self, user: &str, team: &str) -> Result<(), ProviderError>;
}
