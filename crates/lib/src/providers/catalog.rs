//! JSON catalog provider: teams, fixtures, tables and broadcasts loaded from one file.

use super::{
    Broadcast, Competition, FootballData, Match, MatchStatus, NewsItem, Player, ProviderError,
    Scorer, StandingRow, Team, TeamId, UserPreferences,
};
use crate::nlu::text::normalize_text;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shorter queries only match a team name or alias exactly.
const MIN_PARTIAL_QUERY_CHARS: usize = 3;

/// On-disk catalog layout (`catalog.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub competitions: Vec<Competition>,
    #[serde(default)]
    pub matches: Vec<Match>,
    /// competition id -> table rows (already ranked).
    #[serde(default)]
    pub standings: HashMap<String, Vec<StandingRow>>,
    /// competition id -> scorers (already ranked).
    #[serde(default)]
    pub scorers: HashMap<String, Vec<Scorer>>,
    #[serde(default)]
    pub players: Vec<Player>,
    #[serde(default)]
    pub broadcasts: Vec<Broadcast>,
    #[serde(default)]
    pub news: Vec<NewsItem>,
}

impl Catalog {
    /// Read a catalog file. Missing file => empty catalog.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::warn!("catalog not found at {}, starting with no data", path.display());
            return Ok(Self::default());
        }
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog from {}", path.display()))?;
        serde_json::from_str(&s).with_context(|| format!("parsing catalog from {}", path.display()))
    }
}

/// In-memory provider over a `Catalog`.
pub struct CatalogProvider {
    catalog: Catalog,
    utc_offset: FixedOffset,
    pinned_now: Option<DateTime<Utc>>,
}

impl CatalogProvider {
    pub fn new(catalog: Catalog, utc_offset: FixedOffset) -> Self {
        Self {
            catalog,
            utc_offset,
            pinned_now: None,
        }
    }

    /// Freeze "now" (used by tests and simulations over historical catalogs).
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.pinned_now = Some(now);
        self
    }

    fn now(&self) -> DateTime<Utc> {
        self.pinned_now.unwrap_or_else(Utc::now)
    }

    fn local_day(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.utc_offset).date_naive()
    }
}

fn team_variants(team: &Team) -> impl Iterator<Item = String> + '_ {
    std::iter::once(team.name.as_str())
        .chain(team.short_name.as_deref())
        .chain(std::iter::once(team.id.as_str()))
        .chain(team.aliases.iter().map(String::as_str))
        .map(normalize_text)
}

#[async_trait]
impl FootballData for CatalogProvider {
    async fn list_teams(&self) -> Result<Vec<Team>, ProviderError> {
        Ok(self.catalog.teams.clone())
    }

    async fn list_competitions(&self) -> Result<Vec<Competition>, ProviderError> {
        Ok(self.catalog.competitions.clone())
    }

    async fn find_team_candidates(&self, name: &str) -> Result<Vec<Team>, ProviderError> {
        let needle = normalize_text(name);
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let allow_partial = needle.chars().count() >= MIN_PARTIAL_QUERY_CHARS;
        let mut exact = Vec::new();
        let mut partial = Vec::new();
        for team in &self.catalog.teams {
            let variants: Vec<String> = team_variants(team).collect();
            if variants.iter().any(|v| *v == needle) {
                exact.push(team.clone());
            } else if allow_partial
                && variants
                    .iter()
                    .any(|v| v.contains(&needle) || (v.len() > 3 && needle.contains(v.as_str())))
            {
                partial.push(team.clone());
            }
        }
        exact.extend(partial);
        Ok(exact)
    }

    async fn find_next_match(&self, team: &str) -> Result<Option<Match>, ProviderError> {
        let now = self.now();
        Ok(self
            .catalog
            .matches
            .iter()
            .filter(|m| m.involves(team) && m.status != MatchStatus::Finished && m.kickoff >= now)
            .min_by_key(|m| m.kickoff)
            .cloned())
    }

    async fn find_last_match(&self, team: &str) -> Result<Option<Match>, ProviderError> {
        Ok(self
            .catalog
            .matches
            .iter()
            .filter(|m| m.involves(team) && m.status == MatchStatus::Finished)
            .max_by_key(|m| m.kickoff)
            .cloned())
    }

    async fn matches_on(&self, day: NaiveDate) -> Result<Vec<Match>, ProviderError> {
        let mut out: Vec<Match> = self
            .catalog
            .matches
            .iter()
            .filter(|m| self.local_day(m.kickoff) == day)
            .cloned()
            .collect();
        out.sort_by_key(|m| m.kickoff);
        Ok(out)
    }

    async fn live_matches(&self) -> Result<Vec<Match>, ProviderError> {
        Ok(self
            .catalog
            .matches
            .iter()
            .filter(|m| m.status == MatchStatus::Live)
            .cloned()
            .collect())
    }

    async fn find_match_between(
        &self,
        team_a: &str,
        team_b: &str,
    ) -> Result<Option<Match>, ProviderError> {
        let now = self.now();
        let between: Vec<&Match> = self
            .catalog
            .matches
            .iter()
            .filter(|m| m.involves(team_a) && m.involves(team_b))
            .collect();
        let upcoming = between
            .iter()
            .filter(|m| m.status != MatchStatus::Finished && m.kickoff >= now)
            .min_by_key(|m| m.kickoff);
        let found = upcoming.or_else(|| between.iter().max_by_key(|m| m.kickoff));
        Ok(found.map(|m| (*m).clone()))
    }

    async fn get_standings(&self, competition: &str) -> Result<Vec<StandingRow>, ProviderError> {
        self.catalog
            .standings
            .get(competition)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("standings for {}", competition)))
    }

    async fn top_scorers(&self, competition: &str) -> Result<Vec<Scorer>, ProviderError> {
        Ok(self
            .catalog
            .scorers
            .get(competition)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_broadcasts_for_match(&self, match_id: &str) -> Result<Vec<Broadcast>, ProviderError> {
        Ok(self
            .catalog
            .broadcasts
            .iter()
            .filter(|b| b.match_id == match_id)
            .cloned()
            .collect())
    }

    async fn find_players(&self, name: &str) -> Result<Vec<Player>, ProviderError> {
        let needle = normalize_text(name);
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .catalog
            .players
            .iter()
            .filter(|p| normalize_text(&p.name).contains(&needle))
            .cloned()
            .collect())
    }

    async fn team_squad(&self, team: &str) -> Result<Vec<Player>, ProviderError> {
        let mut squad: Vec<Player> = self
            .catalog
            .players
            .iter()
            .filter(|p| p.team == team)
            .cloned()
            .collect();
        squad.sort_by_key(|p| p.number.unwrap_or(u8::MAX));
        Ok(squad)
    }

    async fn latest_news(&self, limit: usize) -> Result<Vec<NewsItem>, ProviderError> {
        let mut news = self.catalog.news.clone();
        news.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        news.truncate(limit);
        Ok(news)
    }
}

/// Favorite teams kept in memory for the process lifetime.
pub struct InMemoryPreferences {
    inner: Arc<RwLock<HashMap<String, TeamId>>>,
}

impl Default for InMemoryPreferences {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryPreferences {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl UserPreferences for InMemoryPreferences {
    async fn favorite_team(&self, user: &str) -> Result<Option<TeamId>, ProviderError> {
        Ok(self.inner.read().await.get(user).cloned())
    }

    async fn set_favorite_team(&self, user: &str, team: &str) -> Result<(), ProviderError> {
        self.inner
            .write()
            .await
            .insert(user.to_string(), team.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn team(id: &str, name: &str, aliases: &[&str]) -> Team {
        Team {
            id: id.to_string(),
            name: name.to_string(),
            short_name: None,
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            city: None,
            stadium: None,
            founded: None,
        }
    }

    fn fixture(id: &str, home: &str, away: &str, day: u32, status: MatchStatus) -> Match {
        Match {
            id: id.to_string(),
            competition: "brasileirao".to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            kickoff: Utc.with_ymd_and_hms(2026, 10, day, 22, 0, 0).unwrap(),
            status,
            home_score: None,
            away_score: None,
            venue: None,
            round: None,
        }
    }

    fn provider() -> CatalogProvider {
        let catalog = Catalog {
            teams: vec![
                team("flamengo", "Flamengo", &["mengao", "fla"]),
                team("fluminense", "Fluminense", &["flu"]),
            ],
            matches: vec![
                fixture("m1", "flamengo", "fluminense", 10, MatchStatus::Finished),
                fixture("m2", "fluminense", "flamengo", 20, MatchStatus::Scheduled),
                fixture("m3", "flamengo", "bahia", 25, MatchStatus::Scheduled),
            ],
            ..Catalog::default()
        };
        let offset = FixedOffset::west_opt(3 * 3600).unwrap();
        CatalogProvider::new(catalog, offset).with_now(Utc.with_ymd_and_hms(2026, 10, 15, 12, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn next_and_last_match_respect_now() {
        let p = provider();
        assert_eq!(p.find_next_match("flamengo").await.unwrap().unwrap().id, "m2");
        assert_eq!(p.find_last_match("flamengo").await.unwrap().unwrap().id, "m1");
    }

    #[tokio::test]
    async fn match_between_prefers_upcoming() {
        let p = provider();
        let m = p.find_match_between("flamengo", "fluminense").await.unwrap().unwrap();
        assert_eq!(m.id, "m2");
    }

    #[tokio::test]
    async fn kickoff_day_uses_display_offset() {
        let p = provider();
        // 22:00 UTC is 19:00 at -03:00, same calendar day.
        let day = NaiveDate::from_ymd_opt(2026, 10, 20).unwrap();
        assert_eq!(p.matches_on(day).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn team_candidates_rank_exact_first() {
        let p = provider();
        let found = p.find_team_candidates("flu").await.unwrap();
        assert_eq!(found[0].id, "fluminense");
        let found = p.find_team_candidates("flam").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "flamengo");
    }

    #[tokio::test]
    async fn short_queries_only_match_exactly() {
        let p = provider();
        assert!(p.find_team_candidates("a").await.unwrap().is_empty());
        assert!(p.find_team_candidates("fl").await.unwrap().is_empty());
        assert!(p.find_team_candidates("  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_standings_is_not_found() {
        let p = provider();
        assert!(matches!(
            p.get_standings("libertadores").await,
            Err(ProviderError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn preferences_store_favorite() {
        let prefs = InMemoryPreferences::new();
        assert_eq!(prefs.favorite_team("5511").await.unwrap(), None);
        prefs.set_favorite_team("5511", "palmeiras").await.unwrap();
        assert_eq!(prefs.favorite_team("5511").await.unwrap().as_deref(), Some("palmeiras"));
    }
}
