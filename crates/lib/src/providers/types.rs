//! Football records returned by data providers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical team id (slug, e.g. "sao-paulo").
pub type TeamId = String;

/// Canonical competition id (slug, e.g. "brasileirao").
pub type CompetitionId = String;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub short_name: Option<String>,
    /// Free-form variants users type ("fla", "mengao", "spfc").
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub stadium: Option<String>,
    #[serde(default)]
    pub founded: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Competition {
    pub id: CompetitionId,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub season: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    Live,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub competition: CompetitionId,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub kickoff: DateTime<Utc>,
    #[serde(default)]
    pub status: MatchStatus,
    #[serde(default)]
    pub home_score: Option<u8>,
    #[serde(default)]
    pub away_score: Option<u8>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub round: Option<String>,
}

impl Match {
    pub fn involves(&self, team: &str) -> bool {
        self.home_team == team || self.away_team == team
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow {
    pub position: u16,
    pub team: TeamId,
    pub points: u16,
    pub played: u16,
    #[serde(default)]
    pub wins: u16,
    #[serde(default)]
    pub draws: u16,
    #[serde(default)]
    pub losses: u16,
    #[serde(default)]
    pub goal_difference: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scorer {
    pub player: String,
    pub team: TeamId,
    pub goals: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub team: TeamId,
    #[serde(default)]
    pub position: Option<String>,
    #[serde(default)]
    pub number: Option<u8>,
    #[serde(default)]
    pub age: Option<u8>,
    #[serde(default)]
    pub goals: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Broadcast {
    pub match_id: String,
    pub channel: String,
    /// "tv", "streaming", "radio" (free text).
    #[serde(default)]
    pub medium: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsItem {
    pub title: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub team: Option<TeamId>,
    pub published_at: DateTime<Utc>,
}
