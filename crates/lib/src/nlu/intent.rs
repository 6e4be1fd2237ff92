//! Intent model: the closed set of intents, extracted entities and the classification result.

use serde::{Deserialize, Serialize};

/// What the user wants. Labels are the snake_case names used on the wire and by the AI backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    Greeting,
    Farewell,
    Thanks,
    Help,
    NextMatch,
    LastMatch,
    MatchesToday,
    MatchesTomorrow,
    LiveMatches,
    Standings,
    TopScorers,
    TeamInfo,
    TeamSquad,
    PlayerInfo,
    Broadcast,
    SpecificMatchBroadcast,
    CompetitionInfo,
    SetFavoriteTeam,
    MyTeam,
    News,
    Unknown,
}

impl IntentKind {
    /// Every intent except `Unknown`, in the order they are described to the AI backend.
    pub const KNOWN: [IntentKind; 20] = [
        IntentKind::Greeting,
        IntentKind::Farewell,
        IntentKind::Thanks,
        IntentKind::Help,
        IntentKind::NextMatch,
        IntentKind::LastMatch,
        IntentKind::MatchesToday,
        IntentKind::MatchesTomorrow,
        IntentKind::LiveMatches,
        IntentKind::Standings,
        IntentKind::TopScorers,
        IntentKind::TeamInfo,
        IntentKind::TeamSquad,
        IntentKind::PlayerInfo,
        IntentKind::Broadcast,
        IntentKind::SpecificMatchBroadcast,
        IntentKind::CompetitionInfo,
        IntentKind::SetFavoriteTeam,
        IntentKind::MyTeam,
        IntentKind::News,
    ];

    pub fn label(self) -> &'static str {
        match self {
            IntentKind::Greeting => "greeting",
            IntentKind::Farewell => "farewell",
            IntentKind::Thanks => "thanks",
            IntentKind::Help => "help",
            IntentKind::NextMatch => "next_match",
            IntentKind::LastMatch => "last_match",
            IntentKind::MatchesToday => "matches_today",
            IntentKind::MatchesTomorrow => "matches_tomorrow",
            IntentKind::LiveMatches => "live_matches",
            IntentKind::Standings => "standings",
            IntentKind::TopScorers => "top_scorers",
            IntentKind::TeamInfo => "team_info",
            IntentKind::TeamSquad => "team_squad",
            IntentKind::PlayerInfo => "player_info",
            IntentKind::Broadcast => "broadcast",
            IntentKind::SpecificMatchBroadcast => "specific_match_broadcast",
            IntentKind::CompetitionInfo => "competition_info",
            IntentKind::SetFavoriteTeam => "set_favorite_team",
            IntentKind::MyTeam => "my_team",
            IntentKind::News => "news",
            IntentKind::Unknown => "unknown",
        }
    }

    /// Parse a known label. Returns None for anything outside the closed set, including "unknown".
    pub fn from_label(label: &str) -> Option<IntentKind> {
        let label = label.trim().to_ascii_lowercase();
        Self::KNOWN.into_iter().find(|k| k.label() == label)
    }

    /// One-line description handed to the AI backend.
    pub fn description(self) -> &'static str {
        match self {
            IntentKind::Greeting => "user says hello",
            IntentKind::Farewell => "user says goodbye",
            IntentKind::Thanks => "user thanks the assistant",
            IntentKind::Help => "user asks what the assistant can do or for the menu",
            IntentKind::NextMatch => "next fixture of a team",
            IntentKind::LastMatch => "result of the last match of a team",
            IntentKind::MatchesToday => "all fixtures scheduled for today",
            IntentKind::MatchesTomorrow => "all fixtures scheduled for tomorrow",
            IntentKind::LiveMatches => "matches being played right now",
            IntentKind::Standings => "league table of a competition",
            IntentKind::TopScorers => "top scorers of a competition",
            IntentKind::TeamInfo => "general information about a team (stadium, city, founded)",
            IntentKind::TeamSquad => "players of a team",
            IntentKind::PlayerInfo => "information about a specific player",
            IntentKind::Broadcast => "where to watch the next match of a team",
            IntentKind::SpecificMatchBroadcast => "where to watch a specific fixture between two teams",
            IntentKind::CompetitionInfo => "information about a competition",
            IntentKind::SetFavoriteTeam => "user wants to set or change their favorite team",
            IntentKind::MyTeam => "news and next match of the user's favorite team",
            IntentKind::News => "latest football news",
            IntentKind::Unknown => "anything else",
        }
    }

    /// Intents whose answer is followed by the main menu on the messaging app.
    pub fn wants_follow_up_menu(self) -> bool {
        matches!(
            self,
            IntentKind::Greeting
                | IntentKind::NextMatch
                | IntentKind::LastMatch
                | IntentKind::MatchesToday
                | IntentKind::MatchesTomorrow
                | IntentKind::Standings
                | IntentKind::TopScorers
                | IntentKind::Broadcast
                | IntentKind::SpecificMatchBroadcast
                | IntentKind::MyTeam
        )
    }

    /// Which entity family the intent consumes.
    pub fn family(self) -> EntityFamily {
        match self {
            IntentKind::NextMatch
            | IntentKind::LastMatch
            | IntentKind::TeamInfo
            | IntentKind::TeamSquad
            | IntentKind::Broadcast
            | IntentKind::SetFavoriteTeam => EntityFamily::Team,
            IntentKind::SpecificMatchBroadcast => EntityFamily::MatchPair,
            IntentKind::Standings | IntentKind::TopScorers | IntentKind::CompetitionInfo => {
                EntityFamily::Competition
            }
            IntentKind::PlayerInfo => EntityFamily::Player,
            _ => EntityFamily::None,
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityFamily {
    None,
    Team,
    MatchPair,
    Competition,
    Player,
}

/// Entities extracted for one message, shaped per intent family.
///
/// Team and competition values are canonical ids when resolved locally; names
/// supplied only by the AI backend are kept as-is and looked up by the handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum EntityQuery {
    #[default]
    None,
    #[serde(rename_all = "camelCase")]
    Team { team: String },
    #[serde(rename_all = "camelCase")]
    MatchPair { home_team: String, away_team: String },
    #[serde(rename_all = "camelCase")]
    Competition { competition: String },
    #[serde(rename_all = "camelCase")]
    Player { player: String },
}

impl EntityQuery {
    pub fn team(&self) -> Option<&str> {
        match self {
            EntityQuery::Team { team } => Some(team),
            _ => None,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, EntityQuery::None)
    }
}

/// Pipeline stage that produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTier {
    Cache,
    Pattern,
    Ai,
    Legacy,
}

/// Outcome of classifying one message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResult {
    pub intent: IntentKind,
    pub confidence: f32,
    pub entities: EntityQuery,
    pub reasoning: String,
    pub source: SourceTier,
}

impl IntentResult {
    pub fn new(
        intent: IntentKind,
        confidence: f32,
        entities: EntityQuery,
        reasoning: impl Into<String>,
        source: SourceTier,
    ) -> Self {
        Self {
            intent,
            confidence: confidence.clamp(0.0, 1.0),
            entities,
            reasoning: reasoning.into(),
            source,
        }
    }

    /// Fallback result when nothing matched.
    pub fn unknown(reasoning: impl Into<String>) -> Self {
        Self::new(
            IntentKind::Unknown,
            0.30,
            EntityQuery::None,
            reasoning,
            SourceTier::Legacy,
        )
    }
}
