//! Quick-action tokens: `qa:<intent>` or `qa:<intent>:<arg>`.
//!
//! Menu options carry these as their ids; when a user picks one, the token
//! comes back as the message text and is routed without classification.

use crate::nlu::intent::{EntityFamily, EntityQuery, IntentKind};

const PREFIX: &str = "qa:";

/// Separator between the two teams of a fixture argument (`qa:specific_match_broadcast:bahia+fluminense`).
const PAIR_SEPARATOR: char = '+';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuickAction {
    pub intent: IntentKind,
    pub arg: Option<String>,
}

impl QuickAction {
    pub fn new(intent: IntentKind, arg: Option<&str>) -> Self {
        Self {
            intent,
            arg: arg.map(str::to_string),
        }
    }

    /// Parse a token. Anything that is not a well-formed token for a known intent is None.
    pub fn parse(text: &str) -> Option<Self> {
        let rest = text.trim().strip_prefix(PREFIX)?;
        let (action, arg) = match rest.split_once(':') {
            Some((action, arg)) => (action, Some(arg.trim()).filter(|a| !a.is_empty())),
            None => (rest, None),
        };
        let intent = IntentKind::from_label(action)?;
        Some(Self::new(intent, arg))
    }

    pub fn token(&self) -> String {
        match &self.arg {
            Some(arg) => format!("{}{}:{}", PREFIX, self.intent.label(), arg),
            None => format!("{}{}", PREFIX, self.intent.label()),
        }
    }

    /// Entities carried by the argument, shaped for the intent's family.
    pub fn entities(&self) -> EntityQuery {
        let Some(arg) = self.arg.clone() else {
            return EntityQuery::None;
        };
        match self.intent.family() {
            EntityFamily::Team => EntityQuery::Team { team: arg },
            EntityFamily::Competition => EntityQuery::Competition { competition: arg },
            EntityFamily::Player => EntityQuery::Player { player: arg },
            EntityFamily::MatchPair => match arg.split_once(PAIR_SEPARATOR) {
                Some((home, away)) => EntityQuery::MatchPair {
                    home_team: home.to_string(),
                    away_team: away.to_string(),
                },
                None => EntityQuery::Team { team: arg },
            },
            EntityFamily::None => EntityQuery::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_with_and_without_arg() {
        let qa = QuickAction::parse("qa:next_match:flamengo").unwrap();
        assert_eq!(qa.intent, IntentKind::NextMatch);
        assert_eq!(qa.entities(), EntityQuery::Team { team: "flamengo".into() });
        assert_eq!(qa.token(), "qa:next_match:flamengo");

        let qa = QuickAction::parse(" qa:standings ").unwrap();
        assert_eq!(qa.intent, IntentKind::Standings);
        assert!(qa.entities().is_none());
    }

    #[test]
    fn fixture_argument() {
        let qa = QuickAction::parse("qa:specific_match_broadcast:bahia+fluminense").unwrap();
        assert_eq!(
            qa.entities(),
            EntityQuery::MatchPair {
                home_team: "bahia".into(),
                away_team: "fluminense".into()
            }
        );
    }

    #[test]
    fn rejects_unknown_tokens() {
        assert!(QuickAction::parse("qa:weather").is_none());
        assert!(QuickAction::parse("qa:unknown").is_none());
        assert!(QuickAction::parse("tabela").is_none());
    }
}
