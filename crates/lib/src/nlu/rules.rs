//! Rule tiers: exact quick patterns and the ordered keyword (legacy) rules.
//!
//! Both work on normalized text (see `text::normalize_text`).

use crate::nlu::intent::{EntityQuery, IntentKind, IntentResult, SourceTier};
use crate::nlu::resolver::EntityResolver;
use crate::nlu::text::{contains_word, has_any_word};

/// Exact inputs answered without any further work.
const QUICK_PATTERNS: &[(&str, IntentKind, f32)] = &[
    ("oi", IntentKind::Greeting, 0.95),
    ("ola", IntentKind::Greeting, 0.95),
    ("opa", IntentKind::Greeting, 0.95),
    ("e ai", IntentKind::Greeting, 0.95),
    ("eai", IntentKind::Greeting, 0.95),
    ("salve", IntentKind::Greeting, 0.95),
    ("bom dia", IntentKind::Greeting, 0.95),
    ("boa tarde", IntentKind::Greeting, 0.95),
    ("boa noite", IntentKind::Greeting, 0.95),
    ("hello", IntentKind::Greeting, 0.9),
    ("meu time", IntentKind::MyTeam, 0.95),
    ("tabela", IntentKind::Standings, 0.95),
    ("classificacao", IntentKind::Standings, 0.95),
    ("artilharia", IntentKind::TopScorers, 0.95),
    ("artilheiros", IntentKind::TopScorers, 0.95),
    ("jogos de hoje", IntentKind::MatchesToday, 0.95),
    ("jogos hoje", IntentKind::MatchesToday, 0.95),
    ("jogos de amanha", IntentKind::MatchesTomorrow, 0.95),
    ("jogos amanha", IntentKind::MatchesTomorrow, 0.95),
    ("ao vivo", IntentKind::LiveMatches, 0.9),
    ("jogos ao vivo", IntentKind::LiveMatches, 0.95),
    ("ajuda", IntentKind::Help, 0.95),
    ("menu", IntentKind::Help, 0.95),
    ("help", IntentKind::Help, 0.9),
    ("obrigado", IntentKind::Thanks, 0.9),
    ("obrigada", IntentKind::Thanks, 0.9),
    ("valeu", IntentKind::Thanks, 0.9),
    ("tchau", IntentKind::Farewell, 0.9),
    ("ate mais", IntentKind::Farewell, 0.9),
    ("noticias", IntentKind::News, 0.9),
];

const GREETING_WORDS: &[&str] = &["oi", "ola", "opa", "salve", "bom dia", "boa tarde", "boa noite"];
const BROADCAST_WORDS: &[&str] = &[
    "onde", "transmissao", "transmite", "transmitir", "assistir", "canal", "passa", "passar",
];
const MATCH_WORDS: &[&str] = &["jogo", "jogos", "partida", "partidas", "rodada"];

/// Longest message (in words) still read as "just a team name".
const BARE_TEAM_MAX_WORDS: usize = 4;

/// Pattern tier: exact match on the whole normalized message.
pub fn quick_pattern(key: &str) -> Option<IntentResult> {
    QUICK_PATTERNS
        .iter()
        .find(|(pattern, _, _)| *pattern == key)
        .map(|(pattern, intent, confidence)| {
            IntentResult::new(
                *intent,
                *confidence,
                EntityQuery::None,
                format!("exact pattern \"{}\"", pattern),
                SourceTier::Pattern,
            )
        })
}

fn team_query(resolver: &EntityResolver, key: &str) -> EntityQuery {
    match resolver.resolve_team(key).team {
        Some(team) => EntityQuery::Team { team },
        None => EntityQuery::None,
    }
}

fn competition_query(resolver: &EntityResolver, key: &str) -> EntityQuery {
    match resolver.resolve_competition(key) {
        Some(competition) => EntityQuery::Competition { competition },
        None => EntityQuery::None,
    }
}

fn legacy(intent: IntentKind, confidence: f32, entities: EntityQuery, rule: &str) -> IntentResult {
    IntentResult::new(intent, confidence, entities, rule, SourceTier::Legacy)
}

/// Legacy tier: ordered keyword rules; the first rule that fires wins.
pub fn legacy_rules(key: &str, resolver: &EntityResolver) -> IntentResult {
    let words = key.split_whitespace().count();

    if (has_any_word(key, &["proximo", "proxima"]) && has_any_word(key, MATCH_WORDS))
        || key.contains("quando joga")
    {
        return legacy(IntentKind::NextMatch, 0.8, team_query(resolver, key), "next-match keywords");
    }

    if (has_any_word(key, &["ultimo", "ultima"]) && has_any_word(key, MATCH_WORDS))
        || has_any_word(key, &["resultado", "placar"])
        || key.contains("como foi o jogo")
        || key.contains("quanto ficou")
    {
        return legacy(IntentKind::LastMatch, 0.8, team_query(resolver, key), "last-match keywords");
    }

    if has_any_word(key, BROADCAST_WORDS) {
        if let Some(pair) = resolver.resolve_match_pair(key) {
            return legacy(
                IntentKind::SpecificMatchBroadcast,
                0.85,
                EntityQuery::MatchPair {
                    home_team: pair.home_team,
                    away_team: pair.away_team,
                },
                "broadcast keywords with fixture",
            );
        }
        return legacy(IntentKind::Broadcast, 0.75, team_query(resolver, key), "broadcast keywords");
    }

    if has_any_word(key, &["tabela", "classificacao"]) {
        return legacy(IntentKind::Standings, 0.8, competition_query(resolver, key), "table keywords");
    }

    if has_any_word(
        key,
        &["artilheiro", "artilheiros", "artilharia", "goleador", "goleadores"],
    ) {
        return legacy(IntentKind::TopScorers, 0.8, competition_query(resolver, key), "scorer keywords");
    }

    if contains_word(key, "ao vivo") {
        return legacy(IntentKind::LiveMatches, 0.75, EntityQuery::None, "live keywords");
    }

    if has_any_word(key, MATCH_WORDS) && has_any_word(key, &["hoje", "hj"]) {
        return legacy(IntentKind::MatchesToday, 0.75, EntityQuery::None, "today keywords");
    }

    if has_any_word(key, MATCH_WORDS) && contains_word(key, "amanha") {
        return legacy(IntentKind::MatchesTomorrow, 0.75, EntityQuery::None, "tomorrow keywords");
    }

    if has_any_word(key, &["favorito", "torco", "coracao"]) || key.starts_with("meu time e ") {
        return legacy(
            IntentKind::SetFavoriteTeam,
            0.75,
            team_query(resolver, key),
            "favorite-team keywords",
        );
    }

    if has_any_word(key, &["elenco", "escalacao", "plantel"]) {
        return legacy(IntentKind::TeamSquad, 0.7, team_query(resolver, key), "squad keywords");
    }

    if has_any_word(key, &["jogador", "atleta"]) {
        let entities = match resolver.extract_player(key) {
            Some(player) => EntityQuery::Player { player },
            None => EntityQuery::None,
        };
        return legacy(IntentKind::PlayerInfo, 0.7, entities, "player keywords");
    }

    if has_any_word(key, &["noticia", "noticias", "novidades"]) {
        return legacy(IntentKind::News, 0.7, EntityQuery::None, "news keywords");
    }

    if has_any_word(key, &["campeonato", "competicao", "torneio"]) {
        return legacy(
            IntentKind::CompetitionInfo,
            0.7,
            competition_query(resolver, key),
            "competition keywords",
        );
    }

    if has_any_word(key, &["estadio", "fundado", "fundacao", "historia"]) {
        return legacy(IntentKind::TeamInfo, 0.7, team_query(resolver, key), "team-info keywords");
    }

    if GREETING_WORDS.iter().any(|g| key.starts_with(&format!("{} ", g))) {
        return legacy(IntentKind::Greeting, 0.7, EntityQuery::None, "greeting prefix");
    }

    if has_any_word(key, &["ajuda", "comandos", "opcoes", "menu"]) {
        return legacy(IntentKind::Help, 0.7, EntityQuery::None, "help keywords");
    }

    if key.starts_with("obrigad") || contains_word(key, "valeu") {
        return legacy(IntentKind::Thanks, 0.7, EntityQuery::None, "thanks keywords");
    }

    if has_any_word(key, &["tchau", "falou", "ate mais", "ate logo"]) {
        return legacy(IntentKind::Farewell, 0.7, EntityQuery::None, "farewell keywords");
    }

    if words <= BARE_TEAM_MAX_WORDS {
        if let EntityQuery::Team { team } = team_query(resolver, key) {
            return legacy(
                IntentKind::NextMatch,
                0.65,
                EntityQuery::Team { team },
                "bare team name",
            );
        }
    }

    IntentResult::unknown("no rule matched")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlu::aliases::TeamAliasIndex;
    use crate::nlu::text::normalize_text;
    use crate::providers::Competition;

    fn resolver() -> EntityResolver {
        let r = EntityResolver::new(TeamAliasIndex::from_pairs([
            ("flamengo", "flamengo"),
            ("bahia", "bahia"),
            ("fluminense", "fluminense"),
            ("palmeiras", "palmeiras"),
        ]));
        r.set_competitions(&[Competition {
            id: "libertadores".into(),
            name: "Copa Libertadores".into(),
            aliases: vec![],
            season: None,
        }]);
        r
    }

    fn classify(text: &str) -> IntentResult {
        legacy_rules(&normalize_text(text), &resolver())
    }

    #[test]
    fn quick_patterns_are_exact() {
        let r = quick_pattern("oi").unwrap();
        assert_eq!(r.intent, IntentKind::Greeting);
        assert!(r.confidence >= 0.9);
        assert_eq!(r.source, SourceTier::Pattern);
        assert!(quick_pattern("oi tudo bem").is_none());
        assert_eq!(quick_pattern("meu time").unwrap().intent, IntentKind::MyTeam);
    }

    #[test]
    fn next_match_with_team() {
        let r = classify("próximo jogo do flamengo");
        assert_eq!(r.intent, IntentKind::NextMatch);
        assert_eq!(r.entities.team(), Some("flamengo"));
        assert_eq!(r.source, SourceTier::Legacy);
    }

    #[test]
    fn broadcast_prefers_fixture_pair() {
        let r = classify("onde passa bahia x fluminense");
        assert_eq!(r.intent, IntentKind::SpecificMatchBroadcast);
        assert_eq!(
            r.entities,
            EntityQuery::MatchPair {
                home_team: "bahia".into(),
                away_team: "fluminense".into()
            }
        );
        let r = classify("onde vai passar o jogo do palmeiras");
        assert_eq!(r.intent, IntentKind::Broadcast);
        assert_eq!(r.entities.team(), Some("palmeiras"));
    }

    #[test]
    fn table_and_scorers_pick_competition() {
        let r = classify("tabela da libertadores");
        assert_eq!(r.intent, IntentKind::Standings);
        assert_eq!(
            r.entities,
            EntityQuery::Competition {
                competition: "libertadores".into()
            }
        );
        assert_eq!(classify("quem é o artilheiro").intent, IntentKind::TopScorers);
    }

    #[test]
    fn day_and_live_rules() {
        assert_eq!(classify("tem jogo hoje?").intent, IntentKind::MatchesToday);
        assert_eq!(classify("quais jogos amanhã").intent, IntentKind::MatchesTomorrow);
        assert_eq!(classify("o que tá rolando ao vivo").intent, IntentKind::LiveMatches);
    }

    #[test]
    fn favorite_and_player_rules() {
        let r = classify("meu time é o palmeiras");
        assert_eq!(r.intent, IntentKind::SetFavoriteTeam);
        assert_eq!(r.entities.team(), Some("palmeiras"));
        let r = classify("jogador gabigol");
        assert_eq!(r.intent, IntentKind::PlayerInfo);
        assert_eq!(r.entities, EntityQuery::Player { player: "Gabigol".into() });
    }

    #[test]
    fn bare_team_name_is_next_match() {
        let r = classify("Flamengo");
        assert_eq!(r.intent, IntentKind::NextMatch);
        assert!(r.confidence < 0.7);
    }

    #[test]
    fn nothing_matches_unknown() {
        let r = classify("qual a previsão do tempo em recife amanhã de manhã");
        assert_eq!(r.intent, IntentKind::Unknown);
        assert_eq!(r.confidence, 0.30);
    }
}
