//! Entity resolver: team names (with conflict arbitration), fixture pairs, competitions and players.

use crate::nlu::aliases::{AliasEntry, TeamAliasIndex};
use crate::nlu::text::{contains_at_word_start, contains_word, normalize_text, title_case};
use crate::providers::{Competition, CompetitionId, Team, TeamId};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

/// Names that map to several real clubs, resolved to the conventional one first.
pub const DEFAULT_PRIORITY: &[(&str, &str)] = &[
    ("botafogo", "botafogo"),
    ("atletico", "atletico-mg"),
    ("america", "america-mg"),
];

/// Separators tried in order when reading "A x B" expressions.
const PAIR_SEPARATORS: &[&str] = &[r"\sx\s", r"\s(?:vs|versus)\s", r"\scontra\s", r"\se\s"];

/// Words dropped from both ends of each side of a fixture expression.
const PAIR_STOP_WORDS: &[&str] = &[
    "onde", "passa", "passar", "vai", "vao", "ver", "assistir", "transmissao", "transmite", "canal",
    "qual", "quando", "que", "horas", "hora", "o", "a", "os", "as", "do", "da", "dos", "das", "de",
    "no", "na", "em", "jogo", "partida", "entre", "hoje", "amanha", "hj", "ser", "sera", "tem",
    "pra", "para", "quem", "ganhou", "placar", "resultado", "como", "ficou", "classico",
];

/// Leading cues removed before reading a player name.
const PLAYER_CUES: &[&str] = &[
    "informacoes sobre o jogador",
    "estatisticas do jogador",
    "informacoes do jogador",
    "quem e o jogador",
    "dados do jogador",
    "sobre o jogador",
    "estatisticas de",
    "estatisticas do",
    "estatisticas da",
    "quem e o",
    "quem e a",
    "quem e",
    "jogador",
    "atleta",
    "sobre",
];

const PLAYER_FILLERS: &[&str] = &["o", "a", "do", "da", "de"];

/// Result of resolving a team reference in free text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeamResolution {
    pub team: Option<TeamId>,
    /// Other plausible teams, for "did you mean" lists.
    pub suggestions: Vec<TeamId>,
}

impl TeamResolution {
    pub fn is_ambiguous(&self) -> bool {
        !self.suggestions.is_empty()
    }
}

/// A fixture written as "home x away".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPair {
    pub home_team: TeamId,
    pub away_team: TeamId,
}

struct CompetitionAlias {
    alias: String,
    competition: CompetitionId,
}

/// Resolves entities against the team alias index. The index is shared and rebuilt in place.
pub struct EntityResolver {
    index: RwLock<TeamAliasIndex>,
    competitions: RwLock<Vec<CompetitionAlias>>,
    competition_names: RwLock<HashMap<CompetitionId, String>>,
    /// normalized key -> team id, longest key first.
    priority: Vec<(String, TeamId)>,
    separators: Vec<Regex>,
}

impl EntityResolver {
    pub fn new(index: TeamAliasIndex) -> Self {
        Self::with_priority(index, &BTreeMap::new())
    }

    /// Resolver whose priority table is the default table extended (and overridden) by `overrides`.
    pub fn with_priority(index: TeamAliasIndex, overrides: &BTreeMap<String, String>) -> Self {
        let mut table: BTreeMap<String, TeamId> = DEFAULT_PRIORITY
            .iter()
            .map(|(k, v)| (normalize_text(k), v.to_string()))
            .collect();
        for (k, v) in overrides {
            table.insert(normalize_text(k), v.clone());
        }
        let mut priority: Vec<(String, TeamId)> = table.into_iter().collect();
        priority.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        let separators = PAIR_SEPARATORS
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(r) => Some(r),
                Err(e) => {
                    log::warn!("resolver: invalid separator pattern {}: {}", p, e);
                    None
                }
            })
            .collect();
        Self {
            index: RwLock::new(index),
            competitions: RwLock::new(Vec::new()),
            competition_names: RwLock::new(HashMap::new()),
            priority,
            separators,
        }
    }

    /// Replace the alias index (and competition aliases) with fresh data.
    pub fn rebuild(&self, teams: &[Team], competitions: &[Competition]) {
        let index = TeamAliasIndex::build(teams);
        log::info!(
            "resolver: alias index rebuilt with {} teams, {} aliases",
            index.team_count(),
            index.entries().len()
        );
        *self.index.write().unwrap_or_else(PoisonError::into_inner) = index;
        self.set_competitions(competitions);
    }

    pub fn set_competitions(&self, competitions: &[Competition]) {
        let mut aliases = Vec::new();
        let mut names = HashMap::new();
        for c in competitions {
            names.insert(c.id.clone(), c.name.clone());
            let slug = c.id.replace(['-', '_'], " ");
            for variant in std::iter::once(c.name.as_str())
                .chain(std::iter::once(slug.as_str()))
                .chain(c.aliases.iter().map(String::as_str))
            {
                let alias = normalize_text(variant);
                if !alias.is_empty() {
                    aliases.push(CompetitionAlias {
                        alias,
                        competition: c.id.clone(),
                    });
                }
            }
        }
        aliases.sort_by(|a, b| b.alias.len().cmp(&a.alias.len()));
        *self.competitions.write().unwrap_or_else(PoisonError::into_inner) = aliases;
        *self
            .competition_names
            .write()
            .unwrap_or_else(PoisonError::into_inner) = names;
    }

    pub fn team_name(&self, team: &str) -> Option<String> {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .team_name(team)
            .map(str::to_string)
    }

    /// Display name for a team id, falling back to the id itself.
    pub fn display_team(&self, team: &str) -> String {
        self.team_name(team).unwrap_or_else(|| team.to_string())
    }

    pub fn competition_name(&self, competition: &str) -> Option<String> {
        self.competition_names
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(competition)
            .cloned()
    }

    pub fn is_known_team(&self, team: &str) -> bool {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_team(team)
    }

    /// Find the team referenced in `text`.
    pub fn resolve_team(&self, text: &str) -> TeamResolution {
        let norm = normalize_text(text);
        if norm.is_empty() {
            return TeamResolution::default();
        }
        let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
        let input_len = norm.chars().count();

        // (team, longest overlap), in first-hit order.
        let mut candidates: Vec<(TeamId, usize)> = Vec::new();
        for entry in index.entries() {
            let Some(overlap) = match_overlap(&index, entry, &norm, input_len) else {
                continue;
            };
            match candidates.iter_mut().find(|(t, _)| *t == entry.team) {
                Some((_, best)) => *best = (*best).max(overlap),
                None => candidates.push((entry.team.clone(), overlap)),
            }
        }
        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        let top_overlap = candidates.first().map(|(_, o)| *o).unwrap_or(0);
        if let Some((key, team)) = self
            .priority
            .iter()
            .find(|(key, team)| contains_word(&norm, key) && index.contains_team(team))
        {
            // A strictly longer alias of another team ("botafogo sp") beats the priority entry.
            if key.chars().count() >= top_overlap {
                candidates.retain(|(t, _)| t != team);
                candidates.insert(0, (team.clone(), key.chars().count()));
            }
        }

        let mut ids = candidates.into_iter().map(|(t, _)| t);
        TeamResolution {
            team: ids.next(),
            suggestions: ids.collect(),
        }
    }

    /// Read "A x B" (also "vs", "contra", "e"). Both sides must resolve to different known teams.
    pub fn resolve_match_pair(&self, text: &str) -> Option<MatchPair> {
        let norm = normalize_text(text);
        for sep in &self.separators {
            for m in sep.find_iter(&norm) {
                let left = strip_stop_words(&norm[..m.start()]);
                let right = strip_stop_words(&norm[m.end()..]);
                if left.is_empty() || right.is_empty() {
                    continue;
                }
                let (Some(home), Some(away)) = (
                    self.resolve_team(&left).team,
                    self.resolve_team(&right).team,
                ) else {
                    continue;
                };
                if home != away {
                    return Some(MatchPair {
                        home_team: home,
                        away_team: away,
                    });
                }
            }
        }
        None
    }

    /// Competition mentioned in `text`, by name, slug or alias.
    pub fn resolve_competition(&self, text: &str) -> Option<CompetitionId> {
        let norm = normalize_text(text);
        if norm.is_empty() {
            return None;
        }
        let competitions = self.competitions.read().unwrap_or_else(PoisonError::into_inner);
        competitions
            .iter()
            .find(|c| {
                if c.alias.len() <= 3 {
                    contains_word(&norm, &c.alias)
                } else {
                    contains_at_word_start(&norm, &c.alias)
                }
            })
            .map(|c| c.competition.clone())
    }

    /// Player name following a question cue ("quem e o jogador gabigol" -> "Gabigol").
    /// None when the text has no cue.
    pub fn extract_player(&self, text: &str) -> Option<String> {
        let norm = normalize_text(text);
        let cue = find_player_cue(&norm)?;
        clean_player_name(&norm[cue.len()..])
    }

    /// Player name from a direct answer ("Arrascaeta", "o Pedro"); cues are stripped when present.
    pub fn player_name(&self, text: &str) -> Option<String> {
        let norm = normalize_text(text);
        let rest = match find_player_cue(&norm) {
            Some(cue) => &norm[cue.len()..],
            None => norm.as_str(),
        };
        clean_player_name(rest)
    }
}

fn find_player_cue(norm: &str) -> Option<&'static str> {
    PLAYER_CUES
        .iter()
        .copied()
        .find(|cue| norm == *cue || norm.starts_with(&format!("{} ", cue)))
}

fn clean_player_name(rest: &str) -> Option<String> {
    let words: Vec<&str> = rest
        .split_whitespace()
        .skip_while(|w| PLAYER_FILLERS.contains(w))
        .collect();
    let name = words.join(" ");
    if name.chars().count() < 2 {
        None
    } else {
        Some(title_case(&name))
    }
}

/// Overlap length when `entry` matches the normalized input, None otherwise.
fn match_overlap(
    index: &TeamAliasIndex,
    entry: &AliasEntry,
    norm: &str,
    input_len: usize,
) -> Option<usize> {
    let alias_len = entry.alias.chars().count();
    if entry.is_short() {
        if contains_word(norm, &entry.alias) && !is_shadowed(index, entry, norm) {
            return Some(alias_len);
        }
        return None;
    }
    if contains_at_word_start(norm, &entry.alias) {
        return Some(alias_len);
    }
    if input_len >= 3 && contains_at_word_start(&entry.alias, norm) {
        return Some(input_len);
    }
    None
}

/// A short alias is ignored when a longer alias of another team contains it and is also in the message.
fn is_shadowed(index: &TeamAliasIndex, short: &AliasEntry, norm: &str) -> bool {
    index.entries().iter().any(|other| {
        other.team != short.team
            && other.alias.len() > short.alias.len()
            && other.alias.contains(short.alias.as_str())
            && contains_at_word_start(norm, &other.alias)
    })
}

fn strip_stop_words(side: &str) -> String {
    let words: Vec<&str> = side.split_whitespace().collect();
    let start = words
        .iter()
        .position(|w| !PAIR_STOP_WORDS.contains(w))
        .unwrap_or(words.len());
    let end = words
        .iter()
        .rposition(|w| !PAIR_STOP_WORDS.contains(w))
        .map(|i| i + 1)
        .unwrap_or(start);
    words[start..end.max(start)].join(" ")
}
