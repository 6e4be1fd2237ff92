//! Team alias index: every normalized variant of every team, longest first.

use crate::nlu::text::normalize_text;
use crate::providers::{Team, TeamId};
use std::collections::HashMap;

/// Aliases this short or shorter only match on word boundaries.
pub const SHORT_ALIAS_MAX_LEN: usize = 3;

/// One normalized variant pointing at a team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    pub alias: String,
    pub team: TeamId,
}

impl AliasEntry {
    pub fn is_short(&self) -> bool {
        self.alias.chars().count() <= SHORT_ALIAS_MAX_LEN
    }
}

/// Flattened alias list plus display names, built from the data provider's teams.
#[derive(Debug, Clone, Default)]
pub struct TeamAliasIndex {
    entries: Vec<AliasEntry>,
    names: HashMap<TeamId, String>,
}

impl TeamAliasIndex {
    pub fn build(teams: &[Team]) -> Self {
        let mut entries: Vec<AliasEntry> = Vec::new();
        let mut names = HashMap::new();
        for team in teams {
            names.insert(team.id.clone(), team.name.clone());
            let slug = team.id.replace(['-', '_'], " ");
            let raw = std::iter::once(team.name.as_str())
                .chain(team.short_name.as_deref())
                .chain(std::iter::once(slug.as_str()))
                .chain(team.aliases.iter().map(String::as_str));
            for variant in raw {
                let alias = normalize_text(variant);
                if alias.is_empty() {
                    continue;
                }
                let entry = AliasEntry {
                    alias,
                    team: team.id.clone(),
                };
                if !entries.contains(&entry) {
                    entries.push(entry);
                }
            }
        }
        sort_longest_first(&mut entries);
        Self { entries, names }
    }

    /// Build from raw (alias, team id) pairs only; display names default to the team id.
    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut entries = Vec::new();
        let mut names = HashMap::new();
        for (alias, team) in pairs {
            names
                .entry(team.to_string())
                .or_insert_with(|| team.to_string());
            let alias = normalize_text(alias);
            if !alias.is_empty() {
                entries.push(AliasEntry {
                    alias,
                    team: team.to_string(),
                });
            }
        }
        sort_longest_first(&mut entries);
        Self { entries, names }
    }

    pub fn entries(&self) -> &[AliasEntry] {
        &self.entries
    }

    pub fn contains_team(&self, team: &str) -> bool {
        self.names.contains_key(team)
    }

    pub fn team_name(&self, team: &str) -> Option<&str> {
        self.names.get(team).map(String::as_str)
    }

    pub fn team_count(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Longest first so "sao paulo" is tried before "sp"; ties broken alphabetically for stable output.
fn sort_longest_first(entries: &mut [AliasEntry]) {
    entries.sort_by(|a, b| {
        b.alias
            .chars()
            .count()
            .cmp(&a.alias.chars().count())
            .then_with(|| a.alias.cmp(&b.alias))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_longest_first() {
        let index = TeamAliasIndex::from_pairs([("sp", "x"), ("sao paulo", "y"), ("tricolor", "y")]);
        let aliases: Vec<&str> = index.entries().iter().map(|e| e.alias.as_str()).collect();
        assert_eq!(aliases.first(), Some(&"sao paulo"));
        assert_eq!(aliases.last(), Some(&"sp"));
    }

    #[test]
    fn build_includes_name_short_name_and_slug() {
        let team = Team {
            id: "atletico-mg".into(),
            name: "Atlético Mineiro".into(),
            short_name: Some("CAM".into()),
            aliases: vec!["Galo".into()],
            city: None,
            stadium: None,
            founded: None,
        };
        let index = TeamAliasIndex::build(&[team]);
        let aliases: Vec<&str> = index.entries().iter().map(|e| e.alias.as_str()).collect();
        assert!(aliases.contains(&"atletico mineiro"));
        assert!(aliases.contains(&"atletico mg"));
        assert!(aliases.contains(&"cam"));
        assert!(aliases.contains(&"galo"));
        assert_eq!(index.team_name("atletico-mg"), Some("Atlético Mineiro"));
    }
}
