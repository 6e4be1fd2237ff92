//! Tiered intent classifier: cache, exact patterns, AI backend, keyword rules.
//!
//! Never fails: every path ends in a result, `unknown` at worst. Each final
//! result is memoized by normalized text until the alias index is reloaded.

use crate::llm::{AiEntities, ClassificationBackend, IntentSchema};
use crate::nlu::cache::{ClassifierMemo, MetricsSnapshot};
use crate::nlu::intent::{EntityFamily, EntityQuery, IntentKind, IntentResult, SourceTier};
use crate::nlu::resolver::EntityResolver;
use crate::nlu::rules::{legacy_rules, quick_pattern};
use crate::nlu::text::normalize_text;
use crate::providers::{Competition, Team};
use std::sync::Arc;
use std::time::{Duration, Instant};

pub const DEFAULT_MIN_AI_CONFIDENCE: f32 = 0.6;
pub const DEFAULT_AI_TIMEOUT_MS: u64 = 4000;

#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    /// AI verdicts below this are discarded in favour of the keyword rules.
    pub min_ai_confidence: f32,
    pub ai_timeout: Duration,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self {
            min_ai_confidence: DEFAULT_MIN_AI_CONFIDENCE,
            ai_timeout: Duration::from_millis(DEFAULT_AI_TIMEOUT_MS),
        }
    }
}

pub struct IntentClassifier {
    resolver: Arc<EntityResolver>,
    memo: Arc<ClassifierMemo>,
    backend: Option<Arc<dyn ClassificationBackend>>,
    schema: IntentSchema,
    settings: ClassifierSettings,
}

impl IntentClassifier {
    pub fn new(resolver: Arc<EntityResolver>, memo: Arc<ClassifierMemo>) -> Self {
        Self {
            resolver,
            memo,
            backend: None,
            schema: IntentSchema::known(),
            settings: ClassifierSettings::default(),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn ClassificationBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_settings(mut self, settings: ClassifierSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn resolver(&self) -> &Arc<EntityResolver> {
        &self.resolver
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.memo.snapshot()
    }

    /// Rebuild the alias index and drop every memoized result.
    pub fn reload_aliases(&self, teams: &[Team], competitions: &[Competition]) {
        self.resolver.rebuild(teams, competitions);
        self.memo.cache.clear();
    }

    pub async fn classify(&self, text: &str) -> IntentResult {
        let metrics = &self.memo.metrics;
        metrics.record_request();

        let key = normalize_text(text);
        if key.is_empty() {
            metrics.record_result(SourceTier::Legacy);
            return IntentResult::unknown("empty message");
        }

        if let Some(mut hit) = self.memo.cache.get(&key) {
            hit.source = SourceTier::Cache;
            metrics.record_result(SourceTier::Cache);
            return hit;
        }

        let result = match quick_pattern(&key) {
            Some(r) => r,
            None => match self.ask_backend(text, &key).await {
                Some(r) => r,
                None => legacy_rules(&key, &self.resolver),
            },
        };
        log::debug!(
            "classifier: {:?} -> {} ({:.2}, {:?})",
            key,
            result.intent,
            result.confidence,
            result.source
        );
        metrics.record_result(result.source);
        self.memo.cache.insert(key, result.clone());
        result
    }

    async fn ask_backend(&self, text: &str, key: &str) -> Option<IntentResult> {
        let backend = self.backend.as_ref()?;
        let metrics = &self.memo.metrics;
        let started = Instant::now();
        let outcome = tokio::time::timeout(
            self.settings.ai_timeout,
            backend.classify(text, &self.schema),
        )
        .await;

        let verdict = match outcome {
            Ok(Ok(v)) => v,
            Ok(Err(e)) => {
                metrics.record_ai_call(started.elapsed(), false);
                log::warn!("classifier: {} backend failed: {}", backend.name(), e);
                return None;
            }
            Err(_) => {
                metrics.record_ai_call(started.elapsed(), false);
                log::warn!(
                    "classifier: {} backend timed out after {} ms",
                    backend.name(),
                    self.settings.ai_timeout.as_millis()
                );
                return None;
            }
        };

        let Some(intent) = IntentKind::from_label(&verdict.intent) else {
            metrics.record_ai_call(started.elapsed(), false);
            log::warn!(
                "classifier: {} backend answered unknown label {:?}",
                backend.name(),
                verdict.intent
            );
            return None;
        };
        metrics.record_ai_call(started.elapsed(), true);

        if verdict.confidence < self.settings.min_ai_confidence {
            log::debug!(
                "classifier: discarding {} at {:.2} (below {:.2})",
                intent,
                verdict.confidence,
                self.settings.min_ai_confidence
            );
            return None;
        }

        let entities = self.merge_entities(intent, key, &verdict.entities);
        Some(IntentResult::new(
            intent,
            verdict.confidence,
            entities,
            verdict.reasoning,
            SourceTier::Ai,
        ))
    }

    /// Entities for an AI verdict. Local resolution of the message wins; names
    /// reported by the backend are resolved when possible and kept verbatim otherwise.
    fn merge_entities(&self, intent: IntentKind, key: &str, ai: &AiEntities) -> EntityQuery {
        match intent.family() {
            EntityFamily::None => EntityQuery::None,
            EntityFamily::Team => match self.team_entity(key, ai.team.as_deref()) {
                Some(team) => EntityQuery::Team { team },
                None => EntityQuery::None,
            },
            EntityFamily::MatchPair => {
                if let Some(pair) = self.resolver.resolve_match_pair(key) {
                    return EntityQuery::MatchPair {
                        home_team: pair.home_team,
                        away_team: pair.away_team,
                    };
                }
                let home = self.resolved_team(ai.home_team.as_deref());
                let away = self.resolved_team(ai.away_team.as_deref());
                match (home, away) {
                    (Some(home_team), Some(away_team)) if home_team != away_team => {
                        EntityQuery::MatchPair {
                            home_team,
                            away_team,
                        }
                    }
                    // A single team still lets the handler answer for its next fixture.
                    _ => match self.team_entity(key, ai.team.as_deref()) {
                        Some(team) => EntityQuery::Team { team },
                        None => EntityQuery::None,
                    },
                }
            }
            EntityFamily::Competition => {
                let local = self.resolver.resolve_competition(key);
                let competition = local.or_else(|| {
                    let name = non_empty(ai.competition.as_deref())?;
                    Some(
                        self.resolver
                            .resolve_competition(name)
                            .unwrap_or_else(|| name.to_string()),
                    )
                });
                match competition {
                    Some(competition) => EntityQuery::Competition { competition },
                    None => EntityQuery::None,
                }
            }
            EntityFamily::Player => {
                let player = self
                    .resolver
                    .extract_player(key)
                    .or_else(|| non_empty(ai.player.as_deref()).map(str::to_string));
                match player {
                    Some(player) => EntityQuery::Player { player },
                    None => EntityQuery::None,
                }
            }
        }
    }

    fn team_entity(&self, key: &str, ai_team: Option<&str>) -> Option<String> {
        self.resolver
            .resolve_team(key)
            .team
            .or_else(|| self.resolved_team(ai_team))
    }

    fn resolved_team(&self, name: Option<&str>) -> Option<String> {
        let name = non_empty(name)?;
        Some(
            self.resolver
                .resolve_team(name)
                .team
                .unwrap_or_else(|| name.to_string()),
        )
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
