//! Intent handlers. Each turns an intent plus entities into a reply, asking a
//! follow-up question (and setting a pending state) when something is missing.
//!
//! Provider errors are returned to the dispatcher, which turns them into an apology.

use crate::dialogue::DialogueSettings;
use crate::nlu::intent::{EntityQuery, IntentKind};
use crate::nlu::resolver::EntityResolver;
use crate::providers::{
    FootballData, Match, MatchStatus, ProviderError, StandingRow, TeamId, UserPreferences,
};
use crate::state::{ConversationState, PendingKind, StateStore};
use chrono::{Datelike, Duration, Utc};
use std::sync::Arc;

const MAX_SUGGESTIONS: usize = 3;
const MAX_TABLE_ROWS: usize = 10;
const MAX_SCORERS: usize = 10;
const MAX_NEWS: usize = 5;
const WEEKDAYS: [&str; 7] = ["seg", "ter", "qua", "qui", "sex", "sáb", "dom"];

pub const HELP_TEXT: &str = "Posso te ajudar com:\n\
• Próximo jogo de um time (ex.: \"próximo jogo do Flamengo\")\n\
• Último resultado (ex.: \"como foi o jogo do Palmeiras\")\n\
• Jogos de hoje, de amanhã e ao vivo\n\
• Tabela e artilharia dos campeonatos\n\
• Onde assistir (ex.: \"onde passa Bahia x Fluminense\")\n\
• Informações de times e jogadores\n\
• Seu time favorito (mande \"meu time\")";

const NOT_UNDERSTOOD: &str = "Desculpe, não entendi muito bem. 🤔";

const SCORERS_HINT: &str = "Diga o campeonato, por exemplo: \"artilharia do brasileirão\".";
const COMPETITION_HINT: &str = "Diga o campeonato, por exemplo: \"campeonato libertadores\".";
const PLAYER_HINT: &str = "Não entendi o nome do jogador. Tente, por exemplo: \"jogador Pedro\".";

/// Who is talking.
#[derive(Debug, Clone, Copy)]
pub struct UserCtx<'a> {
    pub id: &'a str,
    pub first_name: Option<&'a str>,
}

/// A team picked for a reply, with other plausible teams for a "did you mean" line.
#[derive(Debug, Clone)]
struct TeamTarget {
    team: TeamId,
    suggestions: Vec<TeamId>,
}

impl TeamTarget {
    fn exact(team: TeamId) -> Self {
        Self {
            team,
            suggestions: Vec::new(),
        }
    }
}

enum Target {
    Team(TeamTarget),
    Reply(String),
}

fn question(kind: PendingKind) -> &'static str {
    match kind {
        PendingKind::AwaitingTeamForNextMatch => "De qual time você quer saber o próximo jogo?",
        PendingKind::AwaitingTeamForLastMatch => "De qual time você quer saber o último resultado?",
        PendingKind::AwaitingTeamForBroadcast => {
            "De qual time você quer saber onde assistir o próximo jogo?"
        }
        PendingKind::AwaitingTeamForInfo => "Sobre qual time você quer saber?",
        PendingKind::AwaitingTeamForFavorite => "Qual é o seu time do coração? ⚽",
        PendingKind::AwaitingPlayerName => "Qual jogador você quer consultar?",
        PendingKind::AwaitingCompetitionForStandings => {
            "De qual campeonato você quer ver a tabela?"
        }
    }
}

pub struct Handlers {
    data: Arc<dyn FootballData>,
    prefs: Arc<dyn UserPreferences>,
    states: Arc<dyn StateStore>,
    resolver: Arc<EntityResolver>,
    settings: DialogueSettings,
}

impl Handlers {
    pub fn new(
        data: Arc<dyn FootballData>,
        prefs: Arc<dyn UserPreferences>,
        states: Arc<dyn StateStore>,
        resolver: Arc<EntityResolver>,
        settings: DialogueSettings,
    ) -> Self {
        Self {
            data,
            prefs,
            states,
            resolver,
            settings,
        }
    }

    pub fn settings(&self) -> &DialogueSettings {
        &self.settings
    }

    /// Favorite team of `user` with its display name, for menus.
    pub async fn favorite_with_name(&self, user: &str) -> Option<(TeamId, String)> {
        match self.prefs.favorite_team(user).await {
            Ok(Some(team)) => {
                let name = self.team_name(&team);
                Some((team, name))
            }
            Ok(None) => None,
            Err(e) => {
                log::warn!("handlers: favorite lookup for {} failed: {}", user, e);
                None
            }
        }
    }

    /// Reply for a classified (or quick-action) intent.
    pub async fn handle(
        &self,
        user: &UserCtx<'_>,
        intent: IntentKind,
        entities: &EntityQuery,
        raw: &str,
    ) -> Result<String, ProviderError> {
        match intent {
            IntentKind::Greeting => Ok(greeting(user.first_name)),
            IntentKind::Farewell => {
                Ok("Até mais! Quando quiser saber de futebol, é só mandar mensagem. 👋".to_string())
            }
            IntentKind::Thanks => Ok("De nada! Se precisar, é só chamar. ⚽".to_string()),
            IntentKind::Help => Ok(HELP_TEXT.to_string()),
            IntentKind::NextMatch => {
                match self
                    .team_target(user, entities, raw, PendingKind::AwaitingTeamForNextMatch)
                    .await?
                {
                    Target::Team(t) => self.next_match(&t).await,
                    Target::Reply(r) => Ok(r),
                }
            }
            IntentKind::LastMatch => {
                match self
                    .team_target(user, entities, raw, PendingKind::AwaitingTeamForLastMatch)
                    .await?
                {
                    Target::Team(t) => self.last_match(&t).await,
                    Target::Reply(r) => Ok(r),
                }
            }
            IntentKind::MatchesToday => self.matches_on_offset(0).await,
            IntentKind::MatchesTomorrow => self.matches_on_offset(1).await,
            IntentKind::LiveMatches => self.live_matches().await,
            IntentKind::Standings => match self.competition_for(entities) {
                Some(c) => self.standings(&c).await,
                None => Ok(self.ask(user.id, PendingKind::AwaitingCompetitionForStandings).await),
            },
            IntentKind::TopScorers => match self.competition_for(entities) {
                Some(c) => self.top_scorers(&c).await,
                None => Ok(SCORERS_HINT.to_string()),
            },
            IntentKind::TeamInfo => {
                match self
                    .team_target(user, entities, raw, PendingKind::AwaitingTeamForInfo)
                    .await?
                {
                    Target::Team(t) => self.team_info(&t).await,
                    Target::Reply(r) => Ok(r),
                }
            }
            IntentKind::TeamSquad => {
                match self
                    .team_target(user, entities, raw, PendingKind::AwaitingTeamForInfo)
                    .await?
                {
                    Target::Team(t) => self.team_squad(&t).await,
                    Target::Reply(r) => Ok(r),
                }
            }
            IntentKind::PlayerInfo => match entities {
                EntityQuery::Player { player } => self.player_info(player).await,
                _ => Ok(self.ask(user.id, PendingKind::AwaitingPlayerName).await),
            },
            IntentKind::Broadcast => self.broadcast_for(user, entities, raw).await,
            IntentKind::SpecificMatchBroadcast => match entities {
                EntityQuery::MatchPair {
                    home_team,
                    away_team,
                } => self.fixture_broadcast(home_team, away_team).await,
                _ => self.broadcast_for(user, entities, raw).await,
            },
            IntentKind::CompetitionInfo => match self.competition_for(entities) {
                Some(c) => self.competition_info(&c).await,
                None => Ok(COMPETITION_HINT.to_string()),
            },
            IntentKind::SetFavoriteTeam => match entities.team() {
                Some(name) => match self.lookup_team(name, raw).await? {
                    Some(t) => self.set_favorite(user, &t).await,
                    None => Ok(self.team_not_found(name)),
                },
                None => Ok(self.ask(user.id, PendingKind::AwaitingTeamForFavorite).await),
            },
            IntentKind::MyTeam => self.my_team(user).await,
            IntentKind::News => self.news().await,
            IntentKind::Unknown => Ok(format!("{}\n\n{}", NOT_UNDERSTOOD, HELP_TEXT)),
        }
    }

    /// Reply to the answer of a pending question. The state is already cleared.
    pub async fn answer_pending(
        &self,
        user: &UserCtx<'_>,
        kind: PendingKind,
        text: &str,
    ) -> Result<String, ProviderError> {
        match kind {
            PendingKind::AwaitingPlayerName => match self.resolver.player_name(text) {
                Some(player) => self.player_info(&player).await,
                None => Ok(PLAYER_HINT.to_string()),
            },
            PendingKind::AwaitingCompetitionForStandings => {
                let competition = self
                    .resolver
                    .resolve_competition(text)
                    .unwrap_or_else(|| text.trim().to_string());
                self.standings(&competition).await
            }
            PendingKind::AwaitingTeamForNextMatch
            | PendingKind::AwaitingTeamForLastMatch
            | PendingKind::AwaitingTeamForBroadcast
            | PendingKind::AwaitingTeamForInfo
            | PendingKind::AwaitingTeamForFavorite => {
                let Some(target) = self.team_from_text(text).await? else {
                    return Ok(self.team_not_found(text.trim()));
                };
                match kind {
                    PendingKind::AwaitingTeamForNextMatch => self.next_match(&target).await,
                    PendingKind::AwaitingTeamForLastMatch => self.last_match(&target).await,
                    PendingKind::AwaitingTeamForBroadcast => self.team_broadcast(&target).await,
                    PendingKind::AwaitingTeamForInfo => self.team_info(&target).await,
                    _ => self.set_favorite(user, &target).await,
                }
            }
        }
    }

    async fn ask(&self, user: &str, kind: PendingKind) -> String {
        self.states.set(user, ConversationState::new(kind)).await;
        question(kind).to_string()
    }

    /// Team from the entities, else the user's favorite, else a pending question.
    async fn team_target(
        &self,
        user: &UserCtx<'_>,
        entities: &EntityQuery,
        raw: &str,
        ask: PendingKind,
    ) -> Result<Target, ProviderError> {
        if let Some(name) = entities.team() {
            return Ok(match self.lookup_team(name, raw).await? {
                Some(t) => Target::Team(t),
                None => Target::Reply(self.team_not_found(name)),
            });
        }
        if let Some(team) = self.prefs.favorite_team(user.id).await? {
            return Ok(Target::Team(TeamTarget::exact(team)));
        }
        Ok(Target::Reply(self.ask(user.id, ask).await))
    }

    /// Resolve an entity value: a canonical id, an alias, or a raw name known only to the provider.
    async fn lookup_team(&self, name: &str, raw: &str) -> Result<Option<TeamTarget>, ProviderError> {
        if self.resolver.is_known_team(name) {
            let suggestions = self
                .resolver
                .resolve_team(raw)
                .suggestions
                .into_iter()
                .filter(|t| t != name)
                .take(MAX_SUGGESTIONS)
                .collect();
            return Ok(Some(TeamTarget {
                team: name.to_string(),
                suggestions,
            }));
        }
        self.team_from_text(name).await
    }

    async fn team_from_text(&self, text: &str) -> Result<Option<TeamTarget>, ProviderError> {
        let local = self.resolver.resolve_team(text);
        if let Some(team) = local.team {
            let mut suggestions = local.suggestions;
            suggestions.truncate(MAX_SUGGESTIONS);
            return Ok(Some(TeamTarget { team, suggestions }));
        }
        let mut candidates = self
            .data
            .find_team_candidates(text)
            .await?
            .into_iter()
            .map(|t| t.id);
        Ok(candidates.next().map(|team| TeamTarget {
            team,
            suggestions: candidates.take(MAX_SUGGESTIONS).collect(),
        }))
    }

    fn competition_for(&self, entities: &EntityQuery) -> Option<String> {
        match entities {
            EntityQuery::Competition { competition } => Some(competition.clone()),
            _ => self.settings.default_competition.clone(),
        }
    }

    fn team_name(&self, team: &str) -> String {
        self.resolver.display_team(team)
    }

    fn competition_name(&self, competition: &str) -> String {
        self.resolver
            .competition_name(competition)
            .unwrap_or_else(|| competition.to_string())
    }

    fn team_not_found(&self, name: &str) -> String {
        format!(
            "Não encontrei o time \"{}\". Confira o nome e tente de novo.",
            name
        )
    }

    fn with_suggestions(&self, mut reply: String, target: &TeamTarget) -> String {
        if !target.suggestions.is_empty() {
            let names: Vec<String> = target.suggestions.iter().map(|t| self.team_name(t)).collect();
            reply.push_str(&format!(
                "\n\nNão era esse? Você quis dizer: {}?",
                names.join(", ")
            ));
        }
        reply
    }

    fn kickoff(&self, m: &Match) -> String {
        let local = m.kickoff.with_timezone(&self.settings.utc_offset);
        let weekday = WEEKDAYS[local.weekday().num_days_from_monday() as usize];
        format!("{} {}", weekday, local.format("%d/%m às %H:%M"))
    }

    fn fixture(&self, m: &Match) -> String {
        let home = self.team_name(&m.home_team);
        let away = self.team_name(&m.away_team);
        match (m.status, m.home_score, m.away_score) {
            (MatchStatus::Scheduled, _, _) | (_, None, _) | (_, _, None) => {
                format!("{} x {}", home, away)
            }
            (_, Some(h), Some(a)) => format!("{} {} x {} {}", home, h, a, away),
        }
    }

    async fn next_match(&self, target: &TeamTarget) -> Result<String, ProviderError> {
        let name = self.team_name(&target.team);
        let Some(m) = self.data.find_next_match(&target.team).await? else {
            return Ok(self.with_suggestions(
                format!("Não encontrei jogos agendados para o {}.", name),
                target,
            ));
        };
        let mut reply = format!(
            "📅 Próximo jogo do {}:\n{}\n🏆 {}\n🕒 {}",
            name,
            self.fixture(&m),
            self.competition_name(&m.competition),
            self.kickoff(&m)
        );
        if let Some(venue) = &m.venue {
            reply.push_str(&format!("\n📍 {}", venue));
        }
        if m.status == MatchStatus::Live {
            reply.push_str("\n🔴 Está rolando agora!");
        }
        Ok(self.with_suggestions(reply, target))
    }

    async fn last_match(&self, target: &TeamTarget) -> Result<String, ProviderError> {
        let name = self.team_name(&target.team);
        let Some(m) = self.data.find_last_match(&target.team).await? else {
            return Ok(self.with_suggestions(
                format!("Não encontrei jogos recentes do {}.", name),
                target,
            ));
        };
        let reply = format!(
            "⚽ Último jogo do {}:\n{}\n🏆 {}\n🕒 {}",
            name,
            self.fixture(&m),
            self.competition_name(&m.competition),
            self.kickoff(&m)
        );
        Ok(self.with_suggestions(reply, target))
    }

    async fn matches_on_offset(&self, days: i64) -> Result<String, ProviderError> {
        let today = Utc::now().with_timezone(&self.settings.utc_offset).date_naive();
        let day = today + Duration::days(days);
        let label = if days == 0 { "hoje" } else { "amanhã" };
        let matches = self.data.matches_on(day).await?;
        if matches.is_empty() {
            return Ok(format!("Não há jogos {} nos campeonatos que acompanho.", label));
        }
        let mut reply = format!("📅 Jogos de {} ({}):", label, day.format("%d/%m"));
        for m in &matches {
            let time = m.kickoff.with_timezone(&self.settings.utc_offset).format("%H:%M");
            let live = if m.status == MatchStatus::Live { " 🔴" } else { "" };
            reply.push_str(&format!(
                "\n• {} {} ({}){}",
                time,
                self.fixture(m),
                self.competition_name(&m.competition),
                live
            ));
        }
        Ok(reply)
    }

    async fn live_matches(&self) -> Result<String, ProviderError> {
        let matches = self.data.live_matches().await?;
        if matches.is_empty() {
            return Ok("Nenhum jogo ao vivo agora.".to_string());
        }
        let mut reply = String::from("🔴 Ao vivo:");
        for m in &matches {
            reply.push_str(&format!(
                "\n• {} ({})",
                self.fixture(m),
                self.competition_name(&m.competition)
            ));
        }
        Ok(reply)
    }

    async fn table(&self, competition: &str) -> Result<Vec<StandingRow>, ProviderError> {
        match self.data.get_standings(competition).await {
            Ok(rows) => Ok(rows),
            Err(ProviderError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    async fn standings(&self, competition: &str) -> Result<String, ProviderError> {
        let name = self.competition_name(competition);
        let rows = self.table(competition).await?;
        if rows.is_empty() {
            return Ok(format!("Ainda não tenho a tabela do {}.", name));
        }
        let mut reply = format!("🏆 Tabela do {}:", name);
        for row in rows.iter().take(MAX_TABLE_ROWS) {
            reply.push_str(&format!(
                "\n{}º {} - {} pts ({} j, SG {:+})",
                row.position,
                self.team_name(&row.team),
                row.points,
                row.played,
                row.goal_difference
            ));
        }
        Ok(reply)
    }

    async fn top_scorers(&self, competition: &str) -> Result<String, ProviderError> {
        let name = self.competition_name(competition);
        let scorers = self.data.top_scorers(competition).await?;
        if scorers.is_empty() {
            return Ok(format!("Ainda não tenho a artilharia do {}.", name));
        }
        let mut reply = format!("⚽ Artilharia do {}:", name);
        for (i, s) in scorers.iter().take(MAX_SCORERS).enumerate() {
            reply.push_str(&format!(
                "\n{}. {} ({}) - {} gols",
                i + 1,
                s.player,
                self.team_name(&s.team),
                s.goals
            ));
        }
        Ok(reply)
    }

    async fn team_info(&self, target: &TeamTarget) -> Result<String, ProviderError> {
        let teams = self.data.list_teams().await?;
        let Some(team) = teams.iter().find(|t| t.id == target.team) else {
            return Ok(format!(
                "Não tenho informações sobre o {}.",
                self.team_name(&target.team)
            ));
        };
        let mut reply = format!("🛡️ {}", team.name);
        if let Some(city) = &team.city {
            reply.push_str(&format!("\n📍 Cidade: {}", city));
        }
        if let Some(stadium) = &team.stadium {
            reply.push_str(&format!("\n🏟️ Estádio: {}", stadium));
        }
        if let Some(founded) = team.founded {
            reply.push_str(&format!("\n📜 Fundação: {}", founded));
        }
        Ok(self.with_suggestions(reply, target))
    }

    async fn team_squad(&self, target: &TeamTarget) -> Result<String, ProviderError> {
        let name = self.team_name(&target.team);
        let squad = self.data.team_squad(&target.team).await?;
        if squad.is_empty() {
            return Ok(format!("Ainda não tenho o elenco do {}.", name));
        }
        let mut reply = format!("👥 Elenco do {}:", name);
        for p in &squad {
            let number = p.number.map(|n| format!("{} ", n)).unwrap_or_default();
            let position = p
                .position
                .as_deref()
                .map(|pos| format!(" ({})", pos))
                .unwrap_or_default();
            reply.push_str(&format!("\n• {}{}{}", number, p.name, position));
        }
        Ok(self.with_suggestions(reply, target))
    }

    async fn player_info(&self, name: &str) -> Result<String, ProviderError> {
        let players = self.data.find_players(name).await?;
        let Some(p) = players.first() else {
            return Ok(format!("Não encontrei o jogador {}.", name));
        };
        let mut reply = format!("👤 {} ({})", p.name, self.team_name(&p.team));
        if let Some(position) = &p.position {
            reply.push_str(&format!("\nPosição: {}", position));
        }
        if let Some(number) = p.number {
            reply.push_str(&format!("\nCamisa: {}", number));
        }
        if let Some(age) = p.age {
            reply.push_str(&format!("\nIdade: {} anos", age));
        }
        if let Some(goals) = p.goals {
            reply.push_str(&format!("\nGols na temporada: {}", goals));
        }
        if players.len() > 1 {
            let others: Vec<&str> = players[1..]
                .iter()
                .take(MAX_SUGGESTIONS)
                .map(|p| p.name.as_str())
                .collect();
            reply.push_str(&format!("\n\nEncontrei também: {}", others.join(", ")));
        }
        Ok(reply)
    }

    async fn broadcast_for(
        &self,
        user: &UserCtx<'_>,
        entities: &EntityQuery,
        raw: &str,
    ) -> Result<String, ProviderError> {
        match self
            .team_target(user, entities, raw, PendingKind::AwaitingTeamForBroadcast)
            .await?
        {
            Target::Team(t) => self.team_broadcast(&t).await,
            Target::Reply(r) => Ok(r),
        }
    }

    async fn team_broadcast(&self, target: &TeamTarget) -> Result<String, ProviderError> {
        let Some(m) = self.data.find_next_match(&target.team).await? else {
            return Ok(self.with_suggestions(
                format!(
                    "Não encontrei jogos agendados para o {}.",
                    self.team_name(&target.team)
                ),
                target,
            ));
        };
        let reply = self.broadcast_reply(&m).await?;
        Ok(self.with_suggestions(reply, target))
    }

    async fn fixture_broadcast(&self, home: &str, away: &str) -> Result<String, ProviderError> {
        let home_team = self.lookup_team(home, "").await?;
        let away_team = self.lookup_team(away, "").await?;
        let (Some(home_team), Some(away_team)) = (home_team, away_team) else {
            return Ok(format!(
                "Não consegui identificar os times de {} x {}.",
                home, away
            ));
        };
        match self
            .data
            .find_match_between(&home_team.team, &away_team.team)
            .await?
        {
            Some(m) => self.broadcast_reply(&m).await,
            None => Ok(format!(
                "Não encontrei jogo entre {} e {}.",
                self.team_name(&home_team.team),
                self.team_name(&away_team.team)
            )),
        }
    }

    async fn broadcast_reply(&self, m: &Match) -> Result<String, ProviderError> {
        let broadcasts = self.data.get_broadcasts_for_match(&m.id).await?;
        let header = format!("{} ({})", self.fixture(m), self.kickoff(m));
        if broadcasts.is_empty() {
            return Ok(format!("Ainda não há transmissão confirmada para {}.", header));
        }
        let channels: Vec<String> = broadcasts
            .iter()
            .map(|b| match &b.medium {
                Some(medium) => format!("{} ({})", b.channel, medium),
                None => b.channel.clone(),
            })
            .collect();
        Ok(format!("📺 {} passa em: {}", header, channels.join(", ")))
    }

    async fn competition_info(&self, competition: &str) -> Result<String, ProviderError> {
        let competitions = self.data.list_competitions().await?;
        let Some(c) = competitions.iter().find(|c| c.id == competition) else {
            return Ok(format!("Não tenho informações sobre {}.", competition));
        };
        let mut reply = format!("🏆 {}", c.name);
        if let Some(season) = &c.season {
            reply.push_str(&format!(" (temporada {})", season));
        }
        if let Some(leader) = self.table(competition).await?.first() {
            reply.push_str(&format!(
                "\nLíder: {} com {} pts",
                self.team_name(&leader.team),
                leader.points
            ));
        }
        if let Some(top) = self.data.top_scorers(competition).await?.first() {
            reply.push_str(&format!("\nArtilheiro: {} ({} gols)", top.player, top.goals));
        }
        Ok(reply)
    }

    async fn set_favorite(&self, user: &UserCtx<'_>, target: &TeamTarget) -> Result<String, ProviderError> {
        self.prefs.set_favorite_team(user.id, &target.team).await?;
        log::info!("handlers: {} set favorite team {}", user.id, target.team);
        let reply = format!(
            "✅ Pronto! O {} agora é o seu time favorito. Mande \"meu time\" para ver as novidades dele.",
            self.team_name(&target.team)
        );
        Ok(self.with_suggestions(reply, target))
    }

    async fn my_team(&self, user: &UserCtx<'_>) -> Result<String, ProviderError> {
        let Some(team) = self.prefs.favorite_team(user.id).await? else {
            self.states
                .set(user.id, ConversationState::new(PendingKind::AwaitingTeamForFavorite))
                .await;
            return Ok(
                "Você ainda não definiu um time favorito. Qual é o seu time do coração? ⚽"
                    .to_string(),
            );
        };
        let target = TeamTarget::exact(team);
        let next = self.next_match(&target).await?;
        let last = self.last_match(&target).await?;
        Ok(format!("{}\n\n{}", next, last))
    }

    async fn news(&self) -> Result<String, ProviderError> {
        let news = self.data.latest_news(MAX_NEWS).await?;
        if news.is_empty() {
            return Ok("Ainda não tenho notícias para mostrar. Volte mais tarde! 📰".to_string());
        }
        let mut reply = String::from("📰 Últimas notícias:");
        for item in &news {
            match &item.url {
                Some(url) => reply.push_str(&format!("\n• {} ({})", item.title, url)),
                None => reply.push_str(&format!("\n• {}", item.title)),
            }
        }
        Ok(reply)
    }
}

fn greeting(first_name: Option<&str>) -> String {
    let hello = match first_name {
        Some(name) => format!("Olá, {}! ⚽", name),
        None => "Olá! ⚽".to_string(),
    };
    format!(
        "{} Sou o seu assistente de futebol. Posso te contar o próximo jogo do seu time, \
         resultados, tabela, artilharia e onde assistir. Do que você precisa?",
        hello
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_uses_first_name() {
        assert!(greeting(Some("Maria")).starts_with("Olá, Maria!"));
        assert!(greeting(None).starts_with("Olá!"));
    }

    #[test]
    fn every_pending_kind_has_a_question() {
        for kind in [
            PendingKind::AwaitingTeamForNextMatch,
            PendingKind::AwaitingTeamForLastMatch,
            PendingKind::AwaitingTeamForBroadcast,
            PendingKind::AwaitingTeamForInfo,
            PendingKind::AwaitingTeamForFavorite,
            PendingKind::AwaitingPlayerName,
            PendingKind::AwaitingCompetitionForStandings,
        ] {
            assert!(question(kind).ends_with('?') || question(kind).ends_with('⚽'));
        }
    }
}
