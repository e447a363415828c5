//! Date-scoped scores feed from the ESPN public scoreboard API.
//!
//! Queries `{base}/scoreboard?dates=YYYYMMDD` against each configured base in
//! order and converts the first non-empty scoreboard into a `SourceGameMap`.
//! No API key required. Every failure degrades to an empty map.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::client::UpstreamClient;
use crate::data::models::{SourceGame, SourceGameMap, Team};
use crate::data::text::parse_integer;

// =============================================================================
// ESPN response types
// =============================================================================

#[derive(Debug, Deserialize)]
struct EspnScoreboard {
    #[serde(default)]
    events: Vec<EspnEvent>,
}

#[derive(Debug, Deserialize)]
struct EspnEvent {
    #[serde(default)]
    status: Option<EspnStatus>,
    #[serde(default)]
    competitions: Vec<EspnCompetition>,
}

#[derive(Debug, Deserialize)]
struct EspnCompetition {
    #[serde(default)]
    competitors: Vec<EspnCompetitor>,
    #[serde(default)]
    status: Option<EspnStatus>,
}

#[derive(Debug, Deserialize)]
struct EspnCompetitor {
    #[serde(default)]
    team: Option<EspnTeam>,
    #[serde(rename = "homeAway", default)]
    home_away: String,
    #[serde(default)]
    score: Option<String>,
    #[serde(default)]
    linescores: Vec<EspnLinescore>,
}

#[derive(Debug, Deserialize)]
struct EspnTeam {
    #[serde(default)]
    abbreviation: Option<String>,
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
    #[serde(rename = "shortDisplayName", default)]
    short_display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EspnLinescore {
    #[serde(default)]
    value: Option<f64>,
    #[serde(rename = "displayValue", default)]
    display_value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EspnStatus {
    #[serde(rename = "type", default)]
    status_type: Option<EspnStatusType>,
}

#[derive(Debug, Deserialize)]
struct EspnStatusType {
    #[serde(default)]
    state: Option<String>, // "pre" | "in" | "post"
    #[serde(rename = "shortDetail", default)]
    short_detail: Option<String>,
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

// =============================================================================
// Scores Feed
// =============================================================================

/// ESPN scoreboard adapter. Bases are tried in order for every date.
#[derive(Debug, Clone)]
pub struct ScoresFeed {
    client: UpstreamClient,
    bases: Vec<String>,
}

impl ScoresFeed {
    pub fn new(client: UpstreamClient, bases: Vec<String>) -> Self {
        Self { client, bases }
    }

    /// Games for one `YYYYMMDD` date; empty when no base has data.
    pub async fn fetch_games(&self, date_key: &str) -> SourceGameMap {
        self.fetch_games_with_base(date_key)
            .await
            .map(|(_, map)| map)
            .unwrap_or_default()
    }

    /// Like `fetch_games`, also naming the base that answered.
    pub async fn fetch_games_with_base(&self, date_key: &str) -> Option<(String, SourceGameMap)> {
        for base in &self.bases {
            let url = format!("{}/scoreboard?dates={}", base.trim_end_matches('/'), date_key);

            match self.client.get_json::<EspnScoreboard>(&url).await {
                Ok(scoreboard) => {
                    let events = scoreboard.events.len();
                    let map = build_game_map(scoreboard, date_key);
                    if map.is_empty() {
                        debug!(date_key, base = %base, events, "ESPN scoreboard has no usable games, trying next base");
                        continue;
                    }
                    debug!(date_key, base = %base, games = map.len(), "ESPN scoreboard loaded");
                    return Some((base.clone(), map));
                }
                Err(e) => {
                    warn!(date_key, base = %base, error = %e, "ESPN scoreboard fetch failed");
                }
            }
        }

        None
    }
}

// =============================================================================
// Parsing helpers
// =============================================================================

fn build_game_map(scoreboard: EspnScoreboard, date_key: &str) -> SourceGameMap {
    scoreboard
        .events
        .iter()
        .filter_map(parse_espn_event)
        .map(|mut game| {
            game.date_key = Some(date_key.to_string());
            game
        })
        .collect()
}

fn parse_espn_event(event: &EspnEvent) -> Option<SourceGame> {
    let comp = event.competitions.first()?;
    let status_type = comp
        .status
        .as_ref()
        .or(event.status.as_ref())
        .and_then(|s| s.status_type.as_ref());

    let pregame = status_type
        .and_then(|t| t.state.as_deref())
        .map(|s| s == "pre")
        .unwrap_or(false);
    let status = status_type
        .and_then(|t| {
            t.short_detail
                .clone()
                .or_else(|| t.detail.clone())
                .or_else(|| t.description.clone())
        })
        .unwrap_or_else(|| "Scheduled".to_string());

    let mut home: Option<Team> = None;
    let mut away: Option<Team> = None;

    for competitor in &comp.competitors {
        let team = map_competitor(competitor, pregame);
        match competitor.home_away.as_str() {
            "home" => home = Some(team),
            "away" => away = Some(team),
            _ => {}
        }
    }

    SourceGame::new(status, away?, home?)
}

fn map_competitor(competitor: &EspnCompetitor, pregame: bool) -> Team {
    let (code, name) = competitor
        .team
        .as_ref()
        .map(|t| {
            let name = t
                .display_name
                .clone()
                .or_else(|| t.short_display_name.clone())
                .unwrap_or_default();
            (t.abbreviation.clone().unwrap_or_default(), name)
        })
        .unwrap_or_default();

    let mut team = Team::new(code, name);
    if !pregame {
        team.points = competitor.score.as_deref().and_then(parse_integer);
        team.quarters = competitor.linescores.iter().map(linescore_value).collect();
    }
    team
}

fn linescore_value(line: &EspnLinescore) -> Option<i64> {
    match line.value {
        Some(v) if v.is_finite() && v.fract() == 0.0 => Some(v as i64),
        _ => line.display_value.as_deref().and_then(parse_integer),
    }
}

// =============================================================================
// Tests
// =============================================================================
