//! NBA live scoreboard feed (cdn.nba.com).
//!
//! Not date-scoped: one document covers the current slate of live and
//! recently finished games. Failures degrade to an empty map.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::api::client::UpstreamClient;
use crate::data::models::{SourceGame, SourceGameMap, Team};

/// `gameStatus` value for games that have not tipped off.
const STATUS_SCHEDULED: u8 = 1;

#[derive(Debug, Deserialize)]
struct LiveResponse {
    #[serde(default)]
    scoreboard: Option<LiveScoreboard>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveScoreboard {
    #[serde(default)]
    game_date: Option<String>, // "2024-01-15"
    #[serde(default)]
    games: Vec<LiveGame>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveGame {
    #[serde(default)]
    game_status: u8,
    #[serde(default)]
    game_status_text: String,
    home_team: Option<LiveTeam>,
    away_team: Option<LiveTeam>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LiveTeam {
    #[serde(default)]
    team_tricode: Option<String>,
    #[serde(default)]
    team_city: Option<String>,
    #[serde(default)]
    team_name: Option<String>,
    #[serde(default)]
    score: Option<i64>,
    #[serde(default)]
    periods: Vec<LivePeriod>,
}

#[derive(Debug, Deserialize)]
struct LivePeriod {
    #[serde(default)]
    period: u32,
    #[serde(default)]
    score: Option<i64>,
}

/// NBA CDN live scoreboard adapter.
#[derive(Debug, Clone)]
pub struct LiveFeed {
    client: UpstreamClient,
    url: String,
}

impl LiveFeed {
    pub fn new(client: UpstreamClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub async fn fetch_games(&self) -> SourceGameMap {
        match self.client.get_json::<LiveResponse>(&self.url).await {
            Ok(response) => {
                let map = build_game_map(response);
                debug!(games = map.len(), "NBA live scoreboard loaded");
                map
            }
            Err(e) => {
                warn!(error = %e, "NBA live scoreboard fetch failed");
                SourceGameMap::new()
            }
        }
    }
}

fn build_game_map(response: LiveResponse) -> SourceGameMap {
    let Some(scoreboard) = response.scoreboard else {
        return SourceGameMap::new();
    };
    let date_key = scoreboard
        .game_date
        .as_deref()
        .map(|d| d.chars().filter(char::is_ascii_digit).collect::<String>())
        .filter(|d| d.len() == 8);

    scoreboard
        .games
        .into_iter()
        .filter_map(|game| {
            let pregame = game.game_status == STATUS_SCHEDULED;
            let away = map_team(game.away_team.as_ref()?, pregame);
            let home = map_team(game.home_team.as_ref()?, pregame);
            let mut source = SourceGame::new(game.game_status_text.trim(), away, home)?;
            source.date_key = date_key.clone();
            Some(source)
        })
        .collect()
}

fn map_team(team: &LiveTeam, pregame: bool) -> Team {
    let name = match (&team.team_city, &team.team_name) {
        (Some(city), Some(name)) => format!("{city} {name}"),
        (None, Some(name)) => name.clone(),
        (Some(city), None) => city.clone(),
        (None, None) => String::new(),
    };

    let mut mapped = Team::new(team.team_tricode.clone().unwrap_or_default(), name);
    if !pregame {
        let mut periods: Vec<&LivePeriod> = team.periods.iter().collect();
        periods.sort_by_key(|p| p.period);
        mapped.points = team.score;
        mapped.quarters = periods.iter().map(|p| p.score).collect();
    }
    mapped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::teams::PairKey;

    const LIVE_JSON: &str = r#"{
        "meta": {"version": 1},
        "scoreboard": {
            "gameDate": "2024-01-15",
            "games": [
                {"gameId": "0022300555", "gameStatus": 3, "gameStatusText": "Final/OT ",
                 "homeTeam": {"teamTricode": "PHX", "teamCity": "Phoenix", "teamName": "Suns", "score": 121,
                   "periods": [{"period": 2, "score": 30}, {"period": 1, "score": 25},
                               {"period": 3, "score": 28}, {"period": 4, "score": 27},
                               {"period": 5, "periodType": "OVERTIME", "score": 11}]},
                 "awayTeam": {"teamTricode": "BKN", "teamCity": "Brooklyn", "teamName": "Nets", "score": 119,
                   "periods": [{"period": 1, "score": 30}, {"period": 2, "score": 25},
                               {"period": 3, "score": 25}, {"period": 4, "score": 30},
                               {"period": 5, "score": 9}]}},
                {"gameId": "0022300556", "gameStatus": 1, "gameStatusText": "10:00 pm ET",
                 "homeTeam": {"teamTricode": "LAC", "score": 0, "periods": [{"period": 1, "score": 0}]},
                 "awayTeam": {"teamTricode": "SAS", "score": 0, "periods": [{"period": 1, "score": 0}]}},
                {"gameId": "0022300557", "gameStatus": 2, "gameStatusText": "Q1 5:00",
                 "homeTeam": {"teamTricode": "DEN"}}
            ]
        }
    }"#;

    #[test]
    fn maps_live_scoreboard() {
        let map = build_game_map(serde_json::from_str(LIVE_JSON).unwrap());
        assert_eq!(map.len(), 2);

        let game = map.get(&PairKey::new("BRK", "PHO")).unwrap();
        assert_eq!(game.status, "Final/OT");
        assert_eq!(game.teams[0].code, "BKN");
        assert_eq!(game.teams[0].name, "Brooklyn Nets");
        assert_eq!(
            game.team("PHX").unwrap().quarters,
            vec![Some(25), Some(30), Some(28), Some(27), Some(11)]
        );
        assert_eq!(game.quarter_labels, vec!["Q1", "Q2", "Q3", "Q4", "OT"]);
        assert_eq!(game.date_key.as_deref(), Some("20240115"));
    }

    #[test]
    fn scheduled_games_carry_no_scores() {
        let map = build_game_map(serde_json::from_str(LIVE_JSON).unwrap());
        let game = map.get(&PairKey::new("LAC", "SA")).unwrap();
        assert!(!game.has_quarter_data());
        assert_eq!(game.team("SAS").unwrap().points, None);
    }

    #[test]
    fn missing_scoreboard_is_empty() {
        assert!(build_game_map(serde_json::from_str("{}").unwrap()).is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_is_empty() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/todaysScoreboard_00.json")
            .with_status(404)
            .create_async()
            .await;

        let feed = LiveFeed::new(
            UpstreamClient::with_defaults().unwrap(),
            format!("{}/todaysScoreboard_00.json", server.url()),
        );
        assert!(feed.fetch_games().await.is_empty());
    }
}
