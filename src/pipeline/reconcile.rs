//! Gap filling from the secondary feeds.
//!
//! A game is complete once either team has period scores. Incomplete games
//! are matched against a `SourceGameMap` by canonical team pair only; team
//! names never participate in matching.

use futures::future::join_all;
use std::collections::BTreeMap;
use std::future::Future;
use tracing::debug;

use crate::data::models::{Game, SourceGame, SourceGameMap};
use crate::data::teams::canonical_team_code;

/// Copy `source` scores onto `game`. Only applies when the source entry has
/// period data and both teams resolve by canonical code. `boxscoreUrl`,
/// `dateKey`, codes and names of `game` are kept.
pub fn merge_source_game(game: &mut Game, source: &SourceGame) -> bool {
    if !source.has_quarter_data() {
        return false;
    }

    let matched: Option<Vec<_>> = game
        .teams
        .iter()
        .map(|team| source.team(&canonical_team_code(&team.code)).cloned())
        .collect();
    let Some(matched) = matched else {
        return false;
    };

    for (team, from) in game.teams.iter_mut().zip(matched.iter()) {
        team.take_scores_from(from);
    }
    game.status = source.status.clone();
    game.quarter_labels = source.quarter_labels.clone();
    true
}

/// Fill incomplete games from one map. Returns how many games were filled.
pub fn apply_source(games: &mut [Game], map: &SourceGameMap) -> usize {
    if map.is_empty() {
        return 0;
    }

    let mut filled = 0;
    for game in games.iter_mut().filter(|g| !g.has_quarter_data()) {
        if let Some(source) = map.get(&game.pair_key()) {
            if merge_source_game(game, source) {
                filled += 1;
            }
        }
    }
    filled
}

/// Fill incomplete games from a date-scoped source. `fetch` is called once
/// per distinct date key (games without one use `today`), concurrently.
pub async fn fill_by_date<F, Fut>(mut games: Vec<Game>, today: &str, fetch: F) -> Vec<Game>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = SourceGameMap>,
{
    let mut by_date: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, game) in games.iter().enumerate() {
        if game.has_quarter_data() {
            continue;
        }
        let key = game.date_key.clone().unwrap_or_else(|| today.to_string());
        by_date.entry(key).or_default().push(idx);
    }

    if by_date.is_empty() {
        return games;
    }

    let keys: Vec<String> = by_date.keys().cloned().collect();
    let maps = join_all(keys.iter().cloned().map(&fetch)).await;

    for (key, map) in keys.iter().zip(maps) {
        let Some(indices) = by_date.get(key) else {
            continue;
        };
        let mut filled = 0;
        for &idx in indices {
            if let Some(source) = map.get(&games[idx].pair_key()) {
                if merge_source_game(&mut games[idx], source) {
                    filled += 1;
                }
            }
        }
        debug!(date_key = %key, candidates = indices.len(), filled, "Date-scoped fill done");
    }

    games
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::Team;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn team(code: &str, points: Option<i64>, quarters: &[i64]) -> Team {
        Team {
            code: code.to_string(),
            name: format!("{code} name"),
            points,
            quarters: quarters.iter().copied().map(Some).collect(),
        }
    }

    fn source(status: &str, away: Team, home: Team) -> SourceGame {
        SourceGame::new(status, away, home).unwrap()
    }

    #[test]
    fn merges_by_canonical_code_and_keeps_primary_fields() {
        let mut game = Game::new("Scheduled", team("BRK", None, &[]), team("PHO", None, &[]));
        game.boxscore_url = Some("https://example.test/boxscores/1.html".into());

        let src = source(
            "Final",
            team("PHX", Some(116), &[30, 30, 30, 26]),
            team("BKN", Some(101), &[25, 25, 25, 26]),
        );
        assert!(merge_source_game(&mut game, &src));

        assert_eq!(game.status, "Final");
        assert_eq!(game.teams[0].code, "BRK");
        assert_eq!(game.teams[0].name, "BRK name");
        assert_eq!(game.teams[0].points, Some(101));
        assert_eq!(game.teams[1].points, Some(116));
        assert_eq!(game.quarter_labels, vec!["Q1", "Q2", "Q3", "Q4"]);
        assert_eq!(game.boxscore_url.as_deref(), Some("https://example.test/boxscores/1.html"));
    }

    #[test]
    fn never_merges_different_teams() {
        let mut game = Game::new("Scheduled", team("LAL", None, &[]), team("BOS", None, &[]));
        let map: SourceGameMap = vec![
            source("Final", team("LAC", Some(1), &[1]), team("BOS", Some(2), &[2])),
            source("Final", team("LAL", Some(1), &[1]), team("NYK", Some(2), &[2])),
        ]
        .into_iter()
        .collect();

        assert_eq!(apply_source(std::slice::from_mut(&mut game), &map), 0);
        assert_eq!(game.teams[0].points, None);
        assert_eq!(game.status, "Scheduled");
    }

    #[test]
    fn entries_without_quarters_do_not_overwrite() {
        let mut game = Game::new("Scheduled", team("LAL", None, &[]), team("BOS", None, &[]));
        let map: SourceGameMap = vec![source("7:30 PM ET", team("LAL", None, &[]), team("BOS", None, &[]))]
            .into_iter()
            .collect();
        assert_eq!(apply_source(std::slice::from_mut(&mut game), &map), 0);
        assert_eq!(game.status, "Scheduled");
    }

    #[test]
    fn complete_games_are_left_alone() {
        let before = Game::new("Final", team("LAL", Some(110), &[28, 30, 25, 27]), team("BOS", Some(97), &[20, 25, 30, 22]));
        let mut games = vec![before.clone()];
        let map: SourceGameMap = vec![source("Q1", team("LAL", Some(2), &[2]), team("BOS", Some(0), &[0]))]
            .into_iter()
            .collect();
        assert_eq!(apply_source(&mut games, &map), 0);
        assert_eq!(games[0], before);
    }

    #[tokio::test]
    async fn fill_by_date_queries_each_date_once() {
        let mut a = Game::new("Scheduled", team("LAL", None, &[]), team("BOS", None, &[]));
        a.date_key = Some("20240115".into());
        let mut b = Game::new("Scheduled", team("MIA", None, &[]), team("NYK", None, &[]));
        b.date_key = Some("20240115".into());
        let c = Game::new("Scheduled", team("DEN", None, &[]), team("UTA", None, &[]));
        let done = Game::new("Final", team("GSW", Some(1), &[1]), team("SAC", Some(0), &[0]));

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let games = fill_by_date(vec![a, b, c, done], "20240116", move |key: String| {
            let seen = seen.clone();
            async move {
                seen.fetch_add(1, Ordering::SeqCst);
                match key.as_str() {
                    "20240115" => vec![source("Final", team("LAL", Some(110), &[28]), team("BOS", Some(97), &[20]))]
                        .into_iter()
                        .collect(),
                    "20240116" => vec![source("Final", team("UTA", Some(90), &[22]), team("DEN", Some(95), &[24]))]
                        .into_iter()
                        .collect(),
                    _ => SourceGameMap::new(),
                }
            }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(games.len(), 4);
        assert_eq!(games[0].teams[0].points, Some(110));
        assert!(!games[1].has_quarter_data());
        assert_eq!(games[2].teams[0].code, "DEN");
        assert_eq!(games[2].teams[0].points, Some(95));
        assert_eq!(games[3].teams[0].points, Some(1));
    }
}
