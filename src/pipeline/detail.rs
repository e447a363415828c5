//! Box score enrichment.
//!
//! Games without period scores that carry a box score link get their line
//! score fetched and parsed. Fetches run concurrently and are joined before
//! the next stage; a failed fetch leaves its game untouched.

use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;

use crate::api::client::UpstreamClient;
use crate::data::models::Game;
use crate::data::primary::{parse_line_score, LineScore};
use crate::data::teams::canonical_team_code;

use super::PipelineError;

/// Upper bound on box score requests per user-facing call.
pub const MAX_DETAIL_FETCHES: usize = 10;
/// Box score requests in flight at once.
pub const DETAIL_CONCURRENCY: usize = 5;

pub async fn enrich_from_box_scores(
    client: &UpstreamClient,
    mut games: Vec<Game>,
) -> Result<Vec<Game>, PipelineError> {
    let targets: Vec<(usize, String)> = games
        .iter()
        .enumerate()
        .filter(|(_, g)| !g.has_quarter_data())
        .filter_map(|(i, g)| g.boxscore_url.clone().map(|url| (i, url)))
        .take(MAX_DETAIL_FETCHES)
        .collect();

    if targets.is_empty() {
        return Ok(games);
    }

    let semaphore = Arc::new(Semaphore::new(DETAIL_CONCURRENCY));
    let mut tasks = Vec::with_capacity(targets.len());

    for (idx, url) in targets {
        let client = client.clone();
        let sem = semaphore.clone();

        tasks.push(tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return (idx, None);
            };
            (idx, fetch_line_score(&client, &url).await)
        }));
    }

    let mut enriched = 0;
    for task in tasks {
        let (idx, line) = task.await?;
        if let (Some(line), Some(game)) = (line, games.get_mut(idx)) {
            if apply_line_score(game, line) {
                enriched += 1;
            }
        }
    }

    debug!(enriched, "Box score stage done");
    Ok(games)
}

/// Fetch and parse one box score page; `None` on any miss.
pub async fn fetch_line_score(client: &UpstreamClient, url: &str) -> Option<LineScore> {
    match client.get_text(url).await {
        Ok(html) => {
            let line = parse_line_score(&html);
            if line.is_none() {
                debug!(url = %url, "No line score table in box score page");
            }
            line
        }
        Err(e) => {
            debug!(url = %url, error = %e, "Box score fetch failed");
            None
        }
    }
}

/// Copy period scores onto `game` when both teams match by canonical code
/// and the line score has period data. Returns whether the game changed.
pub fn apply_line_score(game: &mut Game, line: LineScore) -> bool {
    if !line.has_quarter_data() {
        return false;
    }

    let matched: Option<Vec<usize>> = game
        .teams
        .iter()
        .map(|team| {
            let code = canonical_team_code(&team.code);
            line.teams
                .iter()
                .position(|t| canonical_team_code(&t.code) == code)
        })
        .collect();

    let Some(matched) = matched else {
        debug!(pair = %game.pair_key(), "Line score teams do not match game");
        return false;
    };

    for (team, source_idx) in game.teams.iter_mut().zip(matched) {
        team.take_scores_from(&line.teams[source_idx]);
    }
    game.quarter_labels = line.quarter_labels;
    true
}
