//! Request orchestration.
//!
//! One `run` per `GET /scores`: fetch the primary page, extract games, then
//! walk `EnrichmentStage::ORDER` until every game has period scores or the
//! stages run out. When the primary page is unavailable or empty, the
//! secondary feeds alone produce the response.

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::api::client::{Endpoints, UpstreamClient};
use crate::data::live_feed::LiveFeed;
use crate::data::models::{Game, ScoresResponse};
use crate::data::primary::extract_games;
use crate::data::scores_feed::ScoresFeed;

use super::detail::enrich_from_box_scores;
use super::reconcile::{apply_source, fill_by_date};
use super::{EnrichmentStage, PipelineError};

/// Days (today included) searched on the fallback-only path.
pub const FALLBACK_DAYS: usize = 3;
/// Fixed offset used for the "today" date key (US Eastern, standard time).
const EASTERN_OFFSET_HOURS: i64 = 5;

pub const NO_PRIMARY_GAMES: &str = "No games found in primary source";

/// Per-request pipeline over the fixed upstream set.
#[derive(Debug, Clone)]
pub struct ScoresEngine {
    client: UpstreamClient,
    endpoints: Endpoints,
    espn: ScoresFeed,
    live: LiveFeed,
}

impl ScoresEngine {
    pub fn new(client: UpstreamClient, endpoints: Endpoints) -> Self {
        let espn = ScoresFeed::new(client.clone(), endpoints.espn_bases.clone());
        let live = LiveFeed::new(client.clone(), endpoints.nba_live.clone());
        Self {
            client,
            endpoints,
            espn,
            live,
        }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> Result<ScoresResponse, PipelineError> {
        let html = match self.client.get_text(&self.endpoints.primary).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "Primary source unavailable, using fallback feeds");
                return Ok(self.fallback_only(now, e.reason()).await);
            }
        };

        let mut games = extract_games(&html, &self.endpoints.primary_origin);
        if games.is_empty() {
            info!("Primary source listed no games, using fallback feeds");
            return Ok(self.fallback_only(now, NO_PRIMARY_GAMES.to_string()).await);
        }

        let today = today_key(now);
        for stage in EnrichmentStage::ORDER {
            let pending = games.iter().filter(|g| !g.has_quarter_data()).count();
            if pending == 0 {
                break;
            }
            debug!(stage = stage.label(), pending, "Running enrichment stage");
            games = self.apply_stage(stage, games, &today).await?;
        }

        let complete = games.iter().filter(|g| g.has_quarter_data()).count();
        info!(games = games.len(), complete, "Scores assembled from primary source");

        Ok(ScoresResponse::new(
            self.endpoints.primary.clone(),
            now,
            games,
            None,
        ))
    }

    async fn apply_stage(
        &self,
        stage: EnrichmentStage,
        mut games: Vec<Game>,
        today: &str,
    ) -> Result<Vec<Game>, PipelineError> {
        match stage {
            EnrichmentStage::BoxScores => enrich_from_box_scores(&self.client, games).await,
            EnrichmentStage::Espn => {
                let espn = &self.espn;
                Ok(fill_by_date(games, today, move |key: String| async move {
                    espn.fetch_games(&key).await
                })
                .await)
            }
            EnrichmentStage::NbaLive => {
                let map = self.live.fetch_games().await;
                let filled = apply_source(&mut games, &map);
                debug!(filled, "NBA live stage done");
                Ok(games)
            }
        }
    }

    /// Secondary feeds only. ESPN over the recent window first (most recent
    /// date with games wins), then the NBA live scoreboard. An empty result
    /// is still a successful response.
    async fn fallback_only(&self, now: DateTime<Utc>, reason: String) -> ScoresResponse {
        let keys = recent_date_keys(now, FALLBACK_DAYS);
        let results = join_all(keys.iter().map(|key| self.espn.fetch_games_with_base(key))).await;

        for (key, result) in keys.iter().zip(results) {
            if let Some((base, map)) = result {
                if !map.is_empty() {
                    info!(date_key = %key, games = map.len(), reason = %reason, "Serving ESPN fallback");
                    return ScoresResponse::new(base, now, map.into_games(), Some(reason));
                }
            }
        }

        let live = self.live.fetch_games().await;
        if !live.is_empty() {
            info!(games = live.len(), reason = %reason, "Serving NBA live fallback");
            return ScoresResponse::new(
                self.endpoints.nba_live.clone(),
                now,
                live.into_games(),
                Some(reason),
            );
        }

        warn!(reason = %reason, "No fallback data available");
        ScoresResponse::new(self.endpoints.primary.clone(), now, Vec::new(), Some(reason))
    }
}

/// `YYYYMMDD` for the US-Eastern calendar day containing `now`.
pub fn today_key(now: DateTime<Utc>) -> String {
    (now - Duration::hours(EASTERN_OFFSET_HOURS))
        .format("%Y%m%d")
        .to_string()
}

/// Today's key followed by the `days - 1` prior days, most recent first.
pub fn recent_date_keys(now: DateTime<Utc>, days: usize) -> Vec<String> {
    let eastern = now - Duration::hours(EASTERN_OFFSET_HOURS);
    (0..days as i64)
        .map(|back| (eastern - Duration::days(back)).format("%Y%m%d").to_string())
        .collect()
}
