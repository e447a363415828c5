//! Enrichment pipeline: primary parse → box scores → ESPN → NBA live.

pub mod detail;
pub mod engine;
pub mod reconcile;

use thiserror::Error;

/// Failures that escape per-source isolation and abort the request.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Enrichment task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Task(err.to_string())
    }
}

/// Ordered fallback tiers applied to games still missing quarter data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentStage {
    /// Per-game box score pages from the primary site.
    BoxScores,
    /// ESPN scoreboard, one request per distinct date key.
    Espn,
    /// NBA live scoreboard, one request for all games.
    NbaLive,
}

impl EnrichmentStage {
    pub const ORDER: [EnrichmentStage; 3] = [Self::BoxScores, Self::Espn, Self::NbaLive];

    pub fn label(&self) -> &'static str {
        match self {
            Self::BoxScores => "box_scores",
            Self::Espn => "espn",
            Self::NbaLive => "nba_live",
        }
    }
}
