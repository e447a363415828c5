//! Core data models for the scores relay.
//!
//! `Team`/`Game` are the public wire shapes (camelCase, unknown values as
//! `null`). `SourceGame`/`SourceGameMap` are per-request lookup structures
//! built from the secondary feeds and discarded afterwards.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::teams::{canonical_team_code, PairKey};

// =============================================================================
// Team / Game
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub code: String,
    pub name: String,
    /// Total points; `None` when the source had no usable value.
    pub points: Option<i64>,
    /// Per-period points, in period order (overtimes included).
    pub quarters: Vec<Option<i64>>,
}

impl Team {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            points: None,
            quarters: Vec::new(),
        }
    }

    pub fn has_quarters(&self) -> bool {
        !self.quarters.is_empty()
    }

    /// Replace `points` and `quarters` together from another source's record.
    pub fn take_scores_from(&mut self, other: &Team) {
        self.points = other.points;
        self.quarters = other.quarters.clone();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub status: String,
    /// Away team first, home team second.
    pub teams: [Team; 2],
    pub quarter_labels: Vec<String>,
    pub boxscore_url: Option<String>,
    /// `YYYYMMDD` used to scope date-based fallback lookups.
    pub date_key: Option<String>,
}

impl Game {
    pub fn new(status: impl Into<String>, away: Team, home: Team) -> Self {
        Self {
            status: status.into(),
            teams: [away, home],
            quarter_labels: Vec::new(),
            boxscore_url: None,
            date_key: None,
        }
    }

    /// True once at least one team carries period scores.
    pub fn has_quarter_data(&self) -> bool {
        self.teams.iter().any(Team::has_quarters)
    }

    pub fn period_count(&self) -> usize {
        self.teams.iter().map(|t| t.quarters.len()).max().unwrap_or(0)
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.teams[0].code, &self.teams[1].code)
    }

    /// Make `quarter_labels` exactly as long as the longest `quarters` list,
    /// filling missing labels with generated period names.
    pub fn align_quarter_labels(&mut self) {
        let periods = self.period_count();
        self.quarter_labels.truncate(periods);
        while self.quarter_labels.len() < periods {
            let next = self.quarter_labels.len() + 1;
            self.quarter_labels.push(period_label(next));
        }
    }
}

/// Display label for a 1-based period number: `Q1`..`Q4`, `OT`, `2OT`, ...
pub fn period_label(period: usize) -> String {
    match period {
        0..=4 => format!("Q{period}"),
        5 => "OT".to_string(),
        n => format!("{}OT", n - 4),
    }
}

/// Labels for `count` periods starting at period 1.
pub fn period_labels(count: usize) -> Vec<String> {
    (1..=count).map(period_label).collect()
}

// =============================================================================
// Source game map (secondary feeds)
// =============================================================================

/// One secondary source's view of a game. Team codes are canonical.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceGame {
    pub status: String,
    pub quarter_labels: Vec<String>,
    /// Away then home.
    pub teams: [Team; 2],
    pub date_key: Option<String>,
}

impl SourceGame {
    /// Build from raw team records; `None` if either team has no usable code.
    pub fn new(status: impl Into<String>, away: Team, home: Team) -> Option<Self> {
        let mut away = away;
        let mut home = home;
        away.code = canonical_team_code(&away.code);
        home.code = canonical_team_code(&home.code);
        if away.code.is_empty() || home.code.is_empty() {
            return None;
        }

        let periods = away.quarters.len().max(home.quarters.len());
        Some(Self {
            status: status.into(),
            quarter_labels: period_labels(periods),
            teams: [away, home],
            date_key: None,
        })
    }

    /// Team record keyed by canonical code.
    pub fn team(&self, canonical_code: &str) -> Option<&Team> {
        self.teams.iter().find(|t| t.code == canonical_code)
    }

    pub fn has_quarter_data(&self) -> bool {
        self.teams.iter().any(Team::has_quarters)
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.teams[0].code, &self.teams[1].code)
    }

    /// Promote to a response game (fallback-only path).
    pub fn into_game(self) -> Game {
        let [away, home] = self.teams;
        let mut game = Game::new(self.status, away, home);
        game.quarter_labels = self.quarter_labels;
        game.date_key = self.date_key;
        game
    }
}

/// Canonical team pair → that source's game record.
#[derive(Debug, Clone, Default)]
pub struct SourceGameMap {
    games: HashMap<PairKey, SourceGame>,
    /// Insertion order, so fallback-only output follows the feed's order.
    order: Vec<PairKey>,
}

impl SourceGameMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, game: SourceGame) {
        let key = game.pair_key();
        if self.games.insert(key.clone(), game).is_none() {
            self.order.push(key);
        }
    }

    pub fn get(&self, key: &PairKey) -> Option<&SourceGame> {
        self.games.get(key)
    }

    pub fn len(&self) -> usize {
        self.games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Games in feed order.
    pub fn into_games(mut self) -> Vec<Game> {
        self.order
            .iter()
            .filter_map(|key| self.games.remove(key))
            .map(SourceGame::into_game)
            .collect()
    }
}

impl FromIterator<SourceGame> for SourceGameMap {
    fn from_iter<I: IntoIterator<Item = SourceGame>>(iter: I) -> Self {
        let mut map = Self::new();
        for game in iter {
            map.insert(game);
        }
        map
    }
}

// =============================================================================
// Response bodies
// =============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoresResponse {
    pub ok: bool,
    pub source: String,
    pub fetched_at: String,
    pub game_count: usize,
    pub games: Vec<Game>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
}

impl ScoresResponse {
    pub fn new(
        source: impl Into<String>,
        fetched_at: DateTime<Utc>,
        mut games: Vec<Game>,
        fallback_reason: Option<String>,
    ) -> Self {
        for game in &mut games {
            game.align_quarter_labels();
        }
        Self {
            ok: true,
            source: source.into(),
            fetched_at: fetched_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            game_count: games.len(),
            games,
            fallback_reason,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageBody {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
    pub detail: String,
}

// =============================================================================
// Tests
// =============================================================================
