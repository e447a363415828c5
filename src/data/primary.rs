//! Primary source parser for the basketball-reference scores page.
//!
//! Works on the token stream from [`super::markup`]. The parser never fails:
//! anything it cannot recognise becomes an unknown value or is skipped.
//! Commented-out markup is not part of the scores page.
//!
//! Two positional contracts come from the page layout and are kept as-is:
//! - the document is narrowed to `<div id="scores">` when present, otherwise
//!   the whole document is scanned;
//! - in a team row, the *last* numeric cell is the total (unknown when
//!   blank) and the preceding numeric cells are the period scores, in period
//!   order. The front page's `gamelink` cell is not a score cell.

use super::markup::{find_element, find_elements, tokenize, Tag, Token, TokenKind};
use super::models::{Game, Team};
use super::teams::canonical_team_code;
use super::text::{parse_integer, strip_tags};

/// Characters of normalized markup after a game table that are searched for
/// status text and links.
pub const STATUS_WINDOW: usize = 520;

const SCORES_REGION_ID: &str = "scores";
const GAME_TABLE_CLASS: &str = "teams";
const GAME_LINK_CLASS: &str = "gamelink";
const LINE_SCORE_TABLE_ID: &str = "line_score";
const TEAM_PATH: &str = "/teams/";
const BOXSCORE_PATH: &str = "/boxscores/";

/// Rows and header labels pulled out of one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedTable {
    pub teams: Vec<Team>,
    pub quarter_labels: Vec<String>,
}

/// Two team rows from a box score page's line score table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineScore {
    pub teams: [Team; 2],
    pub quarter_labels: Vec<String>,
}

impl LineScore {
    pub fn has_quarter_data(&self) -> bool {
        self.teams.iter().any(Team::has_quarters)
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Extract every game from the scores page. `origin` absolutizes box score
/// links (e.g. `https://www.basketball-reference.com`).
pub fn extract_games(html: &str, origin: &str) -> Vec<Game> {
    let tokens = tokenize(html);

    let (region, region_end) =
        match find_element(&tokens, 0, "div", |t| t.attr("id") == Some(SCORES_REGION_ID)) {
            Some(span) => (&tokens[span.open..=span.close], span.end),
            None => (&tokens[..], tokens.last().map_or(0, |t| t.end)),
        };

    let mut games = Vec::new();
    for span in find_elements(region, "table", |t| t.has_class(GAME_TABLE_CLASS)) {
        let table = parse_table(&region[span.open..=span.close]);
        let Ok(teams) = <[Team; 2]>::try_from(table.teams) else {
            continue;
        };
        let [away, home] = teams;

        let window_end = (span.end + STATUS_WINDOW).min(region_end);
        let window: Vec<&Token> = region[span.open..]
            .iter()
            .take_while(|t| t.start < window_end)
            .collect();

        let mut game = Game::new(parse_status(&window), away, home);
        game.quarter_labels = table.quarter_labels;
        game.boxscore_url = find_boxscore_link(&window, origin);
        game.date_key = game.boxscore_url.as_deref().and_then(date_key_from_url);
        games.push(game);
    }

    games
}

/// Parse the `line_score` table of a box score page. The table is looked
/// up in the live document first, then inside comments, where the site ships
/// its secondary tables.
pub fn parse_line_score(html: &str) -> Option<LineScore> {
    let tokens = tokenize(html);
    line_score_from_tokens(&tokens).or_else(|| {
        tokens
            .iter()
            .filter_map(Token::comment)
            .filter(|body| body.contains(LINE_SCORE_TABLE_ID))
            .find_map(|body| line_score_from_tokens(&tokenize(body)))
    })
}

fn line_score_from_tokens(tokens: &[Token]) -> Option<LineScore> {
    let span = find_element(tokens, 0, "table", |t| {
        t.attr("id") == Some(LINE_SCORE_TABLE_ID)
    })?;

    let table = parse_table(&tokens[span.open..=span.close]);
    let teams = <[Team; 2]>::try_from(table.teams).ok()?;
    Some(LineScore {
        teams,
        quarter_labels: table.quarter_labels,
    })
}

/// Map header cell texts to period labels: `1` → `Q1`, `OT`/`2OT` kept,
/// a trailing total column `T` dropped.
pub fn quarter_labels<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    let mut labels: Vec<String> = headers
        .iter()
        .filter_map(|h| {
            let text = h.as_ref().trim().to_ascii_uppercase();
            if is_digits(&text) {
                Some(format!("Q{text}"))
            } else if is_overtime_label(&text) || text == "T" {
                Some(text)
            } else {
                None
            }
        })
        .collect();

    if labels.last().map(String::as_str) == Some("T") {
        labels.pop();
    }
    labels
}

/// `YYYYMMDD` from a box score link such as `/boxscores/202401150LAL.html`.
pub fn date_key_from_url(url: &str) -> Option<String> {
    let idx = url.rfind(BOXSCORE_PATH)?;
    let file = &url[idx + BOXSCORE_PATH.len()..];
    let key = file.get(..8)?;
    is_digits(key).then(|| key.to_string())
}

// =============================================================================
// Table state machine
// =============================================================================

#[derive(Default)]
struct RowState {
    team: Option<(String, String)>,
    cells: Vec<Option<i64>>,
}

struct CellState {
    header: bool,
    numeric: bool,
    text: String,
}

struct AnchorState {
    code: String,
    text: String,
}

#[derive(Default)]
struct TableParser {
    row: Option<RowState>,
    cell: Option<CellState>,
    anchor: Option<AnchorState>,
    headers: Vec<String>,
    teams: Vec<Team>,
}

impl TableParser {
    fn feed(&mut self, token: &Token) {
        match &token.kind {
            TokenKind::Open(tag) => match tag.name.as_str() {
                "tr" => {
                    self.finish_row();
                    self.row = Some(RowState::default());
                }
                "td" | "th" => {
                    self.finish_cell();
                    self.cell = Some(CellState {
                        header: tag.is("th"),
                        numeric: tag.is("td") && is_numeric_cell(tag),
                        text: String::new(),
                    });
                }
                "a" => self.open_anchor(tag),
                _ => {}
            },
            TokenKind::Close(name) => match name.as_str() {
                "tr" | "table" => self.finish_row(),
                "td" | "th" => self.finish_cell(),
                "a" => self.close_anchor(),
                _ => {}
            },
            TokenKind::Text(text) => {
                if let Some(cell) = self.cell.as_mut() {
                    cell.text.push_str(text);
                }
                if let Some(anchor) = self.anchor.as_mut() {
                    anchor.text.push_str(text);
                }
            }
            TokenKind::Comment(_) => {}
        }
    }

    fn open_anchor(&mut self, tag: &Tag) {
        let needs_team = self.row.as_ref().is_some_and(|r| r.team.is_none());
        if !needs_team {
            return;
        }
        if let Some(code) = tag.attr("href").and_then(team_code_from_href) {
            self.anchor = Some(AnchorState {
                code,
                text: String::new(),
            });
        }
    }

    fn close_anchor(&mut self) {
        if let (Some(anchor), Some(row)) = (self.anchor.take(), self.row.as_mut()) {
            row.team = Some((anchor.code, strip_tags(&anchor.text)));
        }
    }

    fn finish_cell(&mut self) {
        self.close_anchor();
        let Some(cell) = self.cell.take() else {
            return;
        };
        let text = strip_tags(&cell.text);
        if cell.header {
            self.headers.push(text);
        } else if cell.numeric {
            if let Some(row) = self.row.as_mut() {
                row.cells.push(parse_integer(&text));
            }
        }
    }

    fn finish_row(&mut self) {
        self.finish_cell();
        let Some(row) = self.row.take() else {
            return;
        };
        let Some((code, name)) = row.team else {
            return;
        };

        let mut cells = row.cells;
        let mut team = Team::new(code, name);
        if let Some(total) = cells.pop() {
            team.points = total;
            team.quarters = cells;
        }
        self.teams.push(team);
    }

    fn finish(mut self) -> ParsedTable {
        self.finish_row();
        ParsedTable {
            teams: self.teams,
            quarter_labels: quarter_labels(self.headers.as_slice()),
        }
    }
}

fn parse_table(tokens: &[Token]) -> ParsedTable {
    let mut parser = TableParser::default();
    for token in tokens {
        parser.feed(token);
    }
    parser.finish()
}

fn is_numeric_cell(tag: &Tag) -> bool {
    !tag.has_class(GAME_LINK_CLASS)
        && tag
            .classes()
            .any(|c| c.eq_ignore_ascii_case("right") || c.eq_ignore_ascii_case("center"))
}

/// `/teams/LAL/2024.html` → `LAL` (canonicalized).
fn team_code_from_href(href: &str) -> Option<String> {
    let idx = href.find(TEAM_PATH)?;
    let segment = href[idx + TEAM_PATH.len()..].split(['/', '?', '#']).next()?;
    let code = canonical_team_code(segment);
    (!code.is_empty()).then_some(code)
}

// =============================================================================
// Trailing window: status and box score link
// =============================================================================

fn parse_status(window: &[&Token]) -> String {
    let texts: Vec<&str> = window
        .iter()
        .filter_map(|t| match &t.kind {
            TokenKind::Text(s) => Some(s.trim()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();

    if let Some(text) = texts.iter().find(|s| is_final_status(s)) {
        return text.to_string();
    }
    if let Some(text) = texts.iter().find(|s| is_clock_status(s)) {
        return text.to_string();
    }
    "Scheduled".to_string()
}

fn find_boxscore_link(window: &[&Token], origin: &str) -> Option<String> {
    window
        .iter()
        .filter_map(|t| t.open_tag()?.attr("href"))
        .find_map(|href| {
            if href.starts_with(BOXSCORE_PATH) {
                Some(format!("{}{}", origin.trim_end_matches('/'), href))
            } else if href.starts_with("http") && href.contains(BOXSCORE_PATH) {
                Some(href.to_string())
            } else {
                None
            }
        })
}

/// `Final`, `Final/OT`, `Final/2OT`, ... (case-insensitive).
fn is_final_status(text: &str) -> bool {
    let lower = text.to_ascii_lowercase();
    match lower.strip_prefix("final") {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix('/')
            .is_some_and(|ot| is_overtime_label(&ot.to_ascii_uppercase())),
        None => false,
    }
}

/// Tip-off or clock text such as `7:30 PM ET` / `10:00pm ET`.
fn is_clock_status(text: &str) -> bool {
    let upper = text.to_ascii_uppercase();
    let Some((hours, rest)) = upper.split_once(':') else {
        return false;
    };
    if hours.is_empty() || hours.len() > 2 || !is_digits(hours) {
        return false;
    }
    let (Some(minutes), Some(rest)) = (rest.get(..2), rest.get(2..)) else {
        return false;
    };
    if !is_digits(minutes) {
        return false;
    }
    let rest = rest.trim_start();
    let Some(rest) = rest.strip_prefix("AM").or_else(|| rest.strip_prefix("PM")) else {
        return false;
    };
    rest.trim_start() == "ET"
}

fn is_overtime_label(text: &str) -> bool {
    text.strip_suffix("OT")
        .is_some_and(|n| n.is_empty() || is_digits(n))
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

// =============================================================================
// Tests
// =============================================================================
