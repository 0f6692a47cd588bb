//! Live departure and arrival boards.
//!
//! The board endpoint answers either with an HTML fragment (one table row
//! per train) or with JSON. Both go through [`BoardParser`] so the rest of
//! the adapter never sees which one arrived.
//!
//! The HTML parser does not build a document tree. It slices the body on
//! `<tr` and picks `<td>` cells out of each row by their CSS class, which
//! is all the structure the upstream page guarantees.

use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use serde::Serialize;
use tracing::debug;

use crate::domain::ClockTime;

use super::convert::delay_minutes;
use super::error::EavError;
use super::types::{BoardEnvelope, BoardRowDto};

/// CSS class markers of the board cells.
const TRAIN_CLASS: &str = "treno";
const CATEGORY_CLASS: &str = "categoria";
const DESTINATION_CLASS: &str = "destinazione";
const ORIGIN_CLASS: &str = "provenienza";
const PLATFORM_CLASS: &str = "binario";
const TIME_CLASS: &str = "orario";
const DELAY_CLASS: &str = "ritardo";
const STATUS_CLASS: &str = "stato";

static TABLE: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<(?:table|tr)[\s>]"));
static ROW_START: LazyLock<Regex> = LazyLock::new(|| pattern(r"(?i)<tr[\s>]"));
static CELL: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"(?is)<(td|th)\b([^>]*)>(.*?)</t[dh]\s*>"));
static CLASS_ATTR: LazyLock<Regex> =
    LazyLock::new(|| pattern(r#"(?i)\bclass\s*=\s*(?:"([^"]*)"|'([^']*)')"#));
static TAG: LazyLock<Regex> = LazyLock::new(|| pattern(r"<[^>]*>"));
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"&(#[xX][0-9a-fA-F]{1,6}|#[0-9]{1,7}|[a-zA-Z]{2,8});"));
static DELAY: LazyLock<Regex> = LazyLock::new(|| pattern(r"(-\s*)?(\d+)"));

fn pattern(re: &str) -> Regex {
    Regex::new(re).expect("board pattern is a valid regex")
}

/// Status text fragments that mean the train will not run.
const CANCEL_KEYWORDS: [&str; 3] = ["soppress", "cancel", "annull"];

/// Which board to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoardKind {
    Arrivals,
    Departures,
}

impl BoardKind {
    /// Parse `arrivals` or `departures`, ignoring case.
    pub fn parse(s: &str) -> Result<Self, EavError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "arrivals" => Ok(BoardKind::Arrivals),
            "departures" => Ok(BoardKind::Departures),
            other => Err(EavError::InvalidRequest(format!(
                "board type must be arrivals or departures, got '{other}'"
            ))),
        }
    }

    /// Value of the upstream's board type field.
    pub fn upstream_code(&self) -> &'static str {
        match self {
            BoardKind::Arrivals => "arrivi",
            BoardKind::Departures => "partenze",
        }
    }
}

impl fmt::Display for BoardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoardKind::Arrivals => write!(f, "arrivals"),
            BoardKind::Departures => write!(f, "departures"),
        }
    }
}

/// Normalised running status of a board entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrainStatus {
    OnTime,
    Delayed,
    Cancelled,
}

/// Map free-text status and delay to a [`TrainStatus`].
///
/// A cancellation keyword anywhere in the text wins; otherwise any
/// positive delay means delayed.
///
/// # Examples
///
/// ```
/// use circum_server::eav::{TrainStatus, normalize_status};
///
/// assert_eq!(normalize_status(Some("Treno SOPPRESSO"), 0), TrainStatus::Cancelled);
/// assert_eq!(normalize_status(Some("In viaggio"), 4), TrainStatus::Delayed);
/// assert_eq!(normalize_status(None, 0), TrainStatus::OnTime);
/// ```
pub fn normalize_status(text: Option<&str>, delay_minutes: u32) -> TrainStatus {
    let cancelled = text.is_some_and(|t| {
        let t = t.to_lowercase();
        CANCEL_KEYWORDS.iter().any(|k| t.contains(k))
    });

    if cancelled {
        TrainStatus::Cancelled
    } else if delay_minutes > 0 {
        TrainStatus::Delayed
    } else {
        TrainStatus::OnTime
    }
}

/// One train on a live board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardEntry {
    pub train_number: String,
    pub category: Option<String>,
    /// Destination on departure boards, origin on arrival boards.
    pub station: Option<String>,
    pub platform: Option<String>,
    pub scheduled_time: Option<ClockTime>,
    pub delay_minutes: u32,
    pub status_text: Option<String>,
    pub status: TrainStatus,
}

/// Turns a board response body into entries.
pub trait BoardParser {
    fn parse(&self, body: &str) -> Result<Vec<BoardEntry>, EavError>;
}

/// Parse a board body, choosing the parser by its first character.
pub fn parse_board(body: &str) -> Result<Vec<BoardEntry>, EavError> {
    if body.trim_start().starts_with('<') {
        HtmlBoardParser.parse(body)
    } else {
        JsonBoardParser.parse(body)
    }
}

/// Parser for the HTML table fragment.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlBoardParser;

impl BoardParser for HtmlBoardParser {
    fn parse(&self, body: &str) -> Result<Vec<BoardEntry>, EavError> {
        if !TABLE.is_match(body) {
            return Err(EavError::Parse {
                message: "no board table in HTML response".to_string(),
            });
        }

        let mut entries = Vec::new();
        for row in split_rows(body) {
            let Some(train_number) = cell(row, TRAIN_CLASS) else {
                // Headers, spacers and "no trains" rows
                continue;
            };

            let delay = parse_delay(cell(row, DELAY_CLASS).as_deref().unwrap_or(""));
            let status_text = cell(row, STATUS_CLASS);
            entries.push(BoardEntry {
                train_number,
                category: cell(row, CATEGORY_CLASS),
                station: cell(row, DESTINATION_CLASS).or_else(|| cell(row, ORIGIN_CLASS)),
                platform: cell(row, PLATFORM_CLASS),
                scheduled_time: cell(row, TIME_CLASS).and_then(|t| parse_time(&t)),
                delay_minutes: delay,
                status: normalize_status(status_text.as_deref(), delay),
                status_text,
            });
        }

        Ok(entries)
    }
}

/// Parser for the JSON board.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBoardParser;

impl BoardParser for JsonBoardParser {
    fn parse(&self, body: &str) -> Result<Vec<BoardEntry>, EavError> {
        let envelope: BoardEnvelope = serde_json::from_str(body).map_err(|e| EavError::Parse {
            message: e.to_string(),
        })?;

        let rows = match envelope {
            BoardEnvelope::Trains { trains } => trains,
            BoardEnvelope::Rows(rows) => rows,
            BoardEnvelope::Failed { error } => return Err(EavError::Rejected(error)),
        };

        Ok(rows.into_iter().filter_map(convert_row).collect())
    }
}

fn convert_row(row: BoardRowDto) -> Option<BoardEntry> {
    let train_number = non_empty(row.train_number?)?;
    let delay = delay_minutes(row.delay);
    let status_text = row.status.and_then(non_empty);

    Some(BoardEntry {
        train_number,
        category: row.category.and_then(non_empty),
        station: row.station.and_then(non_empty),
        platform: row.platform.and_then(non_empty),
        scheduled_time: row.time.as_deref().and_then(parse_time),
        delay_minutes: delay,
        status: normalize_status(status_text.as_deref(), delay),
        status_text,
    })
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_time(s: &str) -> Option<ClockTime> {
    let time = ClockTime::parse(s.trim()).ok();
    if time.is_none() {
        debug!(value = s, "unparseable board time");
    }
    time
}

/// First run of digits, e.g. `+5'` or `5 min`; anything else is on time.
fn parse_delay(s: &str) -> u32 {
    match DELAY.captures(s) {
        Some(caps) if caps.get(1).is_none() => caps[2].parse().unwrap_or(0),
        _ => 0,
    }
}

/// Slice the body into `<tr ...>` chunks.
fn split_rows(body: &str) -> Vec<&str> {
    let starts: Vec<usize> = ROW_START.find_iter(body).map(|m| m.start()).collect();

    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(body.len());
            &body[start..end]
        })
        .collect()
}

/// Text of the first `<td>` in `row` whose class list contains `marker`.
///
/// Header cells never count, even when they carry the marker class.
fn cell(row: &str, marker: &str) -> Option<String> {
    let found = CELL
        .captures_iter(row)
        .filter(|caps| caps[1].eq_ignore_ascii_case("td"))
        .find(|caps| has_class(&caps[2], marker))?;

    non_empty(clean_text(&found[3]))
}

fn has_class(attributes: &str, marker: &str) -> bool {
    CLASS_ATTR
        .captures(attributes)
        .and_then(|caps| caps.get(1).or_else(|| caps.get(2)))
        .is_some_and(|value| {
            value
                .as_str()
                .split_ascii_whitespace()
                .any(|class| class.eq_ignore_ascii_case(marker))
        })
}

/// Strip tags, decode entities and collapse whitespace.
fn clean_text(html: &str) -> String {
    let text = TAG.replace_all(html, " ");
    decode_entities(&text)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Unknown entities are left as written.
fn decode_entities(s: &str) -> String {
    ENTITY
        .replace_all(s, |caps: &Captures<'_>| match decode_entity(&caps[1]) {
            Some(c) => c.to_string(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        "egrave" => Some('è'),
        "agrave" => Some('à'),
        "ograve" => Some('ò'),
        "ugrave" => Some('ù'),
        "igrave" => Some('ì'),
        "eacute" => Some('é'),
        _ => {
            let num = name.strip_prefix('#')?;
            let code = match num.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => num.parse().ok()?,
            };
            char::from_u32(code)
        }
    }
}
