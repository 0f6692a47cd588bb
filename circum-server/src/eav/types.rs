//! Upstream response DTOs.
//!
//! These types map directly to the upstream planner's JSON. Each envelope
//! is an untagged enum so that an error payload is told apart from data at
//! the boundary, before anything else looks at it. Fields the upstream
//! sometimes omits are `Option` or defaulted.

use serde::Deserialize;

/// Response from the solutions endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SolutionsEnvelope {
    /// Itineraries found (possibly none).
    Found { solutions: Vec<SolutionDto> },

    /// The upstream refused the request.
    Failed { error: String },
}

/// One itinerary: one or more consecutive train segments.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SolutionDto {
    /// Date of the first departure, `DD/MM/YYYY`.
    pub date: String,

    /// Segments in travel order.
    #[serde(default)]
    pub segments: Vec<SegmentDto>,
}

/// One train ridden as part of an itinerary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentDto {
    pub train_number: Option<String>,

    pub category: Option<String>,

    /// Boarding station name.
    pub departure_station: String,

    /// Alighting station name.
    pub arrival_station: String,

    /// `HH:MM`
    pub departure_time: String,

    /// `HH:MM`, may be on the next day.
    pub arrival_time: String,

    /// Minutes late; absent means on time.
    #[serde(default)]
    pub delay: Option<i32>,

    #[serde(default)]
    pub cancelled: bool,
}

/// Response from the board endpoint when it answers in JSON.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BoardEnvelope {
    /// Rows wrapped in an object.
    Trains { trains: Vec<BoardRowDto> },

    /// A bare array of rows.
    Rows(Vec<BoardRowDto>),

    /// The upstream refused the request.
    Failed { error: String },
}

/// One train on a live board.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRowDto {
    /// Placeholder rows have no number.
    pub train_number: Option<String>,

    pub category: Option<String>,

    /// Destination on departure boards, origin on arrival boards.
    pub station: Option<String>,

    pub platform: Option<String>,

    /// Scheduled `HH:MM`.
    pub time: Option<String>,

    #[serde(default)]
    pub delay: Option<i32>,

    /// Free-text status, e.g. "In orario" or "Soppresso".
    pub status: Option<String>,
}
