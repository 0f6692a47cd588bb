//! Scheduled trains and their service attributes.

use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use super::station::StationId;
use super::time::ClockTime;

/// Opaque train identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrainId(pub u32);

impl fmt::Display for TrainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of travel along the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// Toward Napoli.
    TowardA,
    /// Toward Sorrento.
    TowardB,
}

/// Days of the week a train runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperatingDays {
    WeekdaysOnly,
    WeekendsOnly,
    Daily,
    WeekdaysAndSaturday,
}

impl OperatingDays {
    /// Whether a train with this pattern runs on the given date.
    ///
    /// Public holidays are not modelled; they follow their weekday.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use circum_server::domain::OperatingDays;
    ///
    /// let saturday = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
    /// assert!(OperatingDays::WeekdaysAndSaturday.runs_on(saturday));
    /// assert!(!OperatingDays::WeekdaysOnly.runs_on(saturday));
    /// ```
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        let weekday = date.weekday();
        match self {
            OperatingDays::Daily => true,
            OperatingDays::WeekdaysOnly => !matches!(weekday, Weekday::Sat | Weekday::Sun),
            OperatingDays::WeekendsOnly => matches!(weekday, Weekday::Sat | Weekday::Sun),
            OperatingDays::WeekdaysAndSaturday => weekday != Weekday::Sun,
        }
    }
}

/// Service category of a train.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    Standard,
    Direct,
    ExpressTourist,
}

/// A scheduled train.
///
/// `start_station_id` and `end_station_id` are denormalized endpoints and
/// drive matching: a train whose start is a from-station originates there
/// (it ranks first and departs at `departure_time`), and one whose end is a
/// to-station matches directly. When no stop record names the end station,
/// the last stop's arrival stands in for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Train {
    pub id: TrainId,
    pub train_number: Option<String>,
    pub direction: Direction,
    /// Departure from the first station.
    pub departure_time: ClockTime,
    pub operating_days: OperatingDays,
    /// Authoritative input flag, never derived from the stop count.
    pub is_campania_express: bool,
    pub category: Category,
    pub start_station_id: StationId,
    pub end_station_id: StationId,
}

impl Train {
    /// Train number used as the final ranking tie-break.
    pub fn sort_number(&self) -> &str {
        self.train_number.as_deref().unwrap_or("")
    }
}
