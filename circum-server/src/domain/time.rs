//! Clock and timestamp handling for timetable data.
//!
//! Timetables store times as zero-padded "HH:MM" strings with no date. This
//! module provides a validated [`ClockTime`] for those values and a
//! date-aware [`RailTime`] for comparing and subtracting them, including
//! trains that run past midnight.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// A time of day in whole minutes, as printed in the timetable.
///
/// Ordering matches the lexicographic order of the zero-padded "HH:MM"
/// form, so comparing two `ClockTime`s is the same as comparing the strings.
///
/// # Examples
///
/// ```
/// use circum_server::domain::ClockTime;
///
/// let t = ClockTime::parse("08:05").unwrap();
/// assert_eq!(t.to_string(), "08:05");
/// assert_eq!(t.minutes_since_midnight(), 485);
///
/// assert!(ClockTime::parse("8:05").is_err());
/// assert!(ClockTime::parse("24:00").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime(u16);

impl ClockTime {
    /// Parse a time from "HH:MM" format.
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        // Must be exactly 5 characters: HH:MM
        if s.len() != 5 {
            return Err(TimeError::new("expected HH:MM format"));
        }

        let bytes = s.as_bytes();

        if bytes[2] != b':' {
            return Err(TimeError::new("expected colon at position 2"));
        }

        let hour =
            parse_two_digits(&bytes[0..2]).ok_or_else(|| TimeError::new("invalid hour digits"))?;
        if hour > 23 {
            return Err(TimeError::new("hour must be 0-23"));
        }

        let minute = parse_two_digits(&bytes[3..5])
            .ok_or_else(|| TimeError::new("invalid minute digits"))?;
        if minute > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        Ok(Self((hour * 60 + minute) as u16))
    }

    /// Build a clock time from hour and minute components.
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        (hour < 24 && minute < 60).then(|| Self((hour * 60 + minute) as u16))
    }

    /// Truncate a chrono time to whole minutes.
    pub fn from_naive(time: NaiveTime) -> Self {
        Self((time.hour() * 60 + time.minute()) as u16)
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u32 {
        u32::from(self.0 / 60)
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u32 {
        u32::from(self.0 % 60)
    }

    pub fn minutes_since_midnight(&self) -> u16 {
        self.0
    }

    /// Converts to a chrono time.
    pub fn to_naive(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour(), self.minute(), 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Debug for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockTime({self})")
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ClockTime::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// A date-aware time.
///
/// Two stops at "00:20" can belong to different calendar days when a train
/// runs through midnight, so anything that sorts or subtracts times works
/// on `RailTime` rather than [`ClockTime`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct RailTime {
    date: NaiveDate,
    time: NaiveTime,
}

impl RailTime {
    /// Create a new RailTime from date and time components.
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }

    /// Place a clock time on a calendar date.
    pub fn at(date: NaiveDate, clock: ClockTime) -> Self {
        Self::new(date, clock.to_naive())
    }

    /// Place a clock time on the date `day_offset` days after `service_date`.
    pub fn at_offset(service_date: NaiveDate, clock: ClockTime, day_offset: u32) -> Self {
        let date = service_date
            .checked_add_days(chrono::Days::new(u64::from(day_offset)))
            .unwrap_or(service_date);
        Self::at(date, clock)
    }

    /// Returns the date component.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Returns the time component.
    pub fn time(&self) -> NaiveTime {
        self.time
    }

    /// Returns the time of day, dropping the date.
    pub fn clock(&self) -> ClockTime {
        ClockTime::from_naive(self.time)
    }

    /// Converts to a NaiveDateTime.
    pub fn to_datetime(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }

    /// Returns the duration between two times.
    ///
    /// Returns a negative duration if `other` is after `self`.
    pub fn signed_duration_since(&self, other: Self) -> Duration {
        self.to_datetime()
            .signed_duration_since(other.to_datetime())
    }
}

impl Ord for RailTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_datetime().cmp(&other.to_datetime())
    }
}

impl PartialOrd for RailTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for RailTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RailTime({} {})", self.date, self.clock())
    }
}

impl fmt::Display for RailTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.clock())
    }
}

/// Parse two ASCII digit bytes into a u32.
fn parse_two_digits(bytes: &[u8]) -> Option<u32> {
    if bytes.len() != 2 {
        return None;
    }
    let d1 = (bytes[0] as char).to_digit(10)?;
    let d2 = (bytes[1] as char).to_digit(10)?;
    Some(d1 * 10 + d2)
}

/// Threshold for detecting midnight rollover in time sequences.
///
/// If a time appears more than 6 hours before the previous time in the
/// sequence, it is taken to be on the next day.
const ROLLOVER_THRESHOLD_MINS: i32 = 6 * 60;

/// Compute the day offset of every entry in a chronological time sequence.
///
/// Entries that are `None` inherit the offset in force at their position.
///
/// # Examples
///
/// ```
/// use circum_server::domain::{ClockTime, day_offsets};
///
/// let t = |s| Some(ClockTime::parse(s).unwrap());
/// let offsets = day_offsets(&[t("23:40"), None, t("23:58"), t("00:12")]);
/// assert_eq!(offsets, vec![0, 0, 0, 1]);
/// ```
pub fn day_offsets(times: &[Option<ClockTime>]) -> Vec<u32> {
    let mut result = Vec::with_capacity(times.len());
    let mut offset = 0;
    let mut prev: Option<ClockTime> = None;

    for time in times {
        if let Some(time) = time {
            if let Some(prev) = prev {
                let diff = i32::from(time.minutes_since_midnight())
                    - i32::from(prev.minutes_since_midnight());
                if diff < -ROLLOVER_THRESHOLD_MINS {
                    offset += 1;
                }
            }
            prev = Some(*time);
        }
        result.push(offset);
    }

    result
}

/// Resolve a chronological time sequence against a service date.
pub fn resolve_sequence(times: &[Option<ClockTime>], service_date: NaiveDate) -> Vec<Option<RailTime>> {
    let offsets = day_offsets(times);
    times
        .iter()
        .zip(offsets)
        .map(|(time, offset)| time.map(|t| RailTime::at_offset(service_date, t, offset)))
        .collect()
}
