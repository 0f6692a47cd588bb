//! Conversion from upstream DTOs to itineraries.
//!
//! An upstream solution bundles consecutive train segments. One segment is
//! a direct journey; more than one is a connecting journey whose transfer
//! stations are the arrival stations of every segment but the last.

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::{ClockTime, RailTime, resolve_sequence};

use super::error::EavError;
use super::types::{SegmentDto, SolutionDto, SolutionsEnvelope};

/// Error during DTO to itinerary conversion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversionError {
    /// Date is not `DD/MM/YYYY`
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Failed to parse a time string
    #[error("invalid time: {0}")]
    InvalidTime(String),

    /// Solution without any train
    #[error("solution has no segments")]
    NoSegments,
}

/// One train ridden as part of an itinerary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub train_number: Option<String>,
    pub category: Option<String>,
    pub from: String,
    pub to: String,
    pub departure: RailTime,
    pub arrival: RailTime,
    pub delay_minutes: u32,
    pub cancelled: bool,
}

/// Whether an itinerary needs changes of train.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItineraryKind {
    Direct,
    /// Stations where the passenger changes train, in travel order.
    Connecting { transfers: Vec<String> },
}

/// A remote journey: a non-empty sequence of segments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Itinerary {
    segments: Vec<Segment>,
    kind: ItineraryKind,
    delay_minutes: u32,
    cancelled: bool,
}

impl Itinerary {
    /// Build an itinerary, deriving transfers, delay and cancellation.
    ///
    /// Returns `None` for an empty segment list.
    pub fn new(segments: Vec<Segment>) -> Option<Self> {
        if segments.is_empty() {
            return None;
        }

        let kind = if segments.len() == 1 {
            ItineraryKind::Direct
        } else {
            ItineraryKind::Connecting {
                transfers: segments[..segments.len() - 1]
                    .iter()
                    .map(|s| s.to.clone())
                    .collect(),
            }
        };
        let delay_minutes = segments.iter().map(|s| s.delay_minutes).max().unwrap_or(0);
        let cancelled = segments.iter().any(|s| s.cancelled);

        Some(Self {
            segments,
            kind,
            delay_minutes,
            cancelled,
        })
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn kind(&self) -> &ItineraryKind {
        &self.kind
    }

    /// Transfer stations; empty for direct journeys.
    pub fn transfers(&self) -> &[String] {
        match &self.kind {
            ItineraryKind::Direct => &[],
            ItineraryKind::Connecting { transfers } => transfers.as_slice(),
        }
    }

    /// Largest delay of any segment.
    pub fn delay_minutes(&self) -> u32 {
        self.delay_minutes
    }

    /// Cancelled if any segment is.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn first(&self) -> &Segment {
        // Non-empty by construction
        &self.segments[0]
    }

    fn last(&self) -> &Segment {
        &self.segments[self.segments.len() - 1]
    }

    pub fn departure(&self) -> RailTime {
        self.first().departure
    }

    pub fn arrival(&self) -> RailTime {
        self.last().arrival
    }

    pub fn origin(&self) -> &str {
        &self.first().from
    }

    pub fn destination(&self) -> &str {
        &self.last().to
    }

    pub fn duration_minutes(&self) -> i64 {
        self.arrival().signed_duration_since(self.departure()).num_minutes()
    }
}

/// Parse an upstream `DD/MM/YYYY` date.
pub fn parse_upstream_date(s: &str) -> Result<NaiveDate, ConversionError> {
    NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y")
        .map_err(|_| ConversionError::InvalidDate(s.to_string()))
}

/// Format a date the way the upstream expects it.
pub fn format_upstream_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

fn parse_clock(s: &str) -> Result<ClockTime, ConversionError> {
    ClockTime::parse(s.trim()).map_err(|_| ConversionError::InvalidTime(s.to_string()))
}

/// Minutes late, with early running and absent values counted as zero.
pub(crate) fn delay_minutes(delay: Option<i32>) -> u32 {
    delay.map_or(0, |d| d.max(0) as u32)
}

/// Convert a solutions response, ascending by departure.
///
/// Solutions that fail to convert are logged and skipped rather than
/// failing the whole response; an error payload is a rejection.
pub fn convert_solutions(envelope: SolutionsEnvelope) -> Result<Vec<Itinerary>, EavError> {
    let solutions = match envelope {
        SolutionsEnvelope::Found { solutions } => solutions,
        SolutionsEnvelope::Failed { error } => return Err(EavError::Rejected(error)),
    };

    let mut itineraries = Vec::with_capacity(solutions.len());
    for (i, solution) in solutions.iter().enumerate() {
        match convert_solution(solution) {
            Ok(itinerary) => itineraries.push(itinerary),
            Err(e) => warn!(solution = i, error = %e, "skipping upstream solution"),
        }
    }

    itineraries.sort_by_key(Itinerary::departure);
    Ok(itineraries)
}

/// Convert one upstream solution.
///
/// Segment times are placed on the solution's date, rolling over to the
/// next day when the sequence crosses midnight.
pub fn convert_solution(dto: &SolutionDto) -> Result<Itinerary, ConversionError> {
    let date = parse_upstream_date(&dto.date)?;

    let mut times = Vec::with_capacity(dto.segments.len() * 2);
    for segment in &dto.segments {
        times.push(Some(parse_clock(&segment.departure_time)?));
        times.push(Some(parse_clock(&segment.arrival_time)?));
    }
    let resolved = resolve_sequence(&times, date);

    let segments = dto
        .segments
        .iter()
        .zip(resolved.chunks(2))
        .map(|(segment, pair)| match pair {
            [Some(departure), Some(arrival)] => Ok(convert_segment(segment, *departure, *arrival)),
            _ => Err(ConversionError::InvalidTime(segment.departure_time.clone())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    Itinerary::new(segments).ok_or(ConversionError::NoSegments)
}

fn convert_segment(dto: &SegmentDto, departure: RailTime, arrival: RailTime) -> Segment {
    Segment {
        train_number: dto.train_number.clone().filter(|n| !n.trim().is_empty()),
        category: dto.category.clone(),
        from: dto.departure_station.trim().to_string(),
        to: dto.arrival_station.trim().to_string(),
        departure,
        arrival,
        delay_minutes: delay_minutes(dto.delay),
        cancelled: dto.cancelled,
    }
}
