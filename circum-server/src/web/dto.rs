//! Data transfer objects for web requests and responses.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Category, ClockTime, Direction, OperatingDays, Station, StationId, TrainId, TrainStop};
use crate::eav::{BoardEntry, BoardKind, Itinerary, RemoteStation, Segment, TrainStatus};
use crate::planner::{MatchedJourney, RawQuery, SearchOutcome};

/// Shown in place of an arrival time the schedule does not have.
pub const MISSING_TIME: &str = "N/A";

/// Request to search for stations.
#[derive(Debug, Deserialize)]
pub struct StationSearchRequest {
    /// Name or code fragment
    #[serde(default)]
    pub q: String,

    /// Maximum results
    pub limit: Option<usize>,
}

/// Response from station search.
#[derive(Debug, Serialize)]
pub struct StationSearchResponse {
    pub stations: Vec<Station>,
}

/// Query string of the local search endpoints.
///
/// Everything is optional here; validation happens in
/// [`ScheduleQuery::parse`](crate::planner::ScheduleQuery::parse) so that
/// errors come back as JSON.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainSearchParams {
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub is_campania_express: Option<String>,
}

impl From<TrainSearchParams> for RawQuery {
    fn from(params: TrainSearchParams) -> Self {
        RawQuery {
            from: params.from,
            to: params.to,
            date: params.date,
            time: params.time,
            is_campania_express: params.is_campania_express,
        }
    }
}

/// A stop on a matched journey.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StopResult {
    pub station_id: StationId,
    pub stop_order: u32,
    pub arrival_time: Option<ClockTime>,
    pub departure_time: Option<ClockTime>,
}

impl From<&TrainStop> for StopResult {
    fn from(stop: &TrainStop) -> Self {
        Self {
            station_id: stop.station_id,
            stop_order: stop.stop_order,
            arrival_time: stop.arrival_time,
            departure_time: stop.departure_time,
        }
    }
}

/// A journey in local search results.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JourneyResult {
    pub train_id: TrainId,
    pub train_number: Option<String>,
    pub direction: Direction,
    pub category: Category,
    pub operating_days: OperatingDays,
    pub is_campania_express: bool,

    /// Whether the journey boards at the train's origin
    pub originates: bool,

    pub departure_station_id: StationId,
    /// Departure time at the boarding station (HH:MM)
    pub departure_time: ClockTime,
    pub departure_date_time: NaiveDateTime,

    /// Absent in next-departure mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_station_id: Option<StationId>,
    /// `"N/A"` when the schedule has no time for the alighting stop
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival_date_time: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i64>,

    /// Stops from boarding to alighting, inclusive
    pub stops: Vec<StopResult>,
}

impl JourneyResult {
    /// Convert a matched journey, dating it against the search's service date.
    pub fn from_journey(journey: &MatchedJourney, service_date: chrono::NaiveDate) -> Self {
        let train = &journey.train;
        let arrival = journey.arrival.as_ref();

        Self {
            train_id: train.id,
            train_number: train.train_number.clone(),
            direction: train.direction,
            category: train.category,
            operating_days: train.operating_days,
            is_campania_express: train.is_campania_express,
            originates: journey.originates,
            departure_station_id: journey.departure.station_id,
            departure_time: journey.departure_time(),
            departure_date_time: journey.departure_at(service_date).to_datetime(),
            arrival_station_id: arrival.map(|a| a.station_id),
            arrival_time: arrival.map(|a| {
                a.time
                    .map_or_else(|| MISSING_TIME.to_string(), |t| t.to_string())
            }),
            arrival_date_time: journey.arrival_at(service_date).map(|t| t.to_datetime()),
            duration_minutes: journey.duration_minutes(),
            stops: journey.stops.iter().map(StopResult::from).collect(),
        }
    }
}

/// Response from the local search endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainSearchResponse {
    pub trains: Vec<JourneyResult>,
    /// Matches before truncation
    pub total_results: usize,
    pub from_stations: Vec<Station>,
    pub to_stations: Vec<Station>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<SearchOutcome> for TrainSearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        let trains = outcome
            .journeys
            .iter()
            .map(|j| JourneyResult::from_journey(j, outcome.date_ref))
            .collect();

        Self {
            trains,
            total_results: outcome.total_results,
            from_stations: outcome.from_stations,
            to_stations: outcome.to_stations,
            message: outcome.message,
        }
    }
}

/// Query string of the remote solutions endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct SolutionsParams {
    pub origin: Option<String>,
    pub destination: Option<String>,
    /// `DD/MM/YYYY`, defaults to today
    pub date: Option<String>,
    /// `HH:MM`, defaults to now
    pub time: Option<String>,
}

/// One train of a remote itinerary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentResult {
    pub train_number: Option<String>,
    pub category: Option<String>,
    pub from: String,
    pub to: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub departure_date_time: NaiveDateTime,
    pub arrival_date_time: NaiveDateTime,
    pub delay_minutes: u32,
    pub cancelled: bool,
}

impl From<&Segment> for SegmentResult {
    fn from(segment: &Segment) -> Self {
        Self {
            train_number: segment.train_number.clone(),
            category: segment.category.clone(),
            from: segment.from.clone(),
            to: segment.to.clone(),
            departure_time: segment.departure.to_string(),
            arrival_time: segment.arrival.to_string(),
            departure_date_time: segment.departure.to_datetime(),
            arrival_date_time: segment.arrival.to_datetime(),
            delay_minutes: segment.delay_minutes,
            cancelled: segment.cancelled,
        }
    }
}

/// A remote itinerary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryResult {
    pub origin: String,
    pub destination: String,
    pub departure_time: String,
    pub arrival_time: String,
    pub departure_date_time: NaiveDateTime,
    pub arrival_date_time: NaiveDateTime,
    pub duration_minutes: i64,
    pub direct: bool,
    /// Change stations in travel order
    pub transfers: Vec<String>,
    /// Largest segment delay
    pub delay_minutes: u32,
    pub cancelled: bool,
    pub segments: Vec<SegmentResult>,
}

impl From<&Itinerary> for ItineraryResult {
    fn from(itinerary: &Itinerary) -> Self {
        Self {
            origin: itinerary.origin().to_string(),
            destination: itinerary.destination().to_string(),
            departure_time: itinerary.departure().to_string(),
            arrival_time: itinerary.arrival().to_string(),
            departure_date_time: itinerary.departure().to_datetime(),
            arrival_date_time: itinerary.arrival().to_datetime(),
            duration_minutes: itinerary.duration_minutes(),
            direct: itinerary.transfers().is_empty(),
            transfers: itinerary.transfers().to_vec(),
            delay_minutes: itinerary.delay_minutes(),
            cancelled: itinerary.is_cancelled(),
            segments: itinerary.segments().iter().map(SegmentResult::from).collect(),
        }
    }
}

/// Response from the remote solutions endpoint.
#[derive(Debug, Serialize)]
pub struct SolutionsResponse {
    pub origin: RemoteStation,
    pub destination: RemoteStation,
    pub solutions: Vec<ItineraryResult>,
}

/// Query string of the remote board endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct BoardParams {
    pub station: Option<String>,
    /// `arrivals` or `departures` (default)
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// A train on a live board.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardEntryResult {
    pub train_number: String,
    pub category: Option<String>,
    pub station: Option<String>,
    pub platform: Option<String>,
    pub scheduled_time: Option<ClockTime>,
    pub delay_minutes: u32,
    pub status: TrainStatus,
    pub status_text: Option<String>,
}

impl From<&BoardEntry> for BoardEntryResult {
    fn from(entry: &BoardEntry) -> Self {
        Self {
            train_number: entry.train_number.clone(),
            category: entry.category.clone(),
            station: entry.station.clone(),
            platform: entry.platform.clone(),
            scheduled_time: entry.scheduled_time,
            delay_minutes: entry.delay_minutes,
            status: entry.status,
            status_text: entry.status_text.clone(),
        }
    }
}

/// Response from the remote board endpoint.
#[derive(Debug, Serialize)]
pub struct BoardResponse {
    pub station: RemoteStation,
    #[serde(rename = "type")]
    pub kind: BoardKind,
    pub trains: Vec<BoardEntryResult>,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
