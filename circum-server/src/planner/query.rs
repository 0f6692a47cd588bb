//! Local timetable search.
//!
//! Turns a caller's loosely-typed query into a validated [`ScheduleQuery`],
//! then runs resolve, filter, match and rank against a schedule snapshot.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{ClockTime, Station, StationId, TimeError};
use crate::stations::{self, ResolveError};
use crate::store::{Schedule, ScheduleStore};

use super::config::SearchConfig;
use super::matcher::{MatchParams, MatchedJourney, match_journeys};
use super::rank::rank_journeys;

/// Error from query validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// A required parameter is absent or blank
    #[error("missing required parameter: {0}")]
    Missing(&'static str),

    /// Date is not `YYYY-MM-DD`
    #[error("invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Time is not `HH:MM`
    #[error("invalid time: {0}")]
    InvalidTime(#[from] TimeError),

    /// Boolean flag is not a recognised value
    #[error("invalid value '{value}' for {field}: expected true or false")]
    InvalidFlag { field: &'static str, value: String },

    /// Station query rejected by the resolver
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Query parameters as received from the caller, unvalidated.
#[derive(Debug, Clone, Default)]
pub struct RawQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub is_campania_express: Option<String>,
}

/// A validated timetable query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleQuery {
    pub from: String,
    /// Absent in next-departure mode.
    pub to: Option<String>,
    pub date: Option<NaiveDate>,
    /// Earliest departure at the boarding station.
    pub time: Option<ClockTime>,
    pub express_only: bool,
}

/// Treat blank strings as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ScheduleQuery {
    /// Validate a raw query.
    ///
    /// `require_to` distinguishes point-to-point search (destination
    /// required) from next-departure mode (destination ignored if blank).
    ///
    /// # Examples
    ///
    /// ```
    /// use circum_server::planner::{RawQuery, ScheduleQuery};
    ///
    /// let raw = RawQuery {
    ///     from: Some("napoli".into()),
    ///     to: Some("sorrento".into()),
    ///     time: Some("08:30".into()),
    ///     ..Default::default()
    /// };
    /// let query = ScheduleQuery::parse(&raw, true).unwrap();
    /// assert_eq!(query.to.as_deref(), Some("sorrento"));
    /// assert!(!query.express_only);
    /// ```
    pub fn parse(raw: &RawQuery, require_to: bool) -> Result<Self, QueryError> {
        let from = present(&raw.from).ok_or(QueryError::Missing("from"))?;

        let to = present(&raw.to);
        if require_to && to.is_none() {
            return Err(QueryError::Missing("to"));
        }

        let date = present(&raw.date)
            .map(|s| {
                NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .map_err(|_| QueryError::InvalidDate(s.to_string()))
            })
            .transpose()?;

        let time = present(&raw.time).map(ClockTime::parse).transpose()?;

        let express_only = match present(&raw.is_campania_express) {
            None => false,
            Some(s) => parse_flag(s).ok_or_else(|| QueryError::InvalidFlag {
                field: "isCampaniaExpress",
                value: s.to_string(),
            })?,
        };

        Ok(Self {
            from: from.to_string(),
            to: to.map(str::to_string),
            date,
            time,
            express_only,
        })
    }
}

fn parse_flag(s: &str) -> Option<bool> {
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Result of a local search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Ranked journeys, truncated to the configured maximum.
    pub journeys: Vec<MatchedJourney>,
    /// Number of matching journeys before truncation.
    pub total_results: usize,
    pub from_stations: Vec<Station>,
    pub to_stations: Vec<Station>,
    /// Why the result is empty, when a station query matched nothing.
    pub message: Option<String>,
    /// Service date the journeys were ranked against.
    pub date_ref: NaiveDate,
}

impl SearchOutcome {
    fn no_match(
        message: String,
        from_stations: Vec<Station>,
        to_stations: Vec<Station>,
        date_ref: NaiveDate,
    ) -> Self {
        Self {
            journeys: Vec::new(),
            total_results: 0,
            from_stations,
            to_stations,
            message: Some(message),
            date_ref,
        }
    }
}

/// Runs queries against a schedule store.
pub struct Planner<'a, S: ScheduleStore + ?Sized> {
    store: &'a S,
    config: &'a SearchConfig,
}

impl<'a, S: ScheduleStore + ?Sized> Planner<'a, S> {
    /// Create a new planner.
    pub fn new(store: &'a S, config: &'a SearchConfig) -> Self {
        Self { store, config }
    }

    /// Search for journeys.
    ///
    /// `today` is the ranking date when the query has no date.
    pub fn search(&self, query: &ScheduleQuery, today: NaiveDate) -> Result<SearchOutcome, QueryError> {
        let schedule = self.store.snapshot();
        let date_ref = query.date.unwrap_or(today);

        let (from_ids, from_stations) = resolve(&schedule, &query.from)?;
        if from_ids.is_empty() {
            return Ok(SearchOutcome::no_match(
                format!("No station matches '{}'", query.from),
                Vec::new(),
                Vec::new(),
                date_ref,
            ));
        }

        let to = match &query.to {
            Some(text) => {
                let (ids, found) = resolve(&schedule, text)?;
                if ids.is_empty() {
                    return Ok(SearchOutcome::no_match(
                        format!("No station matches '{text}'"),
                        from_stations,
                        Vec::new(),
                        date_ref,
                    ));
                }
                Some((ids, found))
            }
            None => None,
        };
        let to_ids = to.as_ref().map(|(ids, _)| ids);

        let mut candidates = schedule.candidate_trains(&from_ids, to_ids, query.express_only);
        if let Some(date) = query.date
            && self.config.respect_operating_days
        {
            candidates.retain(|train| train.operating_days.runs_on(date));
        }
        debug!(candidates = candidates.len(), "candidate trains");

        let params = MatchParams {
            from: &from_ids,
            to: to_ids,
            time_floor: query.time,
            express_only: query.express_only,
        };
        let matched = match_journeys(&candidates, schedule.stops_by_train(), &params);
        let total_results = matched.len();

        let mut journeys = rank_journeys(matched, Some(date_ref));
        journeys.truncate(self.config.max_results);

        Ok(SearchOutcome {
            journeys,
            total_results,
            from_stations,
            to_stations: to.map(|(_, found)| found).unwrap_or_default(),
            message: None,
            date_ref,
        })
    }

    /// Stations for type-ahead lookup, best first.
    pub fn stations(&self, query: &str, limit: Option<usize>) -> Result<Vec<Station>, QueryError> {
        let schedule = self.store.snapshot();
        let limit = limit.unwrap_or(self.config.max_station_results);
        Ok(stations::search(schedule.stations(), query, limit)?
            .into_iter()
            .cloned()
            .collect())
    }
}

fn resolve(schedule: &Schedule, query: &str) -> Result<(BTreeSet<StationId>, Vec<Station>), ResolveError> {
    let found: Vec<Station> = stations::matching_stations(schedule.stations(), query)?
        .into_iter()
        .cloned()
        .collect();
    let ids = found.iter().map(|s| s.id).collect();
    Ok((ids, found))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Category, Direction, OperatingDays, StopId, Train, TrainId, TrainStop};
    use std::sync::Arc;

    fn date() -> NaiveDate {
        // A Monday
        NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
    }

    fn time(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    fn raw(from: &str, to: Option<&str>) -> RawQuery {
        RawQuery {
            from: Some(from.to_string()),
            to: to.map(str::to_string),
            ..Default::default()
        }
    }

    fn train(id: u32, number: &str, dep: &str, days: OperatingDays, express: bool) -> Train {
        Train {
            id: TrainId(id),
            train_number: Some(number.to_string()),
            direction: Direction::TowardB,
            departure_time: time(dep),
            operating_days: days,
            is_campania_express: express,
            category: if express {
                Category::ExpressTourist
            } else {
                Category::Standard
            },
            start_station_id: StationId(1),
            end_station_id: StationId(4),
        }
    }

    fn stop(id: u32, train: u32, station: u32, arr: &str, dep: &str, order: u32) -> TrainStop {
        let t = |s: &str| (!s.is_empty()).then(|| time(s));
        TrainStop {
            id: StopId(id),
            train_id: TrainId(train),
            station_id: StationId(station),
            arrival_time: t(arr),
            departure_time: t(dep),
            stop_order: order,
        }
    }

    fn schedule() -> Arc<Schedule> {
        let stations = vec![
            Station::new(1, "Napoli Porta Nolana", "NPN").unwrap(),
            Station::new(2, "Ercolano Scavi", "ERC").unwrap(),
            Station::new(3, "Pompei Scavi", "PSC").unwrap(),
            Station::new(4, "Sorrento", "SOR").unwrap(),
        ];
        let trains = vec![
            train(10, "2101", "08:00", OperatingDays::Daily, false),
            train(11, "2103", "07:00", OperatingDays::WeekendsOnly, false),
            train(12, "EX1", "09:00", OperatingDays::Daily, true),
        ];
        let stops = vec![
            stop(1, 10, 1, "", "08:00", 1),
            stop(2, 10, 2, "08:20", "08:21", 2),
            stop(3, 10, 3, "08:40", "08:41", 3),
            stop(4, 10, 4, "09:10", "", 4),
            stop(5, 11, 1, "", "07:00", 1),
            stop(6, 11, 2, "07:20", "07:21", 2),
            stop(7, 11, 4, "08:10", "", 3),
            stop(8, 12, 1, "", "09:00", 1),
            stop(9, 12, 3, "09:30", "09:31", 2),
            stop(10, 12, 4, "09:50", "", 3),
        ];
        Arc::new(Schedule::new(stations, trains, stops).unwrap())
    }

    fn numbers(outcome: &SearchOutcome) -> Vec<&str> {
        outcome.journeys.iter().map(|j| j.train.sort_number()).collect()
    }

    #[test]
    fn parse_requires_from() {
        let err = ScheduleQuery::parse(&RawQuery::default(), false).unwrap_err();
        assert_eq!(err, QueryError::Missing("from"));

        let err = ScheduleQuery::parse(&raw("  ", None), false).unwrap_err();
        assert_eq!(err, QueryError::Missing("from"));
    }

    #[test]
    fn parse_requires_to_when_asked() {
        let err = ScheduleQuery::parse(&raw("napoli", None), true).unwrap_err();
        assert_eq!(err, QueryError::Missing("to"));

        let query = ScheduleQuery::parse(&raw("napoli", Some("")), false).unwrap();
        assert_eq!(query.to, None);
    }

    #[test]
    fn parse_rejects_malformed_fields() {
        let mut q = raw("napoli", Some("sorrento"));
        q.date = Some("10/06/2024".into());
        assert!(matches!(
            ScheduleQuery::parse(&q, true),
            Err(QueryError::InvalidDate(_))
        ));

        let mut q = raw("napoli", Some("sorrento"));
        q.time = Some("8:30".into());
        assert!(matches!(
            ScheduleQuery::parse(&q, true),
            Err(QueryError::InvalidTime(_))
        ));

        let mut q = raw("napoli", Some("sorrento"));
        q.is_campania_express = Some("maybe".into());
        assert!(matches!(
            ScheduleQuery::parse(&q, true),
            Err(QueryError::InvalidFlag { .. })
        ));
    }

    #[test]
    fn parse_full_query() {
        let q = RawQuery {
            from: Some(" napoli ".into()),
            to: Some("sorrento".into()),
            date: Some("2024-06-10".into()),
            time: Some("08:30".into()),
            is_campania_express: Some("TRUE".into()),
        };
        let query = ScheduleQuery::parse(&q, true).unwrap();
        assert_eq!(query.from, "napoli");
        assert_eq!(query.date, Some(date()));
        assert_eq!(query.time, Some(time("08:30")));
        assert!(query.express_only);
    }

    #[test]
    fn unknown_origin_short_circuits() {
        let store = schedule();
        let config = SearchConfig::default();
        let planner = Planner::new(&store, &config);

        let query = ScheduleQuery::parse(&raw("salerno", Some("sorrento")), true).unwrap();
        let outcome = planner.search(&query, date()).unwrap();

        assert!(outcome.journeys.is_empty());
        assert_eq!(outcome.total_results, 0);
        assert!(outcome.from_stations.is_empty());
        assert!(outcome.message.unwrap().contains("salerno"));
    }

    #[test]
    fn unknown_destination_short_circuits() {
        let store = schedule();
        let config = SearchConfig::default();
        let planner = Planner::new(&store, &config);

        let query = ScheduleQuery::parse(&raw("napoli", Some("salerno")), true).unwrap();
        let outcome = planner.search(&query, date()).unwrap();

        assert!(outcome.journeys.is_empty());
        assert_eq!(outcome.from_stations.len(), 1);
        assert!(outcome.to_stations.is_empty());
        assert!(outcome.message.is_some());
    }

    #[test]
    fn point_to_point_ranked() {
        let store = schedule();
        let config = SearchConfig::default();
        let planner = Planner::new(&store, &config);

        // No date: operating days are not applied
        let query = ScheduleQuery::parse(&raw("napoli", Some("sorrento")), true).unwrap();
        let outcome = planner.search(&query, date()).unwrap();

        assert_eq!(numbers(&outcome), vec!["2103", "2101", "EX1"]);
        assert_eq!(outcome.total_results, 3);
        assert_eq!(outcome.message, None);
        assert_eq!(outcome.to_stations[0].name, "Sorrento");
    }

    #[test]
    fn operating_days_filter_with_date() {
        let store = schedule();
        let config = SearchConfig::default();
        let planner = Planner::new(&store, &config);

        let mut q = raw("napoli", Some("sorrento"));
        q.date = Some("2024-06-10".into());
        let query = ScheduleQuery::parse(&q, true).unwrap();
        let outcome = planner.search(&query, date()).unwrap();

        // 2103 runs on weekends only
        assert_eq!(numbers(&outcome), vec!["2101", "EX1"]);

        let config = SearchConfig::default().with_operating_days(false);
        let planner = Planner::new(&store, &config);
        assert_eq!(planner.search(&query, date()).unwrap().total_results, 3);
    }

    #[test]
    fn truncation_keeps_total() {
        let store = schedule();
        let config = SearchConfig::default().with_max_results(1);
        let planner = Planner::new(&store, &config);

        let query = ScheduleQuery::parse(&raw("napoli", Some("sorrento")), true).unwrap();
        let outcome = planner.search(&query, date()).unwrap();

        assert_eq!(outcome.journeys.len(), 1);
        assert_eq!(outcome.total_results, 3);
    }

    #[test]
    fn departures_from_intermediate_station() {
        let store = schedule();
        let config = SearchConfig::default();
        let planner = Planner::new(&store, &config);

        let mut q = raw("pompei", None);
        q.time = Some("08:00".into());
        let query = ScheduleQuery::parse(&q, false).unwrap();
        let outcome = planner.search(&query, date()).unwrap();

        assert_eq!(numbers(&outcome), vec!["2101", "EX1"]);
        assert_eq!(outcome.journeys[0].departure_time(), time("08:41"));
        assert!(outcome.to_stations.is_empty());
    }

    #[test]
    fn express_only_search() {
        let store = schedule();
        let config = SearchConfig::default();
        let planner = Planner::new(&store, &config);

        let mut q = raw("napoli", Some("sorrento"));
        q.is_campania_express = Some("true".into());
        let query = ScheduleQuery::parse(&q, true).unwrap();
        let outcome = planner.search(&query, date()).unwrap();

        assert_eq!(numbers(&outcome), vec!["EX1"]);
    }

    #[test]
    fn station_lookup_capped() {
        let store = schedule();
        let config = SearchConfig::default();
        let planner = Planner::new(&store, &config);

        assert_eq!(planner.stations("scavi", None).unwrap().len(), 2);
        assert_eq!(planner.stations("scavi", Some(1)).unwrap().len(), 1);
        assert!(matches!(
            planner.stations(" ", None),
            Err(QueryError::Resolve(ResolveError::EmptyQuery))
        ));
    }
}
