//! Journey matching.
//!
//! Decides which trains serve a query and where on each train the
//! passenger boards and alights. Two shapes are recognised:
//!
//! - **direct**: the train starts at a `from` station and ends at a `to`
//!   station, so the train's own departure time applies;
//! - **via-stop**: a stop at a `from` station comes strictly earlier in the
//!   stop order than a stop at a `to` station.
//!
//! Without a `to` set (next-departure mode) any train starting at or
//! calling at a `from` station qualifies.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{ClockTime, RailTime, StationId, Train, TrainId, TrainStop, day_offsets};

/// Minutes in a day, for offset arithmetic.
const DAY_MINS: i64 = 24 * 60;

/// Where and when a journey boards or alights.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyPoint {
    pub station_id: StationId,
    /// `None` only for arrivals with no usable stop record.
    pub time: Option<ClockTime>,
    /// Days after the train's first departure.
    pub day_offset: u32,
}

impl JourneyPoint {
    fn minutes_from_start(&self) -> Option<i64> {
        self.time.map(|t| {
            i64::from(self.day_offset) * DAY_MINS + i64::from(t.minutes_since_midnight())
        })
    }
}

/// A train that serves a query, with the relevant boarding and alighting.
#[derive(Debug, Clone)]
pub struct MatchedJourney {
    pub train: Arc<Train>,
    pub departure: JourneyPoint,
    /// Present for queries with a destination.
    pub arrival: Option<JourneyPoint>,
    /// Whether the train starts its run at one of the `from` stations.
    pub originates: bool,
    /// Stops covered by the journey, boarding stop through alighting stop.
    pub stops: Vec<TrainStop>,
}

impl MatchedJourney {
    /// Effective departure time at the boarding station.
    pub fn departure_time(&self) -> ClockTime {
        // Matching never produces a journey without a departure time
        self.departure.time.unwrap_or(self.train.departure_time)
    }

    /// Departure as a timestamp, taking `service_date` as the train's start date.
    pub fn departure_at(&self, service_date: NaiveDate) -> RailTime {
        RailTime::at_offset(service_date, self.departure_time(), self.departure.day_offset)
    }

    /// Arrival as a timestamp, if known.
    pub fn arrival_at(&self, service_date: NaiveDate) -> Option<RailTime> {
        let arrival = self.arrival.as_ref()?;
        Some(RailTime::at_offset(service_date, arrival.time?, arrival.day_offset))
    }

    /// Minutes from boarding to alighting, across midnight if needed.
    pub fn duration_minutes(&self) -> Option<i64> {
        let dep = self.departure.minutes_from_start()?;
        let arr = self.arrival.as_ref()?.minutes_from_start()?;
        Some(arr - dep)
    }
}

/// Query-side inputs to matching.
#[derive(Debug, Clone, Copy)]
pub struct MatchParams<'a> {
    pub from: &'a BTreeSet<StationId>,
    pub to: Option<&'a BTreeSet<StationId>>,
    /// Drop journeys departing strictly before this time.
    pub time_floor: Option<ClockTime>,
    /// Only Campania Express trains.
    pub express_only: bool,
}

/// Day offsets of one train's times: the first departure, then each
/// stop's arrival and departure in route order.
struct TrainClock {
    arrival: Vec<u32>,
    departure: Vec<u32>,
}

impl TrainClock {
    fn new(train: &Train, stops: &[&TrainStop]) -> Self {
        let mut times = Vec::with_capacity(1 + stops.len() * 2);
        times.push(Some(train.departure_time));
        for stop in stops {
            times.push(stop.arrival_time);
            times.push(stop.departure_time);
        }

        let offsets = day_offsets(&times);
        let arrival = (0..stops.len()).map(|i| offsets[1 + 2 * i]).collect();
        let departure = (0..stops.len()).map(|i| offsets[2 + 2 * i]).collect();

        Self { arrival, departure }
    }
}

/// Find every train that serves the query.
///
/// Each train appears at most once, in input order. Trains that pass the
/// coarse existence filter but have no boarding stop before an alighting
/// stop are dropped.
pub fn match_journeys(
    trains: &[Arc<Train>],
    stops: &HashMap<TrainId, Vec<TrainStop>>,
    params: &MatchParams<'_>,
) -> Vec<MatchedJourney> {
    let mut seen: HashSet<TrainId> = HashSet::with_capacity(trains.len());
    let mut journeys = Vec::new();

    for train in trains {
        if params.express_only && !train.is_campania_express {
            continue;
        }
        if !seen.insert(train.id) {
            continue;
        }

        let mut route: Vec<&TrainStop> = stops
            .get(&train.id)
            .map(|s| s.iter().collect())
            .unwrap_or_default();
        route.sort_by_key(|s| s.stop_order);

        let Some(journey) = match_train(train, &route, params) else {
            continue;
        };

        if let Some(floor) = params.time_floor
            && journey.departure_time() < floor
        {
            continue;
        }

        journeys.push(journey);
    }

    journeys
}

/// Match a single train against the query.
fn match_train(
    train: &Arc<Train>,
    route: &[&TrainStop],
    params: &MatchParams<'_>,
) -> Option<MatchedJourney> {
    let clock = TrainClock::new(train, route);
    let originates = params.from.contains(&train.start_station_id);

    let boarding = |i: usize| -> Option<JourneyPoint> {
        let stop = route[i];
        let time = if originates && i == 0 && stop.station_id == train.start_station_id {
            Some(train.departure_time)
        } else {
            stop.boarding_time()
        };
        if time.is_none() {
            debug!(train = %train.id, stop = stop.stop_order, "boarding stop has no time");
        }
        Some(JourneyPoint {
            station_id: stop.station_id,
            time: Some(time?),
            day_offset: clock.departure[i],
        })
    };

    let alighting = |j: usize| JourneyPoint {
        station_id: route[j].station_id,
        time: route[j].alighting_time(),
        day_offset: clock.arrival[j],
    };

    // Earliest from-station stop that has a boarding time
    let first_boarding = || -> Option<(JourneyPoint, usize)> {
        (0..route.len())
            .filter(|&i| params.from.contains(&route[i].station_id))
            .find_map(|i| Some((boarding(i)?, i)))
    };

    let at_start = || JourneyPoint {
        station_id: train.start_station_id,
        time: Some(train.departure_time),
        day_offset: 0,
    };

    let Some(to) = params.to else {
        // Next-departure mode
        let (departure, first) = if originates {
            let first = route
                .iter()
                .position(|s| s.station_id == train.start_station_id)
                .unwrap_or(0);
            (at_start(), first)
        } else {
            first_boarding()?
        };

        return Some(MatchedJourney {
            train: Arc::clone(train),
            departure,
            arrival: None,
            originates,
            stops: owned(route.get(first..).unwrap_or(&[])),
        });
    };

    let ends_at_to = to.contains(&train.end_station_id);

    if originates && ends_at_to {
        // Direct: the whole run
        let arrival = match route.iter().rposition(|s| s.station_id == train.end_station_id) {
            Some(j) => alighting(j),
            None => fallback_arrival(train, route, &clock),
        };
        return Some(MatchedJourney {
            train: Arc::clone(train),
            departure: at_start(),
            arrival: Some(arrival),
            originates,
            stops: owned(route),
        });
    }

    // Via-stop: earliest boarding stop that has a later alighting stop
    for (i, stop) in route.iter().enumerate() {
        if !params.from.contains(&stop.station_id) {
            continue;
        }
        if let Some(offset) = route[i + 1..]
            .iter()
            .position(|s| to.contains(&s.station_id))
        {
            let j = i + 1 + offset;
            let Some(departure) = boarding(i) else {
                continue;
            };
            return Some(MatchedJourney {
                train: Arc::clone(train),
                departure,
                arrival: Some(alighting(j)),
                originates,
                stops: owned(&route[i..=j]),
            });
        }
    }

    // The train ends at a destination station that has no stop record
    if ends_at_to && !route.iter().any(|s| s.station_id == train.end_station_id) {
        let (departure, i) = first_boarding()?;
        return Some(MatchedJourney {
            train: Arc::clone(train),
            departure,
            arrival: Some(fallback_arrival(train, route, &clock)),
            originates,
            stops: owned(&route[i..]),
        });
    }

    debug!(train = %train.id, "candidate has no boarding stop before an alighting stop");
    None
}

fn owned(range: &[&TrainStop]) -> Vec<TrainStop> {
    range.iter().map(|s| (*s).clone()).collect()
}

/// Arrival at the train's end station when no stop record names it: the
/// last stop's arrival time, or no time at all for an empty route.
fn fallback_arrival(train: &Train, route: &[&TrainStop], clock: &TrainClock) -> JourneyPoint {
    match route.last() {
        Some(last) => JourneyPoint {
            station_id: train.end_station_id,
            time: last.arrival_time,
            day_offset: clock.arrival[route.len() - 1],
        },
        None => JourneyPoint {
            station_id: train.end_station_id,
            time: None,
            day_offset: 0,
        },
    }
}
