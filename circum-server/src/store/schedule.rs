//! Validated, indexed schedule data.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::domain::{DomainError, Station, StationId, Train, TrainId, TrainStop};

use super::error::StoreError;

/// A complete, consistent timetable.
///
/// Built once per (re)seed and then only read. Stops are grouped by train
/// and sorted by `stop_order`.
#[derive(Debug, Default)]
pub struct Schedule {
    stations: Vec<Station>,
    station_index: HashMap<StationId, usize>,
    trains: Vec<Arc<Train>>,
    stops: HashMap<TrainId, Vec<TrainStop>>,
}

impl Schedule {
    /// Build a schedule, checking every record against the data model.
    pub fn new(
        stations: Vec<Station>,
        trains: Vec<Train>,
        stops: Vec<TrainStop>,
    ) -> Result<Self, StoreError> {
        let mut station_index = HashMap::with_capacity(stations.len());
        let mut codes = HashSet::with_capacity(stations.len());

        for (i, station) in stations.iter().enumerate() {
            if station_index.insert(station.id, i).is_some() {
                return Err(DomainError::DuplicateStation(station.id).into());
            }
            if !codes.insert(station.code.clone()) {
                return Err(DomainError::DuplicateStationCode(station.code.to_string()).into());
            }
        }

        let mut train_ids = HashSet::with_capacity(trains.len());
        for train in &trains {
            if !train_ids.insert(train.id) {
                return Err(DomainError::DuplicateTrain(train.id).into());
            }
            if train.start_station_id == train.end_station_id {
                return Err(DomainError::SameEndpoints(train.id).into());
            }
            for endpoint in [train.start_station_id, train.end_station_id] {
                if !station_index.contains_key(&endpoint) {
                    return Err(
                        DomainError::UnknownStation(format!("train {}", train.id), endpoint).into(),
                    );
                }
            }
        }

        let mut by_train: HashMap<TrainId, Vec<TrainStop>> = HashMap::new();
        let mut orders: HashSet<(TrainId, u32)> = HashSet::with_capacity(stops.len());

        for stop in stops {
            if !train_ids.contains(&stop.train_id) {
                return Err(DomainError::UnknownTrain(stop.train_id).into());
            }
            if !station_index.contains_key(&stop.station_id) {
                return Err(DomainError::UnknownStation(
                    format!("stop of train {}", stop.train_id),
                    stop.station_id,
                )
                .into());
            }
            if stop.stop_order == 0 {
                return Err(DomainError::ZeroStopOrder(stop.train_id).into());
            }
            if !orders.insert((stop.train_id, stop.stop_order)) {
                return Err(DomainError::DuplicateStopOrder(stop.train_id, stop.stop_order).into());
            }
            by_train.entry(stop.train_id).or_default().push(stop);
        }

        for list in by_train.values_mut() {
            list.sort_by_key(|s| s.stop_order);
        }

        Ok(Self {
            stations,
            station_index,
            trains: trains.into_iter().map(Arc::new).collect(),
            stops: by_train,
        })
    }

    /// An empty schedule.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn station(&self, id: StationId) -> Option<&Station> {
        self.station_index.get(&id).map(|&i| &self.stations[i])
    }

    pub fn trains(&self) -> &[Arc<Train>] {
        &self.trains
    }

    /// Stops of a train in route order. Empty if the train has none.
    pub fn stops_of(&self, train: TrainId) -> &[TrainStop] {
        self.stops.get(&train).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All stops, grouped by train.
    pub fn stops_by_train(&self) -> &HashMap<TrainId, Vec<TrainStop>> {
        &self.stops
    }

    pub fn stop_count(&self) -> usize {
        self.stops.values().map(Vec::len).sum()
    }

    /// Trains that touch both station sets at all.
    ///
    /// A train qualifies when it starts at or stops at a `from` station and,
    /// if `to` is given, ends at or stops at a `to` station. Order of those
    /// calls is not checked here, so this over-selects; the journey matcher
    /// re-validates each candidate.
    pub fn candidate_trains(
        &self,
        from: &BTreeSet<StationId>,
        to: Option<&BTreeSet<StationId>>,
        express_only: bool,
    ) -> Vec<Arc<Train>> {
        self.trains
            .iter()
            .filter(|train| !express_only || train.is_campania_express)
            .filter(|train| {
                let stops = self.stops_of(train.id);
                let touches = |ids: &BTreeSet<StationId>, endpoint: StationId| {
                    ids.contains(&endpoint) || stops.iter().any(|s| ids.contains(&s.station_id))
                };
                touches(from, train.start_station_id)
                    && to.is_none_or(|to| touches(to, train.end_station_id))
            })
            .cloned()
            .collect()
    }
}
