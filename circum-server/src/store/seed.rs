//! Loading schedule data from seed files.
//!
//! Two formats are accepted:
//! - a single JSON document with stations and trains, each train carrying
//!   its stops inline;
//! - a directory holding `stations.csv`, `trains.csv` and `stops.csv`,
//!   mirroring the relational tables one row per record.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::domain::{
    Category, ClockTime, Direction, OperatingDays, Station, StationId, StopId, Train, TrainId,
    TrainStop,
};

use super::error::StoreError;
use super::schedule::Schedule;

/// JSON seed document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedData {
    pub stations: Vec<Station>,
    #[serde(default)]
    pub trains: Vec<SeedTrain>,
}

/// A train with its stops inline.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedTrain {
    #[serde(flatten)]
    pub train: Train,
    #[serde(default)]
    pub stops: Vec<SeedStop>,
}

/// A stop inside a [`SeedTrain`].
///
/// `stop_order` defaults to the 1-based position in the list.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedStop {
    pub station_id: StationId,
    #[serde(default)]
    pub arrival_time: Option<ClockTime>,
    #[serde(default)]
    pub departure_time: Option<ClockTime>,
    #[serde(default)]
    pub stop_order: Option<u32>,
}

impl SeedData {
    /// Parse a JSON seed document.
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::Json {
            message: e.to_string(),
        })
    }

    /// Read and parse a JSON seed file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Flatten into records and validate.
    pub fn into_schedule(self) -> Result<Schedule, StoreError> {
        let mut trains = Vec::with_capacity(self.trains.len());
        let mut stops = Vec::new();
        let mut next_stop_id = 1;

        for seed in self.trains {
            let train_id = seed.train.id;
            for (i, stop) in seed.stops.into_iter().enumerate() {
                stops.push(TrainStop {
                    id: StopId(next_stop_id),
                    train_id,
                    station_id: stop.station_id,
                    arrival_time: stop.arrival_time,
                    departure_time: stop.departure_time,
                    stop_order: stop.stop_order.unwrap_or(i as u32 + 1),
                });
                next_stop_id += 1;
            }
            trains.push(seed.train);
        }

        Schedule::new(self.stations, trains, stops)
    }
}

/// Row of `trains.csv`. An empty `train_number` is read as null.
#[derive(Debug, Deserialize)]
struct TrainRow {
    id: u32,
    train_number: Option<String>,
    direction: Direction,
    departure_time: ClockTime,
    operating_days: OperatingDays,
    is_campania_express: bool,
    category: Category,
    start_station_id: u32,
    end_station_id: u32,
}

impl From<TrainRow> for Train {
    fn from(row: TrainRow) -> Self {
        Train {
            id: TrainId(row.id),
            train_number: row.train_number.filter(|n| !n.trim().is_empty()),
            direction: row.direction,
            departure_time: row.departure_time,
            operating_days: row.operating_days,
            is_campania_express: row.is_campania_express,
            category: row.category,
            start_station_id: StationId(row.start_station_id),
            end_station_id: StationId(row.end_station_id),
        }
    }
}

/// Row of `stops.csv`. Empty time cells are read as null.
#[derive(Debug, Deserialize)]
struct StopRow {
    id: u32,
    train_id: u32,
    station_id: u32,
    arrival_time: Option<ClockTime>,
    departure_time: Option<ClockTime>,
    stop_order: u32,
}

impl From<StopRow> for TrainStop {
    fn from(row: StopRow) -> Self {
        TrainStop {
            id: StopId(row.id),
            train_id: TrainId(row.train_id),
            station_id: StationId(row.station_id),
            arrival_time: row.arrival_time,
            departure_time: row.departure_time,
            stop_order: row.stop_order,
        }
    }
}

/// Import a schedule from three CSV readers with header rows.
///
/// Column names are snake_case versions of the record fields, e.g.
/// `id,name,code` for stations.
pub fn import_csv(
    stations: impl Read,
    trains: impl Read,
    stops: impl Read,
) -> Result<Schedule, StoreError> {
    let stations: Vec<Station> = read_rows(stations, "stations.csv")?;
    let trains: Vec<TrainRow> = read_rows(trains, "trains.csv")?;
    let stops: Vec<StopRow> = read_rows(stops, "stops.csv")?;

    Schedule::new(
        stations,
        trains.into_iter().map(Train::from).collect(),
        stops.into_iter().map(TrainStop::from).collect(),
    )
}

/// Import `stations.csv`, `trains.csv` and `stops.csv` from a directory.
pub fn import_csv_dir(dir: impl AsRef<Path>) -> Result<Schedule, StoreError> {
    let dir = dir.as_ref();
    let open = |name: &str| {
        let path = dir.join(name);
        File::open(&path).map_err(|source| StoreError::Io { path, source })
    };

    import_csv(open("stations.csv")?, open("trains.csv")?, open("stops.csv")?)
}

fn read_rows<T: DeserializeOwned>(reader: impl Read, file: &'static str) -> Result<Vec<T>, StoreError> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader)
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| StoreError::Csv {
            file,
            message: e.to_string(),
        })
}

/// Where the schedule is loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedSource {
    /// A JSON seed document.
    Json(PathBuf),
    /// A directory of CSV tables.
    CsvDir(PathBuf),
}

impl SeedSource {
    /// Pick the format from the path: directories are CSV, files are JSON.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            SeedSource::CsvDir(path)
        } else {
            SeedSource::Json(path)
        }
    }

    /// Load and validate a fresh schedule.
    pub fn load(&self) -> Result<Schedule, StoreError> {
        match self {
            SeedSource::Json(path) => SeedData::load(path)?.into_schedule(),
            SeedSource::CsvDir(dir) => import_csv_dir(dir),
        }
    }
}
