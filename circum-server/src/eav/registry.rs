//! Known upstream station ids.
//!
//! The upstream planner identifies stations by its own ids, which are
//! unrelated to the local schedule's. Requests naming an id outside this
//! registry are rejected before any call goes out.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::EavError;

/// Error loading the station registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("station registry JSON error: {message}")]
    Json { message: String },

    #[error("duplicate station id in registry: {0}")]
    Duplicate(String),
}

/// A station as the upstream knows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteStation {
    pub id: String,
    pub name: String,
}

/// Upstream station ids, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct StationRegistry {
    stations: BTreeMap<String, RemoteStation>,
}

impl StationRegistry {
    /// Build a registry, rejecting duplicate ids.
    pub fn new(stations: Vec<RemoteStation>) -> Result<Self, RegistryError> {
        let mut map = BTreeMap::new();
        for mut station in stations {
            station.id = station.id.trim().to_string();
            if map.contains_key(&station.id) {
                return Err(RegistryError::Duplicate(station.id));
            }
            map.insert(station.id.clone(), station);
        }
        Ok(Self { stations: map })
    }

    /// Parse a JSON array of `{ "id", "name" }` records.
    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        let stations: Vec<RemoteStation> =
            serde_json::from_str(json).map_err(|e| RegistryError::Json {
                message: e.to_string(),
            })?;
        Self::new(stations)
    }

    /// Read and parse a registry file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Look up a station, failing for ids the upstream does not know.
    pub fn get(&self, id: &str) -> Result<&RemoteStation, EavError> {
        let id = id.trim();
        self.stations
            .get(id)
            .ok_or_else(|| EavError::UnknownStation(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.stations.contains_key(id.trim())
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Stations ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &RemoteStation> {
        self.stations.values()
    }
}
