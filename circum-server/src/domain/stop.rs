//! Stops along a train's route.

use serde::{Deserialize, Serialize};

use super::station::StationId;
use super::time::ClockTime;
use super::train::TrainId;

/// Opaque stop record identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopId(pub u32);

/// A scheduled call of a train at a station.
///
/// Stops of one train are ordered by `stop_order` (1-based, unique per
/// train). Either time may be absent: the first stop typically has no
/// arrival and the terminus no departure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainStop {
    pub id: StopId,
    pub train_id: TrainId,
    pub station_id: StationId,
    pub arrival_time: Option<ClockTime>,
    pub departure_time: Option<ClockTime>,
    pub stop_order: u32,
}

impl TrainStop {
    /// Time a passenger boarding here leaves: departure, else arrival.
    pub fn boarding_time(&self) -> Option<ClockTime> {
        self.departure_time.or(self.arrival_time)
    }

    /// Time a passenger alighting here arrives: arrival, else departure.
    pub fn alighting_time(&self) -> Option<ClockTime> {
        self.arrival_time.or(self.departure_time)
    }
}
