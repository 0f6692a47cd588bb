//! Domain types for the timetable lookup service.
//!
//! This module contains the core domain model types that represent
//! validated schedule data. All types enforce their invariants at
//! construction time, so code that receives these types can trust their
//! validity.

mod error;
mod station;
mod stop;
mod time;
mod train;

pub use error::DomainError;
pub use station::{InvalidStationCode, Station, StationCode, StationId};
pub use stop::{StopId, TrainStop};
pub use time::{ClockTime, RailTime, TimeError, day_offsets, resolve_sequence};
pub use train::{Category, Direction, OperatingDays, Train, TrainId};
