//! Schedule store.
//!
//! Holds stations, trains and their stops. The store is read-only at query
//! time; a reseed replaces the whole schedule at once.

mod error;
mod memory;
mod schedule;
mod seed;

use std::sync::Arc;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use schedule::Schedule;
pub use seed::{SeedData, SeedSource, SeedStop, SeedTrain, import_csv, import_csv_dir};

/// Read-only access to the current schedule.
///
/// Query code takes a snapshot once and works on it, so a concurrent
/// reseed never mixes two schedules inside one answer.
pub trait ScheduleStore: Send + Sync {
    fn snapshot(&self) -> Arc<Schedule>;
}

impl ScheduleStore for Arc<Schedule> {
    fn snapshot(&self) -> Arc<Schedule> {
        Arc::clone(self)
    }
}
