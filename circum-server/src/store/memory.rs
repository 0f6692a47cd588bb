//! In-memory schedule store with whole-schedule reseeding.

use std::sync::{Arc, PoisonError, RwLock};

use tracing::info;

use super::error::StoreError;
use super::schedule::Schedule;
use super::seed::SeedSource;
use super::ScheduleStore;

/// Thread-safe, reseedable schedule store.
///
/// Readers take a snapshot and keep using it for the whole request; a
/// reseed swaps in a new schedule without touching snapshots in flight.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<RwLock<Arc<Schedule>>>,
    source: Option<SeedSource>,
}

impl MemoryStore {
    /// Wrap an already-built schedule. `refresh` is unavailable.
    pub fn new(schedule: Schedule) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(schedule))),
            source: None,
        }
    }

    /// Create a store by loading from a seed source.
    ///
    /// This will fail if the source is unreadable or invalid.
    pub fn load(source: SeedSource) -> Result<Self, StoreError> {
        let schedule = source.load()?;
        log_loaded(&schedule);

        Ok(Self {
            inner: Arc::new(RwLock::new(Arc::new(schedule))),
            source: Some(source),
        })
    }

    /// Replace the whole schedule.
    pub fn reseed(&self, schedule: Schedule) {
        log_loaded(&schedule);
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(schedule);
    }

    /// Reload the schedule from the original seed source.
    ///
    /// On success, replaces the current schedule and returns the train
    /// count. On failure, the existing schedule is preserved and the error
    /// is returned.
    pub fn refresh(&self) -> Result<usize, StoreError> {
        let Some(source) = &self.source else {
            return Ok(self.snapshot().trains().len());
        };

        let schedule = source.load()?;
        let count = schedule.trains().len();
        self.reseed(schedule);
        Ok(count)
    }
}

impl ScheduleStore for MemoryStore {
    fn snapshot(&self) -> Arc<Schedule> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn log_loaded(schedule: &Schedule) {
    info!(
        stations = schedule.stations().len(),
        trains = schedule.trains().len(),
        stops = schedule.stop_count(),
        "schedule loaded"
    );
}
