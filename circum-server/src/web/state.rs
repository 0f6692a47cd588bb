//! Application state for the web layer.

use std::sync::Arc;

use crate::cache::CachedEavClient;
use crate::eav::{EavError, StationRegistry};
use crate::planner::SearchConfig;
use crate::store::ScheduleStore;

/// Shared application state.
///
/// Contains all the services needed to handle requests.
#[derive(Clone)]
pub struct AppState {
    /// Local schedule repository
    pub store: Arc<dyn ScheduleStore>,

    /// Local search configuration
    pub config: Arc<SearchConfig>,

    /// Cached upstream client, absent when no upstream is configured
    pub eav: Option<Arc<CachedEavClient>>,

    /// Station ids the upstream accepts
    pub registry: Arc<StationRegistry>,
}

impl AppState {
    /// Create a new app state.
    pub fn new(
        store: Arc<dyn ScheduleStore>,
        config: SearchConfig,
        eav: Option<CachedEavClient>,
        registry: StationRegistry,
    ) -> Self {
        Self {
            store,
            config: Arc::new(config),
            eav: eav.map(Arc::new),
            registry: Arc::new(registry),
        }
    }

    /// The upstream client, or an error if none is configured.
    pub fn eav(&self) -> Result<&CachedEavClient, EavError> {
        self.eav
            .as_deref()
            .ok_or_else(|| EavError::NotConfigured("no upstream base URL configured".to_string()))
    }
}
