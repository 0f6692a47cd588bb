//! Search configuration for local timetable queries.

/// Configuration parameters for timetable search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Maximum number of journeys returned per query.
    /// `totalResults` still counts every match.
    pub max_results: usize,

    /// Maximum number of stations returned by station search.
    pub max_station_results: usize,

    /// Drop trains that do not run on the query date, when a date is given.
    pub respect_operating_days: bool,
}

impl SearchConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(max_results: usize, max_station_results: usize, respect_operating_days: bool) -> Self {
        Self {
            max_results,
            max_station_results,
            respect_operating_days,
        }
    }

    /// Set the maximum number of journeys returned.
    pub fn with_max_results(mut self, n: usize) -> Self {
        self.max_results = n;
        self
    }

    /// Enable or disable the operating-day filter.
    pub fn with_operating_days(mut self, enabled: bool) -> Self {
        self.respect_operating_days = enabled;
        self
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 50,
            max_station_results: 10,
            respect_operating_days: true,
        }
    }
}
