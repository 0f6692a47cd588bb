//! Caching layer for upstream planner responses.
//!
//! Live boards change minute by minute, so they are keyed by a time bucket
//! (5 minutes by default) as well as station and board type. Solutions are
//! keyed by the full request, which already pins date and time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDateTime, Timelike};
use moka::future::Cache as MokaCache;

use crate::eav::{BoardEntry, BoardKind, EavClient, EavError, Itinerary, SolutionsRequest};

/// Cache key for live boards: (station id, board type, date, time bucket).
type BoardKey = (String, BoardKind, chrono::NaiveDate, u16);

/// Cached board.
type BoardValue = Arc<Vec<BoardEntry>>;

/// Cached solutions.
type SolutionsValue = Arc<Vec<Itinerary>>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries per kind.
    pub max_capacity: u64,

    /// Time bucket size in minutes.
    pub bucket_mins: u16,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_capacity: 1000,
            bucket_mins: 5,
        }
    }
}

/// Cache for upstream responses.
pub struct EavCache {
    boards: MokaCache<BoardKey, BoardValue>,
    solutions: MokaCache<SolutionsRequest, SolutionsValue>,
    bucket_mins: u16,
}

impl EavCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let boards = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();
        let solutions = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self {
            boards,
            solutions,
            bucket_mins: config.bucket_mins.max(1),
        }
    }

    /// Minutes from midnight divided by the bucket size.
    fn time_bucket(&self, now: NaiveDateTime) -> u16 {
        let mins = (now.hour() * 60 + now.minute()) as u16;
        mins / self.bucket_mins
    }

    fn board_key(&self, station: &str, kind: BoardKind, now: NaiveDateTime) -> BoardKey {
        (station.trim().to_string(), kind, now.date(), self.time_bucket(now))
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.boards.invalidate_all();
        self.solutions.invalidate_all();
    }
}

/// Upstream client with caching.
///
/// Errors are never cached; the next request tries the upstream again.
pub struct CachedEavClient {
    client: EavClient,
    cache: EavCache,
}

impl CachedEavClient {
    /// Create a new cached client.
    pub fn new(client: EavClient, cache_config: &CacheConfig) -> Self {
        Self {
            client,
            cache: EavCache::new(cache_config),
        }
    }

    /// Live board, using the cache if the current bucket has one.
    pub async fn board(
        &self,
        station: &str,
        kind: BoardKind,
        now: NaiveDateTime,
    ) -> Result<BoardValue, EavError> {
        let key = self.cache.board_key(station, kind, now);

        if let Some(cached) = self.cache.boards.get(&key).await {
            return Ok(cached);
        }

        let entries = Arc::new(self.client.board(station, kind).await?);
        self.cache.boards.insert(key, entries.clone()).await;

        Ok(entries)
    }

    /// Itineraries for a request, using the cache if available.
    pub async fn solutions(&self, request: &SolutionsRequest) -> Result<SolutionsValue, EavError> {
        if let Some(cached) = self.cache.solutions.get(request).await {
            return Ok(cached);
        }

        let itineraries = Arc::new(self.client.solutions(request).await?);
        self.cache
            .solutions
            .insert(request.clone(), itineraries.clone())
            .await;

        Ok(itineraries)
    }

    /// Invalidate all cached entries.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}
