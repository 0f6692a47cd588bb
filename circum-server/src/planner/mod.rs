//! Local journey planning.
//!
//! The matcher decides which trains serve a query and where the passenger
//! boards and alights; the ranker orders the result; [`Planner`] ties both
//! to a schedule store and the station resolver.

mod config;
mod matcher;
mod query;
mod rank;


pub use config::SearchConfig;
pub use matcher::{JourneyPoint, MatchParams, MatchedJourney, match_journeys};
pub use query::{Planner, QueryError, RawQuery, ScheduleQuery, SearchOutcome};
pub use rank::rank_journeys;
