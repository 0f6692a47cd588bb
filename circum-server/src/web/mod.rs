//! Web layer for the timetable service.
//!
//! JSON endpoints for station lookup, local timetable search and the
//! upstream planner.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
