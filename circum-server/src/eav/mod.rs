//! Remote schedule adapter for the operator's online planner.
//!
//! This module talks to the upstream planner instead of the local schedule:
//!
//! - point-to-point solutions come back as JSON itineraries made of one or
//!   more train segments;
//! - live boards come back as either an HTML table fragment or JSON;
//! - station ids are the upstream's own and must be in the
//!   [`StationRegistry`].
//!
//! Upstream payloads are deserialized into explicit types and converted to
//! [`Itinerary`] or [`BoardEntry`] before anything else sees them.

mod board;
mod client;
mod convert;
mod error;
mod registry;
mod types;

pub use board::{
    BoardEntry, BoardKind, BoardParser, HtmlBoardParser, JsonBoardParser, TrainStatus,
    normalize_status, parse_board,
};
pub use client::{EavClient, EavConfig, SolutionsRequest};
pub use convert::{
    ConversionError, Itinerary, ItineraryKind, Segment, convert_solution, convert_solutions,
    format_upstream_date, parse_upstream_date,
};
pub use error::EavError;
pub use registry::{RegistryError, RemoteStation, StationRegistry};
pub use types::{BoardEnvelope, BoardRowDto, SegmentDto, SolutionDto, SolutionsEnvelope};
