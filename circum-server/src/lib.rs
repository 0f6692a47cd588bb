//! Circumvesuviana timetable server.
//!
//! Answers "which trains go from here to there, and when?" from a local
//! schedule, and relays the operator's own planner and live boards.

pub mod cache;
pub mod config;
pub mod domain;
pub mod eav;
pub mod planner;
pub mod stations;
pub mod store;
pub mod web;
