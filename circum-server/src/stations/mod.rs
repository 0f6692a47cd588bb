//! Station resolver.
//!
//! Maps free-text input such as "pompei" or "sor" to station records by
//! case-insensitive substring match on name or code.

mod error;
mod resolver;

pub use error::ResolveError;
pub use resolver::{matching_stations, resolve, search};
