//! Station identifiers and records.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque station identifier, as assigned by the data load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationId(pub u32);

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when parsing an invalid station code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station code: {reason}")]
pub struct InvalidStationCode {
    reason: &'static str,
}

/// Maximum length of a station code.
const MAX_CODE_LEN: usize = 8;

/// A short station code such as `NAP` or `SOR`.
///
/// Codes are 1 to 8 uppercase ASCII letters or digits. This type guarantees
/// that any `StationCode` value is valid by construction.
///
/// # Examples
///
/// ```
/// use circum_server::domain::StationCode;
///
/// let nap = StationCode::parse("NAP").unwrap();
/// assert_eq!(nap.as_str(), "NAP");
///
/// // Lowercase is rejected by the strict parser...
/// assert!(StationCode::parse("nap").is_err());
/// // ...but accepted by the normalizing one
/// assert_eq!(StationCode::parse_normalized(" nap ").unwrap(), nap);
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationCode(String);

impl StationCode {
    /// Parse a station code, requiring uppercase.
    pub fn parse(s: &str) -> Result<Self, InvalidStationCode> {
        if s.is_empty() || s.len() > MAX_CODE_LEN {
            return Err(InvalidStationCode {
                reason: "must be 1 to 8 characters",
            });
        }

        if !s
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
        {
            return Err(InvalidStationCode {
                reason: "must be uppercase ASCII letters or digits",
            });
        }

        Ok(Self(s.to_string()))
    }

    /// Parse a station code after trimming and uppercasing the input.
    pub fn parse_normalized(s: &str) -> Result<Self, InvalidStationCode> {
        Self::parse(&s.trim().to_ascii_uppercase())
    }

    /// Returns the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationCode({})", self.0)
    }
}

impl fmt::Display for StationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for StationCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for StationCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        StationCode::parse_normalized(&s).map_err(serde::de::Error::custom)
    }
}

/// A station on the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub code: StationCode,
}

impl Station {
    pub fn new(id: u32, name: impl Into<String>, code: &str) -> Result<Self, InvalidStationCode> {
        Ok(Self {
            id: StationId(id),
            name: name.into(),
            code: StationCode::parse_normalized(code)?,
        })
    }
}
