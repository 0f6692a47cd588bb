//! Domain error types.
//!
//! These errors represent schedule records that break the data model's
//! invariants. They are distinct from API/IO errors.

use super::{StationId, TrainId};

/// Domain-level errors for schedule consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Two stations share an identifier
    #[error("duplicate station id {0}")]
    DuplicateStation(StationId),

    /// Two stations share a code
    #[error("duplicate station code {0}")]
    DuplicateStationCode(String),

    /// Two trains share an identifier
    #[error("duplicate train id {0}")]
    DuplicateTrain(TrainId),

    /// A train starts and ends at the same station
    #[error("train {0} starts and ends at the same station")]
    SameEndpoints(TrainId),

    /// A record references a station that does not exist
    #[error("{0} references unknown station {1}")]
    UnknownStation(String, StationId),

    /// A stop references a train that does not exist
    #[error("stop references unknown train {0}")]
    UnknownTrain(TrainId),

    /// Stop order must be a positive integer
    #[error("train {0} has a stop with order 0")]
    ZeroStopOrder(TrainId),

    /// Two stops of the same train share a stop order
    #[error("train {0} has two stops with order {1}")]
    DuplicateStopOrder(TrainId, u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::DuplicateStationCode("NAP".into());
        assert_eq!(err.to_string(), "duplicate station code NAP");

        let err = DomainError::SameEndpoints(TrainId(4));
        assert_eq!(err.to_string(), "train 4 starts and ends at the same station");

        let err = DomainError::UnknownStation("train 2".into(), StationId(99));
        assert_eq!(err.to_string(), "train 2 references unknown station 99");

        let err = DomainError::DuplicateStopOrder(TrainId(1), 3);
        assert_eq!(err.to_string(), "train 1 has two stops with order 3");
    }
}
