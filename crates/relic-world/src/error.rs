//! Error types for the `relic-world` crate.

use relic_types::ParticipantId;

/// Errors that can occur during world operations.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The participant is not known to the world.
    #[error("participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    /// The participant's holding area has no free slot.
    #[error("holding area of {participant} is full ({capacity} slots)")]
    HoldingAreaFull {
        /// The participant whose holding area is full.
        participant: ParticipantId,
        /// Number of slots in the holding area.
        capacity: usize,
    },

    /// There is no relic resting in the world to pick up.
    #[error("no relic is resting in the world")]
    RelicNotInWorld,

    /// Invalid day/night configuration.
    #[error("invalid daylight configuration: {reason}")]
    InvalidDaylight {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}
