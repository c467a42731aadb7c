//! Tasks carried by scheduler timers.

use relic_types::{MarkerHandle, ParticipantId};

/// What a timer does when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledTask {
    /// Advance the session countdown by one tick.
    SessionTick,
    /// Run one possession poll cycle.
    TrackerPoll,
    /// Remove one trail marker once its decay horizon has passed.
    TrailDecay {
        /// Participant that left the marker.
        owner: ParticipantId,
        /// World handle of the marker.
        handle: MarkerHandle,
    },
    /// Play the delayed reward effect at the winner's location.
    VictoryReward {
        /// The winner.
        winner: ParticipantId,
    },
}
