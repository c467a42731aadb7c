//! Enumeration types for the Relic Race session.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a game session.
///
/// Transitions only move forward: `Idle -> Running -> Ended`. A session in
/// `Ended` may be re-armed into `Running` by a fresh start (replay); it never
/// returns to `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionPhase {
    /// No session has been started yet.
    #[default]
    Idle,
    /// The countdown is running.
    Running,
    /// The session expired or was stopped.
    Ended,
}

impl SessionPhase {
    /// Whether the countdown is currently running.
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

/// Environmental phase of the shared world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnvironmentalPhase {
    /// Daylight; trail markers may be placed.
    Day,
    /// Night; trails vanish and none are placed.
    Night,
}

impl EnvironmentalPhase {
    /// Whether this phase is night.
    pub const fn is_night(self) -> bool {
        matches!(self, Self::Night)
    }
}

/// Discrete presentation cue sent on the secondary notification channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PresentationCue {
    /// Played to everyone when a winner is announced.
    VictoryFanfare,
    /// Played on each milestone within the warning window.
    WarningTone,
    /// Played when a single day remains.
    FinalWarningTone,
}
