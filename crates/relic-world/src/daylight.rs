//! Day/night derivation from world time.
//!
//! World time runs in ticks and wraps every `day_length` ticks. Night is the
//! inclusive window `night_start..=night_end` within each day; the defaults
//! (13000 to 23000 of a 24000-tick day) match the host world's sky cycle.
//!
//! The phase is computed from the time, never stored, so any caller holding
//! the same world time observes the same phase.

use relic_types::EnvironmentalPhase;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Default length of one world day in ticks.
pub const DEFAULT_DAY_LENGTH: u64 = 24_000;

/// Default first tick of the night window.
pub const DEFAULT_NIGHT_START: u64 = 13_000;

/// Default last tick of the night window (inclusive).
pub const DEFAULT_NIGHT_END: u64 = 23_000;

/// A validated day/night cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaylightCycle {
    day_length: u64,
    night_start: u64,
    night_end: u64,
}

impl DaylightCycle {
    /// Create a cycle from its parameters.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::InvalidDaylight`] if `day_length` is zero, the
    /// window is inverted, or the window extends past the end of the day.
    pub fn new(day_length: u64, night_start: u64, night_end: u64) -> Result<Self, WorldError> {
        if day_length == 0 {
            return Err(WorldError::InvalidDaylight {
                reason: "day_length must be at least 1".to_owned(),
            });
        }
        if night_start > night_end {
            return Err(WorldError::InvalidDaylight {
                reason: format!("night_start {night_start} is after night_end {night_end}"),
            });
        }
        if night_end >= day_length {
            return Err(WorldError::InvalidDaylight {
                reason: format!("night_end {night_end} must be below day_length {day_length}"),
            });
        }
        Ok(Self {
            day_length,
            night_start,
            night_end,
        })
    }

    /// Phase of the day at the given world time.
    pub fn phase_at(&self, world_time: u64) -> EnvironmentalPhase {
        let time_of_day = world_time.checked_rem(self.day_length).unwrap_or(0);
        if (self.night_start..=self.night_end).contains(&time_of_day) {
            EnvironmentalPhase::Night
        } else {
            EnvironmentalPhase::Day
        }
    }

    /// Length of one day in ticks.
    pub const fn day_length(&self) -> u64 {
        self.day_length
    }
}

impl Default for DaylightCycle {
    fn default() -> Self {
        Self {
            day_length: DEFAULT_DAY_LENGTH,
            night_start: DEFAULT_NIGHT_START,
            night_end: DEFAULT_NIGHT_END,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_boundaries() {
        let cycle = DaylightCycle::default();
        assert_eq!(cycle.phase_at(0), EnvironmentalPhase::Day);
        assert_eq!(cycle.phase_at(12_999), EnvironmentalPhase::Day);
        assert_eq!(cycle.phase_at(13_000), EnvironmentalPhase::Night);
        assert_eq!(cycle.phase_at(23_000), EnvironmentalPhase::Night);
        assert_eq!(cycle.phase_at(23_001), EnvironmentalPhase::Day);
    }

    #[test]
    fn phase_wraps_every_day() {
        let cycle = DaylightCycle::default();
        assert_eq!(cycle.phase_at(24_000 + 13_500), EnvironmentalPhase::Night);
        assert_eq!(cycle.phase_at(48_000 + 100), EnvironmentalPhase::Day);
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(DaylightCycle::new(0, 0, 0).is_err());
        assert!(DaylightCycle::new(100, 60, 50).is_err());
        assert!(DaylightCycle::new(100, 50, 100).is_err());
        assert!(DaylightCycle::new(100, 50, 99).is_ok());
    }
}
