//! Session clock for the Relic Race countdown.
//!
//! The clock counts elapsed session ticks and derives everything else from
//! that single counter: days elapsed, days left, remaining ticks and hours
//! left in the current day.
//!
//! # Design Principles
//!
//! - The elapsed tick counter is the only stored temporal state.
//! - All derivations use checked or saturating arithmetic; nothing
//!   underflows past zero once the countdown is exhausted.

use crate::config::SessionConfig;

/// Number of hours in one in-game day, used for status text.
const HOURS_PER_DAY: u64 = 24;

/// Errors that can occur during clock operations.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Tick counter would overflow.
    #[error("tick counter overflow: cannot advance beyond u64::MAX")]
    TickOverflow,

    /// Invalid clock configuration (e.g. zero ticks per day).
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Countdown clock of one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClock {
    /// Session ticks elapsed since the start.
    elapsed: u64,

    /// Length of the race in days.
    total_days: u64,

    /// Session ticks per in-game day.
    ticks_per_day: u64,
}

impl SessionClock {
    /// Create a clock at tick 0.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `ticks_per_day` or
    /// `total_days` is zero, or the total length overflows.
    pub fn new(config: &SessionConfig) -> Result<Self, ClockError> {
        Self::from_parts(0, config.total_days, config.ticks_per_day)
    }

    /// Create a clock from explicit parameters (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] on a zero or overflowing
    /// configuration.
    pub fn from_parts(elapsed: u64, total_days: u64, ticks_per_day: u64) -> Result<Self, ClockError> {
        if ticks_per_day == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "ticks_per_day must be at least 1".to_owned(),
            });
        }
        if total_days == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "total_days must be at least 1".to_owned(),
            });
        }
        if total_days.checked_mul(ticks_per_day).is_none() {
            return Err(ClockError::InvalidConfig {
                reason: "total session length overflows u64".to_owned(),
            });
        }
        Ok(Self {
            elapsed,
            total_days,
            ticks_per_day,
        })
    }

    /// Advance the clock by one tick. Returns the new elapsed count.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::TickOverflow`] if the counter would exceed
    /// `u64::MAX`.
    pub fn advance(&mut self) -> Result<u64, ClockError> {
        self.elapsed = self.elapsed.checked_add(1).ok_or(ClockError::TickOverflow)?;
        Ok(self.elapsed)
    }

    /// Rewind to tick 0.
    pub const fn reset(&mut self) {
        self.elapsed = 0;
    }

    /// Session ticks elapsed.
    pub const fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Length of the race in days.
    pub const fn total_days(&self) -> u64 {
        self.total_days
    }

    /// Session ticks per day.
    pub const fn ticks_per_day(&self) -> u64 {
        self.ticks_per_day
    }

    /// Total countdown length in ticks.
    pub const fn total_ticks(&self) -> u64 {
        // Cannot overflow: checked at construction.
        self.total_days.saturating_mul(self.ticks_per_day)
    }

    /// Whether the elapsed count sits exactly on a day boundary (tick 0
    /// excluded).
    pub fn at_day_boundary(&self) -> bool {
        self.elapsed > 0 && self.elapsed.checked_rem(self.ticks_per_day) == Some(0)
    }

    /// Whole days elapsed.
    pub fn days_elapsed(&self) -> u64 {
        self.elapsed.checked_div(self.ticks_per_day).unwrap_or(0)
    }

    /// Days left, counting the current partial day as a full one.
    pub fn days_left(&self) -> u64 {
        self.total_days.saturating_sub(self.days_elapsed())
    }

    /// Ticks left until expiry.
    pub const fn remaining_ticks(&self) -> u64 {
        self.total_ticks().saturating_sub(self.elapsed)
    }

    /// Whether the countdown is exhausted.
    pub const fn expired(&self) -> bool {
        self.elapsed >= self.total_ticks()
    }

    /// Whole hours left within the current day, for status text.
    pub fn hours_left_in_day(&self) -> u64 {
        let ticks_per_hour = self.ticks_per_day.checked_div(HOURS_PER_DAY).unwrap_or(0);
        let within_day = self
            .remaining_ticks()
            .checked_rem(self.ticks_per_day)
            .unwrap_or(0);
        within_day.checked_div(ticks_per_hour).unwrap_or(0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn standard_clock() -> SessionClock {
        SessionClock::new(&SessionConfig::default()).unwrap()
    }

    #[test]
    fn clock_starts_at_tick_zero() {
        let clock = standard_clock();
        assert_eq!(clock.elapsed(), 0);
        assert_eq!(clock.days_left(), 100);
        assert_eq!(clock.remaining_ticks(), 2_400_000);
        assert!(!clock.at_day_boundary());
    }

    #[test]
    fn day_boundary_every_ticks_per_day() {
        let mut clock = SessionClock::from_parts(0, 3, 10).unwrap();
        let mut boundaries = Vec::new();
        for _ in 0..30 {
            let tick = clock.advance().unwrap();
            if clock.at_day_boundary() {
                boundaries.push((tick, clock.days_left()));
            }
        }
        assert_eq!(boundaries, vec![(10, 2), (20, 1), (30, 0)]);
        assert!(clock.expired());
    }

    #[test]
    fn hours_left_counts_within_current_day() {
        // 24000 ticks per day -> 1000 ticks per hour.
        let clock = SessionClock::from_parts(1_500, 100, 24_000).unwrap();
        // Remaining 2_398_500 -> 22_500 within the day -> 22 hours.
        assert_eq!(clock.hours_left_in_day(), 22);
        assert_eq!(clock.days_left(), 100);
    }

    #[test]
    fn remaining_never_underflows() {
        let clock = SessionClock::from_parts(5_000, 1, 100).unwrap();
        assert_eq!(clock.remaining_ticks(), 0);
        assert_eq!(clock.days_left(), 0);
        assert!(clock.expired());
    }

    #[test]
    fn reset_rewinds() {
        let mut clock = standard_clock();
        let _ = clock.advance();
        clock.reset();
        assert_eq!(clock.elapsed(), 0);
    }

    #[test]
    fn overflow_is_reported() {
        let mut clock = SessionClock::from_parts(u64::MAX, 1, 1).unwrap();
        assert!(matches!(clock.advance(), Err(ClockError::TickOverflow)));
    }

    #[test]
    fn invalid_parts_rejected() {
        assert!(SessionClock::from_parts(0, 0, 10).is_err());
        assert!(SessionClock::from_parts(0, 10, 0).is_err());
        assert!(SessionClock::from_parts(0, u64::MAX, 2).is_err());
    }
}
