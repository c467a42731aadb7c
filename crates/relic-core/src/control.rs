//! Shared control state for the running server loop.
//!
//! The server loop and whoever drives it from outside (the console
//! reader, a Ctrl-C handler) share one [`ControlState`] through an
//! [`Arc`](std::sync::Arc). Hot-path reads are lock-free atomics; only the
//! end reason sits behind a mutex.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, Notify};

use crate::config::ServerConfig;

/// Smallest accepted tick interval when changed at runtime.
pub const MIN_TICK_INTERVAL_MS: u64 = 10;

/// Why the server loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerEndReason {
    /// A stop was requested.
    OperatorStop,
    /// The configured `max_server_ticks` was reached.
    MaxTicksReached,
}

/// Control flags shared between the server loop and its drivers.
#[derive(Debug)]
pub struct ControlState {
    paused: AtomicBool,
    resume_notify: Notify,
    stop_requested: AtomicBool,
    tick_interval_ms: AtomicU64,
    started_at: DateTime<Utc>,
    /// Maximum number of server ticks (0 = unlimited).
    max_ticks: u64,
    end_reason: Mutex<Option<ServerEndReason>>,
}

impl ControlState {
    /// Create a running (not paused) control state.
    pub fn new(tick_interval_ms: u64, max_ticks: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            tick_interval_ms: AtomicU64::new(tick_interval_ms),
            started_at: Utc::now(),
            max_ticks,
            end_reason: Mutex::new(None),
        }
    }

    /// Create a control state from the server section of the config.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(config.tick_interval_ms, config.max_server_ticks)
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether the loop is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause the loop. Server ticks stop until [`resume`](Self::resume).
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume the loop and wake it.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until the loop is no longer paused.
    pub async fn wait_if_paused(&self) {
        while self.paused.load(Ordering::Acquire) {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Ask the loop to return before its next tick. Also wakes a paused
    /// loop so it can observe the request.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Whether a stop was requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Record why the loop ended.
    pub async fn set_end_reason(&self, reason: ServerEndReason) {
        let mut guard = self.end_reason.lock().await;
        *guard = Some(reason);
    }

    /// Why the loop ended, if it has.
    pub async fn end_reason(&self) -> Option<ServerEndReason> {
        *self.end_reason.lock().await
    }

    // -----------------------------------------------------------------------
    // Tick speed and limits
    // -----------------------------------------------------------------------

    /// Current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Change the tick interval. Returns the previous interval, or `None`
    /// if `ms` is below [`MIN_TICK_INTERVAL_MS`].
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TICK_INTERVAL_MS {
            return None;
        }
        Some(self.tick_interval_ms.swap(ms, Ordering::AcqRel))
    }

    /// Whether `ticks` reached the tick limit. Always `false` when
    /// unlimited.
    pub const fn tick_limit_reached(&self, ticks: u64) -> bool {
        self.max_ticks > 0 && ticks >= self.max_ticks
    }

    /// Configured tick limit (0 = unlimited).
    pub const fn max_ticks(&self) -> u64 {
        self.max_ticks
    }

    /// Wall-clock start time.
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Wall-clock seconds since start.
    pub fn elapsed_seconds(&self) -> u64 {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds();
        u64::try_from(elapsed.max(0)).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_running() {
        let state = ControlState::new(50, 0);
        assert!(!state.is_paused());
        assert!(!state.is_stop_requested());
        assert_eq!(state.tick_interval_ms(), 50);
    }

    #[test]
    fn pause_and_resume() {
        let state = ControlState::new(50, 0);
        state.pause();
        assert!(state.is_paused());
        state.resume();
        assert!(!state.is_paused());
    }

    #[test]
    fn stop_unpauses() {
        let state = ControlState::new(50, 0);
        state.pause();
        state.request_stop();
        assert!(state.is_stop_requested());
        assert!(!state.is_paused());
    }

    #[test]
    fn interval_change_respects_minimum() {
        let state = ControlState::new(50, 0);
        assert_eq!(state.set_tick_interval_ms(200), Some(50));
        assert_eq!(state.set_tick_interval_ms(1), None);
        assert_eq!(state.tick_interval_ms(), 200);
    }

    #[test]
    fn zero_tick_limit_is_unlimited() {
        assert!(!ControlState::new(50, 0).tick_limit_reached(u64::MAX));
        let bounded = ControlState::new(50, 10);
        assert!(!bounded.tick_limit_reached(9));
        assert!(bounded.tick_limit_reached(10));
    }

    #[test]
    fn from_config_copies_server_settings() {
        let config = ServerConfig {
            tick_interval_ms: 75,
            max_server_ticks: 9,
            ..ServerConfig::default()
        };
        let state = ControlState::from_config(&config);
        assert_eq!(state.tick_interval_ms(), 75);
        assert_eq!(state.max_ticks(), 9);
    }

    #[tokio::test]
    async fn wait_returns_after_resume() {
        let state = std::sync::Arc::new(ControlState::new(50, 0));
        state.pause();
        let waiter = {
            let state = std::sync::Arc::clone(&state);
            tokio::spawn(async move { state.wait_if_paused().await })
        };
        state.resume();
        assert!(waiter.await.is_ok());
        assert!(state.end_reason().await.is_none());
        state.set_end_reason(ServerEndReason::OperatorStop).await;
        assert_eq!(state.end_reason().await, Some(ServerEndReason::OperatorStop));
    }
}
