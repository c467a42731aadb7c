//! Race core: countdown, possession tracking and the server loop.
//!
//! This crate owns the two coupled state machines of a Relic Race: the
//! session countdown that decides the winner, and the possession tracker
//! that follows the relic and keeps trail and beacon markers in step with
//! it. Both run on one cooperative [`Scheduler`] timeline driven by the
//! [`GameSessionController`].
//!
//! # Modules
//!
//! - [`clock`] -- Session countdown clock with day and hour derivations.
//! - [`config`] -- Configuration loading from `relic-config.yaml` into
//!   strongly-typed structs.
//! - [`control`] -- [`ControlState`] shared between the server loop and
//!   its drivers.
//! - [`gateway`] -- Command surface and world-event guards.
//! - [`notify`] -- [`NotificationSink`] trait, recording and tracing sinks.
//! - [`runner`] -- Async server loop.
//! - [`scheduler`] -- Cooperative timer scheduler over server ticks.
//! - [`session`] -- [`GameSessionController`] and the session state machine.
//! - [`task`] -- Tasks carried by scheduler timers.
//! - [`tracker`] -- [`PossessionTracker`] and its poll cycle.
//!
//! [`ControlState`]: control::ControlState
//! [`GameSessionController`]: session::GameSessionController
//! [`NotificationSink`]: notify::NotificationSink
//! [`PossessionTracker`]: tracker::PossessionTracker
//! [`Scheduler`]: scheduler::Scheduler

pub mod clock;
pub mod config;
pub mod control;
pub mod gateway;
pub mod notify;
pub mod runner;
pub mod scheduler;
pub mod session;
pub mod task;
pub mod tracker;
