//! World oracle interface and simulated world for the Relic Race session.
//!
//! The session core never touches world state directly. Everything it needs
//! to know (who holds the relic, whether it is night, where a participant
//! stands) and everything it changes (trail markers, beacon blocks, victory
//! effects) goes through the [`WorldOracle`] trait defined here.
//!
//! # Modules
//!
//! - [`daylight`] -- Day/night derivation from world time.
//! - [`error`] -- Error types for world operations.
//! - [`holding`] -- Capacity-limited holding areas (participant inventories).
//! - [`oracle`] -- The [`WorldOracle`] trait consumed by the session core.
//! - [`sim`] -- [`SimulatedWorld`], an in-memory oracle used by the engine
//!   binary and by tests.

pub mod daylight;
pub mod error;
pub mod holding;
pub mod oracle;
pub mod sim;

// Re-export primary types at crate root.
pub use daylight::DaylightCycle;
pub use error::WorldError;
pub use holding::{HeldItem, HoldingArea};
pub use oracle::WorldOracle;
pub use sim::{BlockKind, SimulatedWorld, WorldEffect};
