//! Shared type definitions for the Relic Race session.
//!
//! This crate is the single source of truth for the values passed between
//! the world oracle, the possession tracker and the session controller.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for participant identities, marker
//!   handles and scheduler timer ids
//! - [`enums`] -- Session phase, environmental phase and presentation cues
//! - [`geometry`] -- Points, vectors, block positions and facing angles
//! - [`structs`] -- Participants, trail markers, beacon markers and outcomes

pub mod enums;
pub mod geometry;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EnvironmentalPhase, PresentationCue, SessionPhase};
pub use geometry::{BlockPos, Location, Point, Vector, normalize_degrees};
pub use ids::{MarkerHandle, ParticipantId, TimerId};
pub use structs::{BeaconMarker, Participant, SessionOutcome, TrailMarker};
