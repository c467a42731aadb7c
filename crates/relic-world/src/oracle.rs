//! The world oracle consumed by the session core.
//!
//! The possession tracker and the session controller query the world and
//! place or remove visual artifacts exclusively through this trait. The
//! host world (a game server, the in-memory [`SimulatedWorld`], a test
//! fake) decides how those artifacts are rendered.
//!
//! Presentation calls (`celebrate_winner`, `reward_effect`,
//! `highlight_loose_relic`) are fire-and-forget: the core never inspects
//! their outcome.
//!
//! [`SimulatedWorld`]: crate::sim::SimulatedWorld

use relic_types::{
    BeaconMarker, BlockPos, EnvironmentalPhase, Location, MarkerHandle, Participant,
    ParticipantId, Point, Vector,
};

use crate::error::WorldError;

/// Source of world state and sink of world mutations for the session core.
pub trait WorldOracle {
    /// Scan online participants in the world's enumeration order and return
    /// the first one holding the relic.
    ///
    /// The enumeration order must be stable between calls so that the
    /// first-match policy is deterministic. No online participants simply
    /// yields `None`.
    fn find_online_holder(&self) -> Option<Participant>;

    /// Whether the participant is currently online.
    fn is_participant_online(&self, id: ParticipantId) -> bool;

    /// Current environmental phase of the main world.
    fn environmental_phase(&self) -> EnvironmentalPhase;

    /// Current location of the participant, or `None` if the world has no
    /// position for them.
    fn current_location(&self, id: ParticipantId) -> Option<Location>;

    /// Current movement vector of the participant. Unknown participants
    /// report a zero vector.
    fn movement_vector(&self, id: ParticipantId) -> Vector;

    /// Place a trail marker facing `facing` degrees and return its handle.
    fn place_trail_marker(&mut self, at: Point, facing: f32) -> MarkerHandle;

    /// Remove a marker. Removing an unknown or already removed marker is a
    /// no-op.
    fn remove_marker(&mut self, handle: MarkerHandle);

    /// Whether the marker still exists in the world.
    fn marker_still_valid(&self, handle: MarkerHandle) -> bool;

    /// Build the beacon structure (base footprint and apex).
    fn place_beacon_footprint(&mut self, beacon: &BeaconMarker);

    /// Tear the beacon structure down. Blocks that are no longer beacon
    /// blocks are left alone.
    fn clear_beacon_footprint(&mut self, beacon: &BeaconMarker);

    /// Play the victory spectacle for the winner at the given point.
    fn celebrate_winner(&mut self, winner: &Participant, at: Point);

    /// Play the delayed reward effect at the given point.
    fn reward_effect(&mut self, at: Point);

    /// Make a relic lying loose in the world stand out (glow, particles).
    fn highlight_loose_relic(&mut self, at: BlockPos);

    /// Move the relic from the world into the participant's holding area.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::RelicNotInWorld`] if no relic rests in the
    /// world, [`WorldError::HoldingAreaFull`] if the participant has no
    /// free slot, or [`WorldError::ParticipantNotFound`] for an unknown
    /// participant. Nothing changes on error.
    fn move_relic_into_holding_area(&mut self, id: ParticipantId) -> Result<(), WorldError>;
}
