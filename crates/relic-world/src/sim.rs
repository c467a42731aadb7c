//! In-memory world implementing [`WorldOracle`].
//!
//! `SimulatedWorld` keeps participants in join order (which is also the
//! oracle's enumeration order), a world clock for the day/night cycle, the
//! set of live marker entities and the blocks placed by beacons. Every
//! presentation call is appended to a bounded effect log so callers can
//! observe what the core asked the world to show.
//!
//! There is exactly one relic: either in one holding area or resting as a
//! block. Beacon construction never builds over the resting relic.

use std::collections::BTreeMap;

use relic_types::{
    BeaconMarker, BlockPos, EnvironmentalPhase, Location, MarkerHandle, Participant,
    ParticipantId, Point, Vector,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::daylight::DaylightCycle;
use crate::error::WorldError;
use crate::holding::{HeldItem, HoldingArea};
use crate::oracle::WorldOracle;

/// Most effects kept in the log; older entries are discarded first.
pub const MAX_EFFECT_LOG: usize = 256;

/// Kind of block the simulated world tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Supporting block under a beacon.
    BeaconBase,
    /// The beacon block itself.
    BeaconApex,
    /// The relic resting in the world as a block.
    Relic,
}

/// A presentation effect requested by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEffect {
    /// Victory spectacle for the winner.
    WinnerCelebrated {
        /// The winner.
        winner: ParticipantId,
        /// Where the spectacle was played.
        at: Point,
    },
    /// Delayed reward effect.
    RewardStrike {
        /// Where the effect was played.
        at: Point,
    },
    /// A beacon was built.
    BeaconActivated {
        /// The beacon apex.
        at: BlockPos,
    },
    /// A beacon was torn down.
    BeaconCleared {
        /// The former beacon apex.
        at: BlockPos,
    },
    /// A loose relic was made to glow.
    RelicHighlighted {
        /// Where the relic rests.
        at: BlockPos,
    },
}

#[derive(Debug, Clone)]
struct SimParticipant {
    identity: Participant,
    online: bool,
    location: Location,
    velocity: Vector,
    holding: HoldingArea,
}

#[derive(Debug, Clone, Copy)]
struct PlacedMarker {
    at: Point,
    facing: f32,
}

/// An in-memory world.
#[derive(Debug, Clone)]
pub struct SimulatedWorld {
    participants: Vec<SimParticipant>,
    daylight: DaylightCycle,
    world_time: u64,
    holding_capacity: usize,
    markers: BTreeMap<MarkerHandle, PlacedMarker>,
    next_marker: u64,
    blocks: BTreeMap<BlockPos, BlockKind>,
    effects: Vec<WorldEffect>,
}

impl SimulatedWorld {
    /// Create an empty world at world time 0 (sunrise).
    pub const fn new(daylight: DaylightCycle, holding_capacity: usize) -> Self {
        Self {
            participants: Vec::new(),
            daylight,
            world_time: 0,
            holding_capacity,
            markers: BTreeMap::new(),
            next_marker: 0,
            blocks: BTreeMap::new(),
            effects: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Participants
    // -----------------------------------------------------------------------

    /// Add an online participant at the given location and return their id.
    pub fn join(&mut self, name: &str, location: Location) -> ParticipantId {
        let id = ParticipantId::new();
        self.participants.push(SimParticipant {
            identity: Participant::new(id, name),
            online: true,
            location,
            velocity: Vector::default(),
            holding: HoldingArea::new(self.holding_capacity),
        });
        debug!(participant = %id, name, "Participant joined");
        id
    }

    /// Participant ids in enumeration order, online or not.
    pub fn participant_ids(&self) -> Vec<ParticipantId> {
        self.participants.iter().map(|p| p.identity.id).collect()
    }

    /// Mark a participant online or offline.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ParticipantNotFound`] for an unknown id.
    pub fn set_online(&mut self, id: ParticipantId, online: bool) -> Result<(), WorldError> {
        self.participant_mut(id)?.online = online;
        Ok(())
    }

    /// Move a participant, recording the displacement as their velocity.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ParticipantNotFound`] for an unknown id.
    pub fn move_to(&mut self, id: ParticipantId, location: Location) -> Result<(), WorldError> {
        let p = self.participant_mut(id)?;
        let from = p.location.position;
        let to = location.position;
        p.velocity = Vector::new(to.x - from.x, to.y - from.y, to.z - from.z);
        p.location = location;
        Ok(())
    }

    /// Set a participant's velocity without moving them.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ParticipantNotFound`] for an unknown id.
    pub fn set_velocity(&mut self, id: ParticipantId, velocity: Vector) -> Result<(), WorldError> {
        self.participant_mut(id)?.velocity = velocity;
        Ok(())
    }

    /// Put the relic straight into a participant's holding area.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ParticipantNotFound`] or
    /// [`WorldError::HoldingAreaFull`].
    pub fn give_relic(&mut self, id: ParticipantId) -> Result<(), WorldError> {
        self.participant_mut(id)?.holding.insert(id, HeldItem::Relic)
    }

    /// Take the relic from a participant (death, drop). Returns whether
    /// they had it.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ParticipantNotFound`] for an unknown id.
    pub fn take_relic(&mut self, id: ParticipantId) -> Result<bool, WorldError> {
        Ok(self.participant_mut(id)?.holding.remove_relic())
    }

    /// Fill a participant's holding area with filler items.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::ParticipantNotFound`] for an unknown id.
    pub fn fill_holding_area(&mut self, id: ParticipantId) -> Result<(), WorldError> {
        let p = self.participant_mut(id)?;
        while p.holding.len() < p.holding.capacity() {
            p.holding.insert(id, HeldItem::Other("cobblestone".to_owned()))?;
        }
        Ok(())
    }

    /// Whether a participant currently holds the relic.
    pub fn holds_relic(&self, id: ParticipantId) -> bool {
        self.participant(id).is_some_and(|p| p.holding.has_relic())
    }

    // -----------------------------------------------------------------------
    // Time
    // -----------------------------------------------------------------------

    /// Current world time in ticks.
    pub const fn world_time(&self) -> u64 {
        self.world_time
    }

    /// Set the world time.
    pub const fn set_world_time(&mut self, time: u64) {
        self.world_time = time;
    }

    /// Advance the world time.
    pub const fn advance_time(&mut self, ticks: u64) {
        self.world_time = self.world_time.saturating_add(ticks);
    }

    // -----------------------------------------------------------------------
    // Blocks and markers
    // -----------------------------------------------------------------------

    /// Rest the relic in the world as a block.
    pub fn place_relic_block(&mut self, at: BlockPos) {
        self.blocks.insert(at, BlockKind::Relic);
    }

    /// Kind of block tracked at the position, if any.
    pub fn block_at(&self, at: BlockPos) -> Option<BlockKind> {
        self.blocks.get(&at).copied()
    }

    /// Number of blocks of the given kind.
    pub fn block_count(&self, kind: BlockKind) -> usize {
        self.blocks.values().filter(|k| **k == kind).count()
    }

    /// Number of live marker entities.
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Facing angle of a live marker.
    pub fn marker_facing(&self, handle: MarkerHandle) -> Option<f32> {
        self.markers.get(&handle).map(|m| m.facing)
    }

    /// Position of a live marker.
    pub fn marker_position(&self, handle: MarkerHandle) -> Option<Point> {
        self.markers.get(&handle).map(|m| m.at)
    }

    /// Destroy a marker from outside the core (e.g. an explosion).
    pub fn destroy_marker(&mut self, handle: MarkerHandle) {
        self.markers.remove(&handle);
    }

    /// Presentation effects requested since the last drain, oldest first.
    pub fn effects(&self) -> &[WorldEffect] {
        &self.effects
    }

    /// Take every logged effect, leaving the log empty.
    pub fn drain_effects(&mut self) -> Vec<WorldEffect> {
        std::mem::take(&mut self.effects)
    }

    fn record(&mut self, effect: WorldEffect) {
        if self.effects.len() >= MAX_EFFECT_LOG {
            let excess = self.effects.len().saturating_sub(MAX_EFFECT_LOG).saturating_add(1);
            self.effects.drain(..excess);
        }
        self.effects.push(effect);
    }

    fn relic_resting(&self) -> bool {
        self.blocks.values().any(|k| *k == BlockKind::Relic)
    }

    fn place_beacon_block(&mut self, at: BlockPos, kind: BlockKind) {
        if self.blocks.get(&at) == Some(&BlockKind::Relic) {
            debug!(x = at.x, y = at.y, z = at.z, "Beacon block skipped over resting relic");
            return;
        }
        self.blocks.insert(at, kind);
    }

    fn participant(&self, id: ParticipantId) -> Option<&SimParticipant> {
        self.participants.iter().find(|p| p.identity.id == id)
    }

    fn participant_mut(&mut self, id: ParticipantId) -> Result<&mut SimParticipant, WorldError> {
        self.participants
            .iter_mut()
            .find(|p| p.identity.id == id)
            .ok_or(WorldError::ParticipantNotFound(id))
    }
}

impl Default for SimulatedWorld {
    fn default() -> Self {
        Self::new(DaylightCycle::default(), crate::holding::DEFAULT_HOLDING_CAPACITY)
    }
}

impl WorldOracle for SimulatedWorld {
    fn find_online_holder(&self) -> Option<Participant> {
        self.participants
            .iter()
            .find(|p| p.online && p.holding.has_relic())
            .map(|p| p.identity.clone())
    }

    fn is_participant_online(&self, id: ParticipantId) -> bool {
        self.participant(id).is_some_and(|p| p.online)
    }

    fn environmental_phase(&self) -> EnvironmentalPhase {
        self.daylight.phase_at(self.world_time)
    }

    fn current_location(&self, id: ParticipantId) -> Option<Location> {
        self.participant(id).map(|p| p.location)
    }

    fn movement_vector(&self, id: ParticipantId) -> Vector {
        self.participant(id).map(|p| p.velocity).unwrap_or_default()
    }

    fn place_trail_marker(&mut self, at: Point, facing: f32) -> MarkerHandle {
        self.next_marker = self.next_marker.saturating_add(1);
        let handle = MarkerHandle(self.next_marker);
        self.markers.insert(handle, PlacedMarker { at, facing });
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        self.markers.remove(&handle);
    }

    fn marker_still_valid(&self, handle: MarkerHandle) -> bool {
        self.markers.contains_key(&handle)
    }

    fn place_beacon_footprint(&mut self, beacon: &BeaconMarker) {
        for pos in &beacon.base {
            self.place_beacon_block(*pos, BlockKind::BeaconBase);
        }
        self.place_beacon_block(beacon.apex, BlockKind::BeaconApex);
        self.record(WorldEffect::BeaconActivated { at: beacon.apex });
    }

    fn clear_beacon_footprint(&mut self, beacon: &BeaconMarker) {
        for pos in beacon.blocks() {
            if matches!(
                self.blocks.get(&pos),
                Some(BlockKind::BeaconBase | BlockKind::BeaconApex)
            ) {
                self.blocks.remove(&pos);
            }
        }
        self.record(WorldEffect::BeaconCleared { at: beacon.apex });
    }

    fn celebrate_winner(&mut self, winner: &Participant, at: Point) {
        self.record(WorldEffect::WinnerCelebrated {
            winner: winner.id,
            at,
        });
    }

    fn reward_effect(&mut self, at: Point) {
        self.record(WorldEffect::RewardStrike { at });
    }

    fn highlight_loose_relic(&mut self, at: BlockPos) {
        self.record(WorldEffect::RelicHighlighted { at });
    }

    fn move_relic_into_holding_area(&mut self, id: ParticipantId) -> Result<(), WorldError> {
        if !self.relic_resting() {
            return Err(WorldError::RelicNotInWorld);
        }
        self.participant_mut(id)?.holding.insert(id, HeldItem::Relic)?;
        self.blocks.retain(|_, kind| *kind != BlockKind::Relic);
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn spawn() -> Location {
        Location::new(Point::new(0.0, 64.0, 0.0), 0.0)
    }

    #[test]
    fn holder_scan_follows_join_order_and_skips_offline() {
        let mut world = SimulatedWorld::default();
        let a = world.join("Alpha", spawn());
        let b = world.join("Bravo", spawn());
        world.give_relic(a).unwrap();
        world.give_relic(b).unwrap();

        assert_eq!(world.find_online_holder().map(|p| p.id), Some(a));
        world.set_online(a, false).unwrap();
        assert_eq!(world.find_online_holder().map(|p| p.id), Some(b));
        world.set_online(b, false).unwrap();
        assert!(world.find_online_holder().is_none());
    }

    #[test]
    fn move_records_velocity() {
        let mut world = SimulatedWorld::default();
        let a = world.join("Alpha", spawn());
        world
            .move_to(a, Location::new(Point::new(1.0, 64.0, 2.0), 0.0))
            .unwrap();
        assert_eq!(world.movement_vector(a), Vector::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn markers_can_be_destroyed_externally() {
        let mut world = SimulatedWorld::default();
        let h = world.place_trail_marker(Point::new(0.0, 0.0, 0.0), 45.0);
        assert!(world.marker_still_valid(h));
        world.destroy_marker(h);
        assert!(!world.marker_still_valid(h));
        world.remove_marker(h);
        assert_eq!(world.marker_count(), 0);
    }

    #[test]
    fn beacon_blocks_placed_and_cleared() {
        let mut world = SimulatedWorld::default();
        let beacon = BeaconMarker::at(Point::new(5.5, 70.0, 5.5));
        world.place_beacon_footprint(&beacon);
        assert_eq!(world.block_count(BlockKind::BeaconBase), 9);
        assert_eq!(world.block_at(beacon.apex), Some(BlockKind::BeaconApex));
        world.clear_beacon_footprint(&beacon);
        assert_eq!(world.block_count(BlockKind::BeaconBase), 0);
        assert_eq!(world.block_at(beacon.apex), None);
    }

    #[test]
    fn relic_block_moves_into_holding_area() {
        let mut world = SimulatedWorld::default();
        let a = world.join("Alpha", spawn());
        world.place_relic_block(BlockPos::new(1, 64, 1));
        world.move_relic_into_holding_area(a).unwrap();
        assert!(world.holds_relic(a));
        assert_eq!(world.block_count(BlockKind::Relic), 0);
    }

    #[test]
    fn full_holding_area_keeps_relic_in_world() {
        let mut world = SimulatedWorld::new(DaylightCycle::default(), 2);
        let a = world.join("Alpha", spawn());
        world.fill_holding_area(a).unwrap();
        world.place_relic_block(BlockPos::new(1, 64, 1));
        let err = world.move_relic_into_holding_area(a);
        assert!(matches!(err, Err(WorldError::HoldingAreaFull { .. })));
        assert_eq!(world.block_count(BlockKind::Relic), 1);
        assert!(!world.holds_relic(a));
    }

    #[test]
    fn no_second_relic_without_a_resting_one() {
        let mut world = SimulatedWorld::default();
        let a = world.join("Alpha", spawn());
        let b = world.join("Bravo", spawn());
        world.give_relic(a).unwrap();

        let err = world.move_relic_into_holding_area(b);
        assert!(matches!(err, Err(WorldError::RelicNotInWorld)));
        assert!(world.holds_relic(a));
        assert!(!world.holds_relic(b));
    }

    #[test]
    fn beacon_leaves_resting_relic_in_place() {
        let mut world = SimulatedWorld::default();
        let beacon = BeaconMarker::at(Point::new(5.5, 70.0, 5.5));
        world.place_relic_block(beacon.apex);

        world.place_beacon_footprint(&beacon);
        assert_eq!(world.block_at(beacon.apex), Some(BlockKind::Relic));
        assert_eq!(world.block_count(BlockKind::BeaconBase), 9);

        world.clear_beacon_footprint(&beacon);
        assert_eq!(world.block_at(beacon.apex), Some(BlockKind::Relic));
        assert_eq!(world.block_count(BlockKind::Relic), 1);
        assert_eq!(world.block_count(BlockKind::BeaconBase), 0);
    }

    #[test]
    fn effect_log_is_bounded_and_drainable() {
        let mut world = SimulatedWorld::default();
        for i in 0..(MAX_EFFECT_LOG + 10) {
            world.highlight_loose_relic(BlockPos::new(i64::try_from(i).unwrap(), 0, 0));
        }
        assert_eq!(world.effects().len(), MAX_EFFECT_LOG);
        assert_eq!(
            world.effects().first(),
            Some(&WorldEffect::RelicHighlighted {
                at: BlockPos::new(10, 0, 0)
            })
        );

        let drained = world.drain_effects();
        assert_eq!(drained.len(), MAX_EFFECT_LOG);
        assert!(world.effects().is_empty());
    }

    #[test]
    fn night_follows_world_time() {
        let mut world = SimulatedWorld::default();
        assert_eq!(world.environmental_phase(), EnvironmentalPhase::Day);
        world.set_world_time(13_000);
        assert_eq!(world.environmental_phase(), EnvironmentalPhase::Night);
        world.advance_time(10_001);
        assert_eq!(world.environmental_phase(), EnvironmentalPhase::Day);
    }
}
