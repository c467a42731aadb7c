//! Core entity structs: participants, trail markers, beacon markers and
//! session outcomes.

use serde::{Deserialize, Serialize};

use crate::geometry::{BlockPos, Point};
use crate::ids::{MarkerHandle, ParticipantId};

/// Identity of a participant as reported by the world.
///
/// The core keeps no other participant records; everything else about a
/// participant is queried from the world oracle when needed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Participant {
    /// Stable unique identity.
    pub id: ParticipantId,
    /// Display name used in announcements.
    pub name: String,
}

impl Participant {
    /// Create a participant identity.
    pub fn new(id: ParticipantId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A transient marker left behind by the relic holder's movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrailMarker {
    /// Participant that left the marker.
    pub owner: ParticipantId,
    /// World handle of the visual entity.
    pub handle: MarkerHandle,
    /// Where the marker was placed.
    pub location: Point,
    /// Facing angle in degrees, within `(-180, 180]`.
    pub facing: f32,
    /// Server tick at which the marker was created.
    pub created_at: u64,
    /// Server tick at which the decay timer removes the marker.
    pub expires_at: u64,
}

/// A beacon marking where the relic was most recently lost.
///
/// The structure is a 3x3 base one block below the loss point plus an apex
/// block at the loss point itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeaconMarker {
    /// The exact point where the relic was lost.
    pub origin: Point,
    /// Supporting blocks of the footprint.
    pub base: Vec<BlockPos>,
    /// The beacon block itself.
    pub apex: BlockPos,
}

impl BeaconMarker {
    /// Half-width of the square base footprint, in blocks.
    pub const BASE_RADIUS: i64 = 1;

    /// Lay out a beacon for a loss at `origin`.
    pub fn at(origin: Point) -> Self {
        let apex = origin.block();
        let center = apex.offset(0, -1, 0);
        let mut base = Vec::new();
        for dx in -Self::BASE_RADIUS..=Self::BASE_RADIUS {
            for dz in -Self::BASE_RADIUS..=Self::BASE_RADIUS {
                base.push(center.offset(dx, 0, dz));
            }
        }
        Self { origin, base, apex }
    }

    /// Every block occupied by this beacon, base first, apex last.
    pub fn blocks(&self) -> impl Iterator<Item = BlockPos> + '_ {
        self.base.iter().copied().chain(core::iter::once(self.apex))
    }

    /// Whether the given block belongs to this beacon.
    pub fn contains(&self, pos: BlockPos) -> bool {
        self.apex == pos || self.base.contains(&pos)
    }
}

/// How a session that reached expiry was decided.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// The named participant held the relic at expiry.
    Victory(Participant),
    /// Nobody online held the relic at expiry.
    Draw,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beacon_footprint_sits_below_origin() {
        let beacon = BeaconMarker::at(Point::new(10.4, 64.0, -3.2));
        assert_eq!(beacon.apex, BlockPos::new(10, 64, -4));
        assert_eq!(beacon.base.len(), 9);
        assert!(beacon.base.iter().all(|b| b.y == 63));
        assert!(beacon.contains(BlockPos::new(9, 63, -5)));
        assert!(beacon.contains(BlockPos::new(11, 63, -3)));
        assert!(!beacon.contains(BlockPos::new(12, 63, -4)));
        assert_eq!(beacon.blocks().count(), 10);
    }
}
