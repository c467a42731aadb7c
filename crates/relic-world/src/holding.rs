//! Capacity-limited holding areas.
//!
//! A holding area is a participant's inventory reduced to what the race
//! cares about: a fixed number of slots, each empty or holding one item.
//! Adding fails when no slot is free; nothing is silently dropped.

use relic_types::ParticipantId;
use serde::{Deserialize, Serialize};

use crate::error::WorldError;

/// Default number of slots in a holding area.
pub const DEFAULT_HOLDING_CAPACITY: usize = 36;

/// An item occupying one holding slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HeldItem {
    /// The contested relic.
    Relic,
    /// Any other item, identified by name.
    Other(String),
}

/// A participant's holding area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoldingArea {
    capacity: usize,
    items: Vec<HeldItem>,
}

impl HoldingArea {
    /// Create an empty holding area with the given number of slots.
    pub const fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: Vec::new(),
        }
    }

    /// Number of slots.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether no slot is occupied.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the relic is in one of the slots.
    pub fn has_relic(&self) -> bool {
        self.items.contains(&HeldItem::Relic)
    }

    /// Put an item into the first free slot.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::HoldingAreaFull`] if every slot is occupied.
    pub fn insert(&mut self, owner: ParticipantId, item: HeldItem) -> Result<(), WorldError> {
        if self.items.len() >= self.capacity {
            return Err(WorldError::HoldingAreaFull {
                participant: owner,
                capacity: self.capacity,
            });
        }
        self.items.push(item);
        Ok(())
    }

    /// Take the relic out. Returns `false` if it was not held.
    pub fn remove_relic(&mut self) -> bool {
        let Some(idx) = self.items.iter().position(|i| *i == HeldItem::Relic) else {
            return false;
        };
        self.items.remove(idx);
        true
    }
}

impl Default for HoldingArea {
    fn default() -> Self {
        Self::new(DEFAULT_HOLDING_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_until_full() {
        let owner = ParticipantId::new();
        let mut area = HoldingArea::new(2);
        assert!(area.insert(owner, HeldItem::Other("torch".to_owned())).is_ok());
        assert!(area.insert(owner, HeldItem::Relic).is_ok());
        let err = area.insert(owner, HeldItem::Other("bread".to_owned()));
        assert!(matches!(err, Err(WorldError::HoldingAreaFull { capacity: 2, .. })));
        assert_eq!(area.len(), 2);
        assert!(area.has_relic());
    }

    #[test]
    fn remove_relic_only_once() {
        let owner = ParticipantId::new();
        let mut area = HoldingArea::default();
        assert!(area.insert(owner, HeldItem::Relic).is_ok());
        assert!(area.remove_relic());
        assert!(!area.remove_relic());
        assert!(area.is_empty());
    }
}
