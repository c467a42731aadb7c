//! Participant spawner for the simulated world.
//!
//! At startup the spawner places N participants at random points of a
//! square arena around the origin and hands the relic to one of them, so a
//! race started on boot has a holder from the first poll.

use std::collections::BTreeSet;

use rand::Rng;
use relic_types::{Location, ParticipantId, Point};
use relic_world::SimulatedWorld;
use serde::Deserialize;
use tracing::info;

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Spawner and wandering settings, read from the `participants` section of
/// `relic-config.yaml`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpawnerConfig {
    /// Number of participants to spawn.
    #[serde(default = "default_count")]
    pub count: u32,

    /// Half-width of the square arena participants spawn and wander in.
    #[serde(default = "default_arena_radius")]
    pub arena_radius: f64,

    /// Distance a participant covers per move.
    #[serde(default = "default_step")]
    pub step: f64,

    /// Server ticks between two moves.
    #[serde(default = "default_move_every_ticks")]
    pub move_every_ticks: u64,

    /// Chance per move that the holder loses the relic.
    #[serde(default = "default_drop_chance")]
    pub drop_chance: f64,

    /// RNG seed; a random seed is drawn when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for SpawnerConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            arena_radius: default_arena_radius(),
            step: default_step(),
            move_every_ticks: default_move_every_ticks(),
            drop_chance: default_drop_chance(),
            seed: None,
        }
    }
}

const fn default_count() -> u32 {
    4
}

const fn default_arena_radius() -> f64 {
    48.0
}

const fn default_step() -> f64 {
    1.5
}

const fn default_move_every_ticks() -> u64 {
    10
}

const fn default_drop_chance() -> f64 {
    0.01
}

// -----------------------------------------------------------------------
// Name pool
// -----------------------------------------------------------------------

/// Built-in pool of participant names, drawn without replacement.
const NAME_POOL: &[&str] = &[
    "Alder", "Birch", "Cedar", "Dusk", "Ember", "Fern", "Grove", "Haze", "Iris", "Juniper",
    "Kestrel", "Lark", "Moss", "Nettle", "Oak", "Pine", "Quill", "Reed", "Sage", "Thorn",
    "Vale", "Wren", "Yarrow", "Zephyr",
];

fn pick_unused_name(rng: &mut impl Rng, taken: &BTreeSet<String>) -> Result<String, EngineError> {
    let available: Vec<&str> = NAME_POOL
        .iter()
        .filter(|&&n| !taken.contains(n))
        .copied()
        .collect();

    if available.is_empty() {
        let suffix: u32 = rng.random_range(1000..9999);
        return Ok(format!("Runner-{suffix}"));
    }

    let idx = rng.random_range(0..available.len());
    available
        .get(idx)
        .map(|s| String::from(*s))
        .ok_or_else(|| EngineError::Spawner {
            message: format!("name pool index {idx} out of bounds"),
        })
}

// -----------------------------------------------------------------------
// Spawning
// -----------------------------------------------------------------------

/// Participants created by [`spawn_participants`].
#[derive(Debug, Clone)]
pub struct SpawnResult {
    /// Participant ids in join order.
    pub participants: Vec<ParticipantId>,
    /// The participant that starts with the relic.
    pub relic_holder: ParticipantId,
}

/// Spawn the configured participants into `world` and give the relic to a
/// random one of them.
///
/// # Errors
///
/// Returns [`EngineError::Spawner`] for a zero count or a non-positive
/// arena, and [`EngineError::World`] if the relic cannot be handed out.
pub fn spawn_participants(
    config: &SpawnerConfig,
    world: &mut SimulatedWorld,
    rng: &mut impl Rng,
) -> Result<SpawnResult, EngineError> {
    if config.count == 0 {
        return Err(EngineError::Spawner {
            message: String::from("participant count must be at least 1"),
        });
    }
    if config.arena_radius.is_nan() || config.arena_radius <= 0.0 {
        return Err(EngineError::Spawner {
            message: String::from("arena_radius must be a positive number"),
        });
    }

    let mut taken = BTreeSet::new();
    let mut participants = Vec::new();
    for _ in 0..config.count {
        let name = pick_unused_name(rng, &taken)?;
        let x = rng.random_range(-config.arena_radius..=config.arena_radius);
        let z = rng.random_range(-config.arena_radius..=config.arena_radius);
        let yaw: f32 = rng.random_range(-180.0..180.0);
        let id = world.join(&name, Location::new(Point::new(x, 64.0, z), yaw));
        info!(participant = %id, name, x, z, "Participant spawned");
        taken.insert(name);
        participants.push(id);
    }

    let idx = rng.random_range(0..participants.len());
    let relic_holder = participants
        .get(idx)
        .copied()
        .ok_or_else(|| EngineError::Spawner {
            message: String::from("failed to select the first relic holder"),
        })?;
    world.give_relic(relic_holder)?;
    info!(participant = %relic_holder, "Relic handed out");

    Ok(SpawnResult {
        participants,
        relic_holder,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn spawns_configured_count_with_unique_names() {
        let mut world = SimulatedWorld::default();
        let mut rng = StdRng::seed_from_u64(7);
        let config = SpawnerConfig {
            count: 12,
            ..SpawnerConfig::default()
        };
        let result = spawn_participants(&config, &mut world, &mut rng).unwrap();

        assert_eq!(result.participants.len(), 12);
        assert_eq!(world.participant_ids(), result.participants);
        assert!(world.holds_relic(result.relic_holder));
        let holders = result
            .participants
            .iter()
            .filter(|id| world.holds_relic(**id))
            .count();
        assert_eq!(holders, 1);
    }

    #[test]
    fn exhausted_pool_falls_back_to_numbered_names() {
        let mut world = SimulatedWorld::default();
        let mut rng = StdRng::seed_from_u64(1);
        let config = SpawnerConfig {
            count: u32::try_from(NAME_POOL.len()).unwrap() + 3,
            ..SpawnerConfig::default()
        };
        let result = spawn_participants(&config, &mut world, &mut rng).unwrap();
        assert_eq!(result.participants.len(), NAME_POOL.len() + 3);
    }

    #[test]
    fn zero_count_is_rejected() {
        let mut world = SimulatedWorld::default();
        let mut rng = StdRng::seed_from_u64(1);
        let config = SpawnerConfig {
            count: 0,
            ..SpawnerConfig::default()
        };
        assert!(matches!(
            spawn_participants(&config, &mut world, &mut rng),
            Err(EngineError::Spawner { .. })
        ));
    }

    #[test]
    fn config_section_parses() {
        let yaml = "count: 6\nseed: 99\ndrop_chance: 0.5\n";
        let config: SpawnerConfig = serde_yml::from_str(yaml).unwrap();
        assert_eq!(config.count, 6);
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.move_every_ticks, default_move_every_ticks());
    }
}
