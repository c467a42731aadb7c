//! Wandering participants: the demo world's stand-in for real players.
//!
//! Before every server tick the hook advances world time by one tick and,
//! every few ticks, moves each participant one step. Now and then the relic
//! holder loses the relic; it lands as a block at their feet, the gateway
//! highlights it, and everyone heads for it until somebody reaches it and
//! takes it through the gateway's relic-interaction guard. World effects
//! are drained into the log after every hook run.

use rand::Rng;
use relic_core::gateway::Gateway;
use relic_core::notify::NotificationSink;
use relic_core::runner::ServerTickHook;
use relic_core::session::GameSessionController;
use relic_types::{BlockPos, Location, ParticipantId, Point};
use relic_world::{SimulatedWorld, WorldOracle};
use tracing::{debug, info, warn};

use crate::spawner::SpawnerConfig;

/// Reach within which a participant can grab a loose relic.
const GRAB_REACH: f64 = 2.0;

/// Server tick hook that moves the simulated world.
#[derive(Debug)]
pub struct Wanderers<R> {
    rng: R,
    participants: Vec<ParticipantId>,
    config: SpawnerConfig,
    gateway: Gateway,
    loose_relic: Option<BlockPos>,
}

impl<R: Rng> Wanderers<R> {
    /// Create the hook for the given participants.
    pub fn new(
        rng: R,
        participants: Vec<ParticipantId>,
        config: SpawnerConfig,
        gateway: Gateway,
    ) -> Self {
        Self {
            rng,
            participants,
            config,
            gateway,
            loose_relic: None,
        }
    }

    /// Where the relic lies on the ground, if it does.
    pub const fn loose_relic(&self) -> Option<BlockPos> {
        self.loose_relic
    }

    fn move_everyone(&mut self, world: &mut SimulatedWorld) {
        let target = self.loose_relic.map(block_center);
        for id in self.participants.clone() {
            let Some(here) = world.current_location(id) else {
                continue;
            };
            let (dx, dz) = match target {
                Some(goal) => toward(here.position, goal, self.config.step),
                None => {
                    let angle: f64 = self.rng.random_range(0.0..std::f64::consts::TAU);
                    (angle.cos() * self.config.step, angle.sin() * self.config.step)
                }
            };
            let radius = self.config.arena_radius;
            let next = Point::new(
                (here.position.x + dx).clamp(-radius, radius),
                here.position.y,
                (here.position.z + dz).clamp(-radius, radius),
            );
            let yaw = self.rng.random_range(-180.0..180.0);
            if let Err(err) = world.move_to(id, Location::new(next, yaw)) {
                warn!(participant = %id, error = %err, "Move failed");
            }
        }
    }

    fn maybe_drop_relic(&mut self, world: &mut SimulatedWorld) -> Option<BlockPos> {
        let holder = world.find_online_holder()?;
        if self.rng.random::<f64>() >= self.config.drop_chance {
            return None;
        }
        let location = world.current_location(holder.id)?;
        match world.take_relic(holder.id) {
            Ok(true) => {
                let at = location.position.block();
                world.place_relic_block(at);
                self.loose_relic = Some(at);
                info!(participant = %holder.id, name = holder.name, x = at.x, z = at.z, "Relic dropped");
                Some(at)
            }
            Ok(false) => None,
            Err(err) => {
                warn!(participant = %holder.id, error = %err, "Relic drop failed");
                None
            }
        }
    }

    fn try_grab<S: NotificationSink>(
        &mut self,
        controller: &mut GameSessionController<SimulatedWorld, S>,
    ) {
        let Some(at) = self.loose_relic else {
            return;
        };
        let goal = block_center(at);
        let reacher = self.participants.iter().copied().find(|id| {
            controller
                .oracle()
                .current_location(*id)
                .is_some_and(|loc| horizontal_distance(loc.position, goal) <= GRAB_REACH)
        });
        let Some(id) = reacher else {
            return;
        };

        let verdict = self.gateway.on_relic_interact(controller, id);
        for reply in &verdict.replies {
            debug!(participant = %id, reply, "Relic interaction");
        }
        if controller.oracle().holds_relic(id) {
            self.loose_relic = None;
        } else if !controller.is_active() {
            // Outside a race nobody guards the relic; hand it over directly.
            match controller.oracle_mut().move_relic_into_holding_area(id) {
                Ok(()) => self.loose_relic = None,
                Err(err) => debug!(participant = %id, error = %err, "Relic stays on the ground"),
            }
        }
    }
}

impl<R: Rng, S: NotificationSink> ServerTickHook<SimulatedWorld, S> for Wanderers<R> {
    fn before_tick(&mut self, tick: u64, controller: &mut GameSessionController<SimulatedWorld, S>) {
        controller.oracle_mut().advance_time(1);

        let every = self.config.move_every_ticks.max(1);
        if tick.checked_rem(every) == Some(0) {
            self.move_everyone(controller.oracle_mut());
            if self.loose_relic.is_none()
                && let Some(at) = self.maybe_drop_relic(controller.oracle_mut())
            {
                let _ = self.gateway.on_relic_spawned(controller, at);
            }
            self.try_grab(controller);
        }

        for effect in controller.oracle_mut().drain_effects() {
            debug!(tick, effect = ?effect, "World effect");
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn block_center(pos: BlockPos) -> Point {
    Point::new(pos.x as f64 + 0.5, pos.y as f64, pos.z as f64 + 0.5)
}

fn horizontal_distance(a: Point, b: Point) -> f64 {
    (a.x - b.x).hypot(a.z - b.z)
}

fn toward(from: Point, to: Point, step: f64) -> (f64, f64) {
    let dx = to.x - from.x;
    let dz = to.z - from.z;
    let len = dx.hypot(dz);
    if len <= step || len <= f64::EPSILON {
        (dx, dz)
    } else {
        (dx / len * step, dz / len * step)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use relic_core::config::GameConfig;
    use relic_core::notify::RecordingSink;

    use super::*;

    fn setup(
        drop_chance: f64,
    ) -> (
        GameSessionController<SimulatedWorld, RecordingSink>,
        Wanderers<StdRng>,
        Vec<ParticipantId>,
    ) {
        let mut world = SimulatedWorld::default();
        let a = world.join("Alpha", Location::new(Point::new(0.0, 64.0, 0.0), 0.0));
        let b = world.join("Bravo", Location::new(Point::new(6.0, 64.0, 0.0), 0.0));
        world.give_relic(a).unwrap();
        let controller =
            GameSessionController::new(&GameConfig::default(), world, RecordingSink::new())
                .unwrap();
        let config = SpawnerConfig {
            drop_chance,
            move_every_ticks: 1,
            step: 1.0,
            arena_radius: 16.0,
            ..SpawnerConfig::default()
        };
        let hook = Wanderers::new(
            StdRng::seed_from_u64(3),
            vec![a, b],
            config,
            Gateway::default(),
        );
        (controller, hook, vec![a, b])
    }

    #[test]
    fn world_time_follows_server_ticks() {
        let (mut c, mut hook, _) = setup(0.0);
        for tick in 1..=5 {
            hook.before_tick(tick, &mut c);
        }
        assert_eq!(c.oracle().world_time(), 5);
    }

    #[test]
    fn participants_stay_inside_the_arena() {
        let (mut c, mut hook, ids) = setup(0.0);
        for tick in 1..=500 {
            hook.before_tick(tick, &mut c);
        }
        for id in ids {
            let p = c.oracle().current_location(id).unwrap().position;
            assert!(p.x.abs() <= 16.0 && p.z.abs() <= 16.0);
        }
    }

    #[test]
    fn holder_drops_relic_at_their_feet() {
        let (mut c, mut hook, ids) = setup(1.0);
        let dropped = hook.maybe_drop_relic(c.oracle_mut());

        let at = hook.loose_relic().unwrap();
        assert_eq!(dropped, Some(at));
        assert_eq!(at, BlockPos::new(0, 64, 0));
        assert_eq!(c.oracle().block_at(at), Some(relic_world::BlockKind::Relic));
        assert!(!c.oracle().holds_relic(*ids.first().unwrap()));
    }

    #[test]
    fn participants_converge_on_a_loose_relic() {
        let (mut c, mut hook, ids) = setup(0.0);
        let alpha = *ids.first().unwrap();
        c.start();
        c.oracle_mut().take_relic(alpha).unwrap();
        let at = BlockPos::new(12, 64, 0);
        c.oracle_mut().place_relic_block(at);
        hook.loose_relic = Some(at);

        let mut picked_up = false;
        for tick in 1..=30 {
            hook.before_tick(tick, &mut c);
            if hook.loose_relic().is_none() {
                picked_up = true;
                break;
            }
        }
        assert!(picked_up);
        assert!(ids.iter().any(|id| c.oracle().holds_relic(*id)));
        assert_eq!(c.oracle().block_at(at), None);
    }

    #[test]
    fn loss_beacon_keeps_the_dropped_relic() {
        let (mut c, mut hook, ids) = setup(1.0);
        let alpha = *ids.first().unwrap();
        c.start();
        let _ = c.advance();
        let at = hook.maybe_drop_relic(c.oracle_mut()).unwrap();
        assert!(!c.oracle().holds_relic(alpha));

        for _ in 0..20 {
            let _ = c.advance();
        }
        assert_eq!(c.tracker().beacons().len(), 1);
        assert_eq!(c.oracle().block_at(at), Some(relic_world::BlockKind::Relic));
        assert_eq!(c.oracle().block_count(relic_world::BlockKind::Relic), 1);

        c.oracle_mut().move_relic_into_holding_area(alpha).unwrap();
        for _ in 0..20 {
            let _ = c.advance();
        }
        assert!(c.tracker().beacons().is_empty());
        assert_eq!(c.oracle().block_count(relic_world::BlockKind::Relic), 0);
        assert!(c.oracle().holds_relic(alpha));
    }

    #[test]
    fn hook_drains_world_effects() {
        let (mut c, mut hook, _) = setup(1.0);
        c.start();
        c.oracle_mut().highlight_loose_relic(BlockPos::new(0, 64, 0));
        hook.before_tick(1, &mut c);
        assert!(c.oracle().effects().is_empty());
    }

    #[test]
    fn toward_never_overshoots() {
        let (dx, dz) = toward(Point::new(0.0, 0.0, 0.0), Point::new(0.5, 0.0, 0.0), 2.0);
        assert!((dx - 0.5).abs() < 1e-9 && dz.abs() < 1e-9);
        let (dx, dz) = toward(Point::new(0.0, 0.0, 0.0), Point::new(10.0, 0.0, 0.0), 2.0);
        assert!((dx - 2.0).abs() < 1e-9 && dz.abs() < 1e-9);
    }
}
