//! Possession tracker: who holds the relic, and the trail and beacon
//! artifacts that follow from it.
//!
//! The tracker polls the [`WorldOracle`] on a fixed interval. Each poll
//! cycle runs these steps in order:
//!
//! 1. **Scan** -- ask the oracle for the first online holder.
//! 2. **Transition** -- compare with the previous poll. `Some -> None` runs
//!    the loss handler, `None -> Some` runs the pickup handler. A direct
//!    `Some(a) -> Some(b)` hand-off fires neither; it is only logged.
//! 3. **Nightfall** -- on a day -> night transition every trail vanishes.
//! 4. **Trail** -- an online holder in daylight leaves a marker, unless the
//!    previous marker is closer than the minimum spacing.
//! 5. **Prune** -- markers the world no longer knows are forgotten.
//! 6. **Record** -- the observed phase becomes "last observed".
//!
//! Every trail marker also gets its own one-shot decay timer. Bulk clears do
//! not cancel those timers; a decay that fires for a marker the tracker no
//! longer holds is a no-op.

use std::collections::BTreeMap;

use relic_types::{
    BeaconMarker, BlockPos, Location, MarkerHandle, Participant, ParticipantId, TimerId,
    TrailMarker, normalize_degrees,
};
use relic_world::WorldOracle;
use tracing::{debug, info, warn};

use crate::config::TrackerConfig;
use crate::notify::NotificationSink;
use crate::scheduler::Scheduler;
use crate::task::ScheduledTask;

/// Mutable collaborators a tracker operation works against.
pub struct TrackerContext<'a> {
    /// The world being tracked.
    pub oracle: &'a mut dyn WorldOracle,
    /// Where announcements go.
    pub sink: &'a mut dyn NotificationSink,
    /// The shared timeline.
    pub scheduler: &'a mut Scheduler<ScheduledTask>,
}

/// What the tracker knows about the relic holder.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelicHolderState {
    /// Holder observed by the last poll.
    pub current_holder: Option<Participant>,
    /// Whether the last poll observed night.
    pub was_night_last_tick: bool,
    /// Most recent location observed for the current holder.
    pub last_known_location: Option<Location>,
}

/// Holder change detected by one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HolderTransition {
    /// Same holder (or still nobody).
    Unchanged,
    /// The holder lost the relic and nobody holds it now.
    Lost(Participant),
    /// Somebody picked the relic up after nobody held it.
    PickedUp(Participant),
    /// The relic moved between two holders without a gap in between.
    HandedOff {
        /// Previous holder.
        from: Participant,
        /// New holder.
        to: Participant,
    },
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    /// Holder change detected by this poll.
    pub transition: HolderTransition,
    /// Whether night fell between the previous poll and this one.
    pub night_fell: bool,
    /// Trail marker placed by this poll, if any.
    pub trail_placed: Option<MarkerHandle>,
    /// Markers forgotten because the world invalidated them.
    pub pruned: usize,
}

/// Tracks the relic holder and owns every trail and beacon marker.
#[derive(Debug, Clone)]
pub struct PossessionTracker {
    config: TrackerConfig,
    state: RelicHolderState,
    trails: BTreeMap<ParticipantId, Vec<TrailMarker>>,
    beacons: Vec<BeaconMarker>,
    poll_timer: Option<TimerId>,
}

impl PossessionTracker {
    /// Create an idle tracker.
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            state: RelicHolderState::default(),
            trails: BTreeMap::new(),
            beacons: Vec::new(),
            poll_timer: None,
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Begin polling. Any previous polling loop is cancelled and the holder
    /// state starts empty.
    pub fn start_tracking(&mut self, ctx: &mut TrackerContext<'_>) {
        if let Some(timer) = self.poll_timer.take() {
            ctx.scheduler.cancel(timer);
        }
        self.state = RelicHolderState::default();
        let timer = ctx.scheduler.schedule_repeating(
            0,
            self.config.poll_interval_ticks,
            ScheduledTask::TrackerPoll,
        );
        self.poll_timer = Some(timer);
        info!(
            interval = self.config.poll_interval_ticks,
            tick = ctx.scheduler.now(),
            "Possession tracking started"
        );
    }

    /// Stop polling and remove every trail marker and beacon.
    pub fn stop_tracking(&mut self, ctx: &mut TrackerContext<'_>) {
        if let Some(timer) = self.poll_timer.take() {
            ctx.scheduler.cancel(timer);
        }
        let trails = self.trail_count();
        let beacons = self.beacons.len();
        self.clear_all_trails(ctx.oracle);
        self.clear_all_beacons(ctx.oracle);
        info!(trails, beacons, "Possession tracking stopped");
    }

    /// Whether a polling loop is active.
    pub const fn is_tracking(&self) -> bool {
        self.poll_timer.is_some()
    }

    // -----------------------------------------------------------------------
    // Poll cycle
    // -----------------------------------------------------------------------

    /// Run one poll cycle.
    pub fn poll(&mut self, ctx: &mut TrackerContext<'_>) -> PollReport {
        // --- Scan ---
        let observed = ctx.oracle.find_online_holder();

        // --- Transition ---
        let transition = match (self.state.current_holder.clone(), observed.as_ref()) {
            (Some(prev), None) => HolderTransition::Lost(prev),
            (None, Some(next)) => HolderTransition::PickedUp(next.clone()),
            (Some(prev), Some(next)) if prev.id != next.id => HolderTransition::HandedOff {
                from: prev,
                to: next.clone(),
            },
            _ => HolderTransition::Unchanged,
        };
        match &transition {
            HolderTransition::Lost(holder) => self.on_relic_lost(ctx, holder),
            HolderTransition::PickedUp(holder) => self.on_relic_picked_up(ctx, holder),
            HolderTransition::HandedOff { from, to } => {
                debug!(from = %from.id, to = %to.id, "Relic handed off without a gap");
            }
            HolderTransition::Unchanged => {}
        }
        self.state.current_holder = observed;
        if let Some(holder) = &self.state.current_holder
            && let Some(location) = ctx.oracle.current_location(holder.id)
        {
            self.state.last_known_location = Some(location);
        }

        // --- Nightfall ---
        let is_night = ctx.oracle.environmental_phase().is_night();
        let night_fell = !self.state.was_night_last_tick && is_night;
        if night_fell {
            self.clear_all_trails(ctx.oracle);
            ctx.sink
                .announce("\u{1f319} Night has fallen and every footprint has vanished.");
            debug!(tick = ctx.scheduler.now(), "Nightfall cleared all trails");
        }

        // --- Trail ---
        let mut trail_placed = None;
        if let Some(holder) = self.state.current_holder.clone()
            && ctx.oracle.is_participant_online(holder.id)
            && !is_night
        {
            trail_placed = self.place_trail_marker(ctx, holder.id);
        }

        // --- Prune ---
        let pruned = self.prune_invalid(ctx.oracle);

        // --- Record ---
        self.state.was_night_last_tick = is_night;

        PollReport {
            transition,
            night_fell,
            trail_placed,
            pruned,
        }
    }

    /// Handle a decay timer. Returns whether a tracked marker was removed;
    /// a marker already cleared by a bulk operation is left alone.
    pub fn on_trail_decay(
        &mut self,
        oracle: &mut dyn WorldOracle,
        owner: ParticipantId,
        handle: MarkerHandle,
    ) -> bool {
        let Some(trail) = self.trails.get_mut(&owner) else {
            return false;
        };
        let Some(idx) = trail.iter().position(|m| m.handle == handle) else {
            return false;
        };
        trail.remove(idx);
        if trail.is_empty() {
            self.trails.remove(&owner);
        }
        if oracle.marker_still_valid(handle) {
            oracle.remove_marker(handle);
        }
        debug!(owner = %owner, %handle, "Trail marker decayed");
        true
    }

    // -----------------------------------------------------------------------
    // Transition handlers
    // -----------------------------------------------------------------------

    fn on_relic_lost(&mut self, ctx: &mut TrackerContext<'_>, holder: &Participant) {
        let location = ctx
            .oracle
            .current_location(holder.id)
            .or(self.state.last_known_location.take());
        self.state.last_known_location = None;

        let beacon_raised = if let Some(location) = location {
            let beacon = BeaconMarker::at(location.position);
            ctx.oracle.place_beacon_footprint(&beacon);
            self.beacons.push(beacon);
            true
        } else {
            warn!(participant = %holder.id, "No known location for lost relic; no beacon raised");
            false
        };
        self.clear_participant_trails(ctx.oracle, holder.id);

        ctx.sink
            .announce(&format!("\u{1f480} {} has lost the relic!", holder.name));
        if beacon_raised {
            ctx.sink.announce("\u{1f52e} A purple beacon has been raised!");
        }
        info!(
            participant = %holder.id,
            name = holder.name,
            beacons = self.beacons.len(),
            "Relic lost"
        );
    }

    fn on_relic_picked_up(&mut self, ctx: &mut TrackerContext<'_>, holder: &Participant) {
        let cleared = self.beacons.len();
        self.clear_all_beacons(ctx.oracle);
        ctx.sink
            .announce(&format!("\u{2728} {} has claimed the relic!", holder.name));
        ctx.sink.announce("\u{2728} The beacons have faded!");
        info!(participant = %holder.id, name = holder.name, cleared, "Relic picked up");
    }

    // -----------------------------------------------------------------------
    // Markers
    // -----------------------------------------------------------------------

    fn place_trail_marker(
        &mut self,
        ctx: &mut TrackerContext<'_>,
        holder: ParticipantId,
    ) -> Option<MarkerHandle> {
        let location = ctx.oracle.current_location(holder)?;
        let at = location.position.offset(0.0, self.config.marker_lift, 0.0);

        if let Some(last) = self.trails.get(&holder).and_then(|t| t.last())
            && last.location.distance(at) < self.config.trail_spacing
        {
            return None;
        }

        let velocity = ctx.oracle.movement_vector(holder);
        let raw = if velocity.length_squared() < self.config.still_threshold_sq {
            location.yaw
        } else {
            velocity.heading_degrees()
        };
        let facing = normalize_degrees(raw);

        let handle = ctx.oracle.place_trail_marker(at, facing);
        let created_at = ctx.scheduler.now();
        ctx.scheduler.schedule_once(
            self.config.marker_decay_ticks,
            ScheduledTask::TrailDecay {
                owner: holder,
                handle,
            },
        );
        self.trails.entry(holder).or_default().push(TrailMarker {
            owner: holder,
            handle,
            location: at,
            facing,
            created_at,
            expires_at: created_at.saturating_add(self.config.marker_decay_ticks),
        });
        debug!(participant = %holder, %handle, facing, "Trail marker placed");
        Some(handle)
    }

    fn prune_invalid(&mut self, oracle: &dyn WorldOracle) -> usize {
        let before = self.trail_count();
        self.trails.retain(|_, trail| {
            trail.retain(|m| oracle.marker_still_valid(m.handle));
            !trail.is_empty()
        });
        before.saturating_sub(self.trail_count())
    }

    fn clear_participant_trails(&mut self, oracle: &mut dyn WorldOracle, id: ParticipantId) {
        if let Some(trail) = self.trails.remove(&id) {
            remove_markers(oracle, &trail);
        }
    }

    fn clear_all_trails(&mut self, oracle: &mut dyn WorldOracle) {
        for trail in self.trails.values() {
            remove_markers(oracle, trail);
        }
        self.trails.clear();
    }

    fn clear_all_beacons(&mut self, oracle: &mut dyn WorldOracle) {
        for beacon in self.beacons.drain(..) {
            oracle.clear_beacon_footprint(&beacon);
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Holder observed by the last poll.
    pub const fn current_holder(&self) -> Option<&Participant> {
        self.state.current_holder.as_ref()
    }

    /// Full holder state.
    pub const fn state(&self) -> &RelicHolderState {
        &self.state
    }

    /// Trail markers of one participant, oldest first.
    pub fn trails_for(&self, id: ParticipantId) -> &[TrailMarker] {
        self.trails.get(&id).map_or(&[], Vec::as_slice)
    }

    /// Number of trail markers across all participants.
    pub fn trail_count(&self) -> usize {
        self.trails.values().map(Vec::len).sum()
    }

    /// Active beacons.
    pub fn beacons(&self) -> &[BeaconMarker] {
        &self.beacons
    }

    /// Whether the block belongs to an active beacon.
    pub fn is_beacon_block(&self, pos: BlockPos) -> bool {
        self.beacons.iter().any(|b| b.contains(pos))
    }
}

fn remove_markers(oracle: &mut dyn WorldOracle, trail: &[TrailMarker]) {
    for marker in trail {
        if oracle.marker_still_valid(marker.handle) {
            oracle.remove_marker(marker.handle);
        }
    }
}
