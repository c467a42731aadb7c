//! Session state machine and the controller that owns the whole race.
//!
//! [`GameSessionController`] is the single owner of every piece of mutable
//! race state: the [`GameSession`] countdown, the [`PossessionTracker`], the
//! [`Scheduler`] timeline, the world oracle and the notification sink. One
//! call to [`advance`](GameSessionController::advance) moves the timeline by
//! one server tick and dispatches every timer that came due.
//!
//! # Lifecycle
//!
//! ```text
//! Idle --start--> Running --expiry--> Ended
//!                    |                  |
//!                    +------stop------->+
//!                                       |
//! Running <----------start--------------+
//! ```

use relic_types::{
    Participant, ParticipantId, PresentationCue, SessionOutcome, SessionPhase, TimerId,
};
use relic_world::WorldOracle;
use tracing::{debug, info, warn};

use crate::clock::{ClockError, SessionClock};
use crate::config::{GameConfig, SessionConfig};
use crate::notify::NotificationSink;
use crate::scheduler::Scheduler;
use crate::task::ScheduledTask;
use crate::tracker::{PossessionTracker, TrackerContext};

const BANNER_RULE: &str = "================================";

/// Countdown state of the race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSession {
    phase: SessionPhase,
    clock: SessionClock,
    last_milestone_day: Option<u64>,
}

impl GameSession {
    /// Create an idle session.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] for a zero-length countdown.
    pub fn new(config: &SessionConfig) -> Result<Self, ClockError> {
        Ok(Self {
            phase: SessionPhase::Idle,
            clock: SessionClock::new(config)?,
            last_milestone_day: None,
        })
    }

    /// Current phase.
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Session ticks elapsed in the current (or last) run.
    pub const fn elapsed_ticks(&self) -> u64 {
        self.clock.elapsed()
    }

    /// Total countdown length in ticks.
    pub const fn total_duration_ticks(&self) -> u64 {
        self.clock.total_ticks()
    }

    /// Last announced days-left value.
    pub const fn last_milestone_day(&self) -> Option<u64> {
        self.last_milestone_day
    }

    /// The countdown clock.
    pub const fn clock(&self) -> &SessionClock {
        &self.clock
    }
}

/// Owner and driver of one race.
pub struct GameSessionController<O, S> {
    config: SessionConfig,
    session: GameSession,
    tracker: PossessionTracker,
    scheduler: Scheduler<ScheduledTask>,
    oracle: O,
    sink: S,
    session_timer: Option<TimerId>,
    last_outcome: Option<SessionOutcome>,
}

impl<O: WorldOracle, S: NotificationSink> GameSessionController<O, S> {
    /// Build an idle controller.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] for a zero-length countdown.
    pub fn new(config: &GameConfig, oracle: O, sink: S) -> Result<Self, ClockError> {
        Ok(Self {
            config: config.session.clone(),
            session: GameSession::new(&config.session)?,
            tracker: PossessionTracker::new(config.tracker.clone()),
            scheduler: Scheduler::new(),
            oracle,
            sink,
            session_timer: None,
            last_outcome: None,
        })
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Start a race. Returns `false` if one is already running.
    pub fn start(&mut self) -> bool {
        if self.session.phase.is_running() {
            return false;
        }
        self.session.phase = SessionPhase::Running;
        self.session.clock.reset();
        self.session.last_milestone_day = None;
        self.last_outcome = None;

        if let Some(timer) = self.session_timer.take() {
            self.scheduler.cancel(timer);
        }
        self.session_timer = Some(
            self.scheduler
                .schedule_repeating(0, 1, ScheduledTask::SessionTick),
        );
        let (tracker, mut ctx) = self.split();
        tracker.start_tracking(&mut ctx);

        let days = self.session.clock.total_days();
        self.sink
            .announce("=== \u{1f409} The Relic Race has begun! \u{1f409} ===");
        self.sink.announce(&format!(
            "Whoever holds the relic after {days} days is the champion!"
        ));
        self.sink.announce(&format!("Time remaining: {days} days"));

        info!(
            total_days = days,
            total_ticks = self.session.total_duration_ticks(),
            tick = self.scheduler.now(),
            "Race started"
        );
        true
    }

    /// Stop a running race without picking a winner. Returns `false` if no
    /// race is running.
    pub fn stop(&mut self) -> bool {
        if !self.session.phase.is_running() {
            return false;
        }
        self.cancel_session_timer();
        let (tracker, mut ctx) = self.split();
        tracker.stop_tracking(&mut ctx);
        self.session.phase = SessionPhase::Ended;
        self.sink.announce("The race has been forcibly stopped!");
        info!(
            elapsed = self.session.elapsed_ticks(),
            "Race stopped by command"
        );
        true
    }

    /// Host shutdown: cancel the countdown and remove every marker without
    /// announcing anything.
    pub fn shutdown(&mut self) {
        self.cancel_session_timer();
        let (tracker, mut ctx) = self.split();
        tracker.stop_tracking(&mut ctx);
        if self.session.phase.is_running() {
            self.session.phase = SessionPhase::Ended;
        }
        info!(tick = self.scheduler.now(), "Race controller shut down");
    }

    // -----------------------------------------------------------------------
    // Timeline
    // -----------------------------------------------------------------------

    /// Advance one server tick and run every timer that came due, in due
    /// order. Returns the outcome if the race expired during this tick.
    pub fn advance(&mut self) -> Option<SessionOutcome> {
        self.scheduler.advance();
        let mut outcome = None;
        while let Some(fired) = self.scheduler.pop_due() {
            match fired.task {
                ScheduledTask::SessionTick => {
                    if let Some(result) = self.on_tick() {
                        outcome = Some(result);
                    }
                }
                ScheduledTask::TrackerPoll => {
                    let (tracker, mut ctx) = self.split();
                    let report = tracker.poll(&mut ctx);
                    debug!(
                        tick = fired.due,
                        transition = ?report.transition,
                        trail = ?report.trail_placed,
                        pruned = report.pruned,
                        "Possession poll"
                    );
                }
                ScheduledTask::TrailDecay { owner, handle } => {
                    self.tracker.on_trail_decay(&mut self.oracle, owner, handle);
                }
                ScheduledTask::VictoryReward { winner } => self.on_victory_reward(winner),
            }
        }
        outcome
    }

    fn on_tick(&mut self) -> Option<SessionOutcome> {
        if !self.session.phase.is_running() {
            return None;
        }
        if let Err(err) = self.session.clock.advance() {
            warn!(error = %err, "Session clock could not advance");
        }

        if self.session.clock.at_day_boundary() {
            let days_left = self.session.clock.days_left();
            if days_left > 0 && self.session.last_milestone_day != Some(days_left) {
                self.announce_milestone(days_left);
            }
        }

        if self.session.clock.expired() {
            self.cancel_session_timer();
            return Some(self.expire());
        }
        None
    }

    fn announce_milestone(&mut self, days_left: u64) {
        self.session.last_milestone_day = Some(days_left);
        self.sink
            .announce(&format!("Time remaining: {days_left} days"));
        if days_left <= self.config.warning_days {
            self.sink
                .announce(&format!("\u{26a0} {days_left} days until the race ends!"));
            self.sink.cue(PresentationCue::WarningTone);
        }
        if days_left == self.config.final_warning_days {
            self.sink
                .announce("\u{1f6a8} The race ends tomorrow! \u{1f6a8}");
            self.sink.cue(PresentationCue::FinalWarningTone);
        }
        debug!(days_left, "Milestone announced");
    }

    fn expire(&mut self) -> SessionOutcome {
        self.session.phase = SessionPhase::Ended;

        let outcome = match self.oracle.find_online_holder() {
            Some(winner) => {
                self.announce_victory(&winner);
                SessionOutcome::Victory(winner)
            }
            None => {
                self.announce_draw();
                SessionOutcome::Draw
            }
        };

        let (tracker, mut ctx) = self.split();
        tracker.stop_tracking(&mut ctx);

        info!(outcome = ?outcome, tick = self.scheduler.now(), "Race expired");
        self.last_outcome = Some(outcome.clone());
        outcome
    }

    fn announce_victory(&mut self, winner: &Participant) {
        self.sink.broadcast("");
        self.sink.announce(BANNER_RULE);
        self.sink
            .announce("=== \u{1f409} The Relic Race is over! \u{1f409} ===");
        self.sink
            .announce(&format!("\u{1f3c6} {} wins! \u{1f3c6}", winner.name));
        self.sink
            .announce("\u{1f432} A dragon rises to honour the champion! \u{1f432}");
        self.sink.announce(BANNER_RULE);
        self.sink.broadcast("");
        self.sink.cue(PresentationCue::VictoryFanfare);

        match self.oracle.current_location(winner.id) {
            Some(location) => {
                self.oracle.celebrate_winner(winner, location.position);
                self.scheduler.schedule_once(
                    self.config.reward_delay_ticks,
                    ScheduledTask::VictoryReward { winner: winner.id },
                );
            }
            None => warn!(winner = %winner.id, "Winner has no location; skipping celebration"),
        }
    }

    fn announce_draw(&mut self) {
        self.sink.broadcast("");
        self.sink.announce(BANNER_RULE);
        self.sink.announce("=== The Relic Race is over ===");
        self.sink.announce("\u{274c} Nobody is holding the relic!");
        self.sink.announce("\u{1f494} The race ends in a draw.");
        self.sink.announce(BANNER_RULE);
        self.sink.broadcast("");
    }

    fn on_victory_reward(&mut self, winner: ParticipantId) {
        if let Some(location) = self.oracle.current_location(winner) {
            self.oracle.reward_effect(location.position);
            debug!(winner = %winner, "Victory reward played");
        }
    }

    fn cancel_session_timer(&mut self) {
        if let Some(timer) = self.session_timer.take() {
            self.scheduler.cancel(timer);
        }
    }

    fn split(&mut self) -> (&mut PossessionTracker, TrackerContext<'_>) {
        (
            &mut self.tracker,
            TrackerContext {
                oracle: &mut self.oracle,
                sink: &mut self.sink,
                scheduler: &mut self.scheduler,
            },
        )
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Whether a race is running.
    pub const fn is_active(&self) -> bool {
        self.session.phase.is_running()
    }

    /// Days left in the running race; 0 when none is running.
    pub fn remaining_days(&self) -> u64 {
        if self.is_active() {
            self.session.clock.days_left()
        } else {
            0
        }
    }

    /// Ticks left in the running race; 0 when none is running.
    pub const fn remaining_ticks(&self) -> u64 {
        if self.is_active() {
            self.session.clock.remaining_ticks()
        } else {
            0
        }
    }

    /// One-line status report.
    pub fn status_text(&self) -> String {
        if !self.is_active() {
            return "No race is in progress.".to_owned();
        }
        format!(
            "Race in progress - time remaining: {} days {} hours",
            self.remaining_days(),
            self.session.clock.hours_left_in_day()
        )
    }

    /// Current phase.
    pub const fn phase(&self) -> SessionPhase {
        self.session.phase
    }

    /// The session countdown.
    pub const fn session(&self) -> &GameSession {
        &self.session
    }

    /// Outcome of the most recent expiry. Cleared by `start`; a forced stop
    /// leaves it empty.
    pub const fn last_outcome(&self) -> Option<&SessionOutcome> {
        self.last_outcome.as_ref()
    }

    /// The possession tracker.
    pub const fn tracker(&self) -> &PossessionTracker {
        &self.tracker
    }

    /// Current server tick.
    pub const fn now(&self) -> u64 {
        self.scheduler.now()
    }

    /// The world oracle.
    pub const fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Mutable access to the world oracle.
    pub const fn oracle_mut(&mut self) -> &mut O {
        &mut self.oracle
    }

    /// The notification sink.
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the notification sink.
    pub const fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }
}
