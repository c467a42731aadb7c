//! Command surface and world-event guards.
//!
//! The gateway is the only way an outside actor reaches the race
//! controller. It has two halves:
//!
//! # Commands
//!
//! | Command  | Effect |
//! |----------|--------|
//! | `start`  | Start a race (refused if one is running) |
//! | `stop`   | Force-stop the running race |
//! | `status` | Report the remaining time |
//!
//! Every command requires the [`ADMIN_PERMISSION`]; an unauthorized sender
//! gets a denial reply and the controller is never touched.
//!
//! # Event guards
//!
//! While a race runs, world events that would take the relic out of play
//! or damage a beacon are vetoed with an [`EventVerdict`]. Outside a race
//! every guard lets the event through untouched.

use std::collections::BTreeSet;
use std::str::FromStr;

use relic_types::{BlockPos, ParticipantId};
use relic_world::{WorldError, WorldOracle};
use tracing::{debug, info, warn};

use crate::notify::NotificationSink;
use crate::session::GameSessionController;

/// Permission required for every race command.
pub const ADMIN_PERMISSION: &str = "relic.admin";

/// Default label the command is registered under.
pub const DEFAULT_COMMAND_LABEL: &str = "relic";

/// Error returned when a subcommand is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown subcommand: {input}")]
pub struct UnknownCommand {
    /// The text that failed to parse.
    pub input: String,
}

/// A race subcommand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Start a race.
    Start,
    /// Force-stop the running race.
    Stop,
    /// Report the remaining time.
    Status,
}

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "status" => Ok(Self::Status),
            _ => Err(UnknownCommand {
                input: s.to_owned(),
            }),
        }
    }
}

/// Whoever issued a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandSender {
    /// Display name, used for logging.
    pub name: String,
    /// Permissions granted to the sender.
    pub permissions: BTreeSet<String>,
}

impl CommandSender {
    /// A sender without any permission.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: BTreeSet::new(),
        }
    }

    /// A sender holding the admin permission.
    pub fn admin(name: impl Into<String>) -> Self {
        Self::new(name).with_permission(ADMIN_PERMISSION)
    }

    /// Grant one more permission.
    #[must_use]
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Whether the sender holds `permission`.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

/// Decision on one world event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventVerdict {
    /// Whether the event must be cancelled.
    pub cancel: bool,
    /// Messages for the participant that triggered the event.
    pub replies: Vec<String>,
}

impl EventVerdict {
    /// Let the event through silently.
    pub const fn allow() -> Self {
        Self {
            cancel: false,
            replies: Vec::new(),
        }
    }

    /// Cancel the event and tell the participant why.
    pub fn deny(reply: impl Into<String>) -> Self {
        Self {
            cancel: true,
            replies: vec![reply.into()],
        }
    }
}

/// Entry point for commands and world events.
#[derive(Debug, Clone)]
pub struct Gateway {
    label: String,
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_LABEL)
    }
}

impl Gateway {
    /// Create a gateway whose usage lines refer to `/<label>`.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Command label.
    pub fn label(&self) -> &str {
        &self.label
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Run one command and return the reply lines for the sender.
    pub fn handle_command<O: WorldOracle, S: NotificationSink>(
        &self,
        controller: &mut GameSessionController<O, S>,
        sender: &CommandSender,
        args: &[&str],
    ) -> Vec<String> {
        if !sender.has_permission(ADMIN_PERMISSION) {
            info!(sender = sender.name, "Race command denied");
            return vec!["You do not have permission to run this command!".to_owned()];
        }

        let Some(first) = args.first() else {
            return self.usage();
        };

        let command = match first.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                debug!(sender = sender.name, error = %err, "Unknown race command");
                return vec![format!("Usage: /{} <start|stop|status>", self.label)];
            }
        };

        info!(sender = sender.name, command = ?command, "Race command");
        match command {
            Command::Start => {
                if controller.start() {
                    vec!["You started the Relic Race!".to_owned()]
                } else {
                    vec!["A race is already in progress!".to_owned()]
                }
            }
            Command::Stop => {
                if controller.stop() {
                    vec!["You stopped the Relic Race!".to_owned()]
                } else {
                    vec!["No race is in progress!".to_owned()]
                }
            }
            Command::Status => vec![controller.status_text()],
        }
    }

    fn usage(&self) -> Vec<String> {
        vec![
            "Usage:".to_owned(),
            format!("/{} start - start the race", self.label),
            format!("/{} stop - stop the race", self.label),
            format!("/{} status - show the remaining time", self.label),
        ]
    }

    // -----------------------------------------------------------------------
    // Event guards
    // -----------------------------------------------------------------------

    /// A participant clicked the relic block. The relic goes straight into
    /// their holding area, or stays put if the area is full.
    pub fn on_relic_interact<O: WorldOracle, S: NotificationSink>(
        &self,
        controller: &mut GameSessionController<O, S>,
        participant: ParticipantId,
    ) -> EventVerdict {
        if !controller.is_active() {
            return EventVerdict::allow();
        }
        match controller
            .oracle_mut()
            .move_relic_into_holding_area(participant)
        {
            Ok(()) => {
                debug!(participant = %participant, "Relic moved into holding area");
                EventVerdict::deny("You took the relic into your inventory!")
            }
            Err(WorldError::HoldingAreaFull { capacity, .. }) => {
                debug!(participant = %participant, capacity, "Holding area full");
                EventVerdict::deny("Your inventory is full. You cannot take the relic!")
            }
            Err(WorldError::RelicNotInWorld) => {
                debug!(participant = %participant, "No resting relic to take");
                EventVerdict {
                    cancel: true,
                    replies: Vec::new(),
                }
            }
            Err(err) => {
                warn!(participant = %participant, error = %err, "Relic interaction failed");
                EventVerdict {
                    cancel: true,
                    replies: Vec::new(),
                }
            }
        }
    }

    /// A participant tried to place the relic as a block.
    pub fn on_relic_place<O: WorldOracle, S: NotificationSink>(
        &self,
        controller: &GameSessionController<O, S>,
    ) -> EventVerdict {
        if !controller.is_active() {
            return EventVerdict::allow();
        }
        EventVerdict::deny("The relic cannot be placed!")
    }

    /// A participant tried to throw the relic away.
    pub fn on_relic_drop<O: WorldOracle, S: NotificationSink>(
        &self,
        controller: &GameSessionController<O, S>,
    ) -> EventVerdict {
        if !controller.is_active() {
            return EventVerdict::allow();
        }
        EventVerdict::deny("The relic cannot be thrown away!")
    }

    /// A participant tried to break a block.
    pub fn on_block_break<O: WorldOracle, S: NotificationSink>(
        &self,
        controller: &GameSessionController<O, S>,
        pos: BlockPos,
    ) -> EventVerdict {
        if controller.is_active() && controller.tracker().is_beacon_block(pos) {
            return EventVerdict::deny("Beacon blocks cannot be broken!");
        }
        EventVerdict::allow()
    }

    /// The relic appeared loose in the world (dropped or spilled). During a
    /// race it is highlighted so everyone can find it; the event itself
    /// always goes through.
    pub fn on_relic_spawned<O: WorldOracle, S: NotificationSink>(
        &self,
        controller: &mut GameSessionController<O, S>,
        at: BlockPos,
    ) -> EventVerdict {
        if controller.is_active() {
            controller.oracle_mut().highlight_loose_relic(at);
            debug!(x = at.x, y = at.y, z = at.z, "Loose relic highlighted");
        }
        EventVerdict::allow()
    }

    /// A participant picked up the relic from the ground.
    pub fn on_relic_pickup<O: WorldOracle, S: NotificationSink>(
        &self,
        controller: &GameSessionController<O, S>,
    ) -> EventVerdict {
        if !controller.is_active() {
            return EventVerdict::allow();
        }
        EventVerdict {
            cancel: false,
            replies: vec![
                "\u{1f95a} Relic acquired! \u{1f95a}".to_owned(),
                "You are in first place!".to_owned(),
            ],
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use relic_types::{Location, Point};
    use relic_world::{BlockKind, SimulatedWorld};

    use super::*;
    use crate::config::GameConfig;
    use crate::notify::RecordingSink;

    type Controller = GameSessionController<SimulatedWorld, RecordingSink>;

    fn controller() -> Controller {
        GameSessionController::new(
            &GameConfig::default(),
            SimulatedWorld::default(),
            RecordingSink::new(),
        )
        .unwrap()
    }

    fn spawn() -> Location {
        Location::new(Point::new(0.5, 70.0, 0.5), 0.0)
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("START".parse::<Command>(), Ok(Command::Start));
        assert_eq!("Stop".parse::<Command>(), Ok(Command::Stop));
        assert_eq!("status".parse::<Command>(), Ok(Command::Status));
        assert!("reset".parse::<Command>().is_err());
    }

    #[test]
    fn unauthorized_sender_never_reaches_the_controller() {
        let gateway = Gateway::default();
        let mut c = controller();
        let guest = CommandSender::new("guest").with_permission("relic.player");

        let replies = gateway.handle_command(&mut c, &guest, &["start"]);
        assert_eq!(replies.len(), 1);
        assert!(replies.first().unwrap().contains("permission"));
        assert!(!c.is_active());
        assert!(c.sink().notices().is_empty());
    }

    #[test]
    fn no_arguments_prints_usage() {
        let gateway = Gateway::default();
        let mut c = controller();
        let replies = gateway.handle_command(&mut c, &CommandSender::admin("op"), &[]);
        assert_eq!(replies.len(), 4);
        assert!(replies.iter().skip(1).all(|l| l.starts_with("/relic ")));
    }

    #[test]
    fn unknown_subcommand_prints_one_line_usage() {
        let gateway = Gateway::new("race");
        let mut c = controller();
        let replies = gateway.handle_command(&mut c, &CommandSender::admin("op"), &["jump"]);
        assert_eq!(replies, vec!["Usage: /race <start|stop|status>".to_owned()]);
    }

    #[test]
    fn start_stop_status_round() {
        let gateway = Gateway::default();
        let mut c = controller();
        let op = CommandSender::admin("op");

        assert_eq!(
            gateway.handle_command(&mut c, &op, &["status"]),
            vec!["No race is in progress.".to_owned()]
        );
        assert_eq!(
            gateway.handle_command(&mut c, &op, &["stop"]),
            vec!["No race is in progress!".to_owned()]
        );
        assert_eq!(
            gateway.handle_command(&mut c, &op, &["start"]),
            vec!["You started the Relic Race!".to_owned()]
        );
        assert_eq!(
            gateway.handle_command(&mut c, &op, &["start"]),
            vec!["A race is already in progress!".to_owned()]
        );
        let status = gateway.handle_command(&mut c, &op, &["status"]);
        assert!(status.first().unwrap().contains("100 days"));
        assert_eq!(
            gateway.handle_command(&mut c, &op, &["stop"]),
            vec!["You stopped the Relic Race!".to_owned()]
        );
        assert!(!c.is_active());
    }

    #[test]
    fn guards_are_inert_outside_a_race() {
        let gateway = Gateway::default();
        let mut c = controller();
        let a = c.oracle_mut().join("Alpha", spawn());

        assert_eq!(gateway.on_relic_interact(&mut c, a), EventVerdict::allow());
        assert_eq!(gateway.on_relic_place(&c), EventVerdict::allow());
        assert_eq!(gateway.on_relic_drop(&c), EventVerdict::allow());
        assert_eq!(gateway.on_relic_pickup(&c), EventVerdict::allow());
        assert!(!c.oracle().holds_relic(a));
    }

    #[test]
    fn interacting_moves_relic_into_holding_area() {
        let gateway = Gateway::default();
        let mut c = controller();
        let a = c.oracle_mut().join("Alpha", spawn());
        let relic_at = BlockPos::new(3, 64, 3);
        c.oracle_mut().place_relic_block(relic_at);
        c.start();

        let verdict = gateway.on_relic_interact(&mut c, a);
        assert!(verdict.cancel);
        assert!(verdict.replies.first().unwrap().contains("inventory"));
        assert!(c.oracle().holds_relic(a));
        assert_eq!(c.oracle().block_at(relic_at), None);
    }

    #[test]
    fn full_holding_area_keeps_relic_in_world() {
        let gateway = Gateway::default();
        let mut c = controller();
        let a = c.oracle_mut().join("Alpha", spawn());
        let relic_at = BlockPos::new(3, 64, 3);
        c.oracle_mut().place_relic_block(relic_at);
        c.oracle_mut().fill_holding_area(a).unwrap();
        c.start();

        let verdict = gateway.on_relic_interact(&mut c, a);
        assert!(verdict.cancel);
        assert!(verdict.replies.first().unwrap().contains("full"));
        assert!(!c.oracle().holds_relic(a));
        assert_eq!(c.oracle().block_at(relic_at), Some(BlockKind::Relic));
    }

    #[test]
    fn interacting_while_someone_holds_the_relic_changes_nothing() {
        let gateway = Gateway::default();
        let mut c = controller();
        let a = c.oracle_mut().join("Alpha", spawn());
        let b = c.oracle_mut().join("Bravo", spawn());
        c.oracle_mut().give_relic(a).unwrap();
        c.start();

        let verdict = gateway.on_relic_interact(&mut c, b);
        assert!(verdict.cancel);
        assert!(verdict.replies.is_empty());
        assert!(c.oracle().holds_relic(a));
        assert!(!c.oracle().holds_relic(b));
    }

    #[test]
    fn loose_relic_glows_only_during_a_race() {
        let gateway = Gateway::default();
        let mut c = controller();
        let at = BlockPos::new(2, 64, -4);

        assert_eq!(gateway.on_relic_spawned(&mut c, at), EventVerdict::allow());
        assert!(c.oracle().effects().is_empty());

        c.start();
        assert_eq!(gateway.on_relic_spawned(&mut c, at), EventVerdict::allow());
        assert_eq!(
            c.oracle().effects(),
            &[relic_world::WorldEffect::RelicHighlighted { at }]
        );
    }

    #[test]
    fn place_and_drop_are_cancelled_during_a_race() {
        let gateway = Gateway::default();
        let mut c = controller();
        c.start();
        assert!(gateway.on_relic_place(&c).cancel);
        assert!(gateway.on_relic_drop(&c).cancel);
        let pickup = gateway.on_relic_pickup(&c);
        assert!(!pickup.cancel);
        assert_eq!(pickup.replies.len(), 2);
    }

    #[test]
    fn beacon_blocks_cannot_be_broken() {
        let gateway = Gateway::default();
        let mut c = controller();
        let a = c.oracle_mut().join("Alpha", spawn());
        c.oracle_mut().give_relic(a).unwrap();
        c.start();
        let _ = c.advance();
        c.oracle_mut().take_relic(a).unwrap();
        for _ in 0..20 {
            let _ = c.advance();
        }
        assert_eq!(c.tracker().beacons().len(), 1);

        assert!(gateway.on_block_break(&c, BlockPos::new(0, 70, 0)).cancel);
        assert!(gateway.on_block_break(&c, BlockPos::new(-1, 69, 1)).cancel);
        assert!(!gateway.on_block_break(&c, BlockPos::new(5, 70, 5)).cancel);

        c.stop();
        assert!(!gateway.on_block_break(&c, BlockPos::new(0, 70, 0)).cancel);
    }
}
