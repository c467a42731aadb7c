//! Server loop driving the race in real time.
//!
//! [`run_server`] is the top-level async function of a running server. Each
//! iteration it:
//!
//! - **Honours control flags**: waits while paused, returns on a stop request
//! - **Answers the gateway**: drains queued [`GatewayRequest`]s and replies
//!   on their oneshot channel
//! - **Moves the world**: lets the [`ServerTickHook`] update the world
//! - **Advances the race**: one [`GameSessionController::advance`] call
//! - **Sleeps**: for the (runtime-adjustable) tick interval
//!
//! All controller access happens on the task running the loop, so the
//! controller itself needs no locking.

use std::sync::Arc;

use relic_types::SessionOutcome;
use relic_world::WorldOracle;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::control::{ControlState, ServerEndReason};
use crate::gateway::{CommandSender, Gateway};
use crate::notify::NotificationSink;
use crate::session::GameSessionController;

/// A command queued for the server loop.
#[derive(Debug)]
pub struct GatewayRequest {
    /// Who issued the command.
    pub sender: CommandSender,
    /// Command arguments, subcommand first.
    pub args: Vec<String>,
    /// Where the reply lines go.
    pub reply: oneshot::Sender<Vec<String>>,
}

impl GatewayRequest {
    /// Build a request and the receiver its reply arrives on.
    pub fn new(
        sender: CommandSender,
        args: Vec<String>,
    ) -> (Self, oneshot::Receiver<Vec<String>>) {
        let (reply, rx) = oneshot::channel();
        (
            Self {
                sender,
                args,
                reply,
            },
            rx,
        )
    }
}

/// Result of a server run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerResult {
    /// Why the loop returned.
    pub end_reason: ServerEndReason,
    /// Number of server ticks executed.
    pub total_ticks: u64,
    /// Outcomes of every race that expired during the run, in order.
    pub outcomes: Vec<SessionOutcome>,
}

/// Called once per server tick, before the race advances.
///
/// The engine uses this to move its simulated world; hosts with a real
/// world have nothing to do here.
pub trait ServerTickHook<O, S> {
    /// Called with the tick about to run.
    fn before_tick(&mut self, tick: u64, controller: &mut GameSessionController<O, S>);
}

/// A hook that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpHook;

impl<O, S> ServerTickHook<O, S> for NoOpHook {
    fn before_tick(&mut self, _tick: u64, _controller: &mut GameSessionController<O, S>) {}
}

/// Run the server loop until a stop is requested or the tick limit is hit.
pub async fn run_server<O: WorldOracle, S: NotificationSink>(
    controller: &mut GameSessionController<O, S>,
    gateway: &Gateway,
    requests: &mut mpsc::Receiver<GatewayRequest>,
    control: &Arc<ControlState>,
    hook: &mut dyn ServerTickHook<O, S>,
) -> ServerResult {
    let mut total_ticks: u64 = 0;
    let mut outcomes = Vec::new();

    info!(
        max_ticks = control.max_ticks(),
        tick_interval_ms = control.tick_interval_ms(),
        race_active = controller.is_active(),
        "Server loop starting"
    );

    loop {
        // --- Pause ---
        if control.is_paused() {
            info!("Server paused, waiting for resume...");
            control.wait_if_paused().await;
            info!("Server resumed");
        }

        // --- Stop ---
        if control.is_stop_requested() {
            info!("Stop requested");
            return finish(control, ServerEndReason::OperatorStop, total_ticks, outcomes).await;
        }

        // --- Gateway ---
        drain_requests(controller, gateway, requests);

        // --- Tick ---
        let tick = controller.now().saturating_add(1);
        hook.before_tick(tick, controller);
        if let Some(outcome) = controller.advance() {
            info!(tick, outcome = ?outcome, "Race decided");
            outcomes.push(outcome);
        }
        total_ticks = total_ticks.saturating_add(1);

        // --- Limit ---
        if control.tick_limit_reached(total_ticks) {
            info!(total_ticks, max_ticks = control.max_ticks(), "Tick limit reached");
            return finish(control, ServerEndReason::MaxTicksReached, total_ticks, outcomes).await;
        }

        // --- Sleep ---
        let interval_ms = control.tick_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        }
    }
}

fn drain_requests<O: WorldOracle, S: NotificationSink>(
    controller: &mut GameSessionController<O, S>,
    gateway: &Gateway,
    requests: &mut mpsc::Receiver<GatewayRequest>,
) {
    while let Ok(request) = requests.try_recv() {
        let args: Vec<&str> = request.args.iter().map(String::as_str).collect();
        let replies = gateway.handle_command(controller, &request.sender, &args);
        if request.reply.send(replies).is_err() {
            debug!(sender = request.sender.name, "Command sender went away before the reply");
        }
    }
}

async fn finish(
    control: &ControlState,
    reason: ServerEndReason,
    total_ticks: u64,
    outcomes: Vec<SessionOutcome>,
) -> ServerResult {
    control.set_end_reason(reason).await;
    ServerResult {
        end_reason: reason,
        total_ticks,
        outcomes,
    }
}

/// Log the end of a server run.
pub fn log_server_end(result: &ServerResult, control: &ControlState) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        races_decided = result.outcomes.len(),
        elapsed_seconds = control.elapsed_seconds(),
        "Server loop ended"
    );
    if result.total_ticks == 0 {
        warn!("Server ended before running a single tick");
    }
}
