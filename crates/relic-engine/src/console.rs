//! Console command reader.
//!
//! Reads commands from stdin, one per line. Server controls are handled
//! here directly; everything else is forwarded to the gateway as a race
//! command issued by the console (which holds the admin permission).
//!
//! | Line            | Effect |
//! |-----------------|--------|
//! | `pause`         | Pause the server loop |
//! | `resume`        | Resume the server loop |
//! | `speed <ms>`    | Change the tick interval |
//! | `quit` / `exit` | Stop the server |
//! | anything else   | Race command, e.g. `start`, `stop`, `status` |

use std::sync::Arc;

use relic_core::control::ControlState;
use relic_core::gateway::CommandSender;
use relic_core::runner::GatewayRequest;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Name the console uses when issuing race commands.
pub const CONSOLE_SENDER: &str = "console";

/// What one console line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleLine {
    /// Nothing to do.
    Empty,
    /// Pause the loop.
    Pause,
    /// Resume the loop.
    Resume,
    /// Change the tick interval.
    Speed(u64),
    /// Stop the server.
    Quit,
    /// Forward to the gateway.
    Race(Vec<String>),
    /// Malformed server control.
    Invalid(String),
}

impl ConsoleLine {
    /// Interpret one line of input.
    pub fn parse(line: &str) -> Self {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => Self::Empty,
            ["pause"] => Self::Pause,
            ["resume"] => Self::Resume,
            ["speed", ms] => ms
                .parse()
                .map_or_else(|_| Self::Invalid(format!("not a number: {ms}")), Self::Speed),
            ["speed", ..] => Self::Invalid("usage: speed <ms>".to_owned()),
            ["quit" | "exit"] => Self::Quit,
            _ => Self::Race(words.iter().map(|w| (*w).to_owned()).collect()),
        }
    }
}

/// Spawn the console reader.
pub fn spawn_console(
    requests: mpsc::Sender<GatewayRequest>,
    control: Arc<ControlState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    warn!(error = %err, "Console read failed");
                    break;
                }
            };
            match ConsoleLine::parse(&line) {
                ConsoleLine::Empty => {}
                ConsoleLine::Pause => control.pause(),
                ConsoleLine::Resume => control.resume(),
                ConsoleLine::Speed(ms) => match control.set_tick_interval_ms(ms) {
                    Some(prev) => info!(previous = prev, current = ms, "Tick interval changed"),
                    None => warn!(requested = ms, "Tick interval rejected"),
                },
                ConsoleLine::Quit => {
                    control.request_stop();
                    break;
                }
                ConsoleLine::Invalid(reason) => warn!(reason, "Console input ignored"),
                ConsoleLine::Race(args) => {
                    let (request, reply) =
                        GatewayRequest::new(CommandSender::admin(CONSOLE_SENDER), args);
                    if requests.send(request).await.is_err() {
                        break;
                    }
                    if let Ok(replies) = reply.await {
                        for reply in replies {
                            info!(target: "relic::console", "{reply}");
                        }
                    }
                }
            }
        }
        info!("Console reader stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_server_controls() {
        assert_eq!(ConsoleLine::parse("   "), ConsoleLine::Empty);
        assert_eq!(ConsoleLine::parse("pause"), ConsoleLine::Pause);
        assert_eq!(ConsoleLine::parse("resume"), ConsoleLine::Resume);
        assert_eq!(ConsoleLine::parse("speed 200"), ConsoleLine::Speed(200));
        assert_eq!(ConsoleLine::parse("exit"), ConsoleLine::Quit);
        assert!(matches!(ConsoleLine::parse("speed fast"), ConsoleLine::Invalid(_)));
        assert!(matches!(ConsoleLine::parse("speed"), ConsoleLine::Invalid(_)));
    }

    #[test]
    fn everything_else_is_a_race_command() {
        assert_eq!(
            ConsoleLine::parse("status now"),
            ConsoleLine::Race(vec!["status".to_owned(), "now".to_owned()])
        );
    }
}
