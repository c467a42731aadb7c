//! Relic Race server binary.
//!
//! Wires the race core to an in-memory world populated by wandering
//! participants and runs the server loop until stopped.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `relic-config.yaml`
//! 2. Initialize structured logging (tracing)
//! 3. Build the simulated world and spawn participants
//! 4. Create the race controller
//! 5. Start a race if `server.auto_start` is set
//! 6. Start the console reader and the Ctrl-C handler
//! 7. Run the server loop
//! 8. Shut the controller down and log the result

mod console;
mod error;
mod spawner;
mod wander;

use std::path::Path;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use relic_core::config::{GameConfig, LoggingConfig};
use relic_core::control::ControlState;
use relic_core::gateway::Gateway;
use relic_core::notify::TracingSink;
use relic_core::runner;
use relic_core::session::GameSessionController;
use relic_world::{DaylightCycle, SimulatedWorld};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::spawner::SpawnerConfig;
use crate::wander::Wanderers;

const CONFIG_PATH: &str = "relic-config.yaml";

/// Application entry point for the race server.
///
/// # Errors
///
/// Returns an error if any initialization step fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging);
    info!("relic-engine starting");
    info!(
        total_days = config.session.total_days,
        ticks_per_day = config.session.ticks_per_day,
        poll_interval_ticks = config.tracker.poll_interval_ticks,
        tick_interval_ms = config.server.tick_interval_ms,
        "Configuration loaded"
    );

    // 3. Build the simulated world.
    let daylight = DaylightCycle::new(
        config.world.day_length_ticks,
        config.world.night_start,
        config.world.night_end,
    )?;
    let mut world = SimulatedWorld::new(daylight, config.world.holding_capacity);

    let spawner_config = load_spawner_config()?;
    let seed = spawner_config.seed.unwrap_or_else(rand::random);
    let mut rng = StdRng::seed_from_u64(seed);
    let spawned = spawner::spawn_participants(&spawner_config, &mut world, &mut rng)?;
    info!(
        participants = spawned.participants.len(),
        relic_holder = %spawned.relic_holder,
        seed,
        "Participants spawned"
    );

    // 4. Create the race controller.
    let mut controller = GameSessionController::new(&config, world, TracingSink)
        .map_err(EngineError::from)?;
    let gateway = Gateway::default();

    // 5. Auto start.
    if config.server.auto_start {
        controller.start();
    }

    // 6. Console reader and Ctrl-C.
    let control = Arc::new(ControlState::from_config(&config.server));
    let (tx, mut rx) = mpsc::channel(config.server.command_buffer.max(1));
    let _console = console::spawn_console(tx, Arc::clone(&control));
    {
        let control = Arc::clone(&control);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Ctrl-C received, stopping");
                    control.request_stop();
                }
                Err(err) => warn!(error = %err, "Could not listen for Ctrl-C"),
            }
        });
    }

    // 7. Run the server loop.
    let mut hook = Wanderers::new(rng, spawned.participants, spawner_config, gateway.clone());
    let result = runner::run_server(&mut controller, &gateway, &mut rx, &control, &mut hook).await;

    // 8. Shut down.
    controller.shutdown();
    runner::log_server_end(&result, &control);
    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        "relic-engine shutdown complete"
    );

    Ok(())
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_logging(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    if logging.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }
}

/// Load the race configuration from `relic-config.yaml`, falling back to
/// defaults when the file is missing.
fn load_config() -> Result<GameConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if config_path.exists() {
        Ok(GameConfig::from_file(config_path)?)
    } else {
        let mut config = GameConfig::default();
        config.apply_env_overrides();
        Ok(config)
    }
}

/// Load the `participants` section of `relic-config.yaml`.
fn load_spawner_config() -> Result<SpawnerConfig, EngineError> {
    let config_path = Path::new(CONFIG_PATH);
    if !config_path.exists() {
        return Ok(SpawnerConfig::default());
    }
    let contents = std::fs::read_to_string(config_path).map_err(|e| EngineError::Spawner {
        message: format!("failed to read config file: {e}"),
    })?;
    let raw: serde_yml::Value = serde_yml::from_str(&contents).map_err(|e| EngineError::Spawner {
        message: format!("failed to parse config YAML: {e}"),
    })?;
    match raw.get("participants") {
        Some(section) => serde_yml::from_value(section.clone()).map_err(|e| EngineError::Spawner {
            message: format!("failed to parse participants config: {e}"),
        }),
        None => Ok(SpawnerConfig::default()),
    }
}
