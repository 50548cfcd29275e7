// Copyright (c) 2025 - Cowboy AI, Inc.
//! Input Replay
//!
//! Replays a recorded input script through the movement and scoreboard
//! simulations and logs the resulting state every tick.
//!
//! ```text
//! input-replay [SCRIPT] [MOVEMENT_CONFIG]
//! ```
//!
//! `SCRIPT` defaults to `demos/walk.json`. Pipeline settings come from the
//! `TICKFLOW_*` environment variables.

use anyhow::{Context, Result};
use serde::Serialize;
use tickflow::sim::{GameState, Player, Scoreboard};
use tickflow::{
    InputScript, MovementConfig, Pipeline, PipelineConfig, PipelineResult, ScriptedInput, Store, Vec2,
};
use tracing::{debug, info};

const DEFAULT_SCRIPT: &str = "demos/walk.json";

/// What the replay shows after each tick
#[derive(Debug, Clone, Default, Serialize)]
struct Frame {
    position: Vec2,
    game: GameState,
}

fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let script_path = args.next().unwrap_or_else(|| DEFAULT_SCRIPT.to_string());
    let movement = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read movement config {}", path))?;
            MovementConfig::from_json_str(&json).context("Invalid movement config")?
        }
        None => MovementConfig::default(),
    };

    let config = PipelineConfig::from_env();
    info!("Configuration loaded:");
    info!("  - Time unit: {:?}", config.time_unit);
    info!("  - History capacity: {}", config.history_capacity);
    info!("  - Script: {}", script_path);

    let script = InputScript::from_json_file(&script_path)
        .with_context(|| format!("Failed to load input script {}", script_path))?;
    let mut backend = ScriptedInput::new(script, &config).context("Invalid input script")?;
    info!("Replaying {} frames", backend.remaining());

    let mut pipeline = Pipeline::new(config.clone());
    let player = Player::attach(pipeline.input(), &movement);
    let scoreboard = Scoreboard::attach(pipeline.input(), &config);

    let store = Store::new(Frame {
        position: player.position(),
        game: scoreboard.state(),
    });
    store.bind(&player.positions(), |frame, position| frame.position = position);
    store.bind(&scoreboard.state_behavior().changes(), |frame, game| frame.game = game);

    let mut render = |frame: &Frame| -> PipelineResult<()> {
        debug!(frame = %serde_json::to_string(frame)?, "Frame");
        info!(
            "x={:.1} y={:.1} score={} level={}",
            frame.position.x, frame.position.y, frame.game.score, frame.game.level
        );
        Ok(())
    };
    let summary = pipeline
        .run(&mut backend, &store, &mut render)
        .context("Replay failed")?;
    pipeline.shutdown();

    info!(
        "Replayed {} ticks, {} input events; recent keys: {:?}",
        summary.ticks,
        summary.events,
        scoreboard.recent_keys()
    );
    Ok(())
}
