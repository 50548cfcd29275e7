// Copyright (c) 2025 - Cowboy AI, Inc.
//! Score and level tracking
//!
//! Every space press reads the current game state and writes back the
//! awarded one. The level is derived from the score inside the same update,
//! so the state never feeds back into itself.
//!
//! ```text
//! key_pressed ─filter(Space)─snapshot(state)─map(award)─> state.set
//! state.map(level).distinct_changes ─> level ups
//! key_pressed ─history(capacity)─> recent keys
//! ```

use crate::config::PipelineConfig;
use crate::errors::report_unhandled;
use crate::frp::{Behavior, CompositeSubscription, Observer, Samplable, Signal, Stream, Time};
use crate::input::{InputSource, Key};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Score awarded per space press
pub const POINTS_PER_PRESS: u32 = 10;

/// Score needed per level
pub const POINTS_PER_LEVEL: u32 = 100;

/// Game state record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    /// Total score
    pub score: u32,
    /// Level, starting at 1
    pub level: u32,
    /// Player health
    pub health: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self {
            score: 0,
            level: 1,
            health: 100,
        }
    }
}

impl GameState {
    /// State after scoring `points`
    pub fn award(&self, points: u32) -> Self {
        let score = self.score.saturating_add(points);
        Self {
            score,
            level: score / POINTS_PER_LEVEL + 1,
            ..self.clone()
        }
    }
}

/// Score, level and recent key presses driven by the keyboard
#[derive(Debug)]
pub struct Scoreboard {
    state: Behavior<GameState>,
    levels: Stream<u32>,
    recent_keys: Behavior<Vec<Key>>,
    subscriptions: CompositeSubscription,
}

impl Scoreboard {
    /// Wire a scoreboard to the input's key presses
    ///
    /// `config.history_capacity` bounds the recent key list.
    pub fn attach(input: &InputSource, config: &PipelineConfig) -> Self {
        let state = Behavior::new(GameState::default());
        let subscriptions = CompositeSubscription::new();

        let awards = input
            .key_pressed()
            .filter(|key| *key == Key::Space)
            .snapshot(&state)
            .map(|(_, current)| current.award(POINTS_PER_PRESS));
        let target = state.clone();
        subscriptions.add(awards.subscribe_with(Observer::timed(move |time: Time, next: GameState| {
            if let Err(e) = target.set(time, next) {
                report_unhandled(&e);
            }
        })));

        let levels = state
            .map(|s| s.level)
            .distinct_changes()
            .inspect(|time, level| info!(time, new_level = *level, "Level up"));

        let recent_keys = input
            .key_pressed()
            .history(config.history_capacity)
            .hold(Vec::new());

        Self {
            state,
            levels,
            recent_keys,
            subscriptions,
        }
    }

    /// Current game state
    pub fn state(&self) -> GameState {
        self.state.sample()
    }

    /// Game state as a behavior, for rendering or further stages
    pub fn state_behavior(&self) -> &Behavior<GameState> {
        &self.state
    }

    /// Level, each time it changes
    pub fn levels(&self) -> Stream<u32> {
        self.levels.clone()
    }

    /// Most recent key presses, oldest first
    pub fn recent_keys(&self) -> Vec<Key> {
        self.recent_keys.sample()
    }

    /// Stop scoring and tracking keys
    pub fn detach(&self) {
        self.subscriptions.dispose();
        self.recent_keys.detach();
    }
}
