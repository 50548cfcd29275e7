// Copyright (c) 2025 - Cowboy AI, Inc.
//! Keyboard movement
//!
//! ```text
//! key_down ─filter(movement key)─map(direction × speed)─throttle_first─scan(start)─> position
//! ```
//!
//! Keys are level-triggered, so a held key keeps moving the player every
//! tick the throttle lets through.

use crate::config::MovementConfig;
use crate::frp::{Behavior, Samplable, Signal, Stream, Subscription};
use crate::input::{InputSource, Key, Vec2};
use tracing::debug;

/// Unit direction for a movement key; screen `y` grows downwards
pub fn direction_of(key: Key) -> Option<Vec2> {
    match key {
        Key::Char('W') | Key::Up => Some(Vec2::new(0.0, -1.0)),
        Key::Char('S') | Key::Down => Some(Vec2::new(0.0, 1.0)),
        Key::Char('A') | Key::Left => Some(Vec2::new(-1.0, 0.0)),
        Key::Char('D') | Key::Right => Some(Vec2::new(1.0, 0.0)),
        _ => None,
    }
}

/// Movement deltas, at most one per throttle interval
pub fn movement_deltas(keys: &Stream<Key>, config: &MovementConfig) -> Stream<Vec2> {
    let speed = config.speed;
    keys.filter(|key| direction_of(*key).is_some())
        .map(move |key| direction_of(key).unwrap_or(Vec2::ZERO) * speed)
        .throttle_first(config.throttle)
}

/// Accumulated player position, starting at `config.start`
///
/// With bounds configured, every step is clamped into them.
pub fn player_positions(keys: &Stream<Key>, config: &MovementConfig) -> Stream<Vec2> {
    let bounds = config.bounds;
    movement_deltas(keys, config).scan(config.start, move |position, delta| {
        let next = position + delta;
        match bounds {
            Some(b) => next.clamp(b.min, b.max),
            None => next,
        }
    })
}

/// Player whose position follows the held movement keys
#[derive(Debug)]
pub struct Player {
    position: Behavior<Vec2>,
    positions: Stream<Vec2>,
}

impl Player {
    /// Wire a player to the input's held keys
    pub fn attach(input: &InputSource, config: &MovementConfig) -> Self {
        debug!(speed = config.speed, throttle = config.throttle, "Attaching player");
        let positions = player_positions(&input.key_down(), config);
        let position = positions.hold(config.start);
        Self { position, positions }
    }

    /// Current position
    pub fn position(&self) -> Vec2 {
        self.position.sample()
    }

    /// Every position the player moves to
    pub fn positions(&self) -> Stream<Vec2> {
        self.positions.clone()
    }

    /// Stop moving; the last position stays readable
    pub fn detach(&self) {
        self.position.detach();
    }

    /// Subscribe to position changes
    pub fn on_move<F>(&self, f: F) -> Subscription
    where
        F: FnMut(Vec2) + 'static,
    {
        self.positions.subscribe(f)
    }
}
