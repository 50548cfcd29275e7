// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for tickflow
//!
//! Deterministic input scripts shared by the integration tests. Every time
//! and speed is a fixed constant so traces are reproducible.

#![allow(dead_code)]

use tickflow::{InputScript, InputSnapshot, Key, MouseButton, MovementConfig, Vec2};

/// Movement speed used by the walking scenarios
pub const SPEED: f32 = 4.0;

/// Start position of the walking scenarios
pub const START: Vec2 = Vec2::new(100.0, 100.0);

/// Movement settings for the walking scenarios
pub fn movement_config() -> MovementConfig {
    MovementConfig {
        speed: SPEED,
        start: START,
        throttle: 1,
        bounds: None,
    }
}

/// `[down(W), down(W), down(D)]`, one sample per tick
pub fn wwd_snapshots() -> Vec<InputSnapshot> {
    vec![
        InputSnapshot::new().key_down(Key::char('w')),
        InputSnapshot::new().key_down(Key::char('w')),
        InputSnapshot::new().key_down(Key::char('d')),
    ]
}

/// Space pressed on every `every`-th of `frames` frames, starting with the first
pub fn space_presses(frames: usize, every: usize) -> Vec<InputSnapshot> {
    (0..frames)
        .map(|i| {
            if i % every.max(1) == 0 {
                InputSnapshot::new().key_pressed(Key::Space)
            } else {
                InputSnapshot::new()
            }
        })
        .collect()
}

/// A short click-and-drag with the left button
pub fn drag_snapshots() -> Vec<InputSnapshot> {
    vec![
        InputSnapshot::new().mouse_at(10.0, 10.0),
        InputSnapshot::new()
            .mouse_at(10.0, 10.0)
            .mouse_pressed(MouseButton::Left),
        InputSnapshot::new()
            .mouse_at(15.0, 12.0)
            .mouse_down(MouseButton::Left),
        InputSnapshot::new()
            .mouse_at(20.0, 14.0)
            .mouse_released(MouseButton::Left),
    ]
}

/// JSON form of a two-frame script with explicit times
pub const TIMED_SCRIPT_JSON: &str = r#"{
    "frames": [
        { "time": 0, "input": { "keys_down": [{ "Char": "D" }] } },
        { "time": 32, "input": { "keys_down": [{ "Char": "D" }] } }
    ]
}"#;

/// Script built from snapshots, times assigned by the backend
pub fn script(snapshots: Vec<InputSnapshot>) -> InputScript {
    InputScript::from_snapshots(snapshots)
}
