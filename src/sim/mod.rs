// Copyright (c) 2025 - Cowboy AI, Inc.
//! Reference Simulations
//!
//! Small stage graphs built on [`InputSource`](crate::input::InputSource)
//! that exercise the whole pipeline:
//!
//! - [`movement`]: WASD/arrow keys to a clamped player position
//! - [`scoreboard`]: space presses to score and level, with a bounded key
//!   history

pub mod movement;
pub mod scoreboard;

pub use movement::{direction_of, movement_deltas, player_positions, Player};
pub use scoreboard::{GameState, Scoreboard, POINTS_PER_PRESS};
