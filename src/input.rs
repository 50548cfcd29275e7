// Copyright (c) 2025 - Cowboy AI, Inc.
//! Input Sampling
//!
//! Turns a polled snapshot of keyboard and mouse state into typed input
//! events, once per tick.
//!
//! # Edge vs Level
//!
//! | Event | Trigger | Emitted |
//! |---|---|---|
//! | `KeyDown` | level | every tick the key is held |
//! | `KeyPressed` / `KeyReleased` | edge | once per transition |
//! | `MouseMoved` | edge | when the position differs from the last sample |
//! | `MouseClicked` / `MouseReleased` | edge | once per transition |
//! | `MouseHeld` | level | every tick the button is held |
//!
//! Level-triggered events re-emit while held so that held keys produce
//! continuous movement.
//!
//! # External Collaborator
//!
//! The window/render library is reached only through [`InputBackend`]:
//! `now()` and `poll_input()` once per tick. [`ScriptedInput`] replays a
//! recorded script and stands in for a real window in tests and the
//! `input-replay` binary.

use crate::config::PipelineConfig;
use crate::errors::{PipelineError, PipelineResult};
use crate::frp::{Stream, Subject, Time};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub};
use std::path::Path;
use tracing::{debug, trace};

/// Keyboard key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Key {
    /// Letter or digit key, stored upper-case
    Char(char),
    /// Space bar
    Space,
    /// Enter / return
    Enter,
    /// Escape
    Escape,
    /// Tab
    Tab,
    /// Arrow up
    Up,
    /// Arrow down
    Down,
    /// Arrow left
    Left,
    /// Arrow right
    Right,
    /// Any other key, by backend key code
    Code(u32),
}

impl Key {
    /// Letter or digit key; letters are normalized to upper case
    pub fn char(c: char) -> Self {
        Key::Char(c.to_ascii_uppercase())
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Char(c) => write!(f, "{}", c),
            Key::Code(code) => write!(f, "#{}", code),
            other => write!(f, "{:?}", other),
        }
    }
}

/// Mouse button
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    /// Primary button
    Left,
    /// Secondary button
    Right,
    /// Wheel button
    Middle,
}

/// 2D vector in screen space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    /// Horizontal component
    pub x: f32,
    /// Vertical component (grows downwards)
    pub y: f32,
}

impl Vec2 {
    /// The zero vector
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    /// Create a vector
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean length
    pub fn length(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Clamp each component into `[min, max]`
    pub fn clamp(self, min: Vec2, max: Vec2) -> Self {
        Self {
            x: self.x.clamp(min.x, max.x),
            y: self.y.clamp(min.y, max.y),
        }
    }
}

impl Add for Vec2 {
    type Output = Vec2;

    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;

    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;

    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

/// State of every input device at one poll
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct InputSnapshot {
    /// Keys currently held
    pub keys_down: BTreeSet<Key>,
    /// Keys that went down since the previous poll
    pub keys_pressed: BTreeSet<Key>,
    /// Keys that went up since the previous poll
    pub keys_released: BTreeSet<Key>,
    /// Cursor position
    pub mouse_position: Vec2,
    /// Buttons currently held
    pub mouse_down: BTreeSet<MouseButton>,
    /// Buttons that went down since the previous poll
    pub mouse_pressed: BTreeSet<MouseButton>,
    /// Buttons that went up since the previous poll
    pub mouse_released: BTreeSet<MouseButton>,
}

impl InputSnapshot {
    /// Snapshot with no input at all
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a held key
    pub fn key_down(mut self, key: Key) -> Self {
        self.keys_down.insert(key);
        self
    }

    /// Add a key press edge; the key is also held
    pub fn key_pressed(mut self, key: Key) -> Self {
        self.keys_pressed.insert(key);
        self.keys_down.insert(key);
        self
    }

    /// Add a key release edge
    pub fn key_released(mut self, key: Key) -> Self {
        self.keys_released.insert(key);
        self
    }

    /// Set the cursor position
    pub fn mouse_at(mut self, x: f32, y: f32) -> Self {
        self.mouse_position = Vec2::new(x, y);
        self
    }

    /// Add a button press edge; the button is also held
    pub fn mouse_pressed(mut self, button: MouseButton) -> Self {
        self.mouse_pressed.insert(button);
        self.mouse_down.insert(button);
        self
    }

    /// Add a held button
    pub fn mouse_down(mut self, button: MouseButton) -> Self {
        self.mouse_down.insert(button);
        self
    }

    /// Add a button release edge
    pub fn mouse_released(mut self, button: MouseButton) -> Self {
        self.mouse_released.insert(button);
        self
    }
}

/// Discriminant of [`InputEvent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// Key held
    KeyDown,
    /// Key went down
    KeyPressed,
    /// Key went up
    KeyReleased,
    /// Cursor moved
    MouseMoved,
    /// Button went down
    MouseClicked,
    /// Button held
    MouseHeld,
    /// Button went up
    MouseReleased,
}

/// One input occurrence
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Key held during this tick
    KeyDown(Key),
    /// Key went down this tick
    KeyPressed(Key),
    /// Key went up this tick
    KeyReleased(Key),
    /// Cursor moved
    MouseMoved {
        /// New position
        position: Vec2,
        /// Change since the previous sample
        delta: Vec2,
    },
    /// Button went down this tick
    MouseClicked {
        /// Button
        button: MouseButton,
        /// Cursor position
        position: Vec2,
    },
    /// Button held during this tick
    MouseHeld {
        /// Button
        button: MouseButton,
        /// Cursor position
        position: Vec2,
    },
    /// Button went up this tick
    MouseReleased {
        /// Button
        button: MouseButton,
        /// Cursor position
        position: Vec2,
    },
}

impl InputEvent {
    /// Which kind of event this is
    pub fn kind(&self) -> EventKind {
        match self {
            InputEvent::KeyDown(_) => EventKind::KeyDown,
            InputEvent::KeyPressed(_) => EventKind::KeyPressed,
            InputEvent::KeyReleased(_) => EventKind::KeyReleased,
            InputEvent::MouseMoved { .. } => EventKind::MouseMoved,
            InputEvent::MouseClicked { .. } => EventKind::MouseClicked,
            InputEvent::MouseHeld { .. } => EventKind::MouseHeld,
            InputEvent::MouseReleased { .. } => EventKind::MouseReleased,
        }
    }
}

/// Cursor motion payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseMotion {
    /// New position
    pub position: Vec2,
    /// Change since the previous sample
    pub delta: Vec2,
}

/// Button payload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouseClick {
    /// Button
    pub button: MouseButton,
    /// Cursor position
    pub position: Vec2,
}

/// Samples snapshots into the input event stream
///
/// Owns the leaf subject of every input pipeline. Events within one sample
/// are pushed in a fixed order: held keys, key presses, key releases, cursor
/// motion, clicks, held buttons, button releases. Keys and buttons within a
/// group follow their sort order.
#[derive(Debug)]
pub struct InputSource {
    events: Subject<InputEvent>,
    last_mouse: Option<Vec2>,
}

impl InputSource {
    /// Create an input source with no baseline cursor position
    pub fn new() -> Self {
        Self {
            events: Subject::named("input"),
            last_mouse: None,
        }
    }

    /// Push one event per detected input occurrence
    ///
    /// Returns the number of events pushed. The first sample only records the
    /// cursor position; motion is reported from the second sample on.
    pub fn sample(&mut self, snapshot: &InputSnapshot, now: Time) -> usize {
        let mut batch = Vec::new();

        batch.extend(snapshot.keys_down.iter().map(|k| InputEvent::KeyDown(*k)));
        batch.extend(snapshot.keys_pressed.iter().map(|k| InputEvent::KeyPressed(*k)));
        batch.extend(snapshot.keys_released.iter().map(|k| InputEvent::KeyReleased(*k)));

        let position = snapshot.mouse_position;
        if let Some(last) = self.last_mouse {
            if last != position {
                batch.push(InputEvent::MouseMoved {
                    position,
                    delta: position - last,
                });
            }
        }
        self.last_mouse = Some(position);

        batch.extend(
            snapshot
                .mouse_pressed
                .iter()
                .map(|b| InputEvent::MouseClicked { button: *b, position }),
        );
        batch.extend(
            snapshot
                .mouse_down
                .iter()
                .map(|b| InputEvent::MouseHeld { button: *b, position }),
        );
        batch.extend(
            snapshot
                .mouse_released
                .iter()
                .map(|b| InputEvent::MouseReleased { button: *b, position }),
        );

        trace!(now, events = batch.len(), "Sampled input");
        let count = batch.len();
        for event in batch {
            self.events.next(now, event);
        }
        count
    }

    /// Every input event
    pub fn events(&self) -> Stream<InputEvent> {
        self.events.stream()
    }

    /// Keys held, once per tick per key
    pub fn key_down(&self) -> Stream<Key> {
        self.events.stream().filter_map(|event| match event {
            InputEvent::KeyDown(key) => Some(key),
            _ => None,
        })
    }

    /// Key press edges
    pub fn key_pressed(&self) -> Stream<Key> {
        self.events.stream().filter_map(|event| match event {
            InputEvent::KeyPressed(key) => Some(key),
            _ => None,
        })
    }

    /// Key release edges
    pub fn key_released(&self) -> Stream<Key> {
        self.events.stream().filter_map(|event| match event {
            InputEvent::KeyReleased(key) => Some(key),
            _ => None,
        })
    }

    /// Cursor motion
    pub fn mouse_moved(&self) -> Stream<MouseMotion> {
        self.events.stream().filter_map(|event| match event {
            InputEvent::MouseMoved { position, delta } => Some(MouseMotion { position, delta }),
            _ => None,
        })
    }

    /// Button press edges
    pub fn mouse_clicked(&self) -> Stream<MouseClick> {
        self.events.stream().filter_map(|event| match event {
            InputEvent::MouseClicked { button, position } => Some(MouseClick { button, position }),
            _ => None,
        })
    }

    /// Buttons held, once per tick per button
    pub fn mouse_held(&self) -> Stream<MouseClick> {
        self.events.stream().filter_map(|event| match event {
            InputEvent::MouseHeld { button, position } => Some(MouseClick { button, position }),
            _ => None,
        })
    }

    /// End every input stream
    pub fn close(&self) {
        debug!("Input source closed");
        self.events.complete();
    }
}

impl Default for InputSource {
    fn default() -> Self {
        Self::new()
    }
}

/// The window/input library, as seen by the pipeline
pub trait InputBackend {
    /// Time of the coming tick, in the pipeline's time unit
    fn now(&self) -> Time;

    /// Poll the input devices for the coming tick
    ///
    /// A failure here is a device failure; the pipeline does not handle it.
    fn poll_input(&mut self) -> PipelineResult<InputSnapshot>;

    /// Whether the application should stop (window closed, script ended)
    fn should_close(&self) -> bool;
}

/// One frame of an input script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptFrame {
    /// Frame time; defaults to the frame's position in the script
    #[serde(default)]
    pub time: Option<Time>,
    /// Input state for the frame
    #[serde(default)]
    pub input: InputSnapshot,
}

/// A recorded sequence of input frames
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct InputScript {
    /// Frames, in playback order
    pub frames: Vec<ScriptFrame>,
}

impl InputScript {
    /// Parse a script from JSON
    pub fn from_json_str(json: &str) -> PipelineResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a script from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Script with one frame per snapshot, times left to the backend
    pub fn from_snapshots(snapshots: impl IntoIterator<Item = InputSnapshot>) -> Self {
        Self {
            frames: snapshots
                .into_iter()
                .map(|input| ScriptFrame { time: None, input })
                .collect(),
        }
    }
}

/// Backend that replays an [`InputScript`]
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    frames: VecDeque<(Time, InputSnapshot)>,
    polled: u64,
}

impl ScriptedInput {
    /// Prepare a script for playback
    ///
    /// Frames without an explicit time get the time of their index under
    /// `config` (tick index, or index times frame length in milliseconds).
    /// Frame times must not decrease.
    pub fn new(script: InputScript, config: &PipelineConfig) -> PipelineResult<Self> {
        let mut frames = VecDeque::with_capacity(script.frames.len());
        let mut previous: Option<Time> = None;
        for (index, frame) in script.frames.into_iter().enumerate() {
            let time = frame.time.unwrap_or_else(|| config.frame_time(index as u64));
            if let Some(prev) = previous {
                if time < prev {
                    return Err(PipelineError::Configuration(format!(
                        "script frame {} at time {} precedes time {}",
                        index, time, prev
                    )));
                }
            }
            previous = Some(time);
            frames.push_back((time, frame.input));
        }
        Ok(Self { frames, polled: 0 })
    }

    /// Number of frames already polled
    pub fn polled(&self) -> u64 {
        self.polled
    }

    /// Number of frames left
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl InputBackend for ScriptedInput {
    fn now(&self) -> Time {
        self.frames.front().map(|(time, _)| *time).unwrap_or_default()
    }

    fn poll_input(&mut self) -> PipelineResult<InputSnapshot> {
        let (_, snapshot) = self
            .frames
            .pop_front()
            .ok_or_else(|| PipelineError::SourceFailed("input script exhausted".to_string()))?;
        self.polled += 1;
        Ok(snapshot)
    }

    fn should_close(&self) -> bool {
        self.frames.is_empty()
    }
}
