// Copyright (c) 2025 - Cowboy AI, Inc.
//! Functional Reactive Programming (FRP) Abstractions
//!
//! This module provides a push-based, single-threaded event pipeline for
//! feeding discrete input occurrences into a continuously rendered simulation.
//!
//! # Core Concepts
//!
//! ## Stream<T> (Discrete-Time)
//!
//! A value that occurs at specific moments in time. Every occurrence carries
//! the logical [`Time`] at which it was emitted.
//!
//! ```text
//! Time: ────────────────────────────→
//! Value:      ●       ●   ●       ●
//! ```
//!
//! Streams are graphs of stage nodes. A node connects to its upstream lazily
//! when it gains its first subscriber and disconnects (dropping its stage
//! state) when its last subscriber is disposed. Every node is multicast.
//!
//! ## Behavior<T> (Continuous-Time)
//!
//! A value that exists at all points in time and can be sampled at any
//! moment: the player position, the current scene, the game score.
//!
//! ```text
//! Time: ────────────────────────────→
//! Value:  ≈≈≈≈≈≈≈≈≈≈≈≈≈≈≈≈≈≈≈≈≈≈≈≈≈
//! ```
//!
//! ## Clock
//!
//! Time-sensitive stages (debounce, buffer, interval) are driven by an
//! explicit `advance(now)` call once per tick. There are no background timers.
//!
//! # Delivery Rules
//!
//! - Delivery is synchronous: an occurrence pushed during a tick reaches every
//!   terminal callback before the push returns.
//! - A node that is pushed to while it is already delivering queues the
//!   occurrence and delivers it after the current one, preserving order.
//! - Errors travel downstream as [`Notification::Error`] and never end a
//!   stream. Panics inside stage closures are caught at the stage boundary.
//!
//! # Example
//!
//! ```rust,ignore
//! use tickflow::frp::*;
//!
//! let keys: Subject<char> = Subject::new();
//! let position = keys
//!     .stream()
//!     .filter(|k| *k == 'D')
//!     .map(|_| 5.0)
//!     .throttle_first(1)
//!     .scan(100.0, |x, dx| x + dx);
//!
//! let recorder = position.record();
//! keys.next(0, 'D');
//! assert_eq!(recorder.values(), vec![105.0]);
//! ```

pub mod behavior;
pub mod combinators;
pub mod event;
pub mod operators;
pub mod signal;
pub mod stream;
pub mod subject;
pub mod subscription;
pub mod timing;

pub use behavior::Behavior;
pub use combinators::*;
pub use event::{DiscreteEvent, Recorder};
pub use signal::{Discrete, Samplable, Signal};
pub use stream::{Emitter, Notification, Stream};
pub use subject::Subject;
pub use subscription::{CompositeSubscription, Observer, Subscription, SubscriptionId};
pub use timing::{Clock, MAX_INTERVAL_CATCH_UP};

/// Logical time, in the unit configured for the pipeline (ticks or milliseconds)
pub type Time = i64;

/// A single occurrence: the time it happened and its value
pub type Occurrence<T> = (Time, T);
