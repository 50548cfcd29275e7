// Copyright (c) 2025 - Cowboy AI, Inc.
//! Signal Trait - Base abstraction for time-varying values
//!
//! This module defines the `Signal` trait, which is the foundation for all
//! FRP types. A Signal represents a value that varies over time.
//!
//! # Type Hierarchy
//!
//! ```text
//! Signal<T>
//!   ├── Behavior<T>       (continuous-time, Samplable)
//!   ├── Stream<T>         (discrete-time, live)
//!   └── DiscreteEvent<T>  (discrete-time, recorded, Discrete)
//! ```
//!
//! # Functor Laws
//!
//! All Signal implementations must satisfy the Functor laws:
//!
//! 1. **Identity**: `signal.map(|x| x) == signal`
//! 2. **Composition**: `signal.map(f).map(g) == signal.map(|x| g(f(x)))`
//!
//! # Example
//!
//! ```rust,ignore
//! use tickflow::frp::Signal;
//!
//! fn double_signal<S: Signal<i32>>(signal: &S) -> S::Mapped<i32> {
//!     signal.map(|x| x * 2)
//! }
//! ```

/// Base trait for time-varying values
///
/// A `Signal<T>` represents a value of type `T` that changes over time.
/// Signals are functors, meaning they support the `map` operation.
pub trait Signal<T>: Clone {
    /// The type of signal produced by map
    type Mapped<U: Clone + 'static>: Signal<U>;

    /// Apply a function to the signal's values
    ///
    /// For live streams this inserts a map stage: exactly one output per
    /// input, same timestamp. A panicking `f` becomes an error signal.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let numbers: Behavior<i32> = Behavior::new(5);
    /// let doubled: Behavior<i32> = numbers.map(|x| x * 2);
    /// ```
    fn map<U, F>(&self, f: F) -> Self::Mapped<U>
    where
        F: Fn(T) -> U + 'static,
        U: Clone + 'static;
}

/// Marker trait for signals that can be sampled at any time
///
/// Only continuous-time signals (Behaviors) implement this trait.
pub trait Samplable<T>: Signal<T> {
    /// Get the current value of the signal at this moment in time
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let position: Behavior<Vec2> = ...;
    /// let current: Vec2 = position.sample();
    /// ```
    fn sample(&self) -> T;
}

/// Marker trait for signals with a finite, recorded set of occurrences
pub trait Discrete<T>: Signal<T> {
    /// Get all occurrences of the signal, sorted by time
    fn occurrences(&self) -> Vec<crate::frp::Occurrence<T>>;
}
