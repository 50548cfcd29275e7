// Copyright (c) 2025 - Cowboy AI, Inc.
//! Behavior - Continuous-Time Signals
//!
//! A `Behavior<T>` represents a value that exists at all points in time.
//! You can sample a Behavior at any moment to get its current value.
//!
//! # Characteristics
//!
//! - **Always has a value**: Can be sampled at any time `t`
//! - **Continuous**: Value exists for all `t ∈ Time`
//! - **Observable**: Every change is also pushed on [`Behavior::changes`]
//!
//! # Mathematical Model
//!
//! A Behavior is a function from Time to Value:
//!
//! ```text
//! Behavior<T> ≅ Time → T
//! ```
//!
//! # Kinds
//!
//! - **Holders** (`Behavior::new`, `Stream::hold`) store a value and accept
//!   `set`. They play the role of the current scene, the game state record,
//!   the last known mouse position.
//! - **Derived** behaviors (`map`, `apply2`) compute their value from other
//!   behaviors when sampled and are read-only.
//!
//! # Examples
//!
//! ```rust,ignore
//! let scene = Behavior::new("menu");
//! let title = scene.map(|s| s.to_uppercase());
//! scene.set(1, "game")?;
//! assert_eq!(title.sample(), "GAME");
//! ```

use super::signal::{Samplable, Signal};
use super::stream::{Emitter, Notification, Stream};
use super::subject::Subject;
use super::subscription::Subscription;
use super::Time;
use crate::errors::{report_unhandled, PipelineError, PipelineResult};
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;

struct Holder<T> {
    value: Rc<RefCell<T>>,
    subject: Subject<T>,
}

impl<T> Clone for Holder<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            subject: self.subject.clone(),
        }
    }
}

/// Continuous-time signal that always has a value
pub struct Behavior<T> {
    /// Function that produces the current value when sampled
    sampler: Rc<dyn Fn() -> T>,
    changes: Stream<T>,
    holder: Option<Holder<T>>,
    feed: Option<Rc<Subscription>>,
}

impl<T> Clone for Behavior<T> {
    fn clone(&self) -> Self {
        Self {
            sampler: self.sampler.clone(),
            changes: self.changes.clone(),
            holder: self.holder.clone(),
            feed: self.feed.clone(),
        }
    }
}

impl<T: Debug> Debug for Behavior<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Behavior<{}>", std::any::type_name::<T>())
    }
}

impl<T: Clone + 'static> Behavior<T> {
    /// Create a holder with an initial value
    pub fn new(initial: T) -> Self {
        let value = Rc::new(RefCell::new(initial));
        let subject = Subject::named("behavior");
        let reader = value.clone();
        Self {
            sampler: Rc::new(move || reader.borrow().clone()),
            changes: subject.stream(),
            holder: Some(Holder { value, subject }),
            feed: None,
        }
    }

    /// Create a derived behavior from a sampling function and its change stream
    pub fn from_fn<F>(changes: Stream<T>, f: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        Self {
            sampler: Rc::new(f),
            changes,
            holder: None,
            feed: None,
        }
    }

    /// Whether this behavior accepts `set`
    pub fn is_writable(&self) -> bool {
        self.holder.is_some()
    }

    /// Store a new value and push it on the change stream
    pub fn set(&self, time: Time, value: T) -> PipelineResult<()> {
        let holder = self.holder.as_ref().ok_or_else(|| {
            PipelineError::Configuration("cannot set a derived behavior".to_string())
        })?;
        *holder.value.borrow_mut() = value.clone();
        holder.subject.next(time, value);
        Ok(())
    }

    /// Replace the value with `f(current)`
    pub fn update<F>(&self, time: Time, f: F) -> PipelineResult<()>
    where
        F: FnOnce(T) -> T,
    {
        let next = f(self.sample());
        self.set(time, next)
    }

    /// Every value this behavior takes after now
    pub fn changes(&self) -> Stream<T> {
        self.changes.clone()
    }

    /// Changes that differ from the previous value
    ///
    /// The baseline is sampled when the stage connects, so a late subscriber
    /// only sees values that differ from what the behavior held at that point.
    pub fn distinct_changes(&self) -> Stream<T>
    where
        T: PartialEq,
    {
        let sampler = self.sampler.clone();
        let changes = self.changes.clone();
        Stream::from_connector("distinct_changes", move |out| {
            let out = out.clone();
            let mut previous = sampler();
            vec![changes.subscribe_raw(move |notification| match notification {
                Notification::Next(time, value) => {
                    if *value != previous {
                        previous = value.clone();
                        out.next(*time, value.clone());
                    }
                }
                other => out.forward(other),
            })]
        })
    }

    /// Stop following the stream this behavior was created from
    ///
    /// Only meaningful for behaviors created by [`Stream::hold`]; the last
    /// held value stays available.
    pub fn detach(&self) {
        if let Some(feed) = &self.feed {
            feed.dispose();
        }
    }

    /// Apply a binary function to two behaviors
    ///
    /// The result is sampled on demand and changes whenever either input
    /// changes.
    pub fn apply2<U, V, F>(&self, other: &Behavior<U>, f: F) -> Behavior<V>
    where
        U: Clone + 'static,
        V: Clone + 'static,
        F: Fn(T, U) -> V + 'static,
    {
        let f = Rc::new(f);
        let sample_a = self.sampler.clone();
        let sample_b = other.sampler.clone();

        let sampler = {
            let f = f.clone();
            let sample_a = sample_a.clone();
            let sample_b = sample_b.clone();
            move || f(sample_a(), sample_b())
        };
        let trigger = self
            .changes
            .map(|_| ())
            .merge(&other.changes.map(|_| ()));
        let changes = trigger.map(move |_| f(sample_a(), sample_b()));

        Behavior::from_fn(changes, sampler)
    }
}

impl<T: Clone + 'static> Signal<T> for Behavior<T> {
    type Mapped<U: Clone + 'static> = Behavior<U>;

    fn map<U, F>(&self, f: F) -> Behavior<U>
    where
        F: Fn(T) -> U + 'static,
        U: Clone + 'static,
    {
        let f = Rc::new(f);
        let sampler = self.sampler.clone();
        let g = f.clone();
        Behavior::from_fn(self.changes.map(move |v| g(v)), move || f(sampler()))
    }
}

impl<T: Clone + 'static> Samplable<T> for Behavior<T> {
    fn sample(&self) -> T {
        (self.sampler)()
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Hold the latest value of this stream, starting from `initial`
    pub fn hold(&self, initial: T) -> Behavior<T> {
        let mut behavior = Behavior::new(initial);
        let target = behavior.clone();
        let feed = self.subscribe_raw(move |notification| match notification {
            Notification::Next(time, value) => {
                if let Err(e) = target.set(*time, value.clone()) {
                    report_unhandled(&e);
                }
            }
            Notification::Error(e) => {
                if let Some(holder) = &target.holder {
                    holder.subject.error(e.clone());
                }
            }
            Notification::Completed => {}
        });
        behavior.feed = Some(Rc::new(feed));
        behavior
    }

    /// Pair every value with the behavior's value at that moment
    pub fn snapshot<U: Clone + 'static>(&self, behavior: &Behavior<U>) -> Stream<(T, U)> {
        let sampler = behavior.sampler.clone();
        self.stage("snapshot", move || {
            let sampler = sampler.clone();
            move |out: &Emitter<(T, U)>, time: Time, value: &T| out.next(time, (value.clone(), sampler()))
        })
    }
}
