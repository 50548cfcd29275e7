// Copyright (c) 2025 - Cowboy AI, Inc.
//! DiscreteEvent - Recorded Discrete-Time Signals
//!
//! A `DiscreteEvent<T>` is a finite, materialized list of occurrences. Live
//! streams are never materialized; a `DiscreteEvent` is what you get when you
//! record one (for assertions, replays and scripted input) or what you replay
//! into a [`Subject`].
//!
//! # Mathematical Model
//!
//! ```text
//! DiscreteEvent<T> ≅ [(Time, T)]
//! ```
//!
//! # Examples
//!
//! ## Recording a stream
//!
//! ```rust,ignore
//! let keys: Subject<Key> = Subject::new();
//! let recorder = keys.stream().throttle_first(2).record();
//! keys.next(0, Key::Space);
//! keys.next(1, Key::Space);
//! assert_eq!(recorder.events().occurrences(), vec![(0, Key::Space)]);
//! ```
//!
//! ## Replaying a trace
//!
//! ```rust,ignore
//! let trace = DiscreteEvent::from_vec(vec![(0, 'W'), (1, 'W'), (2, 'D')]);
//! trace.replay_into(&keys);
//! ```

use super::signal::{Discrete, Signal};
use super::stream::{Notification, Stream};
use super::subject::Subject;
use super::subscription::Subscription;
use super::Occurrence;
use crate::errors::PipelineError;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Discrete-time signal with values at specific moments
#[derive(Clone, Debug, PartialEq)]
pub struct DiscreteEvent<T> {
    /// Occurrences sorted by time
    occurrences: Vec<Occurrence<T>>,
}

impl<T: Clone + 'static> DiscreteEvent<T> {
    /// Create an event list from a vector of occurrences
    ///
    /// The occurrences are sorted by time; equal times keep their order.
    pub fn from_vec(mut occurrences: Vec<Occurrence<T>>) -> Self {
        occurrences.sort_by_key(|(time, _)| *time);
        Self { occurrences }
    }

    /// Create an empty event list
    pub fn empty() -> Self {
        Self {
            occurrences: Vec::new(),
        }
    }

    /// Number of occurrences
    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    /// Whether there are no occurrences
    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// The values, without their times
    pub fn values(&self) -> Vec<T> {
        self.occurrences.iter().map(|(_, v)| v.clone()).collect()
    }

    /// Keep only occurrences whose value matches `predicate`
    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&T) -> bool,
    {
        let filtered = self
            .occurrences
            .into_iter()
            .filter(|(_, value)| predicate(value))
            .collect();

        Self {
            occurrences: filtered,
        }
    }

    /// Fold the occurrences into a single value, in chronological order
    pub fn fold<A, F>(self, init: A, f: F) -> A
    where
        F: Fn(A, T) -> A,
    {
        self.occurrences
            .into_iter()
            .fold(init, |acc, (_, value)| f(acc, value))
    }

    /// Like `fold`, but keeps every intermediate accumulator
    pub fn scan<A, F>(self, init: A, f: F) -> DiscreteEvent<A>
    where
        A: Clone + 'static,
        F: Fn(A, T) -> A,
    {
        let mut acc = init;
        let results = self
            .occurrences
            .into_iter()
            .map(|(time, value)| {
                acc = f(acc.clone(), value);
                (time, acc.clone())
            })
            .collect();

        DiscreteEvent {
            occurrences: results,
        }
    }

    /// Take only the first N occurrences
    pub fn take(self, n: usize) -> Self {
        let occurrences = self.occurrences.into_iter().take(n).collect();
        Self { occurrences }
    }

    /// Skip the first N occurrences
    pub fn skip(self, n: usize) -> Self {
        let occurrences = self.occurrences.into_iter().skip(n).collect();
        Self { occurrences }
    }

    /// Merge two recorded lists, ordered by time; ties keep `self` first
    pub fn merge(self, other: DiscreteEvent<T>) -> Self {
        let mut occurrences = self.occurrences;
        occurrences.extend(other.occurrences);
        Self::from_vec(occurrences)
    }

    /// Push every occurrence into `subject`, in order
    pub fn replay_into(&self, subject: &Subject<T>) {
        for (time, value) in &self.occurrences {
            subject.next(*time, value.clone());
        }
    }
}

impl<T: Clone + 'static> Signal<T> for DiscreteEvent<T> {
    type Mapped<U: Clone + 'static> = DiscreteEvent<U>;

    fn map<U, F>(&self, f: F) -> DiscreteEvent<U>
    where
        F: Fn(T) -> U + 'static,
        U: Clone + 'static,
    {
        let mapped = self
            .occurrences
            .iter()
            .map(|(time, value)| (*time, f(value.clone())))
            .collect();

        DiscreteEvent {
            occurrences: mapped,
        }
    }
}

impl<T: Clone + 'static> Discrete<T> for DiscreteEvent<T> {
    fn occurrences(&self) -> Vec<Occurrence<T>> {
        self.occurrences.clone()
    }
}

/// Subscription that records everything a stream delivers
pub struct Recorder<T> {
    log: Rc<RefCell<Vec<Occurrence<T>>>>,
    errors: Rc<RefCell<Vec<PipelineError>>>,
    completed: Rc<Cell<bool>>,
    subscription: Subscription,
}

impl<T: Clone + 'static> Recorder<T> {
    /// Everything recorded so far
    pub fn events(&self) -> DiscreteEvent<T> {
        DiscreteEvent {
            occurrences: self.log.borrow().clone(),
        }
    }

    /// Recorded `(time, value)` pairs, in delivery order
    pub fn occurrences(&self) -> Vec<Occurrence<T>> {
        self.log.borrow().clone()
    }

    /// Recorded values, in delivery order
    pub fn values(&self) -> Vec<T> {
        self.log.borrow().iter().map(|(_, v)| v.clone()).collect()
    }

    /// Recorded error signals
    pub fn errors(&self) -> Vec<PipelineError> {
        self.errors.borrow().clone()
    }

    /// Whether the stream completed
    pub fn is_completed(&self) -> bool {
        self.completed.get()
    }

    /// Stop recording
    pub fn dispose(&self) {
        self.subscription.dispose();
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Record every value, error and completion from now on
    pub fn record(&self) -> Recorder<T> {
        let log = Rc::new(RefCell::new(Vec::new()));
        let errors = Rc::new(RefCell::new(Vec::new()));
        let completed = Rc::new(Cell::new(false));

        let subscription = {
            let log = log.clone();
            let errors = errors.clone();
            let completed = completed.clone();
            self.subscribe_raw(move |notification| match notification {
                Notification::Next(time, value) => log.borrow_mut().push((*time, value.clone())),
                Notification::Error(e) => errors.borrow_mut().push(e.clone()),
                Notification::Completed => completed.set(true),
            })
        };

        Recorder {
            log,
            errors,
            completed,
            subscription,
        }
    }
}
