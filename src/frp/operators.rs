// Copyright (c) 2025 - Cowboy AI, Inc.
//! Single-Input Stages
//!
//! Stateless and stateful transformations applied to one stream.
//!
//! | Stage | Emits |
//! |---|---|
//! | `map` | `f(v)` for every `v` (via [`Signal`]) |
//! | `filter` | `v` when `p(&v)` holds |
//! | `filter_map` | `u` when `f(v) == Some(u)` |
//! | `scan` | running accumulator after every `v` |
//! | `history` | the last `capacity` values after every `v` |
//! | `distinct_until_changed` | `v` when it differs from the previous value |
//! | `start_with` | a seed value on connect, then every `v` |
//! | `take` / `skip` | the first `n` / all but the first `n` values |
//! | `take_until` | every `v` until the control stream fires, then completes |
//! | `recover` | errors converted into values |
//!
//! Every user closure runs behind the stage guard: a panic becomes a
//! [`PipelineError::TransformPanicked`] on the error channel and the stage
//! keeps processing later values. The `try_*` variants report ordinary
//! `Err` returns as [`PipelineError::TransformFailed`].

use super::signal::Signal;
use super::stream::{guard, Emitter, Notification, Stream};
use super::Time;
use crate::errors::PipelineError;
use std::cell::Cell;
use std::collections::VecDeque;
use std::fmt::Display;
use std::rc::Rc;

impl<T: Clone + 'static> Signal<T> for Stream<T> {
    type Mapped<U: Clone + 'static> = Stream<U>;

    fn map<U, F>(&self, f: F) -> Stream<U>
    where
        F: Fn(T) -> U + 'static,
        U: Clone + 'static,
    {
        let f = Rc::new(f);
        self.stage("map", move || {
            let f = f.clone();
            move |out: &Emitter<U>, time: Time, value: &T| match guard("map", || f(value.clone())) {
                Ok(mapped) => out.next(time, mapped),
                Err(e) => out.error(e),
            }
        })
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Forward values for which `predicate` holds
    pub fn filter<F>(&self, predicate: F) -> Stream<T>
    where
        F: Fn(&T) -> bool + 'static,
    {
        let predicate = Rc::new(predicate);
        self.stage("filter", move || {
            let predicate = predicate.clone();
            move |out: &Emitter<T>, time: Time, value: &T| match guard("filter", || predicate(value)) {
                Ok(true) => out.next(time, value.clone()),
                Ok(false) => {}
                Err(e) => out.error(e),
            }
        })
    }

    /// Map and filter in one stage
    ///
    /// Useful for picking one variant out of a tagged event enum.
    pub fn filter_map<U, F>(&self, f: F) -> Stream<U>
    where
        U: Clone + 'static,
        F: Fn(T) -> Option<U> + 'static,
    {
        let f = Rc::new(f);
        self.stage("filter_map", move || {
            let f = f.clone();
            move |out: &Emitter<U>, time: Time, value: &T| match guard("filter_map", || f(value.clone())) {
                Ok(Some(mapped)) => out.next(time, mapped),
                Ok(None) => {}
                Err(e) => out.error(e),
            }
        })
    }

    /// Fallible map; `Err` values become error signals
    pub fn try_map<U, E, F>(&self, f: F) -> Stream<U>
    where
        U: Clone + 'static,
        E: Display,
        F: Fn(T) -> Result<U, E> + 'static,
    {
        let f = Rc::new(f);
        self.stage("try_map", move || {
            let f = f.clone();
            move |out: &Emitter<U>, time: Time, value: &T| match guard("try_map", || f(value.clone())) {
                Ok(Ok(mapped)) => out.next(time, mapped),
                Ok(Err(e)) => out.error(PipelineError::transform("try_map", e)),
                Err(e) => out.error(e),
            }
        })
    }

    /// Fallible filter; `Err` values become error signals
    pub fn try_filter<E, F>(&self, predicate: F) -> Stream<T>
    where
        E: Display,
        F: Fn(&T) -> Result<bool, E> + 'static,
    {
        let predicate = Rc::new(predicate);
        self.stage("try_filter", move || {
            let predicate = predicate.clone();
            move |out: &Emitter<T>, time: Time, value: &T| match guard("try_filter", || predicate(value)) {
                Ok(Ok(true)) => out.next(time, value.clone()),
                Ok(Ok(false)) => {}
                Ok(Err(e)) => out.error(PipelineError::transform("try_filter", e)),
                Err(e) => out.error(e),
            }
        })
    }

    /// Running fold: emits `f(acc, v)` after every value
    ///
    /// The accumulator belongs to this stage alone. It is rebuilt from `init`
    /// only when the stage reconnects after losing all its subscribers.
    pub fn scan<A, F>(&self, init: A, f: F) -> Stream<A>
    where
        A: Clone + 'static,
        F: Fn(A, T) -> A + 'static,
    {
        let f = Rc::new(f);
        self.stage("scan", move || {
            let f = f.clone();
            let mut acc = init.clone();
            move |out: &Emitter<A>, time: Time, value: &T| match guard("scan", || f(acc.clone(), value.clone())) {
                Ok(next) => {
                    acc = next.clone();
                    out.next(time, next);
                }
                Err(e) => out.error(e),
            }
        })
    }

    /// Fallible running fold; on `Err` the accumulator is left unchanged
    pub fn try_scan<A, E, F>(&self, init: A, f: F) -> Stream<A>
    where
        A: Clone + 'static,
        E: Display,
        F: Fn(A, T) -> Result<A, E> + 'static,
    {
        let f = Rc::new(f);
        self.stage("try_scan", move || {
            let f = f.clone();
            let mut acc = init.clone();
            move |out: &Emitter<A>, time: Time, value: &T| match guard("try_scan", || f(acc.clone(), value.clone())) {
                Ok(Ok(next)) => {
                    acc = next.clone();
                    out.next(time, next);
                }
                Ok(Err(e)) => out.error(PipelineError::transform("try_scan", e)),
                Err(e) => out.error(e),
            }
        })
    }

    /// The most recent `capacity` values, oldest first, after every value
    ///
    /// A bounded alternative to scanning into an ever-growing list.
    pub fn history(&self, capacity: usize) -> Stream<Vec<T>> {
        let capacity = capacity.max(1);
        self.stage("history", move || {
            let mut window: VecDeque<T> = VecDeque::with_capacity(capacity);
            move |out: &Emitter<Vec<T>>, time: Time, value: &T| {
                if window.len() == capacity {
                    window.pop_front();
                }
                window.push_back(value.clone());
                out.next(time, window.iter().cloned().collect());
            }
        })
    }

    /// Drop values equal to the previously forwarded one
    pub fn distinct_until_changed(&self) -> Stream<T>
    where
        T: PartialEq,
    {
        self.distinct_until_changed_by(|value: &T| value.clone())
    }

    /// Drop values whose key equals the previously forwarded value's key
    pub fn distinct_until_changed_by<K, F>(&self, key: F) -> Stream<T>
    where
        K: PartialEq + 'static,
        F: Fn(&T) -> K + 'static,
    {
        let key = Rc::new(key);
        self.stage("distinct_until_changed", move || {
            let key = key.clone();
            let mut last: Option<K> = None;
            move |out: &Emitter<T>, time: Time, value: &T| match guard("distinct_until_changed", || key(value)) {
                Ok(k) => {
                    if last.as_ref() != Some(&k) {
                        last = Some(k);
                        out.next(time, value.clone());
                    }
                }
                Err(e) => out.error(e),
            }
        })
    }

    /// Emit `value` at `time` when the stage connects, then forward the source
    ///
    /// Only subscribers present at connection see the seed value.
    pub fn start_with(&self, time: Time, value: T) -> Stream<T> {
        let source = self.clone();
        Stream::from_connector("start_with", move |out| {
            out.next(time, value.clone());
            let out = out.clone();
            vec![source.subscribe_raw(move |notification| match notification {
                Notification::Next(t, v) => out.next(*t, v.clone()),
                other => out.forward(other),
            })]
        })
    }

    /// Forward the first `n` values, then complete
    pub fn take(&self, n: usize) -> Stream<T> {
        let source = self.clone();
        Stream::from_connector("take", move |out| {
            if n == 0 {
                out.complete();
                return Vec::new();
            }
            let out = out.clone();
            let mut taken = 0;
            vec![source.subscribe_raw(move |notification| match notification {
                Notification::Next(t, v) => {
                    taken += 1;
                    out.next(*t, v.clone());
                    if taken == n {
                        out.complete();
                    }
                }
                other => out.forward(other),
            })]
        })
    }

    /// Drop the first `n` values
    pub fn skip(&self, n: usize) -> Stream<T> {
        self.stage("skip", move || {
            let mut skipped = 0;
            move |out: &Emitter<T>, time: Time, value: &T| {
                if skipped < n {
                    skipped += 1;
                } else {
                    out.next(time, value.clone());
                }
            }
        })
    }

    /// Forward values until `control` emits, then complete
    ///
    /// The stop takes effect from the moment the control occurrence is
    /// delivered; values already forwarded are not affected. Completion of the
    /// control stream alone does not stop forwarding.
    pub fn take_until<U: Clone + 'static>(&self, control: &Stream<U>) -> Stream<T> {
        let source = self.clone();
        let control = control.clone();
        Stream::from_connector("take_until", move |out| {
            let stop = out.clone();
            let stopper = control.subscribe_raw(move |notification| match notification {
                Notification::Next(..) => stop.complete(),
                Notification::Error(e) => stop.error(e.clone()),
                Notification::Completed => {}
            });
            if out.is_closed() {
                return vec![stopper];
            }
            let out = out.clone();
            let forwarder = source.subscribe_raw(move |notification| match notification {
                Notification::Next(t, v) => out.next(*t, v.clone()),
                other => out.forward(other),
            });
            vec![stopper, forwarder]
        })
    }

    /// Turn error signals into values
    ///
    /// `f` returns `None` to swallow an error. Recovered values carry the time
    /// of the most recent value seen by this stage.
    pub fn recover<F>(&self, f: F) -> Stream<T>
    where
        F: Fn(&PipelineError) -> Option<T> + 'static,
    {
        let source = self.clone();
        let f = Rc::new(f);
        Stream::from_connector("recover", move |out| {
            let out = out.clone();
            let f = f.clone();
            let last_time = Cell::new(0);
            vec![source.subscribe_raw(move |notification| match notification {
                Notification::Next(t, v) => {
                    last_time.set(*t);
                    out.next(*t, v.clone());
                }
                Notification::Error(e) => match guard("recover", || f(e)) {
                    Ok(Some(value)) => out.next(last_time.get(), value),
                    Ok(None) => {}
                    Err(panicked) => out.error(panicked),
                },
                Notification::Completed => out.complete(),
            })]
        })
    }

    /// Observe values without changing them
    pub fn inspect<F>(&self, f: F) -> Stream<T>
    where
        F: Fn(Time, &T) + 'static,
    {
        let f = Rc::new(f);
        self.stage("inspect", move || {
            let f = f.clone();
            move |out: &Emitter<T>, time: Time, value: &T| {
                if let Err(e) = guard("inspect", || f(time, value)) {
                    out.error(e);
                }
                out.next(time, value.clone());
            }
        })
    }
}
