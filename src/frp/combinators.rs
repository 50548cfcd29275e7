// Copyright (c) 2025 - Cowboy AI, Inc.
//! Signal Combinators
//!
//! This module provides combinators that read from more than one signal.
//!
//! # Available Combinators
//!
//! ## For Behaviors
//! - `apply2` - Combine two behaviors with a binary function
//! - `apply3` - Combine three behaviors with a ternary function
//!
//! ## For Streams
//! - `merge` / `merge_all` - Every value from every input, in arrival order
//! - `combine_latest` / `combine_latest_all` - Latest of every input, on any input
//! - `with_latest_from` / `with_latest_from_all` - Leader value plus followers' latest
//! - `zip` / `zip_all` - Pairwise by arrival sequence
//!
//! Delivery is synchronous, so "arrival order" is push order: a value pushed
//! earlier in the tick is forwarded earlier. Inputs that never emit keep
//! `combine_latest`, `with_latest_from` and `zip` silent. That is the intended
//! backpressure; there is no timeout.
//!
//! # Examples
//!
//! ```rust,ignore
//! use tickflow::frp::combinators::*;
//!
//! let player = Subject::new();
//! let enemy = Subject::new();
//! let distance = combine_latest(&player.stream(), &enemy.stream())
//!     .map(|(p, e): (Vec2, Vec2)| (p - e).length());
//! ```

use super::behavior::Behavior;
use super::stream::{Emitter, Notification, Stream};
use super::Time;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// A notification tagged with the input it arrived on
enum Side<A, B> {
    Left(Notification<A>),
    Right(Notification<B>),
}

fn emit_all<O: Clone + 'static>(out: &Emitter<O>, notifications: Vec<Notification<O>>) {
    for notification in notifications {
        out.send(notification);
    }
}

/// Two-input stage
///
/// `make` builds fresh join state on every connect. The state returns what
/// to emit instead of emitting itself, so it is never borrowed while
/// downstream code runs.
fn join2<A, B, O, S, M>(label: &'static str, left: &Stream<A>, right: &Stream<B>, make: M) -> Stream<O>
where
    A: Clone + 'static,
    B: Clone + 'static,
    O: Clone + 'static,
    M: Fn() -> S + 'static,
    S: FnMut(Side<A, B>) -> Vec<Notification<O>> + 'static,
{
    let left = left.clone();
    let right = right.clone();
    Stream::from_connector(label, move |out| {
        let state = Rc::new(RefCell::new(make()));

        let on_left = {
            let state = state.clone();
            let out = out.clone();
            left.subscribe_raw(move |notification| {
                let emitted = (&mut *state.borrow_mut())(Side::Left(notification.clone()));
                emit_all(&out, emitted);
            })
        };
        let on_right = {
            let out = out.clone();
            right.subscribe_raw(move |notification| {
                let emitted = (&mut *state.borrow_mut())(Side::Right(notification.clone()));
                emit_all(&out, emitted);
            })
        };

        vec![on_left, on_right]
    })
}

/// N-input stage over streams of one type; `make` receives the input count
fn join_n<T, O, S, M>(label: &'static str, inputs: &[Stream<T>], make: M) -> Stream<O>
where
    T: Clone + 'static,
    O: Clone + 'static,
    M: Fn(usize) -> S + 'static,
    S: FnMut(usize, Notification<T>) -> Vec<Notification<O>> + 'static,
{
    let inputs = inputs.to_vec();
    Stream::from_connector(label, move |out| {
        let state = Rc::new(RefCell::new(make(inputs.len())));
        inputs
            .iter()
            .enumerate()
            .map(|(index, input)| {
                let state = state.clone();
                let out = out.clone();
                input.subscribe_raw(move |notification| {
                    let emitted = (&mut *state.borrow_mut())(index, notification.clone());
                    emit_all(&out, emitted);
                })
            })
            .collect()
    })
}

/// Merge two streams
pub fn merge<T: Clone + 'static>(a: &Stream<T>, b: &Stream<T>) -> Stream<T> {
    merge_all(&[a.clone(), b.clone()])
}

/// Merge any number of streams
///
/// Completes once every input has completed.
pub fn merge_all<T: Clone + 'static>(inputs: &[Stream<T>]) -> Stream<T> {
    join_n("merge", inputs, |count| {
        let mut remaining = count;
        move |_: usize, notification: Notification<T>| match notification {
            Notification::Completed => {
                remaining -= 1;
                if remaining == 0 {
                    vec![Notification::Completed]
                } else {
                    Vec::new()
                }
            }
            other => vec![other],
        }
    })
}

/// Latest value of both inputs, re-emitted whenever either input emits
///
/// Silent until both inputs have emitted at least once.
pub fn combine_latest<A, B>(a: &Stream<A>, b: &Stream<B>) -> Stream<(A, B)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    join2("combine_latest", a, b, || {
        let mut latest: (Option<A>, Option<B>) = (None, None);
        let mut done = (false, false);
        move |side: Side<A, B>| {
            let time: Time = match side {
                Side::Left(Notification::Next(t, v)) => {
                    latest.0 = Some(v);
                    t
                }
                Side::Right(Notification::Next(t, v)) => {
                    latest.1 = Some(v);
                    t
                }
                Side::Left(Notification::Error(e)) | Side::Right(Notification::Error(e)) => {
                    return vec![Notification::Error(e)];
                }
                Side::Left(Notification::Completed) => {
                    done.0 = true;
                    return completed_if(done.0 && done.1);
                }
                Side::Right(Notification::Completed) => {
                    done.1 = true;
                    return completed_if(done.0 && done.1);
                }
            };
            match &latest {
                (Some(a), Some(b)) => vec![Notification::Next(time, (a.clone(), b.clone()))],
                _ => Vec::new(),
            }
        }
    })
}

/// Latest value of every input, in input order, whenever any input emits
pub fn combine_latest_all<T: Clone + 'static>(inputs: &[Stream<T>]) -> Stream<Vec<T>> {
    join_n("combine_latest", inputs, |count| {
        let mut latest: Vec<Option<T>> = vec![None; count];
        let mut remaining = count;
        move |index: usize, notification: Notification<T>| match notification {
            Notification::Next(time, value) => {
                latest[index] = Some(value);
                match latest.iter().cloned().collect::<Option<Vec<T>>>() {
                    Some(all) => vec![Notification::Next(time, all)],
                    None => Vec::new(),
                }
            }
            Notification::Error(e) => vec![Notification::Error(e)],
            Notification::Completed => {
                remaining -= 1;
                completed_if(remaining == 0)
            }
        }
    })
}

/// Pair each `leader` value with the latest `follower` value
///
/// Only the leader triggers emission. Leader values that arrive before the
/// follower has emitted are dropped. Completes with the leader.
pub fn with_latest_from<A, B>(leader: &Stream<A>, follower: &Stream<B>) -> Stream<(A, B)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    join2("with_latest_from", leader, follower, || {
        let mut latest: Option<B> = None;
        move |side: Side<A, B>| match side {
            Side::Left(Notification::Next(time, value)) => match &latest {
                Some(follower) => vec![Notification::Next(time, (value, follower.clone()))],
                None => Vec::new(),
            },
            Side::Right(Notification::Next(_, value)) => {
                latest = Some(value);
                Vec::new()
            }
            Side::Left(Notification::Error(e)) | Side::Right(Notification::Error(e)) => {
                vec![Notification::Error(e)]
            }
            Side::Left(Notification::Completed) => vec![Notification::Completed],
            Side::Right(Notification::Completed) => Vec::new(),
        }
    })
}

/// Pair each `leader` value with the latest value of every follower
///
/// Silent until every follower has emitted.
pub fn with_latest_from_all<A, B>(leader: &Stream<A>, followers: &[Stream<B>]) -> Stream<(A, Vec<B>)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    if followers.is_empty() {
        return leader.stage("with_latest_from", || {
            |out: &Emitter<(A, Vec<B>)>, time: Time, value: &A| out.next(time, (value.clone(), Vec::new()))
        });
    }
    with_latest_from(leader, &combine_latest_all(followers))
}

/// Pair the n-th value of `a` with the n-th value of `b`
///
/// Unpaired values wait in a per-input queue. A pair is stamped with the
/// time of the value that completed it. Completes when an input has
/// completed and its queue is drained.
pub fn zip<A, B>(a: &Stream<A>, b: &Stream<B>) -> Stream<(A, B)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    join2("zip", a, b, || {
        let mut left: VecDeque<A> = VecDeque::new();
        let mut right: VecDeque<B> = VecDeque::new();
        let mut done = (false, false);
        move |side: Side<A, B>| {
            let mut emitted = Vec::new();
            match side {
                Side::Left(Notification::Next(time, v)) => {
                    left.push_back(v);
                    pair_heads(&mut left, &mut right, time, &mut emitted);
                }
                Side::Right(Notification::Next(time, v)) => {
                    right.push_back(v);
                    pair_heads(&mut left, &mut right, time, &mut emitted);
                }
                Side::Left(Notification::Error(e)) | Side::Right(Notification::Error(e)) => {
                    emitted.push(Notification::Error(e));
                }
                Side::Left(Notification::Completed) => done.0 = true,
                Side::Right(Notification::Completed) => done.1 = true,
            }
            if (done.0 && left.is_empty()) || (done.1 && right.is_empty()) {
                emitted.push(Notification::Completed);
            }
            emitted
        }
    })
}

fn pair_heads<A, B>(
    left: &mut VecDeque<A>,
    right: &mut VecDeque<B>,
    time: Time,
    emitted: &mut Vec<Notification<(A, B)>>,
) {
    while !left.is_empty() && !right.is_empty() {
        if let (Some(a), Some(b)) = (left.pop_front(), right.pop_front()) {
            emitted.push(Notification::Next(time, (a, b)));
        }
    }
}

/// Zip any number of streams into vectors, in input order
pub fn zip_all<T: Clone + 'static>(inputs: &[Stream<T>]) -> Stream<Vec<T>> {
    join_n("zip", inputs, |count| {
        let mut queues: Vec<VecDeque<T>> = vec![VecDeque::new(); count];
        let mut done = vec![false; count];
        move |index: usize, notification: Notification<T>| {
            let mut emitted = Vec::new();
            match notification {
                Notification::Next(time, value) => {
                    queues[index].push_back(value);
                    while queues.iter().all(|q| !q.is_empty()) {
                        let row: Vec<T> = queues.iter_mut().filter_map(VecDeque::pop_front).collect();
                        emitted.push(Notification::Next(time, row));
                    }
                }
                Notification::Error(e) => emitted.push(Notification::Error(e)),
                Notification::Completed => done[index] = true,
            }
            if done.iter().zip(&queues).any(|(d, q)| *d && q.is_empty()) {
                emitted.push(Notification::Completed);
            }
            emitted
        }
    })
}

fn completed_if<O>(condition: bool) -> Vec<Notification<O>> {
    if condition {
        vec![Notification::Completed]
    } else {
        Vec::new()
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Method form of [`merge`]
    pub fn merge(&self, other: &Stream<T>) -> Stream<T> {
        merge(self, other)
    }

    /// Method form of [`combine_latest`]
    pub fn combine_latest<U: Clone + 'static>(&self, other: &Stream<U>) -> Stream<(T, U)> {
        combine_latest(self, other)
    }

    /// Method form of [`with_latest_from`], with `self` as the leader
    pub fn with_latest_from<U: Clone + 'static>(&self, follower: &Stream<U>) -> Stream<(T, U)> {
        with_latest_from(self, follower)
    }

    /// Method form of [`zip`]
    pub fn zip<U: Clone + 'static>(&self, other: &Stream<U>) -> Stream<(T, U)> {
        zip(self, other)
    }
}

/// Combine two behaviors using a binary function
///
/// This is a convenience wrapper around `Behavior::apply2`.
///
/// # Examples
///
/// ```rust,ignore
/// let x = Behavior::new(3);
/// let y = Behavior::new(4);
/// let sum = apply2(&x, &y, |a, b| a + b);
/// assert_eq!(sum.sample(), 7);
/// ```
pub fn apply2<T, U, V, F>(a: &Behavior<T>, b: &Behavior<U>, f: F) -> Behavior<V>
where
    T: Clone + 'static,
    U: Clone + 'static,
    V: Clone + 'static,
    F: Fn(T, U) -> V + 'static,
{
    a.apply2(b, f)
}

/// Combine three behaviors using a ternary function
pub fn apply3<T, U, V, W, F>(a: &Behavior<T>, b: &Behavior<U>, c: &Behavior<V>, f: F) -> Behavior<W>
where
    T: Clone + 'static,
    U: Clone + 'static,
    V: Clone + 'static,
    W: Clone + 'static,
    F: Fn(T, U, V) -> W + 'static,
{
    let combined_ab = a.apply2(b, |x, y| (x, y));
    combined_ab.apply2(c, move |(x, y), z| f(x, y, z))
}
