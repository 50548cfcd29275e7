// Copyright (c) 2025 - Cowboy AI, Inc.
//! Simulation State Store
//!
//! The application loop owns one state record per simulation. Terminal
//! callbacks never reach for globals; they receive `&mut S` through a
//! [`Store`] binding, one reducer per stream:
//!
//! ```text
//! Stream<T> ──bind(reducer)──> (&mut S, T) → ()
//! ```
//!
//! Reducers run synchronously during the tick, so the renderer reading the
//! store after the tick sees every update made during it.
//!
//! ```rust,ignore
//! let store = Store::new(Game::default());
//! store.bind(&score_events, |game, points| game.score += points);
//! pipeline.tick(&snapshot, now)?;
//! renderer.render(&*store.read())?;
//! ```

use crate::errors::{report_unhandled, PipelineError};
use crate::frp::{Observer, Stream, Subscription, Time};
use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;
use tracing::trace;

/// Shared handle to a mutable state record
///
/// Cloning shares the record.
pub struct Store<S> {
    state: Rc<RefCell<S>>,
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.state.try_borrow() {
            Ok(state) => f.debug_struct("Store").field("state", &*state).finish(),
            Err(_) => f.write_str("Store { <updating> }"),
        }
    }
}

impl<S: 'static> Store<S> {
    /// Wrap an initial state record
    pub fn new(initial: S) -> Self {
        Self {
            state: Rc::new(RefCell::new(initial)),
        }
    }

    /// Borrow the state for reading
    ///
    /// The borrow must end before the next tick starts.
    pub fn read(&self) -> Ref<'_, S> {
        self.state.borrow()
    }

    /// Copy of the current state
    pub fn snapshot(&self) -> S
    where
        S: Clone,
    {
        self.state.borrow().clone()
    }

    /// Mutate the state directly, outside any stream
    pub fn update<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        f(&mut self.state.borrow_mut())
    }

    /// Apply `reducer` to the state for every value of `stream`
    ///
    /// A reducer that pushes into a stream bound to the same store would
    /// re-enter the record; that value is rejected with a
    /// `TransformFailed` error on the unhandled-error hook instead of
    /// panicking.
    pub fn bind<T, F>(&self, stream: &Stream<T>, mut reducer: F) -> Subscription
    where
        T: Clone + 'static,
        F: FnMut(&mut S, T) + 'static,
    {
        let state = self.state.clone();
        stream.subscribe_with(Observer::timed(move |time: Time, value: T| {
            match state.try_borrow_mut() {
                Ok(mut state) => {
                    trace!(time, "Store update");
                    reducer(&mut state, value);
                }
                Err(_) => report_unhandled(&PipelineError::transform(
                    "store",
                    "state record is already being updated",
                )),
            }
        }))
    }
}
