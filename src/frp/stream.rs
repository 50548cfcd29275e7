// Copyright (c) 2025 - Cowboy AI, Inc.
//! Stream - Push-Based Discrete Signals
//!
//! A `Stream<T>` is a handle to one node of the stage graph. Nodes hold
//! their downstream sinks; derived nodes also hold a connector that attaches
//! them to their upstream nodes.
//!
//! # Node Lifecycle
//!
//! ```text
//!   created ──first sink──▶ connected ──last sink disposed──▶ created
//!      │                        │
//!      └────────Completed───────┴──────────────▶ completed (terminal)
//! ```
//!
//! Connecting runs the stage's connector, which builds fresh stage state
//! (accumulators, caches, buffers) and subscribes to the upstream nodes.
//! Disconnecting disposes those upstream subscriptions so the stage state is
//! dropped together with the sink closures that own it.

use super::subscription::{Detach, Observer, Subscription, SubscriptionId};
use super::Time;
use crate::errors::{report_unhandled, PipelineError};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use tracing::{debug, trace};

/// A single message travelling along a stream
#[derive(Debug, Clone, PartialEq)]
pub enum Notification<T> {
    /// A value occurred at the given time
    Next(Time, T),
    /// A stage failed; the stream keeps going
    Error(PipelineError),
    /// The stream ended; nothing follows
    Completed,
}

type Sink<T> = Rc<RefCell<dyn FnMut(&Notification<T>)>>;
type Connector<T> = Box<dyn Fn(&Emitter<T>) -> Vec<Subscription>>;

struct SinkEntry<T> {
    id: SubscriptionId,
    active: Rc<Cell<bool>>,
    sink: Sink<T>,
}

pub(crate) struct Node<T> {
    label: &'static str,
    sinks: RefCell<Vec<SinkEntry<T>>>,
    connector: Option<Connector<T>>,
    upstream: RefCell<Vec<Subscription>>,
    connected: Cell<bool>,
    emitting: Cell<bool>,
    pending: RefCell<VecDeque<Notification<T>>>,
    completed: Cell<bool>,
}

impl<T: Clone + 'static> Node<T> {
    fn new(label: &'static str, connector: Option<Connector<T>>) -> Self {
        Self {
            label,
            sinks: RefCell::new(Vec::new()),
            connector,
            upstream: RefCell::new(Vec::new()),
            connected: Cell::new(false),
            emitting: Cell::new(false),
            pending: RefCell::new(VecDeque::new()),
            completed: Cell::new(false),
        }
    }

    fn add_sink(self: &Rc<Self>, sink: Sink<T>) -> Subscription {
        if self.completed.get() {
            // Late subscribers to a finished stream only learn that it finished
            (&mut *sink.borrow_mut())(&Notification::Completed);
            return Subscription::inert();
        }

        let id = SubscriptionId::new();
        let active = Rc::new(Cell::new(true));
        self.sinks.borrow_mut().push(SinkEntry {
            id,
            active: active.clone(),
            sink,
        });

        let detach: Rc<dyn Detach> = self.clone();
        let subscription = Subscription::new(id, active, Rc::downgrade(&detach));
        self.connect();
        subscription
    }

    fn connect(self: &Rc<Self>) {
        let Some(connector) = &self.connector else {
            return;
        };
        if self.connected.get() || self.completed.get() {
            return;
        }
        self.connected.set(true);
        debug!(stage = self.label, "Stage connected");

        let upstream = connector(&Emitter { node: self.clone() });
        if self.completed.get() {
            // Completed while connecting (take(0), completed sources)
            for subscription in upstream {
                subscription.dispose();
            }
        } else {
            self.upstream.borrow_mut().extend(upstream);
        }
    }

    fn disconnect(&self) {
        if !self.connected.replace(false) {
            return;
        }
        let upstream: Vec<Subscription> = self.upstream.borrow_mut().drain(..).collect();
        debug!(stage = self.label, upstream = upstream.len(), "Stage disconnected");
        for subscription in upstream {
            subscription.dispose();
        }
    }

    fn emit(&self, notification: Notification<T>) {
        if self.completed.get() {
            return;
        }
        if self.emitting.get() {
            self.pending.borrow_mut().push_back(notification);
            return;
        }

        self.emitting.set(true);
        let mut current = Some(notification);
        while let Some(notification) = current {
            self.deliver(&notification);
            current = self.pending.borrow_mut().pop_front();
        }
        self.emitting.set(false);
    }

    fn deliver(&self, notification: &Notification<T>) {
        if self.completed.get() {
            return;
        }
        let completing = matches!(notification, Notification::Completed);
        if completing {
            self.completed.set(true);
        }

        let targets: Vec<(Rc<Cell<bool>>, Sink<T>)> = self
            .sinks
            .borrow()
            .iter()
            .map(|entry| (entry.active.clone(), entry.sink.clone()))
            .collect();
        trace!(stage = self.label, sinks = targets.len(), "Delivering");

        for (active, sink) in targets {
            // Disposed during this delivery: skip silently
            if !active.get() {
                continue;
            }
            (&mut *sink.borrow_mut())(notification);
        }

        if completing {
            for entry in self.sinks.borrow_mut().drain(..) {
                entry.active.set(false);
            }
            self.pending.borrow_mut().clear();
            self.disconnect();
        }
    }
}

impl<T: Clone + 'static> Detach for Node<T> {
    fn detach(&self, id: SubscriptionId) {
        let now_empty = {
            let mut sinks = self.sinks.borrow_mut();
            let before = sinks.len();
            sinks.retain(|entry| {
                if entry.id == id {
                    entry.active.set(false);
                    false
                } else {
                    true
                }
            });
            before != sinks.len() && sinks.is_empty()
        };
        if now_empty {
            self.disconnect();
        }
    }
}

/// Write handle a stage uses to push into its own node
pub struct Emitter<T> {
    node: Rc<Node<T>>,
}

impl<T> Clone for Emitter<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
        }
    }
}

impl<T> fmt::Debug for Emitter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Emitter<{}>({})", std::any::type_name::<T>(), self.node.label)
    }
}

impl<T: Clone + 'static> Emitter<T> {
    /// Push a value occurring at `time`
    pub fn next(&self, time: Time, value: T) {
        self.node.emit(Notification::Next(time, value));
    }

    /// Push an error signal
    pub fn error(&self, error: PipelineError) {
        self.node.emit(Notification::Error(error));
    }

    /// End the stream
    pub fn complete(&self) {
        self.node.emit(Notification::Completed);
    }

    /// Push a prepared notification
    pub(crate) fn send(&self, notification: Notification<T>) {
        self.node.emit(notification);
    }

    /// Forward an error or completion unchanged
    pub(crate) fn forward<U>(&self, notification: &Notification<U>) {
        match notification {
            Notification::Next(..) => {}
            Notification::Error(e) => self.error(e.clone()),
            Notification::Completed => self.complete(),
        }
    }

    /// Whether the node has completed
    pub fn is_closed(&self) -> bool {
        self.node.completed.get()
    }
}

/// Handle to a node of the stage graph
///
/// Cloning a `Stream` clones the handle, not the node: both handles share the
/// same subscribers and stage state.
pub struct Stream<T> {
    pub(crate) node: Rc<Node<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            node: self.node.clone(),
        }
    }
}

impl<T> fmt::Debug for Stream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stream<{}>({})", std::any::type_name::<T>(), self.node.label)
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// A node with no upstream, pushed to directly (see [`Subject`](super::Subject))
    pub(crate) fn source(label: &'static str) -> (Self, Emitter<T>) {
        let node = Rc::new(Node::new(label, None));
        let emitter = Emitter { node: node.clone() };
        (Self { node }, emitter)
    }

    /// A derived node whose connector runs when it gains its first subscriber
    ///
    /// The connector receives the node's emitter and returns the upstream
    /// subscriptions it opened.
    pub fn from_connector<C>(label: &'static str, connector: C) -> Self
    where
        C: Fn(&Emitter<T>) -> Vec<Subscription> + 'static,
    {
        Self {
            node: Rc::new(Node::new(label, Some(Box::new(connector)))),
        }
    }

    /// Build a single-input stage
    ///
    /// `make` is called on every connect to build fresh stage state; the
    /// closure it returns handles each value. Errors and completion are
    /// forwarded unchanged.
    pub(crate) fn stage<U, S, M>(&self, label: &'static str, make: M) -> Stream<U>
    where
        U: Clone + 'static,
        M: Fn() -> S + 'static,
        S: FnMut(&Emitter<U>, Time, &T) + 'static,
    {
        let source = self.clone();
        Stream::from_connector(label, move |out| {
            let out = out.clone();
            let mut step = make();
            vec![source.subscribe_raw(move |notification| match notification {
                Notification::Next(time, value) => step(&out, *time, value),
                other => out.forward(other),
            })]
        })
    }

    /// Register a raw notification sink
    pub(crate) fn subscribe_raw<F>(&self, sink: F) -> Subscription
    where
        F: FnMut(&Notification<T>) + 'static,
    {
        let sink: Sink<T> = Rc::new(RefCell::new(sink));
        self.node.add_sink(sink)
    }

    /// Subscribe a value callback
    ///
    /// Errors reaching this subscription go to the unhandled-error hook.
    pub fn subscribe<F>(&self, on_next: F) -> Subscription
    where
        F: FnMut(T) + 'static,
    {
        self.subscribe_with(Observer::new(on_next))
    }

    /// Subscribe a full observer (value, error and completion callbacks)
    pub fn subscribe_with(&self, mut observer: Observer<T>) -> Subscription {
        self.subscribe_raw(move |notification| observer.notify(notification))
    }

    /// Debug name of the stage that produces this stream
    pub fn label(&self) -> &'static str {
        self.node.label
    }

    /// Number of live sinks on this node
    pub fn subscriber_count(&self) -> usize {
        self.node.sinks.borrow().len()
    }

    /// Whether this node is currently attached to its upstream
    ///
    /// Source nodes report `false`: they have no upstream.
    pub fn is_connected(&self) -> bool {
        self.node.connected.get()
    }

    /// Whether the stream has completed
    pub fn is_completed(&self) -> bool {
        self.node.completed.get()
    }
}

/// Run a user closure, turning a panic into a stage error
pub(crate) fn guard<R>(stage: &'static str, f: impl FnOnce() -> R) -> Result<R, PipelineError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| PipelineError::TransformPanicked {
        stage,
        message: panic_message(payload.as_ref()),
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Deliver an error to a handler if one exists, otherwise to the fallback hook
pub(crate) fn route_error(handler: Option<&mut Box<dyn FnMut(PipelineError)>>, error: PipelineError) {
    match handler {
        Some(handler) => {
            if let Err(panicked) = guard("on_error", || handler(error)) {
                report_unhandled(&panicked);
            }
        }
        None => report_unhandled(&error),
    }
}
