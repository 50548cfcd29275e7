// Copyright (c) 2025 - Cowboy AI, Inc.
//! Subscriptions and Observers
//!
//! A [`Subscription`] is the cancellation handle for one terminal callback.
//! Dropping the handle does not cancel anything: subscriptions live until
//! they are disposed, their stream completes, or the process exits.

use super::stream::{guard, route_error, Notification, Stream};
use super::Time;
use crate::errors::{report_unhandled, PipelineError};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::debug;
use uuid::Uuid;

/// Unique identifier of a subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Generate a new time-ordered identifier
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Implemented by nodes that can drop a sink by id
pub(crate) trait Detach {
    fn detach(&self, id: SubscriptionId);
}

/// Cancellation handle for a registered callback
pub struct Subscription {
    id: SubscriptionId,
    active: Rc<Cell<bool>>,
    node: Option<Weak<dyn Detach>>,
}

impl Subscription {
    pub(crate) fn new(id: SubscriptionId, active: Rc<Cell<bool>>, node: Weak<dyn Detach>) -> Self {
        Self {
            id,
            active,
            node: Some(node),
        }
    }

    /// Second handle to the same registration
    fn share(&self) -> Self {
        Self {
            id: self.id,
            active: self.active.clone(),
            node: self.node.clone(),
        }
    }

    /// A subscription that is already finished
    pub(crate) fn inert() -> Self {
        Self {
            id: SubscriptionId::new(),
            active: Rc::new(Cell::new(false)),
            node: None,
        }
    }

    /// Identifier of this subscription
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Whether the callback can still be invoked
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Stop delivery to this subscription
    ///
    /// Idempotent. Upstream stages that only existed for this subscription
    /// disconnect and drop their state.
    pub fn dispose(&self) {
        if !self.active.replace(false) {
            return;
        }
        debug!(subscription = %self.id, "Disposing subscription");
        if let Some(node) = self.node.as_ref().and_then(Weak::upgrade) {
            node.detach(self.id);
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// A group of subscriptions disposed together
#[derive(Debug, Default)]
pub struct CompositeSubscription {
    members: Rc<RefCell<Vec<Subscription>>>,
}

impl CompositeSubscription {
    /// Create an empty group
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscription to the group
    pub fn add(&self, subscription: Subscription) {
        self.members.borrow_mut().push(subscription);
    }

    /// Number of subscriptions that are still active
    pub fn active_count(&self) -> usize {
        self.members.borrow().iter().filter(|s| s.is_active()).count()
    }

    /// Dispose every member
    pub fn dispose(&self) {
        let members: Vec<Subscription> = self.members.borrow_mut().drain(..).collect();
        for subscription in members {
            subscription.dispose();
        }
    }

    /// Dispose the whole group on the first occurrence of `control`
    ///
    /// The returned subscription watches the control stream. It joins the
    /// group, so it ends when the control fires or the group is disposed.
    pub fn dispose_on<U: Clone + 'static>(&self, control: &Stream<U>) -> Subscription {
        let members = self.members.clone();
        let watcher = control.subscribe_raw(move |notification| {
            if let Notification::Next(..) = notification {
                let drained: Vec<Subscription> = members.borrow_mut().drain(..).collect();
                for subscription in drained {
                    subscription.dispose();
                }
            }
        });
        self.add(watcher.share());
        watcher
    }
}

type NextFn<T> = Box<dyn FnMut(Time, T)>;

/// Terminal callbacks for a stream
///
/// Only the value callback is required. Without an error callback, errors go
/// to the unhandled-error hook (log and continue).
pub struct Observer<T> {
    on_next: NextFn<T>,
    on_error: Option<Box<dyn FnMut(PipelineError)>>,
    on_completed: Option<Box<dyn FnMut()>>,
}

impl<T: Clone + 'static> Observer<T> {
    /// Observer receiving values only
    pub fn new<F>(mut on_next: F) -> Self
    where
        F: FnMut(T) + 'static,
    {
        Self::timed(move |_, value| on_next(value))
    }

    /// Observer receiving values with their occurrence time
    pub fn timed<F>(on_next: F) -> Self
    where
        F: FnMut(Time, T) + 'static,
    {
        Self {
            on_next: Box::new(on_next),
            on_error: None,
            on_completed: None,
        }
    }

    /// Attach an error callback
    pub fn on_error<F>(mut self, on_error: F) -> Self
    where
        F: FnMut(PipelineError) + 'static,
    {
        self.on_error = Some(Box::new(on_error));
        self
    }

    /// Attach a completion callback
    pub fn on_completed<F>(mut self, on_completed: F) -> Self
    where
        F: FnMut() + 'static,
    {
        self.on_completed = Some(Box::new(on_completed));
        self
    }

    pub(crate) fn notify(&mut self, notification: &Notification<T>) {
        match notification {
            Notification::Next(time, value) => {
                let on_next = &mut self.on_next;
                if let Err(panicked) = guard("subscribe", || on_next(*time, value.clone())) {
                    route_error(self.on_error.as_mut(), panicked);
                }
            }
            Notification::Error(error) => route_error(self.on_error.as_mut(), error.clone()),
            Notification::Completed => {
                if let Some(on_completed) = self.on_completed.as_mut() {
                    if let Err(panicked) = guard("on_completed", || on_completed()) {
                        report_unhandled(&panicked);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{reset_unhandled_error_hook, set_unhandled_error_hook};
    use crate::frp::Subject;

    #[test]
    fn test_dispose_is_idempotent() {
        let subject: Subject<i32> = Subject::new();
        let count = Rc::new(Cell::new(0));
        let counter = count.clone();
        let sub = subject.stream().subscribe(move |_| counter.set(counter.get() + 1));

        subject.next(0, 1);
        sub.dispose();
        sub.dispose();
        subject.next(1, 2);

        assert_eq!(count.get(), 1);
        assert!(!sub.is_active());
    }

    #[test]
    fn test_dispose_during_delivery_skips_sibling() {
        let subject: Subject<i32> = Subject::new();
        let late = Rc::new(RefCell::new(None::<Subscription>));
        let hits = Rc::new(Cell::new(0));

        let target = late.clone();
        let _killer = subject.stream().subscribe(move |_| {
            if let Some(sub) = target.borrow().as_ref() {
                sub.dispose();
            }
        });
        let counter = hits.clone();
        *late.borrow_mut() = Some(subject.stream().subscribe(move |_| counter.set(counter.get() + 1)));

        subject.next(0, 1);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_panicking_callback_goes_to_error_handler() {
        let subject: Subject<i32> = Subject::new();
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = errors.clone();

        let _sub = subject.stream().subscribe_with(
            Observer::new(|v: i32| {
                if v == 2 {
                    panic!("bad value");
                }
            })
            .on_error(move |e| sink.borrow_mut().push(e)),
        );

        subject.next(0, 1);
        subject.next(1, 2);
        subject.next(2, 3);

        assert_eq!(errors.borrow().len(), 1);
        assert!(matches!(
            errors.borrow()[0],
            PipelineError::TransformPanicked { stage: "subscribe", .. }
        ));
    }

    #[test]
    fn test_unhandled_error_reaches_hook() {
        let seen = Rc::new(Cell::new(0));
        let counter = seen.clone();
        set_unhandled_error_hook(move |_| counter.set(counter.get() + 1));

        let subject: Subject<i32> = Subject::new();
        let _sub = subject.stream().subscribe(|_| {});
        subject.error(PipelineError::SourceFailed("unplugged".into()));
        reset_unhandled_error_hook();

        assert_eq!(seen.get(), 1);
    }

    #[test]
    fn test_composite_dispose_on_control() {
        let input: Subject<i32> = Subject::new();
        let quit: Subject<()> = Subject::new();
        let group = CompositeSubscription::new();
        let count = Rc::new(Cell::new(0));

        for _ in 0..2 {
            let counter = count.clone();
            group.add(input.stream().subscribe(move |_| counter.set(counter.get() + 1)));
        }
        let watch = group.dispose_on(&quit.stream());
        assert_eq!(group.active_count(), 3);

        input.next(0, 1);
        quit.next(1, ());
        input.next(2, 2);

        assert_eq!(count.get(), 2);
        assert_eq!(group.active_count(), 0);
        assert!(!watch.is_active());
        assert_eq!(quit.stream().subscriber_count(), 0);
    }

    #[test]
    fn test_composite_dispose_releases_control_watcher() {
        let quit: Subject<()> = Subject::new();
        let group = CompositeSubscription::new();
        let watch = group.dispose_on(&quit.stream());
        assert_eq!(quit.stream().subscriber_count(), 1);

        group.dispose();

        assert!(!watch.is_active());
        assert_eq!(quit.stream().subscriber_count(), 0);
    }
}
