// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Named publish/subscribe channel with one-shot and persistent subscriptions.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tracing::{debug, error, warn};
use webgap_core::types::{Payload, SubscriptionId};

use crate::close::close;

/// Per-handler result of a fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failed,
}

/// Conversion from a handler's return value into an [`Outcome`].
///
/// Handlers that return `()` always succeed. Handlers that return a
/// `Result` fail on `Err`, and the error is logged.
pub trait IntoOutcome {
    fn into_outcome(self) -> Outcome;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Outcome {
        Outcome::Success
    }
}

impl IntoOutcome for Outcome {
    fn into_outcome(self) -> Outcome {
        self
    }
}

impl<E: std::fmt::Display> IntoOutcome for Result<(), E> {
    fn into_outcome(self) -> Outcome {
        match self {
            Ok(()) => Outcome::Success,
            Err(e) => {
                warn!(error = %e, "channel handler reported failure");
                Outcome::Failed
            }
        }
    }
}

/// Shared handler object. Subscribing the same `Handler` twice reuses its id.
pub type Handler<T = Payload> = Arc<dyn Fn(&[T]) -> Outcome + Send + Sync>;

/// Wrap a closure into a shareable [`Handler`].
pub fn handler<T, F, R>(f: F) -> Handler<T>
where
    F: Fn(&[T]) -> R + Send + Sync + 'static,
    R: IntoOutcome,
{
    Arc::new(move |args: &[T]| f(args).into_outcome())
}

/// What to remove from a channel: a subscription id or a handler object.
pub enum Unsubscribe<'a, T> {
    Id(SubscriptionId),
    Handler(&'a Handler<T>),
}

impl<T> From<SubscriptionId> for Unsubscribe<'_, T> {
    fn from(id: SubscriptionId) -> Self {
        Self::Id(id)
    }
}

impl<'a, T> From<&'a Handler<T>> for Unsubscribe<'a, T> {
    fn from(handler: &'a Handler<T>) -> Self {
        Self::Handler(handler)
    }
}

struct State<T> {
    next_id: u64,
    handlers: Vec<(SubscriptionId, Handler<T>)>,
    fired: bool,
    fire_args: Vec<T>,
    enabled: bool,
}

impl<T> State<T> {
    fn contains(&self, id: SubscriptionId) -> bool {
        self.handlers.iter().any(|(existing, _)| *existing == id)
    }

    /// Next counter value not already taken by an explicit id.
    fn allocate(&mut self) -> SubscriptionId {
        loop {
            let id = SubscriptionId(self.next_id);
            self.next_id += 1;
            if !self.contains(id) {
                return id;
            }
        }
    }

    fn insert(&mut self, id: SubscriptionId, handler: Handler<T>) {
        match self.handlers.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = handler,
            None => self.handlers.push((id, handler)),
        }
    }

    /// Whether `handler` is still the one registered under `id`.
    fn holds(&self, id: SubscriptionId, handler: &Handler<T>) -> bool {
        self.handlers
            .iter()
            .any(|(existing, h)| *existing == id && Arc::ptr_eq(h, handler))
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(existing, _)| *existing != id);
        self.handlers.len() != before
    }
}

/// Publish/subscribe channel.
///
/// Cloning a `Channel` yields another handle to the same subscriber set.
/// No lock is held while handlers run, so handlers may subscribe,
/// unsubscribe or fire re-entrantly.
pub struct Channel<T = Payload> {
    kind: Arc<str>,
    state: Arc<Mutex<State<T>>>,
}

impl<T> Clone for Channel<T> {
    fn clone(&self) -> Self {
        Self {
            kind: Arc::clone(&self.kind),
            state: Arc::clone(&self.state),
        }
    }
}

impl<T> std::fmt::Debug for Channel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("Channel")
            .field("kind", &self.kind)
            .field("handlers", &state.handlers.len())
            .field("fired", &state.fired)
            .field("enabled", &state.enabled)
            .finish()
    }
}

fn lock<T>(state: &Mutex<State<T>>) -> MutexGuard<'_, State<T>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T> Channel<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(kind: impl Into<String>) -> Self {
        let kind: String = kind.into();
        Self {
            kind: Arc::from(kind),
            state: Arc::new(Mutex::new(State {
                next_id: 0,
                handlers: Vec::new(),
                fired: false,
                fire_args: Vec::new(),
                enabled: true,
            })),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Subscribe a closure; it runs on every fire until unsubscribed.
    pub fn subscribe<F, R>(&self, f: F) -> SubscriptionId
    where
        F: Fn(&[T]) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        self.subscribe_handler(handler(f))
    }

    /// Subscribe a shared handler. If this exact handler object is already
    /// subscribed, its existing id is returned and nothing is added.
    pub fn subscribe_handler(&self, handler: Handler<T>) -> SubscriptionId {
        let mut state = lock(&self.state);
        if let Some((id, _)) = state.handlers.iter().find(|(_, h)| Arc::ptr_eq(h, &handler)) {
            return *id;
        }
        let id = state.allocate();
        state.handlers.push((id, handler));
        id
    }

    /// Subscribe under a caller-chosen id, replacing any handler already
    /// registered under it.
    pub fn subscribe_with_id<F, R>(&self, id: SubscriptionId, f: F) -> SubscriptionId
    where
        F: Fn(&[T]) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        lock(&self.state).insert(id, handler(f));
        id
    }

    /// Subscribe if a handler was supplied. `None` is ignored.
    pub fn subscribe_opt<F, R>(&self, f: Option<F>) -> Option<SubscriptionId>
    where
        F: Fn(&[T]) -> R + Send + Sync + 'static,
        R: IntoOutcome,
    {
        match f {
            Some(f) => Some(self.subscribe(f)),
            None => {
                debug!(channel = %self.kind, "ignoring subscription without a handler");
                None
            }
        }
    }

    /// Subscribe `f` bound to `context`; `f` receives the context first.
    pub fn subscribe_bound<C, F, R>(&self, context: C, f: F) -> SubscriptionId
    where
        C: Send + Sync + 'static,
        F: Fn(&C, &[T]) -> R + Send + Sync + 'static,
        R: IntoOutcome + 'static,
    {
        self.subscribe(close(context, f, None))
    }

    /// Run `f` once on the next fire, then drop it.
    ///
    /// If the channel has already fired, `f` runs immediately with the
    /// arguments of the last fire and `None` is returned.
    pub fn subscribe_once<F, R>(&self, f: F) -> Option<SubscriptionId>
    where
        F: FnOnce(&[T]) -> R + Send + 'static,
        R: IntoOutcome,
    {
        let mut state = lock(&self.state);
        if state.fired {
            let args = state.fire_args.clone();
            drop(state);
            let _ = invoke(&self.kind, None, &args, f);
            return None;
        }

        let id = state.allocate();
        let slot = Mutex::new(Some(f));
        let owner: Weak<Mutex<State<T>>> = Arc::downgrade(&self.state);
        let wrapper: Handler<T> = Arc::new(move |args: &[T]| {
            let taken = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
            match taken {
                Some(f) => {
                    if let Some(owner) = owner.upgrade() {
                        lock(&owner).remove(id);
                    }
                    f(args).into_outcome()
                }
                None => Outcome::Success,
            }
        });
        state.handlers.push((id, wrapper));
        Some(id)
    }

    /// One-shot variant of [`Channel::subscribe_bound`].
    pub fn subscribe_once_bound<C, F, R>(&self, context: C, f: F) -> Option<SubscriptionId>
    where
        C: Send + 'static,
        F: FnOnce(&C, &[T]) -> R + Send + 'static,
        R: IntoOutcome,
    {
        self.subscribe_once(move |args: &[T]| f(&context, args))
    }

    /// Remove a subscription by id or by handler object. Unknown targets
    /// are ignored. Returns whether anything was removed.
    pub fn unsubscribe<'a>(&self, target: impl Into<Unsubscribe<'a, T>>) -> bool
    where
        T: 'a,
    {
        let mut state = lock(&self.state);
        let id = match target.into() {
            Unsubscribe::Id(id) => Some(id),
            Unsubscribe::Handler(handler) => state
                .handlers
                .iter()
                .find(|(_, h)| Arc::ptr_eq(h, handler))
                .map(|(id, _)| *id),
        };
        id.is_some_and(|id| state.remove(id))
    }

    /// Invoke every subscribed handler with `args`.
    ///
    /// Handlers run in subscription order over the set registered when the
    /// fire started; handlers removed or replaced by an earlier handler in
    /// the same fire are skipped. The channel counts as fired before the
    /// first handler runs, so a one-shot subscription made mid-fire runs
    /// straight away with these `args`. Returns `false` if any handler
    /// failed or panicked. A disabled channel does nothing and returns `true`.
    pub fn fire(&self, args: &[T]) -> bool {
        let snapshot = {
            let mut state = lock(&self.state);
            if !state.enabled {
                return true;
            }
            state.fired = true;
            state.fire_args = args.to_vec();
            state.handlers.clone()
        };

        let mut failed = false;
        for (id, handler) in snapshot {
            if !lock(&self.state).holds(id, &handler) {
                continue;
            }
            let outcome = invoke(&self.kind, Some(id), args, |args| handler(args));
            failed |= outcome == Outcome::Failed;
        }
        !failed
    }

    pub fn fired(&self) -> bool {
        lock(&self.state).fired
    }

    /// Arguments of the most recent fire (empty before the first fire).
    pub fn fire_args(&self) -> Vec<T> {
        lock(&self.state).fire_args.clone()
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.state).enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        lock(&self.state).enabled = enabled;
    }

    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        lock(&self.state).contains(id)
    }

    pub fn handler_count(&self) -> usize {
        lock(&self.state).handlers.len()
    }
}

/// Run one handler, converting a panic into a logged failure.
fn invoke<T, F, R>(kind: &str, id: Option<SubscriptionId>, args: &[T], f: F) -> Outcome
where
    F: FnOnce(&[T]) -> R,
    R: IntoOutcome,
{
    match catch_unwind(AssertUnwindSafe(|| f(args).into_outcome())) {
        Ok(outcome) => outcome,
        Err(panic) => {
            error!(
                channel = kind,
                subscription = ?id,
                panic = panic_message(&panic),
                "channel handler panicked"
            );
            Outcome::Failed
        }
    }
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
