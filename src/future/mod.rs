//! Single-assignment deferred results.
//!
//! A [`Future`] starts pending and settles exactly once, either fulfilled
//! with a value or rejected with a reason. The settlement capability is a
//! [`Resolver`], handed to the initializer passed to [`Runtime::future`].
//!
//! # State machine
//! - Pending → Fulfilled (success)
//! - Pending → Rejected (failure)
//! - Once settled the state and payload never change; later resolver calls
//!   are ignored.
//!
//! Settling with another future adopts that future's eventual state, while
//! failing never flattens: a future given as a rejection reason stays the
//! reason. Chain handlers registered with [`Future::then`] and friends never
//! run on the caller's stack; they are queued on the runtime's microtask
//! queue in registration order.

pub mod combinators;

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::runtime::{Runtime, Scheduler};

/// Runtime-unique identity of a future, used in logs and reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FutureId(u64);

impl FutureId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FutureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Future({})", self.0)
    }
}

/// Observable state of a future
#[derive(Debug, Clone, PartialEq)]
pub enum State<T, E> {
    /// Not settled yet
    Pending,
    /// Settled successfully
    Fulfilled(T),
    /// Settled with a failure reason
    Rejected(E),
}

impl<T, E> State<T, E> {
    /// Returns `true` if the future is no longer pending.
    pub fn is_settled(&self) -> bool {
        !matches!(self, State::Pending)
    }

    /// Lowercase name of the state
    pub fn label(&self) -> &'static str {
        match self {
            State::Pending => "pending",
            State::Fulfilled(_) => "fulfilled",
            State::Rejected(_) => "rejected",
        }
    }
}

/// What a resolver may be settled with: a plain value, or a future whose
/// eventual state should be adopted
pub enum Resolution<T, E> {
    Value(T),
    Future(Future<T, E>),
}

impl<T, E> From<Future<T, E>> for Resolution<T, E> {
    fn from(future: Future<T, E>) -> Self {
        Resolution::Future(future)
    }
}

/// Result of a chain handler.
///
/// `Reject` plays the part of a thrown error: the derived future is
/// rejected with it.
pub enum Outcome<T, E> {
    /// Fulfill the derived future with this value
    Fulfill(T),
    /// Adopt the state of another future
    Adopt(Future<T, E>),
    /// Reject the derived future
    Reject(E),
}

impl<T, E> From<Result<T, E>> for Outcome<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Outcome::Fulfill(value),
            Err(reason) => Outcome::Reject(reason),
        }
    }
}

impl<T, E> From<Future<T, E>> for Outcome<T, E> {
    fn from(future: Future<T, E>) -> Self {
        Outcome::Adopt(future)
    }
}

type Reaction<T, E> = Box<dyn FnOnce(Result<T, E>)>;

enum Slot<T, E> {
    Pending(Vec<Reaction<T, E>>),
    Settled(Result<T, E>),
}

struct Core<T, E> {
    id: FutureId,
    scheduler: Rc<Scheduler>,
    slot: RefCell<Slot<T, E>>,
    /// Set by the first resolver call; the future's fate is decided even if
    /// it is still waiting on an adopted future.
    locked: Cell<bool>,
    /// Set once any reaction is attached or the future is awaited
    handled: Rc<Cell<bool>>,
}

/// A value of type `T` (or a failure of type `E`) that becomes available
/// at most once.
///
/// Cloning yields another handle to the same future; use
/// [`Future::ptr_eq`] to compare identity.
pub struct Future<T, E> {
    core: Rc<Core<T, E>>,
}

impl<T, E> Clone for Future<T, E> {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Future<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &*self.core.slot.borrow() {
            Slot::Pending(_) => "pending",
            Slot::Settled(Ok(_)) => "fulfilled",
            Slot::Settled(Err(_)) => "rejected",
        };
        write!(f, "{} <{}>", self.core.id, state)
    }
}

impl<T, E> Future<T, E> {
    /// Identity of this future
    pub fn id(&self) -> FutureId {
        self.core.id
    }

    /// Check if both handles refer to the same future
    pub fn ptr_eq(&self, other: &Future<T, E>) -> bool {
        Rc::ptr_eq(&self.core, &other.core)
    }

    pub fn is_pending(&self) -> bool {
        matches!(&*self.core.slot.borrow(), Slot::Pending(_))
    }

    pub fn is_fulfilled(&self) -> bool {
        matches!(&*self.core.slot.borrow(), Slot::Settled(Ok(_)))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(&*self.core.slot.borrow(), Slot::Settled(Err(_)))
    }

    pub(crate) fn mark_handled(&self) {
        self.core.handled.set(true);
    }
}

impl<T, E> Future<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Create a pending future together with its resolver
    pub(crate) fn pending(scheduler: &Rc<Scheduler>) -> (Future<T, E>, Resolver<T, E>) {
        let future = Future {
            core: Rc::new(Core {
                id: scheduler.next_future_id(),
                scheduler: scheduler.clone(),
                slot: RefCell::new(Slot::Pending(Vec::new())),
                locked: Cell::new(false),
                handled: Rc::new(Cell::new(false)),
            }),
        };
        trace!(future = %future.id(), "created");
        let resolver = Resolver {
            future: future.clone(),
        };
        (future, resolver)
    }

    /// Snapshot of the current state
    pub fn state(&self) -> State<T, E> {
        match &*self.core.slot.borrow() {
            Slot::Pending(_) => State::Pending,
            Slot::Settled(Ok(value)) => State::Fulfilled(value.clone()),
            Slot::Settled(Err(reason)) => State::Rejected(reason.clone()),
        }
    }

    /// The settled result, or `None` while pending
    pub fn result(&self) -> Option<Result<T, E>> {
        match &*self.core.slot.borrow() {
            Slot::Pending(_) => None,
            Slot::Settled(result) => Some(result.clone()),
        }
    }

    /// Derive a future from this one's fulfillment; rejections pass through
    /// unchanged.
    pub fn then<U, F>(&self, on_fulfilled: F) -> Future<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Outcome<U, E> + 'static,
    {
        self.then_both(on_fulfilled, Outcome::Reject)
    }

    /// Derive a future with handlers for both outcomes.
    ///
    /// Exactly one handler runs. A `Reject` returned by `on_fulfilled`
    /// rejects the derived future; it is not routed to `on_rejected`.
    pub fn then_both<U, F, R>(&self, on_fulfilled: F, on_rejected: R) -> Future<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> Outcome<U, E> + 'static,
        R: FnOnce(E) -> Outcome<U, E> + 'static,
    {
        let (derived, resolver) = Future::pending(&self.core.scheduler);
        trace!(parent = %self.id(), derived = %derived.id(), "chained");
        self.subscribe(move |result| {
            let outcome = match result {
                Ok(value) => on_fulfilled(value),
                Err(reason) => on_rejected(reason),
            };
            resolver.apply(outcome);
        });
        derived
    }

    /// Derive a future that recovers from rejection; fulfillment passes
    /// through unchanged.
    pub fn catch<R>(&self, on_rejected: R) -> Future<T, E>
    where
        R: FnOnce(E) -> Outcome<T, E> + 'static,
    {
        self.then_both(Outcome::Fulfill, on_rejected)
    }

    /// Transform the fulfillment value
    pub fn map<U, F>(&self, f: F) -> Future<U, E>
    where
        U: Clone + 'static,
        F: FnOnce(T) -> U + 'static,
    {
        self.then(move |value| Outcome::Fulfill(f(value)))
    }

    /// Attach a reaction that receives a copy of the settled result.
    ///
    /// The reaction always runs as a microtask, even when the future has
    /// already settled.
    pub(crate) fn subscribe(&self, reaction: impl FnOnce(Result<T, E>) + 'static) {
        self.core.handled.set(true);
        let settled = {
            let mut slot = self.core.slot.borrow_mut();
            match &mut *slot {
                Slot::Pending(reactions) => {
                    reactions.push(Box::new(reaction));
                    return;
                }
                Slot::Settled(result) => result.clone(),
            }
        };
        self.core
            .scheduler
            .enqueue(Box::new(move || reaction(settled)));
    }

    /// Move from pending to settled and queue every waiting reaction
    fn transition(&self, result: Result<T, E>) {
        let reactions = {
            let mut slot = self.core.slot.borrow_mut();
            let Slot::Pending(reactions) = &mut *slot else {
                trace!(future = %self.id(), "already settled; ignoring");
                return;
            };
            let reactions = std::mem::take(reactions);
            *slot = Slot::Settled(result.clone());
            reactions
        };

        match &result {
            Ok(_) => trace!(future = %self.id(), reactions = reactions.len(), "fulfilled"),
            Err(_) => {
                trace!(future = %self.id(), reactions = reactions.len(), "rejected");
                if !self.core.handled.get() {
                    self.core
                        .scheduler
                        .track_rejection(self.id(), self.core.handled.clone());
                }
            }
        }

        for reaction in reactions {
            let result = result.clone();
            self.core
                .scheduler
                .enqueue(Box::new(move || reaction(result)));
        }
    }

    /// Settle this future with the eventual state of `source`
    fn follow(&self, source: Future<T, E>) {
        if self.ptr_eq(&source) {
            warn!(future = %self.id(), "future cannot adopt itself; it will never settle");
            return;
        }
        let target = self.clone();
        self.core.scheduler.enqueue(Box::new(move || {
            let follower = target.clone();
            source.subscribe(move |result| follower.transition(result));
        }));
    }
}

/// Settlement capability for one future.
///
/// Only the first call to [`settle`](Resolver::settle),
/// [`adopt`](Resolver::adopt), [`resolve`](Resolver::resolve) or
/// [`fail`](Resolver::fail) has any effect. Clones share that rule, so a
/// resolver may be handed to a timer callback and to the initializer at once.
pub struct Resolver<T, E> {
    future: Future<T, E>,
}

impl<T, E> Clone for Resolver<T, E> {
    fn clone(&self) -> Self {
        Self {
            future: self.future.clone(),
        }
    }
}

impl<T, E> fmt::Debug for Resolver<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("future", &self.future)
            .field("resolved", &self.is_resolved())
            .finish()
    }
}

impl<T, E> Resolver<T, E> {
    /// Check if a settlement call has already been accepted
    pub fn is_resolved(&self) -> bool {
        self.future.core.locked.get()
    }

    fn lock(&self) -> bool {
        if self.future.core.locked.replace(true) {
            trace!(future = %self.future.id(), "already resolved; ignoring");
            return false;
        }
        true
    }
}

impl<T, E> Resolver<T, E>
where
    T: Clone + 'static,
    E: Clone + 'static,
{
    /// Fulfill with `value`
    pub fn settle(&self, value: T) {
        if self.lock() {
            self.future.transition(Ok(value));
        }
    }

    /// Adopt the eventual state of `source`
    pub fn adopt(&self, source: Future<T, E>) {
        if self.lock() {
            self.future.follow(source);
        }
    }

    /// Settle with a plain value or adopt a future, whichever `resolution` is
    pub fn resolve(&self, resolution: impl Into<Resolution<T, E>>) {
        match resolution.into() {
            Resolution::Value(value) => self.settle(value),
            Resolution::Future(source) => self.adopt(source),
        }
    }

    /// Reject with `reason`. A future given as the reason is not adopted.
    pub fn fail(&self, reason: E) {
        if self.lock() {
            self.future.transition(Err(reason));
        }
    }

    /// Settle according to a chain handler's outcome
    pub fn apply(&self, outcome: Outcome<T, E>) {
        match outcome {
            Outcome::Fulfill(value) => self.settle(value),
            Outcome::Adopt(source) => self.adopt(source),
            Outcome::Reject(reason) => self.fail(reason),
        }
    }
}

impl Runtime {
    /// Create a pending future and the resolver that settles it
    pub fn pending<T, E>(&self) -> (Future<T, E>, Resolver<T, E>)
    where
        T: Clone + 'static,
        E: Clone + 'static,
    {
        Future::pending(self.scheduler())
    }

    /// Construct a future, running `initializer` synchronously.
    ///
    /// An `Err` returned by the initializer rejects the future, unless the
    /// initializer already resolved it.
    pub fn future<T, E, F>(&self, initializer: F) -> Future<T, E>
    where
        T: Clone + 'static,
        E: Clone + 'static,
        F: FnOnce(Resolver<T, E>) -> Result<(), E>,
    {
        let (future, resolver) = self.pending();
        if let Err(reason) = initializer(resolver.clone()) {
            resolver.fail(reason);
        }
        future
    }

    /// A future already fulfilled with `value`. Observers still run
    /// asynchronously.
    pub fn resolved<T, E>(&self, value: T) -> Future<T, E>
    where
        T: Clone + 'static,
        E: Clone + 'static,
    {
        let (future, resolver) = self.pending();
        resolver.settle(value);
        future
    }

    /// A future already rejected with `reason`
    pub fn rejected<T, E>(&self, reason: E) -> Future<T, E>
    where
        T: Clone + 'static,
        E: Clone + 'static,
    {
        let (future, resolver) = self.pending();
        resolver.fail(reason);
        future
    }

    /// Lift a resolution into a future.
    ///
    /// A future is returned as is (same identity); a plain value becomes a
    /// fulfilled future.
    pub fn resolve<T, E>(&self, resolution: impl Into<Resolution<T, E>>) -> Future<T, E>
    where
        T: Clone + 'static,
        E: Clone + 'static,
    {
        match resolution.into() {
            Resolution::Future(future) => future,
            Resolution::Value(value) => self.resolved(value),
        }
    }

    /// A future settled with `result` by a timer after `delay_ms`
    pub fn after<T, E>(&self, delay_ms: u64, result: Result<T, E>) -> Future<T, E>
    where
        T: Clone + 'static,
        E: Clone + 'static,
    {
        let (future, resolver) = self.pending();
        self.set_timeout(delay_ms, move || match result {
            Ok(value) => resolver.settle(value),
            Err(reason) => resolver.fail(reason),
        });
        future
    }

    /// A future fulfilled with `value` by a timer after `delay_ms`
    pub fn delay<T, E>(&self, delay_ms: u64, value: T) -> Future<T, E>
    where
        T: Clone + 'static,
        E: Clone + 'static,
    {
        self.after(delay_ms, Ok(value))
    }
}

#[cfg(test)]
mod tests;
