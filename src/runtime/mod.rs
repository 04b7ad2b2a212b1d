//! Single-threaded event loop driving deferred results.
//!
//! The loop owns two queues: a FIFO microtask queue for chain continuations,
//! and a deadline-ordered timer queue for macrotasks. Each turn drains every
//! microtask, then runs at most one due timer (draining microtasks again
//! after it). Time comes from a [`Clock`]: virtual by default, so runs are
//! deterministic and a 200ms timer does not actually wait.

pub mod clock;
pub mod error;
pub mod queue;
pub mod timer;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, trace, warn};

pub use clock::{Clock, ClockKind, SystemClock, VirtualClock};
pub use error::RuntimeError;
pub use queue::{Task, TaskQueue};
pub use timer::{TimerId, TimerQueue};

use crate::config::RuntimeConfig;
use crate::future::{Future, FutureId};

/// Default number of tasks a runtime may execute before giving up
pub const DEFAULT_TASK_BUDGET: usize = 1_000_000;

/// A rejection recorded while no reaction was attached to the future
struct RejectionRecord {
    future: FutureId,
    handled: Rc<Cell<bool>>,
}

/// Shared loop state; every future holds a reference to it
pub(crate) struct Scheduler {
    microtasks: TaskQueue,
    timers: RefCell<TimerQueue>,
    clock: Box<dyn Clock>,
    next_future: Cell<u64>,
    task_budget: usize,
    tasks_run: Cell<usize>,
    timers_fired: Cell<usize>,
    rejections: RefCell<Vec<RejectionRecord>>,
}

impl Scheduler {
    pub(crate) fn enqueue(&self, task: Task) {
        self.microtasks.enqueue(task);
        trace!(queued = self.microtasks.len(), "microtask enqueued");
    }

    pub(crate) fn next_future_id(&self) -> FutureId {
        let id = self.next_future.get();
        self.next_future.set(id + 1);
        FutureId::new(id)
    }

    pub(crate) fn set_timeout(&self, delay_ms: u64, task: Task) -> TimerId {
        let deadline = self.clock.now_ms().saturating_add(delay_ms);
        let id = self.timers.borrow_mut().schedule(deadline, task);
        trace!(deadline, ?id, "timer scheduled");
        id
    }

    pub(crate) fn track_rejection(&self, future: FutureId, handled: Rc<Cell<bool>>) {
        self.rejections
            .borrow_mut()
            .push(RejectionRecord { future, handled });
    }
}

/// Counters describing the work a runtime has done so far
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Microtasks and timer callbacks executed
    pub tasks_run: usize,
    /// Timer callbacks executed
    pub timers_fired: usize,
    /// Clock reading when the loop went idle
    pub now_ms: u64,
}

/// Handle to an event loop.
///
/// Cloning is cheap and yields another handle to the same loop.
#[derive(Clone)]
pub struct Runtime {
    scheduler: Rc<Scheduler>,
}

impl Runtime {
    /// Create a runtime on a virtual clock
    pub fn new() -> Self {
        Self::with_clock(Box::new(VirtualClock::new()))
    }

    /// Create a runtime on the given clock
    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self::build(clock, DEFAULT_TASK_BUDGET)
    }

    /// Create a runtime from configuration
    pub fn with_config(config: &RuntimeConfig) -> Self {
        Self::build(config.clock.build(), config.task_budget)
    }

    fn build(clock: Box<dyn Clock>, task_budget: usize) -> Self {
        Self {
            scheduler: Rc::new(Scheduler {
                microtasks: TaskQueue::new(),
                timers: RefCell::new(TimerQueue::new()),
                clock,
                next_future: Cell::new(1),
                task_budget,
                tasks_run: Cell::new(0),
                timers_fired: Cell::new(0),
                rejections: RefCell::new(Vec::new()),
            }),
        }
    }

    pub(crate) fn scheduler(&self) -> &Rc<Scheduler> {
        &self.scheduler
    }

    /// Append a microtask
    pub fn enqueue(&self, task: impl FnOnce() + 'static) {
        self.scheduler.enqueue(Box::new(task));
    }

    /// Drain the microtask queue, returning how many tasks ran
    pub fn run_pending(&self) -> usize {
        let ran = self.scheduler.microtasks.run_pending();
        self.count_tasks(ran);
        ran
    }

    /// Run `task` as a macrotask once `delay_ms` have elapsed
    pub fn set_timeout(&self, delay_ms: u64, task: impl FnOnce() + 'static) -> TimerId {
        self.scheduler.set_timeout(delay_ms, Box::new(task))
    }

    /// Current clock reading in milliseconds
    pub fn now_ms(&self) -> u64 {
        self.scheduler.clock.now_ms()
    }

    /// Check if any microtask or timer is waiting
    pub fn has_pending_work(&self) -> bool {
        !self.scheduler.microtasks.is_empty() || !self.scheduler.timers.borrow().is_empty()
    }

    /// One loop iteration: drain microtasks, then fire at most one timer.
    ///
    /// Returns `false` once there was nothing at all to do.
    pub fn turn(&self) -> Result<bool, RuntimeError> {
        let ran = self.drain()?;

        let next_deadline = self.scheduler.timers.borrow().next_deadline();
        let Some(deadline) = next_deadline else {
            return Ok(ran > 0);
        };

        let now = self.now_ms();
        if deadline > now {
            debug!(from_ms = now, to_ms = deadline, "advancing clock");
            self.scheduler.clock.advance_to(deadline);
        }

        let due = self.scheduler.timers.borrow_mut().pop_due(self.now_ms());
        if let Some(task) = due {
            self.check_budget()?;
            debug!(now_ms = self.now_ms(), "timer fired");
            task();
            self.count_tasks(1);
            self.scheduler
                .timers_fired
                .set(self.scheduler.timers_fired.get() + 1);
            self.drain()?;
        }
        Ok(true)
    }

    /// Run until no microtasks or timers remain
    pub fn run(&self) -> Result<RunStats, RuntimeError> {
        while self.turn()? {}

        for future in self.unhandled_rejections() {
            warn!(%future, "unhandled rejection");
        }
        Ok(self.stats())
    }

    /// Run the loop until `future` settles, returning its result
    pub fn block_on<T, E>(&self, future: &Future<T, E>) -> Result<Result<T, E>, RuntimeError>
    where
        T: Clone + 'static,
        E: Clone + 'static,
    {
        future.mark_handled();
        loop {
            if let Some(result) = future.result() {
                return Ok(result);
            }
            if !self.turn()? {
                return Err(RuntimeError::Stalled {
                    future: future.id(),
                });
            }
        }
    }

    /// Futures that were rejected and have never had a reaction attached.
    ///
    /// Records whose future has since been handled are dropped.
    pub fn unhandled_rejections(&self) -> Vec<FutureId> {
        let mut rejections = self.scheduler.rejections.borrow_mut();
        rejections.retain(|record| !record.handled.get());
        rejections.iter().map(|record| record.future).collect()
    }

    /// Work counters so far
    pub fn stats(&self) -> RunStats {
        RunStats {
            tasks_run: self.scheduler.tasks_run.get(),
            timers_fired: self.scheduler.timers_fired.get(),
            now_ms: self.now_ms(),
        }
    }

    /// Drain microtasks within the remaining task budget
    fn drain(&self) -> Result<usize, RuntimeError> {
        let remaining = self
            .scheduler
            .task_budget
            .saturating_sub(self.scheduler.tasks_run.get());
        let ran = self.scheduler.microtasks.run_at_most(remaining);
        self.count_tasks(ran);
        if !self.scheduler.microtasks.is_empty() {
            return Err(self.budget_exhausted());
        }
        Ok(ran)
    }

    fn check_budget(&self) -> Result<(), RuntimeError> {
        if self.scheduler.tasks_run.get() >= self.scheduler.task_budget {
            return Err(self.budget_exhausted());
        }
        Ok(())
    }

    fn budget_exhausted(&self) -> RuntimeError {
        let err = RuntimeError::BudgetExhausted {
            budget: self.scheduler.task_budget,
            queued: self.scheduler.microtasks.len(),
        };
        warn!(%err, "stopping event loop");
        err
    }

    fn count_tasks(&self, n: usize) {
        self.scheduler
            .tasks_run
            .set(self.scheduler.tasks_run.get() + n);
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("microtasks", &self.scheduler.microtasks)
            .field("timers", &self.scheduler.timers.borrow())
            .field("now_ms", &self.now_ms())
            .finish()
    }
}
