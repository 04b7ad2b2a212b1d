//! FIFO microtask queue.

use std::cell::RefCell;
use std::collections::VecDeque;

/// A unit of deferred work
pub type Task = Box<dyn FnOnce()>;

/// First-in first-out queue of microtasks.
///
/// Tasks enqueued while the queue is draining run in the same drain, after
/// everything that was already waiting.
#[derive(Default)]
pub struct TaskQueue {
    tasks: RefCell<VecDeque<Task>>,
}

impl TaskQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a task to the back of the queue
    pub fn enqueue(&self, task: Task) {
        self.tasks.borrow_mut().push_back(task);
    }

    /// Run tasks until the queue is empty, returning how many ran
    pub fn run_pending(&self) -> usize {
        self.run_at_most(usize::MAX)
    }

    /// Run at most `limit` tasks, returning how many ran
    pub fn run_at_most(&self, limit: usize) -> usize {
        let mut ran = 0;
        while ran < limit {
            // The borrow must end before the task runs; tasks enqueue more tasks.
            let next = self.tasks.borrow_mut().pop_front();
            let Some(task) = next else {
                break;
            };
            task();
            ran += 1;
        }
        ran
    }

    /// Number of tasks waiting to run
    pub fn len(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Check if no tasks are waiting
    pub fn is_empty(&self) -> bool {
        self.tasks.borrow().is_empty()
    }
}

impl std::fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.len())
            .finish()
    }
}
