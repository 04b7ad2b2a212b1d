//! Combinators aggregating several futures into one.
//!
//! Inputs are subscribed in sequence order. Because reactions run through
//! the FIFO microtask queue, inputs that become ready in the same tick are
//! observed in sequence order, which is what breaks ties in [`Runtime::race`]
//! and decides which rejection [`Runtime::all`] reports.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::trace;

use super::Future;
use crate::runtime::Runtime;

impl Runtime {
    /// Wait for every input to fulfill.
    ///
    /// Fulfills with the values in input order, or rejects with the first
    /// rejection observed; inputs still pending at that point are no longer
    /// waited on. An empty input fulfills with an empty vector.
    pub fn all<T, E, I>(&self, futures: I) -> Future<Vec<T>, E>
    where
        T: Clone + 'static,
        E: Clone + 'static,
        I: IntoIterator<Item = Future<T, E>>,
    {
        self.all_with(futures, |values| values)
    }

    /// Like [`Runtime::all`], but `finish` shapes the collected values.
    ///
    /// `finish` runs in the reaction that observes the last input, so the
    /// result settles on the same tick a plain `all` would.
    pub fn all_with<T, U, E, I, F>(&self, futures: I, finish: F) -> Future<U, E>
    where
        T: Clone + 'static,
        U: Clone + 'static,
        E: Clone + 'static,
        I: IntoIterator<Item = Future<T, E>>,
        F: FnOnce(Vec<T>) -> U + 'static,
    {
        let futures: Vec<Future<T, E>> = futures.into_iter().collect();
        let (combined, resolver) = self.pending();
        trace!(future = %combined.id(), inputs = futures.len(), "all");

        if futures.is_empty() {
            resolver.settle(finish(Vec::new()));
            return combined;
        }

        let slots: Rc<RefCell<Vec<Option<T>>>> =
            Rc::new(RefCell::new(vec![None; futures.len()]));
        let remaining = Rc::new(Cell::new(futures.len()));
        let finish = Rc::new(Cell::new(Some(finish)));

        for (index, future) in futures.iter().enumerate() {
            let resolver = resolver.clone();
            let slots = slots.clone();
            let remaining = remaining.clone();
            let finish = finish.clone();
            future.subscribe(move |result| match result {
                Ok(value) => {
                    slots.borrow_mut()[index] = Some(value);
                    remaining.set(remaining.get() - 1);
                    if remaining.get() == 0 {
                        let values: Vec<T> = slots.borrow_mut().drain(..).flatten().collect();
                        if let Some(finish) = finish.take() {
                            resolver.settle(finish(values));
                        }
                    }
                }
                Err(reason) => resolver.fail(reason),
            });
        }
        combined
    }

    /// Settle like whichever input settles first, fulfilled or rejected.
    ///
    /// Ties go to the input listed first. An empty input never settles.
    pub fn race<T, E, I>(&self, futures: I) -> Future<T, E>
    where
        T: Clone + 'static,
        E: Clone + 'static,
        I: IntoIterator<Item = Future<T, E>>,
    {
        let (winner, resolver) = self.pending();
        let mut inputs = 0;
        for future in futures {
            inputs += 1;
            let resolver = resolver.clone();
            future.subscribe(move |result| match result {
                Ok(value) => resolver.settle(value),
                Err(reason) => resolver.fail(reason),
            });
        }
        trace!(future = %winner.id(), inputs, "race");
        winner
    }
}

#[cfg(test)]
#[path = "combinators_tests.rs"]
mod tests;
