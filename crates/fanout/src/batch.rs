//! Callback-driven batches
//!
//! A batch is created for a known number of operations. Each operation
//! reports back exactly once through [`FailFastBatch::complete`] or
//! [`AccumulateBatch::complete`], from any thread, and the paired
//! [`Outcome`] resolves once the batch settles. Batches never spawn work;
//! they only fold results delivered to them.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::collector::{Accumulator, Collector, lock};
use crate::outcome::{Outcome, Settled, Slot};

/// Decrement a remaining-count, never wrapping below zero.
///
/// Returns the new count, or `None` if it was already zero.
fn decrement(remaining: &AtomicUsize) -> Option<usize> {
    remaining
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
        .ok()
        .map(|previous| previous - 1)
}

struct FailFastState<T, A, R, E> {
    remaining: AtomicUsize,
    aborted: AtomicBool,
    acc: Accumulator<T, A, R>,
    slot: Arc<Slot<Result<R, E>>>,
}

/// Fail-fast batch: resolves with the finished container once every
/// operation succeeded, or with the first failure as soon as it arrives
pub struct FailFastBatch<T, A, R, E> {
    state: Arc<FailFastState<T, A, R, E>>,
}

impl<T, A, R, E> Clone for FailFastBatch<T, A, R, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T, A, R, E> FailFastBatch<T, A, R, E> {
    /// Start a batch expecting `size` completions.
    ///
    /// An empty batch settles immediately with the finished, empty
    /// container; its combine step never runs.
    pub fn new(size: usize, collector: Collector<T, A, R>) -> (Self, Outcome<Result<R, E>>) {
        let slot = Arc::new(Slot::new());
        let state = Arc::new(FailFastState {
            remaining: AtomicUsize::new(size),
            aborted: AtomicBool::new(false),
            acc: collector.start(),
            slot: Arc::clone(&slot),
        });

        if size == 0
            && let Some(container) = state.acc.finish()
        {
            slot.settle(Ok(container));
        }

        (Self { state }, Outcome::new(slot))
    }

    /// Report the result of one operation
    pub fn complete(&self, result: Result<T, E>) {
        let state = &self.state;
        match result {
            Ok(value) => {
                if state.aborted.load(Ordering::Acquire) {
                    return;
                }
                // A success racing with an abort may still be folded; the
                // outcome already holds the failure, so it is never observed.
                state.acc.combine(value);
                if decrement(&state.remaining) == Some(0)
                    && !state.aborted.load(Ordering::Acquire)
                    && let Some(container) = state.acc.finish()
                {
                    state.slot.settle(Ok(container));
                }
            }
            Err(error) => {
                state.aborted.store(true, Ordering::Release);
                state.slot.settle(Err(error));
            }
        }
    }

    /// Whether the outcome has been decided
    pub fn is_settled(&self) -> bool {
        self.state.slot.is_settled()
    }

    /// Whether a failure aborted the batch
    pub fn is_aborted(&self) -> bool {
        self.state.aborted.load(Ordering::Acquire)
    }
}

struct AccumulateState<T, A, R, E> {
    remaining: AtomicUsize,
    failures: Mutex<Vec<E>>,
    acc: Accumulator<T, A, R>,
    slot: Arc<Slot<Settled<R, E>>>,
}

/// Accumulate-all batch: waits for every operation, folding successes and
/// recording failures in completion order
pub struct AccumulateBatch<T, A, R, E> {
    state: Arc<AccumulateState<T, A, R, E>>,
}

impl<T, A, R, E> Clone for AccumulateBatch<T, A, R, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T, A, R, E> AccumulateBatch<T, A, R, E> {
    /// Start a batch expecting `size` completions.
    ///
    /// An empty batch settles immediately with the finished, empty
    /// container and no failures.
    pub fn new(size: usize, collector: Collector<T, A, R>) -> (Self, Outcome<Settled<R, E>>) {
        let slot = Arc::new(Slot::new());
        let state = Arc::new(AccumulateState {
            remaining: AtomicUsize::new(size),
            failures: Mutex::new(Vec::new()),
            acc: collector.start(),
            slot: Arc::clone(&slot),
        });

        if size == 0
            && let Some(value) = state.acc.finish()
        {
            slot.settle(Settled {
                value,
                failures: Vec::new(),
            });
        }

        (Self { state }, Outcome::new(slot))
    }

    /// Report the result of one operation
    pub fn complete(&self, result: Result<T, E>) {
        let state = &self.state;
        match result {
            Ok(value) => state.acc.combine(value),
            Err(error) => lock(&state.failures).push(error),
        }

        if decrement(&state.remaining) == Some(0) {
            let failures = std::mem::take(&mut *lock(&state.failures));
            if let Some(value) = state.acc.finish() {
                state.slot.settle(Settled { value, failures });
            }
        }
    }

    /// Whether every operation has reported back
    pub fn is_settled(&self) -> bool {
        self.state.slot.is_settled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{counting, to_vec};
    use futures::FutureExt;
    use futures::executor::block_on;

    /// Vec collector that also counts how often its combine step ran
    fn observed_vec(calls: Arc<AtomicUsize>) -> Collector<u32, Vec<u32>, Vec<u32>> {
        Collector::new(
            Vec::new,
            move |acc: &mut Vec<u32>, value| {
                calls.fetch_add(1, Ordering::SeqCst);
                acc.push(value);
            },
            |acc| acc,
        )
    }

    #[test]
    fn test_fail_fast_all_succeed() {
        let (batch, outcome) = FailFastBatch::<u32, _, _, String>::new(3, to_vec());
        batch.complete(Ok(2));
        batch.complete(Ok(1));
        assert!(!batch.is_settled());
        batch.complete(Ok(3));
        assert_eq!(block_on(outcome), Ok(vec![2, 1, 3]));
    }

    #[test]
    fn test_fail_fast_first_failure_wins() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (batch, outcome) = FailFastBatch::new(4, observed_vec(Arc::clone(&calls)));
        batch.complete(Ok(1));
        batch.complete(Err("first"));
        assert!(batch.is_settled());
        assert!(batch.is_aborted());

        batch.complete(Ok(2));
        batch.complete(Err("second"));

        assert_eq!(block_on(outcome), Err("first"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fail_fast_empty_never_combines() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (batch, outcome) = FailFastBatch::<_, _, _, ()>::new(0, observed_vec(Arc::clone(&calls)));
        assert!(batch.is_settled());
        assert_eq!(outcome.now_or_never(), Some(Ok(vec![])));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_accumulate_keeps_completion_order() {
        let (batch, outcome) = AccumulateBatch::new(4, to_vec());
        batch.complete(Err("c"));
        batch.complete(Ok(1));
        batch.complete(Err("a"));
        assert!(!batch.is_settled());
        batch.complete(Ok(2));

        let settled = block_on(outcome);
        assert_eq!(settled.value, vec![1, 2]);
        assert_eq!(settled.failures, vec!["c", "a"]);
    }

    #[test]
    fn test_accumulate_empty_never_combines() {
        let calls = Arc::new(AtomicUsize::new(0));
        let (_batch, outcome) =
            AccumulateBatch::<_, _, _, ()>::new(0, observed_vec(Arc::clone(&calls)));
        let settled = outcome.now_or_never().unwrap();
        assert!(settled.is_success());
        assert!(settled.value.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_extra_completions_are_ignored() {
        let (batch, outcome) = AccumulateBatch::<u32, _, _, ()>::new(1, to_vec());
        batch.complete(Ok(1));
        batch.complete(Ok(2));
        assert_eq!(block_on(outcome).value, vec![1]);
    }

    #[test]
    fn test_accumulate_from_many_threads_guarded() {
        let (batch, outcome) = AccumulateBatch::new(64, to_vec());
        std::thread::scope(|scope| {
            for i in 0..64u32 {
                let batch = batch.clone();
                scope.spawn(move || {
                    let result = if i % 8 == 0 { Err(i) } else { Ok(i) };
                    batch.complete(result);
                });
            }
        });

        let settled = block_on(outcome);
        assert_eq!(settled.failures.len(), 8);
        let mut values = settled.value;
        values.sort_unstable();
        assert_eq!(values.len(), 56);
        assert!(values.iter().all(|v| v % 8 != 0));
    }

    #[test]
    fn test_fail_fast_from_many_threads_concurrent_collector() {
        let (batch, outcome) = FailFastBatch::<u32, _, _, ()>::new(32, counting());
        std::thread::scope(|scope| {
            for i in 0..32u32 {
                let batch = batch.clone();
                scope.spawn(move || batch.complete(Ok(i)));
            }
        });
        assert_eq!(block_on(outcome), Ok(32));
    }
}
