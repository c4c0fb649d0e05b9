//! Exactly-once result slots and the futures that wait on them

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use futures::task::AtomicWaker;

use crate::collector::lock;
use crate::error::AggregateError;

/// Shared slot a batch settles into. Only the first settle is kept.
pub(crate) struct Slot<O> {
    settled: AtomicBool,
    value: Mutex<Option<O>>,
    waker: AtomicWaker,
}

impl<O> Slot<O> {
    pub(crate) fn new() -> Self {
        Self {
            settled: AtomicBool::new(false),
            value: Mutex::new(None),
            waker: AtomicWaker::new(),
        }
    }

    /// Store the result and wake the waiting [`Outcome`].
    ///
    /// Returns `false` (dropping `value`) if the slot was already settled.
    pub(crate) fn settle(&self, value: O) -> bool {
        if self.settled.swap(true, Ordering::AcqRel) {
            return false;
        }
        *lock(&self.value) = Some(value);
        self.waker.wake();
        true
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.settled.load(Ordering::Acquire)
    }
}

/// Future resolving to the result of a batch
///
/// Resolves exactly once, as soon as the batch settles. Completions that
/// arrive afterwards have no effect on the resolved value.
pub struct Outcome<O> {
    slot: Arc<Slot<O>>,
}

impl<O> Outcome<O> {
    pub(crate) fn new(slot: Arc<Slot<O>>) -> Self {
        Self { slot }
    }
}

impl<O> Future for Outcome<O> {
    type Output = O;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<O> {
        // Register before checking so a settle racing with this poll still wakes us
        self.slot.waker.register(cx.waker());
        match lock(&self.slot.value).take() {
            Some(value) => Poll::Ready(value),
            None => Poll::Pending,
        }
    }
}

/// Result of an accumulate-all batch: the finished container of successes
/// and every captured failure, in completion order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settled<R, E> {
    /// Container built from the successful operations
    pub value: R,
    /// Failures, in completion order
    pub failures: Vec<E>,
}

impl<R, E> Settled<R, E> {
    /// Whether every operation succeeded
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// The container if nothing failed, otherwise every failure wrapped in
    /// one [`AggregateError`]
    pub fn into_result(self) -> Result<R, AggregateError<E>> {
        if self.failures.is_empty() {
            Ok(self.value)
        } else {
            Err(AggregateError::new(self.failures))
        }
    }
}
