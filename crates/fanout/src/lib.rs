//! # Fanout
//!
//! Combinators for fanning out independent asynchronous operations and
//! folding their results into one container.
//!
//! ## Core Concepts
//!
//! - **Collector**: a reduction descriptor (supply, combine, finish) passed as data
//! - **Fail-fast** ([`sequence`]): the first failure decides the outcome; later
//!   successes are never folded in
//! - **Accumulate-all** ([`combined`], [`settle`]): every operation is awaited and
//!   every failure is reported
//!
//! The combinators never spawn tasks. They poll the futures they are given
//! and stop polling as soon as the outcome is decided, so work still in
//! flight after a fail-fast abort is abandoned locally (not cancelled
//! remotely). For callback-driven code, [`FailFastBatch`] and
//! [`AccumulateBatch`] expose the same policies through a `complete` method
//! callable from any thread.
//!
//! ## Example
//!
//! ```
//! use fanout::{combined, to_vec};
//! use futures::executor::block_on;
//! use futures::future::ready;
//!
//! let ops = vec![ready(Ok::<_, String>(1)), ready(Err("bad".to_string())), ready(Ok(3))];
//! let err = block_on(combined(ops, to_vec())).unwrap_err();
//! assert_eq!(err.len(), 1);
//! ```

pub mod batch;
pub mod collector;
pub mod error;
pub mod outcome;

use std::future::Future;

use futures::StreamExt;
use futures::stream::FuturesUnordered;

pub use batch::{AccumulateBatch, FailFastBatch};
pub use collector::{Collector, counting, to_btree_map, to_vec};
pub use error::AggregateError;
pub use outcome::{Outcome, Settled};

/// Await every operation, failing fast.
///
/// Resolves with the finished container when all operations succeed, or
/// with the first failure (unwrapped) as soon as one fails. Successes
/// arriving after a failure are never folded in, and the remaining
/// operations are dropped without being polled further.
pub async fn sequence<I, F, T, A, R, E>(ops: I, collector: Collector<T, A, R>) -> Result<R, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let pending: FuturesUnordered<F> = ops.into_iter().collect();
    let (batch, outcome) = FailFastBatch::new(pending.len(), collector);
    drive(pending, |result| batch.complete(result), || batch.is_settled()).await;
    outcome.await
}

/// Await every operation, accumulating all failures.
///
/// Resolves with the finished container if nothing failed; otherwise with
/// one [`AggregateError`] holding every failure in completion order.
pub async fn combined<I, F, T, A, R, E>(
    ops: I,
    collector: Collector<T, A, R>,
) -> Result<R, AggregateError<E>>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    settle(ops, collector).await.into_result()
}

/// Await every operation, keeping both the successes and the failures.
///
/// Like [`combined`], but the container of successful results survives
/// when some operations fail.
pub async fn settle<I, F, T, A, R, E>(ops: I, collector: Collector<T, A, R>) -> Settled<R, E>
where
    I: IntoIterator<Item = F>,
    F: Future<Output = Result<T, E>>,
{
    let pending: FuturesUnordered<F> = ops.into_iter().collect();
    let (batch, outcome) = AccumulateBatch::new(pending.len(), collector);
    drive(pending, |result| batch.complete(result), || batch.is_settled()).await;
    outcome.await
}

/// Poll `pending` in completion order, reporting each result, until the
/// batch settles or nothing is left.
async fn drive<F, T, E>(
    mut pending: FuturesUnordered<F>,
    complete: impl Fn(Result<T, E>),
    settled: impl Fn() -> bool,
) where
    F: Future<Output = Result<T, E>>,
{
    while !settled() {
        match pending.next().await {
            Some(result) => complete(result),
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::FutureExt;
    use futures::channel::oneshot;
    use futures::executor::block_on;
    use futures::future::{BoxFuture, pending, ready};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn ok(value: u32) -> BoxFuture<'static, Result<u32, String>> {
        ready(Ok(value)).boxed()
    }

    fn fail(message: &str) -> BoxFuture<'static, Result<u32, String>> {
        ready(Err(message.to_string())).boxed()
    }

    fn never() -> BoxFuture<'static, Result<u32, String>> {
        pending().boxed()
    }

    #[test]
    fn test_sequence_collects_all() {
        let mut values = block_on(sequence(vec![ok(1), ok(2), ok(3)], to_vec())).unwrap();
        values.sort_unstable();
        assert_eq!(values, vec![1, 2, 3]);
    }

    #[test]
    fn test_sequence_returns_raw_first_failure() {
        let result = block_on(sequence(vec![ok(1), fail("boom"), ok(3)], to_vec()));
        assert_eq!(result, Err("boom".to_string()));
    }

    #[test]
    fn test_sequence_abandons_unfinished_operations() {
        // Resolves even though one operation never completes
        let result = block_on(sequence(vec![never(), fail("timeout"), never()], to_vec()));
        assert_eq!(result, Err("timeout".to_string()));
    }

    #[test]
    fn test_sequence_empty() {
        let ops: Vec<BoxFuture<'static, Result<u32, String>>> = Vec::new();
        assert_eq!(block_on(sequence(ops, to_vec())), Ok(vec![]));
    }

    #[test]
    fn test_combined_success_iff_no_failures() {
        let ok_result = block_on(combined(vec![ok(1), ok(2)], counting()));
        assert_eq!(ok_result, Ok(2));

        let err = block_on(combined(
            vec![ok(1), fail("a"), fail("b"), ok(4), fail("c")],
            to_vec(),
        ))
        .unwrap_err();
        assert_eq!(err.len(), 3);
        let mut messages = err.into_failures();
        messages.sort();
        assert_eq!(messages, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_combined_single_failure_is_still_aggregate() {
        let err = block_on(combined(vec![fail("only")], to_vec())).unwrap_err();
        assert_eq!(err.failures(), &["only".to_string()]);
    }

    #[test]
    fn test_combined_empty_never_combines() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let collector = Collector::new(
            Vec::new,
            move |acc: &mut Vec<u32>, value| {
                seen.fetch_add(1, Ordering::SeqCst);
                acc.push(value);
            },
            |acc| acc,
        );
        let ops: Vec<BoxFuture<'static, Result<u32, String>>> = Vec::new();
        assert_eq!(block_on(combined(ops, collector)), Ok(vec![]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_settle_keeps_partial_successes() {
        let settled = block_on(settle(vec![ok(1), fail("bad"), ok(3)], to_vec()));
        let mut values = settled.value;
        values.sort_unstable();
        assert_eq!(values, vec![1, 3]);
        assert_eq!(settled.failures, vec!["bad".to_string()]);
    }

    #[test]
    fn test_combined_waits_for_late_completions() {
        let (early_tx, early_rx) = oneshot::channel::<Result<u32, String>>();
        let (late_tx, late_rx) = oneshot::channel::<Result<u32, String>>();
        let ops = vec![early_rx, late_rx]
            .into_iter()
            .map(|rx| rx.map(|received| received.unwrap_or_else(|_| Err("dropped".into()))));

        let run = combined(ops, to_btree_map_by_value());
        let feed = async move {
            let _ = early_tx.send(Ok(10));
            let _ = late_tx.send(Ok(20));
        };
        let (result, ()) = block_on(futures::future::join(run, feed));
        let map = result.unwrap();
        assert_eq!(map.len(), 2);
    }

    fn to_btree_map_by_value() -> Collector<u32, Vec<(u32, u32)>, std::collections::BTreeMap<u32, u32>> {
        Collector::new(
            Vec::new,
            |acc: &mut Vec<(u32, u32)>, value| acc.push((value, value)),
            |acc| acc.into_iter().collect(),
        )
    }
}
