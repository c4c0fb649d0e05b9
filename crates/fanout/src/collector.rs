//! Reduction descriptors
//!
//! A [`Collector`] describes how completed values are folded into a
//! container: a supply step for the initial accumulator, a combine step
//! run once per value, and a finish step turning the accumulator into the
//! result. Collectors are plain data, passed to a batch by value.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

type GuardedCombine<A, T> = Box<dyn Fn(&mut A, T) + Send + Sync>;
type GuardedFinish<A, R> = Box<dyn FnOnce(A) -> R + Send>;
type SharedCombine<A, T> = Box<dyn Fn(&A, T) + Send + Sync>;
type SharedFinish<A, R> = Box<dyn FnOnce(&A) -> R + Send>;

enum Reduce<T, A, R> {
    /// Combine needs exclusive access; the accumulator sits behind a mutex
    Guarded {
        combine: GuardedCombine<A, T>,
        finish: GuardedFinish<A, R>,
    },
    /// Accumulator tolerates concurrent mutation; no guard is taken
    Concurrent {
        combine: SharedCombine<A, T>,
        finish: SharedFinish<A, R>,
    },
}

/// Supply / combine / finish triple folding values of type `T` through an
/// accumulator `A` into a container `R`
pub struct Collector<T, A, R> {
    supply: Box<dyn FnOnce() -> A + Send>,
    reduce: Reduce<T, A, R>,
}

impl<T, A, R> Collector<T, A, R> {
    /// Create a collector whose combine step needs exclusive access.
    ///
    /// Batches hold a mutex around the accumulator for the duration of each
    /// combine call.
    pub fn new<S, C, F>(supply: S, combine: C, finish: F) -> Self
    where
        S: FnOnce() -> A + Send + 'static,
        C: Fn(&mut A, T) + Send + Sync + 'static,
        F: FnOnce(A) -> R + Send + 'static,
    {
        Self {
            supply: Box::new(supply),
            reduce: Reduce::Guarded {
                combine: Box::new(combine),
                finish: Box::new(finish),
            },
        }
    }

    /// Create a collector whose accumulator is safe for concurrent mutation
    /// (atomics, lock-free containers).
    ///
    /// Batches call the combine step without any guard.
    pub fn concurrent<S, C, F>(supply: S, combine: C, finish: F) -> Self
    where
        S: FnOnce() -> A + Send + 'static,
        C: Fn(&A, T) + Send + Sync + 'static,
        F: FnOnce(&A) -> R + Send + 'static,
    {
        Self {
            supply: Box::new(supply),
            reduce: Reduce::Concurrent {
                combine: Box::new(combine),
                finish: Box::new(finish),
            },
        }
    }

    /// Whether combine steps run without a mutual-exclusion guard
    pub fn is_concurrent(&self) -> bool {
        matches!(self.reduce, Reduce::Concurrent { .. })
    }

    pub(crate) fn start(self) -> Accumulator<T, A, R> {
        let acc = (self.supply)();
        match self.reduce {
            Reduce::Guarded { combine, finish } => Accumulator::Guarded {
                acc: Mutex::new(Some(acc)),
                combine,
                finish: Mutex::new(Some(finish)),
            },
            Reduce::Concurrent { combine, finish } => Accumulator::Concurrent {
                acc,
                combine,
                finish: Mutex::new(Some(finish)),
            },
        }
    }
}

/// Live accumulator shared by every completion of one batch
pub(crate) enum Accumulator<T, A, R> {
    Guarded {
        acc: Mutex<Option<A>>,
        combine: GuardedCombine<A, T>,
        finish: Mutex<Option<GuardedFinish<A, R>>>,
    },
    Concurrent {
        acc: A,
        combine: SharedCombine<A, T>,
        finish: Mutex<Option<SharedFinish<A, R>>>,
    },
}

impl<T, A, R> Accumulator<T, A, R> {
    /// Fold one value. The guard, when there is one, is held only here.
    pub(crate) fn combine(&self, value: T) {
        match self {
            Self::Guarded { acc, combine, .. } => {
                let mut guard = lock(acc);
                if let Some(acc) = guard.as_mut() {
                    combine(acc, value);
                }
            }
            Self::Concurrent { acc, combine, .. } => combine(acc, value),
        }
    }

    /// Run the finish step. Returns `None` if it already ran.
    pub(crate) fn finish(&self) -> Option<R> {
        match self {
            Self::Guarded { acc, finish, .. } => {
                let finish = lock(finish).take()?;
                let acc = lock(acc).take()?;
                Some(finish(acc))
            }
            Self::Concurrent { acc, finish, .. } => {
                let finish = lock(finish).take()?;
                Some(finish(acc))
            }
        }
    }
}

/// Lock a mutex, recovering the data if a previous holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Collect values into a `Vec`, in completion order
pub fn to_vec<T: Send + 'static>() -> Collector<T, Vec<T>, Vec<T>> {
    Collector::new(Vec::new, |acc: &mut Vec<T>, value| acc.push(value), |acc| acc)
}

/// Collect `(key, value)` pairs into a sorted map. A later pair replaces an
/// earlier one with the same key.
pub fn to_btree_map<K, V>() -> Collector<(K, V), BTreeMap<K, V>, BTreeMap<K, V>>
where
    K: Ord + Send + 'static,
    V: Send + 'static,
{
    Collector::new(
        BTreeMap::new,
        |acc: &mut BTreeMap<K, V>, (key, value)| {
            acc.insert(key, value);
        },
        |acc| acc,
    )
}

/// Count completed values with an atomic counter, without any lock
pub fn counting<T: 'static>() -> Collector<T, AtomicUsize, usize> {
    Collector::concurrent(
        || AtomicUsize::new(0),
        |acc: &AtomicUsize, _value: T| {
            acc.fetch_add(1, Ordering::Relaxed);
        },
        |acc: &AtomicUsize| acc.load(Ordering::Acquire),
    )
}
