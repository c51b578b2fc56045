//! # ContendedCounter
//!
//! One shared `u64`, `threads` workers, `iterations` increments each.
//!
//! The counter is owned by the run, not by a global, so independent runs can
//! proceed side by side in one process. Workers are scoped OS threads that
//! borrow it; the orchestrator joins all of them before reading the total.
//!
//! ```rust
//! use contention_bench::{ContendedCounter, Discipline, RunConfig};
//!
//! let config = RunConfig::new(4, 10_000, Discipline::Atomic);
//! let total = ContendedCounter::new(config)?.run()?;
//! assert_eq!(total, 40_000);
//! # Ok::<(), contention_bench::BenchError>(())
//! ```
//!
//! A counter moves `NotStarted -> Running -> Completed` exactly once:
//! [`ContendedCounter::new`] is the not-started state and
//! [`run`](ContendedCounter::run) / [`measure`](ContendedCounter::measure)
//! consume it.

use std::hint::black_box;
use std::sync::atomic::{AtomicU64, Ordering::Relaxed};
use std::sync::{Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::config::{Discipline, LockKind, LockScope, RunConfig, Workload};
use crate::error::{BenchError, Result};
use crate::SpinLock;

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub config: RunConfig,
    pub final_count: u64,
    pub elapsed: Duration,
    /// Lock acquisitions that found the lock held. Only the spin lock
    /// observes this; `None` for the mutex and for atomics.
    pub contended_acquisitions: Option<u64>,
}

/// A benchmark run that has not started yet.
#[derive(Debug, Clone)]
pub struct ContendedCounter {
    config: RunConfig,
    expected: u64,
}

impl ContendedCounter {
    /// Validates `config` and prepares a run.
    pub fn new(config: RunConfig) -> Result<Self> {
        let expected = config.validate()?;
        Ok(Self { config, expected })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// `threads * iterations`, the only total a successful run can return.
    pub fn expected(&self) -> u64 {
        self.expected
    }

    /// Runs to completion and returns the final count.
    pub fn run(self) -> Result<u64> {
        self.measure().map(|report| report.final_count)
    }

    /// Runs to completion and reports the count together with wall time.
    #[instrument(
        name = "counter.run",
        skip(self),
        fields(
            threads = self.config.threads,
            iterations = self.config.iterations,
            discipline = %self.config.discipline,
        )
    )]
    pub fn measure(self) -> Result<RunReport> {
        let Self { config, expected } = self;
        let shared = Shared::for_config(&config);

        debug!(
            lock_scope = %config.lock_scope,
            lock_kind = %config.lock_kind,
            workload = %config.workload,
            "starting workers"
        );

        let started = Instant::now();
        run_workers(config.threads, || {
            shared.work(config.iterations, config.lock_scope, config.workload)
        })?;
        let elapsed = started.elapsed();

        let (final_count, contended_acquisitions) = shared.into_parts();
        debug_assert_eq!(final_count, expected, "lost updates");

        info!(final_count, ?elapsed, "run completed");

        Ok(RunReport {
            config,
            final_count,
            elapsed,
            contended_acquisitions,
        })
    }
}

/// Validates `config`, runs it and returns the final count.
pub fn run(config: &RunConfig) -> Result<u64> {
    ContendedCounter::new(*config)?.run()
}

/// Validates `config`, runs it and returns the full report.
pub fn measure(config: &RunConfig) -> Result<RunReport> {
    ContendedCounter::new(*config)?.measure()
}

/// Exclusive access to the counter, whatever lock provides it.
trait Exclusive {
    fn with_exclusive<R>(&self, f: impl FnOnce(&mut u64) -> R) -> R;
}

impl Exclusive for Mutex<u64> {
    #[inline]
    fn with_exclusive<R>(&self, f: impl FnOnce(&mut u64) -> R) -> R {
        // A plain integer has no invariant a panicking holder could break.
        let mut guard = self.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }
}

impl Exclusive for SpinLock<u64> {
    #[inline]
    fn with_exclusive<R>(&self, f: impl FnOnce(&mut u64) -> R) -> R {
        self.with_lock(f)
    }
}

/// The run-owned counter in the representation its discipline needs.
enum Shared {
    Mutex(Mutex<u64>),
    Spin(SpinLock<u64>),
    Atomic(AtomicU64),
}

impl Shared {
    fn for_config(config: &RunConfig) -> Self {
        match (config.discipline, config.lock_kind) {
            (Discipline::Atomic, _) => Self::Atomic(AtomicU64::new(0)),
            (Discipline::Locking, LockKind::Mutex) => Self::Mutex(Mutex::new(0)),
            (Discipline::Locking, LockKind::Spin) => Self::Spin(SpinLock::new(0)),
        }
    }

    /// One worker's whole loop.
    fn work(&self, iterations: u64, scope: LockScope, workload: Workload) {
        let step = |count: &mut u64| increment(count, workload);
        match self {
            Self::Mutex(lock) => locked_loop(lock, iterations, scope, step),
            Self::Spin(lock) => locked_loop(lock, iterations, scope, step),
            Self::Atomic(counter) => {
                for _ in 0..iterations {
                    let observed = counter.fetch_add(black_box(1), Relaxed) + 1;
                    apply(workload, observed);
                }
            }
        }
    }

    /// Final value and, for the spin lock, its contention count.
    fn into_parts(self) -> (u64, Option<u64>) {
        match self {
            Self::Mutex(lock) => (lock.into_inner().unwrap_or_else(PoisonError::into_inner), None),
            Self::Spin(lock) => {
                let contended = lock.contended();
                (lock.into_inner(), Some(contended))
            }
            Self::Atomic(counter) => (counter.into_inner(), None),
        }
    }
}

/// Runs `step` exactly `iterations` times under `lock`, once per increment.
fn locked_loop<L, S>(lock: &L, iterations: u64, scope: LockScope, mut step: S)
where
    L: Exclusive,
    S: FnMut(&mut u64),
{
    match scope {
        LockScope::PerLoop => lock.with_exclusive(|count| {
            for _ in 0..iterations {
                step(count);
            }
        }),
        LockScope::PerIncrement => {
            for _ in 0..iterations {
                lock.with_exclusive(|count| step(count));
            }
        }
    }
}

/// One increment the optimizer cannot fold into `+= iterations`.
#[inline]
fn increment(count: &mut u64, workload: Workload) {
    *count = black_box(*count) + 1;
    apply(workload, *count);
}

#[inline]
fn apply(workload: Workload, observed: u64) {
    if workload == Workload::Format {
        black_box(observed.to_string());
    }
}

/// Spawns `threads` scoped workers running `work` and joins every one.
///
/// If a spawn fails, workers already started are still joined before the
/// error is returned.
fn run_workers<F>(threads: usize, work: F) -> Result<()>
where
    F: Fn() + Sync,
{
    let work = &work;

    thread::scope(|s| {
        let mut handles = Vec::with_capacity(threads);
        let mut spawn_error = None;

        for worker in 0..threads {
            let spawned = thread::Builder::new()
                .name(format!("worker-{worker}"))
                .spawn_scoped(s, move || work());

            match spawned {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    error!(worker, %source, "failed to spawn worker");
                    spawn_error = Some(BenchError::Spawn { worker, source });
                    break;
                }
            }
        }

        let mut panicked = None;
        for (worker, handle) in handles.into_iter().enumerate() {
            if handle.join().is_err() && panicked.is_none() {
                error!(worker, "worker panicked");
                panicked = Some(worker);
            }
        }

        match (spawn_error, panicked) {
            (Some(err), _) => Err(err),
            (None, Some(worker)) => Err(BenchError::WorkerPanicked { worker }),
            (None, None) => Ok(()),
        }
    })
}
