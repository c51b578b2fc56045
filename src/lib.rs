//! # contention-bench 🌀
//!
//! A shared-counter contention benchmark: `threads` workers each perform
//! `iterations` increments on one counter, and the run reports the total.
//! The point is to compare update **disciplines**:
//!
//! - [`Discipline::Locking`] — an exclusive lock guards the counter. The lock
//!   is either [`std::sync::Mutex`] or this crate's [`SpinLock`], held for a
//!   worker's whole loop ([`LockScope::PerLoop`]) or around each increment
//!   ([`LockScope::PerIncrement`]).
//! - [`Discipline::Atomic`] — every increment is one `fetch_add`; no lock.
//!
//! Whatever the discipline, a successful run returns exactly
//! `threads * iterations`.
//!
//! ## 🚀 Quick Example
//!
//! ```rust
//! use contention_bench::{run, Discipline, LockScope, RunConfig};
//!
//! let atomic = RunConfig::new(4, 100_000, Discipline::Atomic);
//! assert_eq!(run(&atomic)?, 400_000);
//!
//! let locking = RunConfig::new(4, 100_000, Discipline::Locking)
//!     .with_lock_scope(LockScope::PerIncrement);
//! assert_eq!(run(&locking)?, 400_000);
//! # Ok::<(), contention_bench::BenchError>(())
//! ```
//!
//! ## 🧠 Design
//!
//! - The counter belongs to the run. Workers are scoped threads borrowing it,
//!   so two benchmarks can run concurrently in one process.
//! - `threads * iterations` is checked against `u64` before any thread is
//!   spawned; see [`BenchError`].
//! - [`SpinLock`] counts acquisitions that found it held, which
//!   [`RunReport::contended_acquisitions`] exposes.
//!
//! ## 📦 Modules
//!
//! - [`config`] — [`RunConfig`] and the discipline enums.
//! - [`counter`] — [`ContendedCounter`], the benchmark core.
//! - [`compare`] — both disciplines side by side.
//! - [`probe`] — runtime capability query.
//! - [`spinlock`] / [`backoff`] — the spin lock primitive.
//! - [`error`] — [`BenchError`].

pub mod backoff;
pub mod compare;
pub mod config;
pub mod counter;
pub mod error;
pub mod probe;
pub mod spinlock;

pub use backoff::BackOff;
pub use compare::{compare, Comparison};
pub use config::{Discipline, LockKind, LockScope, RunConfig, Workload};
pub use counter::{measure, run, ContendedCounter, RunReport};
pub use error::{BenchError, Result};
pub use probe::{probe, Capabilities, ProbeReport};
pub use spinlock::{SpinGuard, SpinLock};
