//! Run configuration.
//!
//! A [`RunConfig`] fully describes one benchmark pass and is immutable once
//! the run starts. [`RunConfig::default`] reproduces the reference benchmark:
//! 100 threads, 1,000,000 increments each, an OS mutex held for the whole
//! loop.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// Worker count of the reference benchmark.
pub const DEFAULT_THREADS: usize = 100;

/// Per-worker increments of the reference benchmark.
pub const DEFAULT_ITERATIONS: u64 = 1_000_000;

/// How workers synchronize their increments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Discipline {
    /// An exclusive lock guards the counter; see [`LockScope`] and [`LockKind`].
    #[default]
    Locking,
    /// Every increment is a single fetch-and-add.
    Atomic,
}

/// How long a Locking worker holds the lock.
///
/// `PerLoop` serializes whole worker loops against each other, so workers
/// never interleave mid-loop. `PerIncrement` takes the lock around each
/// increment and produces real per-operation contention. Both give the same
/// total; only the contention pattern differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LockScope {
    #[default]
    PerLoop,
    PerIncrement,
}

/// Which exclusive lock backs the Locking discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LockKind {
    /// `std::sync::Mutex`; parks waiting threads.
    #[default]
    Mutex,
    /// [`SpinLock`](crate::SpinLock); spins with backoff and counts contention.
    Spin,
}

/// Extra work done after every increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Workload {
    /// Increment only.
    #[default]
    Bare,
    /// Render the observed value to a `String` after each increment.
    Format,
}

impl fmt::Display for Discipline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Locking => "locking",
            Self::Atomic => "atomic",
        })
    }
}

impl fmt::Display for LockScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PerLoop => "per-loop",
            Self::PerIncrement => "per-increment",
        })
    }
}

impl fmt::Display for LockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mutex => "mutex",
            Self::Spin => "spin",
        })
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Bare => "bare",
            Self::Format => "format",
        })
    }
}

/// Parameters of a single benchmark pass.
///
/// `lock_scope` and `lock_kind` only matter under [`Discipline::Locking`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub threads: usize,
    pub iterations: u64,
    pub discipline: Discipline,
    pub lock_scope: LockScope,
    pub lock_kind: LockKind,
    pub workload: Workload,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            iterations: DEFAULT_ITERATIONS,
            discipline: Discipline::default(),
            lock_scope: LockScope::default(),
            lock_kind: LockKind::default(),
            workload: Workload::default(),
        }
    }
}

impl RunConfig {
    /// Config with the given shape and every other field defaulted.
    pub fn new(threads: usize, iterations: u64, discipline: Discipline) -> Self {
        Self {
            threads,
            iterations,
            discipline,
            ..Self::default()
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_iterations(mut self, iterations: u64) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_discipline(mut self, discipline: Discipline) -> Self {
        self.discipline = discipline;
        self
    }

    pub fn with_lock_scope(mut self, lock_scope: LockScope) -> Self {
        self.lock_scope = lock_scope;
        self
    }

    pub fn with_lock_kind(mut self, lock_kind: LockKind) -> Self {
        self.lock_kind = lock_kind;
        self
    }

    pub fn with_workload(mut self, workload: Workload) -> Self {
        self.workload = workload;
        self
    }

    /// Total increments the run will perform.
    ///
    /// Fails with [`BenchError::NoWorkers`] for zero threads and
    /// [`BenchError::Overflow`] when the product does not fit the counter.
    pub fn validate(&self) -> Result<u64> {
        if self.threads == 0 {
            return Err(BenchError::NoWorkers);
        }

        u64::try_from(self.threads)
            .ok()
            .and_then(|threads| threads.checked_mul(self.iterations))
            .ok_or(BenchError::Overflow {
                threads: self.threads,
                iterations: self.iterations,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_reference() {
        let config = RunConfig::default();
        assert_eq!(config.threads, 100);
        assert_eq!(config.iterations, 1_000_000);
        assert_eq!(config.discipline, Discipline::Locking);
        assert_eq!(config.lock_scope, LockScope::PerLoop);
        assert_eq!(config.lock_kind, LockKind::Mutex);
        assert_eq!(config.workload, Workload::Bare);
    }

    #[test]
    fn test_validate_returns_expected_total() {
        let config = RunConfig::new(4, 100_000, Discipline::Atomic);
        assert_eq!(config.validate().unwrap(), 400_000);
    }

    #[test]
    fn test_zero_iterations_is_valid() {
        let config = RunConfig::new(7, 0, Discipline::Locking);
        assert_eq!(config.validate().unwrap(), 0);
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config = RunConfig::default().with_threads(0);
        assert!(matches!(config.validate(), Err(BenchError::NoWorkers)));
    }

    #[test]
    fn test_overflow_rejected() {
        let config = RunConfig::new(2, u64::MAX, Discipline::Atomic);
        assert!(matches!(
            config.validate(),
            Err(BenchError::Overflow { threads: 2, iterations: u64::MAX })
        ));
    }

    #[test]
    fn test_builders_chain() {
        let config = RunConfig::default()
            .with_threads(3)
            .with_iterations(9)
            .with_discipline(Discipline::Atomic)
            .with_lock_scope(LockScope::PerIncrement)
            .with_lock_kind(LockKind::Spin)
            .with_workload(Workload::Format);

        assert_eq!(
            config,
            RunConfig {
                threads: 3,
                iterations: 9,
                discipline: Discipline::Atomic,
                lock_scope: LockScope::PerIncrement,
                lock_kind: LockKind::Spin,
                workload: Workload::Format,
            }
        );
    }

    #[test]
    fn test_serde_uses_kebab_case() {
        let json = serde_json::to_string(&LockScope::PerIncrement).unwrap();
        assert_eq!(json, "\"per-increment\"");

        let scope: LockScope = serde_json::from_str("\"per-loop\"").unwrap();
        assert_eq!(scope, LockScope::PerLoop);
        assert_eq!(scope.to_string(), "per-loop");
    }
}
