//! Capability probe.
//!
//! Reports what the running build supports as plain values and exercises the
//! atomic path once with a small fixed workload (5 workers x 1,000
//! increments). Nothing here branches domain logic on the answers.

use std::thread;

use serde::Serialize;
use tracing::debug;

use crate::config::{Discipline, RunConfig};
use crate::counter;
use crate::error::Result;

/// Workers used by [`probe`].
pub const PROBE_THREADS: usize = 5;

/// Increments per worker used by [`probe`].
pub const PROBE_ITERATIONS: u64 = 1_000;

/// Optional behaviors available in this build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// The target has native 64-bit atomics.
    pub atomic_u64: bool,
    /// Sequences can be filtered lazily.
    pub lazy_filter: bool,
    /// Hardware threads available to the process; 1 when unknown.
    pub parallelism: usize,
}

impl Capabilities {
    pub fn detect() -> Self {
        let parallelism = thread::available_parallelism().map_or(1, |n| n.get());

        Self {
            atomic_u64: cfg!(target_has_atomic = "64"),
            lazy_filter: true,
            parallelism,
        }
    }
}

/// Result of [`probe`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub final_count: u64,
    pub capabilities: Capabilities,
    pub doubled: Option<i64>,
    pub even_numbers: Option<Vec<i64>>,
}

/// Runs the fixed atomic workload and the optional checks.
pub fn probe() -> Result<ProbeReport> {
    let capabilities = Capabilities::detect();
    debug!(?capabilities, "detected capabilities");

    let final_count = counter::run(&RunConfig::new(PROBE_THREADS, PROBE_ITERATIONS, Discipline::Atomic))?;

    let (doubled, even_numbers) = if capabilities.lazy_filter {
        (Some(double(42)), Some(evens(1..=5).collect()))
    } else {
        (None, None)
    };

    Ok(ProbeReport {
        final_count,
        capabilities,
        doubled,
        even_numbers,
    })
}

fn double<T>(x: T) -> T
where
    T: std::ops::Add<Output = T> + Copy,
{
    x + x
}

fn evens(numbers: impl IntoIterator<Item = i64>) -> impl Iterator<Item = i64> {
    numbers.into_iter().filter(|n| n % 2 == 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_counts_all_increments() {
        let report = probe().unwrap();
        assert_eq!(report.final_count, 5_000);
        assert_eq!(report.doubled, Some(84));
        assert_eq!(report.even_numbers, Some(vec![2, 4]));
    }

    #[test]
    fn test_capabilities_are_sane() {
        let caps = Capabilities::detect();
        assert!(caps.parallelism >= 1);
        assert!(caps.lazy_filter);
    }

    #[test]
    fn test_double_is_generic() {
        assert_eq!(double(21i64), 42);
        assert_eq!(double(1.5f64), 3.0);
    }

    #[test]
    fn test_evens_is_lazy() {
        let mut seen = 0;
        let mut iter = evens((1..).inspect(|_| seen += 1));
        assert_eq!(iter.next(), Some(2));
        drop(iter);
        assert_eq!(seen, 2);
    }
}
