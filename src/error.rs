//! Benchmark errors.

use thiserror::Error;

/// Errors that abort a benchmark run.
///
/// None of these are retried. A run either returns the exact total or one of
/// these; there is no partial result.
#[derive(Error, Debug)]
pub enum BenchError {
    #[error("thread count must be at least 1")]
    NoWorkers,

    #[error("{threads} threads x {iterations} iterations overflows a u64 counter")]
    Overflow { threads: usize, iterations: u64 },

    #[error("failed to spawn worker {worker}")]
    Spawn {
        worker: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("worker {worker} panicked")]
    WorkerPanicked { worker: usize },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, BenchError>;
