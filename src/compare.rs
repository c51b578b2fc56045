//! Side-by-side runs of both disciplines.
//!
//! The locking report keeps its [`LockScope`] so a per-loop result, which has
//! almost no inter-worker contention, is never read as a per-increment one.

use serde::Serialize;
use tracing::info;

use crate::config::{Discipline, LockKind, LockScope, RunConfig, Workload};
use crate::counter::{measure, RunReport};
use crate::error::Result;

/// Reports for the same workload under Locking and under Atomic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Comparison {
    pub locking: RunReport,
    pub atomic: RunReport,
}

impl Comparison {
    /// Both runs reached the same total.
    pub fn agrees(&self) -> bool {
        self.locking.final_count == self.atomic.final_count
    }
}

/// Runs Locking then Atomic with identical shape and workload.
pub fn compare(
    threads: usize,
    iterations: u64,
    lock_scope: LockScope,
    lock_kind: LockKind,
    workload: Workload,
) -> Result<Comparison> {
    let base = RunConfig::new(threads, iterations, Discipline::Locking)
        .with_lock_scope(lock_scope)
        .with_lock_kind(lock_kind)
        .with_workload(workload);

    let locking = measure(&base)?;
    let atomic = measure(&base.with_discipline(Discipline::Atomic))?;

    info!(
        locking_elapsed = ?locking.elapsed,
        atomic_elapsed = ?atomic.elapsed,
        %lock_scope,
        "comparison finished"
    );

    Ok(Comparison { locking, atomic })
}
