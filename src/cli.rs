//! Command-line surface of the `contention-bench` binary.

use clap::{Args, Parser, Subcommand};

use contention_bench::config::{DEFAULT_ITERATIONS, DEFAULT_THREADS};
use contention_bench::{Discipline, LockKind, LockScope, RunConfig, Workload};

#[derive(Parser, Debug)]
#[command(name = "contention-bench")]
#[command(version, about = "Shared-counter contention benchmark: locking vs atomic", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub run: RunArgs,

    /// Emit reports as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the same workload under both disciplines
    Compare,

    /// Report runtime capabilities and run a small atomic workload
    Probe,
}

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Number of worker threads
    #[arg(short, long, global = true, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// Increments per worker
    #[arg(short, long, global = true, default_value_t = DEFAULT_ITERATIONS)]
    pub iterations: u64,

    /// Synchronization discipline
    #[arg(long, global = true, value_enum, default_value_t = Discipline::Locking)]
    pub discipline: Discipline,

    /// How long a locking worker holds the lock
    #[arg(long, global = true, value_enum, default_value_t = LockScope::PerLoop)]
    pub lock_scope: LockScope,

    /// Lock primitive for the locking discipline
    #[arg(long, global = true, value_enum, default_value_t = LockKind::Mutex)]
    pub lock_kind: LockKind,

    /// Extra work after each increment
    #[arg(long, global = true, value_enum, default_value_t = Workload::Bare)]
    pub workload: Workload,

    /// Append elapsed time to text output
    #[arg(long, global = true)]
    pub timing: bool,
}

impl RunArgs {
    pub fn config(&self) -> RunConfig {
        RunConfig::new(self.threads, self.iterations, self.discipline)
            .with_lock_scope(self.lock_scope)
            .with_lock_kind(self.lock_kind)
            .with_workload(self.workload)
    }
}
