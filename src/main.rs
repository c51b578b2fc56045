//! `contention-bench` binary.
//!
//! With no arguments this reproduces the reference benchmark: 100 threads,
//! a million increments each, an OS mutex held for each worker's loop, and a
//! single `Counter: <n>` line on stdout. Diagnostics go to stderr.

mod cli;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use contention_bench::{compare, measure, probe, Comparison, ProbeReport, RunReport};

use crate::cli::{Cli, Command, RunArgs};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter_layer = if cli.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::new("info")
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("contention-bench v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        None => cmd_run(&cli.run, cli.json),
        Some(Command::Compare) => cmd_compare(&cli.run, cli.json),
        Some(Command::Probe) => cmd_probe(cli.json),
    }
}

fn cmd_run(args: &RunArgs, json: bool) -> Result<()> {
    let report = measure(&args.config()).context("benchmark run failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_run(&report, args.timing);
    }
    Ok(())
}

fn cmd_compare(args: &RunArgs, json: bool) -> Result<()> {
    let cmp = compare(
        args.threads,
        args.iterations,
        args.lock_scope,
        args.lock_kind,
        args.workload,
    )
    .context("comparison failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&cmp)?);
    } else {
        print_comparison(&cmp);
    }
    Ok(())
}

fn cmd_probe(json: bool) -> Result<()> {
    let report = probe().context("capability probe failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_probe(&report);
    }
    Ok(())
}

fn print_run(report: &RunReport, timing: bool) {
    if timing {
        println!("Counter: {} ({})", report.final_count, micros(report.elapsed));
    } else {
        println!("Counter: {}", report.final_count);
    }
    if let Some(contended) = report.contended_acquisitions {
        println!("Contended acquisitions: {contended}");
    }
}

fn print_comparison(cmp: &Comparison) {
    let locking = &cmp.locking;
    println!(
        "Locking ({}, {}): {} in {}",
        locking.config.lock_scope,
        locking.config.lock_kind,
        locking.final_count,
        micros(locking.elapsed)
    );
    if let Some(contended) = locking.contended_acquisitions {
        println!("  contended acquisitions: {contended}");
    }
    println!(
        "Atomic: {} in {}",
        cmp.atomic.final_count,
        micros(cmp.atomic.elapsed)
    );
}

fn print_probe(report: &ProbeReport) {
    let caps = &report.capabilities;
    println!("Final counter value: {}", report.final_count);
    println!("Native 64-bit atomics: {}", caps.atomic_u64);
    println!("Available parallelism: {}", caps.parallelism);

    if let Some(doubled) = report.doubled {
        println!("Numeric doubling test: {doubled}");
    }
    if let Some(evens) = &report.even_numbers {
        let evens: Vec<String> = evens.iter().map(|n| n.to_string()).collect();
        println!("Lazy filter test - Even numbers: {}", evens.join(" "));
    }
}

fn micros(elapsed: Duration) -> String {
    format!("{} us", elapsed.as_micros())
}
