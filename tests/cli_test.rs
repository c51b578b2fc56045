#![allow(deprecated)]

use assert_cmd::Command;
use predicates::prelude::*;

fn bench() -> Command {
    Command::cargo_bin("contention-bench").unwrap()
}

/// No arguments runs the reference benchmark and prints one result line
#[test]
fn test_default_run_prints_single_counter_line() {
    bench()
        .assert()
        .success()
        .stdout(predicate::eq("Counter: 100000000\n"));
}

#[test]
fn test_small_run_prints_exact_total() {
    bench()
        .args(["-t", "4", "-i", "1000"])
        .assert()
        .success()
        .stdout(predicate::eq("Counter: 4000\n"));
}

#[test]
fn test_atomic_per_increment_run() {
    bench()
        .args(["-t", "3", "-i", "500", "--discipline", "atomic", "--lock-scope", "per-increment"])
        .assert()
        .success()
        .stdout(predicate::eq("Counter: 1500\n"));
}

#[test]
fn test_zero_threads_fails_without_counter_line() {
    bench()
        .args(["-t", "0"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Counter:").not())
        .stderr(predicate::str::contains("thread count must be at least 1"));
}

#[test]
fn test_overflow_fails_without_counter_line() {
    bench()
        .args(["-t", "4", "-i", "18446744073709551615"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_spin_lock_reports_contention_line() {
    bench()
        .args(["-t", "2", "-i", "100", "--lock-kind", "spin"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Counter: 200\n"))
        .stdout(predicate::str::contains("Contended acquisitions: "));
}

#[test]
fn test_json_report() {
    let output = bench().args(["-t", "2", "-i", "10", "--json"]).output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["final_count"], 20);
    assert_eq!(report["config"]["discipline"], "locking");
}

#[test]
fn test_compare_names_lock_scope() {
    bench()
        .args(["compare", "-t", "2", "-i", "1000", "--lock-scope", "per-increment"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Locking (per-increment, mutex): 2000 in "))
        .stdout(predicate::str::contains("Atomic: 2000 in "));
}

#[test]
fn test_probe_output() {
    bench()
        .arg("probe")
        .assert()
        .success()
        .stdout(predicate::str::contains("Final counter value: 5000"))
        .stdout(predicate::str::contains("Numeric doubling test: 84"))
        .stdout(predicate::str::contains("Lazy filter test - Even numbers: 2 4"));
}
