//! Integration tests for the simulate command.

use std::process::Command;

#[test]
fn test_simulate_verifies_order() {
    let status = Command::new(env!("CARGO_BIN_EXE_transcoda"))
        .args(["simulate", "--frames", "200", "--views", "2", "--frame-size", "64"])
        .args(["--threads", "4", "--max-delay-ms", "2", "--seed", "11"])
        .status()
        .expect("Failed to run transcoda simulate");
    assert!(status.success());
}

#[test]
fn test_simulate_inline() {
    let status = Command::new(env!("CARGO_BIN_EXE_transcoda"))
        .args(["simulate", "--frames", "50", "--threads", "0"])
        .status()
        .expect("Failed to run transcoda simulate");
    assert!(status.success());
}

#[test]
fn test_simulate_rejects_zero_queue_capacity() {
    let output = Command::new(env!("CARGO_BIN_EXE_transcoda"))
        .args(["simulate", "--frames", "10", "--queue-capacity", "0"])
        .output()
        .expect("Failed to run transcoda simulate");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("queue-capacity"));
}
