//! CLI 端到端测试

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file
}

fn cli(config: &NamedTempFile) -> Command {
    let mut cmd = Command::cargo_bin("pendulum-cli").unwrap();
    cmd.arg("--config").arg(config.path());
    cmd
}

#[test]
fn test_config_show_prints_effective_config() {
    let config = config_file("[reset]\nseed = 42\n");
    cli(&config)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("steps_per_rev = 3200"))
        .stdout(predicate::str::contains("seed = 42"));
}

#[test]
fn test_config_check_rejects_invalid_config() {
    let config = config_file("[safety]\ndebounce_samples = 0\n");
    cli(&config)
        .args(["config", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("debounce_samples"));
}

#[test]
fn test_config_check_accepts_defaults() {
    let config = config_file("");
    cli(&config)
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

#[test]
fn test_unknown_reset_mode_is_fatal() {
    let config = config_file("");
    cli(&config)
        .args(["reset", "--mode", "upright"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown reset mode"));
}

#[test]
fn test_home_reset_on_sim() {
    let config = config_file("");
    cli(&config)
        .args(["reset", "--backend", "sim", "--mode", "home"])
        .assert()
        .success()
        .stdout(predicate::str::contains("bar=3.1416 rad"));
}

#[test]
fn test_run_sim_for_fixed_cycles() {
    let config = config_file("");
    cli(&config)
        .args([
            "run",
            "--backend",
            "sim",
            "--agent",
            "random",
            "--seed",
            "5",
            "--max-cycles",
            "100",
        ])
        .assert()
        .success()
        // 上限落在故障周期时会多执行一个复位周期
        .stdout(predicate::str::is_match(r"cycles:\s+10[01]\n").unwrap())
        .stdout(predicate::str::contains("home resets:       1"));
}

#[test]
fn test_run_with_episode_limit() {
    let config = config_file("");
    cli(&config)
        .args([
            "run",
            "--agent",
            "idle",
            "--episode-steps",
            "10",
            "--steps",
            "25",
        ])
        .assert()
        .success()
        // 1 + (10 + 1 + 1) · 2 = 25
        .stdout(predicate::str::contains("home resets:       3"));
}

#[test]
fn test_serial_requires_port() {
    let config = config_file("");
    cli(&config)
        .args(["run", "--backend", "serial", "--max-cycles", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No serial port"));
}

#[test]
fn test_invalid_config_reported_before_backend() {
    let config = config_file("[control]\ntimestep_hz = 0.0\n");
    cli(&config)
        .args(["run", "--backend", "serial", "--port", "/dev/does-not-exist"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("timestep"))
        .stderr(predicate::str::contains("serial port").not());
}
