use assert_cmd::Command;
use std::io::Write;

#[test]
fn help_exits_zero() {
    Command::new(assert_cmd::cargo::cargo_bin!("vigild"))
        .arg("--help")
        .assert()
        .success();
}

#[test]
fn once_mode_runs_one_cycle_and_exits_zero() {
    Command::new(assert_cmd::cargo::cargo_bin!("vigild"))
        .arg("--once")
        .assert()
        .success();
}

#[test]
fn bad_config_fails_startup_with_nonzero_exit() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "poll_interval_mins = 0").unwrap();

    Command::new(assert_cmd::cargo::cargo_bin!("vigild"))
        .args(["--once", "--config"])
        .arg(file.path())
        .assert()
        .failure();
}

#[test]
fn missing_config_file_fails_startup() {
    Command::new(assert_cmd::cargo::cargo_bin!("vigild"))
        .args(["--once", "--config", "/nonexistent/vigild.toml"])
        .assert()
        .failure();
}
