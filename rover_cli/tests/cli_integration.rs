use assert_cmd::prelude::*;
use predicates::prelude::*;
use rstest::rstest;
use std::fs;
use std::path::PathBuf;
use std::process::Command;
use tempfile::tempdir;

// Build a minimal valid TOML config with fast schedule for sim runs
fn write_valid_config(dir: &tempfile::TempDir) -> PathBuf {
    let toml = r#"
[device]
base_url = "http://127.0.0.1:1"
timeout_ms = 200

[policy]
url = "http://127.0.0.1:1/decide"
timeout_ms = 200

[schedule]
manual_tick_ms = 50
auto_tick_ms = 20

[calibration]
samples = 3
spacing_ms = 1
"#;
    let path = dir.path().join("rover.toml");
    fs::write(&path, toml).expect("write config");
    path
}

#[rstest]
#[case(&["--help"], 0, "Usage:", "stdout")]
#[case(&["--sim", "self-check"], 0, "self-check: ok", "stdout")]
#[case(&["--sim", "calibrate"], 0, "bias:", "stdout")]
#[case(&["calibrate", "--bogus-flag"], 2, "unexpected argument", "stderr")]
fn cli_table_cases(
    #[case] args: &[&str],
    #[case] exit_code: i32,
    #[case] needle: &str,
    #[case] stream: &str,
) {
    let dir = tempdir().expect("tempdir");
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("rover").expect("binary");
    cmd.arg("--config").arg(&cfg);
    for a in args {
        cmd.arg(a);
    }

    let assert = cmd.assert().code(exit_code);
    match stream {
        "stdout" => {
            assert.stdout(predicate::str::contains(needle));
        }
        "stderr" => {
            assert.stderr(predicate::str::contains(needle));
        }
        other => panic!("unknown stream: {other}"),
    }
}

#[test]
fn sim_drive_runs_and_stops_cleanly() {
    let dir = tempdir().expect("tempdir");
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("rover").expect("binary");
    cmd.arg("--config")
        .arg(&cfg)
        .args(["--sim", "drive", "--auto", "--run-for", "1", "--status-every", "0"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("sync loop stopped"));
}

#[test]
fn calibrate_json_output_is_parseable() {
    let dir = tempdir().expect("tempdir");
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("rover").expect("binary");
    cmd.arg("--config")
        .arg(&cfg)
        .args(["--sim", "--json", "calibrate", "--samples", "3", "--spacing-ms", "1"]);

    let output = cmd.assert().success().get_output().stdout.clone();
    let text = String::from_utf8(output).expect("utf8 stdout");
    let line = text.lines().last().expect("one line of output");
    let value: serde_json::Value = serde_json::from_str(line).expect("JSON output");
    assert!(value.get("gx").and_then(serde_json::Value::as_f64).is_some());
    assert_eq!(
        value.get("collected").and_then(serde_json::Value::as_u64),
        Some(3)
    );
}

#[test]
fn invalid_config_is_rejected_with_config_exit_code() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("bad.toml");
    fs::write(
        &path,
        "[schedule]\nmanual_tick_ms = 0\nauto_tick_ms = 200\n",
    )
    .expect("write config");

    let mut cmd = Command::cargo_bin("rover").expect("binary");
    cmd.arg("--config").arg(&path).args(["--sim", "self-check"]);

    cmd.assert()
        .code(2)
        .stderr(predicate::str::contains("configuration is invalid"));
}

#[test]
fn self_check_against_dead_endpoint_fails() {
    let dir = tempdir().expect("tempdir");
    let cfg = write_valid_config(&dir);

    let mut cmd = Command::cargo_bin("rover").expect("binary");
    // Port 1 on localhost: nothing listens there.
    cmd.arg("--config").arg(&cfg).arg("self-check");

    cmd.assert()
        .failure()
        .stdout(predicate::str::contains("counts: FAILED"));
}
