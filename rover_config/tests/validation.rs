use rover_config::load_toml;

#[test]
fn rejects_zero_auto_tick() {
    let toml = r#"
[device]
base_url = "http://10.0.0.7"
timeout_ms = 2000

[schedule]
manual_tick_ms = 500
auto_tick_ms = 0
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject auto_tick_ms=0");
    assert!(
        format!("{err}")
            .to_lowercase()
            .contains("auto_tick_ms must be >= 1")
    );
}

#[test]
fn rejects_non_http_device_url() {
    let toml = r#"
[device]
base_url = "ftp://10.0.0.7"
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject non-http base_url");
    assert!(format!("{err}").contains("http://"));
}

#[test]
fn rejects_zero_calibration_samples() {
    let toml = r#"
[calibration]
samples = 0
spacing_ms = 100
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should reject samples=0");
    assert!(format!("{err}").contains("calibration.samples"));
}

#[test]
fn accepts_complete_config() {
    let toml = r#"
[device]
base_url = "http://192.168.4.1"
timeout_ms = 2000

[policy]
url = "http://policy.local:8080/decide"
timeout_ms = 3000

[schedule]
manual_tick_ms = 500
auto_tick_ms = 200

[calibration]
samples = 20
spacing_ms = 100

[logging]
level = "debug"
"#;

    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config should pass");
    assert_eq!(cfg.policy.timeout_ms, 3000);
    assert_eq!(cfg.logging.level.as_deref(), Some("debug"));
}

#[test]
fn unknown_keys_are_tolerated() {
    // Older configs may carry sections this build no longer reads.
    let toml = r#"
[device]
base_url = "http://192.168.4.1"

[display]
theme = "dark"
"#;

    let cfg = load_toml(toml).expect("parse TOML with extra section");
    cfg.validate().expect("valid config should pass");
}
