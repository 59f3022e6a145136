use std::sync::Arc;
use std::time::Duration;

use rover_core::bias::{self, CalibrationCfg, GyroBias};
use rover_core::mocks::{RecordingRobot, ScriptPolicy};
use rover_core::{Controller, Timeouts};
use rover_traits::clock::TestClock;
use rover_traits::{Clock, Imu};

fn gyro_frame(gx: f64, gy: f64, gz: f64) -> Imu {
    [("gx", gx), ("gy", gy), ("gz", gz)]
        .iter()
        .map(|(k, v)| (k.to_string(), *v))
        .collect()
}

#[test]
fn mean_uses_only_successful_samples() {
    let robot = RecordingRobot::new();
    // 20 requested, 5 fail; the 15 successes have gz values 0.2/0.5/0.8
    // in equal thirds, mean exactly 0.5.
    let mut script: Vec<Result<Imu, String>> = Vec::new();
    for i in 0..20_usize {
        if i % 4 == 3 {
            script.push(Err("fetch failed".to_string()));
        } else {
            let gz = match i % 3 {
                0 => 0.2,
                1 => 0.5,
                _ => 0.8,
            };
            script.push(Ok(gyro_frame(0.01, -0.02, gz)));
        }
    }
    // Make the scripted thirds actually balanced: count them first.
    let ok_gz: Vec<f64> = script
        .iter()
        .filter_map(|r| r.as_ref().ok().map(|f| f["gz"]))
        .collect();
    let expected_gz = ok_gz.iter().sum::<f64>() / ok_gz.len() as f64;
    assert_eq!(ok_gz.len(), 15);

    robot.push_imu_script(script);
    let clock = TestClock::new();
    let cfg = CalibrationCfg {
        samples: 20,
        spacing_ms: 100,
    };

    let report = bias::estimate(
        &robot,
        &clock,
        &cfg,
        Duration::from_millis(50),
        GyroBias::default(),
    );

    assert_eq!(report.requested, 20);
    assert_eq!(report.collected, 15);
    assert!((report.bias.gz - expected_gz).abs() < 1e-9);
    assert!((report.bias.gx - 0.01).abs() < 1e-9);
    assert!((report.bias.gy + 0.02).abs() < 1e-9);
}

#[test]
fn samples_are_spaced_by_the_configured_interval() {
    let robot = RecordingRobot::new();
    robot.set_imu(&[("gx", 0.0), ("gy", 0.0), ("gz", 0.0)]);
    let clock = TestClock::new();
    let cfg = CalibrationCfg {
        samples: 10,
        spacing_ms: 100,
    };

    let _ = bias::estimate(
        &robot,
        &clock,
        &cfg,
        Duration::from_millis(50),
        GyroBias::default(),
    );

    assert_eq!(robot.imu_reads(), 10);
    assert_eq!(clock.elapsed(), Duration::from_millis(1_000));
}

#[test]
fn zero_successes_leaves_bias_unchanged() {
    let robot = RecordingRobot::new();
    robot.fail_imu(true);
    let clock = TestClock::new();
    let previous = GyroBias {
        gx: 0.11,
        gy: -0.07,
        gz: 0.42,
    };

    let report = bias::estimate(
        &robot,
        &clock,
        &CalibrationCfg::default(),
        Duration::from_millis(50),
        previous,
    );

    assert_eq!(report.collected, 0);
    assert_eq!(report.bias, previous);
}

#[test]
fn controller_applies_fresh_bias_to_later_cycles() {
    let robot = Arc::new(RecordingRobot::new());
    robot.push_imu_script((0..4).map(|_| Ok(gyro_frame(0.25, 0.0, -0.5))));
    robot.set_imu(&[("gx", 1.25), ("gy", 0.0), ("gz", 0.5)]);
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(TestClock::new());
    let mut ctl = Controller::new(
        robot.clone(),
        ScriptPolicy::silent(),
        clock,
        Timeouts::default(),
        CalibrationCfg {
            samples: 4,
            spacing_ms: 10,
        },
    );

    let report = ctl.calibrate();
    assert_eq!(report.collected, 4);
    assert!((ctl.bias().gx - 0.25).abs() < 1e-9);

    let _ = ctl.step();
    let snap = ctl.snapshot();
    assert!((snap.imu["gx"] - 1.0).abs() < 1e-9);
    assert!((snap.imu["gz"] - 1.0).abs() < 1e-9);
}
