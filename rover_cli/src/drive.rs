//! Command implementations: config mapping, endpoint assembly, loop run.

use eyre::WrapErr;
use rover_core::bias::{self, GyroBias};
use rover_core::{CalibrationCfg, Snapshot, SyncService, Timeouts};
use rover_link::{HttpPolicy, HttpRobot, SimPolicy, SimRobot};
use rover_traits::{Clock, Mode, MonotonicClock, Policy, Robot};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

pub struct DriveOpts {
    pub auto: bool,
    pub device_url: Option<String>,
    pub policy_url: Option<String>,
    pub calibrate_first: bool,
    pub run_for: Option<u64>,
    pub status_every: u64,
}

pub fn drive(
    cfg: &rover_config::Config,
    opts: &DriveOpts,
    sim: bool,
    shutdown: &Arc<AtomicBool>,
) -> eyre::Result<()> {
    if sim {
        let robot = Arc::new(SimRobot::new());
        drive_with(robot, SimPolicy::patrol(), cfg, opts, shutdown)
    } else {
        let device_url = opts.device_url.as_deref().unwrap_or(&cfg.device.base_url);
        let policy_url = opts.policy_url.as_deref().unwrap_or(&cfg.policy.url);
        let robot = Arc::new(
            HttpRobot::new(device_url, Duration::from_millis(cfg.device.timeout_ms))
                .map_err(eyre::Report::new)
                .wrap_err("build device gateway")?,
        );
        let policy = HttpPolicy::new(policy_url, Duration::from_millis(cfg.policy.timeout_ms))
            .map_err(eyre::Report::new)
            .wrap_err("build policy client")?;
        drive_with(robot, policy, cfg, opts, shutdown)
    }
}

fn drive_with<R, P>(
    robot: Arc<R>,
    policy: P,
    cfg: &rover_config::Config,
    opts: &DriveOpts,
    shutdown: &Arc<AtomicBool>,
) -> eyre::Result<()>
where
    R: Robot + Send + Sync + 'static,
    P: Policy + Send + 'static,
{
    let clock: Arc<dyn Clock + Send + Sync> = Arc::new(MonotonicClock::new());
    let service = SyncService::spawn(
        robot,
        policy,
        clock,
        Timeouts::from(cfg),
        (&cfg.calibration).into(),
        (&cfg.schedule).into(),
    );

    if opts.calibrate_first {
        println!("calibrating; keep the robot still...");
        service.calibrate();
        while service.calibrating() && !shutdown.load(Ordering::Relaxed) {
            std::thread::sleep(Duration::from_millis(50));
        }
        let b = service.snapshot().bias;
        println!("bias: gx={:+.4} gy={:+.4} gz={:+.4}", b.gx, b.gy, b.gz);
    }

    let mode = if opts.auto { Mode::Auto } else { Mode::Manual };
    if opts.auto {
        service.set_mode(Mode::Auto);
    }
    tracing::info!(mode = %mode, tick_ms = service.tick_period_ms(), "sync loop running");

    let started = Instant::now();
    let mut last_status = Instant::now();
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        if let Some(secs) = opts.run_for
            && started.elapsed() >= Duration::from_secs(secs)
        {
            break;
        }
        if opts.status_every > 0 && last_status.elapsed() >= Duration::from_secs(opts.status_every)
        {
            print_status(&service.snapshot());
            last_status = Instant::now();
        }
        std::thread::sleep(Duration::from_millis(100));
    }

    // Belt and braces: the service also stops the device on shutdown.
    service.stop_now();
    drop(service);
    println!("sync loop stopped");
    Ok(())
}

fn print_status(snap: &Snapshot) {
    let gz = snap.imu.get("gz").copied().unwrap_or(0.0);
    println!(
        "[{}] mode={} applied={} counts={}|{} gz={:+.3} suggested={}{}",
        snap.run_id,
        snap.mode,
        snap.applied,
        snap.left,
        snap.right,
        gz,
        snap.last_suggested.as_deref().unwrap_or("-"),
        if snap.calibrating { " (calibrating)" } else { "" },
    );
}

pub fn calibrate(
    cfg: &rover_config::Config,
    samples: Option<u32>,
    spacing_ms: Option<u64>,
    device_url: Option<&str>,
    sim: bool,
    json: bool,
) -> eyre::Result<()> {
    let calibration = CalibrationCfg {
        samples: samples.unwrap_or(cfg.calibration.samples),
        spacing_ms: spacing_ms.unwrap_or(cfg.calibration.spacing_ms),
    };
    let timeout = Duration::from_millis(cfg.device.timeout_ms);
    let clock = MonotonicClock::new();

    let report = if sim {
        bias::estimate(
            &SimRobot::new(),
            &clock,
            &calibration,
            timeout,
            GyroBias::default(),
        )
    } else {
        let base = device_url.unwrap_or(&cfg.device.base_url);
        let robot = HttpRobot::new(base, timeout)
            .map_err(eyre::Report::new)
            .wrap_err("build device gateway")?;
        bias::estimate(&robot, &clock, &calibration, timeout, GyroBias::default())
    };

    if report.collected == 0 {
        eyre::bail!(
            "no calibration samples could be collected ({} attempted)",
            report.requested
        );
    }

    if json {
        println!(
            "{}",
            serde_json::json!({
                "gx": report.bias.gx,
                "gy": report.bias.gy,
                "gz": report.bias.gz,
                "collected": report.collected,
                "requested": report.requested,
            })
        );
    } else {
        println!(
            "bias: gx={:+.4} gy={:+.4} gz={:+.4} ({} of {} samples)",
            report.bias.gx, report.bias.gy, report.bias.gz, report.collected, report.requested
        );
    }
    Ok(())
}

pub fn self_check(
    cfg: &rover_config::Config,
    device_url: Option<&str>,
    sim: bool,
) -> eyre::Result<()> {
    let timeout = Duration::from_millis(cfg.device.timeout_ms);
    if sim {
        probe(&SimRobot::new(), timeout)
    } else {
        let base = device_url.unwrap_or(&cfg.device.base_url);
        let robot = HttpRobot::new(base, timeout)
            .map_err(eyre::Report::new)
            .wrap_err("build device gateway")?;
        probe(&robot, timeout)
    }
}

fn probe<R: Robot>(robot: &R, timeout: Duration) -> eyre::Result<()> {
    let counts = robot.read_counts(timeout);
    let imu = robot.read_imu(timeout);

    match &counts {
        Ok((l, r)) => println!("counts: ok ({l}|{r})"),
        Err(e) => println!("counts: FAILED ({e})"),
    }
    match &imu {
        Ok(frame) => println!("imu: ok ({} axes)", frame.len()),
        Err(e) => println!("imu: FAILED ({e})"),
    }

    if counts.is_err() || imu.is_err() {
        eyre::bail!("device self-check failed");
    }
    println!("self-check: ok");
    Ok(())
}
