//! HTTP gateway to the robot's onboard controller.
//!
//! The device speaks a deliberately dumb protocol: `GET /counts` returns
//! `"<left>|<right>"` as text (fields may carry serial-line noise),
//! `GET /imu` returns a JSON object, and each motion command is its own
//! `GET /<action>` endpoint whose response body is ignored.

use crate::error::{LinkError, Result};
use reqwest::blocking::Client;
use rover_traits::{Command, Imu, Robot};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

type BoxErr = Box<dyn std::error::Error + Send + Sync>;

/// Strip serial-line noise from one counts field: everything but ASCII
/// digits is dropped, except a sign directly ahead of the digits.
fn sanitize_field(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    for c in field.trim().chars() {
        if c.is_ascii_digit() {
            out.push(c);
        } else if (c == '-' || c == '+') && out.is_empty() {
            out.push(c);
        }
    }
    out
}

fn parse_count(field: &str) -> Option<i64> {
    sanitize_field(field).parse().ok()
}

/// Parse a `"<left>|<right>"` body. A field that is missing or still
/// unparseable after sanitizing falls back to the previous known value
/// for that side; the counts surface never hard-fails on content.
fn parse_counts(body: &str, previous: (i64, i64)) -> (i64, i64) {
    let mut parts = body.splitn(2, '|');
    let left = parts.next().and_then(parse_count).unwrap_or(previous.0);
    let right = parts.next().and_then(parse_count).unwrap_or(previous.1);
    (left, right)
}

/// Parse an IMU body. Anything but a top-level JSON object is a failed
/// read; numeric members are kept (axes and passthrough values alike),
/// non-numeric members are dropped.
fn parse_imu(body: &str) -> Result<Imu> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| LinkError::Malformed(e.to_string()))?;
    let obj = value
        .as_object()
        .ok_or_else(|| LinkError::Malformed("imu body is not a JSON object".to_string()))?;
    let mut imu = Imu::new();
    for (k, v) in obj {
        if let Some(f) = v.as_f64() {
            imu.insert(k.clone(), f);
        }
    }
    Ok(imu)
}

/// Device gateway over the onboard HTTP endpoints.
///
/// One instance can be shared across threads: the HTTP client is
/// thread-safe and the only interior state is the last-good counts pair
/// backing the per-side parse fallback.
pub struct HttpRobot {
    client: Client,
    base: String,
    command_timeout: Duration,
    last_counts: Mutex<(i64, i64)>,
}

impl HttpRobot {
    /// `command_timeout` bounds the fire-and-forget motion commands; the
    /// sensor reads get their timeout per call from the control loop.
    pub fn new(base_url: &str, command_timeout: Duration) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
            command_timeout,
            last_counts: Mutex::new((0, 0)),
        })
    }

    fn get(&self, path: &str, timeout: Duration) -> Result<String> {
        let url = format!("{}/{}", self.base, path);
        let resp = self.client.get(&url).timeout(timeout).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(LinkError::Status(status.as_u16()));
        }
        Ok(resp.text()?)
    }
}

impl Robot for HttpRobot {
    fn read_counts(&self, timeout: Duration) -> std::result::Result<(i64, i64), BoxErr> {
        let body = self.get("counts", timeout)?;
        let mut last = self.last_counts.lock().unwrap_or_else(PoisonError::into_inner);
        let counts = parse_counts(&body, *last);
        *last = counts;
        Ok(counts)
    }

    fn read_imu(&self, timeout: Duration) -> std::result::Result<Imu, BoxErr> {
        let body = self.get("imu", timeout)?;
        Ok(parse_imu(&body)?)
    }

    fn execute(&self, cmd: Command) -> std::result::Result<(), BoxErr> {
        // Response body ignored by contract.
        let _ = self.get(cmd.as_str(), self.command_timeout)?;
        tracing::debug!(action = %cmd, "command sent");
        Ok(())
    }
}
