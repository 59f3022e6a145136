//! End-to-end tests for the HTTP gateway and policy client against a
//! canned single-thread HTTP server.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use rover_link::{HttpPolicy, HttpRobot};
use rover_traits::{Command, Imu, Mode, Policy, Robot, SyncPayload};

fn http_200(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

fn http_status(code: u16) -> String {
    format!("HTTP/1.1 {code} NO\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
}

/// Read one full request (headers plus Content-Length body) off a stream.
fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = [0u8; 4096];
    let mut req: Vec<u8> = Vec::new();
    let mut header_end = None;
    loop {
        if header_end.is_none() {
            if let Some(pos) = req.windows(4).position(|w| w == b"\r\n\r\n") {
                header_end = Some(pos + 4);
            }
        }
        if let Some(end) = header_end {
            let headers = String::from_utf8_lossy(&req[..end]).to_lowercase();
            let content_length = headers
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if req.len() >= end + content_length {
                break;
            }
        }
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => req.extend_from_slice(&buf[..n]),
            Err(_) => break,
        }
    }
    String::from_utf8_lossy(&req).to_string()
}

/// Serve canned responses in order, one connection each; every received
/// request is reported through the channel.
fn serve_script(responses: Vec<String>) -> (String, mpsc::Receiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test listener");
    let addr = listener.local_addr().expect("local addr");
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for resp in responses {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let req = read_request(&mut stream);
            let _ = tx.send(req);
            let _ = stream.write_all(resp.as_bytes());
        }
    });
    (format!("http://{addr}"), rx)
}

fn timeout() -> Duration {
    Duration::from_secs(2)
}

#[test]
fn counts_round_trip_with_per_side_fallback() {
    let (base, rx) = serve_script(vec![http_200("100|200"), http_200("abc|42")]);
    let robot = HttpRobot::new(&base, timeout()).expect("build robot");

    assert_eq!(robot.read_counts(timeout()).expect("first read"), (100, 200));
    // Left field is garbage on the second read: previous left survives.
    assert_eq!(robot.read_counts(timeout()).expect("second read"), (100, 42));

    let first = rx.recv().expect("request seen");
    assert!(first.starts_with("GET /counts HTTP/1.1"), "got: {first}");
}

#[test]
fn imu_round_trip_and_non_object_failure() {
    let (base, _rx) = serve_script(vec![
        http_200(r#"{"gx":0.1,"gy":0.2,"gz":0.3,"ax":9.8}"#),
        http_200("[1,2,3]"),
    ]);
    let robot = HttpRobot::new(&base, timeout()).expect("build robot");

    let imu = robot.read_imu(timeout()).expect("imu read");
    assert!((imu["ax"] - 9.8).abs() < 1e-9);

    assert!(robot.read_imu(timeout()).is_err());
}

#[test]
fn execute_targets_the_action_endpoint() {
    let (base, rx) = serve_script(vec![http_200("ok")]);
    let robot = HttpRobot::new(&base, timeout()).expect("build robot");

    robot.execute(Command::Stop).expect("execute");
    let req = rx.recv().expect("request seen");
    assert!(req.starts_with("GET /stop HTTP/1.1"), "got: {req}");
}

#[test]
fn device_error_status_fails_the_read() {
    let (base, _rx) = serve_script(vec![http_status(500)]);
    let robot = HttpRobot::new(&base, timeout()).expect("build robot");
    assert!(robot.read_counts(timeout()).is_err());
}

fn payload() -> SyncPayload {
    SyncPayload {
        timestamp_ms: 1_700_000_000_123,
        run_id: "run-abc-01".to_string(),
        imu: [("gx".to_string(), 0.9), ("gz".to_string(), 2.7)]
            .into_iter()
            .collect::<Imu>(),
        left: 15,
        right: -3,
        action: Command::Forward,
        mode: Mode::Auto,
    }
}

#[test]
fn policy_posts_the_payload_and_reads_the_action() {
    let (base, rx) = serve_script(vec![http_200(r#"{"action":"left"}"#)]);
    let policy = HttpPolicy::new(&format!("{base}/decide"), timeout()).expect("build policy");

    let decision = policy.decide(&payload()).expect("decide");
    assert_eq!(decision.as_deref(), Some("left"));

    let req = rx.recv().expect("request seen");
    assert!(req.starts_with("POST /decide HTTP/1.1"), "got: {req}");
    assert!(req.contains(r#""runId":"run-abc-01""#));
    assert!(req.contains(r#""mode":"auto""#));
    assert!(req.contains(r#""action":"forward""#));
    assert!(req.contains(r#""left":15"#));
}

#[test]
fn policy_empty_object_is_no_suggestion() {
    let (base, _rx) = serve_script(vec![http_200("{}")]);
    let policy = HttpPolicy::new(&format!("{base}/decide"), timeout()).expect("build policy");
    assert_eq!(policy.decide(&payload()).expect("decide"), None);
}

#[test]
fn policy_non_200_is_a_sync_failure() {
    let (base, _rx) = serve_script(vec![http_status(503)]);
    let policy = HttpPolicy::new(&format!("{base}/decide"), timeout()).expect("build policy");
    assert!(policy.decide(&payload()).is_err());
}
