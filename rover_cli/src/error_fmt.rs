//! Human-readable error descriptions and structured JSON error formatting.

use rover_link::LinkError;

/// Map an eyre::Report to a human-readable explanation with likely causes
/// and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    if let Some(le) = err.downcast_ref::<LinkError>() {
        return match le {
            LinkError::Timeout => {
                "What happened: an endpoint did not answer in time.\nLikely causes: robot powered off, wrong base URL, weak Wi-Fi link.\nHow to fix: check power and the [device]/[policy] URLs in the config; raise the timeout for slow links.".to_string()
            }
            LinkError::Status(code) => format!(
                "What happened: an endpoint answered with HTTP status {code}.\nLikely causes: wrong path in the configured URL, or the service is unhealthy.\nHow to fix: verify the URLs in the config and the service logs."
            ),
            LinkError::Transport(msg) => format!(
                "What happened: the connection failed ({msg}).\nLikely causes: robot and host on different networks, or the service is not listening.\nHow to fix: confirm both ends are reachable (ping / curl), then re-run."
            ),
            LinkError::Malformed(msg) => format!(
                "What happened: an endpoint answered with an unparseable body ({msg}).\nLikely causes: firmware/service version mismatch.\nHow to fix: update the onboard firmware or the policy service to a compatible version."
            ),
        };
    }

    if let Some(se) = err.downcast_ref::<rover_core::SyncError>() {
        return format!(
            "What happened: {se}.\nLikely causes: see the log output above.\nHow to fix: re-run with --log-level=debug or set RUST_LOG for more detail."
        );
    }

    // String-based heuristics for config validation failures
    let msg = err.to_string();
    if msg.contains("must") && (msg.contains('.') || msg.contains("http")) {
        return format!(
            "What happened: configuration is invalid ({msg}).\nHow to fix: edit the TOML config (see etc/rover.toml for a sample) and re-run."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Stable exit codes per failure class; generic errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    if let Some(le) = err.downcast_ref::<LinkError>() {
        return match le {
            LinkError::Timeout | LinkError::Transport(_) => 3,
            LinkError::Status(_) => 4,
            LinkError::Malformed(_) => 5,
        };
    }
    if err.to_string().contains("must") {
        // Config validation
        return 2;
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use serde_json::json;

    let reason = if let Some(le) = err.downcast_ref::<LinkError>() {
        match le {
            LinkError::Timeout => "Timeout",
            LinkError::Transport(_) => "Transport",
            LinkError::Status(_) => "Status",
            LinkError::Malformed(_) => "Malformed",
        }
    } else {
        "Error"
    };

    json!({ "reason": reason, "message": humanize(err) }).to_string()
}
