//! HTTP client for the remote policy service.

use crate::error::{LinkError, Result};
use reqwest::blocking::Client;
use rover_traits::{Policy, SyncPayload};
use std::time::Duration;

type BoxErr = Box<dyn std::error::Error + Send + Sync>;

/// Pull the suggestion out of a decision body. A missing, null or
/// non-string `action` is "no suggestion" — a normal answer, not an
/// error; an unparseable body is.
fn parse_decision(body: &str) -> Result<Option<String>> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| LinkError::Malformed(e.to_string()))?;
    Ok(value
        .get("action")
        .and_then(|a| a.as_str())
        .map(str::to_owned))
}

/// One POST per cycle against the decision endpoint. The service is an
/// opaque box: it gets the payload, it may answer with an action name.
pub struct HttpPolicy {
    client: Client,
    url: String,
    timeout: Duration,
}

impl HttpPolicy {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            url: url.to_string(),
            timeout,
        })
    }
}

impl Policy for HttpPolicy {
    fn decide(&self, payload: &SyncPayload) -> std::result::Result<Option<String>, BoxErr> {
        let body = serde_json::json!({
            "timestamp": payload.timestamp_ms,
            "runId": payload.run_id,
            "imu": payload.imu,
            "counts": { "left": payload.left, "right": payload.right },
            "action": payload.action.as_str(),
            "mode": payload.mode.as_str(),
        });
        let resp = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .map_err(LinkError::from)?;
        // The contract is strict: 200 or it is a synchronization failure.
        let status = resp.status().as_u16();
        if status != 200 {
            return Err(LinkError::Status(status).into());
        }
        let text = resp.text().map_err(LinkError::from)?;
        Ok(parse_decision(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_with_action_string() {
        assert_eq!(
            parse_decision(r#"{"action":"left"}"#).expect("parses"),
            Some("left".to_string())
        );
    }

    #[test]
    fn absent_null_or_non_string_action_is_no_suggestion() {
        assert_eq!(parse_decision("{}").expect("parses"), None);
        assert_eq!(parse_decision(r#"{"action":null}"#).expect("parses"), None);
        assert_eq!(parse_decision(r#"{"action":7}"#).expect("parses"), None);
    }

    #[test]
    fn unknown_actions_are_passed_through_verbatim() {
        // Validation against the command set happens in the controller,
        // not here.
        assert_eq!(
            parse_decision(r#"{"action":"spin"}"#).expect("parses"),
            Some("spin".to_string())
        );
    }

    #[test]
    fn garbage_body_is_malformed() {
        assert!(matches!(
            parse_decision("<html>"),
            Err(LinkError::Malformed(_))
        ));
    }
}
