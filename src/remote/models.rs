// ABOUTME: Wire types exchanged with the deployment backend
// ABOUTME: Trigger acknowledgements, job status snapshots, chat snippets and generation calls

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Raw reply as seen by the protocol code, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub reason: String,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        let reason = reqwest::StatusCode::from_u16(status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or_default()
            .to_string();
        Self {
            status,
            reason,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: serde::de::DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }

    /// "HTTP 502 Bad Gateway", the last resort when the body carries no message.
    pub fn status_line(&self) -> String {
        if self.reason.is_empty() {
            format!("HTTP {}", self.status)
        } else {
            format!("HTTP {} {}", self.status, self.reason)
        }
    }
}

/// Fields consulted, in order, for the reason a trigger call was rejected.
pub const ACK_MESSAGE_FIELDS: &[&str] = &["error", "message"];

pub const GENERIC_FAILURE: &str = "deployment failed";

/// First non-empty string among `fields`, in order.
pub fn first_message(body: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|field| body.get(*field).and_then(Value::as_str))
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusState {
    Pending,
    Running,
    Done,
    Error,
    Other(String),
}

impl StatusState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StatusState::Done | StatusState::Error)
    }
}

impl From<&str> for StatusState {
    fn from(raw: &str) -> Self {
        match raw {
            "pending" => StatusState::Pending,
            "running" => StatusState::Running,
            "done" => StatusState::Done,
            "error" => StatusState::Error,
            other => StatusState::Other(other.to_string()),
        }
    }
}

impl fmt::Display for StatusState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StatusState::Pending => write!(f, "pending"),
            StatusState::Running => write!(f, "running"),
            StatusState::Done => write!(f, "done"),
            StatusState::Error => write!(f, "error"),
            StatusState::Other(raw) if raw.is_empty() => write!(f, "unknown"),
            StatusState::Other(raw) => write!(f, "{}", raw),
        }
    }
}

/// Status snapshot. Fields of an unexpected JSON type read as absent, so a
/// body that parses as JSON always yields a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobStatus {
    pub status: String,
    pub message: Option<String>,
    pub details: Option<String>,
}

impl JobStatus {
    pub fn parse(body: &str) -> serde_json::Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        Ok(Self::from_value(&value))
    }

    pub fn from_value(body: &Value) -> Self {
        Self {
            status: body
                .get("status")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            message: first_message(body, &["message"]),
            details: first_message(body, &["details"]),
        }
    }

    pub fn state(&self) -> StatusState {
        StatusState::from(self.status.as_str())
    }

    /// `details`, then `message`, then a generic text.
    pub fn failure_reason(&self) -> String {
        [&self.details, &self.message]
            .into_iter()
            .flatten()
            .find(|text| !text.is_empty())
            .cloned()
            .unwrap_or_else(|| GENERIC_FAILURE.to_string())
    }
}

/// Body of `GET /agent/latest`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LatestSnippet {
    pub code: Option<String>,
    pub ts: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    pub terraform_code: String,
}
