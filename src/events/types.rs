//! Error and audit event types.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// An error logged by the service.
///
/// Subscribers to the error log receive one JSON-encoded
/// `ErrorEvent` per line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ErrorEvent {
    /// The logged error message.
    pub message: String,
}

/// An audit record produced once a request has been handled,
/// right before the response is sent to the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditEvent {
    /// When the audit event was created.
    pub time: DateTime<Utc>,
    /// The request received from the client.
    pub request: AuditRequest,
    /// The response sent to the client.
    pub response: AuditResponse,
}

/// Audit information about a client request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditRequest {
    /// Request path, e.g. `/v1/key/create/my-key`.
    pub path: String,
    /// Identity of the calling client.
    pub identity: String,
}

/// Audit information about the response sent to a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditResponse {
    /// HTTP status code.
    #[serde(rename = "code")]
    pub status_code: i64,
    /// Time spent handling the request, in signed nanoseconds.
    #[serde(with = "super::duration")]
    pub time: TimeDelta,
}

impl Default for AuditResponse {
    fn default() -> Self {
        Self {
            status_code: 0,
            time: TimeDelta::zero(),
        }
    }
}

impl AuditResponse {
    /// Whether the status code is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}
