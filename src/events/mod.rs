//! Event records carried by the error and audit logs.

pub mod duration;
mod types;

pub use types::{AuditEvent, AuditRequest, AuditResponse, ErrorEvent};
