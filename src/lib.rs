//! log-stream - Streaming decoder for newline-delimited error and audit logs.

pub mod config;
pub mod display;
pub mod events;
pub mod stream;

pub use config::{ConfigError, ConfigLoader, StreamConfig};
pub use events::{AuditEvent, AuditRequest, AuditResponse, ErrorEvent};
pub use stream::{AuditStream, Close, CloseHandle, ErrorStream, EventStream, StreamError};
