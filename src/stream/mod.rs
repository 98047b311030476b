//! Pull-based decoding of newline-delimited event logs.
//!
//! An [`EventStream`] splits a byte source into lines, skips empty ones and
//! decodes every other line as a JSON record. [`ErrorStream`] and
//! [`AuditStream`] bind it to the two record types of the service.

mod close;
mod error;
mod event_stream;
mod lines;

pub use close::{Close, CloseHandle};
pub use error::StreamError;
pub use event_stream::{AuditStream, ErrorStream, EventStream};
