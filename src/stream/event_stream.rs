//! Generic line-delimited event stream.

use std::io::{self, Read};
use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::close::{Close, CloseHandle};
use super::error::StreamError;
use super::lines::LineReader;
use crate::config::StreamConfig;
use crate::events::{AuditEvent, ErrorEvent};

/// Stream of [`ErrorEvent`]s.
pub type ErrorStream<R> = EventStream<ErrorEvent, R>;

/// Stream of [`AuditEvent`]s.
pub type AuditStream<R> = EventStream<AuditEvent, R>;

#[derive(Debug)]
enum State {
    Open,
    Exhausted,
    Failed(StreamError),
}

/// Iterates over the JSON-encoded records of a byte source, one per line.
///
/// Successive calls to [`advance`](Self::advance) step through the records.
/// Empty lines are skipped. Iteration stops at the end of the source, at the
/// first read error, at a line too large for the buffer, at a line that does
/// not decode as `T`, or once the stream has been closed. After that every
/// call to `advance` returns `false`.
///
/// ```
/// use std::io::Cursor;
/// use log_stream::ErrorStream;
///
/// let mut stream = ErrorStream::new(Cursor::new("{\"message\":\"disk full\"}\n"));
/// while stream.advance() {
///     println!("{}", stream.event().message);
/// }
/// assert!(stream.err().is_none());
/// ```
#[derive(Debug)]
pub struct EventStream<T, R> {
    lines: LineReader<R>,
    event: T,
    state: State,
    handle: CloseHandle,
    events_read: u64,
}

impl<T, R> EventStream<T, R>
where
    T: DeserializeOwned + Default,
    R: Read,
{
    /// Create a stream over `reader` with the default configuration.
    ///
    /// No closable resource is bound, so [`close`](Self::close) is a no-op.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, &StreamConfig::default())
    }

    /// Create a stream over `reader` with the given buffer limits.
    #[must_use]
    pub fn with_config(reader: R, config: &StreamConfig) -> Self {
        Self::build(reader, None, config)
    }

    /// Create a stream whose [`close`](Self::close) shuts down `closer`.
    ///
    /// `closer` usually refers to the same resource as `reader`, e.g. a
    /// clone of the socket the events are read from.
    #[must_use]
    pub fn closable<C>(reader: R, closer: C) -> Self
    where
        C: Close + 'static,
    {
        Self::closable_with_config(reader, closer, &StreamConfig::default())
    }

    /// Like [`closable`](Self::closable), with the given buffer limits.
    #[must_use]
    pub fn closable_with_config<C>(reader: R, closer: C, config: &StreamConfig) -> Self
    where
        C: Close + 'static,
    {
        Self::build(reader, Some(Arc::new(closer)), config)
    }

    fn build(reader: R, closer: Option<Arc<dyn Close>>, config: &StreamConfig) -> Self {
        Self {
            lines: LineReader::new(reader, config.initial_buffer_bytes, config.max_line_bytes),
            event: T::default(),
            state: State::Open,
            handle: CloseHandle::new(closer),
            events_read: 0,
        }
    }

    /// Advance to the next event, which is then available through
    /// [`event`](Self::event) and [`bytes`](Self::bytes).
    ///
    /// Returns `false` once iteration stops: end of data, an error, or a
    /// closed stream. [`err`](Self::err) then reports the error, if any.
    pub fn advance(&mut self) -> bool {
        if !matches!(self.state, State::Open) || self.handle.is_closed() {
            return false;
        }

        loop {
            match self.lines.read_line() {
                Ok(true) if self.lines.line().is_empty() => {}
                Ok(true) => break,
                Ok(false) => {
                    tracing::trace!(events = self.events_read, "Event stream exhausted");
                    self.state = State::Exhausted;
                    return false;
                }
                Err(err) => {
                    self.fail(err);
                    return false;
                }
            }
        }

        match serde_json::from_slice(self.lines.line()) {
            Ok(event) => {
                self.event = event;
                self.events_read += 1;
                true
            }
            Err(err) => {
                self.fail(StreamError::Decode(err));
                false
            }
        }
    }

    /// Consume the stream and return the byte source.
    ///
    /// Data already buffered but not yet returned as an event is lost.
    pub fn into_inner(self) -> R {
        self.lines.into_inner()
    }

    fn fail(&mut self, err: StreamError) {
        if self.handle.is_closed() {
            tracing::debug!(error = %err, "Ignoring error on closed event stream");
            self.state = State::Exhausted;
            return;
        }
        tracing::warn!(error = %err, events = self.events_read, "Event stream failed");
        self.state = State::Failed(err);
    }
}

impl<T, R> EventStream<T, R> {
    /// The first error encountered while reading or decoding, if any.
    ///
    /// Reaching the end of the data is not an error. Errors returned by
    /// [`close`](Self::close) are never reported here.
    #[must_use]
    pub fn err(&self) -> Option<&StreamError> {
        match &self.state {
            State::Failed(err) => Some(err),
            State::Open | State::Exhausted => None,
        }
    }

    /// The event decoded by the most recent successful [`advance`](Self::advance).
    ///
    /// Stale after `advance` returned `false`.
    #[must_use]
    pub fn event(&self) -> &T {
        &self.event
    }

    /// Raw content of the most recently scanned line, without its line
    /// terminator. It may not be valid JSON.
    ///
    /// The slice borrows the stream's line buffer, which the next call to
    /// `advance` overwrites. Copy it to keep it.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.lines.line()
    }

    /// Close the underlying resource, if one is bound.
    ///
    /// Every later call to `advance` returns `false`, and errors caused by
    /// the shutdown are not recorded. Without a bound resource this is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns the error produced by closing the resource.
    pub fn close(&self) -> io::Result<()> {
        self.handle.close()
    }

    /// A handle that closes this stream from another thread.
    #[must_use]
    pub fn close_handle(&self) -> CloseHandle {
        self.handle.clone()
    }

    /// Whether the stream has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    /// Number of events decoded so far.
    #[must_use]
    pub fn events_read(&self) -> u64 {
        self.events_read
    }
}
