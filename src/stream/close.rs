//! Explicit shutdown of the byte source behind a stream.

use std::fmt;
use std::io;
use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A resource that can be shut down explicitly, distinct from reaching
/// the end of its data.
///
/// `close` takes `&self` so it can be called from another thread while the
/// stream is blocked reading from the same resource.
pub trait Close: Send + Sync {
    /// Shut the resource down.
    ///
    /// # Errors
    ///
    /// Returns whatever error the shutdown produces.
    fn close(&self) -> io::Result<()>;
}

impl Close for TcpStream {
    fn close(&self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

#[cfg(unix)]
impl Close for std::os::unix::net::UnixStream {
    fn close(&self) -> io::Result<()> {
        self.shutdown(Shutdown::Both)
    }
}

impl<C: Close + ?Sized> Close for Arc<C> {
    fn close(&self) -> io::Result<()> {
        (**self).close()
    }
}

/// Cloneable handle that closes a stream from any thread.
///
/// Obtained from [`EventStream::close_handle`](super::EventStream::close_handle).
/// All handles of one stream share the same closed flag.
#[derive(Clone)]
pub struct CloseHandle {
    closed: Arc<AtomicBool>,
    closer: Option<Arc<dyn Close>>,
}

impl CloseHandle {
    pub(crate) fn new(closer: Option<Arc<dyn Close>>) -> Self {
        Self {
            closed: Arc::new(AtomicBool::new(false)),
            closer,
        }
    }

    /// Mark the stream closed and close the bound resource.
    ///
    /// Without a bound resource this is a no-op that always succeeds and
    /// leaves the stream open.
    ///
    /// # Errors
    ///
    /// Returns the error produced by the resource's own close.
    pub fn close(&self) -> io::Result<()> {
        let Some(closer) = &self.closer else {
            return Ok(());
        };
        // Set before closing so a read failing because of this close is suppressed.
        self.closed.store(true, Ordering::SeqCst);
        tracing::debug!("Closing event stream");
        closer.close()
    }

    /// Whether [`close`](Self::close) has been called with a bound resource.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Whether a closable resource is bound.
    #[must_use]
    pub fn is_closable(&self) -> bool {
        self.closer.is_some()
    }
}

impl fmt::Debug for CloseHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseHandle")
            .field("closed", &self.is_closed())
            .field("closable", &self.is_closable())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingCloser {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Close for CountingCloser {
        fn close(&self) -> io::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "already gone"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_close_without_closer_is_noop() {
        let handle = CloseHandle::new(None);
        assert!(handle.close().is_ok());
        assert!(handle.close().is_ok());
        assert!(!handle.is_closed());
        assert!(!handle.is_closable());
    }

    #[test]
    fn test_close_invokes_closer_and_sets_flag() {
        let closer = Arc::new(CountingCloser::default());
        let handle = CloseHandle::new(Some(closer.clone()));

        handle.close().unwrap();

        assert!(handle.is_closed());
        assert_eq!(closer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_close_error_is_returned_and_flag_still_set() {
        let closer = Arc::new(CountingCloser {
            fail: true,
            ..Default::default()
        });
        let handle = CloseHandle::new(Some(closer));

        let err = handle.close().unwrap_err();

        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(handle.is_closed());
    }

    #[test]
    fn test_cloned_handles_share_flag() {
        let handle = CloseHandle::new(Some(Arc::new(CountingCloser::default())));
        let other = handle.clone();

        other.close().unwrap();

        assert!(handle.is_closed());
    }

    #[test]
    fn test_debug_output() {
        let handle = CloseHandle::new(None);
        assert_eq!(
            format!("{handle:?}"),
            "CloseHandle { closed: false, closable: false }"
        );
    }
}
