//! Bounded line splitting over a buffered reader.

use std::io::{BufRead, BufReader, Read};

use super::error::StreamError;

/// Splits a byte source into lines, reusing one buffer for every line.
///
/// Lines end at `\n`; a single `\r` before it is dropped as well. The last
/// line does not need a terminator.
#[derive(Debug)]
pub(crate) struct LineReader<R> {
    reader: BufReader<R>,
    line: Vec<u8>,
    max_line_bytes: usize,
}

impl<R: Read> LineReader<R> {
    pub(crate) fn new(reader: R, initial_capacity: usize, max_line_bytes: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(initial_capacity.min(max_line_bytes).max(1), reader),
            line: Vec::with_capacity(initial_capacity.min(max_line_bytes)),
            max_line_bytes,
        }
    }

    /// Read the next line into the internal buffer.
    ///
    /// Returns `Ok(false)` at end of data.
    pub(crate) fn read_line(&mut self) -> Result<bool, StreamError> {
        self.line.clear();

        // Room for the content plus a `\r\n` terminator.
        let limit = u64::try_from(self.max_line_bytes)
            .unwrap_or(u64::MAX)
            .saturating_add(2);
        let read = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.line)?;
        if read == 0 {
            return Ok(false);
        }

        if self.line.last() == Some(&b'\n') {
            self.line.pop();
            if self.line.last() == Some(&b'\r') {
                self.line.pop();
            }
        }
        if self.line.len() > self.max_line_bytes {
            return Err(StreamError::LineTooLong {
                limit: self.max_line_bytes,
            });
        }
        Ok(true)
    }

    pub(crate) fn into_inner(self) -> R {
        self.reader.into_inner()
    }
}

impl<R> LineReader<R> {
    /// The most recently read line without its terminator.
    pub(crate) fn line(&self) -> &[u8] {
        &self.line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(input: &str, max: usize) -> LineReader<Cursor<Vec<u8>>> {
        LineReader::new(Cursor::new(input.as_bytes().to_vec()), 16, max)
    }

    #[test]
    fn test_splits_lines() {
        let mut lines = reader("one\ntwo\n", 64);

        assert!(lines.read_line().unwrap());
        assert_eq!(lines.line(), b"one");
        assert!(lines.read_line().unwrap());
        assert_eq!(lines.line(), b"two");
        assert!(!lines.read_line().unwrap());
    }

    #[test]
    fn test_strips_carriage_return() {
        let mut lines = reader("one\r\n\r\n", 64);

        assert!(lines.read_line().unwrap());
        assert_eq!(lines.line(), b"one");
        assert!(lines.read_line().unwrap());
        assert!(lines.line().is_empty());
    }

    #[test]
    fn test_last_line_without_newline() {
        let mut lines = reader("one\ntail", 64);

        assert!(lines.read_line().unwrap());
        assert!(lines.read_line().unwrap());
        assert_eq!(lines.line(), b"tail");
        assert!(!lines.read_line().unwrap());
    }

    #[test]
    fn test_line_at_limit_is_accepted() {
        let mut lines = reader("abcd\nabcd", 4);

        assert!(lines.read_line().unwrap());
        assert_eq!(lines.line(), b"abcd");
        assert!(lines.read_line().unwrap());
        assert_eq!(lines.line(), b"abcd");
    }

    #[test]
    fn test_crlf_line_at_limit_is_accepted() {
        let mut lines = reader("abcd\r\nabcd\n", 4);

        assert!(lines.read_line().unwrap());
        assert_eq!(lines.line(), b"abcd");
        assert!(lines.read_line().unwrap());
        assert_eq!(lines.line(), b"abcd");
    }

    #[test]
    fn test_line_one_over_limit_with_newline_fails() {
        let mut lines = reader("abcde\r\n", 4);

        let err = lines.read_line().unwrap_err();
        assert!(matches!(err, StreamError::LineTooLong { limit: 4 }));
    }

    #[test]
    fn test_line_over_limit_fails() {
        let mut lines = reader("abcde\n", 4);

        let err = lines.read_line().unwrap_err();
        assert!(matches!(err, StreamError::LineTooLong { limit: 4 }));
    }
}
