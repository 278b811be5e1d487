//! The append-only sink rendering writes into.
//!
//! One `Output` instance serves exactly one top-level format call; it is
//! not a concurrent type. Formatters write results exclusively through
//! this handle, never by returning strings, which is what allows streaming
//! destinations and buffer reuse.

use core::fmt;
use core::ops::Range;
use std::io;

use crate::ast::LiteralText;

/// An append-only text sink.
pub trait Output {
    /// Append a run of text.
    fn write_str(&mut self, s: &str) -> fmt::Result;

    /// Append a byte range of `src`. The default forwards the slice;
    /// sinks that track provenance can override to record where the
    /// text came from.
    fn write_range(&mut self, src: &str, range: Range<usize>) -> fmt::Result {
        self.write_str(&src[range])
    }

    /// Append a pre-resolved literal node. The default forwards the
    /// decoded text; sinks that track provenance can override.
    fn write_literal(&mut self, literal: &LiteralText) -> fmt::Result {
        self.write_str(literal.text())
    }
}

/// A plain `String` is a valid sink.
impl Output for String {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.push_str(s);
        Ok(())
    }
}

/// A growable in-memory sink.
#[derive(Debug, Default)]
pub struct StringOutput {
    buf: String,
}

impl StringOutput {
    /// An empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty sink with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: String::with_capacity(capacity) }
    }

    /// The text written so far.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    /// Consume the sink and return its text.
    pub fn into_string(self) -> String {
        self.buf
    }
}

impl Output for StringOutput {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.buf.push_str(s);
        Ok(())
    }
}

/// Adapter over any [`core::fmt::Write`] destination.
#[derive(Debug)]
pub struct FmtOutput<W: fmt::Write> {
    inner: W,
}

impl<W: fmt::Write> FmtOutput<W> {
    /// Wrap a `fmt::Write` destination.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwrap the destination.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: fmt::Write> Output for FmtOutput<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.inner.write_str(s)
    }
}

/// Adapter over any [`std::io::Write`] destination. I/O failures surface
/// as [`fmt::Error`]; callers that need the underlying error should wrap
/// their writer in something that records it.
#[derive(Debug)]
pub struct IoOutput<W: io::Write> {
    inner: W,
}

impl<W: io::Write> IoOutput<W> {
    /// Wrap an `io::Write` destination.
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    /// Unwrap the destination.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> Output for IoOutput<W> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.inner.write_all(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_writes_default_to_the_slice() {
        let mut out = StringOutput::new();
        out.write_range("hello world", 6..11).unwrap();
        assert_eq!(out.as_str(), "world");
    }

    #[test]
    fn provenance_sinks_can_observe_ranges() {
        struct Spans {
            text: String,
            ranges: Vec<Range<usize>>,
        }
        impl Output for Spans {
            fn write_str(&mut self, s: &str) -> fmt::Result {
                self.text.push_str(s);
                Ok(())
            }
            fn write_range(&mut self, src: &str, range: Range<usize>) -> fmt::Result {
                self.ranges.push(range.clone());
                self.write_str(&src[range])
            }
        }

        let mut out = Spans { text: String::new(), ranges: Vec::new() };
        out.write_range("abcdef", 1..3).unwrap();
        out.write_str("!").unwrap();
        assert_eq!(out.text, "bc!");
        assert_eq!(out.ranges, vec![1..3]);
    }
}
