//! Validated schema source text and boundary-aligned byte spans.
//!
//! A `SourceText` can only be obtained through a constructor that checks the
//! whole buffer for UTF-8 well-formedness in one pass. Every `Span` handed out
//! by this crate starts and ends on a scalar value boundary of the source it
//! was produced from, so slicing never splits a multi-byte sequence.

use crate::error::{DmmfError, EncodingError, EncodingErrorKind};
use crate::utils::get_line_and_column;
use log::debug;
use miette::{NamedSource, SourceSpan};
use std::io::{ErrorKind, Read};
use std::ops::Range;

/// Read buffer size used by [`SourceReader`] unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 8192;

#[cfg(test)]
thread_local! {
    /// Calls to [`SourceText::decode`] made on this thread.
    pub(crate) static DECODE_CALLS: std::cell::Cell<usize> = const { std::cell::Cell::new(0) };
}

/// A half-open byte range `[start, end)` into a [`SourceText`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Only the lexer and `SourceText::span` create spans; both guarantee alignment.
    pub(crate) fn new(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self { start, end }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// The smallest span covering both `self` and `other`.
    #[must_use]
    pub fn to(&self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        (span.start, span.len()).into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
}

/// The complete, validated text of one schema file.
#[derive(Debug, Clone)]
pub struct SourceText {
    name: String,
    text: String,
    encoding: Encoding,
}

impl SourceText {
    /// Wraps text that is already known to be valid UTF-8.
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            encoding: Encoding::Utf8,
        }
    }

    /// Validates `bytes` as a whole and takes ownership of them.
    ///
    /// # Errors
    /// Returns an `EncodingError` pointing at the first byte that is not part of a
    /// complete, well-formed UTF-8 sequence. Nothing is ever replaced.
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, EncodingError> {
        match String::from_utf8(bytes) {
            Ok(text) => Ok(Self::new(name, text)),
            Err(err) => Err(err.utf8_error().into()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Builds a span, or `None` if either end is out of range or inside a multi-byte sequence.
    pub fn span(&self, start: usize, end: usize) -> Option<Span> {
        let aligned = start <= end
            && end <= self.text.len()
            && self.text.is_char_boundary(start)
            && self.text.is_char_boundary(end);
        aligned.then(|| Span::new(start, end))
    }

    pub fn full_span(&self) -> Span {
        Span::new(0, self.text.len())
    }

    /// Borrows the text covered by `span`. Never panics.
    pub fn slice(&self, span: Span) -> Option<&str> {
        self.text.get(span.range())
    }

    /// Materializes the text covered by `span` into a new, call-local `String`.
    ///
    /// # Errors
    /// Fails with `EncodingErrorKind::Misaligned` if the span does not belong to this source.
    pub fn decode(&self, span: Span) -> Result<String, EncodingError> {
        #[cfg(test)]
        DECODE_CALLS.with(|calls| calls.set(calls.get() + 1));
        self.slice(span)
            .map(str::to_owned)
            .ok_or_else(|| EncodingError::new(span.start(), EncodingErrorKind::Misaligned))
    }

    pub fn line_and_column(&self, position: usize) -> (usize, usize) {
        get_line_and_column(&self.text, position)
    }

    /// A copy of the text for attaching to diagnostics.
    pub fn to_named_source(&self) -> NamedSource<String> {
        NamedSource::new(self.name.clone(), self.text.clone())
    }
}

/// Reads a schema from any byte stream.
///
/// Bytes are appended to one buffer owned by this call; read boundaries are never
/// decoded on their own. Validation runs once, after the stream is exhausted.
pub struct SourceReader<R> {
    inner: R,
    chunk_size: usize,
}

impl<R: Read> SourceReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Drains the reader and validates the collected bytes.
    ///
    /// # Errors
    /// Returns `DmmfError::Io` if the reader fails and `DmmfError::Encoding` if the
    /// collected bytes are not valid UTF-8.
    pub fn read_source(mut self, name: impl Into<String>) -> Result<SourceText, DmmfError> {
        let mut buffer = Vec::new();
        let mut chunk = vec![0u8; self.chunk_size];
        let mut reads = 0usize;
        loop {
            let read = match self.inner.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(err.into()),
            };
            buffer.extend_from_slice(&chunk[..read]);
            reads += 1;
        }
        debug!(
            "read {} bytes in {} chunks of at most {} bytes",
            buffer.len(),
            reads,
            self.chunk_size
        );
        Ok(SourceText::from_bytes(name, buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_from_bytes_accepts_multibyte_text() {
        let source = SourceText::from_bytes("a.prisma", "最終更新者 🦀".as_bytes().to_vec()).unwrap();
        assert_eq!(source.as_str(), "最終更新者 🦀");
        assert_eq!(source.encoding(), Encoding::Utf8);
    }

    #[test]
    fn test_truncated_sequence_reports_offset() {
        let mut bytes = b"model A {}\n".to_vec();
        bytes.extend_from_slice(&[0xE8, 0x80]);
        let err = SourceText::from_bytes("a.prisma", bytes).unwrap_err();
        assert_eq!(err.offset, 11);
        assert_eq!(err.kind, EncodingErrorKind::Truncated);
    }

    #[test]
    fn test_invalid_byte_reports_offset() {
        let bytes = vec![b'a', b'b', 0xFF, b'c'];
        let err = SourceText::from_bytes("a.prisma", bytes).unwrap_err();
        assert_eq!(err.offset, 2);
        assert_eq!(err.kind, EncodingErrorKind::Invalid);
    }

    #[test]
    fn test_span_rejects_misaligned_offsets() {
        let source = SourceText::new("a.prisma", "x承y");
        assert!(source.span(0, 4).is_some());
        assert!(source.span(1, 2).is_none());
        assert!(source.span(0, 3).is_none());
        assert!(source.span(3, 1).is_none());
        assert!(source.span(0, 99).is_none());
    }

    #[test]
    fn test_decode_foreign_span_is_an_error() {
        let long = SourceText::new("long.prisma", "承認日時");
        let short = SourceText::new("short.prisma", "ab");
        let span = long.span(3, 6).unwrap();
        let err = short.decode(span).unwrap_err();
        assert_eq!(err.kind, EncodingErrorKind::Misaligned);
    }

    #[test]
    fn test_reader_with_tiny_chunks_matches_single_shot() {
        let text = "/// 承認日時\nmodel A {}\n";
        for chunk_size in [1, 2, 3, 5, 4096] {
            let source = SourceReader::new(Cursor::new(text.as_bytes()))
                .with_chunk_size(chunk_size)
                .read_source("a.prisma")
                .unwrap();
            assert_eq!(source.as_str(), text);
        }
    }

    #[test]
    fn test_reader_reports_absolute_offset() {
        let mut bytes = "承".repeat(10).into_bytes();
        bytes.push(0xE8);
        let err = SourceReader::new(Cursor::new(bytes))
            .with_chunk_size(4)
            .read_source("a.prisma")
            .unwrap_err();
        match err {
            DmmfError::Encoding(e) => {
                assert_eq!(e.offset, 30);
                assert_eq!(e.kind, EncodingErrorKind::Truncated);
            }
            other => panic!("expected an encoding error, got {other:?}"),
        }
    }
}
