//! Turns the `///` lines in front of a declaration into one owned string.
//!
//! Each line's span is decoded exactly once, as a whole, into its own buffer.
//! Lines are joined as decoded strings; raw byte ranges are never stitched
//! together and decoded again.

use crate::ast::DocComment;
use crate::error::EncodingError;
use crate::source::{SourceText, Span};
use log::trace;

const DOC_MARKER: &str = "///";

/// Decodes and merges the doc-comment lines given by `spans`.
///
/// Returns `Ok(None)` when there are no lines. Each line loses its `///`
/// marker and one following space; lines are joined with `\n`.
///
/// # Errors
/// Fails only if a span does not belong to `source`.
pub fn attach_docs(source: &SourceText, spans: &[Span]) -> Result<Option<DocComment>, EncodingError> {
    let (Some(first), Some(last)) = (spans.first(), spans.last()) else {
        return Ok(None);
    };

    let mut text = String::new();
    for (i, span) in spans.iter().enumerate() {
        let line = source.decode(*span)?;
        if i > 0 {
            text.push('\n');
        }
        text.push_str(normalize_line(&line));
    }

    let span = first.to(*last);
    trace!(
        "attached {} doc line(s) ({} bytes) from {}..{}",
        spans.len(),
        text.len(),
        span.start(),
        span.end()
    );

    Ok(Some(DocComment {
        text,
        span,
        line_count: spans.len(),
    }))
}

/// Drops the marker, at most one space after it and a CR left by CRLF line ends.
/// Everything else the author wrote is kept.
fn normalize_line(line: &str) -> &str {
    let content = line.strip_prefix(DOC_MARKER).unwrap_or(line);
    let content = content.strip_prefix(' ').unwrap_or(content);
    content.strip_suffix('\r').unwrap_or(content)
}
