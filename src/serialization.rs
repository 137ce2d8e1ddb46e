use crate::config::OutputFormat;
use crate::dmmf::DmmfDocument;
use crate::error::DmmfError;
use log::debug;
use std::io::Write;

/// Renders the document as compact JSON.
///
/// Strings are written one scalar value at a time: `"`, `\` and control
/// characters are escaped, every other character is emitted as-is.
///
/// # Errors
/// Returns a `DmmfError::Json` if serialization fails.
pub fn to_json(document: &DmmfDocument) -> Result<String, DmmfError> {
    Ok(serde_json::to_string(document)?)
}

/// Renders the document as pretty-printed JSON.
///
/// # Errors
/// Returns a `DmmfError::Json` if serialization fails.
pub fn to_json_pretty(document: &DmmfDocument) -> Result<String, DmmfError> {
    Ok(serde_json::to_string_pretty(document)?)
}

/// Renders the document as YAML.
///
/// # Errors
/// Returns a `DmmfError::Yaml` if serialization fails.
pub fn to_yaml(document: &DmmfDocument) -> Result<String, DmmfError> {
    Ok(serde_yaml::to_string(document)?)
}

pub fn render(document: &DmmfDocument, format: OutputFormat) -> Result<String, DmmfError> {
    let output = match format {
        OutputFormat::Json => to_json(document)?,
        OutputFormat::JsonPretty => to_json_pretty(document)?,
        OutputFormat::Yaml => to_yaml(document)?,
    };
    debug!("rendered {} bytes as {:?}", output.len(), format);
    Ok(output)
}

/// Writes already-rendered output in pieces of roughly `chunk_size` bytes.
///
/// Bytes are passed through verbatim; see [`OutputChunks::for_format`] for where
/// pieces may end. Returns the number of bytes written.
///
/// # Errors
/// Returns `DmmfError::Io` if the writer fails.
pub fn write_chunked<W: Write>(
    output: &str,
    format: OutputFormat,
    writer: &mut W,
    chunk_size: usize,
) -> Result<usize, DmmfError> {
    let mut written = 0;
    let mut chunks = 0;
    for chunk in OutputChunks::for_format(output, chunk_size, format) {
        writer.write_all(chunk.as_bytes())?;
        written += chunk.len();
        chunks += 1;
    }
    writer.flush()?;
    debug!("wrote {written} bytes in {chunks} chunks");
    Ok(written)
}

/// Where the scanner stands relative to JSON string escapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EscapeState {
    Outside,
    InString,
    /// Just read a `\`.
    Escape,
    /// Inside `\uXXXX`, with this many hex digits left.
    Unicode(u8),
}

impl EscapeState {
    fn at_boundary(self) -> bool {
        matches!(self, EscapeState::Outside | EscapeState::InString)
    }

    fn advance(self, c: char) -> Self {
        match (self, c) {
            (EscapeState::Outside, '"') => EscapeState::InString,
            (EscapeState::Outside, _) => EscapeState::Outside,
            (EscapeState::InString, '\\') => EscapeState::Escape,
            (EscapeState::InString, '"') => EscapeState::Outside,
            (EscapeState::InString, _) => EscapeState::InString,
            (EscapeState::Escape, 'u') => EscapeState::Unicode(4),
            (EscapeState::Escape, _) => EscapeState::InString,
            (EscapeState::Unicode(n), _) if n <= 1 => EscapeState::InString,
            (EscapeState::Unicode(n), _) => EscapeState::Unicode(n - 1),
        }
    }
}

/// Where a piece may end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CutRule {
    /// Between characters, outside JSON escapes.
    JsonTokens,
    /// Only after a line break.
    LineEnds,
}

/// Splits rendered output into `&str` pieces for chunked I/O.
///
/// A JSON piece never ends inside a multi-byte character or inside an escape
/// sequence such as `\n` or `\u001b`. A YAML piece only ends after a `\n`.
/// Pieces are at most `max_len` bytes unless the smallest unit is longer, in
/// which case the piece is extended to the end of it.
pub struct OutputChunks<'a> {
    text: &'a str,
    position: usize,
    max_len: usize,
    rule: CutRule,
    state: EscapeState,
}

impl<'a> OutputChunks<'a> {
    /// Chunks rendered JSON, compact or pretty.
    pub fn new(text: &'a str, max_len: usize) -> Self {
        Self {
            text,
            position: 0,
            max_len: max_len.max(1),
            rule: CutRule::JsonTokens,
            state: EscapeState::Outside,
        }
    }

    /// Chunks text that may only be cut at line ends.
    pub fn lines(text: &'a str, max_len: usize) -> Self {
        Self {
            rule: CutRule::LineEnds,
            ..Self::new(text, max_len)
        }
    }

    pub fn for_format(text: &'a str, max_len: usize, format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json | OutputFormat::JsonPretty => Self::new(text, max_len),
            OutputFormat::Yaml => Self::lines(text, max_len),
        }
    }

    fn can_cut(&self, state: EscapeState, after_newline: bool) -> bool {
        match self.rule {
            CutRule::JsonTokens => state.at_boundary(),
            CutRule::LineEnds => after_newline,
        }
    }
}

impl<'a> Iterator for OutputChunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.text.get(self.position..)?;
        if rest.is_empty() {
            return None;
        }

        let mut state = self.state;
        let mut after_newline = false;
        let mut cut: Option<(usize, EscapeState)> = None;
        let mut past_limit = false;
        for (i, c) in rest.char_indices() {
            if i > 0 && self.can_cut(state, after_newline) {
                if i <= self.max_len {
                    cut = Some((i, state));
                } else {
                    if cut.is_none() {
                        cut = Some((i, state));
                    }
                    past_limit = true;
                    break;
                }
            }
            state = state.advance(c);
            after_newline = c == '\n';
        }

        let (len, next_state) = match cut {
            Some(found) if past_limit || rest.len() > self.max_len => found,
            _ => (rest.len(), state),
        };
        self.position += len;
        self.state = next_state;
        rest.get(..len)
    }
}
