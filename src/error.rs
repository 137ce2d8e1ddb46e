use miette::{Diagnostic, NamedSource, SourceSpan};
use std::fmt::{self, Display};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum DmmfError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Encoding(#[from] EncodingError),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("Failed to read schema source: {0}")]
    #[diagnostic(
        code(source::io),
        help("The schema source could not be read to completion.")
    )]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    #[diagnostic(code(serializer::json))]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    #[diagnostic(code(serializer::yaml))]
    Yaml(#[from] serde_yaml::Error),
}

/// Why a byte sequence was rejected as UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingErrorKind {
    /// A byte that can never start or continue a valid sequence.
    Invalid,
    /// The input ended in the middle of a multi-byte sequence.
    Truncated,
    /// A span did not fall on scalar value boundaries of its source.
    Misaligned,
}

impl Display for EncodingErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodingErrorKind::Invalid => write!(f, "Invalid UTF-8 sequence"),
            EncodingErrorKind::Truncated => write!(f, "Truncated UTF-8 sequence"),
            EncodingErrorKind::Misaligned => write!(f, "Span not aligned to UTF-8 boundaries"),
        }
    }
}

#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[error("{kind} at byte offset {offset}")]
#[diagnostic(
    code(source::invalid_utf8),
    help("Schema files must be valid UTF-8. Re-save the file as UTF-8 and make sure it was not truncated.")
)]
pub struct EncodingError {
    /// Byte offset of the first byte that could not be decoded.
    pub offset: usize,
    pub kind: EncodingErrorKind,
}

impl EncodingError {
    pub fn new(offset: usize, kind: EncodingErrorKind) -> Self {
        Self { offset, kind }
    }
}

impl From<std::str::Utf8Error> for EncodingError {
    fn from(err: std::str::Utf8Error) -> Self {
        let kind = match err.error_len() {
            Some(_) => EncodingErrorKind::Invalid,
            None => EncodingErrorKind::Truncated,
        };
        Self::new(err.valid_up_to(), kind)
    }
}

#[derive(Error, Debug, Diagnostic)]
#[error("Syntax error at {line}:{column}: expected {expected}, found {found}")]
#[diagnostic(
    code(parser::unexpected_token),
    help("The parser found a token it did not expect in this position.")
)]
pub struct SyntaxError {
    /// Byte offset of the offending token.
    pub position: usize,
    pub line: usize,
    pub column: usize,
    pub expected: String,
    pub found: String,
    #[source_code]
    pub src: NamedSource<String>,
    #[label("Expected {expected} here")]
    pub span: SourceSpan,
}
