//! Options for one run of the schema-to-DMMF pipeline.
//!
//! Options are plain values owned by the caller and copied into each run; nothing
//! here is global, so concurrent runs with different options never interfere.

use crate::source::DEFAULT_CHUNK_SIZE;

/// How the rendered document is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    Json,
    #[default]
    JsonPretty,
    Yaml,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Name used for the source in diagnostics.
    pub file_name: String,
    pub output: OutputFormat,
    /// Size of each read when the schema comes from a reader.
    pub read_chunk_size: usize,
    /// If set, rendered output is written in pieces of about this many bytes.
    pub write_chunk_size: Option<usize>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            file_name: "schema.prisma".to_string(),
            output: OutputFormat::default(),
            read_chunk_size: DEFAULT_CHUNK_SIZE,
            write_chunk_size: None,
        }
    }
}

impl GenerateOptions {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = output;
        self
    }

    #[must_use]
    pub fn with_read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size.max(1);
        self
    }

    #[must_use]
    pub fn with_write_chunk_size(mut self, size: usize) -> Self {
        self.write_chunk_size = Some(size.max(1));
        self
    }
}
