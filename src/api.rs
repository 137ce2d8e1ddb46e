use crate::ast::{Schema, SchemaElement};
use crate::config::GenerateOptions;
use crate::dmmf::{build_dmmf, DmmfDocument};
use crate::error::DmmfError;
use crate::parser::parse_schema;
use crate::serialization::{self, render, write_chunked};
use crate::source::{SourceReader, SourceText};
use log::debug;
use serde::{Serialize, Serializer};
use std::io::{Read, Write};

/// The result of running a schema through the pipeline.
///
/// Holds the parsed schema and the DMMF document derived from it. Both are
/// owned by this value alone; nothing is shared with other runs.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub schema: Schema,
    pub document: DmmfDocument,
    options: GenerateOptions,
}

impl Serialize for GenerationResult {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.document.serialize(serializer)
    }
}

impl GenerationResult {
    /// Serializes the document into a pretty-printed JSON string.
    ///
    /// # Errors
    /// Returns a `DmmfError::Json` if serialization fails.
    pub fn to_json(&self) -> Result<String, DmmfError> {
        serialization::to_json_pretty(&self.document)
    }

    /// Serializes the document into a compact JSON string.
    ///
    /// # Errors
    /// Returns a `DmmfError::Json` if serialization fails.
    pub fn to_json_compact(&self) -> Result<String, DmmfError> {
        serialization::to_json(&self.document)
    }

    /// Serializes the document into a YAML string.
    ///
    /// # Errors
    /// Returns a `DmmfError::Yaml` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, DmmfError> {
        serialization::to_yaml(&self.document)
    }

    /// Renders the document in the configured output format.
    pub fn render(&self) -> Result<String, DmmfError> {
        render(&self.document, self.options.output)
    }

    /// Renders once and writes the bytes verbatim, chunked if configured.
    /// Returns the number of bytes written.
    ///
    /// # Errors
    /// Returns a `DmmfError` if rendering or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize, DmmfError> {
        let output = self.render()?;
        match self.options.write_chunk_size {
            Some(chunk_size) => write_chunked(&output, self.options.output, writer, chunk_size),
            None => {
                writer.write_all(output.as_bytes())?;
                writer.flush()?;
                Ok(output.len())
            }
        }
    }

    /// Models, fields, enums, enum values and attributes in source order.
    #[must_use]
    pub fn elements(&self) -> Vec<SchemaElement<'_>> {
        self.schema.elements()
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }
}

/// Parses a schema and builds its DMMF document.
///
/// This is the primary entry point. It returns a `GenerationResult` on success,
/// which contains the parsed schema and the document, and provides methods
/// for serialization.
///
/// # Arguments
///
/// * `source` - The schema source code as a string.
/// * `file_name` - The name of the file being processed (used for error reporting).
///
/// # Errors
///
/// Returns a `DmmfError` if the schema does not parse.
pub fn generate(source: &str, file_name: &str) -> Result<GenerationResult, DmmfError> {
    generate_with_options(source, GenerateOptions::new(file_name))
}

/// Like [`generate`], with explicit options.
pub fn generate_with_options(
    source: &str,
    options: GenerateOptions,
) -> Result<GenerationResult, DmmfError> {
    let source = SourceText::new(options.file_name.clone(), source);
    run(&source, options)
}

/// Validates raw bytes as UTF-8 in one pass, then runs the pipeline.
///
/// # Errors
///
/// Returns `DmmfError::Encoding` if the bytes are not valid UTF-8, or any parse error.
pub fn generate_from_bytes(
    bytes: Vec<u8>,
    options: GenerateOptions,
) -> Result<GenerationResult, DmmfError> {
    let source = SourceText::from_bytes(options.file_name.clone(), bytes)?;
    run(&source, options)
}

/// Reads the whole stream, validates it, then runs the pipeline.
///
/// # Errors
///
/// Returns `DmmfError::Io` if reading fails, otherwise as [`generate_from_bytes`].
pub fn generate_from_reader<R: Read>(
    reader: R,
    options: GenerateOptions,
) -> Result<GenerationResult, DmmfError> {
    let source = SourceReader::new(reader)
        .with_chunk_size(options.read_chunk_size)
        .read_source(options.file_name.clone())?;
    run(&source, options)
}

fn run(source: &SourceText, options: GenerateOptions) -> Result<GenerationResult, DmmfError> {
    debug!("generating DMMF for {} ({} bytes)", source.name(), source.len());
    let schema = parse_schema(source)?;
    let document = build_dmmf(&schema);
    Ok(GenerationResult {
        schema,
        document,
        options,
    })
}
