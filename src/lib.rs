pub mod api;
pub mod ast;
pub mod config;
pub mod dmmf;
pub mod docs;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod serialization;
pub mod source;
pub mod utils;

pub use api::{
    generate, generate_from_bytes, generate_from_reader, generate_with_options, GenerationResult,
};
pub use config::{GenerateOptions, OutputFormat};
pub use dmmf::DmmfDocument;
pub use error::DmmfError;
pub use source::{SourceText, Span};
