//! Document ingestion: text extraction, normalisation and chunking

mod chunker;
mod normalizer;
mod parser;

pub use chunker::TextChunker;
pub use normalizer::{normalize_file, parse_metadata, try_parse_metadata, MetadataParseError};
pub use parser::{FileKind, FileParser, FileUpload, TextExtractor};
