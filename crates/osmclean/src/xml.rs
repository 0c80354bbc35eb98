//! XML model, parser and writer

pub mod encoding;
pub mod model;
pub mod parser;
pub mod writer;

pub use encoding::Encoding;
pub use model::{Content, Declaration, Document, Element};
pub use parser::{Config, Parser};
pub use writer::{serialize, to_bytes};

use crate::error::Result;

/// Parse a complete XML document from raw bytes in any supported encoding
pub fn parse(input: &[u8]) -> Result<Document> {
    let text = encoding::decode(input)?;
    Parser::new(&text).parse()
}

/// Parse a document that is already decoded text.
///
/// The declared encoding is only recorded for writing the document back.
pub fn parse_str(input: &str) -> Result<Document> {
    Parser::new(input.as_bytes()).parse()
}
