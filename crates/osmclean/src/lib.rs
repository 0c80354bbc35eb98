//! osmclean - drop OSM nodes carrying marker tags
//!
//! Loads an OpenStreetMap XML document, selects `/osm/node/tag[@k="<key>"]`
//! elements, removes every node whose tag value satisfies a [`Rule`] and
//! writes the pretty-printed result.
//!
//! # Quick Start
//!
//! ```
//! use osmclean::{clean_str, Preset};
//! # fn main() -> Result<(), osmclean::Error> {
//! let input = r#"<osm>
//!   <node id="1"><tag k="fixme" v="streamdeck-osmapper #42"/></node>
//!   <node id="2"><tag k="fixme" v="survey again"/></node>
//! </osm>"#;
//! let (output, report) = clean_str(input, &Preset::Fixme.rule()?)?;
//! assert_eq!(report.removed, 1);
//! assert!(output.starts_with("<?xml"));
//! assert!(!output.contains("id=\"1\""));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, ErrorKind, Pos, Result, Span};

mod cursor;

pub mod xml;
pub use xml::{
    Content as XmlContent, Document as XmlDocument, Element as XmlElement, Encoding,
    Parser as XmlParser,
};

pub mod select;
pub use select::{AttributeTest, Match, Selector};

pub mod rule;
pub use rule::{Preset, Rule, ValueMatcher, FIXME_PREFIX, NAME_PATTERN};

pub mod clean;
pub use clean::{
    clean, clean_bytes, clean_file, clean_str, output_path, CleanOutcome, CleanReport,
    OUTPUT_SUFFIX,
};

/// Parse XML from string
pub fn from_xml_str(s: &str) -> Result<XmlDocument> {
    xml::parse_str(s)
}

/// Parse XML from bytes, decoding them per BOM or declaration
pub fn from_xml_bytes(bytes: &[u8]) -> Result<XmlDocument> {
    xml::parse(bytes)
}

/// Serialize a document with declaration and indentation
pub fn to_xml_string(doc: &XmlDocument) -> String {
    xml::serialize(doc)
}

/// Serialize a document and encode it as its declaration says
pub fn to_xml_bytes(doc: &XmlDocument) -> Result<Vec<u8>> {
    xml::to_bytes(doc)
}
