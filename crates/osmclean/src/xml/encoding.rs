//! Character encodings of source documents
//!
//! The parser works on UTF-8 only. Documents declaring another encoding are
//! transcoded to UTF-8 by [`decode`] before parsing, and the serialized output
//! is converted back with [`Encoding::encode`] so the written file matches the
//! encoding its declaration names.

use std::borrow::Cow;

use crate::error::{Error, ErrorKind, Result};
use crate::xml::parser::Parser;

/// Encoding of the source document, reused when writing it back
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Encoding {
    #[default]
    Utf8,
    /// Strict 7-bit US-ASCII; bytes above 0x7F are rejected
    Ascii,
    /// Any other encoding known to `encoding_rs`
    Other(&'static encoding_rs::Encoding),
}

impl Encoding {
    /// Resolve a declared encoding label, case-insensitively.
    ///
    /// `us-ascii` is kept strict here instead of following the WHATWG mapping
    /// to windows-1252.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "us-ascii" | "ascii" => Some(Self::Ascii),
            _ => match encoding_rs::Encoding::for_label(label.as_bytes())? {
                e if e == encoding_rs::UTF_8 => Some(Self::Utf8),
                e if e == encoding_rs::REPLACEMENT => None,
                e => Some(Self::Other(e)),
            },
        }
    }

    /// Canonical name of the encoding
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Ascii => "US-ASCII",
            Self::Other(encoding) => encoding.name(),
        }
    }

    /// Convert serialized UTF-8 text into this encoding.
    ///
    /// Characters the target encoding cannot represent are written as `&#N;`
    /// character references. US-ASCII text must already be free of non-ASCII
    /// characters, which the writer ensures for text and attribute values.
    pub fn encode(self, text: &str) -> Result<Vec<u8>> {
        match self {
            Self::Utf8 => Ok(text.as_bytes().to_vec()),
            Self::Ascii => match text.chars().find(|ch| !ch.is_ascii()) {
                None => Ok(text.as_bytes().to_vec()),
                Some(ch) => Err(Error::detached(
                    ErrorKind::Unencodable {
                        encoding: self.name().to_string(),
                    },
                    format!("cannot write {ch:?} as {}", self.name()),
                )),
            },
            Self::Other(encoding) if encoding == encoding_rs::UTF_16LE => {
                Ok(encode_utf16(text, u16::to_le_bytes))
            }
            Self::Other(encoding) if encoding == encoding_rs::UTF_16BE => {
                Ok(encode_utf16(text, u16::to_be_bytes))
            }
            Self::Other(encoding) => {
                let (bytes, _, _) = encoding.encode(text);
                Ok(bytes.into_owned())
            }
        }
    }
}

/// Transcode raw document bytes to UTF-8 according to their byte order mark
/// or, failing that, the encoding named in the XML declaration.
///
/// UTF-8 and US-ASCII input is returned as is; the parser validates it.
pub fn decode(input: &[u8]) -> Result<Cow<'_, [u8]>> {
    if let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(input) {
        return transcode(encoding, input.get(bom_len..).unwrap_or_default());
    }

    match Parser::new(input).read_declaration()?.encoding {
        Encoding::Utf8 | Encoding::Ascii => Ok(Cow::Borrowed(input)),
        Encoding::Other(encoding) => transcode(encoding, input),
    }
}

fn transcode<'a>(encoding: &'static encoding_rs::Encoding, bytes: &'a [u8]) -> Result<Cow<'a, [u8]>> {
    if encoding == encoding_rs::UTF_8 {
        return Ok(Cow::Borrowed(bytes));
    }

    match encoding.decode_without_bom_handling_and_without_replacement(bytes) {
        Some(text) => Ok(Cow::Owned(text.into_owned().into_bytes())),
        None => Err(Error::detached(
            ErrorKind::MalformedEncoding {
                encoding: encoding.name().to_string(),
            },
            format!("input is not valid {}", encoding.name()),
        )),
    }
}

fn encode_utf16(text: &str, to_bytes: fn(u16) -> [u8; 2]) -> Vec<u8> {
    let mut out = Vec::with_capacity(2 + text.len() * 2);
    out.extend_from_slice(&to_bytes(0xFEFF));
    for unit in text.encode_utf16() {
        out.extend_from_slice(&to_bytes(unit));
    }
    out
}
