//! XML parser implementation

use indexmap::IndexMap;

use crate::cursor::Cursor;
use crate::error::{Error, ErrorKind, Pos, Result, Span};
use crate::xml::encoding::Encoding;
use crate::xml::model::{Content, Declaration, Document, Element};

const BOM: &[u8] = b"\xEF\xBB\xBF";

/// Parser configuration
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Maximum element nesting depth, the root counting as 1 (0 means unlimited)
    pub max_depth: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

impl Config {
    /// Create config with no nesting limit
    pub const fn unlimited() -> Self {
        Self { max_depth: 0 }
    }

    /// Create config with custom nesting limit
    pub const fn new(max_depth: u16) -> Self {
        Self { max_depth }
    }
}

/// XML parser over UTF-8 input.
///
/// Use [`crate::xml::parse`] for raw bytes in other encodings; it transcodes
/// them before handing them to the parser.
#[derive(Debug)]
pub struct Parser<'a> {
    cursor: Cursor<'a>,
    config: Config,
    depth: u16,
}

impl<'a> Parser<'a> {
    /// Create a new XML parser with default config
    pub fn new(input: &'a [u8]) -> Self {
        Self::with_config(input, Config::default())
    }

    /// Create a new XML parser with custom config
    pub fn with_config(input: &'a [u8], config: Config) -> Self {
        let input = input.strip_prefix(BOM).unwrap_or(input);
        Self {
            cursor: Cursor::new(input),
            config,
            depth: 0,
        }
    }

    /// Parse an XML document
    pub fn parse(&mut self) -> Result<Document> {
        let declaration = self.read_declaration()?;
        if declaration.encoding == Encoding::Ascii {
            self.ensure_ascii()?;
        }

        self.skip_misc(true)?;
        if self.cursor.is_eof() {
            return Err(Error::at(ErrorKind::MissingRoot, self.cursor.position()));
        }
        self.increment_depth()?;
        let root = self.parse_element()?;
        self.decrement_depth();
        self.skip_misc(false)?;

        if !self.cursor.is_eof() {
            return Err(self.error_here(ErrorKind::InvalidToken, "content after root element"));
        }

        Ok(Document { declaration, root })
    }

    /// Parse the XML declaration if the input opens with one
    pub(crate) fn read_declaration(&mut self) -> Result<Declaration> {
        if self.cursor.starts_with(b"<?xml") && self.cursor.peek(5).is_some_and(is_whitespace) {
            self.parse_declaration()
        } else {
            Ok(Declaration::default())
        }
    }

    /// Reject any byte outside 7-bit ASCII in the rest of the input
    fn ensure_ascii(&self) -> Result<()> {
        let mut scan = self.cursor.clone();
        while let Some(b) = scan.current() {
            if !b.is_ascii() {
                return Err(Error::with_message(
                    ErrorKind::MalformedEncoding {
                        encoding: Encoding::Ascii.name().to_string(),
                    },
                    Span::at(scan.position()),
                    format!("byte 0x{b:02X} in a US-ASCII document"),
                ));
            }
            scan.advance();
        }
        Ok(())
    }

    fn increment_depth(&mut self) -> Result<()> {
        if self.config.max_depth > 0 && self.depth >= self.config.max_depth {
            return Err(Error::at(
                ErrorKind::MaxDepthExceeded {
                    max: self.config.max_depth,
                },
                self.cursor.position(),
            ));
        }
        self.depth = self.depth.saturating_add(1);
        Ok(())
    }

    fn decrement_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    fn parse_declaration(&mut self) -> Result<Declaration> {
        let start = self.cursor.position();
        self.cursor.advance_by(5);

        let mut pseudo = IndexMap::new();
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"?>") {
                self.cursor.advance_by(2);
                break;
            }
            if self.cursor.is_eof() {
                return Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position()));
            }
            let (name, value) = self.parse_attribute()?;
            pseudo.insert(name, value);
        }

        let version = pseudo.shift_remove("version").ok_or_else(|| {
            self.error_at(ErrorKind::InvalidToken, start, "declaration without version")
        })?;

        let encoding_label = pseudo.shift_remove("encoding");
        let encoding = match encoding_label.as_deref() {
            None => Encoding::Utf8,
            Some(label) => Encoding::from_label(label).ok_or_else(|| {
                Error::at(
                    ErrorKind::UnsupportedEncoding {
                        encoding: label.to_string(),
                    },
                    start,
                )
            })?,
        };

        let standalone = match pseudo.shift_remove("standalone").as_deref() {
            None => None,
            Some("yes") => Some(true),
            Some("no") => Some(false),
            Some(_) => {
                return Err(self.error_at(
                    ErrorKind::InvalidToken,
                    start,
                    "invalid standalone value",
                ));
            }
        };

        Ok(Declaration {
            version,
            encoding_label,
            encoding,
            standalone,
        })
    }

    /// Skip whitespace, comments and processing instructions around the root.
    /// A DOCTYPE is only allowed before it.
    fn skip_misc(&mut self, before_root: bool) -> Result<()> {
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.starts_with(b"<!--") {
                self.parse_comment()?;
            } else if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
            } else if before_root && self.cursor.starts_with(b"<!DOCTYPE") {
                self.skip_doctype()?;
            } else {
                return Ok(());
            }
        }
    }

    fn parse_element(&mut self) -> Result<Element> {
        self.expect_byte(b'<')?;

        if self.cursor.current() == Some(b'/') {
            return Err(self.error_here(ErrorKind::InvalidToken, "unexpected closing tag"));
        }

        let name = self.parse_name()?;
        let attributes = self.parse_attributes()?;

        if self.cursor.consume(b'/') {
            self.expect_byte(b'>')?;
            return Ok(Element {
                name,
                attributes,
                children: Vec::new(),
            });
        }

        self.expect_byte(b'>')?;

        let mut children = Vec::new();
        loop {
            if self.cursor.is_eof() {
                return Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated element"));
            }

            if self.cursor.starts_with(b"</") {
                let close_pos = self.cursor.position();
                self.cursor.advance_by(2);
                let close_name = self.parse_name()?;
                if close_name != name {
                    return Err(Error::at(
                        ErrorKind::MismatchedTag {
                            expected: name,
                            found: close_name,
                        },
                        close_pos,
                    ));
                }
                self.cursor.skip_whitespace();
                self.expect_byte(b'>')?;
                break;
            }

            if self.cursor.starts_with(b"<!--") {
                children.push(Content::Comment(self.parse_comment()?));
                continue;
            }

            if self.cursor.starts_with(b"<![CDATA[") {
                children.push(Content::CData(self.parse_cdata()?));
                continue;
            }

            if self.cursor.starts_with(b"<?") {
                self.skip_processing_instruction()?;
                continue;
            }

            if self.cursor.current() == Some(b'<') {
                self.increment_depth()?;
                let child = self.parse_element()?;
                self.decrement_depth();
                children.push(Content::Element(child));
                continue;
            }

            if let Some(text) = self.parse_text()? {
                children.push(Content::Text(text));
            }
        }

        Ok(Element {
            name,
            attributes,
            children,
        })
    }

    fn parse_attributes(&mut self) -> Result<IndexMap<String, String>> {
        let mut attrs = IndexMap::new();

        loop {
            let had_space = self.cursor.current().is_some_and(is_whitespace);
            self.cursor.skip_whitespace();
            match self.cursor.current() {
                Some(b'/') | Some(b'>') => break,
                Some(_) if !had_space => {
                    return Err(self.error_here(
                        ErrorKind::InvalidToken,
                        "expected whitespace before attribute",
                    ));
                }
                Some(_) => {}
                None => return Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position())),
            }

            let pos = self.cursor.position();
            let (name, value) = self.parse_attribute()?;

            if attrs.contains_key(&name) {
                return Err(Error::at(ErrorKind::DuplicateAttribute { name }, pos));
            }
            attrs.insert(name, value);
        }

        Ok(attrs)
    }

    fn parse_attribute(&mut self) -> Result<(String, String)> {
        let name = self.parse_name()?;
        self.cursor.skip_whitespace();
        self.expect_byte(b'=')?;
        self.cursor.skip_whitespace();
        let value = self.parse_attribute_value()?;
        Ok((name, value))
    }

    fn parse_attribute_value(&mut self) -> Result<String> {
        let quote = match self.cursor.current() {
            Some(b'"') => b'"',
            Some(b'\'') => b'\'',
            _ => {
                return Err(
                    self.error_here(ErrorKind::InvalidToken, "expected quoted attribute value")
                );
            }
        };
        self.cursor.advance();

        let start_pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == quote {
                let raw = self.cursor.slice_from(start);
                self.cursor.advance();
                let text = bytes_to_str(raw, start_pos)?;
                return decode_entities(text, start_pos);
            }
            if b == b'<' {
                return Err(self.error_here(ErrorKind::InvalidToken, "'<' in attribute value"));
            }
            self.cursor.advance();
        }

        Err(self.error_here(ErrorKind::UnexpectedEof, "unterminated attribute value"))
    }

    fn parse_text(&mut self) -> Result<Option<String>> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();
        while let Some(b) = self.cursor.current() {
            if b == b'<' {
                break;
            }
            self.cursor.advance();
        }

        let raw = self.cursor.slice_from(start);
        let text = decode_entities(bytes_to_str(raw, start_pos)?, start_pos)?;

        if text.trim().is_empty() {
            Ok(None)
        } else {
            Ok(Some(text))
        }
    }

    fn parse_comment(&mut self) -> Result<String> {
        // cursor at "<!--"
        let start_pos = self.cursor.position();
        self.cursor.advance_by(4);
        let body = self.take_until(b"-->")?;
        bytes_to_str(body, start_pos).map(str::to_string)
    }

    fn parse_cdata(&mut self) -> Result<String> {
        // cursor at "<![CDATA["
        let start_pos = self.cursor.position();
        self.cursor.advance_by(9);
        let body = self.take_until(b"]]>")?;
        bytes_to_str(body, start_pos).map(str::to_string)
    }

    fn parse_name(&mut self) -> Result<String> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();

        let Some(first) = self.cursor.current() else {
            return Err(Error::at(ErrorKind::UnexpectedEof, start_pos));
        };
        if !is_name_start(first) {
            return Err(Error::with_message(
                ErrorKind::InvalidToken,
                Span::at(start_pos),
                "expected name",
            ));
        }

        self.cursor.advance();
        while let Some(b) = self.cursor.current() {
            if is_name_char(b) {
                self.cursor.advance();
            } else {
                break;
            }
        }

        let raw = self.cursor.slice_from(start);
        bytes_to_str(raw, start_pos).map(str::to_string)
    }

    fn skip_processing_instruction(&mut self) -> Result<()> {
        // cursor at "<?"
        self.cursor.advance_by(2);
        self.take_until(b"?>").map(|_| ())
    }

    fn skip_doctype(&mut self) -> Result<()> {
        // cursor at "<!DOCTYPE"; an internal subset may contain '>'
        let start_pos = self.cursor.position();
        let mut depth = 0usize;
        let mut quote = None;
        while let Some(b) = self.cursor.current() {
            self.cursor.advance();
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => depth += 1,
                (None, b']') => depth = depth.saturating_sub(1),
                (None, b'>') if depth == 0 => return Ok(()),
                _ => {}
            }
        }
        Err(self.error_at(ErrorKind::UnexpectedEof, start_pos, "unterminated doctype"))
    }

    /// Consume input up to and including `pattern`, returning what came before it
    fn take_until(&mut self, pattern: &[u8]) -> Result<&'a [u8]> {
        let start_pos = self.cursor.position();
        let start = self.cursor.pos();
        while !self.cursor.is_eof() {
            if self.cursor.starts_with(pattern) {
                let body = self.cursor.slice_from(start);
                self.cursor.advance_by(pattern.len());
                return Ok(body);
            }
            self.cursor.advance();
        }
        Err(self.error_at(ErrorKind::UnexpectedEof, start_pos, "unterminated markup"))
    }

    fn expect_byte(&mut self, expected: u8) -> Result<()> {
        if self.cursor.consume(expected) {
            Ok(())
        } else if self.cursor.is_eof() {
            Err(Error::at(ErrorKind::UnexpectedEof, self.cursor.position()))
        } else {
            Err(self.error_here(
                ErrorKind::InvalidToken,
                &format!("expected '{}'", char::from(expected)),
            ))
        }
    }

    fn error_here(&self, kind: ErrorKind, message: &str) -> Error {
        self.error_at(kind, self.cursor.position(), message)
    }

    fn error_at(&self, kind: ErrorKind, pos: Pos, message: &str) -> Error {
        Error::with_message(kind, Span::new(pos, self.cursor.position()), message)
    }
}

fn bytes_to_str(bytes: &[u8], pos: Pos) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|_| Error::at(ErrorKind::InvalidUtf8, pos))
}

fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}

fn is_name_start(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'_' | b':') || b >= 0x80
}

fn is_name_char(b: u8) -> bool {
    is_name_start(b) || matches!(b, b'0'..=b'9' | b'-' | b'.')
}

fn decode_entities(input: &str, pos: Pos) -> Result<String> {
    if !input.contains('&') {
        return Ok(input.to_string());
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        let (before, after) = rest.split_at(amp);
        result.push_str(before);

        let after = after.get(1..).unwrap_or_default();
        let Some(semi) = after.find(';') else {
            return Err(Error::at(
                ErrorKind::InvalidEntity {
                    entity: after.chars().take(8).collect(),
                },
                pos,
            ));
        };
        let (entity, tail) = after.split_at(semi);

        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric_entity(entity),
        };

        match decoded {
            Some(ch) => result.push(ch),
            None => {
                return Err(Error::at(
                    ErrorKind::InvalidEntity {
                        entity: entity.to_string(),
                    },
                    pos,
                ));
            }
        }
        rest = tail.get(1..).unwrap_or_default();
    }
    result.push_str(rest);

    Ok(result)
}

fn decode_numeric_entity(entity: &str) -> Option<char> {
    if let Some(hex) = entity.strip_prefix("#x") {
        u32::from_str_radix(hex, 16).ok().and_then(char::from_u32)
    } else if let Some(dec) = entity.strip_prefix('#') {
        dec.parse::<u32>().ok().and_then(char::from_u32)
    } else {
        None
    }
}
