//! Pretty-printing XML serializer

use std::fmt::Write as _;

use crate::error::Result;
use crate::xml::encoding::Encoding;
use crate::xml::model::{Content, Declaration, Document, Element};

const INDENT: &str = "  ";

/// Serialize a document with its declaration and two-space indentation.
///
/// Elements holding text or CDATA are written on a single line so that mixed
/// content keeps its exact character data.
pub fn serialize(doc: &Document) -> String {
    let mut output = String::new();
    let encoding = doc.declaration.encoding;
    write_declaration(&doc.declaration, &mut output);
    write_element(&doc.root, 0, encoding, &mut output);
    output
}

/// Serialize a document and encode it in the encoding its declaration names
pub fn to_bytes(doc: &Document) -> Result<Vec<u8>> {
    doc.declaration.encoding.encode(&serialize(doc))
}

fn write_declaration(decl: &Declaration, output: &mut String) {
    let label = decl.encoding_label.as_deref().unwrap_or("UTF-8");
    output.push_str("<?xml version=\"");
    output.push_str(&decl.version);
    output.push_str("\" encoding=\"");
    output.push_str(label);
    output.push('"');
    if let Some(standalone) = decl.standalone {
        output.push_str(if standalone {
            " standalone=\"yes\""
        } else {
            " standalone=\"no\""
        });
    }
    output.push_str("?>\n");
}

fn write_element(element: &Element, depth: usize, encoding: Encoding, output: &mut String) {
    push_indent(depth, output);

    if element.children.is_empty() || element.has_text() {
        write_inline(element, encoding, output);
        output.push('\n');
        return;
    }

    write_start_tag(element, encoding, output);
    output.push_str(">\n");
    for child in &element.children {
        match child {
            Content::Element(child) => write_element(child, depth + 1, encoding, output),
            Content::Comment(comment) => {
                push_indent(depth + 1, output);
                write_comment(comment, output);
                output.push('\n');
            }
            // has_text() ruled these out
            Content::Text(_) | Content::CData(_) => {}
        }
    }
    push_indent(depth, output);
    write_end_tag(element, output);
    output.push('\n');
}

fn write_inline(element: &Element, encoding: Encoding, output: &mut String) {
    write_start_tag(element, encoding, output);

    if element.children.is_empty() {
        output.push_str("/>");
        return;
    }

    output.push('>');
    for child in &element.children {
        match child {
            Content::Element(child) => write_inline(child, encoding, output),
            Content::Text(text) => escape_into(text, false, encoding, output),
            Content::CData(data) => {
                output.push_str("<![CDATA[");
                output.push_str(data);
                output.push_str("]]>");
            }
            Content::Comment(comment) => write_comment(comment, output),
        }
    }
    write_end_tag(element, output);
}

fn write_start_tag(element: &Element, encoding: Encoding, output: &mut String) {
    output.push('<');
    output.push_str(&element.name);

    for (key, value) in &element.attributes {
        output.push(' ');
        output.push_str(key);
        output.push_str("=\"");
        escape_into(value, true, encoding, output);
        output.push('"');
    }
}

fn write_end_tag(element: &Element, output: &mut String) {
    output.push_str("</");
    output.push_str(&element.name);
    output.push('>');
}

fn write_comment(comment: &str, output: &mut String) {
    output.push_str("<!--");
    output.push_str(comment);
    output.push_str("-->");
}

fn push_indent(depth: usize, output: &mut String) {
    for _ in 0..depth {
        output.push_str(INDENT);
    }
}

fn escape_into(input: &str, attribute: bool, encoding: Encoding, output: &mut String) {
    for ch in input.chars() {
        match ch {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            '"' if attribute => output.push_str("&quot;"),
            '\n' if attribute => output.push_str("&#10;"),
            '\t' if attribute => output.push_str("&#9;"),
            '\r' => output.push_str("&#13;"),
            ch if encoding == Encoding::Ascii && !ch.is_ascii() => {
                let _ = write!(output, "&#{};", u32::from(ch));
            }
            ch => output.push(ch),
        }
    }
}
