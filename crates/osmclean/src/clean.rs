//! Removal of nodes carrying matching tags

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::error::{Error, Result};
use crate::rule::Rule;
use crate::xml::{self, Document};

/// Appended to the full input path to name the output file
pub const OUTPUT_SUFFIX: &str = ".clean.osm";

/// Counts gathered by one cleaning pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CleanReport {
    /// Tags picked by the rule's selector
    pub selected: usize,
    /// Selected tags whose value satisfied the predicate
    pub matched: usize,
    /// Parent elements removed
    pub removed: usize,
}

/// Result of [`clean_file`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CleanOutcome {
    pub output: PathBuf,
    pub report: CleanReport,
}

/// Remove every parent of a tag matching `rule`.
///
/// Parents are collected first and removed afterwards, each one once no
/// matter how many of its tags matched.
pub fn clean(doc: &mut Document, rule: &Rule) -> CleanReport {
    let mut report = CleanReport::default();
    let mut doomed = BTreeSet::new();

    rule.selector().for_each_match(doc, |m| {
        report.selected += 1;
        if !rule.matches_tag(m.element) {
            return;
        }
        report.matched += 1;
        if let Some((_, parent)) = m.path.split_last() {
            if doomed.insert(parent.to_vec()) {
                debug!(
                    path = ?parent,
                    value = m.element.attribute("v").unwrap_or_default(),
                    "marking element for removal"
                );
            }
        }
    });

    // Reverse document order keeps the remaining indices valid.
    for path in doomed.iter().rev() {
        if doc.remove_at(path).is_some() {
            report.removed += 1;
        }
    }

    report
}

/// Parse, clean and re-serialize an in-memory document.
///
/// The input is already text, so the output stays a `String` whatever
/// encoding the declaration names; use [`clean_bytes`] to round-trip the
/// encoded form.
pub fn clean_str(input: &str, rule: &Rule) -> Result<(String, CleanReport)> {
    let mut doc = xml::parse_str(input)?;
    let report = clean(&mut doc, rule);
    Ok((xml::serialize(&doc), report))
}

/// Parse raw bytes, clean, and encode the result in the declared encoding
pub fn clean_bytes(input: &[u8], rule: &Rule) -> Result<(Vec<u8>, CleanReport)> {
    let mut doc = xml::parse(input)?;
    let report = clean(&mut doc, rule);
    Ok((xml::to_bytes(&doc)?, report))
}

/// `<input><OUTPUT_SUFFIX>`, even when the input already carries the suffix
pub fn output_path(input: &Path) -> PathBuf {
    let mut name = OsString::from(input.as_os_str());
    name.push(OUTPUT_SUFFIX);
    PathBuf::from(name)
}

/// Clean `input` and write the result next to it.
///
/// The input file is never modified.
#[instrument(skip(rule), fields(rule = %rule))]
pub fn clean_file(input: &Path, rule: &Rule) -> Result<CleanOutcome> {
    let bytes = std::fs::read(input).map_err(|e| Error::io(input, &e))?;
    debug!(bytes = bytes.len(), "read input");

    let (cleaned, report) = clean_bytes(&bytes, rule)?;

    let output = output_path(input);
    std::fs::write(&output, cleaned).map_err(|e| Error::io(&output, &e))?;
    info!(
        output = %output.display(),
        selected = report.selected,
        matched = report.matched,
        removed = report.removed,
        "wrote cleaned document"
    );

    Ok(CleanOutcome { output, report })
}
