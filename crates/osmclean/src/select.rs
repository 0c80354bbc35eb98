//! Absolute element paths with an optional attribute test, e.g.
//! `/osm/node/tag[@k="fixme"]`.

use std::fmt;

use crate::error::{Error, ErrorKind, Result};
use crate::xml::{Content, Document, Element};

/// Attribute equality test on the last step of a selector
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeTest {
    pub name: String,
    pub value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selector {
    steps: Vec<String>,
    test: Option<AttributeTest>,
}

/// An element picked by a [`Selector`]
#[derive(Clone, Copy, Debug)]
pub struct Match<'d> {
    /// Child indices from the root down to the element
    pub path: &'d [usize],
    pub element: &'d Element,
}

impl Selector {
    /// Build a selector from already-split steps.
    ///
    /// At least two steps are required: the root has no parent to remove.
    /// A test value may hold `"` or `'` but not both, so that it can always be
    /// written back as a quoted literal.
    pub fn new(steps: Vec<String>, test: Option<AttributeTest>) -> Result<Self> {
        if steps.len() < 2 {
            return Err(Error::detached(
                ErrorKind::InvalidSelector,
                "selector needs at least two steps",
            ));
        }
        if let Some(bad) = steps.iter().find(|step| !is_valid_name(step)) {
            return Err(Error::detached(
                ErrorKind::InvalidSelector,
                format!("invalid element name in selector: {bad:?}"),
            ));
        }
        if let Some(test) = &test {
            if test.value.contains('"') && test.value.contains('\'') {
                return Err(Error::detached(
                    ErrorKind::InvalidSelector,
                    format!("attribute value mixes both quote characters: {:?}", test.value),
                ));
            }
        }
        Ok(Self { steps, test })
    }

    /// Parse `/a/b/c` or `/a/b/c[@attr="value"]`
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |message: &str| {
            Error::detached(
                ErrorKind::InvalidSelector,
                format!("{message} in selector {source:?}"),
            )
        };

        let body = source
            .trim()
            .strip_prefix('/')
            .ok_or_else(|| invalid("missing leading '/'"))?;

        let (path, test) = match body.split_once('[') {
            None => (body, None),
            Some((path, predicate)) => {
                let predicate = predicate
                    .strip_suffix(']')
                    .ok_or_else(|| invalid("unterminated predicate"))?;
                let test =
                    parse_attribute_test(predicate).ok_or_else(|| invalid("bad predicate"))?;
                (path, Some(test))
            }
        };

        let steps = path.split('/').map(str::to_string).collect();
        Self::new(steps, test)
    }

    pub fn steps(&self) -> &[String] {
        &self.steps
    }

    pub fn attribute_test(&self) -> Option<&AttributeTest> {
        self.test.as_ref()
    }

    /// Visit matching elements in document order
    pub fn for_each_match(&self, doc: &Document, mut visit: impl FnMut(Match<'_>)) {
        let Some((root_step, rest)) = self.steps.split_first() else {
            return;
        };
        if doc.root.name != *root_step {
            return;
        }
        let mut path = Vec::with_capacity(rest.len());
        self.descend(&doc.root, rest, &mut path, &mut visit);
    }

    /// Collect the paths of all matching elements in document order
    pub fn select_paths(&self, doc: &Document) -> Vec<Vec<usize>> {
        let mut paths = Vec::new();
        self.for_each_match(doc, |m| paths.push(m.path.to_vec()));
        paths
    }

    fn descend(
        &self,
        element: &Element,
        steps: &[String],
        path: &mut Vec<usize>,
        visit: &mut impl FnMut(Match<'_>),
    ) {
        let Some((step, rest)) = steps.split_first() else {
            return;
        };

        for (index, child) in element.children.iter().enumerate() {
            let Content::Element(child) = child else {
                continue;
            };
            if child.name != *step {
                continue;
            }

            path.push(index);
            if rest.is_empty() {
                if self.passes_test(child) {
                    visit(Match {
                        path: path.as_slice(),
                        element: child,
                    });
                }
            } else {
                self.descend(child, rest, path, visit);
            }
            path.pop();
        }
    }

    fn passes_test(&self, element: &Element) -> bool {
        match &self.test {
            None => true,
            Some(test) => element.attribute(&test.name) == Some(test.value.as_str()),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            write!(f, "/{step}")?;
        }
        if let Some(test) = &self.test {
            let quote = if test.value.contains('"') { '\'' } else { '"' };
            write!(f, "[@{}={quote}{}{quote}]", test.name, test.value)?;
        }
        Ok(())
    }
}

fn parse_attribute_test(predicate: &str) -> Option<AttributeTest> {
    let (name, value) = predicate.trim().strip_prefix('@')?.split_once('=')?;
    let name = name.trim();
    let value = value.trim();
    let value = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))?;

    if !is_valid_name(name) {
        return None;
    }
    Some(AttributeTest {
        name: name.to_string(),
        value: value.to_string(),
    })
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == ':')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '-' | '.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::Parser;

    const OSM: &str = r#"<osm>
        <node id="1"><tag k="fixme" v="a"/><tag k="name" v="b"/></node>
        <way id="2"><tag k="fixme" v="c"/></way>
        <node id="3"/>
        <node id="4"><tag k="fixme" v="d"/></node>
    </osm>"#;

    #[test]
    fn test_parse_with_predicate() -> Result<()> {
        let selector = Selector::parse(r#"/osm/node/tag[@k="fixme"]"#)?;
        assert_eq!(selector.steps(), ["osm", "node", "tag"]);
        assert_eq!(
            selector.attribute_test(),
            Some(&AttributeTest {
                name: "k".to_string(),
                value: "fixme".to_string(),
            })
        );
        assert_eq!(selector.to_string(), r#"/osm/node/tag[@k="fixme"]"#);
        Ok(())
    }

    #[test]
    fn test_parse_single_quoted_predicate() -> Result<()> {
        let selector = Selector::parse("/osm/node/tag[@k='name']")?;
        assert_eq!(selector.attribute_test().map(|t| t.value.as_str()), Some("name"));
        Ok(())
    }

    #[test]
    fn test_display_picks_quote_that_reparses() -> Result<()> {
        let steps = || vec!["osm".to_string(), "node".to_string(), "tag".to_string()];
        for (value, shown) in [
            (r#"say "hi""#, r#"/osm/node/tag[@k='say "hi"']"#),
            ("it's", r#"/osm/node/tag[@k="it's"]"#),
        ] {
            let test = AttributeTest {
                name: "k".to_string(),
                value: value.to_string(),
            };
            let selector = Selector::new(steps(), Some(test))?;
            assert_eq!(selector.to_string(), shown);
            assert_eq!(Selector::parse(&selector.to_string())?, selector);
        }

        let mixed = AttributeTest {
            name: "k".to_string(),
            value: r#"it's "x""#.to_string(),
        };
        assert_eq!(
            Selector::new(steps(), Some(mixed)).map_err(|e| e.kind().clone()),
            Err(ErrorKind::InvalidSelector)
        );
        Ok(())
    }

    #[test]
    fn test_parse_rejects_malformed_selectors() {
        for source in [
            "osm/node",
            "/osm",
            "/osm//tag",
            "/osm/node/tag[@k=\"fixme\"",
            "/osm/node/tag[k=\"fixme\"]",
            "/osm/node/tag[@k=fixme]",
            "/osm/node/tag[@k=\"fixme']",
        ] {
            let result = Selector::parse(source);
            assert!(result.is_err(), "{source} should be rejected");
            assert_eq!(
                result.err().map(|e| e.kind().clone()),
                Some(ErrorKind::InvalidSelector)
            );
        }
    }

    #[test]
    fn test_select_paths_in_document_order() -> Result<()> {
        let doc = Parser::new(OSM.as_bytes()).parse()?;
        let selector = Selector::parse(r#"/osm/node/tag[@k="fixme"]"#)?;

        let paths = selector.select_paths(&doc);
        assert_eq!(paths, vec![vec![0, 0], vec![3, 0]]);
        Ok(())
    }

    #[test]
    fn test_select_without_predicate_and_wrong_root() -> Result<()> {
        let doc = Parser::new(OSM.as_bytes()).parse()?;

        let all_tags = Selector::parse("/osm/node/tag")?;
        assert_eq!(all_tags.select_paths(&doc).len(), 3);

        let other_root = Selector::parse("/map/node/tag")?;
        assert!(other_root.select_paths(&doc).is_empty());
        Ok(())
    }

    #[test]
    fn test_for_each_match_exposes_elements() -> Result<()> {
        let doc = Parser::new(OSM.as_bytes()).parse()?;
        let selector = Selector::parse(r#"/osm/node/tag[@k="fixme"]"#)?;

        let mut values = Vec::new();
        selector.for_each_match(&doc, |m| {
            values.push(m.element.attribute("v").map(str::to_string));
        });
        assert_eq!(values, vec![Some("a".to_string()), Some("d".to_string())]);
        Ok(())
    }
}
