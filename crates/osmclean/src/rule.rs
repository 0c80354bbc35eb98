//! Cleanup rules: which tags to look at and which values mark their node for removal

use std::fmt;

use regex::Regex;

use crate::error::{Error, ErrorKind, Result};
use crate::select::{AttributeTest, Selector};
use crate::xml::Element;

/// Prefix left in `fixme` tags by the streamdeck OSM mapper export
pub const FIXME_PREFIX: &str = "streamdeck-osmapper #";

/// Icon file name plus a positive counter, e.g. `fire_hydrant.png3`
pub const NAME_PATTERN: &str = r"[a-z_-]+\.png[1-9][0-9]*";

const VALUE_ATTRIBUTE: &str = "v";

/// Predicate applied to a tag's `v` attribute
#[derive(Clone, Debug)]
pub enum ValueMatcher {
    Prefix(String),
    /// Anchored at both ends when built through [`ValueMatcher::pattern`]
    Pattern(Regex),
}

impl ValueMatcher {
    /// Compile a pattern that must match the whole value
    pub fn pattern(pattern: &str) -> Result<Self> {
        Regex::new(&format!("^(?:{pattern})$"))
            .map(Self::Pattern)
            .map_err(|e| Error::detached(ErrorKind::InvalidPattern, e.to_string()))
    }

    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Self::Prefix(prefix) => value.starts_with(prefix.as_str()),
            Self::Pattern(regex) => regex.is_match(value),
        }
    }
}

impl fmt::Display for ValueMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(prefix) => write!(f, "starts with {prefix:?}"),
            Self::Pattern(regex) => write!(f, "matches /{}/", regex.as_str()),
        }
    }
}

/// Tag selector plus value predicate
#[derive(Clone, Debug)]
pub struct Rule {
    selector: Selector,
    matcher: ValueMatcher,
}

impl Rule {
    /// Rule over `/osm/node/tag[@k="<key>"]`
    pub fn new(key: &str, matcher: ValueMatcher) -> Result<Self> {
        let selector = Selector::new(
            vec!["osm".to_string(), "node".to_string(), "tag".to_string()],
            Some(AttributeTest {
                name: "k".to_string(),
                value: key.to_string(),
            }),
        )?;
        Ok(Self::with_selector(selector, matcher))
    }

    pub const fn with_selector(selector: Selector, matcher: ValueMatcher) -> Self {
        Self { selector, matcher }
    }

    pub fn prefix(key: &str, prefix: &str) -> Result<Self> {
        Self::new(key, ValueMatcher::Prefix(prefix.to_string()))
    }

    pub fn pattern(key: &str, pattern: &str) -> Result<Self> {
        Self::new(key, ValueMatcher::pattern(pattern)?)
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn matcher(&self) -> &ValueMatcher {
        &self.matcher
    }

    pub fn matches_value(&self, value: &str) -> bool {
        self.matcher.is_match(value)
    }

    /// A selected tag without a value never matches
    pub fn matches_tag(&self, tag: &Element) -> bool {
        tag.attribute(VALUE_ATTRIBUTE)
            .is_some_and(|value| self.matches_value(value))
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} where v {}", self.selector, self.matcher)
    }
}

/// Built-in rule configurations
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Preset {
    /// `fixme` tags written by the streamdeck mapper
    #[default]
    Fixme,
    /// `name` tags still holding the icon file name
    Name,
}

impl Preset {
    pub fn rule(self) -> Result<Rule> {
        match self {
            Self::Fixme => Rule::prefix("fixme", FIXME_PREFIX),
            Self::Name => Rule::pattern("name", NAME_PATTERN),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixme_prefix() -> Result<()> {
        let rule = Preset::Fixme.rule()?;
        assert!(rule.matches_value("streamdeck-osmapper #42"));
        assert!(rule.matches_value("streamdeck-osmapper #"));
        assert!(!rule.matches_value("other-prefix"));
        assert!(!rule.matches_value(" streamdeck-osmapper #1"));
        assert!(!rule.matches_value("streamdeck-osmapper 1"));
        Ok(())
    }

    #[test]
    fn test_name_pattern_boundaries() -> Result<()> {
        let rule = Preset::Name.rule()?;
        assert!(rule.matches_value("a.png10"));
        assert!(rule.matches_value("a-b_c.png3"));
        assert!(rule.matches_value("sign.png7"));
        assert!(!rule.matches_value("a.png0"));
        assert!(!rule.matches_value("A.png1"));
        assert!(!rule.matches_value("sign.png"));
        assert!(!rule.matches_value("file.txt"));
        assert!(!rule.matches_value("x sign.png7"));
        assert!(!rule.matches_value("sign.png7 "));
        assert!(!rule.matches_value(".png1"));
        Ok(())
    }

    #[test]
    fn test_rule_selectors() -> Result<()> {
        assert_eq!(
            Preset::Fixme.rule()?.selector().to_string(),
            r#"/osm/node/tag[@k="fixme"]"#
        );
        assert_eq!(
            Preset::Name.rule()?.selector().to_string(),
            r#"/osm/node/tag[@k="name"]"#
        );
        Ok(())
    }

    #[test]
    fn test_pattern_alternation_is_anchored() -> Result<()> {
        let rule = Rule::pattern("name", "a|b")?;
        assert!(rule.matches_value("a"));
        assert!(!rule.matches_value("ab"));
        Ok(())
    }

    #[test]
    fn test_invalid_pattern() {
        let err = Rule::pattern("name", "(unclosed").err();
        assert_eq!(err.map(|e| e.kind().clone()), Some(ErrorKind::InvalidPattern));
    }

    #[test]
    fn test_tag_without_value_never_matches() -> Result<()> {
        let rule = Rule::prefix("fixme", "")?;
        assert!(!rule.matches_tag(&Element::new("tag").with_attribute("k", "fixme")));
        assert!(rule.matches_tag(
            &Element::new("tag")
                .with_attribute("k", "fixme")
                .with_attribute("v", "anything")
        ));
        Ok(())
    }
}
