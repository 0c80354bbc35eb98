//! XML data model

use indexmap::IndexMap;

use crate::xml::encoding::Encoding;

/// `<?xml ...?>` declaration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Declaration {
    pub version: String,
    /// Label exactly as declared, `None` when the declaration omitted it
    pub encoding_label: Option<String>,
    pub encoding: Encoding,
    pub standalone: Option<bool>,
}

impl Default for Declaration {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding_label: None,
            encoding: Encoding::Utf8,
            standalone: None,
        }
    }
}

/// XML document
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub declaration: Declaration,
    pub root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self {
            declaration: Declaration::default(),
            root,
        }
    }

    /// Follow a path of child-element indices from the root
    pub fn element_at(&self, path: &[usize]) -> Option<&Element> {
        path.iter()
            .try_fold(&self.root, |element, &index| element.child_element(index))
    }

    /// Mutable variant of [`Document::element_at`]
    pub fn element_at_mut(&mut self, path: &[usize]) -> Option<&mut Element> {
        path.iter()
            .try_fold(&mut self.root, |element, &index| element.child_element_mut(index))
    }

    /// Detach the element at `path` from its parent.
    ///
    /// The root itself (empty path) cannot be removed.
    pub fn remove_at(&mut self, path: &[usize]) -> Option<Element> {
        let (&index, parent_path) = path.split_last()?;
        self.element_at_mut(parent_path)?.remove_child(index)
    }
}

/// XML element
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    pub name: String,
    pub attributes: IndexMap<String, String>,
    pub children: Vec<Content>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Self) -> Self {
        self.children.push(Content::Element(child));
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// Child elements, skipping text, CDATA and comments
    pub fn elements(&self) -> impl Iterator<Item = &Self> {
        self.children.iter().filter_map(|child| match child {
            Content::Element(element) => Some(element),
            _ => None,
        })
    }

    /// Child elements with the given name
    pub fn elements_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Self> {
        self.elements().filter(move |element| element.name == name)
    }

    /// The `index`-th entry of `children`, if it is an element
    pub fn child_element(&self, index: usize) -> Option<&Self> {
        match self.children.get(index)? {
            Content::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn child_element_mut(&mut self, index: usize) -> Option<&mut Self> {
        match self.children.get_mut(index)? {
            Content::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Remove the `index`-th entry of `children` if it is an element
    pub fn remove_child(&mut self, index: usize) -> Option<Self> {
        if !matches!(self.children.get(index), Some(Content::Element(_))) {
            return None;
        }
        match self.children.remove(index) {
            Content::Element(element) => Some(element),
            _ => None,
        }
    }

    /// Whether any child carries character data
    pub fn has_text(&self) -> bool {
        self.children
            .iter()
            .any(|child| matches!(child, Content::Text(_) | Content::CData(_)))
    }
}

/// XML content node
#[derive(Clone, Debug, PartialEq)]
pub enum Content {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
}
