use std::ops::Range;

use crate::DEFAULT_SLOT;

/// Whether a scanned markup tag opens or closes an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Opening,
    Closing,
}

/// Attributes of a markup tag, in the order they appear in source.
/// Keys are lower-cased; values are kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributes {
    entries: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Attributes {
            entries: Vec::new(),
        }
    }

    /// Insert an attribute. A repeated key keeps the first value seen.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into().to_ascii_lowercase();
        if self.get(&key).is_none() {
            self.entries.push((key, value.into()));
        }
    }

    /// Case-insensitive lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (key, value) in iter {
            attributes.insert(key, value);
        }
        attributes
    }
}

/// A scanned markup tag, or a matched opening/closing pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    /// Lower-cased element name.
    pub element: String,
    /// Value of the `type` attribute, empty when absent.
    pub id: String,
    /// Value of the `name` attribute, empty when absent.
    pub name: String,
    pub attributes: Attributes,
    pub kind: TagKind,
    /// Byte span in the scanned buffer. For a matched pair this runs from
    /// the opener's `<` through the closer's `>`.
    pub span: Range<usize>,
    /// Bytes strictly between the opener and the closer.
    pub body_span: Range<usize>,
    pub body: String,
}

impl Tag {
    pub(crate) fn new(
        element: &str,
        attributes: Attributes,
        kind: TagKind,
        span: Range<usize>,
    ) -> Self {
        let id = attributes.get("type").unwrap_or_default().to_string();
        let name = attributes.get("name").unwrap_or_default().to_string();
        let body_span = span.end..span.end;
        Tag {
            element: element.to_ascii_lowercase(),
            id,
            name,
            attributes,
            kind,
            span,
            body_span,
            body: String::new(),
        }
    }

    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key)
    }

    /// The name this tag binds under when used as a slot.
    pub fn slot_name(&self) -> &str {
        if self.name.is_empty() {
            DEFAULT_SLOT
        } else {
            &self.name
        }
    }

    /// Move every offset by `delta`, for a tag scanned from a sub-slice.
    pub(crate) fn offset_by(&mut self, delta: usize) {
        self.span = self.span.start + delta..self.span.end + delta;
        self.body_span = self.body_span.start + delta..self.body_span.end + delta;
    }
}
