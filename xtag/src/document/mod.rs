use std::fmt;
use std::ops::Range;

/// A mutable text buffer rewritten in place by the expander.
///
/// Offsets computed by scanning a document are only valid until its next
/// mutation. Callers re-scan after every `cut`, `splice` or `replace`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    text: String,
}

impl Document {
    pub fn new(text: impl Into<String>) -> Self {
        Document { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Remove the bytes in `span`.
    pub fn cut(&mut self, span: Range<usize>) {
        self.text.replace_range(span, "");
    }

    /// Replace the bytes in `span` with `text`.
    pub fn splice(&mut self, span: Range<usize>, text: &str) {
        self.text.replace_range(span, text);
    }

    /// Literal replacement of the first `limit` occurrences of `old`, or all
    /// of them when `limit` is `None`. Returns how many were replaced.
    pub fn replace(&mut self, old: &str, new: &str, limit: Option<usize>) -> usize {
        if old.is_empty() {
            return 0;
        }
        let mut out = String::with_capacity(self.text.len());
        let mut rest = self.text.as_str();
        let mut count = 0;
        while limit.is_none_or(|n| count < n) {
            let Some(pos) = rest.find(old) else {
                break;
            };
            out.push_str(&rest[..pos]);
            out.push_str(new);
            rest = &rest[pos + old.len()..];
            count += 1;
        }
        out.push_str(rest);
        self.text = out;
        count
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Document { text }
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Document {
            text: text.to_string(),
        }
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
