use std::ops::Range;

use crate::parser::error::{ScanError, ScanErrorKind};
use crate::tag::{Attributes, Tag, TagKind};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Find the first top-level `<element>` pair in `src`.
///
/// Scanning stops as soon as the outermost pair closes, so malformed markup
/// after it is not reported here.
pub fn find_tag(src: &str, element: &str) -> Result<Option<Tag>, ScanError> {
    let mut matcher = TagMatcher::new(src);
    for token in TagTokens::new(src, &[element]) {
        if let Some((tag, 0)) = matcher.feed(token?)? {
            return Ok(Some(tag));
        }
    }
    matcher.finish()?;
    Ok(None)
}

/// Every top-level `<element>` pair in `src`, in source order. Same-named
/// pairs nested inside one of them are part of its body only.
pub fn list_tags(src: &str, element: &str) -> Result<Vec<Tag>, ScanError> {
    Ok(match_pairs(src, &[element])?
        .into_iter()
        .filter(|(_, depth)| *depth == 0)
        .map(|(tag, _)| tag)
        .collect())
}

/// Every `<element>` pair in `src` at any depth, in closing order: nested
/// pairs come before the pair that encloses them.
pub fn list_tag_pairs(src: &str, element: &str) -> Result<Vec<Tag>, ScanError> {
    Ok(match_pairs(src, &[element])?
        .into_iter()
        .map(|(tag, _)| tag)
        .collect())
}

/// Every opening and closing token for `element`, unmatched, in source order.
pub fn list_tag_tokens(src: &str, element: &str) -> Result<Vec<Tag>, ScanError> {
    TagTokens::new(src, &[element])
        .map(|token| {
            token.map(|t| {
                let kind = t.kind;
                Tag::new(&t.element, t.attributes, kind, t.span)
            })
        })
        .collect()
}

/// Match all pairs of any of `elements`, returning each with the number of
/// pairs still open around it.
pub(crate) fn match_pairs(src: &str, elements: &[&str]) -> Result<Vec<(Tag, usize)>, ScanError> {
    let mut matcher = TagMatcher::new(src);
    let mut pairs = Vec::new();
    for token in TagTokens::new(src, elements) {
        if let Some(pair) = matcher.feed(token?)? {
            pairs.push(pair);
        }
    }
    matcher.finish()?;
    Ok(pairs)
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

/// One recognised `<element ...>` or `</element>` token.
#[derive(Debug, Clone)]
pub(crate) struct TagToken {
    element: String,
    kind: TagKind,
    attributes: Attributes,
    span: Range<usize>,
    self_closing: bool,
}

/// Iterator over the tags of a fixed set of element names. Anything else
/// that looks like markup is skipped.
pub(crate) struct TagTokens<'a> {
    src: &'a str,
    elements: &'a [&'a str],
    pos: usize,
    failed: bool,
}

impl<'a> TagTokens<'a> {
    pub(crate) fn new(src: &'a str, elements: &'a [&'a str]) -> Self {
        TagTokens {
            src,
            elements,
            pos: 0,
            failed: false,
        }
    }

    fn next_token(&mut self) -> Result<Option<TagToken>, ScanError> {
        let src = self.src;
        let elements = self.elements;
        let bytes = src.as_bytes();
        let len = bytes.len();

        while let Some(offset) = src[self.pos..].find('<') {
            let start = self.pos + offset;
            let mut i = start + 1;

            let closing = bytes.get(i) == Some(&b'/');
            if closing {
                i += 1;
            }

            let name_start = i;
            while i < len && is_name_byte(bytes[i]) {
                i += 1;
            }
            let name = &src[name_start..i];
            let Some(element) = elements
                .iter()
                .find(|e| !name.is_empty() && e.eq_ignore_ascii_case(name))
            else {
                self.pos = start + 1;
                continue;
            };

            let malformed = |end: usize| {
                ScanError::new(
                    ScanErrorKind::MalformedTag {
                        element: element.to_ascii_lowercase(),
                    },
                    start..end,
                )
            };

            match bytes.get(i) {
                Some(b) if b.is_ascii_whitespace() || *b == b'/' || *b == b'>' => {}
                None if closing => return Err(malformed(len)),
                None => {
                    self.pos = len;
                    continue;
                }
                // `<slot.x>` and the like are not this element
                Some(_) => {
                    self.pos = start + 1;
                    continue;
                }
            }

            if closing {
                while i < len && bytes[i].is_ascii_whitespace() {
                    i += 1;
                }
                if bytes.get(i) != Some(&b'>') {
                    return Err(malformed(i));
                }
                self.pos = i + 1;
                return Ok(Some(TagToken {
                    element: element.to_ascii_lowercase(),
                    kind: TagKind::Closing,
                    attributes: Attributes::new(),
                    span: start..i + 1,
                    self_closing: false,
                }));
            }

            // an opener that never reaches `>` is prose, not a tag
            let Some((attributes, self_closing, end)) = scan_attributes(src, i) else {
                self.pos = start + 1;
                continue;
            };
            self.pos = end;
            return Ok(Some(TagToken {
                element: element.to_ascii_lowercase(),
                kind: TagKind::Opening,
                attributes,
                span: start..end,
                self_closing,
            }));
        }

        self.pos = len;
        Ok(None)
    }
}

impl Iterator for TagTokens<'_> {
    type Item = Result<TagToken, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.next_token() {
            Ok(token) => token.map(Ok),
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

/// Scan attributes from `i` up to and including the tag's `>`.
/// Returns the attributes, whether the tag was self-closing, and the offset
/// just past the `>`; `None` when input ends first.
fn scan_attributes(src: &str, mut i: usize) -> Option<(Attributes, bool, usize)> {
    let bytes = src.as_bytes();
    let len = bytes.len();
    let mut attributes = Attributes::new();

    loop {
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        match *bytes.get(i)? {
            b'>' => return Some((attributes, false, i + 1)),
            b'/' if bytes.get(i + 1) == Some(&b'>') => return Some((attributes, true, i + 2)),
            _ => {}
        }

        let key_start = i;
        while i < len {
            let b = bytes[i];
            if b.is_ascii_whitespace() || b == b'=' || b == b'>' {
                break;
            }
            if b == b'/' && bytes.get(i + 1) == Some(&b'>') {
                break;
            }
            i += 1;
        }
        let key = &src[key_start..i];
        if key.is_empty() {
            // stray `=` or `/`
            i += 1;
            continue;
        }

        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if bytes.get(i) != Some(&b'=') {
            attributes.insert(key, "");
            continue;
        }
        i += 1;
        while i < len && bytes[i].is_ascii_whitespace() {
            i += 1;
        }

        let value = match *bytes.get(i)? {
            quote @ (b'"' | b'\'') => {
                i += 1;
                let value_start = i;
                while i < len && bytes[i] != quote {
                    i += 1;
                }
                if i >= len {
                    return None;
                }
                let value = &src[value_start..i];
                i += 1; // closing quote
                value
            }
            _ => {
                let value_start = i;
                while i < len && !bytes[i].is_ascii_whitespace() && bytes[i] != b'>' {
                    i += 1;
                }
                &src[value_start..i]
            }
        };
        attributes.insert(key, value);
    }
}

// ---------------------------------------------------------------------------
// Stack matcher
// ---------------------------------------------------------------------------

/// Pairs opening and closing tokens. Each completed pair is reported with
/// the depth of the stack left after popping it.
pub(crate) struct TagMatcher<'a> {
    src: &'a str,
    stack: Vec<TagToken>,
}

impl<'a> TagMatcher<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        TagMatcher {
            src,
            stack: Vec::new(),
        }
    }

    pub(crate) fn feed(&mut self, token: TagToken) -> Result<Option<(Tag, usize)>, ScanError> {
        match token.kind {
            TagKind::Opening if token.self_closing => {
                let tag = Tag::new(&token.element, token.attributes, TagKind::Opening, token.span);
                Ok(Some((tag, self.stack.len())))
            }
            TagKind::Opening => {
                self.stack.push(token);
                Ok(None)
            }
            TagKind::Closing => {
                let Some(open) = self.stack.pop() else {
                    return Err(unmatched_closer(&token));
                };
                if open.element != token.element {
                    return Err(unmatched_closer(&token).with_note(format!(
                        "innermost open tag is <{}> at offset {}",
                        open.element, open.span.start
                    )));
                }
                let mut tag = Tag::new(
                    &open.element,
                    open.attributes,
                    TagKind::Opening,
                    open.span.start..token.span.end,
                );
                tag.body_span = open.span.end..token.span.start;
                tag.body = self.src[tag.body_span.clone()].to_string();
                Ok(Some((tag, self.stack.len())))
            }
        }
    }

    /// Element of the innermost tag still open.
    pub(crate) fn innermost(&self) -> Option<&str> {
        self.stack.last().map(|open| open.element.as_str())
    }

    /// Fails when any opening tag is still waiting for its closer.
    pub(crate) fn finish(self) -> Result<(), ScanError> {
        match self.stack.last() {
            Some(open) => Err(ScanError::new(
                ScanErrorKind::UnterminatedTag {
                    element: open.element.clone(),
                },
                open.span.clone(),
            )),
            None => Ok(()),
        }
    }
}

fn unmatched_closer(token: &TagToken) -> ScanError {
    ScanError::new(
        ScanErrorKind::UnmatchedClosingTag {
            element: token.element.clone(),
        },
        token.span.clone(),
    )
}
