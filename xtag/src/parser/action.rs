use std::ops::Range;

use crate::action::{Action, ActionKind};
use crate::parser::error::{ScanError, ScanErrorKind};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Every action token in `src`, unmatched, in source order. Comments are
/// skipped.
pub fn list_actions(src: &str) -> Result<Vec<Action>, ScanError> {
    Ok(tokenize_actions(src)?
        .into_iter()
        .map(ActionToken::into_action)
        .collect())
}

/// Every matched block in `src`, in closing order.
pub fn list_blocks(src: &str) -> Result<Vec<Action>, ScanError> {
    let mut matcher = BlockMatcher::new(src);
    let mut blocks = Vec::new();
    for token in tokenize_actions(src)? {
        if let Some(block) = matcher.feed(token)? {
            blocks.push(block);
        }
    }
    matcher.finish()?;
    Ok(blocks)
}

/// The first matched block whose opener is `name` with identifier `id`.
/// The whole buffer must nest correctly, even past the match.
pub fn find_action(src: &str, name: &str, id: &str) -> Result<Option<Action>, ScanError> {
    Ok(list_blocks(src)?
        .into_iter()
        .find(|block| block.name == name && block.id == id))
}

/// Every `{{block "#slot--NAME" ...}}` placeholder in `src`, in closing order.
pub fn list_placeholder_slots(src: &str) -> Result<Vec<Action>, ScanError> {
    Ok(list_blocks(src)?
        .into_iter()
        .filter(Action::is_placeholder)
        .collect())
}

// ---------------------------------------------------------------------------
// Tokenizer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct ActionToken {
    name: String,
    raw_args: String,
    id: String,
    id_span: Option<Range<usize>>,
    kind: ActionKind,
    span: Range<usize>,
}

impl ActionToken {
    fn into_action(self) -> Action {
        let end = self.span.end;
        Action {
            name: self.name,
            raw_args: self.raw_args,
            id: self.id,
            id_span: self.id_span,
            kind: self.kind,
            open_span: self.span.clone(),
            span: self.span,
            body_span: end..end,
            body: String::new(),
        }
    }
}

fn tokenize_actions(src: &str) -> Result<Vec<ActionToken>, ScanError> {
    let bytes = src.as_bytes();
    let len = bytes.len();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while let Some(offset) = src[pos..].find("{{") {
        let start = pos + offset;
        let unclosed = move || ScanError::new(ScanErrorKind::UnclosedAction, start..len);

        let mut inner_start = start + 2;
        // left trim marker `{{- `
        if bytes.get(inner_start) == Some(&b'-')
            && bytes.get(inner_start + 1).is_some_and(u8::is_ascii_whitespace)
        {
            inner_start += 1;
        }

        let text_start = skip_whitespace(bytes, inner_start);
        if src[text_start..].starts_with("/*") {
            let close = src[text_start + 2..].find("*/").ok_or_else(unclosed)? + text_start + 2;
            let mut i = skip_whitespace(bytes, close + 2);
            if bytes.get(i) == Some(&b'-') {
                i = skip_whitespace(bytes, i + 1);
            }
            if !src[i..].starts_with("}}") {
                return Err(unclosed());
            }
            pos = i + 2;
            continue;
        }

        let close = find_close(src, inner_start).ok_or_else(unclosed)?;
        let end = close + 2;
        let (text_offset, text) = action_text(src, inner_start, close);

        let name_len = text
            .find(|c: char| c.is_ascii_whitespace())
            .unwrap_or(text.len());
        let name = &text[..name_len];
        let after_name = &text[name_len..];
        let args = after_name.trim_start();
        let args_offset = text_offset + name_len + (after_name.len() - args.len());

        let (id, id_span) = match first_literal(args) {
            Some((literal, span)) => (
                literal.to_string(),
                Some(args_offset + span.start..args_offset + span.end),
            ),
            None => (String::new(), None),
        };

        tokens.push(ActionToken {
            name: name.to_string(),
            raw_args: args.to_string(),
            id,
            id_span,
            kind: ActionKind::of(name),
            span: start..end,
        });
        pos = end;
    }

    Ok(tokens)
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

/// Offset of the `}}` closing an action whose text starts at `from`.
/// Quoted literals may contain `}}`.
fn find_close(src: &str, from: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let len = bytes.len();
    let mut i = from;

    while i < len {
        match bytes[i] {
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < len && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
                i += 1;
            }
            b'`' => {
                i += 1;
                while i < len && bytes[i] != b'`' {
                    i += 1;
                }
                i += 1;
            }
            b'}' if bytes.get(i + 1) == Some(&b'}') => return Some(i),
            _ => i += 1,
        }
    }

    None
}

/// The action text between `from` and `to` with the right trim marker and
/// surrounding whitespace removed, and the offset it starts at.
fn action_text(src: &str, from: usize, to: usize) -> (usize, &str) {
    let mut inner = &src[from..to];
    if let Some(rest) = inner.trim_end().strip_suffix('-') {
        if rest.ends_with(|c: char| c.is_ascii_whitespace()) {
            inner = rest;
        }
    }
    let lead = inner.len() - inner.trim_start().len();
    (from + lead, inner.trim())
}

/// The first `"..."` or `` `...` `` literal in `args`: its contents and its
/// span (quotes included) relative to `args`.
fn first_literal(args: &str) -> Option<(&str, Range<usize>)> {
    let bytes = args.as_bytes();
    let start = bytes.iter().position(|&b| b == b'"' || b == b'`')?;
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() && bytes[i] != quote {
        if quote == b'"' && bytes[i] == b'\\' {
            i += 1;
        }
        i += 1;
    }
    if i >= bytes.len() {
        return None;
    }
    Some((&args[start + 1..i], start..i + 1))
}

// ---------------------------------------------------------------------------
// Stack matcher
// ---------------------------------------------------------------------------

struct BlockMatcher<'a> {
    src: &'a str,
    stack: Vec<ActionToken>,
}

impl<'a> BlockMatcher<'a> {
    fn new(src: &'a str) -> Self {
        BlockMatcher {
            src,
            stack: Vec::new(),
        }
    }

    fn feed(&mut self, token: ActionToken) -> Result<Option<Action>, ScanError> {
        match token.kind {
            ActionKind::Single => Ok(None),
            ActionKind::Opening => {
                self.stack.push(token);
                Ok(None)
            }
            ActionKind::Closing => {
                let Some(open) = self.stack.pop() else {
                    return Err(ScanError::new(ScanErrorKind::UnmatchedEnd, token.span));
                };
                let body_span = open.span.end..token.span.start;
                let body = self.src[body_span.clone()].to_string();
                let span = open.span.start..token.span.end;
                let mut block = open.into_action();
                block.span = span;
                block.body_span = body_span;
                block.body = body;
                Ok(Some(block))
            }
        }
    }

    fn finish(self) -> Result<(), ScanError> {
        match self.stack.last() {
            Some(open) => Err(ScanError::new(
                ScanErrorKind::UnterminatedAction {
                    name: open.name.clone(),
                },
                open.span.clone(),
            )),
            None => Ok(()),
        }
    }
}
