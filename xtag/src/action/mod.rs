use std::ops::Range;

use crate::PLACEHOLDER_PREFIX;

/// How an action participates in block nesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    Opening,
    Closing,
    Single,
}

impl ActionKind {
    /// Classify an action by its leading keyword.
    pub fn of(name: &str) -> Self {
        match name {
            "end" => ActionKind::Closing,
            "if" | "range" | "with" | "block" | "define" => ActionKind::Opening,
            _ => ActionKind::Single,
        }
    }
}

/// A scanned `{{ ... }}` action, or a matched block with its `{{end}}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Action {
    /// Leading keyword or expression (`block`, `if`, `.Title`, ...).
    pub name: String,
    /// Argument text after the name, trim markers excluded.
    pub raw_args: String,
    /// First quoted literal among the arguments, without quotes.
    pub id: String,
    /// Span of that literal in the scanned buffer, quotes included.
    pub id_span: Option<Range<usize>>,
    pub kind: ActionKind,
    /// Whole span: the single action, or opener through matching `{{end}}`.
    pub span: Range<usize>,
    /// Span of the opening action alone.
    pub open_span: Range<usize>,
    /// Bytes between the opener and its `{{end}}`.
    pub body_span: Range<usize>,
    pub body: String,
}

impl Action {
    pub fn start(&self) -> usize {
        self.span.start
    }

    pub fn end(&self) -> usize {
        self.span.end
    }

    /// Whether this is a `block` whose identifier carries the placeholder prefix.
    pub fn is_placeholder(&self) -> bool {
        self.name == "block" && self.id.starts_with(PLACEHOLDER_PREFIX)
    }

    /// Slot name of a placeholder: `body` for `"#slot--body"`.
    pub fn placeholder_name(&self) -> Option<&str> {
        if self.name != "block" {
            return None;
        }
        self.id.strip_prefix(PLACEHOLDER_PREFIX)
    }
}
