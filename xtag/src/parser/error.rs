use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};

/// What went wrong while matching tags or actions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanErrorKind {
    #[error("unterminated <{element}> tag")]
    UnterminatedTag { element: String },
    #[error("closing </{element}> has no matching opening tag")]
    UnmatchedClosingTag { element: String },
    #[error("<slot name=\"{name}\"> is nested inside another <slot>")]
    NestedSlot { name: String },
    #[error("malformed <{element}> tag: missing `>`")]
    MalformedTag { element: String },
    #[error("{{{{end}}}} has no matching block action")]
    UnmatchedEnd,
    #[error("unterminated {{{{{name}}}}} action: missing {{{{end}}}}")]
    UnterminatedAction { name: String },
    #[error("unclosed action: missing `}}}}`")]
    UnclosedAction,
}

/// Scan errors with source location information.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{kind}")]
pub struct ScanError {
    pub kind: ScanErrorKind,
    pub span: Range<usize>,
    pub file_id: usize,
    pub notes: Vec<String>,
}

impl ScanError {
    pub fn new(kind: ScanErrorKind, span: Range<usize>) -> Self {
        ScanError {
            kind,
            span,
            file_id: 0,
            notes: Vec::new(),
        }
    }

    pub fn in_file(mut self, file_id: usize) -> Self {
        self.file_id = file_id;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Move the span so it starts at `start`, keeping its length.
    pub fn relocated(mut self, start: usize) -> Self {
        let len = self.span.len();
        self.span = start..start + len;
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::error()
            .with_message(self.kind.to_string())
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }
}
