use codespan_reporting::diagnostic::{Diagnostic, Label};
use xtag::ScanError;

#[derive(Debug, thiserror::Error)]
pub enum ExpandError {
    /// Malformed nesting in the caller's text. The span points into it.
    #[error(transparent)]
    Source(ScanError),
    /// Malformed nesting in text produced by expansion, with no position in
    /// the caller's text.
    #[error("{0} (in expanded output)")]
    Generated(ScanError),
    /// A loaded component template does not nest correctly once bound.
    #[error("{error} (in template of component `{component}`)")]
    Template { component: String, error: ScanError },
    #[error("expansion resolved more than {limit} components")]
    LimitExceeded { limit: usize },
}

impl ExpandError {
    /// The underlying scan error, if any.
    pub fn scan_error(&self) -> Option<&ScanError> {
        match self {
            ExpandError::Source(error)
            | ExpandError::Generated(error)
            | ExpandError::Template { error, .. } => Some(error),
            ExpandError::LimitExceeded { .. } => None,
        }
    }

    /// Convert to a codespan-reporting Diagnostic. Only `Source` errors
    /// carry a label into `file_id`.
    pub fn to_diagnostic(&self, file_id: usize) -> Diagnostic<usize> {
        match self {
            ExpandError::Source(error) => Diagnostic::error()
                .with_message(error.kind.to_string())
                .with_labels(vec![Label::primary(file_id, error.span.clone())])
                .with_notes(error.notes.clone()),
            ExpandError::Generated(error) => Diagnostic::error()
                .with_message(error.kind.to_string())
                .with_notes(vec![format!(
                    "at offset {} of the partially expanded document",
                    error.span.start
                )]),
            ExpandError::Template { component, error } => Diagnostic::error()
                .with_message(error.kind.to_string())
                .with_notes(vec![format!(
                    "while binding slots into the template of component `{}`",
                    component
                )]),
            ExpandError::LimitExceeded { .. } => Diagnostic::error()
                .with_message(self.to_string())
                .with_notes(vec![
                    "a component template that includes itself never finishes expanding".to_string(),
                ]),
        }
    }
}
