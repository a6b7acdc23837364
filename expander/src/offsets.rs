use std::ops::Range;

/// Maps offsets in a buffer that is rewritten front to back onto the text
/// it started as.
///
/// Every splice replaces the first remaining component, so everything past
/// the rewritten prefix is still original text, shifted by the net growth
/// of all splices so far.
#[derive(Debug, Clone)]
pub(crate) struct OffsetMap {
    /// Offset of the buffer's original text within the caller's source;
    /// `None` when the buffer itself was generated.
    base: Option<usize>,
    shift: isize,
    rewritten_until: usize,
}

impl OffsetMap {
    pub(crate) fn new(base: Option<usize>) -> Self {
        OffsetMap {
            base,
            shift: 0,
            rewritten_until: 0,
        }
    }

    pub(crate) fn record_splice(&mut self, span: Range<usize>, replacement_len: usize) {
        let growth = replacement_len as isize - span.len() as isize;
        self.rewritten_until = if span.end <= self.rewritten_until {
            (self.rewritten_until as isize + growth) as usize
        } else {
            span.start + replacement_len
        };
        self.shift += growth;
    }

    /// Source offset of buffer offset `offset`, or `None` if it lies in
    /// generated text.
    pub(crate) fn to_source(&self, offset: usize) -> Option<usize> {
        let base = self.base?;
        if offset < self.rewritten_until {
            return None;
        }
        let original = usize::try_from(offset as isize - self.shift).ok()?;
        Some(base + original)
    }
}
