use xtag::parser::{component_slots, find_tag};
use xtag::{COMPONENT, Document, ScanError, Tag};

use crate::binder::{Binding, UserSlot, block_name};
use crate::config::ExpanderConfig;
use crate::error::ExpandError;
use crate::loader::TemplateLoader;
use crate::offsets::OffsetMap;

/// Expand every component in `src` with a fresh session over `loader`.
pub fn translate<L: TemplateLoader>(src: &str, loader: L) -> Result<String, ExpandError> {
    Expander::new(loader).translate(src)
}

/// One translation session.
///
/// Owns the template loader (and with it any template cache) and the
/// generated-name counter. The counter restarts on every [`translate`]
/// call; the loader's cache lives as long as the session.
///
/// [`translate`]: Expander::translate
pub struct Expander<L> {
    loader: L,
    max_components: usize,
    resolved: usize,
}

impl<L: TemplateLoader> Expander<L> {
    pub fn new(loader: L) -> Self {
        Expander {
            loader,
            max_components: ExpanderConfig::default().max_components,
            resolved: 0,
        }
    }

    pub fn with_config(loader: L, config: &ExpanderConfig) -> Self {
        Self::new(loader).with_limit(config.max_components)
    }

    pub fn with_limit(mut self, max_components: usize) -> Self {
        self.max_components = max_components;
        self
    }

    pub fn loader(&self) -> &L {
        &self.loader
    }

    pub fn into_loader(self) -> L {
        self.loader
    }

    /// Components resolved by the last translation, nested ones included.
    pub fn resolved(&self) -> usize {
        self.resolved
    }

    /// Rewrite every `<component>` in `src` into nested block actions.
    /// Text without components comes back unchanged.
    pub fn translate(&mut self, src: &str) -> Result<String, ExpandError> {
        self.resolved = 0;
        self.expand(src, Some(0))
    }

    /// Replace components in `text` until none is left. `base` is where
    /// `text` starts in the caller's source, `None` for generated text.
    fn expand(&mut self, text: &str, base: Option<usize>) -> Result<String, ExpandError> {
        let mut doc = Document::new(text);
        let mut offsets = OffsetMap::new(base);

        loop {
            // offsets from earlier passes are stale after a splice; rescan
            let tag = match find_tag(doc.as_str(), COMPONENT) {
                Ok(Some(tag)) => tag,
                Ok(None) => break,
                Err(error) => {
                    return Err(match offsets.to_source(error.span.start) {
                        Some(start) => ExpandError::Source(error.relocated(start)),
                        None => ExpandError::Generated(error),
                    });
                }
            };

            let replacement = if tag.id.is_empty() {
                log::warn!("dropping <component> without a `type` attribute");
                String::new()
            } else {
                let body_origin = offsets.to_source(tag.body_span.start);
                self.resolve(&tag, body_origin)?
            };

            offsets.record_splice(tag.span.clone(), replacement.len());
            doc.splice(tag.span, &replacement);
        }

        Ok(doc.into_string())
    }

    /// Expand one component tag into its bound block text.
    fn resolve(&mut self, tag: &Tag, body_origin: Option<usize>) -> Result<String, ExpandError> {
        let at = |offset: usize| body_origin.map(|base| base + offset);

        let slots = component_slots(&tag.body).map_err(|error| locate(error, body_origin))?;

        // nested components take their indices before the parent does
        let mut user_slots = Vec::with_capacity(slots.len());
        for slot in &slots {
            let body = self.expand(&slot.body, at(slot.body_span.start))?;
            user_slots.push(UserSlot::new(slot.slot_name(), body));
        }
        let content = if slots.is_empty() {
            Some(self.expand(&tag.body, body_origin)?)
        } else {
            None
        };

        if self.resolved >= self.max_components {
            return Err(ExpandError::LimitExceeded {
                limit: self.max_components,
            });
        }
        self.resolved += 1;
        let index = self.resolved;

        let template = self.loader.load(&tag.id);
        log::debug!(
            "expanding <component type=\"{}\"> as {} ({} slot(s))",
            tag.id,
            block_name(&tag.id, index),
            user_slots.len()
        );

        Binding {
            component_type: &tag.id,
            attributes: &tag.attributes,
            index,
            slots: user_slots,
            content,
        }
        .bind(&template)
        .map_err(|error| ExpandError::Template {
            component: tag.id.clone(),
            error,
        })
    }
}

/// Classify a scan error from a fragment starting at `base`.
fn locate(error: ScanError, base: Option<usize>) -> ExpandError {
    match base {
        Some(base) => {
            let start = base + error.span.start;
            ExpandError::Source(error.relocated(start))
        }
        None => ExpandError::Generated(error),
    }
}
