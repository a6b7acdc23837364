use xtag::parser::list_placeholder_slots;
use xtag::{Attributes, DEFAULT_SLOT, Document, ScanError};

/// Content supplied for one `<slot>` of a component tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSlot {
    pub name: String,
    pub body: String,
}

impl UserSlot {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        UserSlot {
            name: name.into(),
            body: body.into(),
        }
    }
}

/// Name of the block wrapping an expanded component.
pub fn block_name(component_type: &str, index: usize) -> String {
    format!("component__{}__{}", component_type, index)
}

/// Name a placeholder is renamed to.
pub fn slot_block_name(component_type: &str, index: usize, slot: &str) -> String {
    format!("{}__{}__{}", component_type, index, slot)
}

/// `(kwargs "k" "v" ...)` over every attribute except `type`.
pub fn props_call(attributes: &Attributes) -> String {
    let mut call = String::from("(kwargs");
    let mut empty = true;
    for (key, value) in attributes.iter().filter(|(key, _)| *key != "type") {
        call.push_str(&format!(" \"{}\" \"{}\"", key, value));
        empty = false;
    }
    if empty {
        call.push_str(" \"_\" \"\"");
    }
    call.push(')');
    call
}

/// The statement binding `$props` at the top of a block body.
pub fn props_statement(attributes: &Attributes) -> String {
    format!("{{{{- $props := {} -}}}}", props_call(attributes))
}

/// Everything needed to bind one component instance.
#[derive(Debug, Clone)]
pub struct Binding<'a> {
    pub component_type: &'a str,
    pub attributes: &'a Attributes,
    /// Generated index, unique within one translation.
    pub index: usize,
    pub slots: Vec<UserSlot>,
    /// The tag's own content. Only set when it supplied no `<slot>` at all.
    pub content: Option<String>,
}

impl Binding<'_> {
    /// Produce the block text for this component from its template.
    ///
    /// The template is wrapped in a `component__{type}__{n}` block and each
    /// `#slot--NAME` placeholder is renamed to `{type}__{n}__NAME`. Every
    /// block re-declares `$props`, since a caller's variables are not
    /// visible inside nested `block` bodies.
    pub fn bind(self, template: &str) -> Result<String, ScanError> {
        let Binding {
            component_type,
            attributes,
            index,
            mut slots,
            mut content,
        } = self;

        let props = props_statement(attributes);
        let mut doc = Document::new(format!(
            "{{{{- block \"{}\" . -}}}}\n{}\n{}{{{{end -}}}}",
            block_name(component_type, index),
            props,
            template
        ));

        // Outermost placeholder first: replacing its body drops any
        // placeholder nested in the default it replaces.
        loop {
            let placeholders = list_placeholder_slots(doc.as_str())?;
            let Some(placeholder) = placeholders.into_iter().min_by_key(|p| p.span.start) else {
                break;
            };
            let (Some(name), Some(id_span)) =
                (placeholder.placeholder_name(), placeholder.id_span.clone())
            else {
                break;
            };

            let body = if let Some(pos) = slots.iter().position(|slot| slot.name == name) {
                slots.remove(pos).body
            } else if name == DEFAULT_SLOT && content.is_some() {
                content.take().unwrap_or_default()
            } else {
                placeholder.body.clone()
            };

            let text = doc.as_str();
            let replacement = format!(
                "{}\"{}\"{}{}{}",
                &text[placeholder.span.start..id_span.start],
                slot_block_name(component_type, index, name),
                &text[id_span.end..placeholder.open_span.end],
                props,
                body
            );
            doc.splice(placeholder.span.start..placeholder.body_span.end, &replacement);
        }

        for slot in &slots {
            log::debug!(
                "component `{}` declares no slot `{}`; discarding it",
                component_type,
                slot.name
            );
        }
        if content.as_deref().is_some_and(|c| !c.trim().is_empty()) {
            log::debug!(
                "component `{}` has no default slot; discarding its content",
                component_type
            );
        }

        Ok(doc.into_string())
    }
}
