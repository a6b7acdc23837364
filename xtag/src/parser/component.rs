use crate::parser::error::{ScanError, ScanErrorKind};
use crate::parser::tag::{TagMatcher, TagTokens, list_tag_pairs};
use crate::tag::Tag;
use crate::{COMPONENT, SLOT};

/// Every `<component>` pair in `src`, in closing order, so nested
/// components precede their parents. Pairs without a `type` attribute are
/// dropped.
pub fn list_components(src: &str) -> Result<Vec<Tag>, ScanError> {
    Ok(list_tag_pairs(src, COMPONENT)?
        .into_iter()
        .filter(|tag| !tag.id.is_empty())
        .collect())
}

/// The slots of the first `<component type="component_type">` in `src`,
/// with offsets relative to `src`. Empty when no such component exists.
pub fn list_component_slots(src: &str, component_type: &str) -> Result<Vec<Tag>, ScanError> {
    let Some(component) = list_tag_pairs(src, COMPONENT)?
        .into_iter()
        .filter(|tag| tag.id == component_type)
        .min_by_key(|tag| tag.span.start)
    else {
        return Ok(Vec::new());
    };

    let mut slots = component_slots(&component.body)?;
    for slot in &mut slots {
        slot.offset_by(component.body_span.start);
    }
    Ok(slots)
}

/// The slots directly inside one component's body, in source order, with
/// offsets relative to `body`.
///
/// A slot counts only when no other slot or nested component is open around
/// it, so the slots of a component passed in through a slot stay with that
/// component. A slot directly inside another slot is an error.
pub fn component_slots(body: &str) -> Result<Vec<Tag>, ScanError> {
    let mut matcher = TagMatcher::new(body);
    let mut slots = Vec::new();
    for token in TagTokens::new(body, &[COMPONENT, SLOT]) {
        let Some((tag, depth)) = matcher.feed(token?)? else {
            continue;
        };
        if tag.element != SLOT {
            continue;
        }
        if depth == 0 {
            slots.push(tag);
        } else if matcher.innermost() == Some(SLOT) {
            return Err(ScanError::new(
                ScanErrorKind::NestedSlot {
                    name: tag.slot_name().to_string(),
                },
                tag.span,
            ));
        }
    }
    matcher.finish()?;
    Ok(slots)
}
