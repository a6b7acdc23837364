pub mod action;
pub mod component;
pub mod error;
pub mod tag;

pub use action::{find_action, list_actions, list_blocks, list_placeholder_slots};
pub use component::{component_slots, list_component_slots, list_components};
pub use error::{ScanError, ScanErrorKind};
pub use tag::{find_tag, list_tag_pairs, list_tag_tokens, list_tags};
