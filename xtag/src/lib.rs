pub mod action;
pub mod document;
pub mod parser;
pub mod tag;

pub use action::{Action, ActionKind};
pub use document::Document;
pub use parser::{ScanError, ScanErrorKind};
pub use tag::{Attributes, Tag, TagKind};

/// Element name of a component tag.
pub const COMPONENT: &str = "component";

/// Element name of a slot tag, a direct child of a component.
pub const SLOT: &str = "slot";

/// Identifier prefix marking a `block` action as a slot placeholder.
pub const PLACEHOLDER_PREFIX: &str = "#slot--";

/// Slot name used for a `<slot>` without a `name` attribute, and the
/// placeholder that receives a component's direct content.
pub const DEFAULT_SLOT: &str = "default";
