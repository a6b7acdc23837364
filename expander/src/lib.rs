pub mod binder;
pub mod config;
pub mod error;
pub mod loader;
mod offsets;
pub mod translate;

pub use binder::{Binding, UserSlot};
pub use config::{ConfigError, ExpanderConfig};
pub use error::ExpandError;
pub use loader::{FsLoader, MemoryLoader, TemplateLoader, fallback_template};
pub use translate::{Expander, translate};
