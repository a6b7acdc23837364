use std::path::{Path, PathBuf};

use serde::Deserialize;

/// File name looked up beside the input when no config path is given.
pub const CONFIG_FILE: &str = "xtag.toml";

/// Settings for one expansion session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExpanderConfig {
    /// Folder holding `{type}.{extension}` component templates, relative to
    /// the template root unless absolute.
    pub components_dir: PathBuf,
    /// File extension of component templates, without the dot.
    pub extension: String,
    /// Upper bound on components resolved by one translation.
    pub max_components: usize,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        ExpanderConfig {
            components_dir: PathBuf::from("_components"),
            extension: "html".to_string(),
            max_components: 4096,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config '{}': {source}", .path.display())]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ExpanderConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `xtag.toml` from `root` when present, defaults otherwise.
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// The components folder resolved against `root`.
    pub fn components_path(&self, root: &Path) -> PathBuf {
        root.join(&self.components_dir)
    }
}
