use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use xtag::PLACEHOLDER_PREFIX;

use crate::config::ExpanderConfig;

/// Source of component template snippets.
///
/// Loading never fails: a type that cannot be resolved yields
/// [`fallback_template`], so one missing component shows up as a visible
/// diagnostic in the output instead of aborting the document.
pub trait TemplateLoader {
    fn load(&mut self, component_type: &str) -> Rc<str>;
}

impl<L: TemplateLoader + ?Sized> TemplateLoader for &mut L {
    fn load(&mut self, component_type: &str) -> Rc<str> {
        (**self).load(component_type)
    }
}

/// Template substituted for a component type that cannot be loaded.
pub fn fallback_template(component_type: &str) -> String {
    format!(
        "<div class=\"component-unknown\">{{{{block \"{PLACEHOLDER_PREFIX}unknown\" .}}}}unknown component {component_type}{{{{end}}}}</div>"
    )
}

/// Loads `{folder}/{type}.{extension}` from disk.
///
/// Each loader owns its cache, so two sessions never see each other's
/// templates.
#[derive(Debug)]
pub struct FsLoader {
    folder: PathBuf,
    extension: String,
    cache: HashMap<String, Rc<str>>,
}

impl FsLoader {
    pub fn new(folder: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        FsLoader {
            folder: folder.into(),
            extension: extension.into(),
            cache: HashMap::new(),
        }
    }

    pub fn from_config(root: &Path, config: &ExpanderConfig) -> Self {
        Self::new(config.components_path(root), config.extension.clone())
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Number of component types loaded so far, fallbacks included.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    /// Where the template for `component_type` lives, or `None` when the
    /// type cannot name a file directly inside the folder.
    pub fn template_path(&self, component_type: &str) -> Option<PathBuf> {
        if component_type.is_empty()
            || component_type == "."
            || component_type == ".."
            || component_type.contains(['/', '\\', '\0'])
        {
            return None;
        }
        let file = if self.extension.is_empty() {
            component_type.to_string()
        } else {
            format!("{}.{}", component_type, self.extension)
        };
        Some(self.folder.join(file))
    }

    fn read(&self, component_type: &str) -> Rc<str> {
        let Some(path) = self.template_path(component_type) else {
            log::warn!("component type `{}` is not a valid file name", component_type);
            return fallback_template(component_type).into();
        };
        match std::fs::read_to_string(&path) {
            Ok(source) => {
                log::debug!("loaded component `{}` from {}", component_type, path.display());
                source.into()
            }
            Err(e) => {
                log::warn!(
                    "unknown component `{}`: cannot read {}: {}",
                    component_type,
                    path.display(),
                    e
                );
                fallback_template(component_type).into()
            }
        }
    }
}

impl TemplateLoader for FsLoader {
    fn load(&mut self, component_type: &str) -> Rc<str> {
        if let Some(template) = self.cache.get(component_type) {
            return Rc::clone(template);
        }
        let template = self.read(component_type);
        self.cache
            .insert(component_type.to_string(), Rc::clone(&template));
        template
    }
}

/// Templates held in memory, keyed by component type.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    templates: HashMap<String, Rc<str>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        MemoryLoader {
            templates: HashMap::new(),
        }
    }

    pub fn insert(&mut self, component_type: impl Into<String>, template: impl Into<String>) {
        let template: String = template.into();
        self.templates.insert(component_type.into(), template.into());
    }

    pub fn with(mut self, component_type: impl Into<String>, template: impl Into<String>) -> Self {
        self.insert(component_type, template);
        self
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MemoryLoader {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut loader = MemoryLoader::new();
        for (component_type, template) in iter {
            loader.insert(component_type, template);
        }
        loader
    }
}

impl TemplateLoader for MemoryLoader {
    fn load(&mut self, component_type: &str) -> Rc<str> {
        match self.templates.get(component_type) {
            Some(template) => Rc::clone(template),
            None => {
                log::warn!("unknown component `{}`", component_type);
                fallback_template(component_type).into()
            }
        }
    }
}
