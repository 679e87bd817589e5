//! Template collaborator used to turn markup files into HTML.
//!
//! Markup sections may point at files on disk. Such files are loaded through a
//! [`TemplateLoader`] which produces a [`RenderableTemplate`] handle; the handle is rendered with
//! [`minijinja`] so templates can reference variables such as `{{ author }}`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::debug;
use minijinja::Environment;

use crate::error::Result;
use crate::value::Value;

/// A loaded template that can produce rendered text.
pub trait RenderableTemplate {
    /// Renders the template to a string.
    fn render(&self) -> Result<String>;
}

/// Produces template handles for files on disk.
pub trait TemplateLoader {
    /// Loads the template stored at `path`.
    fn load(&self, path: &Path) -> Result<Rc<dyn RenderableTemplate>>;

    /// Defines a variable for templates loaded afterwards. Loaders without variables ignore it.
    fn define(&mut self, name: &str, value: Value) {
        let _ = (name, value);
    }
}

/// A template read from a file and rendered with minijinja.
#[derive(Clone, Debug)]
pub struct TemplateFile {
    path: PathBuf,
    source: String,
    variables: BTreeMap<String, Value>,
}

impl TemplateFile {
    /// Reads the template at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path)?;
        debug!("Loaded template {} ({} bytes)", path.display(), source.len());
        Ok(Self::from_source(path, source))
    }

    /// Creates a template from already loaded source text.
    pub fn from_source(path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            source: source.into(),
            variables: BTreeMap::new(),
        }
    }

    /// Path the template was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sets a variable made available to the template.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Replaces all variables and returns the updated template.
    pub fn with_variables(mut self, variables: BTreeMap<String, Value>) -> Self {
        self.variables = variables;
        self
    }
}

impl RenderableTemplate for TemplateFile {
    fn render(&self) -> Result<String> {
        let env = Environment::new();
        Ok(env.render_str(&self.source, &self.variables)?)
    }
}

/// Default loader that reads template files from disk and injects shared variables.
#[derive(Clone, Debug, Default)]
pub struct FileTemplateLoader {
    variables: BTreeMap<String, Value>,
}

impl FileTemplateLoader {
    /// Creates a loader without any shared variables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a variable passed to every template loaded afterwards.
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    /// Returns the shared variables.
    pub fn variables(&self) -> &BTreeMap<String, Value> {
        &self.variables
    }
}

impl TemplateLoader for FileTemplateLoader {
    fn load(&self, path: &Path) -> Result<Rc<dyn RenderableTemplate>> {
        let template = TemplateFile::open(path)?.with_variables(self.variables.clone());
        Ok(Rc::new(template))
    }

    fn define(&mut self, name: &str, value: Value) {
        self.set_variable(name, value);
    }
}
