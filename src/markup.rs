//! Markup sources for the body, header and footer sections.

use std::fmt;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::Result;
use crate::template::{RenderableTemplate, TemplateLoader};
use crate::value::Value;

/// The three content slots fed to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    /// Document body.
    Main,
    /// Page header.
    Header,
    /// Page footer.
    Footer,
}

impl Section {
    /// Configuration key holding the section's markup.
    pub fn key(self) -> &'static str {
        match self {
            Section::Main => "markupMain",
            Section::Header => "markupHeader",
            Section::Footer => "markupFooter",
        }
    }
}

/// What a markup field may hold. Resolution to text happens at render time.
#[derive(Clone, Default)]
pub enum MarkupSource {
    /// Nothing configured.
    #[default]
    Empty,
    /// Literal markup, or the path of a template file.
    Text(String),
    /// Explicit path of a template file.
    Path(PathBuf),
    /// Already loaded template handle.
    Template(Rc<dyn RenderableTemplate>),
}

impl MarkupSource {
    /// Wraps a template handle.
    pub fn template(template: impl RenderableTemplate + 'static) -> Self {
        MarkupSource::Template(Rc::new(template))
    }

    /// Returns `true` when nothing is configured.
    pub fn is_empty(&self) -> bool {
        match self {
            MarkupSource::Empty => true,
            MarkupSource::Text(text) => text.is_empty(),
            MarkupSource::Path(path) => path.as_os_str().is_empty(),
            MarkupSource::Template(_) => false,
        }
    }

    /// Resolves the source to markup text.
    ///
    /// Precedence: a template handle is rendered; text or a path naming an existing file is loaded
    /// through `loader` and rendered; any other text is used literally.
    pub fn resolve(&self, loader: &dyn TemplateLoader) -> Result<String> {
        match self {
            MarkupSource::Template(template) => template.render(),
            MarkupSource::Text(text) => {
                if names_file(Path::new(text)) {
                    loader.load(Path::new(text))?.render()
                } else {
                    Ok(text.clone())
                }
            }
            MarkupSource::Path(path) => {
                if names_file(path) {
                    loader.load(path)?.render()
                } else {
                    Ok(path.display().to_string())
                }
            }
            MarkupSource::Empty => Ok(String::new()),
        }
    }

    /// Value reported through the key/value store.
    pub(crate) fn to_value(&self) -> Value {
        match self {
            MarkupSource::Empty => Value::Str(String::new()),
            MarkupSource::Text(text) => Value::Str(text.clone()),
            MarkupSource::Path(path) => Value::Str(path.display().to_string()),
            MarkupSource::Template(_) => Value::Str("<template>".to_owned()),
        }
    }
}

fn names_file(path: &Path) -> bool {
    !path.as_os_str().is_empty() && path.is_file()
}

impl fmt::Debug for MarkupSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkupSource::Empty => f.write_str("Empty"),
            MarkupSource::Text(text) => f.debug_tuple("Text").field(text).finish(),
            MarkupSource::Path(path) => f.debug_tuple("Path").field(path).finish(),
            MarkupSource::Template(_) => f.write_str("Template(..)"),
        }
    }
}

impl From<&str> for MarkupSource {
    fn from(text: &str) -> Self {
        MarkupSource::Text(text.to_owned())
    }
}

impl From<String> for MarkupSource {
    fn from(text: String) -> Self {
        MarkupSource::Text(text)
    }
}

impl From<PathBuf> for MarkupSource {
    fn from(path: PathBuf) -> Self {
        MarkupSource::Path(path)
    }
}

impl From<&Path> for MarkupSource {
    fn from(path: &Path) -> Self {
        MarkupSource::Path(path.to_path_buf())
    }
}

impl From<Value> for MarkupSource {
    /// Strings become [`MarkupSource::Text`]; any other value resolves to empty content.
    fn from(value: Value) -> Self {
        match value {
            Value::Str(text) => MarkupSource::Text(text),
            _ => MarkupSource::Empty,
        }
    }
}
