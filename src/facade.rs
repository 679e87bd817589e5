//! The configurable rendering facade.
//!
//! [`RenderFacade`] owns a [`RenderConfiguration`], builds its renderer on first use and feeds it
//! the configured markup before every output operation.

use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use log::{debug, warn};

use crate::config::{ConfigKey, RenderConfiguration, RENDERER_KEY};
use crate::error::{FacadeError, Result};
use crate::genpdf_renderer::GenpdfRenderer;
use crate::markup::{MarkupSource, Section};
use crate::renderer::{DocumentRenderer, WriteMode};
use crate::template::{FileTemplateLoader, TemplateLoader};
use crate::value::Value;

/// How a downloaded document is presented by the client.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Display in the client.
    #[default]
    Inline,
    /// Force a download.
    Attachment,
}

impl FromStr for OutputMode {
    type Err = FacadeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "i" | "inline" => Ok(OutputMode::Inline),
            "d" | "download" | "attachment" => Ok(OutputMode::Attachment),
            other => Err(FacadeError::invalid_value(
                "mode",
                format!("unknown output mode '{other}'"),
            )),
        }
    }
}

/// A rendered document addressed to a client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentResponse {
    filename: String,
    mode: OutputMode,
    bytes: Vec<u8>,
}

impl DocumentResponse {
    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    pub fn content_type(&self) -> &'static str {
        "application/pdf"
    }

    /// Value of the `Content-Disposition` header.
    pub fn content_disposition(&self) -> String {
        let disposition = match self.mode {
            OutputMode::Inline => "inline",
            OutputMode::Attachment => "attachment",
        };
        let filename = self.filename.replace(['"', '\r', '\n'], "");
        format!("{disposition}; filename=\"{filename}\"")
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Streams the document body into `writer`.
    pub fn write_to(&self, mut writer: impl Write) -> Result<()> {
        writer.write_all(&self.bytes)?;
        writer.flush()?;
        Ok(())
    }
}

/// Configuration plus a lazily created renderer.
///
/// A facade is meant for one render-and-output cycle: the renderer keeps everything written into
/// it, so a second output repeats the header, footer and body writes on top of the first ones.
pub struct RenderFacade<R: DocumentRenderer = GenpdfRenderer> {
    config: RenderConfiguration,
    renderer: Option<R>,
    templates: Box<dyn TemplateLoader>,
    template_vars: BTreeMap<String, Value>,
}

impl RenderFacade {
    /// Creates a genpdf-backed facade with the default configuration.
    pub fn new() -> Self {
        Self::with_configuration(RenderConfiguration::default())
    }
}

impl Default for RenderFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: DocumentRenderer> RenderFacade<R> {
    /// Creates a facade around `config`. Nothing is rendered until the first output.
    pub fn with_configuration(config: RenderConfiguration) -> Self {
        Self {
            config,
            renderer: None,
            templates: Box::new(FileTemplateLoader::new()),
            template_vars: BTreeMap::new(),
        }
    }

    /// Replaces the loader used for markup files.
    pub fn with_template_loader(mut self, loader: impl TemplateLoader + 'static) -> Self {
        self.templates = Box::new(loader);
        self
    }

    pub fn configuration(&self) -> &RenderConfiguration {
        &self.config
    }

    /// Reads a configuration value. `renderer` is not a value; use [`renderer`](Self::renderer).
    pub fn get(&self, key: &str) -> Option<Value> {
        self.config.get(key)
    }

    /// Writes a configuration value.
    ///
    /// Layout options are read when the renderer is created; changing them afterwards has no
    /// effect and is logged.
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<&mut Self> {
        let value = value.into();
        if key == RENDERER_KEY {
            return Err(FacadeError::ConfigurationType {
                key: key.to_owned(),
                expected: type_name::<R>(),
                found: value.kind().to_owned(),
            });
        }

        self.config.set(key, value)?;
        if self.renderer.is_some()
            && ConfigKey::from_name(key).is_some_and(ConfigKey::affects_layout)
        {
            warn!(
                "'{}' changed after the renderer was created; the new value is ignored",
                key
            );
        }
        Ok(self)
    }

    /// Replaces the markup source of a section.
    pub fn set_markup(&mut self, section: Section, source: impl Into<MarkupSource>) -> &mut Self {
        self.config.set_markup(section, source);
        self
    }

    /// Sets a variable for markup templates. Caller variables win over the shared ones.
    pub fn set_template_var(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.template_vars.insert(name.into(), value.into());
        self
    }

    /// Installs an existing renderer. Fails unless `renderer` is an `R`.
    pub fn set_renderer_instance(&mut self, renderer: Box<dyn Any>) -> Result<&mut Self> {
        match renderer.downcast::<R>() {
            Ok(renderer) => {
                self.renderer = Some(*renderer);
                Ok(self)
            }
            Err(_) => Err(FacadeError::ConfigurationType {
                key: RENDERER_KEY.to_owned(),
                expected: type_name::<R>(),
                found: "a different type".to_owned(),
            }),
        }
    }

    /// Returns `true` once the renderer exists.
    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    /// Returns the renderer, creating it from the configuration on first access.
    pub fn renderer(&mut self) -> Result<&mut R> {
        let renderer = match self.renderer.take() {
            Some(renderer) => renderer,
            None => {
                let init = self.config.renderer_init();
                let mut renderer = R::create(&init)?;
                // construction resets the orientation to portrait
                renderer.add_page(init.orientation);
                debug!(
                    "Created renderer ({} {}, orientation {})",
                    init.format, init.mode, init.orientation
                );
                renderer
            }
        };
        Ok(self.renderer.insert(renderer))
    }

    /// Resolves the markup of `section` to text.
    pub fn resolve_markup(&self, section: Section) -> Result<String> {
        self.config.markup(section).resolve(self.templates.as_ref())
    }

    /// Contents of `cssFile` when it names an existing file, otherwise the inline `css`.
    pub fn resolve_css(&self) -> Result<String> {
        if let Some(path) = &self.config.css_file {
            if path.is_file() {
                return Ok(fs::read_to_string(path)?);
            }
            warn!(
                "CSS file {} does not exist; using the inline stylesheet",
                path.display()
            );
        }
        Ok(self.config.css.clone())
    }

    fn define_template_variables(&mut self) {
        let shared = [
            ("author", Value::from(self.config.author.as_str())),
            ("pageFormat", Value::from(self.config.page_format.as_str())),
            ("pageOrientation", Value::from(self.config.page_orientation.code())),
        ];
        for (name, value) in shared {
            self.templates.define(name, value);
        }
        for (name, value) in &self.template_vars {
            self.templates.define(name, value.clone());
        }
    }

    /// Writes author, header, footer, stylesheet and body into the renderer, in that order.
    ///
    /// Header, footer and stylesheet are skipped when they are empty or only whitespace.
    pub fn apply_markup(&mut self) -> Result<()> {
        self.define_template_variables();
        let header = self.resolve_markup(Section::Header)?;
        let footer = self.resolve_markup(Section::Footer)?;
        let css = self.resolve_css()?;
        let body = self.resolve_markup(Section::Main)?;

        let author = self.config.author.clone();
        let header_first_page = self.config.header_first_page;
        let renderer = self.renderer()?;

        renderer.set_author(&author);
        if !header.trim().is_empty() {
            renderer.set_html_header(&header, header_first_page);
        }
        if !footer.trim().is_empty() {
            renderer.set_html_footer(&footer);
        }
        if css.trim().is_empty() {
            renderer.write_html(&body, WriteMode::Content)?;
        } else {
            renderer.write_html(&css, WriteMode::Style)?;
            renderer.write_html(&body, WriteMode::Content)?;
        }
        Ok(())
    }

    /// Applies the markup and writes the document to `path`.
    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<&mut Self> {
        let path = path.as_ref();
        self.apply_markup()?;
        self.renderer()?.output_to_file(path)?;
        debug!("Saved document to {}", path.display());
        Ok(self)
    }

    /// Applies the markup and returns the document addressed to a client.
    pub fn download(&mut self, filename: &str, mode: OutputMode) -> Result<DocumentResponse> {
        self.apply_markup()?;
        let bytes = self.renderer()?.output_bytes()?;
        Ok(DocumentResponse {
            filename: filename.to_owned(),
            mode,
            bytes,
        })
    }

    /// Forwards `name` to the renderer's [`invoke`](DocumentRenderer::invoke).
    ///
    /// `renderer` is the lazy construction hook and is never forwarded.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        if name == RENDERER_KEY {
            return Err(FacadeError::UnknownOperation(name.to_owned()));
        }
        self.renderer()?.invoke(name, args)
    }
}
