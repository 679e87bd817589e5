//! Core entry point for the pdf_facade crate.
//!
//! [`RenderFacade`] collects page-layout options and header, footer and body markup, builds a
//! [`DocumentRenderer`] on first use and writes the markup into it before saving or streaming the
//! document. [`GenpdfRenderer`] is the bundled renderer.

pub mod builder;
pub mod config;
pub mod css;
pub mod elements;
pub mod error;
pub mod facade;
pub mod fonts;
pub mod genpdf_renderer;
pub mod markup;
pub mod metadata;
pub mod renderer;
pub mod richtext;
pub mod schema;
pub mod template;
pub mod value;

pub use config::{ConfigOverrides, Orientation, RenderConfiguration, DEFAULT_CONFIGURATION};
pub use error::{FacadeError, Result};
pub use facade::{DocumentResponse, OutputMode, RenderFacade};
pub use genpdf_renderer::GenpdfRenderer;
pub use markup::{MarkupSource, Section};
pub use renderer::{DocumentRenderer, PageMargins, RendererInit, WriteMode};
pub use schema::{config_fields, ConfigField, FieldKind};
pub use template::{FileTemplateLoader, RenderableTemplate, TemplateFile, TemplateLoader};
pub use value::Value;
