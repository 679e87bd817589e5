//! Interface of the document renderer driven by the facade.
//!
//! The facade never talks to a PDF library directly. Everything it needs is listed on
//! [`DocumentRenderer`]; operations outside that list are reachable through the
//! [`invoke`](DocumentRenderer::invoke) escape hatch.

use std::any::Any;
use std::fmt;
use std::path::Path;

use crate::config::Orientation;
use crate::error::{FacadeError, Result};
use crate::value::Value;

/// Page margins in millimetres.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageMargins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
    /// Distance from the top edge to the header.
    pub header: f64,
    /// Distance from the bottom edge to the footer.
    pub footer: f64,
}

/// Parameters handed to [`DocumentRenderer::create`].
#[derive(Clone, Debug, PartialEq)]
pub struct RendererInit {
    pub mode: String,
    pub format: String,
    pub default_font_size: f64,
    pub font: String,
    pub margins: PageMargins,
    pub orientation: Orientation,
}

/// How [`DocumentRenderer::write_html`] interprets its input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// The input is a stylesheet.
    Style,
    /// The input is body markup.
    Content,
}

impl fmt::Display for WriteMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteMode::Style => f.write_str("style"),
            WriteMode::Content => f.write_str("content"),
        }
    }
}

impl WriteMode {
    /// Parses the names accepted by pass-through calls.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "style" | "css" | "1" => Some(WriteMode::Style),
            "content" | "html" | "body" | "2" => Some(WriteMode::Content),
            _ => None,
        }
    }
}

/// A PDF renderer configured from a [`RendererInit`] and fed HTML.
///
/// Renderers accumulate state: headers, footers and body content written into an instance stay
/// there for every later output.
pub trait DocumentRenderer: Any {
    /// Constructs a renderer.
    ///
    /// Implementations may ignore `init.orientation`; callers apply it with
    /// [`add_page`](Self::add_page) right after construction.
    fn create(init: &RendererInit) -> Result<Self>
    where
        Self: Sized;

    /// Orientation of the current page.
    fn orientation(&self) -> Orientation;

    /// Starts a new page with the given orientation.
    fn add_page(&mut self, orientation: Orientation);

    /// Sets the author document metadata.
    fn set_author(&mut self, author: &str);

    /// Installs the page header.
    fn set_html_header(&mut self, html: &str, show_on_first_page: bool);

    /// Installs the page footer.
    fn set_html_footer(&mut self, html: &str);

    /// Writes a stylesheet or body markup.
    fn write_html(&mut self, html: &str, mode: WriteMode) -> Result<()>;

    /// Number of pages the document currently lays out to.
    fn page_count(&mut self) -> Result<usize>;

    /// Writes the document to `path`.
    fn output_to_file(&mut self, path: &Path) -> Result<()>;

    /// Returns the document as bytes.
    fn output_bytes(&mut self) -> Result<Vec<u8>>;

    /// Runs an operation by name.
    ///
    /// The default exposes nothing and fails with [`FacadeError::UnknownOperation`].
    fn invoke(&mut self, operation: &str, args: &[Value]) -> Result<Value> {
        let _ = args;
        Err(FacadeError::UnknownOperation(operation.to_owned()))
    }
}

/// Returns the argument at `index` as text.
pub fn string_arg<'a>(operation: &str, args: &'a [Value], index: usize) -> Result<&'a str> {
    args.get(index).and_then(Value::as_str).ok_or_else(|| {
        FacadeError::invalid_value(
            operation,
            format!("argument {index} must be a string"),
        )
    })
}
