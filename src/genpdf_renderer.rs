//! [`DocumentRenderer`] implementation backed by `genpdf`.
//!
//! Markup is parsed as it is written and kept as blocks; layout happens when output is
//! requested. The rendered bytes are cached until the next mutation.

use std::fs;
use std::path::Path;
use std::rc::Rc;

use genpdf::Element;
use log::debug;

use crate::builder::{paper_dimensions, DocumentBuilder};
use crate::config::Orientation;
use crate::css::Stylesheet;
use crate::elements::{section_layout, BlockElement, LayoutContext};
use crate::error::{FacadeError, Result};
use crate::fonts;
use crate::metadata;
use crate::renderer::{string_arg, DocumentRenderer, RendererInit, WriteMode};
use crate::richtext::{parse_html, Block};
use crate::value::Value;

struct HeaderContent {
    blocks: Vec<Block>,
    show_on_first_page: bool,
}

/// Renders HTML to PDF with `genpdf`.
pub struct GenpdfRenderer {
    init: RendererInit,
    paper: (f64, f64),
    orientation: Orientation,
    author: String,
    header: Option<HeaderContent>,
    footer: Option<Vec<Block>>,
    stylesheet: Stylesheet,
    body: Vec<Block>,
    rendered: Option<Vec<u8>>,
}

impl GenpdfRenderer {
    /// Parameters the renderer was created with.
    pub fn init(&self) -> &RendererInit {
        &self.init
    }

    /// Author written into the document information dictionary.
    pub fn author(&self) -> &str {
        &self.author
    }

    /// Body blocks written so far.
    pub fn body(&self) -> &[Block] {
        &self.body
    }

    /// Stylesheet accumulated from style writes and `<style>` elements.
    pub fn stylesheet(&self) -> &Stylesheet {
        &self.stylesheet
    }

    fn invalidate(&mut self) {
        self.rendered = None;
    }

    fn render_document(&self) -> Result<Vec<u8>> {
        let family = fonts::load_font_family(&self.init.font, &self.init.mode)?;
        let stylesheet = Rc::new(self.stylesheet.clone());
        let base_font_size = self.init.default_font_size;
        let body_context = LayoutContext {
            stylesheet: &stylesheet,
            base_font_size,
            page: None,
        };

        let mut builder = DocumentBuilder::new(self.paper, self.init.margins)
            .with_orientation(self.orientation)
            .with_font_size(body_context.body_font_size());

        if let Some(header) = &self.header {
            let blocks = header.blocks.clone();
            let stylesheet = Rc::clone(&stylesheet);
            builder = builder.with_header(header.show_on_first_page, move |page| {
                let context = LayoutContext {
                    stylesheet: &stylesheet,
                    base_font_size,
                    page: Some(page),
                };
                Box::new(section_layout(&blocks, &context)) as Box<dyn Element>
            });
        }

        if let Some(footer) = &self.footer {
            let blocks = footer.clone();
            let stylesheet = Rc::clone(&stylesheet);
            builder = builder.with_footer(move |page| {
                let context = LayoutContext {
                    stylesheet: &stylesheet,
                    base_font_size,
                    page: Some(page),
                };
                Box::new(section_layout(&blocks, &context)) as Box<dyn Element>
            });
        }

        let mut document = builder.build(family);
        for block in &self.body {
            if let Some(element) = BlockElement::build(block, &body_context) {
                document.push(element);
            }
        }

        let mut bytes = Vec::new();
        document.render(&mut bytes)?;

        if self.author.is_empty() {
            Ok(bytes)
        } else {
            metadata::set_author(&bytes, &self.author)
        }
    }

    fn rendered_bytes(&mut self) -> Result<&[u8]> {
        let bytes = match self.rendered.take() {
            Some(bytes) => bytes,
            None => self.render_document()?,
        };
        let bytes: &[u8] = self.rendered.insert(bytes);
        Ok(bytes)
    }
}

impl DocumentRenderer for GenpdfRenderer {
    /// Creates a portrait renderer; `init.orientation` is not applied here.
    fn create(init: &RendererInit) -> Result<Self> {
        let paper = paper_dimensions(&init.format).ok_or_else(|| {
            FacadeError::invalid_value(
                "pageFormat",
                format!("unknown page format '{}'", init.format),
            )
        })?;

        Ok(Self {
            init: init.clone(),
            paper,
            orientation: Orientation::Portrait,
            author: String::new(),
            header: None,
            footer: None,
            stylesheet: Stylesheet::default(),
            body: Vec::new(),
            rendered: None,
        })
    }

    fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// genpdf uses one paper size for the whole document, so the orientation of the last page
    /// added applies to every page.
    fn add_page(&mut self, orientation: Orientation) {
        if self.orientation != orientation {
            debug!("Switching document orientation to {}", orientation);
        }
        self.orientation = orientation;
        if !self.body.is_empty() {
            self.body.push(Block::PageBreak);
        }
        self.invalidate();
    }

    fn set_author(&mut self, author: &str) {
        self.author = author.to_owned();
        self.invalidate();
    }

    fn set_html_header(&mut self, html: &str, show_on_first_page: bool) {
        let parsed = parse_html(html);
        self.stylesheet.extend(Stylesheet::parse(&parsed.css));
        self.header = Some(HeaderContent {
            blocks: parsed.blocks,
            show_on_first_page,
        });
        self.invalidate();
    }

    fn set_html_footer(&mut self, html: &str) {
        let parsed = parse_html(html);
        self.stylesheet.extend(Stylesheet::parse(&parsed.css));
        self.footer = Some(parsed.blocks);
        self.invalidate();
    }

    fn write_html(&mut self, html: &str, mode: WriteMode) -> Result<()> {
        match mode {
            WriteMode::Style => self.stylesheet.extend(Stylesheet::parse(html)),
            WriteMode::Content => {
                let parsed = parse_html(html);
                self.stylesheet.extend(Stylesheet::parse(&parsed.css));
                self.body.extend(parsed.blocks);
            }
        }
        self.invalidate();
        Ok(())
    }

    fn page_count(&mut self) -> Result<usize> {
        metadata::page_count(self.rendered_bytes()?)
    }

    fn output_to_file(&mut self, path: &Path) -> Result<()> {
        let bytes = self.rendered_bytes()?;
        fs::write(path, bytes)?;
        Ok(())
    }

    fn output_bytes(&mut self) -> Result<Vec<u8>> {
        Ok(self.rendered_bytes()?.to_vec())
    }

    fn invoke(&mut self, operation: &str, args: &[Value]) -> Result<Value> {
        match operation {
            "page_count" => Ok(Value::from(self.page_count()?)),
            "orientation" => Ok(Value::from(self.orientation.code())),
            "author" => Ok(Value::from(self.author.as_str())),
            "set_author" => {
                let author = string_arg(operation, args, 0)?;
                self.set_author(author);
                Ok(Value::Null)
            }
            "add_page" => {
                let orientation = match args.first() {
                    None => self.orientation,
                    Some(_) => string_arg(operation, args, 0)?
                        .parse()
                        .map_err(|reason| FacadeError::invalid_value(operation, reason))?,
                };
                self.add_page(orientation);
                Ok(Value::Null)
            }
            "write_html" => {
                let html = string_arg(operation, args, 0)?.to_owned();
                let mode = match args.get(1) {
                    None => WriteMode::Content,
                    Some(_) => {
                        let name = string_arg(operation, args, 1)?;
                        WriteMode::from_name(name).ok_or_else(|| {
                            FacadeError::invalid_value(
                                operation,
                                format!("unknown write mode '{}'", name),
                            )
                        })?
                    }
                };
                self.write_html(&html, mode)?;
                Ok(Value::Null)
            }
            "set_html_header" => {
                let html = string_arg(operation, args, 0)?.to_owned();
                let show_on_first_page = args.get(1).and_then(Value::as_bool).unwrap_or(true);
                self.set_html_header(&html, show_on_first_page);
                Ok(Value::Null)
            }
            "set_html_footer" => {
                let html = string_arg(operation, args, 0)?.to_owned();
                self.set_html_footer(&html);
                Ok(Value::Null)
            }
            "output_bytes" => Ok(Value::Bytes(self.output_bytes()?)),
            "output_to_file" => {
                let path = string_arg(operation, args, 0)?.to_owned();
                self.output_to_file(Path::new(&path))?;
                Ok(Value::Null)
            }
            _ => Err(FacadeError::UnknownOperation(operation.to_owned())),
        }
    }
}
