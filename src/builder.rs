//! Construction of `genpdf::Document` instances from page-layout settings.

use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style;
use genpdf::{Element, Margins, PageDecorator, Size};

use crate::config::Orientation;
use crate::elements::{font_size_points, mm_from_f64, mm_to_f64};
use crate::renderer::PageMargins;

/// Portrait dimensions in millimetres of the supported page formats.
///
/// Accepts a trailing `-P`/`-L` as written in some configurations (`A4-L`); the suffix is
/// ignored because orientation is configured separately.
pub fn paper_dimensions(format: &str) -> Option<(f64, f64)> {
    let format = format.trim().to_ascii_uppercase();
    let format = format
        .strip_suffix("-L")
        .or_else(|| format.strip_suffix("-P"))
        .unwrap_or(&format);
    let dimensions = match format {
        "A3" => (297.0, 420.0),
        "A4" => (210.0, 297.0),
        "A5" => (148.0, 210.0),
        "A6" => (105.0, 148.0),
        "B5" => (176.0, 250.0),
        "LETTER" => (215.9, 279.4),
        "LEGAL" => (215.9, 355.6),
        "EXECUTIVE" => (184.2, 266.7),
        _ => return None,
    };
    Some(dimensions)
}

/// Produces the header or footer element for a page number.
pub type SectionFactory = dyn Fn(usize) -> Box<dyn Element>;

struct HeaderSpec {
    show_on_first_page: bool,
    factory: Box<SectionFactory>,
}

/// Builder for `genpdf::Document` instances with HTML headers and footers.
pub struct DocumentBuilder {
    paper: (f64, f64),
    orientation: Orientation,
    margins: PageMargins,
    font_size: f64,
    header: Option<HeaderSpec>,
    footer: Option<Box<SectionFactory>>,
}

impl DocumentBuilder {
    /// Creates a builder for a portrait page of `paper` (width, height) millimetres.
    pub fn new(paper: (f64, f64), margins: PageMargins) -> Self {
        Self {
            paper,
            orientation: Orientation::Portrait,
            margins,
            font_size: 12.0,
            header: None,
            footer: None,
        }
    }

    /// Sets the page orientation.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Sets the default font size in points.
    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    /// Configures a header callback invoked for every page.
    pub fn with_header<F>(mut self, show_on_first_page: bool, header: F) -> Self
    where
        F: Fn(usize) -> Box<dyn Element> + 'static,
    {
        self.header = Some(HeaderSpec {
            show_on_first_page,
            factory: Box::new(header),
        });
        self
    }

    /// Configures a footer callback invoked for every page.
    pub fn with_footer<F>(mut self, footer: F) -> Self
    where
        F: Fn(usize) -> Box<dyn Element> + 'static,
    {
        self.footer = Some(Box::new(footer));
        self
    }

    /// Page size after applying the orientation.
    pub fn page_size(&self) -> (f64, f64) {
        let (width, height) = self.paper;
        match self.orientation {
            Orientation::Portrait => (width, height),
            Orientation::Landscape => (height, width),
        }
    }

    /// Builds a fully configured `genpdf::Document` instance.
    pub fn build(self, font_family: FontFamily<FontData>) -> genpdf::Document {
        let mut document = genpdf::Document::new(font_family);

        let (width, height) = self.page_size();
        document.set_paper_size(Size::new(mm_from_f64(width), mm_from_f64(height)));
        document.set_font_size(font_size_points(self.font_size));

        let decorator = ConfiguredPageDecorator::new(self.margins, self.header, self.footer);
        document.set_page_decorator(decorator);

        document
    }
}

struct ConfiguredPageDecorator {
    page: usize,
    margins: PageMargins,
    header: Option<HeaderSpec>,
    footer: Option<Box<SectionFactory>>,
}

impl ConfiguredPageDecorator {
    fn new(
        margins: PageMargins,
        header: Option<HeaderSpec>,
        footer: Option<Box<SectionFactory>>,
    ) -> Self {
        Self {
            page: 0,
            margins,
            header,
            footer,
        }
    }

    /// Renders `element` in the horizontal band starting `top` mm below the page edge.
    fn render_band(
        &self,
        element: &mut dyn Element,
        context: &genpdf::Context,
        area: &genpdf::render::Area<'_>,
        top: f64,
        height: f64,
        style: style::Style,
        what: &str,
    ) -> Result<(), Error> {
        if height <= 0.0 {
            return Ok(());
        }

        let mut band = area.clone();
        band.add_margins(Margins::trbl(
            mm_from_f64(top),
            mm_from_f64(self.margins.right),
            0,
            mm_from_f64(self.margins.left),
        ));
        band.set_height(mm_from_f64(height));

        let result = element.render(context, band, style)?;
        if result.has_more {
            return Err(Error::new(
                format!("{} does not fit into the reserved space", what),
                ErrorKind::PageSizeExceeded,
            ));
        }
        Ok(())
    }
}

impl PageDecorator for ConfiguredPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.page += 1;
        let margins = self.margins;

        if let Some(header) = &self.header {
            if self.page > 1 || header.show_on_first_page {
                let mut element = (header.factory)(self.page);
                self.render_band(
                    element.as_mut(),
                    context,
                    &area,
                    margins.header,
                    margins.top - margins.header,
                    style,
                    "Header",
                )?;
            }
        }

        if let Some(footer) = &self.footer {
            let page_height = mm_to_f64(area.size().height);
            let mut element = footer(self.page);
            self.render_band(
                element.as_mut(),
                context,
                &area,
                page_height - margins.bottom,
                margins.bottom - margins.footer,
                style,
                "Footer",
            )?;
        }

        area.add_margins(Margins::trbl(
            mm_from_f64(margins.top),
            mm_from_f64(margins.right),
            mm_from_f64(margins.bottom),
            mm_from_f64(margins.left),
        ));

        Ok(area)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn margins() -> PageMargins {
        PageMargins {
            top: 30.0,
            right: 15.0,
            bottom: 20.0,
            left: 15.0,
            header: 5.0,
            footer: 10.0,
        }
    }

    #[test]
    fn formats_are_case_insensitive() {
        assert_eq!(paper_dimensions("a4"), Some((210.0, 297.0)));
        assert_eq!(paper_dimensions("Letter"), Some((215.9, 279.4)));
        assert_eq!(paper_dimensions("A4-L"), Some((210.0, 297.0)));
        assert_eq!(paper_dimensions("Tabloid"), None);
    }

    #[test]
    fn landscape_swaps_dimensions() {
        let builder = DocumentBuilder::new((210.0, 297.0), margins());
        assert_eq!(builder.page_size(), (210.0, 297.0));
        let builder = builder.with_orientation(Orientation::Landscape);
        assert_eq!(builder.page_size(), (297.0, 210.0));
    }
}
