//! genpdf elements built from parsed markup blocks.
//!
//! Text blocks become styled paragraphs, `<img>` references become scaled images and page breaks
//! map onto [`genpdf::elements::PageBreak`]. Headers and footers stack their blocks in a vertical
//! [`LinearLayout`].

use std::path::{Path, PathBuf};

use image::GenericImageView;
use log::warn;

use genpdf::elements::{Image, LinearLayout, PaddedElement, PageBreak, Paragraph, StyledElement};
use genpdf::error::{Context as _, Error};
use genpdf::style::Style;
use genpdf::{render, Element, Margins, Mm, RenderResult, Scale, Size};

use crate::css::{Declarations, Stylesheet, TextAlign};
use crate::richtext::{Block, ImageRef, TextBlock};

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const CSS_PIXELS_PER_INCH: f64 = 96.0;
const MM_PER_INCH: f64 = 25.4;
const BLOCK_SPACING_MM: f64 = 1.5;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn estimated_image_size(image: &image::DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Loads an image from the given path using the [`image`] crate with descriptive errors.
pub fn decode_image_from_path(path: impl AsRef<Path>) -> Result<image::DynamicImage, Error> {
    let path = path.as_ref();
    let reader = image::io::Reader::open(path)
        .with_context(|| format!("Failed to open image file {}", path.display()))?;
    reader
        .with_guessed_format()
        .context("Unable to determine image format")?
        .decode()
        .with_context(|| format!("Failed to decode image file {}", path.display()))
}

/// Clamps a point size to the range genpdf accepts.
pub fn font_size_points(size: f64) -> u8 {
    size.round().clamp(1.0, u8::MAX as f64) as u8
}

/// Inputs shared by every element built for one layout pass.
#[derive(Clone, Copy, Debug)]
pub struct LayoutContext<'a> {
    pub stylesheet: &'a Stylesheet,
    /// Configured default font size in points.
    pub base_font_size: f64,
    /// Page number substituted into `{PAGENO}`, when known.
    pub page: Option<usize>,
}

impl LayoutContext<'_> {
    /// Declarations of the `body` element; inherited by every block.
    fn body(&self) -> Declarations {
        self.stylesheet.compute("body", &Declarations::default())
    }

    /// Font size of the `body` element in points.
    pub fn body_font_size(&self) -> f64 {
        self.body()
            .font_size
            .map_or(self.base_font_size, |size| size.resolve(self.base_font_size))
    }
}

/// A laid-out block.
pub enum BlockElement {
    Text(PaddedElement<StyledElement<Paragraph>>),
    Image(Image),
    PageBreak(PageBreak),
}

impl BlockElement {
    /// Builds the element for `block`. Images that cannot be loaded are skipped with a warning.
    pub fn build(block: &Block, context: &LayoutContext<'_>) -> Option<Self> {
        match block {
            Block::Text(text) => Some(BlockElement::Text(text_element(text, context))),
            Block::Image(image) => image_element(image).map(BlockElement::Image),
            Block::PageBreak => Some(BlockElement::PageBreak(PageBreak::new())),
        }
    }
}

impl Element for BlockElement {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        match self {
            BlockElement::Text(element) => element.render(context, area, style),
            BlockElement::Image(element) => element.render(context, area, style),
            BlockElement::PageBreak(element) => element.render(context, area, style),
        }
    }
}

fn text_element(
    block: &TextBlock,
    context: &LayoutContext<'_>,
) -> PaddedElement<StyledElement<Paragraph>> {
    let body = context.body();
    let inherited = context.body_font_size();
    let computed = context.stylesheet.compute(&block.tag, &block.inline);

    let mut style = Style::new();
    let size = computed
        .font_size
        .map_or(inherited, |size| size.resolve(inherited));
    style.set_font_size(font_size_points(size));
    if computed.bold.or(body.bold).unwrap_or(false) {
        style.set_bold();
    }
    if computed.italic.or(body.italic).unwrap_or(false) {
        style.set_italic();
    }
    if let Some(color) = computed.color.or(body.color) {
        style.set_color(color);
    }

    let mut paragraph = Paragraph::default();
    for span in &block.spans {
        paragraph.push(span.to_styled_string(context.page));
    }
    let align = computed.align.or(body.align).unwrap_or(TextAlign::Left);
    paragraph.set_alignment(align.into());

    paragraph
        .styled(style)
        .padded(Margins::trbl(0, 0, mm_from_f64(BLOCK_SPACING_MM), 0))
}

fn image_path(src: &str) -> PathBuf {
    PathBuf::from(src.strip_prefix("file://").unwrap_or(src))
}

fn image_element(image: &ImageRef) -> Option<Image> {
    let path = image_path(&image.src);
    let dynamic = match decode_image_from_path(&path) {
        Ok(dynamic) => dynamic,
        Err(err) => {
            warn!("Skipping image {}: {}", path.display(), err);
            return None;
        }
    };

    let natural_size = estimated_image_size(&dynamic, DEFAULT_IMAGE_DPI);
    let mut element = match Image::from_dynamic_image(dynamic) {
        Ok(element) => element,
        Err(err) => {
            warn!("Skipping image {}: {}", path.display(), err);
            return None;
        }
    };

    if let Some(width_px) = image.width_px {
        let natural = mm_to_f64(natural_size.width);
        if natural > f64::EPSILON {
            let desired = width_px * MM_PER_INCH / CSS_PIXELS_PER_INCH;
            let scale = desired / natural;
            element.set_scale(Scale::new(scale, scale));
        }
    }
    element.set_alignment(image.align.unwrap_or(TextAlign::Left));

    Some(element)
}

/// Stacks the blocks of a header or footer. Page breaks are ignored.
pub fn section_layout(blocks: &[Block], context: &LayoutContext<'_>) -> LinearLayout {
    let mut layout = LinearLayout::vertical();
    for block in blocks {
        if matches!(block, Block::PageBreak) {
            continue;
        }
        if let Some(element) = BlockElement::build(block, context) {
            layout.push(element);
        }
    }
    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_sizes_are_clamped() {
        assert_eq!(font_size_points(11.6), 12);
        assert_eq!(font_size_points(0.2), 1);
        assert_eq!(font_size_points(900.0), 255);
    }

    #[test]
    fn body_font_size_follows_stylesheet() {
        let stylesheet = Stylesheet::parse("body { font-size: 150% }");
        let context = LayoutContext {
            stylesheet: &stylesheet,
            base_font_size: 10.0,
            page: None,
        };
        assert_eq!(context.body_font_size(), 15.0);
    }

    #[test]
    fn missing_images_are_skipped() {
        let block = Block::Image(ImageRef {
            src: "/__pdf_facade_missing__.png".into(),
            width_px: None,
            align: None,
        });
        let stylesheet = Stylesheet::default();
        let context = LayoutContext {
            stylesheet: &stylesheet,
            base_font_size: 12.0,
            page: None,
        };
        assert!(BlockElement::build(&block, &context).is_none());
    }

    #[test]
    fn aligned_images_are_built() {
        let path = std::env::temp_dir().join(format!(
            "pdf_facade_aligned_{}.png",
            std::process::id()
        ));
        image::RgbImage::new(8, 4).save(&path).expect("write test image");

        let image = ImageRef {
            src: path.display().to_string(),
            width_px: Some(16.0),
            align: Some(TextAlign::Center),
        };
        let element = image_element(&image);
        let _ = std::fs::remove_file(&path);
        assert!(element.is_some());
    }

    #[test]
    fn file_urls_are_stripped() {
        assert_eq!(image_path("file:///tmp/a.png"), PathBuf::from("/tmp/a.png"));
        assert_eq!(image_path("img/b.png"), PathBuf::from("img/b.png"));
    }
}
