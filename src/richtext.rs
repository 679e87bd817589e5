//! Conversion of HTML markup into styled blocks.
//!
//! Markup is parsed with [`kuchiki`] and flattened into a list of [`Block`]s: text blocks made of
//! styled [`Span`]s, images and explicit page breaks. The blocks keep the tag and inline
//! declarations of the element that produced them so the stylesheet can be applied when the
//! document is laid out, after every `write_html` call has been seen.

use genpdf::style::{Color, Style, StyledString};
use kuchiki::traits::TendrilSink;
use kuchiki::{NodeData, NodeRef};

use crate::css::{self, Declarations, TextAlign};

/// Placeholder replaced with the current page number in headers and footers.
pub const PAGE_NUMBER_PLACEHOLDER: &str = "{PAGENO}";

/// A slice of text together with inline style attributes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Span {
    text: String,
    bold: bool,
    italic: bool,
    color: Option<Color>,
}

impl Span {
    /// Creates a new span with the provided text and no styles applied.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Returns the raw text contained in this span.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns whether the span should be rendered in bold.
    pub fn is_bold(&self) -> bool {
        self.bold
    }

    /// Returns whether the span should be rendered in italic.
    pub fn is_italic(&self) -> bool {
        self.italic
    }

    /// Returns the configured color for the span, if any.
    pub fn color(&self) -> Option<Color> {
        self.color
    }

    fn to_style(&self) -> Style {
        let mut style = Style::new();
        if let Some(color) = self.color {
            style.set_color(color);
        }
        if self.bold {
            style.set_bold();
        }
        if self.italic {
            style.set_italic();
        }
        style
    }

    /// Converts the span to a [`StyledString`], substituting the page number placeholder.
    pub fn to_styled_string(&self, page: Option<usize>) -> StyledString {
        let text = match page {
            Some(page) if self.text.contains(PAGE_NUMBER_PLACEHOLDER) => self
                .text
                .replace(PAGE_NUMBER_PLACEHOLDER, &page.to_string()),
            _ => self.text.clone(),
        };
        StyledString::new(text, self.to_style())
    }
}

/// A run of text produced by one block-level element.
#[derive(Clone, Debug, PartialEq)]
pub struct TextBlock {
    /// Lower-case tag name of the producing element (`body` for loose text).
    pub tag: String,
    /// Declarations from the element's `style` attribute and `align` attribute.
    pub inline: Declarations,
    pub spans: Vec<Span>,
}

impl TextBlock {
    /// Concatenated text of all spans.
    pub fn text(&self) -> String {
        self.spans.iter().map(Span::text).collect()
    }
}

/// An `<img>` reference.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageRef {
    pub src: String,
    /// Requested width in CSS pixels.
    pub width_px: Option<f64>,
    pub align: Option<TextAlign>,
}

/// One unit of laid-out content.
#[derive(Clone, Debug, PartialEq)]
pub enum Block {
    Text(TextBlock),
    Image(ImageRef),
    PageBreak,
}

/// Result of parsing a markup fragment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParsedHtml {
    pub blocks: Vec<Block>,
    /// Contents of any `<style>` elements.
    pub css: String,
}

/// Parses an HTML fragment or document.
pub fn parse_html(html: &str) -> ParsedHtml {
    let document = kuchiki::parse_html().one(html);
    let mut collector = Collector::default();
    walk(&document, SpanState::default(), &mut collector);
    collector.finish()
}

const BLOCK_TAGS: &[&str] = &[
    "address",
    "article",
    "aside",
    "blockquote",
    "center",
    "dd",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "footer",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "li",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "tr",
    "ul",
];

fn is_block(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

#[derive(Clone, Copy, Debug, Default)]
struct SpanState {
    bold: bool,
    italic: bool,
    color: Option<Color>,
    preformatted: bool,
}

impl SpanState {
    fn with(mut self, declarations: &Declarations) -> Self {
        if let Some(bold) = declarations.bold {
            self.bold = bold;
        }
        if let Some(italic) = declarations.italic {
            self.italic = italic;
        }
        if declarations.color.is_some() {
            self.color = declarations.color;
        }
        self
    }

    fn to_span(self, text: String) -> Span {
        Span {
            text,
            bold: self.bold,
            italic: self.italic,
            color: self.color,
        }
    }
}

struct BlockContext {
    tag: String,
    inline: Declarations,
    ordered_items: Option<usize>,
}

#[derive(Default)]
struct Collector {
    blocks: Vec<Block>,
    contexts: Vec<BlockContext>,
    spans: Vec<Span>,
    css: String,
}

impl Collector {
    fn push_text(&mut self, text: &str, state: SpanState) {
        let text = if state.preformatted {
            text.to_owned()
        } else {
            collapse_whitespace(text)
        };

        let at_line_start = self
            .spans
            .last()
            .map_or(true, |span| span.text.ends_with(' '));
        let text = if at_line_start && !state.preformatted {
            text.trim_start().to_owned()
        } else {
            text
        };

        if !text.is_empty() {
            self.spans.push(state.to_span(text));
        }
    }

    fn open_block(&mut self, tag: &str, inline: Declarations, state: SpanState) {
        self.flush();

        if tag == "li" {
            let marker = match self
                .contexts
                .iter_mut()
                .rev()
                .find(|context| context.tag == "ol" || context.tag == "ul")
            {
                Some(BlockContext {
                    ordered_items: Some(count),
                    ..
                }) => {
                    *count += 1;
                    format!("{}. ", count)
                }
                _ => "\u{2022} ".to_owned(),
            };
            self.spans.push(state.to_span(marker));
        }

        self.contexts.push(BlockContext {
            tag: tag.to_owned(),
            inline,
            ordered_items: (tag == "ol").then_some(0),
        });
    }

    fn close_block(&mut self) {
        self.flush();
        self.contexts.pop();
    }

    fn line_break(&mut self) {
        self.flush();
    }

    fn page_break(&mut self) {
        self.flush();
        self.blocks.push(Block::PageBreak);
    }

    fn image(&mut self, image: ImageRef) {
        self.flush();
        self.blocks.push(Block::Image(image));
    }

    fn flush(&mut self) {
        let mut spans = std::mem::take(&mut self.spans);
        if let Some(last) = spans.last_mut() {
            let trimmed = last.text.trim_end().len();
            last.text.truncate(trimmed);
        }
        spans.retain(|span| !span.text.is_empty());
        if spans.is_empty() {
            return;
        }

        let (tag, inline) = match self.contexts.last() {
            Some(context) => (context.tag.clone(), context.inline),
            None => ("body".to_owned(), Declarations::default()),
        };
        self.blocks.push(Block::Text(TextBlock { tag, inline, spans }));
    }

    fn finish(mut self) -> ParsedHtml {
        self.flush();
        ParsedHtml {
            blocks: self.blocks,
            css: self.css,
        }
    }
}

fn walk(node: &NodeRef, state: SpanState, out: &mut Collector) {
    let element = match node.data() {
        NodeData::Text(text) => {
            let text = text.borrow();
            if state.preformatted {
                for (index, line) in text.split('\n').enumerate() {
                    if index > 0 {
                        out.line_break();
                    }
                    out.push_text(line, state);
                }
            } else {
                out.push_text(&text, state);
            }
            return;
        }
        NodeData::Element(element) => element,
        NodeData::Document(_) | NodeData::DocumentFragment => {
            for child in node.children() {
                walk(&child, state, out);
            }
            return;
        }
        _ => return,
    };

    let tag = element.name.local.as_ref().to_ascii_lowercase();
    let attributes = element.attributes.borrow();

    match tag.as_str() {
        "script" | "title" | "noscript" | "template" => return,
        "style" => {
            out.css.push_str(&node.text_contents());
            out.css.push('\n');
            return;
        }
        "br" => {
            out.line_break();
            return;
        }
        "img" => {
            if let Some(src) = attributes.get("src") {
                let inline = attributes
                    .get("style")
                    .map(css::parse_declarations)
                    .unwrap_or_default();
                out.image(ImageRef {
                    src: src.to_owned(),
                    width_px: attributes
                        .get("width")
                        .and_then(|w| w.trim().trim_end_matches("px").parse().ok()),
                    align: inline.align.or_else(|| align_attribute(attributes.get("align"))),
                });
            }
            return;
        }
        // explicit page break; the parser nests the following content inside it
        "pagebreak" => out.page_break(),
        _ => {}
    }

    let mut inline = attributes
        .get("style")
        .map(css::parse_declarations)
        .unwrap_or_default();
    if inline.align.is_none() {
        inline.align = align_attribute(attributes.get("align"));
    }
    drop(attributes);

    let block = is_block(&tag);
    let mut child_state = if block {
        state.with(&inline)
    } else {
        state.with(&Declarations::for_tag(&tag)).with(&inline)
    };
    if tag == "pre" {
        child_state.preformatted = true;
    }

    if block {
        out.open_block(&tag, inline, state);
    } else if matches!(tag.as_str(), "td" | "th") && !out.spans.is_empty() {
        out.push_text(" ", child_state);
    }

    for child in node.children() {
        walk(&child, child_state, out);
    }

    if block {
        out.close_block();
    }
}

fn align_attribute(value: Option<&str>) -> Option<TextAlign> {
    match value?.trim().to_ascii_lowercase().as_str() {
        "left" => Some(TextAlign::Left),
        "center" => Some(TextAlign::Center),
        "right" => Some(TextAlign::Right),
        _ => None,
    }
}

fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_space = false;
    for ch in text.chars() {
        if ch.is_whitespace() {
            if !previous_space {
                out.push(' ');
            }
            previous_space = true;
        } else {
            out.push(ch);
            previous_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_blocks(parsed: &ParsedHtml) -> Vec<(String, String)> {
        parsed
            .blocks
            .iter()
            .filter_map(|block| match block {
                Block::Text(text) => Some((text.tag.clone(), text.text())),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn paragraphs_and_headings_become_blocks() {
        let parsed = parse_html("<h1>Title</h1>\n<p>First   line</p><p>Second</p>");
        assert_eq!(
            text_blocks(&parsed),
            vec![
                ("h1".to_owned(), "Title".to_owned()),
                ("p".to_owned(), "First line".to_owned()),
                ("p".to_owned(), "Second".to_owned()),
            ]
        );
    }

    #[test]
    fn inline_tags_style_spans() {
        let parsed = parse_html("<p>Plain <b>bold <i>both</i></b> <span style=\"color:#ff0000\">red</span></p>");
        let Some(Block::Text(block)) = parsed.blocks.first() else {
            panic!("expected a text block");
        };
        let styled: Vec<_> = block
            .spans
            .iter()
            .map(|span| (span.text(), span.is_bold(), span.is_italic()))
            .collect();
        assert_eq!(styled[0], ("Plain ", false, false));
        assert_eq!(styled[1], ("bold ", true, false));
        assert_eq!(styled[2], ("both", true, true));
        let red = block.spans.iter().find(|s| s.text() == "red").expect("red span");
        assert_eq!(red.color(), Some(Color::Rgb(255, 0, 0)));
    }

    #[test]
    fn lists_get_markers() {
        let parsed = parse_html("<ol><li>one</li><li>two</li></ol><ul><li>dot</li></ul>");
        let texts: Vec<_> = text_blocks(&parsed).into_iter().map(|(_, t)| t).collect();
        assert_eq!(texts, vec!["1. one", "2. two", "\u{2022} dot"]);
    }

    #[test]
    fn style_elements_are_collected_not_rendered() {
        let parsed = parse_html("<style>p { color: red }</style><p>Body</p>");
        assert!(parsed.css.contains("color: red"));
        assert_eq!(text_blocks(&parsed).len(), 1);
    }

    #[test]
    fn page_breaks_and_images() {
        let parsed = parse_html("<p>a</p><pagebreak /><p>b</p><img src=\"logo.png\" width=\"120\">");
        assert!(matches!(parsed.blocks[1], Block::PageBreak));
        assert!(parsed.blocks.iter().any(|block| matches!(
            block,
            Block::Image(ImageRef { src, width_px: Some(w), .. }) if src == "logo.png" && *w == 120.0
        )));
    }

    #[test]
    fn loose_text_belongs_to_body() {
        let parsed = parse_html("Just text<br>and more");
        assert_eq!(
            text_blocks(&parsed),
            vec![
                ("body".to_owned(), "Just text".to_owned()),
                ("body".to_owned(), "and more".to_owned()),
            ]
        );
    }

    #[test]
    fn page_number_placeholder_is_substituted() {
        let span = Span::new("Page {PAGENO}");
        assert_eq!(span.to_styled_string(Some(4)).s, "Page 4");
        assert_eq!(span.to_styled_string(None).s, "Page {PAGENO}");
    }
}
