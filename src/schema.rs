//! Declarative description of the configuration options.
//!
//! Settings screens and the `schema` command of the CLI render this list; nothing here affects
//! rendering.

use std::fmt;

use crate::config::{ConfigKey, RenderConfiguration, DEFAULT_CONFIGURATION};
use crate::value::Value;

/// Input kind of a configuration field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Float,
    Integer,
    Checkbox,
    /// One of the listed values.
    Choice(&'static [&'static str]),
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => f.write_str("text"),
            FieldKind::Float => f.write_str("float"),
            FieldKind::Integer => f.write_str("integer"),
            FieldKind::Checkbox => f.write_str("checkbox"),
            FieldKind::Choice(options) => write!(f, "choice({})", options.join("|")),
        }
    }
}

/// One configuration option with its current and default value.
#[derive(Clone, Debug, PartialEq)]
pub struct ConfigField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub value: Value,
    pub default: Value,
    pub notes: &'static str,
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<16} {:<14} {} = {:?} (default {:?})",
            self.name, self.kind, self.label, self.value.to_string(), self.default.to_string()
        )?;
        if !self.notes.is_empty() {
            write!(f, "\n{:<16} {}", "", self.notes)?;
        }
        Ok(())
    }
}

const PAGE_FORMATS: &[&str] = &["A3", "A4", "A5", "A6", "B5", "Letter", "Legal", "Executive"];
const ORIENTATIONS: &[&str] = &["P", "L"];

fn describe(key: ConfigKey) -> (&'static str, FieldKind, &'static str) {
    match key {
        ConfigKey::Mode => (
            "Mode",
            FieldKind::Text,
            "\"c\" uses the PDF core fonts; any other value embeds the font files.",
        ),
        ConfigKey::PageOrientation => ("Page orientation", FieldKind::Choice(ORIENTATIONS), ""),
        ConfigKey::PageFormat => ("Page format", FieldKind::Choice(PAGE_FORMATS), ""),
        ConfigKey::TopMargin => ("Top margin", FieldKind::Float, "Millimetres."),
        ConfigKey::RightMargin => ("Right margin", FieldKind::Float, "Millimetres."),
        ConfigKey::BottomMargin => ("Bottom margin", FieldKind::Float, "Millimetres."),
        ConfigKey::LeftMargin => ("Left margin", FieldKind::Float, "Millimetres."),
        ConfigKey::HeaderMargin => (
            "Header margin",
            FieldKind::Float,
            "Distance from the top edge to the header, in millimetres.",
        ),
        ConfigKey::FooterMargin => (
            "Footer margin",
            FieldKind::Float,
            "Distance from the bottom edge to the footer, in millimetres.",
        ),
        ConfigKey::Font => ("Font", FieldKind::Text, "Font family name."),
        ConfigKey::FontSize => ("Font size", FieldKind::Float, "Points."),
        ConfigKey::Author => ("Author", FieldKind::Text, "Stored in the document metadata."),
        ConfigKey::HeaderFirstPage => ("Header on first page", FieldKind::Checkbox, ""),
        ConfigKey::CssFile => (
            "CSS file",
            FieldKind::Text,
            "Path of a stylesheet. Takes precedence over the inline CSS.",
        ),
        ConfigKey::Css => ("CSS", FieldKind::Text, "Used when no CSS file is set."),
        ConfigKey::MarkupMain => (
            "Body markup",
            FieldKind::Text,
            "HTML, or the path of a template file.",
        ),
        ConfigKey::MarkupHeader => (
            "Header markup",
            FieldKind::Text,
            "HTML, or the path of a template file. {PAGENO} is replaced by the page number.",
        ),
        ConfigKey::MarkupFooter => (
            "Footer markup",
            FieldKind::Text,
            "HTML, or the path of a template file. {PAGENO} is replaced by the page number.",
        ),
    }
}

fn default_value(key: ConfigKey) -> Value {
    let defaults = &DEFAULT_CONFIGURATION;
    match key {
        ConfigKey::Mode => defaults.mode.into(),
        ConfigKey::PageOrientation => defaults.page_orientation.code().into(),
        ConfigKey::PageFormat => defaults.page_format.into(),
        ConfigKey::TopMargin => defaults.top_margin.into(),
        ConfigKey::RightMargin => defaults.right_margin.into(),
        ConfigKey::BottomMargin => defaults.bottom_margin.into(),
        ConfigKey::LeftMargin => defaults.left_margin.into(),
        ConfigKey::HeaderMargin => defaults.header_margin.into(),
        ConfigKey::FooterMargin => defaults.footer_margin.into(),
        ConfigKey::Font => defaults.font.into(),
        ConfigKey::FontSize => defaults.font_size.into(),
        ConfigKey::Author => defaults.author.into(),
        ConfigKey::HeaderFirstPage => defaults.header_first_page.into(),
        ConfigKey::Css => defaults.css.into(),
        ConfigKey::CssFile
        | ConfigKey::MarkupMain
        | ConfigKey::MarkupHeader
        | ConfigKey::MarkupFooter => "".into(),
    }
}

/// Describes every declared option with its value in `config`.
pub fn config_fields(config: &RenderConfiguration) -> Vec<ConfigField> {
    ConfigKey::ALL
        .into_iter()
        .map(|key| {
            let (label, kind, notes) = describe(key);
            ConfigField {
                name: key.name(),
                label,
                kind,
                value: config.get(key.name()).unwrap_or_default(),
                default: default_value(key),
                notes,
            }
        })
        .collect()
}
