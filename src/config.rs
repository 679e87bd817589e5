//! Render configuration: defaults, key/value access and TOML loading.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

use crate::error::{FacadeError, Result};
use crate::markup::{MarkupSource, Section};
use crate::renderer::{PageMargins, RendererInit};
use crate::value::Value;

/// Key reserved for the renderer instance itself.
pub const RENDERER_KEY: &str = "renderer";

/// Page orientation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum Orientation {
    /// Portrait ("P").
    #[default]
    Portrait,
    /// Landscape ("L").
    Landscape,
}

impl Orientation {
    /// Single-letter code used by the configuration store.
    pub fn code(self) -> &'static str {
        match self {
            Orientation::Portrait => "P",
            Orientation::Landscape => "L",
        }
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Orientation {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "p" | "portrait" => Ok(Orientation::Portrait),
            "l" | "landscape" => Ok(Orientation::Landscape),
            other => Err(format!("unknown orientation '{other}', expected P or L")),
        }
    }
}

impl TryFrom<String> for Orientation {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        value.parse()
    }
}

/// Default values for every option.
#[derive(Clone, Copy, Debug)]
pub struct ConfigDefaults {
    pub mode: &'static str,
    pub page_orientation: Orientation,
    pub page_format: &'static str,
    pub top_margin: f64,
    pub right_margin: f64,
    pub bottom_margin: f64,
    pub left_margin: f64,
    pub header_margin: f64,
    pub footer_margin: f64,
    pub font: &'static str,
    pub font_size: f64,
    pub author: &'static str,
    pub header_first_page: bool,
    pub css: &'static str,
}

/// Defaults merged into every new configuration. Never mutated.
pub const DEFAULT_CONFIGURATION: ConfigDefaults = ConfigDefaults {
    mode: "c",
    page_orientation: Orientation::Portrait,
    page_format: "A4",
    top_margin: 30.0,
    right_margin: 15.0,
    bottom_margin: 20.0,
    left_margin: 15.0,
    header_margin: 5.0,
    footer_margin: 10.0,
    font: "Helvetica",
    font_size: 12.0,
    author: "",
    header_first_page: true,
    css: "",
};

/// Declared configuration keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    Mode,
    PageOrientation,
    PageFormat,
    TopMargin,
    RightMargin,
    BottomMargin,
    LeftMargin,
    HeaderMargin,
    FooterMargin,
    Font,
    FontSize,
    Author,
    HeaderFirstPage,
    CssFile,
    Css,
    MarkupMain,
    MarkupHeader,
    MarkupFooter,
}

impl ConfigKey {
    /// Every declared key in schema order.
    pub const ALL: [ConfigKey; 18] = [
        ConfigKey::Mode,
        ConfigKey::PageOrientation,
        ConfigKey::PageFormat,
        ConfigKey::TopMargin,
        ConfigKey::RightMargin,
        ConfigKey::BottomMargin,
        ConfigKey::LeftMargin,
        ConfigKey::HeaderMargin,
        ConfigKey::FooterMargin,
        ConfigKey::Font,
        ConfigKey::FontSize,
        ConfigKey::Author,
        ConfigKey::HeaderFirstPage,
        ConfigKey::CssFile,
        ConfigKey::Css,
        ConfigKey::MarkupMain,
        ConfigKey::MarkupHeader,
        ConfigKey::MarkupFooter,
    ];

    /// Name used in the key/value store and in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            ConfigKey::Mode => "mode",
            ConfigKey::PageOrientation => "pageOrientation",
            ConfigKey::PageFormat => "pageFormat",
            ConfigKey::TopMargin => "topMargin",
            ConfigKey::RightMargin => "rightMargin",
            ConfigKey::BottomMargin => "bottomMargin",
            ConfigKey::LeftMargin => "leftMargin",
            ConfigKey::HeaderMargin => "headerMargin",
            ConfigKey::FooterMargin => "footerMargin",
            ConfigKey::Font => "font",
            ConfigKey::FontSize => "fontSize",
            ConfigKey::Author => "author",
            ConfigKey::HeaderFirstPage => "headerFirstPage",
            ConfigKey::CssFile => "cssFile",
            ConfigKey::Css => "css",
            ConfigKey::MarkupMain => Section::Main.key(),
            ConfigKey::MarkupHeader => Section::Header.key(),
            ConfigKey::MarkupFooter => Section::Footer.key(),
        }
    }

    /// Looks up a key by its store name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.name() == name)
    }

    /// Whether changing this key affects renderer construction.
    pub fn affects_layout(self) -> bool {
        matches!(
            self,
            ConfigKey::Mode
                | ConfigKey::PageOrientation
                | ConfigKey::PageFormat
                | ConfigKey::TopMargin
                | ConfigKey::RightMargin
                | ConfigKey::BottomMargin
                | ConfigKey::LeftMargin
                | ConfigKey::HeaderMargin
                | ConfigKey::FooterMargin
                | ConfigKey::Font
                | ConfigKey::FontSize
        )
    }
}

/// Per-instance configuration of a [`RenderFacade`](crate::facade::RenderFacade).
#[derive(Clone, Debug)]
pub struct RenderConfiguration {
    pub mode: String,
    pub page_orientation: Orientation,
    pub page_format: String,
    pub top_margin: f64,
    pub right_margin: f64,
    pub bottom_margin: f64,
    pub left_margin: f64,
    pub header_margin: f64,
    pub footer_margin: f64,
    pub font: String,
    pub font_size: f64,
    pub author: String,
    pub header_first_page: bool,
    /// External stylesheet; takes precedence over [`css`](Self::css) when it exists.
    pub css_file: Option<PathBuf>,
    pub css: String,
    pub markup_main: MarkupSource,
    pub markup_header: MarkupSource,
    pub markup_footer: MarkupSource,
    extras: BTreeMap<String, Value>,
}

impl Default for RenderConfiguration {
    fn default() -> Self {
        let d = DEFAULT_CONFIGURATION;
        Self {
            mode: d.mode.to_owned(),
            page_orientation: d.page_orientation,
            page_format: d.page_format.to_owned(),
            top_margin: d.top_margin,
            right_margin: d.right_margin,
            bottom_margin: d.bottom_margin,
            left_margin: d.left_margin,
            header_margin: d.header_margin,
            footer_margin: d.footer_margin,
            font: d.font.to_owned(),
            font_size: d.font_size,
            author: d.author.to_owned(),
            header_first_page: d.header_first_page,
            css_file: None,
            css: d.css.to_owned(),
            markup_main: MarkupSource::Empty,
            markup_header: MarkupSource::Empty,
            markup_footer: MarkupSource::Empty,
            extras: BTreeMap::new(),
        }
    }
}

/// Partial configuration as read from a TOML file; absent keys keep their defaults.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigOverrides {
    pub mode: Option<String>,
    pub page_orientation: Option<Orientation>,
    pub page_format: Option<String>,
    pub top_margin: Option<f64>,
    pub right_margin: Option<f64>,
    pub bottom_margin: Option<f64>,
    pub left_margin: Option<f64>,
    pub header_margin: Option<f64>,
    pub footer_margin: Option<f64>,
    pub font: Option<String>,
    pub font_size: Option<f64>,
    pub author: Option<String>,
    pub header_first_page: Option<bool>,
    pub css_file: Option<String>,
    pub css: Option<String>,
    pub markup_main: Option<String>,
    pub markup_header: Option<String>,
    pub markup_footer: Option<String>,
    #[serde(flatten)]
    pub extras: BTreeMap<String, Value>,
}

impl RenderConfiguration {
    /// Creates a configuration holding the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merges `overrides` over the defaults.
    pub fn merged(overrides: ConfigOverrides) -> Self {
        let base = Self::default();
        Self {
            mode: overrides.mode.unwrap_or(base.mode),
            page_orientation: overrides.page_orientation.unwrap_or(base.page_orientation),
            page_format: overrides.page_format.unwrap_or(base.page_format),
            top_margin: overrides.top_margin.unwrap_or(base.top_margin),
            right_margin: overrides.right_margin.unwrap_or(base.right_margin),
            bottom_margin: overrides.bottom_margin.unwrap_or(base.bottom_margin),
            left_margin: overrides.left_margin.unwrap_or(base.left_margin),
            header_margin: overrides.header_margin.unwrap_or(base.header_margin),
            footer_margin: overrides.footer_margin.unwrap_or(base.footer_margin),
            font: overrides.font.unwrap_or(base.font),
            font_size: overrides.font_size.unwrap_or(base.font_size),
            author: overrides.author.unwrap_or(base.author),
            header_first_page: overrides
                .header_first_page
                .unwrap_or(base.header_first_page),
            css_file: overrides.css_file.and_then(non_empty_path),
            css: overrides.css.unwrap_or(base.css),
            markup_main: overrides.markup_main.map_or(base.markup_main, Into::into),
            markup_header: overrides
                .markup_header
                .map_or(base.markup_header, Into::into),
            markup_footer: overrides
                .markup_footer
                .map_or(base.markup_footer, Into::into),
            extras: overrides.extras,
        }
    }

    /// Parses a TOML document using the camelCase option names.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let overrides: ConfigOverrides = toml::from_str(source)?;
        Ok(Self::merged(overrides))
    }

    /// Loads a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Returns the value stored under `key`; unknown keys are looked up in the extras store.
    pub fn get(&self, key: &str) -> Option<Value> {
        let Some(key) = ConfigKey::from_name(key) else {
            return self.extras.get(key).cloned();
        };

        let value = match key {
            ConfigKey::Mode => Value::Str(self.mode.clone()),
            ConfigKey::PageOrientation => Value::from(self.page_orientation.code()),
            ConfigKey::PageFormat => Value::Str(self.page_format.clone()),
            ConfigKey::TopMargin => Value::Float(self.top_margin),
            ConfigKey::RightMargin => Value::Float(self.right_margin),
            ConfigKey::BottomMargin => Value::Float(self.bottom_margin),
            ConfigKey::LeftMargin => Value::Float(self.left_margin),
            ConfigKey::HeaderMargin => Value::Float(self.header_margin),
            ConfigKey::FooterMargin => Value::Float(self.footer_margin),
            ConfigKey::Font => Value::Str(self.font.clone()),
            ConfigKey::FontSize => Value::Float(self.font_size),
            ConfigKey::Author => Value::Str(self.author.clone()),
            ConfigKey::HeaderFirstPage => Value::Bool(self.header_first_page),
            ConfigKey::CssFile => Value::Str(
                self.css_file
                    .as_ref()
                    .map(|path| path.display().to_string())
                    .unwrap_or_default(),
            ),
            ConfigKey::Css => Value::Str(self.css.clone()),
            ConfigKey::MarkupMain => self.markup_main.to_value(),
            ConfigKey::MarkupHeader => self.markup_header.to_value(),
            ConfigKey::MarkupFooter => self.markup_footer.to_value(),
        };
        Some(value)
    }

    /// Stores `value` under `key`, coercing it to the option's type.
    ///
    /// Unknown keys are kept in the extras store. The reserved `renderer` key cannot hold a plain
    /// value and is rejected with [`FacadeError::ConfigurationType`].
    pub fn set(&mut self, key: &str, value: impl Into<Value>) -> Result<()> {
        let value = value.into();
        if key == RENDERER_KEY {
            return Err(FacadeError::ConfigurationType {
                key: key.to_owned(),
                expected: "renderer instance",
                found: value.kind().to_owned(),
            });
        }

        let Some(config_key) = ConfigKey::from_name(key) else {
            self.extras.insert(key.to_owned(), value);
            return Ok(());
        };

        match config_key {
            ConfigKey::Mode => self.mode = expect_string(key, value)?,
            ConfigKey::PageOrientation => {
                let text = expect_string(key, value)?;
                self.page_orientation = text
                    .parse()
                    .map_err(|reason| FacadeError::invalid_value(key, reason))?;
            }
            ConfigKey::PageFormat => self.page_format = expect_string(key, value)?,
            ConfigKey::TopMargin => self.top_margin = expect_number(key, &value)?,
            ConfigKey::RightMargin => self.right_margin = expect_number(key, &value)?,
            ConfigKey::BottomMargin => self.bottom_margin = expect_number(key, &value)?,
            ConfigKey::LeftMargin => self.left_margin = expect_number(key, &value)?,
            ConfigKey::HeaderMargin => self.header_margin = expect_number(key, &value)?,
            ConfigKey::FooterMargin => self.footer_margin = expect_number(key, &value)?,
            ConfigKey::Font => self.font = expect_string(key, value)?,
            ConfigKey::FontSize => self.font_size = expect_number(key, &value)?,
            ConfigKey::Author => self.author = expect_string(key, value)?,
            ConfigKey::HeaderFirstPage => {
                self.header_first_page = value.as_bool().ok_or_else(|| {
                    FacadeError::invalid_value(key, format!("expected a flag, got {}", value.kind()))
                })?;
            }
            ConfigKey::CssFile => self.css_file = non_empty_path(expect_string(key, value)?),
            ConfigKey::Css => self.css = expect_string(key, value)?,
            ConfigKey::MarkupMain => self.markup_main = value.into(),
            ConfigKey::MarkupHeader => self.markup_header = value.into(),
            ConfigKey::MarkupFooter => self.markup_footer = value.into(),
        }
        Ok(())
    }

    /// Replaces the markup source of `section`.
    pub fn set_markup(&mut self, section: Section, source: impl Into<MarkupSource>) {
        let source = source.into();
        match section {
            Section::Main => self.markup_main = source,
            Section::Header => self.markup_header = source,
            Section::Footer => self.markup_footer = source,
        }
    }

    /// Returns the markup source of `section`.
    pub fn markup(&self, section: Section) -> &MarkupSource {
        match section {
            Section::Main => &self.markup_main,
            Section::Header => &self.markup_header,
            Section::Footer => &self.markup_footer,
        }
    }

    /// Values stored under undeclared keys.
    pub fn extras(&self) -> &BTreeMap<String, Value> {
        &self.extras
    }

    /// Initialization parameters handed to the renderer constructor.
    pub fn renderer_init(&self) -> RendererInit {
        RendererInit {
            mode: self.mode.clone(),
            format: self.page_format.clone(),
            default_font_size: self.font_size,
            font: self.font.clone(),
            margins: PageMargins {
                top: self.top_margin,
                right: self.right_margin,
                bottom: self.bottom_margin,
                left: self.left_margin,
                header: self.header_margin,
                footer: self.footer_margin,
            },
            orientation: self.page_orientation,
        }
    }

    /// Builder-style setter for the orientation.
    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.page_orientation = orientation;
        self
    }

    /// Builder-style setter for the page format.
    pub fn with_page_format(mut self, format: impl Into<String>) -> Self {
        self.page_format = format.into();
        self
    }

    /// Builder-style setter for a markup section.
    pub fn with_markup(mut self, section: Section, source: impl Into<MarkupSource>) -> Self {
        self.set_markup(section, source);
        self
    }
}

fn non_empty_path(path: String) -> Option<PathBuf> {
    if path.trim().is_empty() {
        None
    } else {
        Some(PathBuf::from(path))
    }
}

fn expect_string(key: &str, value: Value) -> Result<String> {
    match value {
        Value::Str(s) => Ok(s),
        Value::Null => Ok(String::new()),
        Value::Int(_) | Value::Float(_) | Value::Bool(_) => Ok(value.to_string()),
        Value::Bytes(_) => Err(FacadeError::invalid_value(key, "expected text, got bytes")),
    }
}

fn expect_number(key: &str, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .filter(|number| number.is_finite())
        .ok_or_else(|| FacadeError::invalid_value(key, format!("expected a number, got '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_constant() {
        let config = RenderConfiguration::default();
        assert_eq!(config.mode, "c");
        assert_eq!(config.page_orientation, Orientation::Portrait);
        assert_eq!(config.page_format, "A4");
        assert_eq!(
            (config.top_margin, config.right_margin, config.bottom_margin, config.left_margin),
            (30.0, 15.0, 20.0, 15.0)
        );
        assert_eq!((config.header_margin, config.footer_margin), (5.0, 10.0));
        assert_eq!(config.font, "Helvetica");
        assert_eq!(config.font_size, 12.0);
        assert!(config.header_first_page);
        assert!(config.css_file.is_none());
    }

    #[test]
    fn set_coerces_declared_keys() {
        let mut config = RenderConfiguration::default();
        config.set("topMargin", "42").expect("numeric string");
        config.set("fontSize", Value::Int(9)).expect("integer");
        config.set("headerFirstPage", "0").expect("flag");
        config.set("pageOrientation", "landscape").expect("orientation");

        assert_eq!(config.get("topMargin"), Some(Value::Float(42.0)));
        assert_eq!(config.get("fontSize"), Some(Value::Float(9.0)));
        assert_eq!(config.get("headerFirstPage"), Some(Value::Bool(false)));
        assert_eq!(config.get("pageOrientation"), Some(Value::from("L")));
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let mut config = RenderConfiguration::default();
        let err = config.set("leftMargin", "wide").unwrap_err();
        assert!(matches!(err, FacadeError::InvalidValue { ref key, .. } if key == "leftMargin"));
        assert_eq!(config.left_margin, 15.0);
    }

    #[test]
    fn unknown_keys_pass_through() {
        let mut config = RenderConfiguration::default();
        config.set("moduleVersion", Value::Int(3)).expect("extras");
        assert_eq!(config.get("moduleVersion"), Some(Value::Int(3)));
        assert_eq!(config.get("neverSet"), None);
    }

    #[test]
    fn renderer_key_rejects_plain_values() {
        let mut config = RenderConfiguration::default();
        let err = config.set(RENDERER_KEY, "not a renderer").unwrap_err();
        assert!(matches!(err, FacadeError::ConfigurationType { .. }));
    }

    #[test]
    fn empty_css_file_means_absent() {
        let mut config = RenderConfiguration::default();
        config.set("cssFile", "styles/print.css").expect("path");
        assert_eq!(config.css_file, Some(PathBuf::from("styles/print.css")));
        config.set("cssFile", "").expect("clear");
        assert_eq!(config.css_file, None);
    }

    #[test]
    fn toml_overrides_merge_over_defaults() {
        let config = RenderConfiguration::from_toml_str(
            r#"
                pageOrientation = "L"
                pageFormat = "Letter"
                topMargin = 12.5
                author = "Docs Team"
                markupHeader = "<p>Header</p>"
                customerId = 77
            "#,
        )
        .expect("parse");

        assert_eq!(config.page_orientation, Orientation::Landscape);
        assert_eq!(config.page_format, "Letter");
        assert_eq!(config.top_margin, 12.5);
        assert_eq!(config.bottom_margin, 20.0);
        assert_eq!(config.author, "Docs Team");
        assert_eq!(config.get("markupHeader"), Some(Value::from("<p>Header</p>")));
        assert_eq!(config.get("customerId"), Some(Value::Int(77)));
    }

    #[test]
    fn bad_orientation_in_toml_fails() {
        let err = RenderConfiguration::from_toml_str("pageOrientation = \"sideways\"").unwrap_err();
        assert!(matches!(err, FacadeError::Config(_)));
    }

    #[test]
    fn renderer_init_carries_layout_options() {
        let config = RenderConfiguration::default()
            .with_orientation(Orientation::Landscape)
            .with_page_format("A5");
        let init = config.renderer_init();
        assert_eq!(init.format, "A5");
        assert_eq!(init.orientation, Orientation::Landscape);
        assert_eq!(init.margins.top, 30.0);
        assert_eq!(init.margins.footer, 10.0);
        assert_eq!(init.default_font_size, 12.0);
    }
}
