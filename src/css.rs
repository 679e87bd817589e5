//! The stylesheet subset understood by the genpdf renderer.
//!
//! Only tag selectors (`p`, `h1`, `body`, `*`, comma separated lists) are matched; rules with
//! class, id or combinator selectors are parsed and ignored. Supported properties are
//! `font-size`, `font-weight`, `font-style`, `color` and `text-align`.

use genpdf::style::Color;
use genpdf::Alignment;

/// Horizontal text alignment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

impl From<TextAlign> for Alignment {
    fn from(align: TextAlign) -> Self {
        match align {
            TextAlign::Left => Alignment::Left,
            TextAlign::Center => Alignment::Center,
            TextAlign::Right => Alignment::Right,
        }
    }
}

/// A font size as written in a stylesheet.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FontSize {
    /// Absolute size in points.
    Points(f64),
    /// Size relative to the inherited size (`em` or `%`).
    Relative(f64),
}

impl FontSize {
    /// Resolves the size against the inherited size in points.
    pub fn resolve(self, inherited: f64) -> f64 {
        match self {
            FontSize::Points(points) => points,
            FontSize::Relative(factor) => inherited * factor,
        }
    }
}

/// Declarations of one rule or one `style=""` attribute. `None` means "not set".
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Declarations {
    pub font_size: Option<FontSize>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: Option<Color>,
    pub align: Option<TextAlign>,
}

impl Declarations {
    /// Overlays `other` on top of `self`.
    pub fn apply(&mut self, other: &Declarations) {
        if other.font_size.is_some() {
            self.font_size = other.font_size;
        }
        if other.bold.is_some() {
            self.bold = other.bold;
        }
        if other.italic.is_some() {
            self.italic = other.italic;
        }
        if other.color.is_some() {
            self.color = other.color;
        }
        if other.align.is_some() {
            self.align = other.align;
        }
    }

    /// Built-in presentation of a tag before any stylesheet applies.
    pub fn for_tag(tag: &str) -> Declarations {
        let heading = |factor: f64| Declarations {
            font_size: Some(FontSize::Relative(factor)),
            bold: Some(true),
            ..Declarations::default()
        };
        match tag {
            "h1" => heading(2.0),
            "h2" => heading(1.5),
            "h3" => heading(1.17),
            "h4" => heading(1.0),
            "h5" => heading(0.83),
            "h6" => heading(0.67),
            "th" | "b" | "strong" => Declarations {
                bold: Some(true),
                ..Declarations::default()
            },
            "i" | "em" => Declarations {
                italic: Some(true),
                ..Declarations::default()
            },
            "center" => Declarations {
                align: Some(TextAlign::Center),
                ..Declarations::default()
            },
            _ => Declarations::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Rule {
    selectors: Vec<String>,
    declarations: Declarations,
}

/// Parsed stylesheet in source order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stylesheet {
    rules: Vec<Rule>,
}

impl Stylesheet {
    /// Parses stylesheet text. Malformed rules are skipped.
    pub fn parse(css: &str) -> Self {
        let css = strip_comments(css);
        let mut rules = Vec::new();
        let mut rest = css.as_str();

        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}') else {
                break;
            };
            let selector_text = &rest[..open];
            let body = &rest[open + 1..open + close];
            rest = &rest[open + close + 1..];

            // @media and friends are not supported; skip the at-rule prelude
            if selector_text.trim_start().starts_with('@') {
                continue;
            }

            let selectors = selector_text
                .split(',')
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>();
            if selectors.is_empty() {
                continue;
            }

            rules.push(Rule {
                selectors,
                declarations: parse_declarations(body),
            });
        }

        Self { rules }
    }

    /// Appends the rules of `other`; later rules win.
    pub fn extend(&mut self, other: Stylesheet) {
        self.rules.extend(other.rules);
    }

    /// Returns `true` if the stylesheet has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Declarations from every rule whose selector matches `tag`, in source order.
    pub fn matching(&self, tag: &str) -> Declarations {
        let mut result = Declarations::default();
        for rule in &self.rules {
            if rule.selectors.iter().any(|s| s == tag || s == "*") {
                result.apply(&rule.declarations);
            }
        }
        result
    }

    /// Computes the declarations of an element: tag defaults, then matching rules, then inline.
    pub fn compute(&self, tag: &str, inline: &Declarations) -> Declarations {
        let mut result = Declarations::for_tag(tag);
        result.apply(&self.matching(tag));
        result.apply(inline);
        result
    }
}

/// Parses the body of a rule or a `style` attribute.
pub fn parse_declarations(text: &str) -> Declarations {
    let mut declarations = Declarations::default();

    for entry in text.split(';') {
        let Some((property, value)) = entry.split_once(':') else {
            continue;
        };
        let property = property.trim().to_ascii_lowercase();
        let value = value
            .trim()
            .trim_end_matches("!important")
            .trim()
            .to_ascii_lowercase();

        match property.as_str() {
            "font-size" => declarations.font_size = parse_font_size(&value),
            "font-weight" => declarations.bold = parse_font_weight(&value),
            "font-style" => {
                declarations.italic = match value.as_str() {
                    "italic" | "oblique" => Some(true),
                    "normal" => Some(false),
                    _ => None,
                }
            }
            "color" => declarations.color = parse_color(&value),
            "text-align" => {
                declarations.align = match value.as_str() {
                    "left" | "start" | "justify" => Some(TextAlign::Left),
                    "center" => Some(TextAlign::Center),
                    "right" | "end" => Some(TextAlign::Right),
                    _ => None,
                }
            }
            _ => {}
        }
    }

    declarations
}

fn strip_comments(css: &str) -> String {
    let mut out = String::with_capacity(css.len());
    let mut rest = css;
    while let Some(start) = rest.find("/*") {
        out.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => return out,
        }
    }
    out.push_str(rest);
    out
}

fn parse_font_size(value: &str) -> Option<FontSize> {
    let number = |suffix: &str| -> Option<f64> {
        value
            .strip_suffix(suffix)
            .and_then(|n| n.trim().parse::<f64>().ok())
            .filter(|n| n.is_finite() && *n > 0.0)
    };

    if let Some(points) = number("pt") {
        Some(FontSize::Points(points))
    } else if let Some(pixels) = number("px") {
        Some(FontSize::Points(pixels * 0.75))
    } else if let Some(factor) = number("em") {
        Some(FontSize::Relative(factor))
    } else if let Some(percent) = number("%") {
        Some(FontSize::Relative(percent / 100.0))
    } else {
        match value {
            "small" => Some(FontSize::Relative(0.83)),
            "medium" => Some(FontSize::Relative(1.0)),
            "large" => Some(FontSize::Relative(1.2)),
            "x-large" => Some(FontSize::Relative(1.5)),
            _ => value
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite() && *n > 0.0)
                .map(FontSize::Points),
        }
    }
}

fn parse_font_weight(value: &str) -> Option<bool> {
    match value {
        "bold" | "bolder" => Some(true),
        "normal" | "lighter" => Some(false),
        numeric => numeric.parse::<u16>().ok().map(|weight| weight >= 600),
    }
}

/// Parses `#rgb`, `#rrggbb`, `rgb(r, g, b)` and a few color names.
pub fn parse_color(value: &str) -> Option<Color> {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        return match hex.len() {
            3 => {
                let mut digits = hex.chars().map(|c| c.to_string().repeat(2));
                Some(Color::Rgb(
                    channel(&digits.next()?)?,
                    channel(&digits.next()?)?,
                    channel(&digits.next()?)?,
                ))
            }
            6 => Some(Color::Rgb(
                channel(hex.get(0..2)?)?,
                channel(hex.get(2..4)?)?,
                channel(hex.get(4..6)?)?,
            )),
            _ => None,
        };
    }

    if let Some(args) = value
        .strip_prefix("rgb(")
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let channels = args
            .split(',')
            .map(|part| part.trim().parse::<u8>().ok())
            .collect::<Option<Vec<_>>>()?;
        return match channels.as_slice() {
            [r, g, b] => Some(Color::Rgb(*r, *g, *b)),
            _ => None,
        };
    }

    match value {
        "black" => Some(Color::Rgb(0, 0, 0)),
        "white" => Some(Color::Rgb(255, 255, 255)),
        "red" => Some(Color::Rgb(255, 0, 0)),
        "green" => Some(Color::Rgb(0, 128, 0)),
        "blue" => Some(Color::Rgb(0, 0, 255)),
        "gray" | "grey" => Some(Color::Rgb(128, 128, 128)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_rules_win() {
        let sheet = Stylesheet::parse(
            "p { font-size: 10pt; color: #333 } /* note */ p, li { font-size: 14px }",
        );
        let computed = sheet.compute("p", &Declarations::default());
        assert_eq!(computed.font_size, Some(FontSize::Points(10.5)));
        assert_eq!(computed.color, Some(Color::Rgb(0x33, 0x33, 0x33)));
    }

    #[test]
    fn inline_declarations_override_rules() {
        let sheet = Stylesheet::parse("h1 { text-align: center }");
        let inline = parse_declarations("text-align: right; font-weight: normal");
        let computed = sheet.compute("h1", &inline);
        assert_eq!(computed.align, Some(TextAlign::Right));
        assert_eq!(computed.bold, Some(false));
        assert_eq!(computed.font_size, Some(FontSize::Relative(2.0)));
    }

    #[test]
    fn unsupported_selectors_do_not_match() {
        let sheet = Stylesheet::parse(".note { color: red } @media print { p { color: blue } }");
        assert_eq!(sheet.matching("p"), Declarations::default());
    }

    #[test]
    fn color_forms() {
        assert_eq!(parse_color("#fff"), Some(Color::Rgb(255, 255, 255)));
        assert_eq!(parse_color("rgb(1, 2, 3)"), Some(Color::Rgb(1, 2, 3)));
        assert_eq!(parse_color("#12345"), None);
        assert_eq!(parse_color("chartreuse"), None);
    }

    #[test]
    fn relative_sizes_resolve_against_inherited() {
        assert_eq!(FontSize::Relative(1.5).resolve(12.0), 18.0);
        assert_eq!(FontSize::Points(9.0).resolve(12.0), 9.0);
    }
}
