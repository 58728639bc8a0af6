//! Inline style parsing and the per-node style cascade
//!
//! [`StyleState`] is a value: every descent step derives a new state from
//! the parent's, and siblings are always handed the parent's state. A
//! formatting flag can therefore only be set while the tag that set it is
//! an ancestor of the text being emitted.

use log::trace;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::document::models::{RunFormatting, TextAlignment};

static RGB_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^rgb\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*\)").unwrap()
});

static HEX_COLOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9A-Fa-f]{6}$").unwrap());

/// Parsed `style="..."` declarations, keyed by lowercase property name
pub type StyleDeclarations = HashMap<String, String>;

/// Parse an inline style attribute into declarations
///
/// Entries are separated by `;` and must hold exactly one `:`; anything
/// else is dropped. Values containing `#` lose the `#`, `rgb()` values
/// become hex, everything else passes through unchanged.
pub fn parse_styles(style_attr: Option<&str>) -> StyleDeclarations {
    let mut declarations = StyleDeclarations::new();
    let Some(style_attr) = style_attr else {
        return declarations;
    };

    for item in style_attr.split(';') {
        if !item.contains(':') {
            continue;
        }
        let parts: Vec<&str> = item.split(':').collect();
        let [key, value] = parts.as_slice() else {
            trace!("dropping malformed style declaration {item:?}");
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        if key.is_empty() {
            continue;
        }
        declarations.insert(key, normalize_color(value));
    }

    declarations
}

/// Normalise a CSS colour value
///
/// `rgb(r, g, b)` with components in 0..=255 becomes six uppercase hex
/// digits; values containing `#` have it stripped; other values are
/// returned trimmed but otherwise unchanged.
pub fn normalize_color(value: &str) -> String {
    let value = value.trim();
    if value.contains('#') {
        return value.trim_start_matches('#').to_string();
    }
    rgb_to_hex(value).unwrap_or_else(|| value.to_string())
}

/// `rgb(233,42,12)` to `E92A0C`
pub fn rgb_to_hex(value: &str) -> Option<String> {
    let caps = RGB_PATTERN.captures(value)?;
    let mut hex = String::with_capacity(6);
    for index in 1..=3 {
        let component: u8 = caps.get(index)?.as_str().parse().ok()?;
        hex.push_str(&format!("{component:02X}"));
    }
    Some(hex)
}

/// Accept only six-digit hex colours, uppercased
fn valid_hex(value: &str) -> Option<String> {
    HEX_COLOR
        .is_match(value)
        .then(|| value.to_ascii_uppercase())
}

/// Six uppercase hex digits for a `#rrggbb`, `rrggbb` or `rgb()` colour
pub fn hex_color(value: &str) -> Option<String> {
    valid_hex(&normalize_color(value))
}

fn parse_alignment(value: &str) -> Option<TextAlignment> {
    match value.trim().to_ascii_lowercase().as_str() {
        "left" => Some(TextAlignment::Left),
        "center" => Some(TextAlignment::Center),
        "right" => Some(TextAlignment::Right),
        "justify" => Some(TextAlignment::Justify),
        _ => None,
    }
}

/// Tags whose subtree renders bold
pub const BOLD_TAGS: &[&str] = &["b", "strong"];
/// Tags whose subtree renders italic
pub const ITALIC_TAGS: &[&str] = &["i", "em"];
/// Tags whose subtree renders underlined
pub const UNDERLINE_TAGS: &[&str] = &["u"];

/// Effective formatting at one point of the traversal
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleState {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub highlight: bool,
    /// `font-family` mentioned "bold" somewhere up the chain
    pub font_bold: bool,
    pub span_color: Option<String>,
    pub span_background: Option<String>,
    pub text_align: Option<TextAlignment>,
}

impl StyleState {
    /// Root state for a container seeded from its own `style` attribute
    pub fn from_declarations(declarations: &StyleDeclarations) -> Self {
        StyleState::default().layer_block(declarations)
    }

    /// New state with a span's `declarations` layered over this one; last
    /// write wins
    pub fn layer(&self, declarations: &StyleDeclarations) -> Self {
        let mut next = self.layer_block(declarations);
        if let Some(color) = declarations.get("color") {
            next.span_color = Some(color.clone());
        }
        if let Some(background) = declarations.get("background-color") {
            next.span_background = Some(background.clone());
        }
        next
    }

    /// Declarations of a non-span element: alignment and font weight only,
    /// colours are left to spans
    pub fn layer_block(&self, declarations: &StyleDeclarations) -> Self {
        let mut next = self.clone();
        if let Some(align) = declarations.get("text-align").and_then(|v| parse_alignment(v)) {
            next.text_align = Some(align);
        }
        if declarations
            .get("font-family")
            .is_some_and(|family| family.to_ascii_lowercase().contains("bold"))
        {
            next.font_bold = true;
        }
        next
    }

    /// State for the children of an element with tag `tag`
    pub fn enter(&self, tag: &str) -> Self {
        let mut next = self.clone();
        if BOLD_TAGS.contains(&tag) {
            next.bold = true;
        } else if ITALIC_TAGS.contains(&tag) {
            next.italic = true;
        } else if UNDERLINE_TAGS.contains(&tag) {
            next.underline = true;
        } else if tag == "mark" {
            next.highlight = true;
        }
        next
    }

    /// Clear every flag whose qualifying tag is missing from `ancestors`
    ///
    /// With value-per-frame states this is a no-op for states built through
    /// [`StyleState::enter`]; it guards states that arrive from elsewhere
    /// (a cell or paragraph root, for instance).
    pub fn revalidate<'a>(&self, ancestors: impl IntoIterator<Item = &'a str>) -> Self {
        let ancestors: Vec<&str> = ancestors.into_iter().collect();
        let present = |tags: &[&str]| ancestors.iter().any(|tag| tags.contains(tag));

        let mut next = self.clone();
        next.bold &= present(BOLD_TAGS);
        next.italic &= present(ITALIC_TAGS);
        next.underline &= present(UNDERLINE_TAGS);
        next.highlight &= present(&["mark"]);
        next
    }

    /// Snapshot used for a run emitted at this point
    ///
    /// Colours that are not six hex digits are dropped so the run keeps its
    /// default colour.
    pub fn run_formatting(&self) -> RunFormatting {
        RunFormatting {
            bold: self.bold || self.font_bold,
            italic: self.italic,
            underline: self.underline,
            highlight: self.highlight,
            color: self.span_color.as_deref().and_then(valid_hex),
            background: self.span_background.as_deref().and_then(valid_hex),
        }
    }
}
