//! The persisted formula element
//!
//! A stored formula is an `<img>` with a marker class and its safe-encoded markup in an
//! attribute. These names are part of every saved document and must not change between
//! releases; they are configurable only so that existing content from other installations
//! can be read.

use crate::annotation::DEFAULT_ENCODING;
use crate::codec::html_escape;
use crate::metrics::Placement;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireFormat {
    pub image_class: String,
    pub markup_attribute: String,
    pub applet_class: String,
    pub applet_attribute: String,
    pub math_element: String,
    pub notation_encoding: String,
    pub notation_delimiter: String,
    /// Root class prefix marking markup written with a custom editor toolbar.
    pub custom_editor_prefix: String,
}

impl Default for WireFormat {
    fn default() -> Self {
        Self {
            image_class: "formula".to_string(),
            markup_attribute: "data-markup".to_string(),
            applet_class: "formula-cas".to_string(),
            applet_attribute: "data-applet".to_string(),
            math_element: "math".to_string(),
            notation_encoding: DEFAULT_ENCODING.to_string(),
            notation_delimiter: "$$".to_string(),
            custom_editor_prefix: "wrs_".to_string(),
        }
    }
}

impl WireFormat {
    /// Notation wrapped in the delimiter, as shown in notation edit mode.
    pub fn delimited(&self, notation: &str) -> String {
        format!(
            "{delimiter}{notation}{delimiter}",
            delimiter = self.notation_delimiter
        )
    }
}

/// A formula image ready to be written into a document.
#[derive(Debug, Clone, PartialEq)]
pub struct FormulaImage {
    /// Markup as stored in the attribute (already safe-encoded).
    pub encoded_markup: String,
    pub src: String,
    pub placement: Option<Placement>,
    pub alt: Option<String>,
    pub custom_editor: Option<String>,
}

fn css_pixels(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

impl FormulaImage {
    pub fn to_html(&self, wire: &WireFormat) -> String {
        let mut html = format!(
            "<img class=\"{}\" {}=\"{}\"",
            wire.image_class,
            wire.markup_attribute,
            html_escape(&self.encoded_markup)
        );
        if let Some(editor) = &self.custom_editor {
            html.push_str(&format!(" data-custom-editor=\"{}\"", html_escape(editor)));
        }
        html.push_str(&format!(" src=\"{}\"", html_escape(&self.src)));
        if let Some(placement) = &self.placement {
            html.push_str(&format!(
                " width=\"{}\" height=\"{}\"",
                css_pixels(placement.width),
                css_pixels(placement.height)
            ));
            if let Some(align) = placement.vertical_align {
                html.push_str(&format!(" style=\"vertical-align:{}px\"", css_pixels(align)));
            }
        }
        if let Some(alt) = &self.alt {
            html.push_str(&format!(" alt=\"{}\"", html_escape(alt)));
        }
        html.push_str(" role=\"math\" />");
        html
    }
}

/// Custom editor name from the root `class` of `markup`, e.g. `chemistry` for
/// `<math class="wrs_chemistry">`.
pub fn custom_editor(markup: &str, prefix: &str) -> Option<String> {
    let root_end = markup.find('>')?;
    let root = crate::scanner::attributes::Attributes::parse(&markup[..=root_end]);
    let classes = root.get("class")?;
    classes
        .split_ascii_whitespace()
        .find_map(|class| class.strip_prefix(prefix))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
