//! Building and reading formula elements

use super::Pass;
use crate::codec::{self, html_escape, percent_encode};
use crate::error::ConversionIssue;
use crate::metrics::{self, PNG_SIGNATURE};
use crate::scanner::attributes::Attributes;
use crate::service::{Payload, RenderKind, RenderParams};
use crate::wire::{self, FormulaImage};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use log::debug;

fn svg_data_uri(svg: &str) -> String {
    format!("data:image/svg+xml;charset=utf8,{}", percent_encode(svg))
}

fn png_data_uri(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}

fn is_svg(text: &str) -> bool {
    text.starts_with("<svg") || text.starts_with("<?xml")
}

/// Turns an image payload into something usable as `src`.
fn image_src(payload: Payload, inline: bool) -> String {
    match payload {
        Payload::Binary(bytes) if bytes.starts_with(&PNG_SIGNATURE) => png_data_uri(&bytes),
        Payload::Binary(bytes) => match std::str::from_utf8(&bytes) {
            Ok(text) if is_svg(text.trim_start()) => svg_data_uri(text.trim()),
            _ => png_data_uri(&bytes),
        },
        Payload::Text(text) => {
            let text = text.trim();
            if is_svg(text) {
                svg_data_uri(text)
            } else if inline && !text.contains(':') && !text.starts_with('/') {
                // Inlined renders answer with the bare base64 body.
                format!("data:image/png;base64,{}", text)
            } else {
                text.to_string()
            }
        }
    }
}

impl<'p> Pass<'p> {
    /// Renders `markup` into a formula `<img>`. `None` when no image could be produced.
    pub(super) fn render_image(&mut self, markup: &str, inline: bool) -> Option<String> {
        let options = self.options();
        let wire = self.wire();

        if let Some(character) = codec::unsupported_character(markup) {
            self.issue(ConversionIssue::UnsupportedCharacter { character });
        }

        let sized = options.set_size || options.config.forces_sizing();
        let mut params: RenderParams = options
            .render_params
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();
        params.insert("mml", markup);
        params.insert("lang", options.language.as_str());
        if sized {
            params.insert("metrics", "true");
            params.insert("centerbaseline", "false");
        }
        if inline {
            params.insert("base64", "true");
        }

        let src = image_src(self.call(RenderKind::MarkupToImage, &params)?, inline);
        if src.is_empty() {
            return None;
        }

        let placement = if sized {
            match metrics::from_src(&src) {
                Some(metrics) => Some(metrics.placement()),
                None if src.starts_with("data:") => {
                    self.issue(ConversionIssue::TruncatedBinary(format!(
                        "no size in {} byte image payload",
                        src.len()
                    )));
                    None
                }
                None => {
                    debug!("image URL carries no metrics: {}", src);
                    None
                }
            }
        } else {
            None
        };

        let alt = if options.accessibility {
            self.accessible_text(markup)
        } else {
            None
        };

        let image = FormulaImage {
            encoded_markup: self.codec().encode(markup).into_owned(),
            src,
            placement,
            alt,
            custom_editor: wire::custom_editor(markup, &wire.custom_editor_prefix),
        };
        Some(image.to_html(wire))
    }

    pub(super) fn is_formula_image(&self, attributes: &Attributes<'_>) -> bool {
        attributes.has_class(&self.wire().image_class)
    }

    /// Markup carried by a formula element, still safe-encoded. The markup attribute wins;
    /// `alt` is consulted only when it is absent and looks like markup.
    pub(super) fn carried_markup(&self, attributes: &Attributes<'_>) -> Option<String> {
        if let Some(markup) = attributes.get(&self.wire().markup_attribute) {
            return Some(markup.into_owned());
        }
        let alt = attributes.get("alt")?;
        let decoded = self.codec().decode(&alt);
        decoded
            .trim_start()
            .starts_with('<')
            .then(|| alt.into_owned())
    }

    /// Placeholder image standing for a legacy applet while editing.
    pub(super) fn applet_image(&self, applet: &str, src: &str) -> String {
        let wire = self.wire();
        format!(
            "<img align=\"middle\" class=\"{}\" {}=\"{}\" src=\"{}\" />",
            wire.applet_class,
            wire.applet_attribute,
            html_escape(&self.codec().encode(applet)),
            html_escape(src)
        )
    }
}
