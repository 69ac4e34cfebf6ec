//! Editable document -> stored document

use super::Pass;
use crate::codec::{html_unescape, CharacterSet};
use crate::mode::{EditMode, SaveMode};
use crate::scanner::attributes::Attributes;
use crate::scanner::{content_range, ElementQuery};
use log::debug;

pub(super) fn run(pass: &mut Pass<'_>, body: &str) -> String {
    let config = &pass.options().config;
    let mut code = body.to_string();

    if config.notation_enabled() {
        code = notation_to_formulas(pass, &code);
    }

    if config.edit_mode == EditMode::Iframes {
        code = placeholders_to_images(pass, &code, "iframe");
        code = placeholders_to_images(pass, &code, "span");
    }

    match config.save_mode {
        SaveMode::Base64 if config.edit_mode == EditMode::Images => inline_images(pass, &code),
        SaveMode::Base64 | SaveMode::Image => code,
        SaveMode::Xml => images_to_markup(pass, &code, false),
        SaveMode::SafeXml => images_to_markup(pass, &code, true),
    }
}

/// `$$notation$$` spans become formula images. Spans are not nested: each opening delimiter
/// pairs with the next one.
fn notation_to_formulas(pass: &mut Pass<'_>, code: &str) -> String {
    let delimiter = pass.wire().notation_delimiter.as_str();
    if delimiter.is_empty() {
        return code.to_string();
    }

    let mut out = String::with_capacity(code.len());
    let mut rest = code;
    while let Some(start) = rest.find(delimiter) {
        out.push_str(&rest[..start]);
        let after = &rest[start + delimiter.len()..];
        let Some(length) = after.find(delimiter) else {
            out.push_str(&rest[start..]);
            return out;
        };
        let stored = &after[..length];
        if stored.contains('<') {
            // Not notation: the delimiter is kept and scanning resumes right after it.
            out.push_str(delimiter);
            rest = after;
            continue;
        }

        let span_end = start + 2 * delimiter.len() + length;
        let notation = html_unescape(stored);
        match pass.markup_for_notation(&notation) {
            Some(markup) => out.push_str(&formula_element(pass, &markup)),
            None => out.push_str(&rest[start..span_end]),
        }
        rest = &rest[span_end..];
    }
    out.push_str(rest);
    out
}

/// A formula image for `markup`, or the markup itself in its stored form when no image can
/// be rendered.
fn formula_element(pass: &mut Pass<'_>, markup: &str) -> String {
    if let Some(image) = pass.render_image(markup, false) {
        return image;
    }
    debug!("no image for formula, storing markup");
    match pass.options().config.save_mode {
        SaveMode::SafeXml => pass.codec().encode(markup).into_owned(),
        SaveMode::Xml | SaveMode::Base64 | SaveMode::Image => markup.to_string(),
    }
}

/// Iframe placeholders and inert containers become formula images again, or stored markup
/// when no image can be rendered. Unrelated elements of the same name are searched for nested
/// placeholders.
fn placeholders_to_images(pass: &mut Pass<'_>, code: &str, tag: &str) -> String {
    let codec = pass.codec();
    pass.rewrite(code, ElementQuery::matching(tag), |pass, element| {
        let attributes = Attributes::parse(element);
        if !pass.is_formula_image(&attributes) {
            let content = content_range(element, &CharacterSet::XML)?;
            let inner = placeholders_to_images(pass, &element[content.clone()], tag);
            return (inner != element[content.clone()]).then(|| {
                format!("{}{}{}", &element[..content.start], inner, &element[content.end..])
            });
        }
        let markup = codec.decode(&pass.carried_markup(&attributes)?).into_owned();
        Some(formula_element(pass, &markup))
    })
}

/// Every formula image is rendered again with its payload inlined.
fn inline_images(pass: &mut Pass<'_>, code: &str) -> String {
    let codec = pass.codec();
    pass.rewrite(code, ElementQuery::void("img"), |pass, img| {
        let attributes = Attributes::parse(img);
        if !pass.is_formula_image(&attributes) {
            return None;
        }
        let markup = codec.decode(&pass.carried_markup(&attributes)?).into_owned();
        pass.render_image(&markup, true)
    })
}

/// Formula images become their markup and applet images their applet code.
fn images_to_markup(pass: &mut Pass<'_>, code: &str, safe: bool) -> String {
    let wire = pass.wire();
    let codec = pass.codec();
    pass.rewrite(code, ElementQuery::void("img"), |pass, img| {
        let attributes = Attributes::parse(img);

        if pass.is_formula_image(&attributes) || attributes.has(&wire.markup_attribute) {
            let stored = pass.carried_markup(&attributes)?;
            return Some(if safe {
                codec.encode(&stored).into_owned()
            } else {
                codec.decode(&stored).into_owned()
            });
        }

        if attributes.has_class(&wire.applet_class) {
            let applet = codec.decode(&attributes.get(&wire.applet_attribute)?).into_owned();
            let src = attributes.get("src").unwrap_or_default();
            let applet = Attributes::parse(&applet).with_attribute("src", &src);
            return Some(if safe {
                codec.encode(&applet).into_owned()
            } else {
                applet
            });
        }

        None
    })
}
