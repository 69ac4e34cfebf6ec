//! Stored document -> editable document

use super::Pass;
use crate::annotation;
use crate::codec::{html_escape, html_unescape, numeric_entities, CharacterSet};
use crate::mode::{EditMode, SaveMode};
use crate::paint::{PaintRequest, ScheduledPaint};
use crate::scanner::attributes::Attributes;
use crate::scanner::ElementQuery;
use log::debug;
use std::borrow::Cow;

pub(super) fn run(pass: &mut Pass<'_>, body: &str) -> String {
    let config = &pass.options().config;
    let mut code = body.to_string();

    if config.decodes_markup() {
        if config.notation_enabled() {
            code = markup_to_notation(pass, &code, CharacterSet::SAFE_XML);
            code = markup_to_notation(pass, &code, CharacterSet::XML);
        }
        // Safe markup goes first so that markup attributes written by it are never rescanned.
        code = safe_applets_to_objects(pass, &code);
        code = markup_to_images(pass, &code, CharacterSet::SAFE_XML);
        code = markup_to_images(pass, &code, CharacterSet::XML);
    }

    if config.save_mode == SaveMode::Base64 && config.edit_mode == EditMode::Images {
        code = inline_images_to_served(pass, &code);
    }

    code = applets_to_images(pass, &code);

    if config.notation_enabled() {
        code = images_to_notation(pass, &code);
    }

    match config.edit_mode {
        EditMode::Iframes => images_to_placeholders(pass, &code),
        EditMode::Images | EditMode::Notation => code,
    }
}

/// Annotated markup spans become `$$notation$$`; the cache learns the pair.
fn markup_to_notation(pass: &mut Pass<'_>, code: &str, set: CharacterSet) -> String {
    let wire = pass.wire();
    let codec = pass.codec();
    let cache = pass.cache();
    let query = ElementQuery::matching(&wire.math_element).with_characters(set);

    pass.rewrite(code, query, |_, element| {
        let stored = annotation::notation_of(element, &set, &wire.notation_encoding)?;
        let (markup, notation) = if set == CharacterSet::SAFE_XML {
            (codec.decode(element), codec.decode(stored))
        } else {
            (Cow::Borrowed(element), Cow::Borrowed(stored))
        };
        cache.populate_notation(&html_unescape(&notation), &markup);
        debug!("markup span shown as notation {:?}", notation);
        Some(wire.delimited(&notation))
    })
}

/// Safe-encoded legacy applets become raw applet elements again.
fn safe_applets_to_objects(pass: &mut Pass<'_>, code: &str) -> String {
    let codec = pass.codec();
    let query = ElementQuery::matching("applet").with_characters(CharacterSet::SAFE_XML);
    pass.rewrite(code, query, |_, applet| {
        Some(codec.decode(&legacy_initial_text(applet)).into_owned())
    })
}

/// Older applets stored an unescaped `xmlinitialtext` parameter; escape it so decoding the
/// applet does not decode the parameter too.
fn legacy_initial_text(applet: &str) -> Cow<'_, str> {
    let Some(param) = applet.find("xmlinitialtext") else {
        return Cow::Borrowed(applet);
    };
    let Some(value_at) = applet[param..].find("value=").map(|offset| param + offset + 6) else {
        return Cow::Borrowed(applet);
    };
    let Some(quote) = applet[value_at..].chars().next() else {
        return Cow::Borrowed(applet);
    };
    let start = value_at + quote.len_utf8();
    let Some(end) = applet[start..].find(quote).map(|offset| start + offset) else {
        return Cow::Borrowed(applet);
    };
    let value = &applet[start..end];
    if value.is_empty() {
        return Cow::Borrowed(applet);
    }
    let escaped = value
        .replace('«', "§lt;")
        .replace('»', "§gt;")
        .replace('&', "§")
        .replace('¨', "§quot;");
    Cow::Owned(applet.replace(value, &escaped))
}

/// Remaining canonical markup spans become formula images.
fn markup_to_images(pass: &mut Pass<'_>, code: &str, set: CharacterSet) -> String {
    let wire = pass.wire();
    let codec = pass.codec();
    let query = ElementQuery::matching(&wire.math_element).with_characters(set);
    pass.rewrite(code, query, |pass, element| {
        let markup = if set == CharacterSet::SAFE_XML {
            codec.decode(element)
        } else {
            numeric_entities(element)
        };
        pass.render_image(&markup, false)
    })
}

/// Images stored with an inlined payload are shown through the image service while editing.
fn inline_images_to_served(pass: &mut Pass<'_>, code: &str) -> String {
    let codec = pass.codec();
    pass.rewrite(code, ElementQuery::void("img"), |pass, img| {
        let attributes = Attributes::parse(img);
        if !pass.is_formula_image(&attributes) || !attributes.raw("src")?.starts_with("data:") {
            return None;
        }
        let markup = codec.decode(&pass.carried_markup(&attributes)?).into_owned();
        pass.render_image(&markup, false)
    })
}

/// Legacy applets carrying the applet marker become placeholder images.
fn applets_to_images(pass: &mut Pass<'_>, code: &str) -> String {
    let wire = pass.wire();
    pass.rewrite(code, ElementQuery::matching("applet"), |pass, applet| {
        let attributes = Attributes::parse(applet);
        let has_class = attributes.has_class(&wire.applet_class);
        let marked = applet
            .to_ascii_uppercase()
            .contains(&wire.applet_class.to_ascii_uppercase());
        if !has_class && !marked {
            return None;
        }
        let src = attributes.get("src").map(Cow::into_owned).unwrap_or_default();
        let applet = if has_class {
            applet.to_string()
        } else {
            attributes.with_attribute("class", &wire.applet_class)
        };
        Some(pass.applet_image(&applet, &src))
    })
}

/// Formula images whose notation is known become `$$notation$$`.
fn images_to_notation(pass: &mut Pass<'_>, code: &str) -> String {
    let wire = pass.wire();
    let codec = pass.codec();
    let cache = pass.cache();
    pass.rewrite(code, ElementQuery::void("img"), |pass, img| {
        let attributes = Attributes::parse(img);
        if !pass.is_formula_image(&attributes) {
            return None;
        }
        let markup = codec.decode(&pass.carried_markup(&attributes)?).into_owned();
        // Notation is written escaped, the way it is stored in the annotation.
        let notation = match annotation::notation_of(&markup, &CharacterSet::XML, &wire.notation_encoding) {
            Some(stored) => {
                cache.populate_notation(&html_unescape(stored), &markup);
                stored.to_string()
            }
            None => html_escape(&cache.notation_for_markup(&markup)?).into_owned(),
        };
        debug!("formula image shown as notation {:?}", notation);
        Some(wire.delimited(&notation))
    })
}

/// Formula images become iframes, or inert containers painted by the host renderer.
fn images_to_placeholders(pass: &mut Pass<'_>, code: &str) -> String {
    let wire = pass.wire();
    let supports_iframes = pass.options().capabilities.supports_iframes;
    pass.rewrite(code, ElementQuery::void("img"), |pass, img| {
        let attributes = Attributes::parse(img);
        if !pass.is_formula_image(&attributes) {
            return None;
        }
        let encoded = pass.carried_markup(&attributes)?;
        let markup_attribute = format!(
            "class=\"{}\" {}=\"{}\"",
            wire.image_class,
            wire.markup_attribute,
            html_escape(&encoded)
        );
        if supports_iframes {
            return Some(format!(
                "<iframe {} style=\"display:inline;border:none;\" height=\"1\" width=\"1\" scrolling=\"no\" frameborder=\"0\"></iframe>",
                markup_attribute
            ));
        }

        let container_id = pass.next_container_id();
        match pass.renderer() {
            Some(renderer) => {
                let request = PaintRequest {
                    container_id: container_id.clone(),
                    markup: pass.codec().decode(&encoded).into_owned(),
                };
                pass.paints.push(ScheduledPaint::start(renderer, request));
            }
            None => debug!("no host renderer, container {} stays unpainted", container_id),
        }
        Some(format!(
            "<span {} data-paint-id=\"{}\" style=\"display:inline-block;\"></span>",
            markup_attribute, container_id
        ))
    })
}
