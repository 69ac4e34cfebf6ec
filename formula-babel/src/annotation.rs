//! Notation annotations inside canonical markup
//!
//! Markup produced from notation keeps the notation next to it:
//!
//!     <math><semantics><mrow>…</mrow><annotation encoding="LaTeX">x^2</annotation></semantics></math>
//!
//! which is what lets a stored formula be shown as notation again without a service call.

use crate::codec::{html_escape, CharacterSet};
use crate::scanner::starts_with_name;
use std::borrow::Cow;

pub const DEFAULT_ENCODING: &str = "LaTeX";

/// Whether the markup already has a `<semantics>` wrapper or an `<annotation>` element.
pub fn has_annotation(markup: &str) -> bool {
    let set = CharacterSet::XML;
    markup.match_indices(set.tag_opener).any(|(at, opener)| {
        let name = &markup[at + opener.len()..];
        starts_with_name(name, "semantics", &set) || starts_with_name(name, "annotation", &set)
    })
}

/// Wraps the content of the root element in `<semantics>` with a notation annotation.
///
/// Content already starting with `<mrow>` is not wrapped again. Markup without a root
/// element, or with an empty self-closing one, is returned unchanged.
pub fn annotate<'a>(markup: &'a str, notation: &str, encoding: &str) -> Cow<'a, str> {
    let Some(open) = markup.find('<') else {
        return Cow::Borrowed(markup);
    };
    let Some(open_end) = markup[open..].find('>').map(|offset| open + offset) else {
        return Cow::Borrowed(markup);
    };
    if markup[..open_end].ends_with('/') {
        return Cow::Borrowed(markup);
    }
    let root = markup[open + 1..open_end]
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .unwrap_or_default();
    let close_tag = format!("</{}>", root);
    let Some(close) = markup.rfind(&close_tag).filter(|&close| close > open_end) else {
        return Cow::Borrowed(markup);
    };

    let content = &markup[open_end + 1..close];
    let body = if content.starts_with("<mrow>") {
        content.to_string()
    } else {
        format!("<mrow>{}</mrow>", content)
    };
    Cow::Owned(format!(
        "{}<semantics>{}<annotation encoding=\"{}\">{}</annotation></semantics>{}",
        &markup[..=open_end],
        body,
        encoding,
        html_escape(notation),
        &markup[close..]
    ))
}

/// Text of the annotation with the given encoding, written with the structural characters
/// of `set`. The text is returned as stored (entities are not resolved).
pub fn notation_of<'a>(markup: &'a str, set: &CharacterSet, encoding: &str) -> Option<&'a str> {
    let start = [set.double_quote, set.quote].iter().find_map(|quote| {
        let open = format!(
            "{opener}annotation encoding={quote}{encoding}{quote}{closer}",
            opener = set.tag_opener,
            closer = set.tag_closer,
        );
        markup.find(&open).map(|at| at + open.len())
    })?;
    let close = format!("{}/annotation{}", set.tag_opener, set.tag_closer);
    let end = markup[start..].find(&close)? + start;
    Some(&markup[start..end])
}
