//! HTML entity helpers

use memchr::{memchr, memchr3};
use std::borrow::Cow;

/// Escapes `& < > "` the way a host serializer writes attribute values.
pub fn html_escape(input: &str) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    if memchr3(b'&', b'<', b'>', bytes).is_none() && memchr(b'"', bytes).is_none() {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    Cow::Owned(out)
}

const ESCAPES: [(&str, char); 4] = [("&quot;", '"'), ("&gt;", '>'), ("&lt;", '<'), ("&amp;", '&')];

/// Reverses [`html_escape`]. Other entities are left as they are.
pub fn html_unescape(input: &str) -> Cow<'_, str> {
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = memchr(b'&', rest.as_bytes()) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        match ESCAPES.iter().find(|(entity, _)| tail.starts_with(entity)) {
            Some((entity, c)) => {
                out.push(*c);
                rest = &tail[entity.len()..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn named_entity(name: &str) -> Option<u32> {
    let code = match name {
        "lt" => 60,
        "gt" => 62,
        "amp" => 38,
        "quot" => 34,
        "apos" => 39,
        "nbsp" => 160,
        _ => return None,
    };
    Some(code)
}

fn entity_code(name: &str) -> Option<u32> {
    match name.strip_prefix('#') {
        Some(number) => match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok(),
            None => number.parse().ok(),
        },
        None => named_entity(name),
    }
}

/// Rewrites non-ASCII characters and known entities as numeric character references.
///
/// Raw markup lifted out of an HTML document may rely on HTML-only entities or on the
/// document's encoding; numeric references survive any XML consumer.
pub fn numeric_entities(input: &str) -> Cow<'_, str> {
    if input.is_ascii() && memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    let mut out = String::with_capacity(input.len() + 16);
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        if c as u32 > 128 {
            out.push_str(&format!("&#{};", c as u32));
        } else if c == '&' {
            let end = input[i + 1..].find(';').map(|offset| i + 1 + offset);
            match end.and_then(|end| entity_code(&input[i + 1..end]).map(|code| (end, code))) {
                Some((end, code)) => {
                    out.push_str(&format!("&#{};", code));
                    while chars.next().is_some_and(|(j, _)| j < end) {}
                }
                None => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}
