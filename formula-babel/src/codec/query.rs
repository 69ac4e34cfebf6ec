//! Request encoding helpers for the content service

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::cmp::Ordering;

/// `encodeURIComponent` plus `! ' ( ) * ~`: only alphanumerics and `- _ .` stay literal.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

pub fn percent_encode(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// Decodes `%XX` sequences, replacing invalid UTF-8 instead of failing.
pub fn percent_decode(input: &str) -> String {
    percent_decode_str(input).decode_utf8_lossy().into_owned()
}

/// Form body `key=value&...` with keys in code point order.
pub fn build_query<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    sorted(params)
        .into_iter()
        .map(|(key, value)| format!("{}={}", percent_encode(key), percent_encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// One `key=value` line per entry, keys in code point order, values escaped so the result
/// is stable and single-line per entry.
pub fn properties_to_string<'a, I>(params: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut out = String::new();
    for (key, value) in sorted(params) {
        out.push_str(key);
        out.push('=');
        for c in value.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\r' => out.push_str("\\r"),
                '\t' => out.push_str("\\t"),
                _ => out.push(c),
            }
        }
        out.push('\n');
    }
    out
}

fn sorted<'a, I>(params: I) -> Vec<(&'a str, &'a str)>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut params: Vec<_> = params.into_iter().collect();
    params.sort_by(|a, b| compare_code_points(a.0, b.0));
    params
}

/// Code point at a UTF-16 index. A high surrogate is combined with the low surrogate that
/// follows it; a lone or trailing surrogate yields `None`.
pub fn code_point_at(units: &[u16], index: usize) -> Option<u32> {
    let unit = u32::from(*units.get(index)?);
    match unit {
        0xD800..=0xDBFF => {
            let low = u32::from(*units.get(index + 1)?);
            if (0xDC00..=0xDFFF).contains(&low) {
                Some(((unit - 0xD800) << 10) + (low - 0xDC00) + 0x10000)
            } else {
                None
            }
        }
        0xDC00..=0xDFFF => None,
        _ => Some(unit),
    }
}

/// Compares two strings by code point over their UTF-16 form, so astral characters sort
/// after the whole basic plane.
pub fn compare_code_points(a: &str, b: &str) -> Ordering {
    let a: Vec<u16> = a.encode_utf16().collect();
    let b: Vec<u16> = b.encode_utf16().collect();
    for index in 0..a.len().min(b.len()) {
        if let (Some(x), Some(y)) = (code_point_at(&a, index), code_point_at(&b, index)) {
            if x != y {
                return x.cmp(&y);
            }
        }
    }
    a.len().cmp(&b.len())
}
