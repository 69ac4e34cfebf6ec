use super::machine::tag_end;
use crate::codec::CharacterSet;

/// A document cut around its `<body>` content. Fragments have empty prefix and suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BodySplit<'a> {
    pub prefix: &'a str,
    pub body: &'a str,
    pub suffix: &'a str,
}

fn find_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

fn rfind_ascii_ci(haystack: &str, needle: &str) -> Option<usize> {
    haystack
        .as_bytes()
        .windows(needle.len())
        .rposition(|window| window.eq_ignore_ascii_case(needle.as_bytes()))
}

pub fn split_body(code: &str) -> BodySplit<'_> {
    let whole = BodySplit {
        prefix: "",
        body: code,
        suffix: "",
    };

    let Some(open) = find_ascii_ci(code, "<body") else {
        return whole;
    };
    let boundary = code[open + 5..].chars().next();
    if !boundary.is_some_and(|c| c == '>' || c.is_whitespace()) {
        return whole;
    }
    let Some(body_start) = tag_end(code, open, &CharacterSet::XML) else {
        return whole;
    };
    let body_end = rfind_ascii_ci(&code[body_start..], "</body>")
        .map_or(code.len(), |offset| body_start + offset);

    BodySplit {
        prefix: &code[..body_start],
        body: &code[body_start..body_end],
        suffix: &code[body_end..],
    }
}
