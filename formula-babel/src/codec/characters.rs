//! Reversible substitution between XML characters and safe glyphs

use memchr::{memchr, memchr2, memchr3};
use std::borrow::Cow;

/// The five structural characters of a markup dialect.
///
/// The same table drives both the codec and the scanner, so a raw `<math>` span and a safe
/// `«math»` span are located by one primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterSet {
    pub tag_opener: char,
    pub tag_closer: char,
    pub double_quote: char,
    pub ampersand: char,
    pub quote: char,
}

impl CharacterSet {
    pub const XML: CharacterSet = CharacterSet {
        tag_opener: '<',
        tag_closer: '>',
        double_quote: '"',
        ampersand: '&',
        quote: '\'',
    };

    pub const SAFE_XML: CharacterSet = CharacterSet {
        tag_opener: '«',
        tag_closer: '»',
        double_quote: '¨',
        ampersand: '§',
        quote: '`',
    };

    fn table(&self) -> [char; 5] {
        [
            self.tag_opener,
            self.tag_closer,
            self.double_quote,
            self.ampersand,
            self.quote,
        ]
    }

    /// Maps a character of this set to its counterpart in `target`.
    pub fn translate(&self, c: char, target: &CharacterSet) -> Option<char> {
        let position = self.table().iter().position(|&candidate| candidate == c)?;
        Some(target.table()[position])
    }

    pub fn is_quote(&self, c: char) -> bool {
        c == self.double_quote || c == self.quote
    }
}

/// Entity spellings some editors produce for the safe glyphs.
const GLYPH_ENTITIES: [(&str, &str); 4] = [
    ("&laquo;", "«"),
    ("&raquo;", "»"),
    ("&uml;", "¨"),
    // Historical spelling of the safe double quote.
    ("&quot;", "¨"),
];

/// Hosts with restricted characters store bare operators inside `mo`; keep them escaped.
const RESTRICTED_OPERATORS: [(&str, &str); 3] = [
    ("«mo»<«/mo»", "«mo»§lt;«/mo»"),
    ("«mo»>«/mo»", "«mo»§gt;«/mo»"),
    ("«mo»&«/mo»", "«mo»§amp;«/mo»"),
];

/// Safe-glyph codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Codec {
    restricted_characters: bool,
}

impl Codec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_restricted_characters(mut self, restricted: bool) -> Self {
        self.restricted_characters = restricted;
        self
    }

    pub fn restricted_characters(&self) -> bool {
        self.restricted_characters
    }

    /// Replaces `< > " & '` with `« » ¨ § \``.
    pub fn encode<'a>(&self, input: &'a str) -> Cow<'a, str> {
        let bytes = input.as_bytes();
        if memchr3(b'<', b'>', b'"', bytes).is_none() && memchr2(b'&', b'\'', bytes).is_none() {
            return Cow::Borrowed(input);
        }
        Cow::Owned(
            input
                .chars()
                .map(|c| {
                    CharacterSet::XML
                        .translate(c, &CharacterSet::SAFE_XML)
                        .unwrap_or(c)
                })
                .collect(),
        )
    }

    /// Inverse of [`Codec::encode`], also accepting the entity spellings and the legacy
    /// `$name;` entity form found in older content.
    pub fn decode<'a>(&self, input: &'a str) -> Cow<'a, str> {
        let mut text = then(Cow::Borrowed(input), normalize_glyph_entities);
        if self.restricted_characters {
            text = then(text, escape_restricted_operators);
        }
        let text = then(text, from_safe_glyphs);
        then(text, expand_legacy_entities)
    }
}

/// Encodes with a default codec.
pub fn encode(input: &str) -> Cow<'_, str> {
    Codec::new().encode(input)
}

/// Decodes with a default codec.
pub fn decode(input: &str) -> Cow<'_, str> {
    Codec::new().decode(input)
}

/// First safe glyph present in `input`, if any. Such input does not survive encode/decode.
pub fn unsupported_character(input: &str) -> Option<char> {
    input
        .chars()
        .find(|&c| CharacterSet::SAFE_XML.translate(c, &CharacterSet::XML).is_some())
}

fn then<'a>(text: Cow<'a, str>, step: fn(&str) -> Cow<'_, str>) -> Cow<'a, str> {
    match text {
        Cow::Borrowed(s) => step(s),
        Cow::Owned(s) => {
            let changed = match step(&s) {
                Cow::Borrowed(_) => None,
                Cow::Owned(changed) => Some(changed),
            };
            Cow::Owned(changed.unwrap_or(s))
        }
    }
}

fn normalize_glyph_entities(input: &str) -> Cow<'_, str> {
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    replace_all(input, &GLYPH_ENTITIES)
}

fn escape_restricted_operators(input: &str) -> Cow<'_, str> {
    replace_all(input, &RESTRICTED_OPERATORS)
}

fn replace_all<'a>(input: &'a str, table: &[(&str, &str)]) -> Cow<'a, str> {
    let mut text = Cow::Borrowed(input);
    for (from, to) in table {
        if text.contains(from) {
            text = Cow::Owned(text.replace(from, to));
        }
    }
    text
}

fn from_safe_glyphs(input: &str) -> Cow<'_, str> {
    if unsupported_character(input).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(
        input
            .chars()
            .map(|c| {
                CharacterSet::SAFE_XML
                    .translate(c, &CharacterSet::XML)
                    .unwrap_or(c)
            })
            .collect(),
    )
}

fn is_entity_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'#' | b'.' | b'_' | b'-')
}

/// `$name;` becomes `&name;`. Any other `$` is literal, and scanning resumes right after it so
/// the character that broke the entity is examined again.
fn expand_legacy_entities(input: &str) -> Cow<'_, str> {
    if memchr(b'$', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = memchr(b'$', rest.as_bytes()) {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        let name_len = after
            .bytes()
            .take_while(|&b| is_entity_name_byte(b))
            .count();
        if name_len > 0 && after.as_bytes().get(name_len) == Some(&b';') {
            out.push('&');
            out.push_str(&after[..name_len]);
            out.push(';');
            rest = &after[name_len + 1..];
        } else {
            out.push('$');
            rest = after;
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}
