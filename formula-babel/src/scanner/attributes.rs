//! Attribute access for a located start tag

use crate::codec::html_unescape;
use std::borrow::Cow;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Attribute<'a> {
    name: &'a str,
    value: Option<&'a str>,
    /// Byte range of the whole `name="value"` text within the tag.
    range: Range<usize>,
}

/// Attributes of the start tag at the beginning of `tag`.
///
/// Values are returned HTML-unescaped, the way a DOM `getAttribute` would return them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attributes<'a> {
    tag: &'a str,
    name: &'a str,
    attributes: Vec<Attribute<'a>>,
    /// Offset of the `>` (or `/>`) ending the start tag.
    close: usize,
}

fn is_name_end(b: u8) -> bool {
    b.is_ascii_whitespace() || matches!(b, b'/' | b'>' | b'=')
}

impl<'a> Attributes<'a> {
    pub fn parse(tag: &'a str) -> Self {
        let bytes = tag.as_bytes();
        let mut i = usize::from(bytes.first() == Some(&b'<'));
        let name_start = i;
        while i < bytes.len() && !is_name_end(bytes[i]) {
            i += 1;
        }
        let name = &tag[name_start..i];

        let mut attributes = Vec::new();
        let close = loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            match bytes.get(i) {
                None => break tag.len(),
                Some(b'>') => break i,
                Some(b'/') if bytes.get(i + 1) == Some(&b'>') => break i,
                Some(b'/') | Some(b'=') => {
                    i += 1;
                    continue;
                }
                Some(_) => {}
            }

            let start = i;
            while i < bytes.len() && !is_name_end(bytes[i]) {
                i += 1;
            }
            let attr_name = &tag[start..i];

            let mut j = i;
            while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                j += 1;
            }
            let mut value = None;
            if bytes.get(j) == Some(&b'=') {
                j += 1;
                while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                match bytes.get(j) {
                    Some(&quote @ (b'"' | b'\'')) => {
                        let value_start = j + 1;
                        let value_end = tag[value_start..]
                            .find(quote as char)
                            .map_or(tag.len(), |offset| value_start + offset);
                        value = Some(&tag[value_start..value_end]);
                        i = (value_end + 1).min(tag.len());
                    }
                    _ => {
                        let value_start = j;
                        while j < bytes.len() && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                            j += 1;
                        }
                        value = Some(&tag[value_start..j]);
                        i = j;
                    }
                }
            }
            attributes.push(Attribute {
                name: attr_name,
                value,
                range: start..i,
            });
        };

        Self {
            tag,
            name,
            attributes,
            close,
        }
    }

    pub fn tag_name(&self) -> &'a str {
        self.name
    }

    fn find(&self, name: &str) -> Option<&Attribute<'a>> {
        self.attributes
            .iter()
            .find(|attribute| attribute.name.eq_ignore_ascii_case(name))
    }

    pub fn has(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Value as written in the document.
    pub fn raw(&self, name: &str) -> Option<&'a str> {
        self.find(name).map(|attribute| attribute.value.unwrap_or(""))
    }

    pub fn get(&self, name: &str) -> Option<Cow<'a, str>> {
        self.raw(name).map(html_unescape)
    }

    /// Whether the `class` attribute lists `class` as one of its tokens.
    pub fn has_class(&self, class: &str) -> bool {
        self.get("class")
            .is_some_and(|classes| classes.split_ascii_whitespace().any(|token| token == class))
    }

    /// The tag with `name` set to `value` (escaped), replacing an existing value in place or
    /// appending the attribute to the start tag.
    pub fn with_attribute(&self, name: &str, value: &str) -> String {
        let rendered = format!("{}=\"{}\"", name, crate::codec::html_escape(value));
        match self.find(name) {
            Some(attribute) => format!(
                "{}{}{}",
                &self.tag[..attribute.range.start],
                rendered,
                &self.tag[attribute.range.end..]
            ),
            None => format!(
                "{} {}{}",
                self.tag[..self.close].trim_end(),
                rendered,
                separator_and_rest(&self.tag[self.close..])
            ),
        }
    }
}

fn separator_and_rest(rest: &str) -> Cow<'_, str> {
    if rest.starts_with("/>") {
        Cow::Owned(format!(" {}", rest))
    } else {
        Cow::Borrowed(rest)
    }
}
