//! Locating formula elements in raw markup text
//!
//!     Documents reach us as strings that are frequently not well-formed, so instead of parsing
//!     them we walk the text and cut out the spans of one element name at a time. The walk skips
//!     over every other tag (quote-aware), which means a `<math` or `«math` inside an attribute
//!     value of another element is never taken for a formula.
//!
//!     When a candidate element never terminates, the scanner emits its first character
//!     verbatim and resumes right after it. Scanning therefore always finishes and the
//!     concatenation of all segments is exactly the input.

pub mod attributes;
mod body;
mod machine;

use crate::codec::CharacterSet;
use std::borrow::Cow;
use std::collections::HashMap;
use std::ops::Range;

pub use body::{split_body, BodySplit};
pub use machine::{CharClass, State, Termination};
pub(crate) use machine::starts_with_name;

/// What kind of element a span covers, as far as the pipeline cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Image,
    Applet,
    Iframe,
    /// Inert container painted by the host renderer.
    Container,
    InlineMath,
}

impl SpanKind {
    fn from_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("img") {
            SpanKind::Image
        } else if name.eq_ignore_ascii_case("applet") {
            SpanKind::Applet
        } else if name.eq_ignore_ascii_case("iframe") {
            SpanKind::Iframe
        } else if name.eq_ignore_ascii_case("span") {
            SpanKind::Container
        } else {
            SpanKind::InlineMath
        }
    }
}

/// Byte range of a located element. Only valid for the string it was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagSpan {
    pub start: usize,
    pub end: usize,
    pub kind: SpanKind,
}

impl TagSpan {
    pub fn slice<'a>(&self, source: &'a str) -> &'a str {
        &source[self.start..self.end]
    }
}

/// Element name plus how to recognize and terminate it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElementQuery<'n> {
    name: &'n str,
    characters: CharacterSet,
    termination: Termination,
}

impl<'n> ElementQuery<'n> {
    pub fn void(name: &'n str) -> Self {
        Self {
            name,
            characters: CharacterSet::XML,
            termination: Termination::Void,
        }
    }

    pub fn matching(name: &'n str) -> Self {
        Self {
            name,
            characters: CharacterSet::XML,
            termination: Termination::Matching,
        }
    }

    /// Structural characters of the element itself. The surrounding document is always walked
    /// with the XML set.
    pub fn with_characters(mut self, characters: CharacterSet) -> Self {
        self.characters = characters;
        self
    }

    pub fn name(&self) -> &'n str {
        self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Element(TagSpan, &'a str),
    /// First character of an element that never terminates.
    Degraded(usize, &'a str),
}

impl<'a> Segment<'a> {
    pub fn as_str(&self) -> &'a str {
        match self {
            Segment::Text(text) | Segment::Element(_, text) | Segment::Degraded(_, text) => text,
        }
    }
}

/// Iterator over the segments of `source` for one [`ElementQuery`].
///
/// When an element fails to terminate, the ends of every later opener are resolved in the
/// same pass, so broken input is not rescanned once per degraded character.
pub struct Scanner<'a, 'n> {
    source: &'a str,
    query: ElementQuery<'n>,
    position: usize,
    resolved: HashMap<usize, Option<usize>>,
}

impl<'a, 'n> Scanner<'a, 'n> {
    pub fn new(source: &'a str, query: ElementQuery<'n>) -> Self {
        Self {
            source,
            query,
            position: 0,
            resolved: HashMap::new(),
        }
    }

    fn is_candidate(&self, at: usize) -> bool {
        let opener = self.query.characters.tag_opener;
        self.source[at..]
            .strip_prefix(opener)
            .is_some_and(|rest| machine::starts_with_name(rest, self.query.name, &self.query.characters))
    }

    /// Next candidate opener at or after `from`, skipping over unrelated tags.
    fn next_candidate(&self, from: usize) -> Option<usize> {
        let mut at = from;
        while let Some(c) = self.source[at..].chars().next() {
            if self.is_candidate(at) {
                return Some(at);
            }
            if c == CharacterSet::XML.tag_opener {
                if let Some(end) = machine::tag_end(self.source, at, &CharacterSet::XML) {
                    at = end;
                    continue;
                }
            }
            at += c.len_utf8();
        }
        None
    }

    fn element_end(&mut self, start: usize) -> Option<usize> {
        if let Some(&end) = self.resolved.get(&start) {
            return end;
        }
        let query = self.query;
        let end = machine::element_end(self.source, start, query.name, &query.characters, query.termination);
        if end.is_none() {
            self.resolved =
                machine::element_ends(self.source, start, query.name, &query.characters, query.termination);
        }
        end
    }

    fn element_at(&mut self, start: usize) -> Segment<'a> {
        let query = self.query;
        match self.element_end(start) {
            Some(end) => {
                let span = TagSpan {
                    start,
                    end,
                    kind: SpanKind::from_name(query.name),
                };
                Segment::Element(span, span.slice(self.source))
            }
            None => {
                let width = query.characters.tag_opener.len_utf8();
                Segment::Degraded(start, &self.source[start..start + width])
            }
        }
    }
}

impl<'a, 'n> Iterator for Scanner<'a, 'n> {
    type Item = Segment<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let start = self.position;
        if start >= self.source.len() {
            return None;
        }
        let segment = match self.next_candidate(start) {
            Some(at) if at > start => Segment::Text(&self.source[start..at]),
            Some(at) => self.element_at(at),
            None => Segment::Text(&self.source[start..]),
        };
        self.position += segment.as_str().len();
        Some(segment)
    }
}

/// All spans of `query` in `source`, left to right, non-overlapping.
pub fn find_spans(source: &str, query: ElementQuery<'_>) -> Vec<TagSpan> {
    Scanner::new(source, query)
        .filter_map(|segment| match segment {
            Segment::Element(span, _) => Some(span),
            _ => None,
        })
        .collect()
}

/// Byte range of an element's content, between the end of its start tag and the start of
/// its close tag. `None` for elements without content (`<span/>`).
pub fn content_range(element: &str, set: &CharacterSet) -> Option<Range<usize>> {
    let start = machine::tag_end(element, 0, set)?;
    let close = element.rfind(set.tag_opener)?;
    (close >= start).then_some(start..close)
}

/// Result of [`rewrite`]: the new text and the offsets where elements degraded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten<'a> {
    pub text: Cow<'a, str>,
    pub degraded: Vec<usize>,
}

/// Replaces every element for which `replace` returns `Some`. Everything else is copied as is.
pub fn rewrite<'a, F>(source: &'a str, query: ElementQuery<'_>, mut replace: F) -> Rewritten<'a>
where
    F: FnMut(&str, TagSpan) -> Option<String>,
{
    let mut out: Option<String> = None;
    let mut degraded = Vec::new();
    let mut copied_to = 0;

    for segment in Scanner::new(source, query) {
        match segment {
            Segment::Element(span, element) => {
                if let Some(replacement) = replace(element, span) {
                    let out = out.get_or_insert_with(|| String::with_capacity(source.len()));
                    out.push_str(&source[copied_to..span.start]);
                    out.push_str(&replacement);
                    copied_to = span.end;
                }
            }
            Segment::Degraded(offset, _) => degraded.push(offset),
            Segment::Text(_) => {}
        }
    }

    let text = match out {
        Some(mut out) => {
            out.push_str(&source[copied_to..]);
            Cow::Owned(out)
        }
        None => Cow::Borrowed(source),
    };
    Rewritten { text, degraded }
}
