//! Quote-aware tag state machine
//!
//! Every scan in this crate is driven by the same three-state machine. Characters are first
//! classified against a [`CharacterSet`], then fed through [`transition`]. Inside a tag a quote
//! character switches to [`State::InQuote`] until the same quote comes back, so openers and
//! closers inside attribute values never end a tag.

use crate::codec::CharacterSet;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Outside,
    InTag,
    InQuote(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CharClass {
    Opener,
    Closer,
    Quote(char),
    Other,
}

impl CharClass {
    pub fn of(c: char, set: &CharacterSet) -> Self {
        if c == set.tag_opener {
            CharClass::Opener
        } else if c == set.tag_closer {
            CharClass::Closer
        } else if set.is_quote(c) {
            CharClass::Quote(c)
        } else {
            CharClass::Other
        }
    }
}

pub fn transition(state: State, class: CharClass) -> State {
    match (state, class) {
        (State::Outside, CharClass::Opener) => State::InTag,
        (State::Outside, _) => State::Outside,
        (State::InTag, CharClass::Closer) => State::Outside,
        (State::InTag, CharClass::Quote(q)) => State::InQuote(q),
        (State::InTag, _) => State::InTag,
        (State::InQuote(open), CharClass::Quote(q)) if q == open => State::InTag,
        (State::InQuote(open), _) => State::InQuote(open),
    }
}

/// How a located element ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// At the first unquoted closer (`<img …>`).
    Void,
    /// At the close tag matching the opening one, counting nested same-name tags.
    Matching,
}

/// What a tag opened at some position is, relative to the name being searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagRole {
    Open,
    Close,
    Unrelated,
}

/// Whether `name` starts `text` (ASCII case-insensitively) followed by a name boundary.
pub fn starts_with_name(text: &str, name: &str, set: &CharacterSet) -> bool {
    let Some(head) = text.get(..name.len()) else {
        return false;
    };
    if !head.eq_ignore_ascii_case(name) {
        return false;
    }
    match text[name.len()..].chars().next() {
        None => true,
        Some(c) => c.is_whitespace() || c == '/' || c == set.tag_closer,
    }
}

fn role_at(text: &str, name: &str, set: &CharacterSet) -> TagRole {
    if let Some(rest) = text.strip_prefix('/') {
        if starts_with_name(rest, name, set) {
            return TagRole::Close;
        }
    } else if starts_with_name(text, name, set) {
        return TagRole::Open;
    }
    TagRole::Unrelated
}

/// End (exclusive, byte offset) of the element whose opener is at `start`, or `None` when the
/// input runs out first.
pub fn element_end(
    source: &str,
    start: usize,
    name: &str,
    set: &CharacterSet,
    termination: Termination,
) -> Option<usize> {
    let mut state = State::Outside;
    let mut role = TagRole::Unrelated;
    let mut depth = 0usize;
    let mut last_in_tag = ' ';

    for (offset, c) in source[start..].char_indices() {
        let position = start + offset;
        let next = transition(state, CharClass::of(c, set));
        match (state, next) {
            (State::Outside, State::InTag) => {
                role = role_at(&source[position + c.len_utf8()..], name, set);
                last_in_tag = ' ';
            }
            (State::InTag, State::Outside) => {
                let end = position + c.len_utf8();
                if termination == Termination::Void {
                    return Some(end);
                }
                let self_closing = last_in_tag == '/';
                match role {
                    TagRole::Open if self_closing => {
                        if depth == 0 {
                            return Some(end);
                        }
                    }
                    TagRole::Open => depth += 1,
                    TagRole::Close => {
                        depth = depth.saturating_sub(1);
                        if depth == 0 {
                            return Some(end);
                        }
                    }
                    TagRole::Unrelated => {}
                }
            }
            (State::InTag, State::InTag) if !c.is_whitespace() => last_in_tag = c,
            _ => {}
        }
        state = next;
    }
    None
}

/// What [`element_end`] returns for every opener of `name` met outside a tag from `start` on,
/// computed in a single pass. Openers that never terminate map to `None`.
///
/// A scan starting at one of these openers begins in [`State::Outside`], exactly where this
/// pass was, so it would see the same tags and pair the same close tag.
pub fn element_ends(
    source: &str,
    start: usize,
    name: &str,
    set: &CharacterSet,
    termination: Termination,
) -> HashMap<usize, Option<usize>> {
    let mut ends = HashMap::new();
    let mut open = Vec::new();
    let mut state = State::Outside;
    let mut role = TagRole::Unrelated;
    let mut tag_start = start;
    let mut last_in_tag = ' ';

    for (offset, c) in source[start..].char_indices() {
        let position = start + offset;
        let next = transition(state, CharClass::of(c, set));
        match (state, next) {
            (State::Outside, State::InTag) => {
                role = role_at(&source[position + c.len_utf8()..], name, set);
                tag_start = position;
                last_in_tag = ' ';
                if role == TagRole::Open {
                    ends.insert(position, None);
                }
            }
            (State::InTag, State::Outside) => {
                let end = Some(position + c.len_utf8());
                match (termination, role) {
                    (Termination::Void, TagRole::Open) => {
                        ends.insert(tag_start, end);
                    }
                    (Termination::Matching, TagRole::Open) if last_in_tag == '/' => {
                        ends.insert(tag_start, end);
                    }
                    (Termination::Matching, TagRole::Open) => open.push(tag_start),
                    (Termination::Matching, TagRole::Close) => {
                        if let Some(opener) = open.pop() {
                            ends.insert(opener, end);
                        }
                    }
                    _ => {}
                }
            }
            (State::InTag, State::InTag) if !c.is_whitespace() => last_in_tag = c,
            _ => {}
        }
        state = next;
    }
    ends
}

/// End of any tag opened at `start`, skipping quoted values. HTML comments end at `-->`.
pub fn tag_end(source: &str, start: usize, set: &CharacterSet) -> Option<usize> {
    let rest = &source[start..];
    if rest.starts_with("<!--") {
        return rest.find("-->").map(|offset| start + offset + 3);
    }
    let mut state = State::Outside;
    for (offset, c) in rest.char_indices() {
        let next = transition(state, CharClass::of(c, set));
        if state == State::InTag && next == State::Outside {
            return Some(start + offset + c.len_utf8());
        }
        state = next;
    }
    None
}
