//! Formula caches
//!
//! A pipeline remembers every notation it converted and every accessible text it fetched, so
//! a document round-trips without asking the content service twice. Entries are never
//! replaced: the first value stored for a key is the one every later lookup sees.

use crate::annotation;
use log::debug;
use parking_lot::RwLock;
use std::collections::HashMap;

/// String map where the first write for a key wins.
#[derive(Debug, Default)]
pub struct FirstWriteMap {
    entries: RwLock<HashMap<String, String>>,
}

impl FirstWriteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` unless `key` is present. Returns whether it was stored.
    pub fn populate(&self, key: &str, value: &str) -> bool {
        if self.entries.read().contains_key(key) {
            return false;
        }
        let mut entries = self.entries.write();
        if entries.contains_key(key) {
            return false;
        }
        entries.insert(key.to_string(), value.to_string());
        true
    }

    pub fn lookup(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Caches owned by one pipeline. Share it between pipelines through an `Arc` if needed.
#[derive(Debug)]
pub struct FormulaCache {
    notation: FirstWriteMap,
    accessible: FirstWriteMap,
    /// Markup (as given and as annotated) back to the notation it came from.
    reverse: FirstWriteMap,
    encoding: String,
}

impl Default for FormulaCache {
    fn default() -> Self {
        Self::with_encoding(annotation::DEFAULT_ENCODING)
    }
}

impl FormulaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// A cache annotating markup with the given notation encoding name.
    pub fn with_encoding(encoding: &str) -> Self {
        Self {
            notation: FirstWriteMap::new(),
            accessible: FirstWriteMap::new(),
            reverse: FirstWriteMap::new(),
            encoding: encoding.to_string(),
        }
    }

    /// Remembers the markup for `notation`, annotating it first when it carries no
    /// annotation of its own.
    pub fn populate_notation(&self, notation: &str, markup: &str) {
        let annotated = if annotation::has_annotation(markup) {
            markup.to_string()
        } else {
            annotation::annotate(markup, notation, &self.encoding).into_owned()
        };
        if self.notation.populate(notation, &annotated) {
            debug!("cached markup for notation {:?}", notation);
        }
        self.reverse.populate(markup, notation);
        self.reverse.populate(&annotated, notation);
    }

    pub fn lookup_notation(&self, notation: &str) -> Option<String> {
        self.notation.lookup(notation)
    }

    /// The notation a markup string was produced from by this cache, if any.
    pub fn notation_for_markup(&self, markup: &str) -> Option<String> {
        self.reverse.lookup(markup)
    }

    pub fn populate_accessible(&self, markup: &str, text: &str) {
        self.accessible.populate(markup, text);
    }

    pub fn lookup_accessible(&self, markup: &str) -> Option<String> {
        self.accessible.lookup(markup)
    }
}
