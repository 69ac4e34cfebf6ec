//! The content service seam
//!
//! Everything that needs real math knowledge (turning notation into markup and back, writing
//! accessible text, drawing images) lives behind [`ContentService`]. The pipeline only builds
//! flat string parameters and consumes raw payloads; there is no response envelope.
//!
//! Two implementations ship with the crate:
//!
//!     - remote: builds form requests for a host-supplied transport
//!     - table: answers from fixed lookup tables, for offline use and tests

pub mod remote;
pub mod table;

use crate::codec::properties_to_string;
use crate::error::ServiceError;
use std::collections::BTreeMap;
use std::fmt;

pub use remote::{RemoteContentService, ServiceEndpoints, ServiceRequest, Transport};
pub use table::TableContentService;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderKind {
    NotationToMarkup,
    MarkupToNotation,
    MarkupToAccessible,
    MarkupToImage,
}

impl RenderKind {
    /// Name of the remote service answering this kind, if it is not the image endpoint.
    pub fn service_name(&self) -> Option<&'static str> {
        match self {
            RenderKind::NotationToMarkup => Some("latex2mathml"),
            RenderKind::MarkupToNotation => Some("mathml2latex"),
            RenderKind::MarkupToAccessible => Some("mathml2accessible"),
            RenderKind::MarkupToImage => None,
        }
    }
}

impl fmt::Display for RenderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.service_name().unwrap_or("createimage"))
    }
}

/// Flat string parameters of a render request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderParams {
    values: BTreeMap<String, String>,
}

impl RenderParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.values.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn require(&self, key: &'static str) -> Result<&str, ServiceError> {
        self.get(key).ok_or(ServiceError::MissingParameter(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RenderParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// One `key=value` line per parameter, in code point order.
impl fmt::Display for RenderParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&properties_to_string(self.iter()))
    }
}

/// Raw service response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    pub fn is_empty(&self) -> bool {
        match self {
            Payload::Text(text) => text.trim().is_empty(),
            Payload::Binary(bytes) => bytes.is_empty(),
        }
    }

    /// Text content; binary payloads are read as UTF-8 where possible.
    pub fn into_text(self) -> Option<String> {
        match self {
            Payload::Text(text) => Some(text),
            Payload::Binary(bytes) => String::from_utf8(bytes).ok(),
        }
    }
}

/// Converter between formula representations.
///
/// Implementations must be safe to share; the pipeline calls them synchronously, once per
/// formula that needs converting.
pub trait ContentService: Send + Sync {
    fn render(&self, kind: RenderKind, params: &RenderParams) -> Result<Payload, ServiceError>;
}

impl<S: ContentService + ?Sized> ContentService for Box<S> {
    fn render(&self, kind: RenderKind, params: &RenderParams) -> Result<Payload, ServiceError> {
        (**self).render(kind, params)
    }
}

impl<S: ContentService + ?Sized> ContentService for std::sync::Arc<S> {
    fn render(&self, kind: RenderKind, params: &RenderParams) -> Result<Payload, ServiceError> {
        (**self).render(kind, params)
    }
}
