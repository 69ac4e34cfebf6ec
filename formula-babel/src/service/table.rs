//! Content service answering from lookup tables
//!
//! Useful offline and in tests. A table is usually loaded from JSON:
//!
//!     {
//!         "notation_to_markup": {"x^2": "<math>…</math>"},
//!         "markup_to_notation": {"<math>…</math>": "x^2"},
//!         "accessible": {"<math>…</math>": "x squared"},
//!         "images": {"<math>…</math>": "https://example.org/x2.png"},
//!         "default_image": "data:image/svg+xml;charset=utf8,…"
//!     }

use super::{ContentService, Payload, RenderKind, RenderParams};
use crate::error::ServiceError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TableContentService {
    pub notation_to_markup: HashMap<String, String>,
    pub markup_to_notation: HashMap<String, String>,
    pub accessible: HashMap<String, String>,
    pub images: HashMap<String, String>,
    /// Image returned for markup missing from `images`.
    pub default_image: Option<String>,
}

impl TableContentService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self, ServiceError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    fn answer(&self, kind: RenderKind, params: &RenderParams) -> Result<Option<&String>, ServiceError> {
        let answer = match kind {
            RenderKind::NotationToMarkup => self.notation_to_markup.get(params.require("latex")?),
            RenderKind::MarkupToNotation => self.markup_to_notation.get(params.require("mml")?),
            RenderKind::MarkupToAccessible => self.accessible.get(params.require("mml")?),
            RenderKind::MarkupToImage => self
                .images
                .get(params.require("mml")?)
                .or(self.default_image.as_ref()),
        };
        Ok(answer)
    }
}

impl ContentService for TableContentService {
    fn render(&self, kind: RenderKind, params: &RenderParams) -> Result<Payload, ServiceError> {
        self.answer(kind, params)?
            .map(|text| Payload::Text(text.clone()))
            .ok_or(ServiceError::NoResult { kind })
    }
}
