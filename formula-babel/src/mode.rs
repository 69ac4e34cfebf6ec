//! Conversion modes and host capabilities

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;
use thiserror::Error;

/// How formulas are displayed while a document is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EditMode {
    /// Formula images carrying their markup.
    #[default]
    #[serde(alias = "default", alias = "image")]
    Images,
    /// Live-rendered placeholders (iframes, or inert containers painted by the host).
    Iframes,
    /// Delimiter-wrapped notation text.
    #[serde(alias = "latex")]
    Notation,
}

/// How formulas are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveMode {
    /// Raw canonical markup.
    #[default]
    Xml,
    /// Canonical markup with safe glyphs.
    SafeXml,
    /// Formula images with the rendered image inlined as a data URI.
    Base64,
    /// Formula images as they are.
    #[serde(rename = "default", alias = "image")]
    Image,
}

/// Extra representations recognized when loading a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParseMode {
    #[serde(alias = "latex")]
    Notation,
    Xml,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for EditMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "images" | "image" | "default" => Ok(EditMode::Images),
            "iframes" => Ok(EditMode::Iframes),
            "notation" | "latex" => Ok(EditMode::Notation),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

impl FromStr for SaveMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xml" => Ok(SaveMode::Xml),
            "safeXml" | "safe-xml" => Ok(SaveMode::SafeXml),
            "base64" => Ok(SaveMode::Base64),
            "default" | "image" => Ok(SaveMode::Image),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

impl FromStr for ParseMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notation" | "latex" => Ok(ParseMode::Notation),
            "xml" => Ok(ParseMode::Xml),
            other => Err(UnknownMode(other.to_string())),
        }
    }
}

/// Mode selection for one pipeline. Immutable while a conversion runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub edit_mode: EditMode,
    #[serde(default)]
    pub save_mode: SaveMode,
    #[serde(default)]
    pub parse_modes: BTreeSet<ParseMode>,
}

impl PipelineConfig {
    /// Whether stored documents may contain canonical markup to lift into formulas.
    pub fn decodes_markup(&self) -> bool {
        match self.save_mode {
            SaveMode::Xml | SaveMode::SafeXml => true,
            SaveMode::Base64 | SaveMode::Image => self.parse_modes.contains(&ParseMode::Xml),
        }
    }

    /// Whether formulas are shown and accepted as delimiter-wrapped notation.
    pub fn notation_enabled(&self) -> bool {
        self.edit_mode == EditMode::Notation || self.parse_modes.contains(&ParseMode::Notation)
    }

    /// Whether rendered images must be sized from their metrics regardless of the caller's
    /// preference: images that are later turned back into markup or inlined keep their size.
    pub fn forces_sizing(&self) -> bool {
        match self.save_mode {
            SaveMode::Xml | SaveMode::SafeXml => true,
            SaveMode::Base64 => self.edit_mode == EditMode::Images,
            SaveMode::Image => false,
        }
    }
}

/// What the hosting editor can do. Supplied by the integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostCapabilities {
    #[serde(default = "default_true")]
    pub supports_iframes: bool,
    #[serde(default)]
    pub restricted_characters: bool,
}

fn default_true() -> bool {
    true
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self {
            supports_iframes: true,
            restricted_characters: false,
        }
    }
}
