//! Error types for formula conversion

use crate::service::RenderKind;
use thiserror::Error;

/// Failures reported by a [`ContentService`](crate::service::ContentService).
///
/// The pipeline never propagates these; a failed call means "no conversion possible" for the
/// formula at hand and is recorded as [`ConversionIssue::ServiceUnavailable`].
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The host transport could not deliver the request.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The service answered, but with an empty payload.
    #[error("Service '{kind}' returned an empty response")]
    Empty { kind: RenderKind },

    /// The service has no answer for the given input.
    #[error("Service '{kind}' has no result for the given parameters")]
    NoResult { kind: RenderKind },

    /// A parameter required by the request kind is absent.
    #[error("Missing request parameter '{0}'")]
    MissingParameter(&'static str),

    #[error("Invalid service endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    #[error("Invalid service table: {0}")]
    InvalidTable(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that went wrong locally while converting a document.
///
/// None of these abort a conversion. They are collected in
/// [`Conversion::issues`](crate::pipeline::Conversion) so integrations can log or surface them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionIssue {
    /// A tag was opened but never closed; one character was passed through verbatim.
    #[error("Unterminated <{tag}> at byte {offset}, passed through")]
    MalformedMarkup { tag: String, offset: usize },

    /// The content service failed or returned nothing; the span was left untouched.
    #[error("Content service unavailable for '{kind}': {reason}")]
    ServiceUnavailable { kind: RenderKind, reason: String },

    /// The input contains a character the codec cannot round-trip.
    #[error("Character {character:?} is outside the codec table and was passed through")]
    UnsupportedCharacter { character: char },

    /// Image bytes ended before a header chunk could be read; the image is left unsized.
    #[error("Image metrics unavailable: {0}")]
    TruncatedBinary(String),
}
