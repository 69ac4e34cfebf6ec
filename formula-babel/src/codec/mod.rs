//! Character-level transformations applied to formula markup
//!
//! Markup persisted inside an attribute goes through editors that may strip or escape the
//! reserved XML characters. [`Codec`] swaps those characters for glyphs editors leave alone
//! and back again. The remaining submodules hold the small text helpers shared by the scanner,
//! the service layer and the pipeline.

mod characters;
mod entities;
mod query;

pub use characters::{encode, decode, unsupported_character, CharacterSet, Codec};
pub use entities::{html_escape, html_unescape, numeric_entities};
pub use query::{
    build_query, code_point_at, compare_code_points, percent_decode, percent_encode,
    properties_to_string,
};
