//! Formula transcoding for rich-text editors
//!
//!     This crate converts embedded formulas between the representations a document goes
//!     through while it is stored and while it is edited: canonical markup (MathML), notation
//!     text (LaTeX) and image placeholders carrying the markup in an attribute.
//!
//!     TLDR:
//!         - Nothing here builds a document tree. Formulas are located by text scanning only
//!           (see ./scanner), because the markup handed over by editors is frequently broken,
//!           partially escaped or rewritten.
//!         - The stored representation must survive editors that strip or escape markup, which is
//!           what the character codec is for (see ./codec).
//!         - All translation work (markup <-> notation, accessible text, images) is done by an
//!           external content service, reached through the ContentService trait (./service).
//!
//! Architecture
//!
//!     .
//!     ├── codec               # Safe character substitution, entities, percent encoding
//!     ├── scanner             # State machine locating tag spans in raw text
//!     ├── metrics             # Image metrics from PNG chunks, SVG attributes, data URIs
//!     ├── cache.rs            # First-write-wins caches owned by a pipeline
//!     ├── annotation.rs       # Notation annotation inside canonical markup
//!     ├── mode.rs             # Edit/save/parse modes and host capabilities
//!     ├── wire.rs             # Persisted formula element (class and attribute names)
//!     ├── service             # Content service seam, remote and table implementations
//!     ├── paint.rs            # Deferred painting of inert containers
//!     └── pipeline            # Store -> edit and edit -> store conversions
//!
//!     The pipeline is the only module that knows about modes. Everything below it is a pure
//!     function of its input, which keeps the text-level pieces testable in isolation.
//!
//! Error policy
//!
//!     A conversion never fails as a whole. Unterminated tags degrade one character at a time,
//!     failed service calls leave the formula untouched, and each such event is reported as a
//!     ConversionIssue next to the converted text.
//!
//!     This is a pure lib: no code here assumes a shell, prints, or reads the environment.

pub mod annotation;
pub mod cache;
pub mod codec;
pub mod error;
pub mod metrics;
pub mod mode;
pub mod paint;
pub mod pipeline;
pub mod scanner;
pub mod service;
pub mod wire;

pub use cache::FormulaCache;
pub use codec::{CharacterSet, Codec};
pub use error::{ConversionIssue, ServiceError};
pub use metrics::ImageMetrics;
pub use mode::{EditMode, HostCapabilities, ParseMode, PipelineConfig, SaveMode};
pub use pipeline::{Conversion, Pipeline, PipelineOptions};
pub use service::{ContentService, Payload, RenderKind, RenderParams};
pub use wire::WireFormat;
