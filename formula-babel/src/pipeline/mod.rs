//! Store <-> edit conversions
//!
//!     A document moves between two shapes:
//!
//!         stored   canonical markup (raw or safe-encoded), legacy applets, formula images
//!         edited   formula images, iframe/container placeholders, or $$notation$$ text
//!
//!     `initial_parse` goes from stored to edited, `end_parse` back. Each is a fixed sequence
//!     of text rewrites (see ./initial.rs and ./end.rs), each rewrite a scan for one element
//!     name. Which rewrites run is decided by the PipelineConfig and nothing else.
//!
//!     Both entry points only touch the content of `<body>` when given a full document.

mod end;
mod formula;
mod initial;

use crate::cache::FormulaCache;
use crate::codec::Codec;
use crate::error::ConversionIssue;
use crate::mode::{HostCapabilities, PipelineConfig};
use crate::paint::{HostRenderer, ScheduledPaint};
use crate::scanner::{self, split_body, ElementQuery};
use crate::service::{ContentService, Payload, RenderKind, RenderParams};
use crate::wire::WireFormat;
use log::{info, warn};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Everything an integration decides about a pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub config: PipelineConfig,
    pub capabilities: HostCapabilities,
    pub wire: WireFormat,
    /// Size rendered images from their metrics. Some save modes force this on.
    pub set_size: bool,
    /// Fetch accessible text for the `alt` attribute of rendered images.
    pub accessibility: bool,
    pub language: String,
    /// Extra parameters sent with every image request (colors, font size, …).
    pub render_params: BTreeMap<String, String>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            config: PipelineConfig::default(),
            capabilities: HostCapabilities::default(),
            wire: WireFormat::default(),
            set_size: false,
            accessibility: false,
            language: "en".to_string(),
            render_params: BTreeMap::new(),
        }
    }
}

/// Result of one conversion call.
#[derive(Debug)]
pub struct Conversion {
    pub text: String,
    pub issues: Vec<ConversionIssue>,
    /// Paints started for inert containers, to be followed up by the host.
    pub paints: Vec<ScheduledPaint>,
}

pub struct Pipeline {
    options: PipelineOptions,
    codec: Codec,
    cache: Arc<FormulaCache>,
    service: Box<dyn ContentService>,
    renderer: Option<Box<dyn HostRenderer>>,
    next_container: AtomicUsize,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("options", &self.options)
            .field("codec", &self.codec)
            .field("renderer", &self.renderer.is_some())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(options: PipelineOptions, service: impl ContentService + 'static) -> Self {
        let codec = Codec::new().with_restricted_characters(options.capabilities.restricted_characters);
        let cache = Arc::new(FormulaCache::with_encoding(&options.wire.notation_encoding));
        Self {
            options,
            codec,
            cache,
            service: Box::new(service),
            renderer: None,
            next_container: AtomicUsize::new(0),
        }
    }

    /// Uses `cache` instead of a fresh one, e.g. to share it with another pipeline.
    pub fn with_cache(mut self, cache: Arc<FormulaCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_renderer(mut self, renderer: impl HostRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn codec(&self) -> &Codec {
        &self.codec
    }

    pub fn cache(&self) -> &Arc<FormulaCache> {
        &self.cache
    }

    /// Stored document to editable document.
    pub fn initial_parse(&self, code: &str) -> String {
        self.initial_parse_detailed(code).text
    }

    pub fn initial_parse_detailed(&self, code: &str) -> Conversion {
        self.convert("initial parse", code, initial::run)
    }

    /// Edited document back to its stored form.
    pub fn end_parse(&self, code: &str) -> String {
        self.end_parse_detailed(code).text
    }

    pub fn end_parse_detailed(&self, code: &str) -> Conversion {
        self.convert("end parse", code, end::run)
    }

    fn convert(&self, name: &str, code: &str, steps: fn(&mut Pass<'_>, &str) -> String) -> Conversion {
        let split = split_body(code);
        let mut pass = Pass::new(self);
        let body = steps(&mut pass, split.body);
        info!(
            "{}: {} -> {} bytes, {} issue(s)",
            name,
            code.len(),
            split.prefix.len() + body.len() + split.suffix.len(),
            pass.issues.len()
        );
        Conversion {
            text: format!("{}{}{}", split.prefix, body, split.suffix),
            issues: pass.issues,
            paints: pass.paints,
        }
    }
}

/// State of one conversion call.
pub(crate) struct Pass<'p> {
    pipeline: &'p Pipeline,
    issues: Vec<ConversionIssue>,
    paints: Vec<ScheduledPaint>,
}

impl<'p> Pass<'p> {
    fn new(pipeline: &'p Pipeline) -> Self {
        Self {
            pipeline,
            issues: Vec::new(),
            paints: Vec::new(),
        }
    }

    fn options(&self) -> &'p PipelineOptions {
        &self.pipeline.options
    }

    fn wire(&self) -> &'p WireFormat {
        &self.pipeline.options.wire
    }

    fn codec(&self) -> &'p Codec {
        &self.pipeline.codec
    }

    fn cache(&self) -> &'p FormulaCache {
        &self.pipeline.cache
    }

    fn issue(&mut self, issue: ConversionIssue) {
        warn!("{}", issue);
        self.issues.push(issue);
    }

    /// Rewrites every element matching `query`, recording elements that never terminate.
    fn rewrite<F>(&mut self, code: &str, query: ElementQuery<'_>, mut replace: F) -> String
    where
        F: FnMut(&mut Pass<'p>, &str) -> Option<String>,
    {
        let result = scanner::rewrite(code, query, |element, _| replace(self, element));
        for offset in result.degraded {
            self.issue(ConversionIssue::MalformedMarkup {
                tag: query.name().to_string(),
                offset,
            });
        }
        result.text.into_owned()
    }

    /// Calls the content service. Failures and empty answers are recorded and yield `None`.
    fn call(&mut self, kind: RenderKind, params: &RenderParams) -> Option<Payload> {
        match self.pipeline.service.render(kind, params) {
            Ok(payload) if !payload.is_empty() => Some(payload),
            Ok(_) => {
                self.issue(ConversionIssue::ServiceUnavailable {
                    kind,
                    reason: "empty response".to_string(),
                });
                None
            }
            Err(err) => {
                self.issue(ConversionIssue::ServiceUnavailable {
                    kind,
                    reason: err.to_string(),
                });
                None
            }
        }
    }

    /// Annotated markup for `notation`, from the cache or the content service.
    fn markup_for_notation(&mut self, notation: &str) -> Option<String> {
        if let Some(markup) = self.cache().lookup_notation(notation) {
            return Some(markup);
        }
        let params = RenderParams::new()
            .with("latex", notation)
            .with("saveLatex", "");
        let markup = self.call(RenderKind::NotationToMarkup, &params)?.into_text()?;
        let markup = markup.replace('\r', "").replace('\n', " ");
        self.cache().populate_notation(notation, &markup);
        self.cache().lookup_notation(notation)
    }

    /// Accessible text for `markup`, from the cache or the content service.
    fn accessible_text(&mut self, markup: &str) -> Option<String> {
        if let Some(text) = self.cache().lookup_accessible(markup) {
            return Some(text);
        }
        let params = RenderParams::new()
            .with("mml", markup)
            .with("lang", self.options().language.as_str());
        let text = self.call(RenderKind::MarkupToAccessible, &params)?.into_text()?;
        self.cache().populate_accessible(markup, &text);
        self.cache().lookup_accessible(markup)
    }

    fn next_container_id(&self) -> String {
        let n = self.pipeline.next_container.fetch_add(1, Ordering::Relaxed);
        format!("formula-paint-{}", n)
    }

    fn renderer(&self) -> Option<&'p dyn HostRenderer> {
        self.pipeline.renderer.as_deref()
    }
}
