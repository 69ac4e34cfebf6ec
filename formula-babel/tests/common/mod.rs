//! Shared fixtures for pipeline tests.

use formula_babel::error::ServiceError;
use formula_babel::mode::{EditMode, ParseMode, PipelineConfig, SaveMode};
use formula_babel::service::{ContentService, Payload, RenderKind, RenderParams, TableContentService};
use formula_babel::{Pipeline, PipelineOptions};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const ONE: &str = "<math><mn>1</mn></math>";
pub const ONE_SAFE: &str = "«math»«mn»1«/mn»«/math»";

/// Table-backed service counting its calls per kind.
#[derive(Default)]
pub struct CountingService {
    pub table: TableContentService,
    pub calls: [AtomicUsize; 4],
}

fn slot(kind: RenderKind) -> usize {
    match kind {
        RenderKind::NotationToMarkup => 0,
        RenderKind::MarkupToNotation => 1,
        RenderKind::MarkupToAccessible => 2,
        RenderKind::MarkupToImage => 3,
    }
}

impl CountingService {
    pub fn calls(&self, kind: RenderKind) -> usize {
        self.calls[slot(kind)].load(Ordering::SeqCst)
    }
}

impl ContentService for CountingService {
    fn render(&self, kind: RenderKind, params: &RenderParams) -> Result<Payload, ServiceError> {
        self.calls[slot(kind)].fetch_add(1, Ordering::SeqCst);
        self.table.render(kind, params)
    }
}

/// A service that knows `1` and `x^2`, draws every formula as `formula.png`, and describes
/// `1` as "one".
pub fn service() -> Arc<CountingService> {
    let mut table = TableContentService::new();
    table.notation_to_markup.insert("1".to_string(), ONE.to_string());
    table.notation_to_markup.insert(
        "x^2".to_string(),
        "<math><msup><mi>x</mi><mn>2</mn></msup></math>".to_string(),
    );
    table.notation_to_markup.insert(
        "a<b".to_string(),
        "<math><mi>a</mi><mo>&lt;</mo><mi>b</mi></math>".to_string(),
    );
    table.accessible.insert(ONE.to_string(), "one".to_string());
    table.default_image = Some("https://example.org/formula.png".to_string());
    Arc::new(CountingService {
        table,
        ..Default::default()
    })
}

pub fn config(edit_mode: EditMode, save_mode: SaveMode, parse_modes: &[ParseMode]) -> PipelineConfig {
    PipelineConfig {
        edit_mode,
        save_mode,
        parse_modes: parse_modes.iter().copied().collect(),
    }
}

pub fn pipeline(config: PipelineConfig, service: &Arc<CountingService>) -> Pipeline {
    let options = PipelineOptions {
        config,
        ..Default::default()
    };
    Pipeline::new(options, service.clone())
}

/// The `<img>` the pipeline writes for `encoded` markup rendered by [`service`].
pub fn image(encoded: &str) -> String {
    format!(
        r#"<img class="formula" data-markup="{}" src="https://example.org/formula.png" role="math" />"#,
        encoded
    )
}
