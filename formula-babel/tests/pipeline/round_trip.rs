//! Store -> edit -> store without edits reproduces the stored document.

use crate::common::{config, image, pipeline, service, ONE, ONE_SAFE};
use formula_babel::mode::{EditMode, HostCapabilities, SaveMode};
use formula_babel::service::RenderKind;
use formula_babel::{Pipeline, PipelineOptions};

fn round_trip(pipeline: &Pipeline, stored: &str) -> String {
    let edited = pipeline.initial_parse(stored);
    pipeline.end_parse(&edited)
}

#[test]
fn test_raw_markup_round_trip() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Images, SaveMode::Xml, &[]), &service);
    let stored = format!("<p>Let {} be one.</p><p>{}</p>", ONE, ONE);
    assert_eq!(round_trip(&pipeline, &stored), stored);
}

#[test]
fn test_safe_markup_round_trip() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Images, SaveMode::SafeXml, &[]), &service);
    let stored = format!(r#"<div class="q">{}</div>"#, ONE_SAFE);
    assert_eq!(round_trip(&pipeline, &stored), stored);
}

#[test]
fn test_notation_round_trip_uses_the_cache() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Notation, SaveMode::SafeXml, &[]), &service);
    let stored = "«math»«semantics»«mrow»«mi»y«/mi»«/mrow»«annotation encoding=¨LaTeX¨»y«/annotation»«/semantics»«/math»";
    assert_eq!(pipeline.initial_parse(stored), "$$y$$");
    assert_eq!(round_trip(&pipeline, stored), stored);
    assert_eq!(service.calls(RenderKind::NotationToMarkup), 0);
}

#[test]
fn test_iframe_round_trip() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Iframes, SaveMode::Xml, &[]), &service);
    assert_eq!(round_trip(&pipeline, ONE), ONE);
}

#[test]
fn test_container_round_trip_without_renderer() {
    let service = service();
    let options = PipelineOptions {
        config: config(EditMode::Iframes, SaveMode::SafeXml, &[]),
        capabilities: HostCapabilities {
            supports_iframes: false,
            restricted_characters: false,
        },
        ..Default::default()
    };
    let pipeline = Pipeline::new(options, service.clone());
    let conversion = pipeline.initial_parse_detailed(ONE_SAFE);
    assert!(conversion.paints.is_empty());
    assert_eq!(pipeline.end_parse(&conversion.text), ONE_SAFE);
}

#[test]
fn test_applet_round_trip() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Images, SaveMode::Xml, &[]), &service);
    let stored = r#"<applet class="formula-cas" code="x" src="cas.png"></applet>"#;
    assert_eq!(round_trip(&pipeline, stored), stored);
}

#[test]
fn test_image_notation_with_markup_characters_round_trip() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Notation, SaveMode::Image, &[]), &service);
    let stored = image(
        "«math»«semantics»«mrow»«mi»a«/mi»«mo»§lt;«/mo»«mi»b«/mi»«/mrow»«annotation encoding=¨LaTeX¨»a§lt;b«/annotation»«/semantics»«/math»",
    );
    let edited = pipeline.initial_parse(&stored);
    assert_eq!(edited, "$$a&lt;b$$");
    assert_eq!(pipeline.end_parse(&edited), stored);
    // The annotation taught the cache; the service is never asked.
    assert_eq!(service.calls(RenderKind::NotationToMarkup), 0);
}

#[test]
fn test_reverse_cached_notation_is_escaped() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Notation, SaveMode::Image, &[]), &service);
    pipeline
        .cache()
        .populate_notation("a<b", "<math><mi>a</mi><mo>&lt;</mo><mi>b</mi></math>");
    let stored = image("«math»«mi»a«/mi»«mo»§lt;«/mo»«mi»b«/mi»«/math»");
    assert_eq!(pipeline.initial_parse(&stored), "$$a&lt;b$$");
}
