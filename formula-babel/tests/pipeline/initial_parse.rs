//! Stored document -> editable document

use crate::common::{config, image, pipeline, service, ONE, ONE_SAFE};
use formula_babel::mode::{EditMode, HostCapabilities, ParseMode, SaveMode};
use formula_babel::paint::{paint_channel, HostRenderer, PaintHandle, PaintRequest, PaintedSize, PollState};
use formula_babel::service::RenderKind;
use formula_babel::{ConversionIssue, Pipeline, PipelineOptions};

// ============================================================================
// MARKUP TO IMAGES
// ============================================================================

#[test]
fn test_raw_markup_becomes_image() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Images, SaveMode::Xml, &[]), &service);
    let html = pipeline.initial_parse(&format!("<p>a {} b</p>", ONE));
    assert_eq!(html, format!("<p>a {} b</p>", image(ONE_SAFE)));
    assert_eq!(service.calls(RenderKind::MarkupToImage), 1);
}

#[test]
fn test_safe_markup_becomes_image() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Images, SaveMode::SafeXml, &[]), &service);
    let html = pipeline.initial_parse(&format!("<p>{}</p>", ONE_SAFE));
    assert_eq!(html, format!("<p>{}</p>", image(ONE_SAFE)));
}

#[test]
fn test_non_ascii_markup_uses_numeric_references() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Images, SaveMode::Xml, &[]), &service);
    let html = pipeline.initial_parse("<math><mo>×</mo></math>");
    assert_eq!(html, image("«math»«mo»§#215;«/mo»«/math»"));
}

#[test]
fn test_markup_in_attributes_is_left_alone() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Images, SaveMode::Xml, &[]), &service);
    let html = format!(r#"<p title="{}">text</p>"#, ONE);
    assert_eq!(pipeline.initial_parse(&html), html);
    assert_eq!(service.calls(RenderKind::MarkupToImage), 0);
}

#[test]
fn test_markup_is_not_decoded_for_image_save_mode() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Images, SaveMode::Image, &[]), &service);
    assert_eq!(pipeline.initial_parse(ONE), ONE);

    let pipeline = crate::common::pipeline(
        config(EditMode::Images, SaveMode::Image, &[ParseMode::Xml]),
        &service,
    );
    assert_eq!(pipeline.initial_parse(ONE), image(ONE_SAFE));
}

#[test]
fn test_accessible_text_fills_alt() {
    let service = service();
    let options = PipelineOptions {
        config: config(EditMode::Images, SaveMode::Xml, &[]),
        accessibility: true,
        ..Default::default()
    };
    let pipeline = Pipeline::new(options, service.clone());
    let html = pipeline.initial_parse(&format!("{}{}", ONE, ONE));
    assert!(html.contains(r#" alt="one" role="math" />"#));
    // The second formula is answered from the cache.
    assert_eq!(service.calls(RenderKind::MarkupToAccessible), 1);
}

// ============================================================================
// NOTATION
// ============================================================================

#[test]
fn test_annotated_markup_becomes_notation() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Notation, SaveMode::Xml, &[]), &service);
    let stored = r#"<p><math><semantics><mi>x</mi><annotation encoding="LaTeX">x</annotation></semantics></math></p>"#;
    assert_eq!(pipeline.initial_parse(stored), "<p>$$x$$</p>");
    assert!(pipeline.cache().lookup_notation("x").is_some());
    assert_eq!(service.calls(RenderKind::MarkupToImage), 0);
}

#[test]
fn test_safe_annotated_markup_becomes_notation() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Notation, SaveMode::SafeXml, &[]), &service);
    let stored = "«math»«semantics»«mi»a«/mi»«annotation encoding=¨LaTeX¨»a§lt;b«/annotation»«/semantics»«/math»";
    assert_eq!(pipeline.initial_parse(stored), "$$a&lt;b$$");
    assert!(pipeline.cache().lookup_notation("a<b").is_some());
}

#[test]
fn test_unannotated_markup_stays_an_image_in_notation_mode() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Notation, SaveMode::Xml, &[]), &service);
    assert_eq!(pipeline.initial_parse(ONE), image(ONE_SAFE));
}

#[test]
fn test_cached_markup_image_becomes_notation() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Notation, SaveMode::Image, &[]), &service);
    pipeline.cache().populate_notation("1", "<m><n>1</n></m>");
    let html = r#"<img class="formula" data-markup="&lt;m&gt;&lt;n&gt;1&lt;/n&gt;&lt;/m&gt;">"#;
    assert_eq!(pipeline.initial_parse(html), "$$1$$");
}

#[test]
fn test_alt_is_used_only_without_markup_attribute() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Notation, SaveMode::Image, &[]), &service);
    pipeline.cache().populate_notation("1", ONE);
    pipeline.cache().populate_notation("2", "<math><mn>2</mn></math>");

    let alt_only = format!(r#"<img class="formula" alt="{}">"#, ONE_SAFE);
    assert_eq!(pipeline.initial_parse(&alt_only), "$$1$$");

    let both = format!(
        r#"<img class="formula" data-markup="«math»«mn»2«/mn»«/math»" alt="{}">"#,
        ONE_SAFE
    );
    assert_eq!(pipeline.initial_parse(&both), "$$2$$");
}

#[test]
fn test_unknown_formula_image_is_untouched() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Notation, SaveMode::Image, &[]), &service);
    let html = r#"<img class="formula" data-markup="«math»«mn»7«/mn»«/math»" src="7.png">"#;
    assert_eq!(pipeline.initial_parse(html), html);
}

#[test]
fn test_unterminated_image_degrades() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Notation, SaveMode::Image, &[]), &service);
    let html = r#"<p><img class="formula""#;
    let conversion = pipeline.initial_parse_detailed(html);
    assert_eq!(conversion.text, html);
    assert_eq!(
        conversion.issues,
        vec![ConversionIssue::MalformedMarkup {
            tag: "img".to_string(),
            offset: 3
        }]
    );
}

// ============================================================================
// APPLETS
// ============================================================================

#[test]
fn test_marked_applet_becomes_image() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Images, SaveMode::Image, &[]), &service);
    let applet = r#"<applet class="formula-cas" src="cas.png" code="x"></applet>"#;
    assert_eq!(
        pipeline.initial_parse(applet),
        r#"<img align="middle" class="formula-cas" data-applet="«applet class=¨formula-cas¨ src=¨cas.png¨ code=¨x¨»«/applet»" src="cas.png" />"#
    );
}

#[test]
fn test_unmarked_applet_is_untouched() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Images, SaveMode::Image, &[]), &service);
    let applet = r#"<applet code="Game.class"></applet>"#;
    assert_eq!(pipeline.initial_parse(applet), applet);
}

#[test]
fn test_safe_applet_is_decoded_then_converted() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Images, SaveMode::SafeXml, &[]), &service);
    let stored = "«applet class=¨formula-cas¨ src=¨c.png¨»«/applet»";
    let html = pipeline.initial_parse(stored);
    assert_eq!(
        html,
        r#"<img align="middle" class="formula-cas" data-applet="«applet class=¨formula-cas¨ src=¨c.png¨»«/applet»" src="c.png" />"#
    );
}

// ============================================================================
// PLACEHOLDERS
// ============================================================================

#[test]
fn test_iframes_replace_images() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Iframes, SaveMode::Xml, &[]), &service);
    assert_eq!(
        pipeline.initial_parse(ONE),
        r#"<iframe class="formula" data-markup="«math»«mn»1«/mn»«/math»" style="display:inline;border:none;" height="1" width="1" scrolling="no" frameborder="0"></iframe>"#
    );
}

struct ImmediateRenderer;

impl HostRenderer for ImmediateRenderer {
    fn begin_paint(&self, request: &PaintRequest) -> PaintHandle {
        assert_eq!(request.markup, ONE);
        let (notifier, handle) = paint_channel();
        notifier.ready(PaintedSize {
            width: "10px".to_string(),
            height: "5px".to_string(),
            vertical_align: "-1px".to_string(),
        });
        handle
    }
}

#[test]
fn test_containers_are_painted_by_the_host() {
    let service = service();
    let options = PipelineOptions {
        config: config(EditMode::Iframes, SaveMode::Xml, &[]),
        capabilities: HostCapabilities {
            supports_iframes: false,
            restricted_characters: false,
        },
        ..Default::default()
    };
    let pipeline = Pipeline::new(options, service.clone()).with_renderer(ImmediateRenderer);
    let mut conversion = pipeline.initial_parse_detailed(ONE);
    assert_eq!(
        conversion.text,
        r#"<span class="formula" data-markup="«math»«mn»1«/mn»«/math»" data-paint-id="formula-paint-0" style="display:inline-block;"></span>"#
    );
    assert_eq!(conversion.paints.len(), 1);
    let paint = &mut conversion.paints[0];
    assert_eq!(paint.request.container_id, "formula-paint-0");
    assert!(matches!(paint.tick(), PollState::Ready(size) if size.width == "10px"));
}

#[test]
fn test_full_documents_keep_their_head() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Images, SaveMode::Xml, &[]), &service);
    let doc = format!("<html><head><title>{0}</title></head><body>{0}</body></html>", ONE);
    assert_eq!(
        pipeline.initial_parse(&doc),
        format!(
            "<html><head><title>{}</title></head><body>{}</body></html>",
            ONE,
            image(ONE_SAFE)
        )
    );
}
