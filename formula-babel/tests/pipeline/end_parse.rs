//! Editable document -> stored document

use crate::common::{config, image, pipeline, service, ONE, ONE_SAFE};
use formula_babel::error::ServiceError;
use formula_babel::mode::{EditMode, ParseMode, SaveMode};
use formula_babel::service::{ContentService, Payload, RenderKind, RenderParams};
use formula_babel::{Pipeline, PipelineOptions};

const ONE_ANNOTATED: &str = r#"<math><semantics><mrow><mn>1</mn></mrow><annotation encoding="LaTeX">1</annotation></semantics></math>"#;
const ONE_ANNOTATED_SAFE: &str =
    "«math»«semantics»«mrow»«mn»1«/mn»«/mrow»«annotation encoding=¨LaTeX¨»1«/annotation»«/semantics»«/math»";

// ============================================================================
// NOTATION
// ============================================================================

#[test]
fn test_notation_is_stored_as_annotated_markup() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Notation, SaveMode::Xml, &[]), &service);
    assert_eq!(pipeline.end_parse("<p>$$1$$</p>"), format!("<p>{}</p>", ONE_ANNOTATED));
}

#[test]
fn test_notation_is_converted_once() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Notation, SaveMode::Xml, &[]), &service);
    pipeline.end_parse("$$1$$");
    pipeline.end_parse("$$1$$ and $$1$$");
    assert_eq!(service.calls(RenderKind::NotationToMarkup), 1);
}

#[test]
fn test_notation_parse_mode_keeps_images() {
    let service = service();
    let pipeline = pipeline(
        config(EditMode::Images, SaveMode::Image, &[ParseMode::Notation]),
        &service,
    );
    assert_eq!(pipeline.end_parse("$$1$$"), image(ONE_ANNOTATED_SAFE));
}

#[test]
fn test_spans_with_markup_are_skipped() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Notation, SaveMode::Image, &[]), &service);
    assert_eq!(
        pipeline.end_parse("$$ <b> $$1$$"),
        format!("$$ <b> {}", image(ONE_ANNOTATED_SAFE))
    );
}

#[test]
fn test_notation_entities_are_unescaped() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Notation, SaveMode::Xml, &[]), &service);
    let stored = pipeline.end_parse("$$a&lt;b$$");
    assert_eq!(
        stored,
        r#"<math><semantics><mrow><mi>a</mi><mo>&lt;</mo><mi>b</mi></mrow><annotation encoding="LaTeX">a&lt;b</annotation></semantics></math>"#
    );
}

#[test]
fn test_unknown_and_unterminated_notation_is_kept() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Notation, SaveMode::Xml, &[]), &service);
    assert_eq!(pipeline.end_parse("$$\\frac{1}{0}$$ costs $$5"), "$$\\frac{1}{0}$$ costs $$5");
}

// ============================================================================
// PLACEHOLDERS
// ============================================================================

#[test]
fn test_iframes_and_containers_become_markup() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Iframes, SaveMode::Xml, &[]), &service);
    let edited = format!(
        r#"<iframe class="formula" data-markup="{0}"></iframe> <span class="note"><span class="formula" data-markup="{0}" data-paint-id="p1"></span></span>"#,
        ONE_SAFE
    );
    assert_eq!(
        pipeline.end_parse(&edited),
        format!(r#"{0} <span class="note">{0}</span>"#, ONE)
    );
}

/// A content service that is never reachable.
struct OfflineService;

impl ContentService for OfflineService {
    fn render(&self, _: RenderKind, _: &RenderParams) -> Result<Payload, ServiceError> {
        Err(ServiceError::Transport("connection refused".to_string()))
    }
}

#[test]
fn test_placeholders_fall_back_to_markup_without_service() {
    let iframe = format!(r#"<iframe class="formula" data-markup="{}"></iframe>"#, ONE_SAFE);
    let container = format!(
        r#"<span class="formula" data-markup="{}" data-paint-id="p1"></span>"#,
        ONE_SAFE
    );

    for (save_mode, expected) in [(SaveMode::Xml, ONE), (SaveMode::SafeXml, ONE_SAFE)] {
        let options = PipelineOptions {
            config: config(EditMode::Iframes, save_mode, &[]),
            ..Default::default()
        };
        let pipeline = Pipeline::new(options, OfflineService);
        let conversion = pipeline.end_parse_detailed(&format!("{} {}", iframe, container));
        assert_eq!(conversion.text, format!("{0} {0}", expected));
        assert!(!conversion.issues.is_empty());
    }
}

// ============================================================================
// SAVE MODES
// ============================================================================

#[test]
fn test_safe_xml_keeps_the_stored_attribute() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Images, SaveMode::SafeXml, &[]), &service);
    assert_eq!(pipeline.end_parse(&image(ONE_SAFE)), ONE_SAFE);
}

#[test]
fn test_image_save_mode_leaves_images() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Images, SaveMode::Image, &[]), &service);
    assert_eq!(pipeline.end_parse(&image(ONE_SAFE)), image(ONE_SAFE));
}

#[test]
fn test_applet_images_become_applets() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Images, SaveMode::Xml, &[]), &service);
    let edited = r#"<img align="middle" class="formula-cas" data-applet="«applet class=¨formula-cas¨ code=¨x¨»«/applet»" src="new.png" />"#;
    assert_eq!(
        pipeline.end_parse(edited),
        r#"<applet class="formula-cas" code="x" src="new.png"></applet>"#
    );
}

#[test]
fn test_other_images_are_untouched() {
    let service = service();
    let pipeline = pipeline(config(EditMode::Images, SaveMode::Xml, &[]), &service);
    let html = r#"<img src="cat.png" alt="cat">"#;
    assert_eq!(pipeline.end_parse(html), html);
}

/// Answers image requests with a 100x40 PNG at 72 dpi and a baseline of 30.
struct PngService;

fn png_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&[0; 4]);
}

fn png_bytes() -> Vec<u8> {
    let mut bytes = formula_babel::metrics::PNG_SIGNATURE.to_vec();
    let mut header = Vec::new();
    header.extend_from_slice(&100u32.to_be_bytes());
    header.extend_from_slice(&40u32.to_be_bytes());
    header.extend_from_slice(&[8, 6, 0, 0, 0]);
    png_chunk(&mut bytes, b"IHDR", &header);
    png_chunk(&mut bytes, b"baSE", &30u32.to_be_bytes());
    let mut phys = Vec::new();
    phys.extend_from_slice(&2835u32.to_be_bytes());
    phys.extend_from_slice(&2835u32.to_be_bytes());
    phys.push(1);
    png_chunk(&mut bytes, b"pHYs", &phys);
    png_chunk(&mut bytes, b"IEND", &[]);
    bytes
}

impl ContentService for PngService {
    fn render(&self, kind: RenderKind, params: &RenderParams) -> Result<Payload, ServiceError> {
        assert_eq!(kind, RenderKind::MarkupToImage);
        assert_eq!(params.get("base64"), Some("true"));
        assert_eq!(params.get("metrics"), Some("true"));
        Ok(Payload::Binary(png_bytes()))
    }
}

#[test]
fn test_base64_inlines_and_sizes_images() {
    let options = PipelineOptions {
        config: config(EditMode::Images, SaveMode::Base64, &[]),
        ..Default::default()
    };
    let pipeline = Pipeline::new(options, PngService);
    let stored = pipeline.end_parse(&image(ONE_SAFE));
    assert!(stored.starts_with(r#"<img class="formula" data-markup="«math»«mn»1«/mn»«/math»" src="data:image/png;base64,iVBORw0KGgo"#));
    assert!(stored.ends_with(
        r#" width="133.33" height="53.33" style="vertical-align:-13.33px" role="math" />"#
    ));
}
