use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use tempfile::tempdir;

// ============================================================================
// CODEC
// ============================================================================

#[test]
fn encode_writes_safe_markup() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("formula.mml");
    fs::write(&input_path, r#"<math><mi mathvariant="bold">a</mi></math>"#).unwrap();

    let mut cmd = cargo_bin_cmd!("formula");
    cmd.current_dir(dir.path()).arg("encode").arg(input_path.as_os_str());

    cmd.assert()
        .success()
        .stdout("«math»«mi mathvariant=¨bold¨»a«/mi»«/math»");
}

#[test]
fn decode_reads_stdin() {
    let dir = tempdir().unwrap();

    let mut cmd = cargo_bin_cmd!("formula");
    cmd.current_dir(dir.path())
        .arg("decode")
        .arg("-")
        .write_stdin("«math»«mo»§lt;«/mo»«/math»");

    cmd.assert().success().stdout("<math><mo>&lt;</mo></math>");
}

// ============================================================================
// SCAN
// ============================================================================

fn scan(dir: &std::path::Path, source: &str, extra: &[&str]) -> Vec<Value> {
    let input_path = dir.join("doc.html");
    fs::write(&input_path, source).unwrap();

    let mut cmd = cargo_bin_cmd!("formula");
    cmd.current_dir(dir).arg("scan").arg(input_path.as_os_str()).args(extra);

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: Value = serde_json::from_slice(&output).unwrap();
    json.as_array().unwrap().clone()
}

#[test]
fn scan_lists_void_spans() {
    let dir = tempdir().unwrap();
    let spans = scan(
        dir.path(),
        r#"<p><img alt="a > b" src="a.png"> <img src="b.png"/></p>"#,
        &["--tag", "img"],
    );
    assert_eq!(spans.len(), 2);
    assert_eq!(spans[0]["start"], 3);
    assert_eq!(spans[0]["text"], r#"<img alt="a > b" src="a.png">"#);
    assert_eq!(spans[0]["kind"], "Image");
    assert_eq!(spans[1]["text"], r#"<img src="b.png"/>"#);
}

#[test]
fn scan_finds_safe_matching_spans() {
    let dir = tempdir().unwrap();
    let spans = scan(
        dir.path(),
        "x «math»«mn»1«/mn»«/math» y",
        &["--tag", "math", "--matching", "--safe"],
    );
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0]["text"], "«math»«mn»1«/mn»«/math»");
    assert_eq!(spans[0]["kind"], "InlineMath");
}

// ============================================================================
// METRICS
// ============================================================================

fn chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    out.extend_from_slice(&[0; 4]);
}

#[test]
fn metrics_reads_png_headers() {
    let mut png = vec![0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    let mut header = Vec::new();
    header.extend_from_slice(&100u32.to_be_bytes());
    header.extend_from_slice(&40u32.to_be_bytes());
    header.extend_from_slice(&[8, 6, 0, 0, 0]);
    chunk(&mut png, b"IHDR", &header);
    chunk(&mut png, b"baSE", &30u32.to_be_bytes());
    let mut phys = Vec::new();
    phys.extend_from_slice(&2835u32.to_be_bytes());
    phys.extend_from_slice(&2835u32.to_be_bytes());
    phys.push(1);
    chunk(&mut png, b"pHYs", &phys);

    let dir = tempdir().unwrap();
    let image_path = dir.path().join("formula.png");
    fs::write(&image_path, png).unwrap();

    let mut cmd = cargo_bin_cmd!("formula");
    cmd.current_dir(dir.path()).arg("metrics").arg(image_path.as_os_str());

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(
        json,
        serde_json::json!({"width": 100, "height": 40, "baseline": 30, "dpi": 72})
    );
}

#[test]
fn metrics_reads_svg_attributes() {
    let dir = tempdir().unwrap();
    let image_path = dir.path().join("formula.svg");
    fs::write(
        &image_path,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="20px" height="12" wrs:baseline="9"></svg>"#,
    )
    .unwrap();

    let mut cmd = cargo_bin_cmd!("formula");
    cmd.current_dir(dir.path()).arg("metrics").arg(image_path.as_os_str());

    let output = cmd.assert().success().get_output().stdout.clone();
    let json: Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(json["width"], 20);
    assert_eq!(json["height"], 12);
    assert_eq!(json["baseline"], 9);
}

#[test]
fn metrics_rejects_other_files() {
    let dir = tempdir().unwrap();
    let image_path = dir.path().join("cat.gif");
    fs::write(&image_path, b"GIF89a").unwrap();

    let mut cmd = cargo_bin_cmd!("formula");
    cmd.current_dir(dir.path()).arg("metrics").arg(image_path.as_os_str());

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No image metrics found"));
}
