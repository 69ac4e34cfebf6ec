//! SVG size attributes, read straight from the text

use super::ImageMetrics;

pub const BASELINE_ATTRIBUTE: &str = "wrs:baseline";

/// Value of the first `name="…"` token preceded by whitespace, so `stroke-width` does not
/// count as `width`.
fn attribute_value<'a>(svg: &'a str, name: &str) -> Option<&'a str> {
    let token = format!("{}=\"", name);
    let mut from = 0;
    while let Some(offset) = svg[from..].find(&token) {
        let at = from + offset;
        let preceded_by_space = svg[..at].chars().next_back().is_some_and(char::is_whitespace);
        let value_start = at + token.len();
        if preceded_by_space {
            let value_end = svg[value_start..].find('"')? + value_start;
            return Some(&svg[value_start..value_end]);
        }
        from = value_start;
    }
    None
}

fn number(value: &str) -> Option<u32> {
    let trimmed = value.trim().trim_end_matches("px");
    trimmed
        .parse::<u32>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0).map(|v| v.round() as u32))
}

pub fn read_svg_metrics(svg: &str) -> Option<ImageMetrics> {
    let width = attribute_value(svg, "width").and_then(number)?;
    let height = attribute_value(svg, "height").and_then(number)?;
    let baseline = attribute_value(svg, BASELINE_ATTRIBUTE).and_then(number);
    Some(ImageMetrics {
        width,
        height,
        baseline,
        dpi: None,
    })
}
