//! Image metrics for sizing formula placeholders
//!
//! Metrics come from three places: chunks of a PNG payload, attributes of an SVG payload, or
//! the query string of an image URL (`cw`, `ch`, `cb`, `dpi`). None of them is trusted beyond
//! sizing an `<img>`; every reader returns `None` rather than failing.

mod png;
mod svg;

use crate::codec::percent_decode;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;

pub use png::{read_png_metrics, SIGNATURE as PNG_SIGNATURE};
pub use svg::{read_svg_metrics, BASELINE_ATTRIBUTE};

/// Screen resolution placements are scaled to.
pub const SCREEN_DPI: f64 = 96.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageMetrics {
    pub width: u32,
    pub height: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub baseline: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dpi: Option<u32>,
}

/// Display size of an image, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub width: f64,
    pub height: f64,
    /// `-(height - baseline)`, present only when the baseline is known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<f64>,
}

impl ImageMetrics {
    pub fn placement(&self) -> Placement {
        let scale = match self.dpi {
            Some(dpi) if dpi > 0 => SCREEN_DPI / f64::from(dpi),
            _ => 1.0,
        };
        let width = f64::from(self.width) * scale;
        let height = f64::from(self.height) * scale;
        let vertical_align = self
            .baseline
            .map(|baseline| -(height - f64::from(baseline) * scale));
        Placement {
            width,
            height,
            vertical_align,
        }
    }
}

/// Reads metrics from an image `src`: a PNG or SVG data URI, or a URL carrying size parameters.
pub fn from_src(src: &str) -> Option<ImageMetrics> {
    if let Some(data) = src.strip_prefix("data:") {
        return from_data_uri(data);
    }
    let (_, query) = src.split_once('?')?;
    from_query(query)
}

fn from_data_uri(data: &str) -> Option<ImageMetrics> {
    let (header, payload) = data.split_once(',')?;
    let is_base64 = header.split(';').any(|part| part == "base64");
    let bytes = if is_base64 {
        STANDARD.decode(payload.trim()).ok()?
    } else {
        percent_decode(payload).into_bytes()
    };
    if header.starts_with("image/png") {
        read_png_metrics(&bytes)
    } else if header.starts_with("image/svg+xml") {
        read_svg_metrics(std::str::from_utf8(&bytes).ok()?)
    } else {
        None
    }
}

fn from_query(query: &str) -> Option<ImageMetrics> {
    let mut width = None;
    let mut height = None;
    let mut baseline = None;
    let mut dpi = None;
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let slot = match key.as_ref() {
            "cw" => &mut width,
            "ch" => &mut height,
            "cb" => &mut baseline,
            "dpi" => &mut dpi,
            _ => continue,
        };
        *slot = value.trim().parse::<u32>().ok();
    }
    Some(ImageMetrics {
        width: width?,
        height: height?,
        baseline,
        dpi,
    })
}
