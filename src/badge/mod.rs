//! Badge rendering: a QR code pointing at a participant page with the badge label beneath it.
//!
//! Rendering is a synchronous, self-contained transform. Each call allocates its own canvas,
//! and identical inputs with the same font produce identical PNG bytes.

use serde::{ Deserialize, Serialize };

use crate::config::BadgeConfig;
use crate::error::{ AppError, Result };

pub mod canvas;
pub mod font;
pub mod qr;

pub use font::{ resolve_label_font, shared_label_font, FontSource, LabelFont };

/// Input to a single badge render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeRequest {
    /// Visible badge text, usually the participant's form ID.
    pub label: String,
    /// Payload of the QR code, embedded verbatim.
    pub link_target: String,
}

impl BadgeRequest {
    pub fn new(label: impl Into<String>, link_target: impl Into<String>) -> Result<Self> {
        let request = Self {
            label: label.into(),
            link_target: link_target.into(),
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(AppError::InvalidInput("Badge label must not be empty".to_string()));
        }

        if self.link_target.is_empty() {
            return Err(AppError::InvalidInput("Badge link target must not be empty".to_string()));
        }

        Ok(())
    }
}

/// An encoded badge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BadgeImage {
    pub width: u32,
    pub height: u32,
    png: Vec<u8>,
}

impl BadgeImage {
    pub const CONTENT_TYPE: &'static str = "image/png";

    pub fn as_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.png
    }
}

/// Renders `label` and a QR code for `link_target` with the given layout, drawing the label in
/// `font`.
pub fn generate_badge(
    label: &str,
    link_target: &str,
    config: &BadgeConfig,
    font: &LabelFont
) -> Result<BadgeImage> {
    let request = BadgeRequest::new(label, link_target)?;
    render(&request, config, font)
}

pub fn render(request: &BadgeRequest, config: &BadgeConfig, font: &LabelFont) -> Result<BadgeImage> {
    request.validate()?;
    config.validate()?;

    let label = layout_label(font, &request.label, config)?;

    let qr_image = qr::render_qr(
        &request.link_target,
        config.qr_size,
        config.qr_margin,
        config.error_correction,
        config.foreground,
        config.background
    )?;

    let mut image = canvas::allocate(config.canvas_width, config.canvas_height, config.background)?;

    let (qr_x, qr_y) = (config.qr_left(), config.qr_top);
    canvas::overlay(&mut image, &qr_image, qr_x, qr_y)?;

    if let Some(border) = config.border {
        canvas::stroke_around(
            &mut image,
            qr_x,
            qr_y,
            config.qr_size,
            config.qr_size,
            border.inset,
            border.width,
            border.color
        );
    }

    canvas::draw_glyphs(&mut image, &label.glyphs, config.foreground);

    let png = canvas::encode_png(&image)?;

    tracing::debug!(
        "Rendered badge '{}' ({}x{}, {} bytes)",
        request.label,
        config.canvas_width,
        config.canvas_height,
        png.len()
    );

    Ok(BadgeImage {
        width: config.canvas_width,
        height: config.canvas_height,
        png,
    })
}

/// Positions the label. Ink outside the canvas is an `InvalidInput` error; ink over the QR
/// sub-image or its border is a `Config` error.
fn layout_label<'a>(
    font: &'a LabelFont,
    text: &str,
    config: &BadgeConfig
) -> Result<font::LabelLayout<'a>> {
    let width = font.measure(text, config.font_size);
    let x = config.label_align.origin_x(config.canvas_width, width, config.label_padding as f32);
    let layout = font.layout(text, config.font_size, x, config.label_baseline as f32);

    let Some(ink) = layout.ink else {
        return Ok(layout);
    };

    let fits =
        ink.min.x >= 0 &&
        ink.min.y >= 0 &&
        i64::from(ink.max.x) <= i64::from(config.canvas_width) &&
        i64::from(ink.max.y) <= i64::from(config.canvas_height);

    if !fits {
        return Err(
            AppError::InvalidInput(
                format!(
                    "Badge label '{}' is {:.0}px wide and does not fit a {}px canvas at {}px",
                    text,
                    width,
                    config.canvas_width,
                    config.font_size
                )
            )
        );
    }

    let (left, top, right, bottom) = config.qr_frame();
    let overlaps =
        i64::from(ink.min.x) < right &&
        i64::from(ink.max.x) > left &&
        i64::from(ink.min.y) < bottom &&
        i64::from(ink.max.y) > top;

    if overlaps {
        return Err(
            AppError::Config(
                format!(
                    "Label ink spans y={}..{} and overlaps the QR area ending at y={}; move the baseline or shrink the font",
                    ink.min.y,
                    ink.max.y,
                    bottom
                )
            )
        );
    }

    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enums::{ ErrorCorrection, FontWeight, LabelAlign };

    const LINK: &str = "https://example.org/participants/9f2a";

    fn bold() -> LabelFont {
        LabelFont::bundled(FontWeight::Bold).unwrap()
    }

    fn decode_qr(png: &[u8]) -> Vec<String> {
        let image = image::load_from_memory(png).unwrap().to_luma8();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            image.width() as usize,
            image.height() as usize,
            |x, y| image.get_pixel(x as u32, y as u32).0[0]
        );

        prepared
            .detect_grids()
            .into_iter()
            .map(|grid| grid.decode().unwrap().1)
            .collect()
    }

    fn png_dimensions(png: &[u8]) -> (u32, u32) {
        let image = image::load_from_memory_with_format(png, image::ImageFormat::Png).unwrap();
        (image.width(), image.height())
    }

    /// Non-background pixels at or below row `from`.
    fn ink_below(png: &[u8], from: u32) -> usize {
        let image = image::load_from_memory(png).unwrap().to_rgb8();
        image
            .enumerate_pixels()
            .filter(|(_, y, p)| *y >= from && p.0 != [255, 255, 255])
            .count()
    }

    #[test]
    fn test_badge_is_png_of_canvas_size() {
        let config = BadgeConfig::default();
        let badge = generate_badge("DEL-042", LINK, &config, &bold()).unwrap();

        assert_eq!((badge.width, badge.height), (600, 700));
        assert_eq!(png_dimensions(badge.as_bytes()), (600, 700));
    }

    #[test]
    fn test_qr_round_trip() {
        let config = BadgeConfig::default();
        let badge = generate_badge("DEL-042", LINK, &config, &bold()).unwrap();

        assert_eq!(decode_qr(badge.as_bytes()), vec![LINK.to_string()]);
    }

    #[test]
    fn test_round_trip_other_levels() {
        let font = bold();
        for ec in [ErrorCorrection::L, ErrorCorrection::M, ErrorCorrection::Q] {
            let config = BadgeConfig {
                error_correction: ec,
                ..BadgeConfig::default()
            };
            let link = "https://example.org/participants/clx8k2p0d0000qw3f?ref=badge";
            let badge = generate_badge("DEL-7", link, &config, &font).unwrap();
            assert_eq!(decode_qr(badge.as_bytes()), vec![link.to_string()]);
        }
    }

    #[test]
    fn test_identical_inputs_identical_bytes() {
        let config = BadgeConfig::default();
        let font = bold();

        let first = generate_badge("DEL-042", LINK, &config, &font).unwrap();
        let second = generate_badge("DEL-042", LINK, &config, &font).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_label_text_reaches_the_pixels() {
        let config = BadgeConfig::default();
        let font = bold();

        let first = generate_badge("DEL-042", LINK, &config, &font).unwrap();
        let second = generate_badge("DEL-999", LINK, &config, &font).unwrap();
        assert_ne!(first.as_bytes(), second.as_bytes());

        assert!(ink_below(first.as_bytes(), 560) > 0);
        assert!(ink_below(second.as_bytes(), 560) > 0);
    }

    #[test]
    fn test_capacity_boundary_for_level_h() {
        let config = BadgeConfig::default();
        let font = bold();
        let max = ErrorCorrection::H.max_byte_capacity();

        let at_limit = "a".repeat(max);
        let badge = generate_badge("DEL-042", &at_limit, &config, &font).unwrap();
        assert_eq!(png_dimensions(badge.as_bytes()), (600, 700));

        let over_limit = "a".repeat(max + 1);
        let err = generate_badge("DEL-042", &over_limit, &config, &font).unwrap_err();
        assert!(matches!(err, AppError::Encoding(_)));
    }

    #[test]
    fn test_missing_preferred_font_still_renders() {
        let config = BadgeConfig {
            font_path: Some("/nonexistent/fonts/Poppins-Bold.ttf".into()),
            ..BadgeConfig::default()
        };
        let font = resolve_label_font(config.font_path.as_deref(), config.font_weight).unwrap();
        assert_eq!(font.source(), &FontSource::Bundled(FontWeight::Bold));

        let badge = generate_badge("DEL-042", LINK, &config, &font).unwrap();
        assert_eq!(png_dimensions(badge.as_bytes()), (600, 700));
        assert!(ink_below(badge.as_bytes(), 560) > 0);
    }

    #[test]
    fn test_empty_label_rejected() {
        let config = BadgeConfig::default();
        let font = bold();
        let err = generate_badge("", "https://example.org/p/1", &config, &font).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));

        let err = generate_badge("   ", "https://example.org/p/1", &config, &font).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_empty_link_rejected() {
        let err = generate_badge("DEL-042", "", &BadgeConfig::default(), &bold()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_invalid_layout_rejected() {
        let config = BadgeConfig {
            canvas_width: 400,
            ..BadgeConfig::default()
        };
        let err = generate_badge("DEL-042", LINK, &config, &bold()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_oversized_canvas_rejected_before_rendering() {
        let config = BadgeConfig {
            canvas_width: 100_000,
            canvas_height: 100_000,
            qr_size: 90_000,
            ..BadgeConfig::default()
        };
        let err = generate_badge("DEL-042", LINK, &config, &bold()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_label_over_qr_rejected() {
        let config = BadgeConfig {
            label_baseline: 330,
            font_size: 160.0,
            ..BadgeConfig::default()
        };
        let err = generate_badge("WWW", LINK, &config, &bold()).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        // Descenders under the default baseline stay clear of the border.
        let badge = generate_badge("gjpqy", LINK, &BadgeConfig::default(), &bold()).unwrap();
        assert_eq!(decode_qr(badge.as_bytes()), vec![LINK.to_string()]);
    }

    #[test]
    fn test_label_is_centered_below_qr() {
        let config = BadgeConfig::default();
        let badge = generate_badge("DEL-042", LINK, &config, &bold()).unwrap();
        let image = image::load_from_memory(badge.as_bytes()).unwrap().to_rgb8();

        // Collect ink columns in the label band, below the QR border.
        let band = 560..image.height();
        let inked: Vec<u32> = (0..image.width())
            .filter(|&x| band.clone().any(|y| image.get_pixel(x, y).0 != [255, 255, 255]))
            .collect();

        let (left, right) = (inked[0], inked[inked.len() - 1]);
        let left_gap = left as i64;
        let right_gap = (image.width() - 1 - right) as i64;
        assert!((left_gap - right_gap).abs() <= 6, "label not centered: {} vs {}", left_gap, right_gap);
    }

    #[test]
    fn test_overlong_label_rejected() {
        let config = BadgeConfig::default();
        let label = "DELEGATION-OF-THE-UNITED-KINGDOM-042";

        let err = generate_badge(label, LINK, &config, &bold()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_right_aligned_label_respects_padding() {
        let font = LabelFont::bundled(FontWeight::Regular).unwrap();
        let config = BadgeConfig {
            label_align: LabelAlign::Right,
            label_padding: 20,
            ..BadgeConfig::default()
        };
        let badge = generate_badge("DEL-1", LINK, &config, &font).unwrap();
        let image = image::load_from_memory(badge.as_bytes()).unwrap().to_rgb8();

        let rightmost = (0..image.width())
            .rev()
            .find(|&x| (560..image.height()).any(|y| image.get_pixel(x, y).0 != [255, 255, 255]))
            .unwrap();
        assert!(rightmost < 600 - 20 + 2);
        assert!(rightmost > 500);
    }
}
