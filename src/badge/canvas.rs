use image::{ ImageFormat, Rgb, RgbImage };
use rusttype::PositionedGlyph;

use crate::enums::Color;
use crate::error::{ AppError, Result };

/// Largest canvas side we agree to allocate.
pub const MAX_CANVAS_SIDE: u32 = 16_384;

/// Allocates a `width` × `height` canvas filled with `background`.
pub fn allocate(width: u32, height: u32, background: Color) -> Result<RgbImage> {
    if width == 0 || height == 0 {
        return Err(AppError::Render("Canvas dimensions must be non-zero".to_string()));
    }

    if width > MAX_CANVAS_SIDE || height > MAX_CANVAS_SIDE {
        return Err(
            AppError::Render(
                format!(
                    "Canvas {}x{} exceeds the {}px limit",
                    width,
                    height,
                    MAX_CANVAS_SIDE
                )
            )
        );
    }

    Ok(RgbImage::from_pixel(width, height, background.to_rgb()))
}

/// Copies `src` onto `canvas` with its top-left corner at (`x`, `y`).
pub fn overlay(canvas: &mut RgbImage, src: &RgbImage, x: u32, y: u32) -> Result<()> {
    if x.saturating_add(src.width()) > canvas.width() || y.saturating_add(src.height()) > canvas.height() {
        return Err(
            AppError::Render(
                format!(
                    "{}x{} image at ({}, {}) does not fit a {}x{} canvas",
                    src.width(),
                    src.height(),
                    x,
                    y,
                    canvas.width(),
                    canvas.height()
                )
            )
        );
    }

    image::imageops::replace(canvas, src, i64::from(x), i64::from(y));
    Ok(())
}

/// Strokes a rectangle outline of `width` pixels around the box (`x`, `y`, `w`, `h`). The
/// innermost stroke pixel lies `inset` pixels outside the box. Pixels past the canvas edge are
/// skipped.
pub fn stroke_around(
    canvas: &mut RgbImage,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    inset: u32,
    width: u32,
    color: Color
) {
    let color = color.to_rgb();
    let (x, y, w, h) = (i64::from(x), i64::from(y), i64::from(w), i64::from(h));

    for ring in 1..=i64::from(width) {
        let d = i64::from(inset) + ring - 1;
        let (left, top) = (x - d, y - d);
        let (right, bottom) = (x + w - 1 + d, y + h - 1 + d);

        for px in left..=right {
            put_checked(canvas, px, top, color);
            put_checked(canvas, px, bottom, color);
        }
        for py in top..=bottom {
            put_checked(canvas, left, py, color);
            put_checked(canvas, right, py, color);
        }
    }
}

fn put_checked(canvas: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x < 0 || y < 0 || x >= i64::from(canvas.width()) || y >= i64::from(canvas.height()) {
        return;
    }
    canvas.put_pixel(x as u32, y as u32, color);
}

/// Blends rasterized glyph coverage onto the canvas in `color`.
pub fn draw_glyphs(canvas: &mut RgbImage, glyphs: &[PositionedGlyph<'_>], color: Color) {
    let (cw, ch) = (i64::from(canvas.width()), i64::from(canvas.height()));

    for glyph in glyphs {
        let Some(bb) = glyph.pixel_bounding_box() else {
            continue;
        };

        glyph.draw(|gx, gy, coverage| {
            let px = i64::from(bb.min.x) + i64::from(gx);
            let py = i64::from(bb.min.y) + i64::from(gy);
            if px < 0 || py < 0 || px >= cw || py >= ch {
                return;
            }

            let alpha = coverage.clamp(0.0, 1.0);
            if alpha <= 0.0 {
                return;
            }

            let dst = canvas.get_pixel_mut(px as u32, py as u32);
            for (d, s) in dst.0.iter_mut().zip(color.0) {
                *d = (f32::from(s) * alpha + f32::from(*d) * (1.0 - alpha)).round() as u8;
            }
        });
    }
}

/// Encodes the canvas as PNG.
pub fn encode_png(canvas: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    canvas.write_to(&mut std::io::Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_fills_background() {
        let canvas = allocate(4, 3, Color([1, 2, 3])).unwrap();
        assert_eq!(canvas.dimensions(), (4, 3));
        assert!(canvas.pixels().all(|p| p.0 == [1, 2, 3]));
    }

    #[test]
    fn test_allocate_rejects_bad_sizes() {
        assert!(matches!(allocate(0, 10, Color::WHITE), Err(AppError::Render(_))));
        assert!(matches!(allocate(MAX_CANVAS_SIDE + 1, 10, Color::WHITE), Err(AppError::Render(_))));
    }

    #[test]
    fn test_overlay_bounds() {
        let mut canvas = allocate(10, 10, Color::WHITE).unwrap();
        let patch = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));

        overlay(&mut canvas, &patch, 3, 3).unwrap();
        assert_eq!(canvas.get_pixel(3, 3).0, [0, 0, 0]);
        assert_eq!(canvas.get_pixel(6, 6).0, [0, 0, 0]);
        assert_eq!(canvas.get_pixel(7, 7).0, [255, 255, 255]);

        assert!(overlay(&mut canvas, &patch, 7, 0).is_err());
    }

    #[test]
    fn test_stroke_around_sits_inset_outside_box() {
        let mut canvas = allocate(20, 20, Color::WHITE).unwrap();
        let grey = Color([0xe0, 0xe0, 0xe0]);
        stroke_around(&mut canvas, 5, 5, 10, 10, 2, 1, grey);

        // Box spans 5..=14; a 1px stroke at inset 2 lands on 3 and 16.
        assert_eq!(canvas.get_pixel(3, 3).0, grey.0);
        assert_eq!(canvas.get_pixel(16, 16).0, grey.0);
        assert_eq!(canvas.get_pixel(10, 3).0, grey.0);
        assert_eq!(canvas.get_pixel(3, 10).0, grey.0);
        assert_eq!(canvas.get_pixel(4, 4).0, [255, 255, 255]);
        assert_eq!(canvas.get_pixel(2, 2).0, [255, 255, 255]);
        assert_eq!(canvas.get_pixel(17, 17).0, [255, 255, 255]);
        assert_eq!(canvas.get_pixel(10, 10).0, [255, 255, 255]);
    }

    #[test]
    fn test_stroke_width_grows_outward() {
        let mut canvas = allocate(20, 20, Color::WHITE).unwrap();
        stroke_around(&mut canvas, 5, 5, 10, 10, 1, 2, Color::BLACK);

        assert_eq!(canvas.get_pixel(4, 10).0, [0, 0, 0]);
        assert_eq!(canvas.get_pixel(3, 10).0, [0, 0, 0]);
        assert_eq!(canvas.get_pixel(2, 10).0, [255, 255, 255]);
        assert_eq!(canvas.get_pixel(5, 10).0, [255, 255, 255]);
    }

    #[test]
    fn test_stroke_clips_at_edges() {
        let mut canvas = allocate(10, 10, Color::WHITE).unwrap();
        stroke_around(&mut canvas, 0, 0, 10, 10, 1, 2, Color::BLACK);
        assert!(canvas.pixels().all(|p| p.0 == [255, 255, 255]));
    }

    #[test]
    fn test_encode_png_signature() {
        let canvas = allocate(8, 8, Color::WHITE).unwrap();
        let png = encode_png(&canvas).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
