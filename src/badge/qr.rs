use image::RgbImage;
use qrcode::QrCode;

use crate::enums::{ Color, ErrorCorrection };
use crate::error::{ AppError, Result };

/// Encodes `payload` and rasterizes it into a `size` × `size` square.
///
/// The module grid, including a quiet zone of `margin` modules on every side, is scaled by the
/// largest whole number of pixels that fits and centered in the square. Leftover pixels take the
/// `light` color.
pub fn render_qr(
    payload: &str,
    size: u32,
    margin: u32,
    ec: ErrorCorrection,
    dark: Color,
    light: Color
) -> Result<RgbImage> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), ec.to_ec_level())?;

    let modules = code.width() as u32;
    let span = modules.saturating_add(margin.saturating_mul(2));
    let module_px = size / span;
    if module_px == 0 {
        return Err(
            AppError::Encoding(
                format!(
                    "QR code needs {} modules but only {}px are available at error correction {}",
                    span,
                    size,
                    ec
                )
            )
        );
    }

    let offset = (size - module_px * span) / 2 + margin * module_px;

    let mut image = RgbImage::from_pixel(size, size, light.to_rgb());
    let dark = dark.to_rgb();

    for my in 0..modules {
        for mx in 0..modules {
            if code[(mx as usize, my as usize)] != qrcode::Color::Dark {
                continue;
            }

            let left = offset + mx * module_px;
            let top = offset + my * module_px;
            for y in top..top + module_px {
                for x in left..left + module_px {
                    image.put_pixel(x, y, dark);
                }
            }
        }
    }

    Ok(image)
}
