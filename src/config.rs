use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{ Deserialize, Serialize };

use crate::badge::canvas::MAX_CANVAS_SIDE;
use crate::enums::{ Color, ErrorCorrection, FontWeight, LabelAlign };
use crate::error::{ AppError, Result };

/// Stroke drawn around the QR sub-image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderStyle {
    pub color: Color,
    pub width: u32,
    /// Distance in pixels from the QR bounds to the innermost stroke pixel. At least 1.
    pub inset: u32,
}

impl BorderStyle {
    /// How far past the QR bounds the stroke reaches.
    pub fn extent(&self) -> u32 {
        if self.width == 0 {
            return 0;
        }
        self.inset.saturating_add(self.width - 1)
    }
}

/// Layout and styling of a rendered badge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeConfig {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub qr_size: u32,
    /// Quiet zone, in modules.
    pub qr_margin: u32,
    /// Distance from the top of the canvas to the top of the QR sub-image.
    pub qr_top: u32,
    pub error_correction: ErrorCorrection,
    pub background: Color,
    pub foreground: Color,
    pub border: Option<BorderStyle>,
    pub font_path: Option<PathBuf>,
    pub font_size: f32,
    pub font_weight: FontWeight,
    /// Y coordinate of the label baseline.
    pub label_baseline: u32,
    pub label_align: LabelAlign,
    /// Minimum distance kept between the label and the canvas edges.
    pub label_padding: u32,
}

impl Default for BadgeConfig {
    fn default() -> Self {
        Self {
            canvas_width: 600,
            canvas_height: 700,
            qr_size: 500,
            qr_margin: 1,
            qr_top: 50,
            error_correction: ErrorCorrection::H,
            background: Color::WHITE,
            foreground: Color::BLACK,
            border: Some(BorderStyle {
                color: Color([0xe0, 0xe0, 0xe0]),
                width: 1,
                inset: 2,
            }),
            font_path: Some(PathBuf::from("./fonts/Poppins-Bold.ttf")),
            font_size: 40.0,
            font_weight: FontWeight::Bold,
            label_baseline: 610,
            label_align: LabelAlign::Center,
            label_padding: 10,
        }
    }
}

impl BadgeConfig {
    /// Reads `BADGE_*` overrides on top of the default layout.
    pub fn from_env() -> std::result::Result<Self, Box<dyn std::error::Error>> {
        let defaults = Self::default();

        let border_width: u32 = env_or("BADGE_BORDER_WIDTH", defaults.border.map_or(0, |b| b.width))?;
        let border = if border_width == 0 {
            None
        } else {
            let default_border = defaults.border.unwrap_or(BorderStyle {
                color: Color([0xe0, 0xe0, 0xe0]),
                width: border_width,
                inset: 2,
            });
            Some(BorderStyle {
                color: env_or("BADGE_BORDER_COLOR", default_border.color)?,
                width: border_width,
                inset: env_or("BADGE_BORDER_INSET", default_border.inset)?,
            })
        };

        let font_path = match env::var("BADGE_FONT_PATH") {
            Ok(path) if path.trim().is_empty() => None,
            Ok(path) => Some(PathBuf::from(path)),
            Err(_) => defaults.font_path,
        };

        let config = BadgeConfig {
            canvas_width: env_or("BADGE_CANVAS_WIDTH", defaults.canvas_width)?,
            canvas_height: env_or("BADGE_CANVAS_HEIGHT", defaults.canvas_height)?,
            qr_size: env_or("BADGE_QR_SIZE", defaults.qr_size)?,
            qr_margin: env_or("BADGE_QR_MARGIN", defaults.qr_margin)?,
            qr_top: env_or("BADGE_QR_TOP", defaults.qr_top)?,
            error_correction: env_or("BADGE_EC_LEVEL", defaults.error_correction)?,
            background: env_or("BADGE_BACKGROUND", defaults.background)?,
            foreground: env_or("BADGE_FOREGROUND", defaults.foreground)?,
            border,
            font_path,
            font_size: env_or("BADGE_FONT_SIZE", defaults.font_size)?,
            font_weight: env_or("BADGE_FONT_WEIGHT", defaults.font_weight)?,
            label_baseline: env_or("BADGE_LABEL_BASELINE", defaults.label_baseline)?,
            label_align: env_or("BADGE_LABEL_ALIGN", defaults.label_align)?,
            label_padding: env_or("BADGE_LABEL_PADDING", defaults.label_padding)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Left edge of the QR sub-image.
    pub fn qr_left(&self) -> u32 {
        self.canvas_width.saturating_sub(self.qr_size) / 2
    }

    /// Pixel box `(left, top, right, bottom)`, exclusive on the right and bottom, covered by the
    /// QR sub-image and its border.
    pub fn qr_frame(&self) -> (i64, i64, i64, i64) {
        let stroke = i64::from(self.border.map_or(0, |b| b.extent()));
        let (left, top, size) = (
            i64::from(self.qr_left()),
            i64::from(self.qr_top),
            i64::from(self.qr_size),
        );
        (left - stroke, top - stroke, left + size + stroke, top + size + stroke)
    }

    /// Checks that the QR sub-image and its border fit inside the canvas.
    pub fn validate(&self) -> Result<()> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(AppError::Config("Canvas dimensions must be non-zero".to_string()));
        }

        if self.canvas_width > MAX_CANVAS_SIDE || self.canvas_height > MAX_CANVAS_SIDE {
            return Err(
                AppError::Config(
                    format!(
                        "Canvas {}x{} exceeds the {}px limit",
                        self.canvas_width,
                        self.canvas_height,
                        MAX_CANVAS_SIDE
                    )
                )
            );
        }

        if let Some(border) = self.border {
            if border.width > 0 && border.inset == 0 {
                return Err(AppError::Config("Border inset must be at least 1px".to_string()));
            }
        }

        if self.qr_size == 0 {
            return Err(AppError::Config("QR size must be non-zero".to_string()));
        }

        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(AppError::Config("Font size must be a positive number".to_string()));
        }

        let stroke = self.border.map_or(0, |b| b.extent());
        let needed_width = self.qr_size.saturating_add(stroke.saturating_mul(2));
        if needed_width > self.canvas_width {
            return Err(
                AppError::Config(
                    format!(
                        "QR sub-image ({}px with border) is wider than the canvas ({}px)",
                        needed_width,
                        self.canvas_width
                    )
                )
            );
        }

        if self.qr_top < stroke {
            return Err(
                AppError::Config(
                    format!("QR top offset {} leaves no room for the {}px border", self.qr_top, stroke)
                )
            );
        }

        let bottom = self.qr_top.saturating_add(self.qr_size).saturating_add(stroke);
        if bottom > self.canvas_height {
            return Err(
                AppError::Config(
                    format!(
                        "QR sub-image ends at y={} but the canvas is {}px tall",
                        bottom,
                        self.canvas_height
                    )
                )
            );
        }

        if self.label_baseline > self.canvas_height {
            return Err(
                AppError::Config(
                    format!(
                        "Label baseline y={} is below the canvas ({}px)",
                        self.label_baseline,
                        self.canvas_height
                    )
                )
            );
        }

        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub server_host: String,
    pub server_port: u16,
    pub storage_dir: PathBuf,
    pub public_url: String,
    pub badge: BadgeConfig,
}

impl Config {
    pub fn from_env() -> std::result::Result<Self, Box<dyn std::error::Error>> {
        dotenv::dotenv().ok();

        let base_url = env::var("BASE_URL")?.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err("BASE_URL must not be empty".into());
        }

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()?;

        let storage_dir = PathBuf::from(
            env::var("BADGE_STORAGE_DIR").unwrap_or_else(|_| "./uploads".to_string())
        );
        let public_url = env::var("BADGE_PUBLIC_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|_| format!("{}/uploads", base_url));

        let badge = BadgeConfig::from_env()?;

        Ok(Config {
            base_url,
            server_host,
            server_port,
            storage_dir,
            public_url,
            badge,
        })
    }

    /// Scan target for a participant's badge: `<base>/participants/<id>`.
    pub fn participant_url(&self, participant_id: &str) -> String {
        participant_url(&self.base_url, participant_id)
    }
}

pub fn participant_url(base_url: &str, participant_id: &str) -> String {
    format!(
        "{}/participants/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(participant_id)
    )
}

fn env_or<T>(key: &str, default: T) -> std::result::Result<T, Box<dyn std::error::Error>>
    where T: FromStr, T::Err: std::fmt::Display
{
    match env::var(key) {
        Ok(raw) =>
            raw
                .trim()
                .parse()
                .map_err(|e: T::Err| format!("{} has an invalid value '{}': {}", key, raw, e).into()),
        Err(_) => Ok(default),
    }
}
