use std::fmt;
use std::str::FromStr;

use serde::{ Deserialize, Serialize };

use crate::error::AppError;

// ─── ErrorCorrection ─────────────────────────────────────────────────

/// QR error-correction level. Higher levels survive more damage at the cost of capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ErrorCorrection {
    /// ~7% of codewords recoverable.
    L,
    /// ~15%.
    M,
    /// ~25%.
    Q,
    /// ~30%.
    #[default]
    H,
}

impl ErrorCorrection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCorrection::L => "L",
            ErrorCorrection::M => "M",
            ErrorCorrection::Q => "Q",
            ErrorCorrection::H => "H",
        }
    }

    pub fn to_ec_level(self) -> qrcode::EcLevel {
        match self {
            ErrorCorrection::L => qrcode::EcLevel::L,
            ErrorCorrection::M => qrcode::EcLevel::M,
            ErrorCorrection::Q => qrcode::EcLevel::Q,
            ErrorCorrection::H => qrcode::EcLevel::H,
        }
    }

    /// Largest byte-mode payload a version 40 symbol holds at this level.
    pub fn max_byte_capacity(&self) -> usize {
        match self {
            ErrorCorrection::L => 2953,
            ErrorCorrection::M => 2331,
            ErrorCorrection::Q => 1663,
            ErrorCorrection::H => 1273,
        }
    }
}

impl fmt::Display for ErrorCorrection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ErrorCorrection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "L" | "LOW" => Ok(ErrorCorrection::L),
            "M" | "MEDIUM" => Ok(ErrorCorrection::M),
            "Q" | "QUARTILE" => Ok(ErrorCorrection::Q),
            "H" | "HIGH" => Ok(ErrorCorrection::H),
            _ =>
                Err(
                    AppError::InvalidInput(
                        format!("Invalid error correction level: {}. Supported: L, M, Q, H", s)
                    )
                ),
        }
    }
}

// ─── FontWeight ──────────────────────────────────────────────────────

/// Weight of the bundled face used when the preferred label font is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FontWeight {
    Regular,
    #[default]
    Bold,
}

impl FontWeight {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontWeight::Regular => "regular",
            FontWeight::Bold => "bold",
        }
    }
}

impl fmt::Display for FontWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FontWeight {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "regular" | "normal" | "400" => Ok(FontWeight::Regular),
            "bold" | "700" => Ok(FontWeight::Bold),
            _ =>
                Err(
                    AppError::InvalidInput(
                        format!("Invalid font weight: {}. Supported: regular, bold", s)
                    )
                ),
        }
    }
}

// ─── LabelAlign ──────────────────────────────────────────────────────

/// Horizontal anchoring of the label text on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LabelAlign {
    Left,
    #[default]
    Center,
    Right,
}

impl LabelAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            LabelAlign::Left => "left",
            LabelAlign::Center => "center",
            LabelAlign::Right => "right",
        }
    }

    /// Left edge of a run of `text_width` pixels on a canvas `canvas_width` wide.
    /// Left/right alignment keeps a padding of `padding` pixels from the edge.
    pub fn origin_x(&self, canvas_width: u32, text_width: f32, padding: f32) -> f32 {
        let canvas_width = canvas_width as f32;
        match self {
            LabelAlign::Left => padding,
            LabelAlign::Center => (canvas_width - text_width) / 2.0,
            LabelAlign::Right => canvas_width - padding - text_width,
        }
    }
}

impl fmt::Display for LabelAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LabelAlign {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "left" | "start" => Ok(LabelAlign::Left),
            "center" | "centre" | "middle" => Ok(LabelAlign::Center),
            "right" | "end" => Ok(LabelAlign::Right),
            _ =>
                Err(
                    AppError::InvalidInput(
                        format!("Invalid label alignment: {}. Supported: left, center, right", s)
                    )
                ),
        }
    }
}

// ─── Color ───────────────────────────────────────────────────────────

/// Opaque RGB color, written as `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const WHITE: Color = Color([0xff, 0xff, 0xff]);
    pub const BLACK: Color = Color([0x00, 0x00, 0x00]);

    pub fn to_rgb(self) -> image::Rgb<u8> {
        image::Rgb(self.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", hex::encode(self.0))
    }
}

impl FromStr for Color {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim().trim_start_matches('#');
        if digits.len() != 6 {
            return Err(AppError::InvalidInput(format!("Invalid color: {}. Expected #rrggbb", s)));
        }

        let bytes = hex
            ::decode(digits)
            .map_err(|_| AppError::InvalidInput(format!("Invalid color: {}. Expected #rrggbb", s)))?;

        Ok(Color([bytes[0], bytes[1], bytes[2]]))
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
