// Label font resolution.
//
// The preferred face is optional. When it cannot be read or parsed, the bundled DejaVu Sans of
// the requested weight is used instead; that step is not reported to the caller.

use std::fmt;
use std::path::{ Path, PathBuf };
use std::sync::{ Arc, OnceLock };

use rusttype::{ point, Font, PositionedGlyph, Rect, Scale };

use crate::config::BadgeConfig;
use crate::enums::FontWeight;
use crate::error::{ AppError, Result };

static DEJAVU_SANS_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");
static DEJAVU_SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

static SHARED_FONT: OnceLock<Option<Arc<LabelFont>>> = OnceLock::new();

/// Where a resolved face came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontSource {
    Preferred(PathBuf),
    Bundled(FontWeight),
}

/// A parsed face used to draw badge labels.
pub struct LabelFont {
    font: Font<'static>,
    source: FontSource,
}

impl fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabelFont").field("source", &self.source).finish()
    }
}

/// Laid-out label: glyphs positioned on the canvas plus their ink bounds.
pub struct LabelLayout<'a> {
    pub glyphs: Vec<PositionedGlyph<'a>>,
    pub ink: Option<Rect<i32>>,
}

impl LabelFont {
    /// Reads and parses the face at `path`. I/O and parse failures yield `None`.
    pub fn load(path: &Path) -> Option<Self> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("Font {} not readable: {}", path.display(), e);
                return None;
            }
        };

        let font = Self::from_bytes(bytes, FontSource::Preferred(path.to_path_buf()));
        if font.is_none() {
            tracing::debug!("Font {} could not be parsed", path.display());
        }
        font
    }

    /// Parses an in-memory TrueType/OpenType face.
    pub fn from_bytes(bytes: Vec<u8>, source: FontSource) -> Option<Self> {
        Font::try_from_vec(bytes).map(|font| Self { font, source })
    }

    /// DejaVu Sans shipped with the crate.
    pub fn bundled(weight: FontWeight) -> Result<Self> {
        let bytes = match weight {
            FontWeight::Bold => DEJAVU_SANS_BOLD,
            FontWeight::Regular => DEJAVU_SANS,
        };

        Font::try_from_bytes(bytes)
            .map(|font| Self { font, source: FontSource::Bundled(weight) })
            .ok_or_else(|| AppError::Render(format!("Bundled {} sans-serif face is unreadable", weight)))
    }

    pub fn source(&self) -> &FontSource {
        &self.source
    }

    /// Horizontal advance of `text` at `size` pixels.
    pub fn measure(&self, text: &str, size: f32) -> f32 {
        let scale = Scale::uniform(size);
        self.font
            .layout(text, scale, point(0.0, 0.0))
            .map(|g| g.position().x + g.unpositioned().h_metrics().advance_width)
            .fold(0.0_f32, f32::max)
    }

    /// Lays out `text` with its pen starting at `x` on the baseline `baseline`.
    pub fn layout(&self, text: &str, size: f32, x: f32, baseline: f32) -> LabelLayout<'_> {
        let scale = Scale::uniform(size);
        let glyphs: Vec<PositionedGlyph<'_>> = self.font
            .layout(text, scale, point(x, baseline))
            .collect();

        let ink = glyphs
            .iter()
            .filter_map(|g| g.pixel_bounding_box())
            .reduce(|a, b| Rect {
                min: point(a.min.x.min(b.min.x), a.min.y.min(b.min.y)),
                max: point(a.max.x.max(b.max.x), a.max.y.max(b.max.y)),
            });

        LabelLayout { glyphs, ink }
    }
}

/// Preferred face first, then the bundled sans-serif of the requested weight.
pub fn resolve_label_font(preferred: Option<&Path>, weight: FontWeight) -> Result<LabelFont> {
    if let Some(path) = preferred {
        if let Some(font) = LabelFont::load(path) {
            tracing::info!("Loaded label font {}", path.display());
            return Ok(font);
        }
        tracing::warn!("Label font {} not available, using bundled {} sans-serif", path.display(), weight);
    }

    LabelFont::bundled(weight)
}

/// Process-wide label font. Resolved on first call from `config`; later calls reuse the result.
pub fn shared_label_font(config: &BadgeConfig) -> Result<Arc<LabelFont>> {
    SHARED_FONT.get_or_init(|| {
        match resolve_label_font(config.font_path.as_deref(), config.font_weight) {
            Ok(font) => Some(Arc::new(font)),
            Err(e) => {
                tracing::error!("No label font available: {}", e);
                None
            }
        }
    })
        .clone()
        .ok_or_else(|| AppError::Render("No label font available".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_font_is_none() {
        assert!(LabelFont::load(Path::new("/nonexistent/fonts/Poppins-Bold.ttf")).is_none());
    }

    #[test]
    fn test_garbage_font_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.ttf");
        std::fs::write(&path, b"definitely not a font").unwrap();

        assert!(LabelFont::load(&path).is_none());
        assert!(LabelFont::from_bytes(vec![0u8; 16], FontSource::Preferred(path)).is_none());
    }

    #[test]
    fn test_bundled_faces_parse() {
        for weight in [FontWeight::Bold, FontWeight::Regular] {
            let font = LabelFont::bundled(weight).unwrap();
            assert_eq!(font.source(), &FontSource::Bundled(weight));
        }
    }

    #[test]
    fn test_resolve_falls_back_to_bundled() {
        let font = resolve_label_font(
            Some(Path::new("/nonexistent/Poppins-Bold.ttf")),
            FontWeight::Bold
        ).unwrap();
        assert_eq!(font.source(), &FontSource::Bundled(FontWeight::Bold));

        let font = resolve_label_font(None, FontWeight::Regular).unwrap();
        assert_eq!(font.source(), &FontSource::Bundled(FontWeight::Regular));
    }

    #[test]
    fn test_resolve_prefers_readable_face() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Custom.ttf");
        std::fs::write(&path, DEJAVU_SANS).unwrap();

        let font = resolve_label_font(Some(&path), FontWeight::Bold).unwrap();
        assert_eq!(font.source(), &FontSource::Preferred(path));
    }

    #[test]
    fn test_measure_and_layout() {
        let font = LabelFont::bundled(FontWeight::Bold).unwrap();

        let narrow = font.measure("I", 40.0);
        let wide = font.measure("DEL-042", 40.0);
        assert!(wide > narrow);
        assert_eq!(font.measure("", 40.0), 0.0);

        let layout = font.layout("DEL-042", 40.0, 100.0, 610.0);
        assert_eq!(layout.glyphs.len(), 7);
        let ink = layout.ink.unwrap();
        assert!(ink.min.x >= 100);
        assert!(ink.max.y <= 611);
        assert!(ink.min.y < 610);
    }
}
