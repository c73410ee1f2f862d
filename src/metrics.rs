use std::path::Path;

use ab_glyph::{Font, FontVec};
use serde::Serialize;
use tracing::instrument;

use crate::error::{read_file, Error, Result};

/// Vertical metrics of the reference font, in font units.
///
/// Not used by the scorer; reported alongside the classification for
/// comparison against measured token geometry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FontMetrics {
    pub units_per_em: Option<f32>,
    pub ascent: f32,
    pub descent: f32,
    pub line_gap: f32,
    /// Measured from the outline of `x`, when the font has one.
    pub x_height: Option<f32>,
    /// Measured from the outline of `H`, when the font has one.
    pub cap_height: Option<f32>,
}

impl FontMetrics {
    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FontNotFound(path.to_path_buf()));
        }
        Self::from_bytes(read_file(path)?)
    }

    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let font = FontVec::try_from_vec(data)?;
        let metrics = Self::from_font(&font);
        log::debug!("Reference font metrics: {metrics:?}");
        Ok(metrics)
    }

    pub fn from_font(font: &impl Font) -> Self {
        Self {
            units_per_em: font.units_per_em(),
            ascent: font.ascent_unscaled(),
            descent: font.descent_unscaled(),
            line_gap: font.line_gap_unscaled(),
            x_height: glyph_height(font, 'x'),
            cap_height: glyph_height(font, 'H'),
        }
    }
}

fn glyph_height(font: &impl Font, c: char) -> Option<f32> {
    let id = font.glyph_id(c);
    // Glyph 0 is `.notdef`.
    if id.0 == 0 {
        return None;
    }
    font.outline(id).map(|outline| outline.bounds.height())
}
