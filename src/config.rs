//! Tunable constants of the classifier.
//!
//! Every value here is empirical. The defaults reproduce the reference
//! behaviour exactly and should only be changed deliberately.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{read_file, Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Low hysteresis threshold of the edge detector.
    pub canny_low: f32,
    /// High hysteresis threshold of the edge detector.
    pub canny_high: f32,
    /// Contours with fewer points than this are not fitted.
    pub min_contour_points: usize,
    /// Inclusive band, in degrees, of fitted ellipse angles counted as rounded.
    pub rounded_angle: (f32, f32),
    /// Inclusive width/height band typical of the reference font.
    pub aspect_ratio: (f32, f32),
    /// Vertical offset in pixels a neighbour may differ by before the
    /// baseline counts as irregular.
    pub baseline_tolerance: u32,
    /// Confidence percentage that must be exceeded for a positive verdict.
    pub confidence_cutoff: f32,
    pub weights: ScoreWeights,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            canny_low: 50.0,
            canny_high: 150.0,
            min_contour_points: 6,
            rounded_angle: (70.0, 110.0),
            aspect_ratio: (0.4, 0.7),
            baseline_tolerance: 2,
            confidence_cutoff: 60.0,
            weights: ScoreWeights::default(),
        }
    }
}

impl Thresholds {
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = read_file(path)?;
        let source = String::from_utf8(bytes).map_err(|err| Error::Io {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidData, err),
        })?;
        Self::from_toml_str(&source)
    }
}

/// Contribution of each feature to a token's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub aspect_ratio: f32,
    pub rounded: f32,
    pub irregular_baseline: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            aspect_ratio: 0.3,
            rounded: 0.4,
            irregular_baseline: 0.3,
        }
    }
}
