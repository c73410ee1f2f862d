use std::path::Path;

mod aggregate;
pub mod baseline;
pub mod config;
pub mod ellipse;
mod error;
pub mod metrics;
mod result;
pub mod scorer;
pub mod shape;
pub mod tokens;
mod util;

use image::DynamicImage;
use tracing::instrument;

pub use aggregate::aggregate;
pub use config::{ScoreWeights, Thresholds};
pub use error::{Error, Result};
pub use metrics::FontMetrics;
pub use result::*;
use scorer::TokenScorer;
pub use tokens::{TokenSource, TsvTokens};

pub struct FontDetectorBuilder {
    thresholds: Thresholds,
}

impl FontDetectorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn canny_thresholds(mut self, low: f32, high: f32) -> Self {
        self.thresholds.canny_low = low;
        self.thresholds.canny_high = high;
        self
    }

    pub fn min_contour_points(mut self, points: usize) -> Self {
        self.thresholds.min_contour_points = points;
        self
    }

    pub fn rounded_angle(mut self, min_degrees: f32, max_degrees: f32) -> Self {
        self.thresholds.rounded_angle = (min_degrees, max_degrees);
        self
    }

    pub fn aspect_ratio(mut self, min: f32, max: f32) -> Self {
        self.thresholds.aspect_ratio = (min, max);
        self
    }

    pub fn baseline_tolerance(mut self, pixels: u32) -> Self {
        self.thresholds.baseline_tolerance = pixels;
        self
    }

    pub fn confidence_cutoff(mut self, percent: f32) -> Self {
        self.thresholds.confidence_cutoff = percent;
        self
    }

    pub fn weights(mut self, weights: ScoreWeights) -> Self {
        self.thresholds.weights = weights;
        self
    }

    /// Loads thresholds from a TOML file, replacing any set so far.
    pub fn config_file(self, path: impl AsRef<Path>) -> Result<Self> {
        Ok(self.thresholds(Thresholds::from_toml_file(path)?))
    }

    #[instrument(skip(self))]
    pub fn build(self) -> FontDetector {
        log::debug!("Detector thresholds: {:?}", self.thresholds);
        FontDetector {
            scorer: TokenScorer::new(&self.thresholds),
            thresholds: self.thresholds,
        }
    }
}

impl Default for FontDetectorBuilder {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
        }
    }
}

/// Decides whether the words in an image were set in the rounded,
/// irregular-baseline reference font.
pub struct FontDetector {
    scorer: TokenScorer,
    thresholds: Thresholds,
}

impl FontDetector {
    /// Scores every token and aggregates the scores.
    ///
    /// `tokens` must be in OCR scan order; each token's baseline is compared
    /// to the one after it. Zero-area tokens are skipped and do not count
    /// towards the confidence.
    #[instrument(skip(self, image, tokens), fields(count = tokens.len()))]
    pub fn classify(&self, image: &DynamicImage, tokens: &[Token]) -> Analysis {
        let mut diagnostics = Diagnostics::default();
        let mut scores = Vec::with_capacity(tokens.len());

        for (index, token) in tokens.iter().enumerate() {
            let Some((score, report)) = self.scorer.score_with_report(image, tokens, index) else {
                diagnostics.skipped_tokens += 1;
                continue;
            };
            diagnostics.contours_inspected += report.contours_inspected;
            diagnostics.rejected_fits += report.rejected_fits;
            diagnostics.tokens.push(TokenDiagnostic {
                word: token.text.trim().to_string(),
                score,
            });
            scores.push(score.score);
        }

        let (confidence, is_target_font) = aggregate(&scores, self.thresholds.confidence_cutoff);
        let result = ClassificationResult {
            is_target_font,
            confidence,
            analyzed_count: scores.len(),
            detected_words: tokens
                .iter()
                .map(|token| token.text.trim())
                .filter(|text| !text.is_empty())
                .map(str::to_string)
                .collect(),
        };
        log::debug!(
            "Classified {} of {} tokens: {confidence:.2}% (match: {is_target_font})",
            result.analyzed_count,
            tokens.len()
        );

        Analysis {
            result,
            diagnostics,
        }
    }

    /// Fetches tokens from `source` and classifies them.
    pub fn classify_with(
        &self,
        source: &impl TokenSource,
        image: &DynamicImage,
    ) -> Result<Analysis> {
        let tokens = source.tokens(image)?;
        Ok(self.classify(image, &tokens))
    }
}

impl Default for FontDetector {
    fn default() -> Self {
        FontDetectorBuilder::default().build()
    }
}
