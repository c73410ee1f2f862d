use image::DynamicImage;
use tracing::instrument;

use crate::{
    baseline::BaselineAnalyzer,
    config::{ScoreWeights, Thresholds},
    shape::{ShapeAnalyzer, ShapeReport},
    util::part_image,
    Token, TokenScore,
};

/// Combines the per-token features into a weighted score in `[0, 1]`.
#[derive(Debug, Clone, Copy)]
pub struct TokenScorer {
    shape: ShapeAnalyzer,
    baseline: BaselineAnalyzer,
    aspect_band: (f32, f32),
    weights: ScoreWeights,
}

impl TokenScorer {
    pub fn new(thresholds: &Thresholds) -> Self {
        Self {
            shape: ShapeAnalyzer::new(thresholds),
            baseline: BaselineAnalyzer::new(thresholds.baseline_tolerance),
            aspect_band: thresholds.aspect_ratio,
            weights: thresholds.weights,
        }
    }

    /// Scores `tokens[index]` against the image. `None` for zero-area boxes.
    pub fn score(
        &self,
        image: &DynamicImage,
        tokens: &[Token],
        index: usize,
    ) -> Option<TokenScore> {
        self.score_with_report(image, tokens, index).map(|(score, _)| score)
    }

    #[instrument(level = "trace", skip(self, image, tokens))]
    pub(crate) fn score_with_report(
        &self,
        image: &DynamicImage,
        tokens: &[Token],
        index: usize,
    ) -> Option<(TokenScore, ShapeReport)> {
        let token = tokens.get(index)?;
        let b_box = &token.bounding_box;
        if b_box.is_empty() {
            log::debug!("Skipping zero-area token {:?}", token.text);
            return None;
        }

        let aspect_ratio = b_box.width as f32 / b_box.height as f32;
        let patch = part_image(image, b_box);
        let report = self.shape.analyze(&patch);
        #[cfg(feature = "debug")]
        save_debug_patch(&self.shape, &patch, index);
        let irregular_baseline = self.baseline.check(tokens, index);

        let score = TokenScore {
            aspect_ratio,
            is_rounded: report.is_rounded,
            irregular_baseline,
            score: self.weigh(aspect_ratio, report.is_rounded, irregular_baseline),
        };
        log::trace!("Token {:?} scored {score:?}", token.text);
        Some((score, report))
    }

    pub fn weigh(&self, aspect_ratio: f32, is_rounded: bool, irregular_baseline: bool) -> f32 {
        let mut score = 0.0;
        if aspect_ratio >= self.aspect_band.0 && aspect_ratio <= self.aspect_band.1 {
            score += self.weights.aspect_ratio;
        }
        if is_rounded {
            score += self.weights.rounded;
        }
        if irregular_baseline {
            score += self.weights.irregular_baseline;
        }
        score.clamp(0.0, 1.0)
    }
}

impl Default for TokenScorer {
    fn default() -> Self {
        Self::new(&Thresholds::default())
    }
}

#[cfg(feature = "debug")]
fn save_debug_patch(shape: &ShapeAnalyzer, patch: &image::GrayImage, index: usize) {
    if patch.width() == 0 || patch.height() == 0 {
        return;
    }
    let saved = std::fs::create_dir_all("part_images")
        .map_err(image::ImageError::IoError)
        .and_then(|_| patch.save(format!("part_images/{index}.png")))
        .and_then(|_| shape.edge_map(patch).save(format!("part_images/{index}_edges.png")));
    if let Err(err) = saved {
        log::warn!("Failed to save debug patch {index}: {err}");
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgb, RgbImage};

    use super::*;
    use crate::BoundingBox;

    fn blank(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])))
    }

    #[test]
    fn weights_follow_feature_strength() {
        let scorer = TokenScorer::default();
        assert!((scorer.weigh(0.5, true, false) - 0.7).abs() < 1e-6);
        assert_eq!(scorer.weigh(1.2, false, false), 0.0);
        assert!((scorer.weigh(0.4, true, true) - 1.0).abs() < 1e-6);
        assert!((scorer.weigh(0.7, false, false) - 0.3).abs() < 1e-6);
        assert!((scorer.weigh(3.0, false, true) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn oversized_weights_are_clamped() {
        let thresholds = Thresholds {
            weights: ScoreWeights {
                aspect_ratio: 0.9,
                rounded: 0.9,
                irregular_baseline: 0.9,
            },
            ..Thresholds::default()
        };
        assert_eq!(TokenScorer::new(&thresholds).weigh(0.5, true, true), 1.0);
    }

    #[test]
    fn zero_area_tokens_are_skipped() {
        let image = blank(100, 100);
        let tokens = vec![
            Token::new("a", BoundingBox::new(0, 0, 0, 10), 90.0),
            Token::new("b", BoundingBox::new(0, 0, 10, 0), 90.0),
        ];
        let scorer = TokenScorer::default();
        assert_eq!(scorer.score(&image, &tokens, 0), None);
        assert_eq!(scorer.score(&image, &tokens, 1), None);
        assert_eq!(scorer.score(&image, &tokens, 2), None);
    }

    #[test]
    fn blank_token_scores_on_aspect_only() {
        let image = blank(100, 100);
        let tokens = vec![Token::new("hi", BoundingBox::new(10, 10, 10, 20), 90.0)];
        let score = TokenScorer::default().score(&image, &tokens, 0).unwrap();
        assert_eq!(score.aspect_ratio, 0.5);
        assert!(!score.is_rounded);
        assert!(!score.irregular_baseline);
        assert!((score.score - 0.3).abs() < 1e-6);
    }
}
