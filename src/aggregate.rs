/// Confidence is reported at this many steps per percent, which keeps `f32`
/// noise in summed weights (0.3 + 0.3 is not exactly 0.6) off the cutoff.
const CONFIDENCE_RESOLUTION: f64 = 1e4;

/// Reduces per-token scores to `(confidence, is_target_font)`.
///
/// Confidence is the mean score as a percentage, `0` for no scores. The
/// verdict requires confidence strictly above `cutoff`.
pub fn aggregate(scores: &[f32], cutoff: f32) -> (f32, bool) {
    if scores.is_empty() {
        return (0.0, false);
    }
    let sum = scores.iter().map(|score| *score as f64).sum::<f64>();
    let confidence = (sum * 100.0) / scores.len() as f64;
    let confidence = (confidence * CONFIDENCE_RESOLUTION).round() / CONFIDENCE_RESOLUTION;
    let confidence = confidence.clamp(0.0, 100.0);
    (confidence as f32, confidence > cutoff as f64)
}
