use serde::Serialize;

/// Pixel-space box of an OCR token, as reported by the OCR engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoundingBox {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(left: u32, top: u32, width: u32, height: u32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// One recognized word, in OCR scan order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub text: String,
    pub bounding_box: BoundingBox,
    /// The OCR engine's own confidence (0-100). Informational only.
    pub ocr_confidence: f32,
}

impl Token {
    pub fn new(text: impl Into<String>, bounding_box: BoundingBox, ocr_confidence: f32) -> Self {
        Self {
            text: text.into(),
            bounding_box,
            ocr_confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TokenScore {
    pub aspect_ratio: f32,
    pub is_rounded: bool,
    pub irregular_baseline: bool,
    pub score: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub is_target_font: bool,
    pub confidence: f32,
    pub analyzed_count: usize,
    pub detected_words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenDiagnostic {
    pub word: String,
    #[serde(flatten)]
    pub score: TokenScore,
}

/// Per-run observations. Never feeds back into the classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Diagnostics {
    pub tokens: Vec<TokenDiagnostic>,
    pub skipped_tokens: usize,
    pub contours_inspected: usize,
    pub rejected_fits: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub result: ClassificationResult,
    pub diagnostics: Diagnostics,
}
