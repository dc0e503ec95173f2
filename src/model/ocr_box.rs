//! OCR text box type.

use serde::{Deserialize, Serialize};

/// A single OCR-detected text fragment.
///
/// Boxes are immutable once created: fields are private and only readable
/// through accessors. Coordinates use the image pixel space (origin at the
/// top-left corner, y growing downwards).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrBox {
    text: String,
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    confidence: f32,
}

impl OcrBox {
    /// Create a new box. Confidence is clamped to `[0, 1]` (NaN becomes 0).
    pub fn new(text: impl Into<String>, x: f32, y: f32, w: f32, h: f32, confidence: f32) -> Self {
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };

        Self {
            text: text.into(),
            x,
            y,
            w: w.max(0.0),
            h: h.max(0.0),
            confidence,
        }
    }

    /// Recognized text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Left edge.
    pub fn x(&self) -> f32 {
        self.x
    }

    /// Top edge.
    pub fn y(&self) -> f32 {
        self.y
    }

    /// Width.
    pub fn width(&self) -> f32 {
        self.w
    }

    /// Height (the only available font-size proxy).
    pub fn height(&self) -> f32 {
        self.h
    }

    /// Recognition confidence in `[0, 1]`.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        assert_eq!(OcrBox::new("a", 0.0, 0.0, 1.0, 1.0, 1.7).confidence(), 1.0);
        assert_eq!(OcrBox::new("a", 0.0, 0.0, 1.0, 1.0, -0.2).confidence(), 0.0);
        assert_eq!(OcrBox::new("a", 0.0, 0.0, 1.0, 1.0, f32::NAN).confidence(), 0.0);
    }

    #[test]
    fn test_edges() {
        let b = OcrBox::new("word", 10.0, 20.0, 30.0, 12.0, 0.9);
        assert_eq!(b.right(), 40.0);
        assert_eq!(b.bottom(), 32.0);
    }
}
