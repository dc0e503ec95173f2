//! OCR boundary types.
//!
//! Recognition itself happens outside this crate. Any engine that can
//! produce [`OcrDetection`] values plugs in through [`OcrEngine`]; the core
//! never sees an engine's native output shape.

use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One recognized text fragment as reported by an OCR engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrDetection {
    /// Recognized text
    pub text: String,

    /// Recognition confidence, expected in `[0, 1]`
    pub confidence: f32,

    /// Bounding box as `(x1, y1, x2, y2)`
    pub bbox: [f32; 4],
}

impl OcrDetection {
    /// Create a detection from corner coordinates.
    pub fn new(text: impl Into<String>, confidence: f32, bbox: [f32; 4]) -> Self {
        Self {
            text: text.into(),
            confidence,
            bbox,
        }
    }
}

/// An OCR engine: image bytes in, detections out.
pub trait OcrEngine: Send + Sync {
    /// Recognize text in an encoded image.
    fn detect(&self, image: &[u8]) -> Result<Vec<OcrDetection>>;

    /// Engine name, for logs.
    fn name(&self) -> &str {
        "ocr"
    }
}

/// Pre-recognized detections served as an engine.
///
/// Used when recognition already ran elsewhere (the CLI reads detections
/// from JSON) and in tests.
#[derive(Debug, Clone, Default)]
pub struct StaticOcr {
    detections: Vec<OcrDetection>,
}

impl StaticOcr {
    pub fn new(detections: Vec<OcrDetection>) -> Self {
        Self { detections }
    }
}

impl OcrEngine for StaticOcr {
    fn detect(&self, _image: &[u8]) -> Result<Vec<OcrDetection>> {
        Ok(self.detections.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// A recognized page: its pixel width plus detections.
///
/// This is the on-disk format consumed by the CLI:
///
/// ```json
/// { "page_width": 1240,
///   "detections": [ { "text": "INVOICE", "confidence": 0.97, "bbox": [560, 40, 680, 70] } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrPage {
    /// Page width in pixels
    pub page_width: f32,

    /// Detections in engine order (no ordering assumed)
    pub detections: Vec<OcrDetection>,
}

impl OcrPage {
    pub fn new(page_width: f32, detections: Vec<OcrDetection>) -> Self {
        Self {
            page_width,
            detections,
        }
    }

    /// Parse a page from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidInput(format!("malformed OCR page: {}", e)))
    }

    /// Read a page from a JSON reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = String::new();
        reader.read_to_string(&mut data)?;
        if data.trim().is_empty() {
            return Err(Error::EmptyInput);
        }
        Self::from_json(&data)
    }

    /// Read a page from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = fs::File::open(path)?;
        Self::from_reader(file)
    }
}
