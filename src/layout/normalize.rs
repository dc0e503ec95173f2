//! Conversion of raw OCR detections into canonical boxes.

use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::model::OcrBox;
use crate::ocr::OcrDetection;

use super::LayoutOptions;

/// Normalize detections into boxes.
///
/// Corner coordinates may come in any order. Text is NFC-normalized with
/// whitespace runs collapsed. Empty text, non-finite geometry and boxes
/// under `min_box_confidence` are dropped.
pub fn normalize(detections: &[OcrDetection], options: &LayoutOptions) -> Result<Vec<OcrBox>> {
    if detections.is_empty() {
        return Err(Error::EmptyOcrResult);
    }

    let mut boxes = Vec::with_capacity(detections.len());
    let mut low_confidence = 0;

    for (i, detection) in detections.iter().enumerate() {
        let [x1, y1, x2, y2] = detection.bbox;
        if !detection.bbox.iter().all(|v| v.is_finite()) {
            log::warn!("Dropping detection {}: non-finite bbox {:?}", i, detection.bbox);
            continue;
        }

        let text = clean_text(&detection.text);
        if text.is_empty() {
            continue;
        }

        let confidence = if detection.confidence.is_nan() {
            0.0
        } else {
            detection.confidence
        };
        if confidence < options.min_box_confidence {
            low_confidence += 1;
            continue;
        }

        boxes.push(OcrBox::new(
            text,
            x1.min(x2),
            y1.min(y2),
            (x2 - x1).abs(),
            (y2 - y1).abs(),
            confidence,
        ));
    }

    log::debug!(
        "normalize: {} detections -> {} boxes ({} below confidence floor)",
        detections.len(),
        boxes.len(),
        low_confidence
    );

    if boxes.is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(boxes)
}

/// NFC-normalize, trim and collapse internal whitespace.
pub fn clean_text(text: &str) -> String {
    let composed: String = text.nfc().collect();
    composed.split_whitespace().collect::<Vec<_>>().join(" ")
}
