//! JSON rendering for classified documents.

use crate::error::{Error, Result};
use crate::model::{ClassifiedDocument, GeometryHints};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Convert a classified document to JSON.
pub fn to_json(doc: &ClassifiedDocument, format: JsonFormat) -> Result<String> {
    serialize(doc, format)
}

/// Convert geometry hints to JSON (`{"<row>": {...}}`).
pub fn hints_to_json(hints: &GeometryHints, format: JsonFormat) -> Result<String> {
    serialize(hints, format)
}

fn serialize<T: serde::Serialize>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Label, OcrBox, Row, RowHints};
    use std::collections::BTreeMap;

    fn sample() -> ClassifiedDocument {
        let rows = vec![Row::from_boxes(vec![OcrBox::new("Hello", 0.0, 0.0, 10.0, 10.0, 0.9)])];
        let mut labels = BTreeMap::new();
        labels.insert(0, Label::DocTitle);
        ClassifiedDocument::assemble(rows, &[], &labels, 800.0, GeometryHints::new())
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"doc-title\""));
        assert!(json.contains("\"kind\": \"row\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_hints_to_json() {
        let mut hints = GeometryHints::new();
        hints.insert(
            1,
            RowHints {
                is_right_aligned: Some(true),
                ..Default::default()
            },
        );
        assert_eq!(
            hints_to_json(&hints, JsonFormat::Compact).unwrap(),
            r#"{"1":{"is_right_aligned":true}}"#
        );
    }
}
