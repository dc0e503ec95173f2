//! Per-row geometry hint types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Layout signals for one row. Every field is optional; `None` means no signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowHints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_centered: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_right_aligned: Option<bool>,

    /// Mean box height, rounded to 0.1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avg_font_height: Option<f32>,

    /// Mean box confidence, rounded to 0.01
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub looks_like_date: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_page_continuation: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indent_level: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub looks_like_table: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_count: Option<usize>,
}

impl RowHints {
    /// Check if no hint is set.
    pub fn is_empty(&self) -> bool {
        *self == RowHints::default()
    }

    pub fn centered(&self) -> bool {
        self.is_centered.unwrap_or(false)
    }

    pub fn right_aligned(&self) -> bool {
        self.is_right_aligned.unwrap_or(false)
    }

    pub fn page_continuation(&self) -> bool {
        self.is_page_continuation.unwrap_or(false)
    }

    pub fn table(&self) -> bool {
        self.looks_like_table.unwrap_or(false)
    }
}

/// Sparse map from row index to hints. Rows without signals have no entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeometryHints {
    rows: BTreeMap<usize, RowHints>,
}

impl GeometryHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert hints for a row; empty hints are not stored.
    pub fn insert(&mut self, index: usize, hints: RowHints) {
        if hints.is_empty() {
            self.rows.remove(&index);
        } else {
            self.rows.insert(index, hints);
        }
    }

    pub fn get(&self, index: usize) -> Option<&RowHints> {
        self.rows.get(&index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &RowHints)> + '_ {
        self.rows.iter().map(|(i, h)| (*i, h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_hints_are_not_stored() {
        let mut hints = GeometryHints::new();
        hints.insert(0, RowHints::default());
        assert!(hints.is_empty());

        hints.insert(
            3,
            RowHints {
                is_centered: Some(true),
                ..Default::default()
            },
        );
        assert_eq!(hints.len(), 1);
        assert!(hints.get(3).unwrap().centered());
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let mut hints = GeometryHints::new();
        hints.insert(
            2,
            RowHints {
                looks_like_date: Some(true),
                ..Default::default()
            },
        );
        let json = serde_json::to_string(&hints).unwrap();
        assert_eq!(json, r#"{"2":{"looks_like_date":true}}"#);
    }
}
