//! Continuation merging: folds wrapped paragraph lines into logical rows.

use std::collections::HashMap;

use crate::model::{Row, TableRange, DEFAULT_MERGE_GAP_FACTOR};

use super::geometry::is_page_continuation;

/// Phrases that mark a line as continuing the previous one (legal prose).
const CONTINUATION_MARKERS: [&str; 7] = [
    "s/o",
    "d/o",
    "w/o",
    "aged about",
    "residing",
    "executed",
    "no.",
];

const ENUMERATORS: [&str; 3] = ["1.", "2.", "3."];

/// Check if a row reads as a numbered party line (`"1. Ram Kumar residing at ..."`).
pub fn is_party_line(first_token: &str, text: &str) -> bool {
    ENUMERATORS.iter().any(|e| first_token.starts_with(e))
        && text.to_lowercase().contains("residing")
}

/// Check if a first token opens a salutation (`"To"`).
pub fn is_salutation_opener(first_token: &str) -> bool {
    first_token.eq_ignore_ascii_case("to")
}

/// Decide whether `curr` continues `prev`.
pub fn should_merge(prev: &str, curr: &str) -> bool {
    let prev = prev.trim();
    let curr = curr.trim();

    let lowercase_start = curr
        .chars()
        .next()
        .map(|c| !c.is_uppercase())
        .unwrap_or(false);
    if !prev.is_empty() && lowercase_start {
        return true;
    }

    if ENUMERATORS.iter().any(|e| curr.starts_with(e)) {
        return true;
    }

    let lower = curr.to_lowercase();
    CONTINUATION_MARKERS.iter().any(|m| lower.contains(m))
}

/// Decide whether row `curr` continues row `prev`.
///
/// Both the merger and the renderer's paragraph buffer go through this
/// check. On top of [`should_merge`] it refuses:
///
/// - page continuation markers and bare page numbers on either side
/// - a salutation buffer, or a row that opens a new salutation
/// - a row that is a numbered party line on its own
/// - a vertical gap wider than `max_gap_factor` mean box heights of `prev`
pub fn should_merge_rows(prev: &Row, curr: &Row, max_gap_factor: f32) -> bool {
    let (Some(prev_first), Some(curr_first)) = (prev.first_token(), curr.first_token()) else {
        return false;
    };
    let prev_text = prev.text();
    let curr_text = curr.text();

    if is_page_continuation(&prev_text) || is_page_continuation(&curr_text) {
        return false;
    }
    if is_salutation_opener(prev_first) {
        return false;
    }
    let capitalized = curr_first.chars().next().is_some_and(char::is_uppercase);
    if capitalized && is_salutation_opener(curr_first) {
        return false;
    }
    if is_party_line(curr_first, &curr_text) {
        return false;
    }
    if !should_merge(&prev_text, &curr_text) {
        return false;
    }

    let gap = curr.top() - prev.bottom();
    gap <= max_gap_factor * prev.mean_height()
}

/// Merges continuation rows, keeping table rows untouched.
#[derive(Debug, Clone)]
pub struct ContinuationMerger {
    max_gap_factor: f32,
}

impl ContinuationMerger {
    /// Create a merger refusing gaps wider than `max_gap_factor` mean box heights.
    pub fn new(max_gap_factor: f32) -> Self {
        Self { max_gap_factor }
    }

    /// Merge rows.
    ///
    /// Returns the merged rows and `tables` re-indexed against them. Rows
    /// inside a table region are never merged.
    pub fn merge(&self, rows: Vec<Row>, tables: &[TableRange]) -> (Vec<Row>, Vec<TableRange>) {
        let input_len = rows.len();
        let mut merged: Vec<Row> = Vec::with_capacity(rows.len());
        let mut remap: HashMap<usize, usize> = HashMap::new();
        let mut buffer: Option<Row> = None;

        for (index, row) in rows.into_iter().enumerate() {
            if tables.iter().any(|t| t.contains(index)) {
                if let Some(open) = buffer.take() {
                    merged.push(open);
                }
                remap.insert(index, merged.len());
                merged.push(row);
                continue;
            }

            buffer = match buffer.take() {
                Some(open) if self.can_merge(&open, &row) => Some(open.merged_with(row)),
                Some(open) => {
                    merged.push(open);
                    Some(row)
                }
                None => Some(row),
            };
        }

        if let Some(open) = buffer {
            merged.push(open);
        }

        let tables = tables
            .iter()
            .filter_map(|t| {
                let start = remap.get(&t.start)?;
                let end = remap.get(&t.end)?;
                Some(TableRange::new(*start, *end, t.cols))
            })
            .collect();

        log::debug!(
            "ContinuationMerger: {} rows -> {} rows",
            input_len,
            merged.len()
        );
        (merged, tables)
    }

    fn can_merge(&self, buffer: &Row, row: &Row) -> bool {
        should_merge_rows(buffer, row, self.max_gap_factor)
    }
}

impl Default for ContinuationMerger {
    fn default() -> Self {
        Self::new(DEFAULT_MERGE_GAP_FACTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OcrBox;

    fn row(text: &str, y: f32) -> Row {
        Row::from_boxes(vec![OcrBox::new(text, 20.0, y, 300.0, 12.0, 0.9)])
    }

    #[test]
    fn test_should_merge() {
        assert!(should_merge("The party agrees", "to pay the sum"));
        assert!(should_merge("", "1. First clause"));
        assert!(should_merge("Ram Kumar", "S/O Shyam Kumar"));
        assert!(should_merge("Tenant", "Residing at 12 Main St"));
        assert!(!should_merge("INVOICE", "Total: 100"));
        assert!(!should_merge("", "text"));
        assert!(!should_merge("a", ""));
    }

    #[test]
    fn test_should_merge_rows_guards() {
        let body = row("The total payable is", 40.0);
        assert!(!should_merge_rows(&body, &row("12", 56.0), 2.5));
        assert!(!should_merge_rows(&body, &row("...3", 56.0), 2.5));
        assert!(!should_merge_rows(&body, &row("pay later", 900.0), 2.5));
        assert!(should_merge_rows(&body, &row("pay later", 56.0), 2.5));

        assert!(!should_merge_rows(&row("To", 0.0), &row("the manager", 16.0), 2.5));
        assert!(!should_merge_rows(&body, &row("To The Manager residing", 56.0), 2.5));
        assert!(!should_merge_rows(
            &row("To", 0.0),
            &row("1. Ram Kumar residing at Delhi", 16.0),
            2.5
        ));
        assert!(should_merge_rows(&row("Ram Kumar", 0.0), &row("residing at Delhi", 16.0), 2.5));
    }

    #[test]
    fn test_party_lines_stay_separate() {
        let rows = vec![
            row("To", 0.0),
            row("1. Ram Kumar residing at Delhi", 16.0),
            row("2. Shyam Lal residing at Agra", 32.0),
        ];
        let (merged, _) = ContinuationMerger::default().merge(rows, &[]);
        let texts: Vec<String> = merged.iter().map(Row::text).collect();
        assert_eq!(
            texts,
            vec!["To", "1. Ram Kumar residing at Delhi", "2. Shyam Lal residing at Agra"]
        );
    }

    #[test]
    fn test_merges_wrapped_lines() {
        let rows = vec![
            row("The tenant shall pay", 0.0),
            row("rent every month", 16.0),
            row("Signed", 32.0),
        ];
        let (merged, _) = ContinuationMerger::default().merge(rows, &[]);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].text(), "The tenant shall pay rent every month");
        assert_eq!(merged[0].line_count(), 2);
    }

    #[test]
    fn test_refuses_large_gap() {
        let rows = vec![row("The tenant shall pay", 0.0), row("rent", 200.0)];
        let (merged, _) = ContinuationMerger::default().merge(rows, &[]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_page_continuation_stands_alone() {
        let rows = vec![row("the end of the page", 0.0), row("...5", 16.0)];
        let (merged, _) = ContinuationMerger::default().merge(rows, &[]);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_tables_are_reindexed() {
        let rows = vec![
            row("Dear sir", 0.0),
            row("please find", 16.0),
            row("item qty", 40.0),
            row("pen 2", 60.0),
            row("thanks", 80.0),
        ];
        let (merged, tables) =
            ContinuationMerger::default().merge(rows, &[TableRange::new(2, 3, 2)]);

        assert_eq!(merged.len(), 4);
        assert_eq!(tables, vec![TableRange::new(1, 2, 2)]);
        assert_eq!(merged[1].text(), "item qty");
        assert_eq!(merged[3].text(), "thanks");
    }
}
