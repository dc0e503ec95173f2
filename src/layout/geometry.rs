//! Per-row geometry hints.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{GeometryHints, Row, RowHints, TableRange};

static DATE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}[./-]\d{1,2}[./-]\d{2,4}").unwrap());

/// Center deviation allowed for a centered row, as a page fraction.
const CENTER_TOLERANCE: f32 = 0.03;
/// Centered rows must be narrower than this page fraction.
const CENTER_MAX_WIDTH: f32 = 0.6;
/// Rows starting right of this page fraction are right-aligned.
const RIGHT_ALIGN_START: f32 = 0.55;
/// Only rows wider than this page fraction get an indent level.
const INDENT_MIN_WIDTH: f32 = 0.4;
/// One indent step, as a page fraction.
const INDENT_STEP: f32 = 0.05;

/// Check that a page width is usable for geometry.
pub fn validate_page_width(page_width: f32) -> Result<()> {
    if !page_width.is_finite() || page_width <= 0.0 {
        return Err(Error::InvalidInput(format!(
            "page width must be positive, got {}",
            page_width
        )));
    }
    Ok(())
}

/// Check if a row is centered and narrow (title-like).
pub fn is_centered(row: &Row, page_width: f32) -> bool {
    if row.is_empty() {
        return false;
    }
    (row.center() - page_width / 2.0).abs() < page_width * CENTER_TOLERANCE
        && row.width() < page_width * CENTER_MAX_WIDTH
}

/// Check if a row starts in the right part of the page.
pub fn is_right_aligned(row: &Row, page_width: f32) -> bool {
    !row.is_empty() && row.left() > page_width * RIGHT_ALIGN_START
}

/// Check if text contains a numeric date such as `12/03/2024`.
pub fn looks_like_date(text: &str) -> bool {
    DATE_PATTERN.is_match(text)
}

/// Check if text marks a page continuation (`"..."` prefix or a bare page number).
pub fn is_page_continuation(text: &str) -> bool {
    let text = text.trim();
    text.starts_with("...") || (!text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()))
}

/// Median box x over the document (upper median for even counts).
pub fn baseline_x(rows: &[Row]) -> f32 {
    let mut xs: Vec<f32> = rows
        .iter()
        .flat_map(|r| r.boxes().iter().map(|b| b.x()))
        .collect();
    if xs.is_empty() {
        return 0.0;
    }
    xs.sort_by(f32::total_cmp);
    xs[xs.len() / 2]
}

/// Compute hints for every row.
///
/// `tables` are injected as `looks_like_table`/`column_count` on the rows
/// they cover.
pub fn extract_hints(rows: &[Row], page_width: f32, tables: &[TableRange]) -> Result<GeometryHints> {
    validate_page_width(page_width)?;

    let baseline = baseline_x(rows);
    let mut hints = GeometryHints::new();

    for (i, row) in rows.iter().enumerate() {
        if row.is_empty() {
            continue;
        }
        let mut hint = row_hints(row, page_width, baseline);

        if let Some(table) = tables.iter().find(|t| t.contains(i)) {
            hint.looks_like_table = Some(true);
            hint.column_count = Some(table.cols);
        }

        hints.insert(i, hint);
    }

    log::debug!(
        "extract_hints: {} rows, baseline x {:.1}, {} hinted",
        rows.len(),
        baseline,
        hints.len()
    );
    Ok(hints)
}

fn row_hints(row: &Row, page_width: f32, baseline: f32) -> RowHints {
    let text = row.text();
    let mut hint = RowHints {
        avg_font_height: Some(round_to(row.mean_height(), 10.0)),
        confidence: Some(round_to(row.mean_confidence(), 100.0)),
        ..Default::default()
    };

    if is_centered(row, page_width) {
        hint.is_centered = Some(true);
    }
    if is_right_aligned(row, page_width) {
        hint.is_right_aligned = Some(true);
    }
    if looks_like_date(&text) {
        hint.looks_like_date = Some(true);
    }
    if is_page_continuation(&text) {
        hint.is_page_continuation = Some(true);
    }

    if row.width() > page_width * INDENT_MIN_WIDTH {
        let step = page_width * INDENT_STEP;
        let indent_px = row.left() - baseline;
        if indent_px > step {
            hint.indent_level = Some((indent_px / step).floor() as u32);
        }
    }

    hint
}

fn round_to(value: f32, scale: f32) -> f32 {
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OcrBox;

    fn row(boxes: &[(&str, f32, f32)]) -> Row {
        Row::from_boxes(
            boxes
                .iter()
                .map(|(t, x, w)| OcrBox::new(*t, *x, 100.0, *w, 14.0, 0.876))
                .collect(),
        )
    }

    #[test]
    fn test_centered_and_right_aligned() {
        let title = row(&[("INVOICE", 350.0, 100.0)]);
        assert!(is_centered(&title, 800.0));
        assert!(!is_right_aligned(&title, 800.0));

        let wide = row(&[("a", 50.0, 700.0)]);
        assert!(!is_centered(&wide, 800.0));

        let date = row(&[("12/03/2024", 600.0, 100.0)]);
        assert!(is_right_aligned(&date, 800.0));
    }

    #[test]
    fn test_text_signals() {
        assert!(looks_like_date("Date: 5-6-24"));
        assert!(!looks_like_date("Total 100"));
        assert!(is_page_continuation("...5"));
        assert!(is_page_continuation("12"));
        assert!(!is_page_continuation("12a"));
        assert!(!is_page_continuation(""));
    }

    #[test]
    fn test_rounded_signals() {
        let rows = vec![row(&[("text", 10.0, 50.0)])];
        let hints = extract_hints(&rows, 800.0, &[]).unwrap();
        let h = hints.get(0).unwrap();
        assert_eq!(h.avg_font_height, Some(14.0));
        assert_eq!(h.confidence, Some(0.88));
    }

    #[test]
    fn test_indent_level() {
        let rows = vec![
            row(&[("a", 40.0, 400.0)]),
            row(&[("b", 40.0, 400.0)]),
            row(&[("c", 130.0, 400.0)]),
        ];
        let hints = extract_hints(&rows, 800.0, &[]).unwrap();
        // 90px indent over a 40px step
        assert_eq!(hints.get(2).unwrap().indent_level, Some(2));
        assert_eq!(hints.get(0).unwrap().indent_level, None);
    }

    #[test]
    fn test_table_injection() {
        let rows = vec![row(&[("a", 10.0, 20.0), ("b", 200.0, 20.0)])];
        let hints = extract_hints(&rows, 800.0, &[TableRange::new(0, 0, 2)]).unwrap();
        let h = hints.get(0).unwrap();
        assert!(h.table());
        assert_eq!(h.column_count, Some(2));
    }

    #[test]
    fn test_invalid_page_width() {
        assert!(matches!(
            extract_hints(&[], 0.0, &[]),
            Err(Error::InvalidInput(_))
        ));
        assert!(extract_hints(&[], f32::NAN, &[]).is_err());
    }
}
