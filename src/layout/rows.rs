//! Row grouping by vertical proximity.

use crate::model::{OcrBox, Row};

/// Group boxes into rows.
///
/// Boxes are swept in `(y, x)` order. A box joins the open row when its y is
/// within `threshold` of the most recently appended box; otherwise the row
/// is closed. Threshold comparison is inclusive.
pub fn group_rows(boxes: &[OcrBox], threshold: f32) -> Vec<Row> {
    let mut sorted: Vec<OcrBox> = boxes.to_vec();
    sorted.sort_by(|a, b| a.y().total_cmp(&b.y()).then(a.x().total_cmp(&b.x())));

    let mut rows = Vec::new();
    let mut current: Vec<OcrBox> = Vec::new();

    for b in sorted {
        let joins = current
            .last()
            .map(|last| (b.y() - last.y()).abs() <= threshold)
            .unwrap_or(true);

        if !joins {
            rows.push(Row::from_boxes(std::mem::take(&mut current)));
        }
        current.push(b);
    }

    if !current.is_empty() {
        rows.push(Row::from_boxes(current));
    }

    log::debug!("group_rows: {} boxes -> {} rows", boxes.len(), rows.len());
    rows
}
