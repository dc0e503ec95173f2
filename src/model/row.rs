//! Text row type.

use serde::{Deserialize, Serialize};

use super::OcrBox;

/// A horizontal cluster of boxes.
///
/// A freshly grouped row holds exactly one visual line. The continuation
/// merger may fold further lines into it; each visual line keeps its boxes
/// sorted by x, and lines stay in reading order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    boxes: Vec<OcrBox>,
    /// Start offset of each visual line inside `boxes`; the first entry is 0.
    line_starts: Vec<usize>,
}

impl Row {
    /// Create a single-line row, sorting the boxes by x.
    pub fn from_boxes(mut boxes: Vec<OcrBox>) -> Self {
        boxes.sort_by(|a, b| a.x().total_cmp(&b.x()));
        Self {
            boxes,
            line_starts: vec![0],
        }
    }

    /// All boxes in reading order.
    pub fn boxes(&self) -> &[OcrBox] {
        &self.boxes
    }

    /// Visual lines of this row, top to bottom.
    pub fn lines(&self) -> impl Iterator<Item = &[OcrBox]> + '_ {
        self.line_starts.iter().enumerate().map(move |(i, &start)| {
            let end = self
                .line_starts
                .get(i + 1)
                .copied()
                .unwrap_or(self.boxes.len());
            &self.boxes[start..end]
        })
    }

    /// Number of visual lines folded into this row.
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Number of boxes (tokens).
    pub fn token_count(&self) -> usize {
        self.boxes.len()
    }

    /// Check if the row has no boxes.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }

    /// Return a new row with `other`'s lines appended below this row's lines.
    pub fn merged_with(mut self, other: Row) -> Row {
        let offset = self.boxes.len();
        self.line_starts
            .extend(other.line_starts.iter().map(|start| start + offset));
        self.boxes.extend(other.boxes);
        self
    }

    /// Leftmost x.
    pub fn left(&self) -> f32 {
        self.boxes
            .iter()
            .map(OcrBox::x)
            .fold(f32::INFINITY, f32::min)
    }

    /// Rightmost edge (`max(x + w)`).
    pub fn right(&self) -> f32 {
        self.boxes
            .iter()
            .map(OcrBox::right)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Topmost y.
    pub fn top(&self) -> f32 {
        self.boxes
            .iter()
            .map(OcrBox::y)
            .fold(f32::INFINITY, f32::min)
    }

    /// Lowest bottom edge.
    pub fn bottom(&self) -> f32 {
        self.boxes
            .iter()
            .map(OcrBox::bottom)
            .fold(f32::NEG_INFINITY, f32::max)
    }

    /// Horizontal extent.
    pub fn width(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        self.right() - self.left()
    }

    /// Horizontal center of the row extent.
    pub fn center(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        (self.left() + self.right()) / 2.0
    }

    /// Y of the first box, used as the row's vertical anchor.
    pub fn y(&self) -> f32 {
        self.boxes.first().map(OcrBox::y).unwrap_or(0.0)
    }

    /// Mean box confidence (0 for an empty row).
    pub fn mean_confidence(&self) -> f32 {
        mean(self.boxes.iter().map(OcrBox::confidence))
    }

    /// Mean box height, the font-size proxy.
    pub fn mean_height(&self) -> f32 {
        mean(self.boxes.iter().map(OcrBox::height))
    }

    /// Box texts joined by single spaces, trimmed.
    pub fn text(&self) -> String {
        join_texts(&self.boxes)
    }

    /// Text of the first non-blank box.
    pub fn first_token(&self) -> Option<&str> {
        self.boxes
            .iter()
            .map(|b| b.text().trim())
            .find(|t| !t.is_empty())
    }
}

/// Join box texts with single spaces, skipping blank boxes.
pub(crate) fn join_texts(boxes: &[OcrBox]) -> String {
    boxes
        .iter()
        .map(|b| b.text().trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn mean(values: impl Iterator<Item = f32>) -> f32 {
    let (sum, count) = values.fold((0.0f32, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(text: &str, x: f32, y: f32) -> OcrBox {
        OcrBox::new(text, x, y, 40.0, 10.0, 0.8)
    }

    #[test]
    fn test_row_sorts_by_x() {
        let row = Row::from_boxes(vec![b("world", 100.0, 5.0), b("hello", 10.0, 6.0)]);
        assert_eq!(row.text(), "hello world");
        assert_eq!(row.left(), 10.0);
        assert_eq!(row.right(), 140.0);
        assert_eq!(row.width(), 130.0);
        assert_eq!(row.line_count(), 1);
    }

    #[test]
    fn test_merged_row_keeps_line_order() {
        let first = Row::from_boxes(vec![b("first", 10.0, 0.0), b("line", 60.0, 0.0)]);
        let second = Row::from_boxes(vec![b("second", 5.0, 20.0)]);
        let merged = first.merged_with(second);

        assert_eq!(merged.text(), "first line second");
        assert_eq!(merged.line_count(), 2);
        let lines: Vec<usize> = merged.lines().map(|l| l.len()).collect();
        assert_eq!(lines, vec![2, 1]);
    }

    #[test]
    fn test_empty_row_metrics() {
        let row = Row::from_boxes(vec![]);
        assert!(row.is_empty());
        assert_eq!(row.width(), 0.0);
        assert_eq!(row.mean_confidence(), 0.0);
        assert_eq!(row.first_token(), None);
    }
}
