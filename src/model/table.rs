//! Table region type.

use serde::{Deserialize, Serialize};

/// A contiguous, inclusive range of column-aligned rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRange {
    /// First row index
    pub start: usize,

    /// Last row index (inclusive)
    pub end: usize,

    /// Number of columns (tokens per row)
    pub cols: usize,
}

impl TableRange {
    /// Create a new range.
    pub fn new(start: usize, end: usize, cols: usize) -> Self {
        Self { start, end, cols }
    }

    /// Number of rows spanned.
    pub fn row_count(&self) -> usize {
        self.end + 1 - self.start
    }

    /// Check if a row index lies inside the range.
    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index <= self.end
    }

    /// Check if two ranges share any row.
    pub fn overlaps(&self, other: &TableRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_metrics() {
        let t = TableRange::new(2, 4, 3);
        assert_eq!(t.row_count(), 3);
        assert!(t.contains(2));
        assert!(t.contains(4));
        assert!(!t.contains(5));
    }

    #[test]
    fn test_overlap() {
        let a = TableRange::new(0, 2, 2);
        assert!(a.overlaps(&TableRange::new(2, 3, 2)));
        assert!(!a.overlaps(&TableRange::new(3, 5, 2)));
    }
}
