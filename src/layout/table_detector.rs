//! Table detection by column alignment of adjacent rows.
//!
//! Two neighbouring rows are table-like when they carry the same number of
//! tokens and each token starts at roughly the same x as its counterpart in
//! the row above. Runs of such rows become table regions.

use crate::model::{Row, TableRange};

/// Table detector configuration.
#[derive(Debug, Clone)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of tokens per row
    pub min_columns: usize,
    /// Maximum x drift between aligned tokens (pixels)
    pub x_tolerance: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            x_tolerance: 12.0,
        }
    }
}

/// Detects table regions in a list of rows.
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a new table detector with default configuration.
    pub fn new() -> Self {
        Self {
            config: TableDetectorConfig::default(),
        }
    }

    /// Create a new table detector with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect table regions.
    ///
    /// Returned ranges are sorted and disjoint. A run stops at the first
    /// pair that does not align; scanning resumes after it.
    pub fn detect(&self, rows: &[Row]) -> Vec<TableRange> {
        log::debug!("TableDetector: starting with {} rows", rows.len());

        let mut tables = Vec::new();
        let mut i = 0;

        while i + 1 < rows.len() {
            if !self.is_aligned(&rows[i], &rows[i + 1]) {
                i += 1;
                continue;
            }

            let mut end = i + 1;
            while end + 1 < rows.len() && self.is_aligned(&rows[end], &rows[end + 1]) {
                end += 1;
            }

            let run = end - i + 1;
            if run >= self.config.min_rows {
                let cols = rows[i].token_count();
                log::debug!(
                    "TableDetector: table at rows {}..={} with {} columns",
                    i,
                    end,
                    cols
                );
                tables.push(TableRange::new(i, end, cols));
            } else {
                log::debug!(
                    "TableDetector: run {}..={} too short ({} < {})",
                    i,
                    end,
                    run,
                    self.config.min_rows
                );
            }
            i = end + 1;
        }

        log::debug!("TableDetector: found {} table regions", tables.len());
        tables
    }

    /// Check if `next` repeats the column layout of `prev`.
    fn is_aligned(&self, prev: &Row, next: &Row) -> bool {
        let cols = prev.token_count();
        if cols < self.config.min_columns || next.token_count() != cols {
            return false;
        }

        prev.boxes()
            .iter()
            .zip(next.boxes())
            .all(|(a, b)| (a.x() - b.x()).abs() <= self.config.x_tolerance)
    }
}

impl Default for TableDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::OcrBox;

    fn row(y: f32, xs: &[f32]) -> Row {
        Row::from_boxes(
            xs.iter()
                .enumerate()
                .map(|(i, x)| OcrBox::new(format!("c{}", i), *x, y, 40.0, 10.0, 0.9))
                .collect(),
        )
    }

    #[test]
    fn test_detects_aligned_run() {
        let rows = vec![
            row(0.0, &[10.0, 200.0, 400.0]),
            row(20.0, &[12.0, 205.0, 398.0]),
            row(40.0, &[9.0, 201.0, 402.0]),
        ];
        let tables = TableDetector::new().detect(&rows);
        assert_eq!(tables, vec![TableRange::new(0, 2, 3)]);
    }

    #[test]
    fn test_run_stops_at_mismatch() {
        let rows = vec![
            row(0.0, &[10.0, 200.0]),
            row(20.0, &[10.0, 200.0]),
            row(40.0, &[10.0, 300.0]),
            row(60.0, &[10.0]),
        ];
        let tables = TableDetector::new().detect(&rows);
        assert_eq!(tables, vec![TableRange::new(0, 1, 2)]);
    }

    #[test]
    fn test_single_token_rows_are_not_tables() {
        let rows = vec![row(0.0, &[10.0]), row(20.0, &[10.0]), row(40.0, &[10.0])];
        assert!(TableDetector::new().detect(&rows).is_empty());
    }

    #[test]
    fn test_min_rows() {
        let detector = TableDetector::with_config(TableDetectorConfig {
            min_rows: 3,
            ..Default::default()
        });
        let rows = vec![row(0.0, &[10.0, 200.0]), row(20.0, &[10.0, 200.0])];
        assert!(detector.detect(&rows).is_empty());
    }

    #[test]
    fn test_two_disjoint_tables() {
        let rows = vec![
            row(0.0, &[10.0, 200.0]),
            row(20.0, &[10.0, 200.0]),
            row(40.0, &[10.0, 200.0, 400.0]),
            row(60.0, &[10.0, 200.0, 400.0]),
        ];
        let tables = TableDetector::new().detect(&rows);
        assert_eq!(
            tables,
            vec![TableRange::new(0, 1, 2), TableRange::new(2, 3, 3)]
        );
    }
}
