//! Layout reconstruction: from loose boxes to ordered rows, tables and hints.
//!
//! The stages run in a fixed order:
//!
//! 1. [`normalize`] turns detections into boxes
//! 2. [`group_rows`] clusters boxes into visual lines
//! 3. [`TableDetector`] finds column-aligned runs
//! 4. [`ContinuationMerger`] folds wrapped lines, re-indexing tables
//! 5. [`extract_hints`] measures the merged rows

mod continuation;
pub mod geometry;
mod normalize;
mod options;
mod rows;
mod table_detector;

pub use continuation::{
    is_party_line, is_salutation_opener, should_merge, should_merge_rows, ContinuationMerger,
};
pub use geometry::extract_hints;
pub use normalize::{clean_text, normalize};
pub use options::{LayoutOptions, Tolerance, MIN_TABLE_TOLERANCE_PX};
pub use rows::group_rows;
pub use table_detector::{TableDetector, TableDetectorConfig};

use crate::error::{Error, Result};
use crate::model::{GeometryHints, OcrBox, Row, TableRange};

/// Output of the layout stages for one page.
#[derive(Debug, Clone)]
pub struct PageLayout {
    /// Rows in reading order, after continuation merging
    pub rows: Vec<Row>,

    /// Table regions, indexed against `rows`
    pub tables: Vec<TableRange>,

    /// Geometry hints, indexed against `rows`
    pub hints: GeometryHints,

    /// Number of rows before merging
    pub grouped_rows: usize,
}

/// Run grouping, table detection, merging and hint extraction.
pub fn analyze(boxes: &[OcrBox], page_width: f32, options: &LayoutOptions) -> Result<PageLayout> {
    geometry::validate_page_width(page_width)?;

    let rows = group_rows(boxes, options.row_threshold.resolve(page_width));
    if rows.is_empty() {
        return Err(Error::EmptyInput);
    }
    let grouped_rows = rows.len();

    let detector = TableDetector::with_config(TableDetectorConfig {
        min_rows: options.table_min_rows,
        min_columns: options.table_min_columns,
        x_tolerance: options.table_tolerance_px(page_width),
    });
    let tables = detector.detect(&rows);

    let (rows, tables) = if options.merge_continuations {
        ContinuationMerger::new(options.max_merge_gap_factor).merge(rows, &tables)
    } else {
        (rows, tables)
    };

    let hints = extract_hints(&rows, page_width, &tables)?;

    Ok(PageLayout {
        rows,
        tables,
        hints,
        grouped_rows,
    })
}
