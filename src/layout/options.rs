//! Layout reconstruction options.

use crate::model::DEFAULT_MERGE_GAP_FACTOR;

/// Smallest table tolerance a page-relative setting resolves to.
pub const MIN_TABLE_TOLERANCE_PX: f32 = 12.0;

/// A distance expressed either in pixels or as a fraction of page width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tolerance {
    /// Absolute distance in pixels
    Pixels(f32),
    /// Fraction of the page width (e.g. `0.015`)
    PageFraction(f32),
}

impl Tolerance {
    /// Resolve to pixels for a page of the given width.
    pub fn resolve(&self, page_width: f32) -> f32 {
        match *self {
            Tolerance::Pixels(px) => px,
            Tolerance::PageFraction(fraction) => fraction * page_width,
        }
    }

    /// Resolve like [`resolve`](Self::resolve), but a page fraction never
    /// goes below `floor` pixels. Explicit pixel values are taken as given.
    pub fn resolve_at_least(&self, page_width: f32, floor: f32) -> f32 {
        match *self {
            Tolerance::Pixels(px) => px,
            Tolerance::PageFraction(_) => self.resolve(page_width).max(floor),
        }
    }
}

/// Options for grouping, table detection and continuation merging.
#[derive(Debug, Clone)]
pub struct LayoutOptions {
    /// Maximum vertical distance between consecutive boxes of one row
    pub row_threshold: Tolerance,

    /// Maximum horizontal drift between aligned table cells
    pub table_tolerance: Tolerance,

    /// Minimum rows for a table region
    pub table_min_rows: usize,

    /// Minimum tokens per row for a table region
    pub table_min_columns: usize,

    /// Boxes below this confidence are dropped (0 = keep everything)
    pub min_box_confidence: f32,

    /// Largest vertical gap a merge may bridge, in mean box heights
    pub max_merge_gap_factor: f32,

    /// Whether wrapped lines are folded into logical rows
    pub merge_continuations: bool,
}

impl LayoutOptions {
    /// Create new layout options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the row grouping threshold.
    pub fn with_row_threshold(mut self, threshold: Tolerance) -> Self {
        self.row_threshold = threshold;
        self
    }

    /// Set the table alignment tolerance.
    pub fn with_table_tolerance(mut self, tolerance: Tolerance) -> Self {
        self.table_tolerance = tolerance;
        self
    }

    /// Set the minimum table size.
    pub fn with_table_minimums(mut self, rows: usize, columns: usize) -> Self {
        self.table_min_rows = rows.max(1);
        self.table_min_columns = columns.max(1);
        self
    }

    /// Set the box confidence floor.
    pub fn with_min_box_confidence(mut self, confidence: f32) -> Self {
        self.min_box_confidence = confidence.clamp(0.0, 1.0);
        self
    }

    /// Set the merge gap factor.
    pub fn with_max_merge_gap_factor(mut self, factor: f32) -> Self {
        self.max_merge_gap_factor = factor;
        self
    }

    /// Table alignment tolerance in pixels for a page of the given width.
    pub fn table_tolerance_px(&self, page_width: f32) -> f32 {
        self.table_tolerance
            .resolve_at_least(page_width, MIN_TABLE_TOLERANCE_PX)
    }

    /// Enable or disable continuation merging.
    pub fn with_merge_continuations(mut self, merge: bool) -> Self {
        self.merge_continuations = merge;
        self
    }
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            row_threshold: Tolerance::Pixels(12.0),
            table_tolerance: Tolerance::PageFraction(0.015),
            table_min_rows: 2,
            table_min_columns: 2,
            min_box_confidence: 0.0,
            max_merge_gap_factor: DEFAULT_MERGE_GAP_FACTOR,
            merge_continuations: true,
        }
    }
}
