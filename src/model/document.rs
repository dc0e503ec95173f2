//! Classified document: the renderer's input.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{GeometryHints, Label, Row, TableRange};

/// One unit of the classified reading-order stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// A flow row with its final label
    Row {
        /// Row index in the merged row list
        index: usize,
        /// Final label (never `unresolved`)
        label: Label,
        /// The row itself
        row: Row,
    },

    /// A detected table and the rows it absorbed
    Table {
        /// Row range covered by the table
        range: TableRange,
        /// Rows of the table, top to bottom
        rows: Vec<Row>,
    },
}

/// Counters collected while reconstructing a document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentStats {
    /// Boxes that survived normalization
    pub box_count: usize,
    /// Rows produced by the row grouper
    pub grouped_rows: usize,
    /// Rows left after continuation merging
    pub row_count: usize,
    /// Detected tables
    pub table_count: usize,
    /// Rows labeled by the rule engine
    pub rule_labeled: usize,
    /// Rows sent to the classification oracle
    pub escalated: usize,
    /// Rows labeled by a validated oracle answer
    pub oracle_labeled: usize,
    /// Flow rows that fell back to `doc-body`
    pub defaulted: usize,
}

/// Default header column split, as a page fraction.
pub const DEFAULT_HEADER_SPLIT_RATIO: f32 = 0.55;

/// Default largest vertical gap a continuation merge may bridge, in mean box heights.
pub const DEFAULT_MERGE_GAP_FACTOR: f32 = 2.5;

/// Geometry settings the document was classified with.
///
/// Renderers read these instead of carrying their own copies, so a row
/// classified as a header is split at the same column it was judged by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DocumentSettings {
    /// Header column split, as a page fraction
    pub header_split_ratio: f32,
    /// Largest vertical gap a merge may bridge, in mean box heights
    pub merge_gap_factor: f32,
}

impl Default for DocumentSettings {
    fn default() -> Self {
        Self {
            header_split_ratio: DEFAULT_HEADER_SPLIT_RATIO,
            merge_gap_factor: DEFAULT_MERGE_GAP_FACTOR,
        }
    }
}

/// Ordered `(row | table, label)` stream for a single page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedDocument {
    /// Page width in pixels
    pub page_width: f32,

    /// Reading-order segments
    pub segments: Vec<Segment>,

    /// Geometry hints keyed by row index
    pub hints: GeometryHints,

    /// Pipeline counters
    pub stats: DocumentStats,

    /// Settings shared by classification and rendering
    #[serde(default)]
    pub settings: DocumentSettings,
}

impl ClassifiedDocument {
    /// Assemble the segment stream.
    ///
    /// `tables` should be sorted and disjoint; a range overlapping an
    /// earlier one is dropped and its rows stay flow rows. Rows without a
    /// resolved label get `doc-body`.
    pub fn assemble(
        rows: Vec<Row>,
        tables: &[TableRange],
        labels: &BTreeMap<usize, Label>,
        page_width: f32,
        hints: GeometryHints,
    ) -> Self {
        let tables = disjoint_ranges(tables);
        let table_starts: BTreeMap<usize, TableRange> =
            tables.iter().map(|t| (t.start, *t)).collect();

        let mut segments = Vec::new();
        let mut defaulted = 0;
        let mut open_table: Option<(TableRange, Vec<Row>)> = None;

        for (index, row) in rows.into_iter().enumerate() {
            if let Some((range, mut table_rows)) = open_table.take() {
                table_rows.push(row);
                if index == range.end {
                    segments.push(Segment::Table {
                        range,
                        rows: table_rows,
                    });
                } else {
                    open_table = Some((range, table_rows));
                }
                continue;
            }

            if let Some(range) = table_starts.get(&index) {
                if range.end == index {
                    segments.push(Segment::Table {
                        range: *range,
                        rows: vec![row],
                    });
                } else {
                    open_table = Some((*range, vec![row]));
                }
                continue;
            }

            let label = labels.get(&index).copied().unwrap_or(Label::Unresolved);
            if !label.is_resolved() {
                defaulted += 1;
            }
            let label = label.or_body();
            segments.push(Segment::Row { index, label, row });
        }

        // A table range running past the last row still keeps its rows.
        if let Some((range, table_rows)) = open_table {
            segments.push(Segment::Table {
                range,
                rows: table_rows,
            });
        }

        let stats = DocumentStats {
            defaulted,
            table_count: tables.len(),
            ..Default::default()
        };

        Self {
            page_width,
            segments,
            hints,
            stats,
            settings: DocumentSettings::default(),
        }
    }

    /// Replace the classification settings.
    pub fn with_settings(mut self, settings: DocumentSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Final label of every flow row.
    pub fn labels(&self) -> BTreeMap<usize, Label> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Row { index, label, .. } => Some((*index, *label)),
                Segment::Table { .. } => None,
            })
            .collect()
    }

    /// Detected table ranges in reading order.
    pub fn tables(&self) -> Vec<TableRange> {
        self.segments
            .iter()
            .filter_map(|s| match s {
                Segment::Table { range, .. } => Some(*range),
                Segment::Row { .. } => None,
            })
            .collect()
    }

    /// Total number of rows, flow and table.
    pub fn row_count(&self) -> usize {
        self.segments
            .iter()
            .map(|s| match s {
                Segment::Row { .. } => 1,
                Segment::Table { rows, .. } => rows.len(),
            })
            .sum()
    }

    /// Check if the document has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Row texts in reading order (table rows included).
    pub fn row_texts(&self) -> Vec<String> {
        self.segments
            .iter()
            .flat_map(|s| match s {
                Segment::Row { row, .. } => vec![row.text()],
                Segment::Table { rows, .. } => rows.iter().map(Row::text).collect(),
            })
            .collect()
    }
}

fn disjoint_ranges(tables: &[TableRange]) -> Vec<TableRange> {
    let mut sorted: Vec<TableRange> = tables.iter().copied().filter(|t| t.start <= t.end).collect();
    sorted.sort_by_key(|t| t.start);

    let mut kept: Vec<TableRange> = Vec::with_capacity(sorted.len());
    for range in sorted {
        if kept.iter().any(|k| k.overlaps(&range)) {
            log::warn!("Dropping table {:?}: overlaps an earlier table", range);
            continue;
        }
        kept.push(range);
    }
    kept
}
