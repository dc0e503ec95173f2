//! Document model types for OCR layout reconstruction.
//!
//! This module defines the values that flow through the pipeline: boxes,
//! rows, sparse geometry hints, table ranges, labels, and the classified
//! document handed to the renderers. Every stage produces new values; none
//! mutates its input.

mod document;
mod hints;
mod label;
mod ocr_box;
mod row;
mod table;

pub use document::{
    ClassifiedDocument, DocumentSettings, DocumentStats, Segment, DEFAULT_HEADER_SPLIT_RATIO,
    DEFAULT_MERGE_GAP_FACTOR,
};
pub use hints::{GeometryHints, RowHints};
pub use label::Label;
pub use ocr_box::OcrBox;
pub use row::Row;
pub(crate) use row::join_texts;
pub use table::TableRange;
