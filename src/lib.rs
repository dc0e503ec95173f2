//! # inkdoc
//!
//! Document layout reconstruction from OCR output.
//!
//! This library takes unordered OCR text fragments (text, bounding box,
//! confidence) and rebuilds a structured document: reading order,
//! paragraphs, tables and semantic row roles such as titles, headers and
//! page continuations. The result renders to a rich-text document tree,
//! HTML, Markdown, plain text or JSON.
//!
//! ## Quick Start
//!
//! ```no_run
//! use inkdoc::{reconstruct_file, render};
//!
//! fn main() -> inkdoc::Result<()> {
//!     // Reconstruct a page of pre-recognized OCR detections
//!     let doc = reconstruct_file("page.json")?;
//!
//!     // Render as HTML
//!     let options = render::RenderOptions::default();
//!     println!("{}", render::to_html(&doc, &options));
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Geometry-only layout**: row grouping, alignment and table detection
//! - **Rule-first classification**: an ordered, replaceable rule list
//! - **Optional oracle**: unresolved rows can be escalated to an LLM
//!   (`http-oracle` feature); answers are validated and never trusted blindly
//! - **Parallel batches**: independent pages are processed with Rayon
//! - **Job tracking**: in-memory job store with a background worker

pub mod classify;
pub mod error;
pub mod jobs;
pub mod layout;
pub mod model;
pub mod ocr;
pub mod pipeline;
pub mod render;

// Re-export commonly used types
pub use classify::{
    ClassificationOracle, Classification, ClassifierOptions, HybridClassifier, NoOracle,
    OracleRequest, TreeOracle, TreeRequest,
};
#[cfg(feature = "http-oracle")]
pub use classify::{HttpOracle, HttpOracleConfig};
pub use error::{Error, Result};
pub use jobs::{InMemoryJobStore, JobRecord, JobState, JobStore, JobWorker};
pub use layout::{LayoutOptions, Tolerance};
pub use model::{
    ClassifiedDocument, DocumentSettings, DocumentStats, GeometryHints, Label, OcrBox, Row,
    RowHints, Segment, TableRange,
};
pub use ocr::{OcrDetection, OcrEngine, OcrPage, StaticOcr};
pub use pipeline::Reconstructor;
pub use render::{JsonFormat, RenderOptions};

use std::path::Path;

/// Reconstruct a page from detections with default options.
///
/// # Example
///
/// ```
/// use inkdoc::{reconstruct, OcrDetection};
///
/// let detections = vec![OcrDetection::new("Hello", 0.9, [10.0, 10.0, 60.0, 24.0])];
/// let doc = reconstruct(&detections, 800.0).unwrap();
/// assert_eq!(doc.row_texts(), vec!["Hello"]);
/// ```
pub fn reconstruct(detections: &[OcrDetection], page_width: f32) -> Result<ClassifiedDocument> {
    Reconstructor::new().reconstruct(detections, page_width)
}

/// Reconstruct a page stored as OCR JSON (`{page_width, detections}`).
pub fn reconstruct_file<P: AsRef<Path>>(path: P) -> Result<ClassifiedDocument> {
    let page = OcrPage::from_file(path)?;
    Reconstructor::new().reconstruct_page(&page)
}

/// Reconstruct a page and render it as an HTML fragment.
pub fn to_html(detections: &[OcrDetection], page_width: f32) -> Result<String> {
    let doc = reconstruct(detections, page_width)?;
    Ok(render::to_html(&doc, &RenderOptions::default()))
}

/// Reconstruct a page and render it as a document tree.
pub fn to_doc_tree(detections: &[OcrDetection], page_width: f32) -> Result<render::DocNode> {
    let doc = reconstruct(detections, page_width)?;
    render::to_doc_tree(&doc, &RenderOptions::default())
}

/// Reconstruct a page and render it as Markdown.
pub fn to_markdown(detections: &[OcrDetection], page_width: f32) -> Result<String> {
    let doc = reconstruct(detections, page_width)?;
    Ok(render::to_markdown(&doc, &RenderOptions::default()))
}

/// Reconstruct a page and return its plain text.
pub fn extract_text(detections: &[OcrDetection], page_width: f32) -> Result<String> {
    let doc = reconstruct(detections, page_width)?;
    Ok(render::to_text(&doc, &RenderOptions::default()))
}
