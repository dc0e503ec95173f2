//! End-to-end reconstruction of one page.

use std::sync::Arc;

use rayon::prelude::*;

use crate::classify::{
    ClassificationOracle, ClassifierOptions, HybridClassifier, TreeOracle, TreeRequest,
};
use crate::error::{Error, Result};
use crate::layout::{self, LayoutOptions};
use crate::model::{ClassifiedDocument, DocumentSettings};
use crate::ocr::{OcrDetection, OcrEngine, OcrPage};
use crate::render::{self, DocNode};

/// Runs normalization, layout, classification and assembly.
///
/// A reconstructor holds configuration only; every call works on its own
/// boxes and rows, so one instance can serve many threads.
#[derive(Debug, Clone, Default)]
pub struct Reconstructor {
    layout: LayoutOptions,
    classifier: HybridClassifier,
}

impl Reconstructor {
    /// Create a reconstructor with default options and no oracle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set layout options.
    pub fn with_layout_options(mut self, options: LayoutOptions) -> Self {
        self.layout = options;
        self
    }

    /// Set classifier options.
    pub fn with_classifier_options(mut self, options: ClassifierOptions) -> Self {
        self.classifier = self.classifier.with_options(options);
        self
    }

    /// Use a classification oracle for escalated rows.
    pub fn with_oracle<O: ClassificationOracle + 'static>(mut self, oracle: O) -> Self {
        self.classifier = self.classifier.with_oracle(oracle);
        self
    }

    /// Use a shared classification oracle.
    pub fn with_shared_oracle(mut self, oracle: Arc<dyn ClassificationOracle>) -> Self {
        self.classifier = self.classifier.with_shared_oracle(oracle);
        self
    }

    /// Use a fully configured classifier.
    pub fn with_classifier(mut self, classifier: HybridClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn layout_options(&self) -> &LayoutOptions {
        &self.layout
    }

    pub fn classifier(&self) -> &HybridClassifier {
        &self.classifier
    }

    /// Reconstruct a page from detections.
    pub fn reconstruct(
        &self,
        detections: &[OcrDetection],
        page_width: f32,
    ) -> Result<ClassifiedDocument> {
        layout::geometry::validate_page_width(page_width)?;

        let boxes = layout::normalize(detections, &self.layout)?;
        let page = layout::analyze(&boxes, page_width, &self.layout)?;

        let classification =
            self.classifier
                .classify_excluding(&page.rows, page_width, &page.tables);

        let row_count = page.rows.len();
        let mut doc = ClassifiedDocument::assemble(
            page.rows,
            &page.tables,
            &classification.labels,
            page_width,
            page.hints,
        )
        .with_settings(self.settings());

        doc.stats.box_count = boxes.len();
        doc.stats.grouped_rows = page.grouped_rows;
        doc.stats.row_count = row_count;
        doc.stats.rule_labeled = classification.rule_labeled;
        doc.stats.escalated = classification.oracle.escalated.len();
        doc.stats.oracle_labeled = classification.oracle.accepted;

        log::debug!(
            "reconstruct: {} boxes, {} rows, {} tables, {} defaulted to body",
            doc.stats.box_count,
            doc.stats.row_count,
            doc.stats.table_count,
            doc.stats.defaulted
        );
        Ok(doc)
    }

    /// Settings recorded on every document this reconstructor assembles.
    pub fn settings(&self) -> DocumentSettings {
        DocumentSettings {
            header_split_ratio: self.classifier.options().header_split_ratio,
            merge_gap_factor: self.layout.max_merge_gap_factor,
        }
    }

    /// Have `oracle` write the document tree for a page.
    ///
    /// Rows and hints come from the normal layout pass; classification is
    /// skipped. The reply is parsed and normalized like any untrusted tree,
    /// so a malformed reply is [`Error::Parse`] and oracle failures are
    /// returned as they are.
    pub fn reconstruct_tree(
        &self,
        detections: &[OcrDetection],
        page_width: f32,
        oracle: &dyn TreeOracle,
    ) -> Result<DocNode> {
        layout::geometry::validate_page_width(page_width)?;

        let boxes = layout::normalize(detections, &self.layout)?;
        let page = layout::analyze(&boxes, page_width, &self.layout)?;
        let request = TreeRequest::from_rows(&page.rows, page.hints);

        let raw = oracle.generate_tree(&request)?;
        log::debug!(
            "tree oracle '{}' returned {} bytes for {} rows",
            oracle.name(),
            raw.len(),
            page.rows.len()
        );
        let tree = render::parse_doc_tree(&raw)?;
        Ok(render::normalize(tree))
    }

    /// Reconstruct a recognized page.
    pub fn reconstruct_page(&self, page: &OcrPage) -> Result<ClassifiedDocument> {
        self.reconstruct(&page.detections, page.page_width)
    }

    /// Recognize an image with `engine`, then reconstruct it.
    pub fn reconstruct_image(
        &self,
        engine: &dyn OcrEngine,
        image: &[u8],
        page_width: f32,
    ) -> Result<ClassifiedDocument> {
        if image.is_empty() {
            return Err(Error::EmptyInput);
        }

        let detections = engine.detect(image)?;
        log::debug!(
            "OCR engine '{}' returned {} detections",
            engine.name(),
            detections.len()
        );
        if detections.is_empty() {
            return Err(Error::EmptyOcrResult);
        }
        self.reconstruct(&detections, page_width)
    }

    /// Reconstruct independent pages in parallel.
    ///
    /// Results keep the input order; one page failing does not affect the others.
    pub fn reconstruct_batch(&self, pages: &[OcrPage]) -> Vec<Result<ClassifiedDocument>> {
        pages
            .par_iter()
            .map(|page| self.reconstruct_page(page))
            .collect()
    }
}
