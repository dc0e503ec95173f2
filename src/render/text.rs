//! Plain text rendering for classified documents.

use crate::model::ClassifiedDocument;

use super::{build_blocks, RenderBlock, RenderOptions};

/// Convert a classified document to plain text.
///
/// One block per line group; table cells are tab-separated.
pub fn to_text(doc: &ClassifiedDocument, _options: &RenderOptions) -> String {
    let blocks = build_blocks(doc);
    let parts: Vec<String> = blocks
        .iter()
        .map(|block| match block {
            RenderBlock::Header { left, right } => left
                .iter()
                .chain(right)
                .cloned()
                .collect::<Vec<_>>()
                .join("\n"),
            RenderBlock::Table { rows } => rows
                .iter()
                .map(|r| r.join("\t"))
                .collect::<Vec<_>>()
                .join("\n"),
            other => other.text(),
        })
        .filter(|p| !p.is_empty())
        .collect();

    parts.join("\n\n").trim().to_string()
}
